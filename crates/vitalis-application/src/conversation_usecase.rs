//! Conversation use case implementation.
//!
//! `ConversationUseCase` is the orchestrator state machine. It turns user
//! text and menu taps into classified generation calls, commits the results
//! into the message store in place of a loading placeholder, and keeps the
//! store in step with the active session's remote transcript.

use crate::cache::{ResponseCache, cache_key};
use crate::cancellation::{CancellationController, RequestToken};
use crate::history::build_history;
use crate::mapper::ResponseMapper;
use crate::pagination::{PaginationController, PaginationState, TranscriptLoader};
use crate::registry::{DeleteOutcome, SessionRegistry};
use crate::retry::{RetryPolicy, retry_when};
use crate::router::IntentRouter;
use crate::store::MessageStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vitalis_core::config::{DispatchMode, OrchestratorConfig};
use vitalis_core::error::{CoreError, Result};
use vitalis_core::generation::{GenerationError, GenerationResult, GenerationService, HistoryTurn};
use vitalis_core::intent::{AwaitingInput, Intent};
use vitalis_core::message::{
    CompletePlan, MenuAction, Message, MessageId, MessageUpdate, Payload,
};
use vitalis_core::session::{SessionSummary, SessionTransport, ToolResponse};

/// Text of the agent message shown when the user asks for the menu.
const MENU_TEXT: &str = "¿En qué más puedo ayudarte? Elige una opción:";

/// Reply used for a locally composed complete plan.
const COMPLETE_PLAN_REPLY: &str =
    "¡Aquí tienes tu plan completo! Incluye tu rutina, tu alimentación del día y un mensaje para mantenerte motivado.";

/// How a send ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The response replaced the placeholder.
    Committed { message_id: MessageId },
    /// The call failed; the placeholder now shows the error message.
    Recovered {
        message_id: MessageId,
        error: CoreError,
    },
    /// A newer send or a session change took over. Nothing was committed.
    Superseded,
    /// A menu action produced a local agent message without any call.
    Prompted { message_id: MessageId },
}

impl SendOutcome {
    pub fn message_id(&self) -> Option<&MessageId> {
        match self {
            SendOutcome::Committed { message_id }
            | SendOutcome::Recovered { message_id, .. }
            | SendOutcome::Prompted { message_id } => Some(message_id),
            SendOutcome::Superseded => None,
        }
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// Generated in-process. The exchange still has to reach the transcript.
    Local,
    /// Answered by the server, which has already persisted it.
    Remote,
}

/// Mutable conversation state guarded by one lock.
///
/// The lock is never held across a generation or transport call.
struct ConversationState {
    store: MessageStore,
    awaiting: AwaitingInput,
    pagination: PaginationController,
    /// Bumped on every activation or reset so late results can tell they
    /// belong to a conversation that is no longer shown.
    epoch: u64,
}

/// Use case for one user's conversation across sessions.
///
/// # Responsibilities
///
/// - Classifying turns and dispatching generation calls
/// - Committing, recovering or dropping results
/// - Session lifecycle with hydration from the remote transcript
/// - Backward pagination of the active transcript
///
/// # Thread Safety
///
/// All methods take `&self`. A send and a pagination load may be outstanding
/// at the same time.
pub struct ConversationUseCase {
    generation: Arc<dyn GenerationService>,
    transport: Arc<dyn SessionTransport>,
    registry: SessionRegistry,
    loader: TranscriptLoader,
    mapper: ResponseMapper,
    router: IntentRouter,
    /// Shared result cache (injected, may outlive this use case)
    cache: Arc<ResponseCache<ToolResponse>>,
    cancellation: CancellationController,
    retry_policy: RetryPolicy,
    config: OrchestratorConfig,
    state: Arc<RwLock<ConversationState>>,
    /// Background cache sweeper, aborted on shutdown
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationUseCase {
    /// Creates a new `ConversationUseCase`.
    ///
    /// # Arguments
    ///
    /// * `generation` - Local generation backend
    /// * `transport` - Remote session backend
    /// * `cache` - Result cache, shareable between use cases
    /// * `config` - Orchestrator tuning
    ///
    /// # Errors
    ///
    /// Returns `Config` if `config` does not validate.
    pub fn new(
        generation: Arc<dyn GenerationService>,
        transport: Arc<dyn SessionTransport>,
        cache: Arc<ResponseCache<ToolResponse>>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mapper = ResponseMapper::new();
        Ok(Self {
            registry: SessionRegistry::new(transport.clone(), config.default_session_name.clone()),
            loader: TranscriptLoader::new(transport.clone(), mapper, config.page_size),
            mapper,
            router: IntentRouter::new(),
            generation,
            transport,
            cache,
            cancellation: CancellationController::new(),
            retry_policy: RetryPolicy::new(config.retry_attempts, config.retry_base_delay()),
            state: Arc::new(RwLock::new(ConversationState {
                store: MessageStore::new(config.max_history),
                awaiting: AwaitingInput::None,
                pagination: PaginationController::new(config.page_size),
                epoch: 0,
            })),
            sweeper: Mutex::new(None),
            config,
        })
    }

    /// Starts sweeping expired cache entries every `period`.
    ///
    /// Calling it again replaces the previous sweeper.
    pub fn start_cache_sweeper(&self, period: Duration) {
        let handle = self.cache.spawn_sweeper(period);
        let mut slot = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Loads sessions and shows the first one, or the greeting if none exist.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the session list or the first page
    /// cannot be loaded. The greeting state is shown in that case.
    pub async fn start(&self) -> Result<()> {
        let sessions = match self.registry.refresh().await {
            Ok(sessions) => sessions,
            Err(e) => {
                self.reset_to_greeting().await;
                return Err(e);
            }
        };

        match sessions.first() {
            Some(first) => {
                let summary = self.registry.switch_to(&first.id).await?;
                self.activate(&summary).await
            }
            None => {
                self.reset_to_greeting().await;
                Ok(())
            }
        }
    }

    // ============================================================================
    // Sending
    // ============================================================================

    /// Sends free text.
    ///
    /// Supersedes any send still in flight. The user message is committed
    /// before its placeholder, and the placeholder keeps its position when
    /// it is resolved.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` for blank text; no message is added and no call
    /// is made. Every other failure is reported as `SendOutcome::Recovered`.
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::EmptyInput);
        }

        let request = self.cancellation.begin();
        let session_id = self.registry.active_id().await;

        let (classification, placeholder, history, epoch) = {
            let mut state = self.state.write().await;
            let stale = state.store.remove_loading();
            if stale > 0 {
                tracing::debug!("[ConversationUseCase] Removed {} stale placeholders", stale);
            }

            let history = build_history(state.store.messages(), self.config.max_history);
            let classification = self.router.classify(text, state.awaiting);
            state.store.append(Message::user(text));
            let placeholder = state.store.append(Message::placeholder());
            (classification, placeholder, history, state.epoch)
        };

        tracing::info!(
            request = request.id(),
            intent = %classification.intent,
            short_circuited = classification.short_circuited,
            "[ConversationUseCase] Dispatching"
        );

        let dispatched = tokio::select! {
            biased;
            _ = request.cancelled() => None,
            result = self.dispatch(classification.intent, text, &history, session_id.as_deref(), request.token()) => Some(result),
        };
        self.cancellation.finish(&request);

        let result = match dispatched {
            Some(result) if !request.is_cancelled() => result,
            _ => return Ok(self.superseded(&request)),
        };

        let mut state = self.state.write().await;
        if state.epoch != epoch || !state.store.contains(&placeholder) {
            return Ok(self.superseded(&request));
        }

        match result {
            Ok((response, route)) => {
                let update = self
                    .mapper
                    .from_live_response(&response, classification.intent);
                state.store.update(&placeholder, update.into());
                state.awaiting = classification.next_awaiting;
                drop(state);

                if let Some(session_id) = session_id.as_deref() {
                    if route == Route::Local {
                        self.persist_exchange(session_id, text, &response).await;
                    }
                    self.registry.touch(session_id).await;
                }

                Ok(SendOutcome::Committed {
                    message_id: placeholder,
                })
            }
            Err(error) if error.is_cancelled() => {
                state.store.remove_loading();
                Ok(self.superseded(&request))
            }
            Err(error) => {
                tracing::error!(
                    request = request.id(),
                    "[ConversationUseCase] Send failed: {}",
                    error
                );
                let update = MessageUpdate::error(
                    self.config.error_message.clone(),
                    self.router.catalog().default_menu(),
                );
                state.store.update(&placeholder, update.into());
                state.awaiting = classification.next_awaiting;

                Ok(SendOutcome::Recovered {
                    message_id: placeholder,
                    error,
                })
            }
        }
    }

    /// Handles a quick option tap.
    ///
    /// `SelectIntent` shows a clarification prompt and sets the awaiting
    /// state, `Ask` sends its text, and `ShowMenu` shows the top-level menu
    /// and clears the awaiting state.
    pub async fn select_option(&self, action: &MenuAction) -> Result<SendOutcome> {
        match action {
            MenuAction::Ask(text) => self.send(text).await,
            MenuAction::SelectIntent(intent) => {
                let prompt = self.router.prompt_for(*intent);
                let label = self.router.catalog().profile(*intent).label;

                let mut state = self.state.write().await;
                state.store.append(Message::user(label));
                let message_id = state
                    .store
                    .append(Message::agent(prompt.text, prompt.quick_options));
                state.awaiting = prompt.awaiting;
                tracing::debug!("[ConversationUseCase] Awaiting {}", prompt.awaiting);

                Ok(SendOutcome::Prompted { message_id })
            }
            MenuAction::ShowMenu => {
                let mut state = self.state.write().await;
                let message_id = state.store.append(Message::agent(
                    MENU_TEXT,
                    self.router.catalog().default_menu(),
                ));
                state.awaiting = AwaitingInput::None;

                Ok(SendOutcome::Prompted { message_id })
            }
        }
    }

    fn superseded(&self, request: &RequestToken) -> SendOutcome {
        tracing::debug!(
            request = request.id(),
            "[ConversationUseCase] Result dropped, request superseded"
        );
        SendOutcome::Superseded
    }

    async fn dispatch(
        &self,
        intent: Intent,
        text: &str,
        history: &[HistoryTurn],
        session_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(ToolResponse, Route)> {
        match (self.config.dispatch, session_id) {
            (DispatchMode::Remote, Some(session_id)) => {
                // Not idempotent: a retried send may duplicate the stored exchange.
                let response = retry_when(
                    self.retry_policy,
                    || self.transport.send_message(session_id, text, cancel),
                    |e: &CoreError| !e.is_cancelled(),
                )
                .await?;
                Ok((response, Route::Remote))
            }
            _ => {
                let response = self.generate_cached(intent, text, history, cancel).await?;
                Ok((response, Route::Local))
            }
        }
    }

    /// Runs the intent's generation call through the cache and retry.
    async fn generate_cached(
        &self,
        intent: Intent,
        text: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> Result<ToolResponse> {
        let key = cache_key(intent, text);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!("[ConversationUseCase] Cache hit for {}", key);
            return Ok(hit);
        }

        let response = retry_when(
            self.retry_policy,
            || self.generate(intent, text, history, cancel),
            |e: &GenerationError| !matches!(e, GenerationError::Cancelled),
        )
        .await?;

        self.cache.insert(key, response.clone()).await;
        Ok(response)
    }

    async fn generate(
        &self,
        intent: Intent,
        text: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let generation = &self.generation;
        match intent {
            Intent::Recipe => generation.generate_recipe(text, history, cancel).await,
            Intent::Exercise => generation.generate_exercise(text, history, cancel).await,
            Intent::ExerciseRoutine => generation.generate_full_routine(text, history, cancel).await,
            Intent::MealPlan => generation.generate_meal_plan(text, history, cancel).await,
            Intent::Motivation | Intent::General => {
                generation
                    .generate_motivational_support(text, history, cancel)
                    .await
            }
            Intent::CompletePlan => self.generate_complete_plan(text, history, cancel).await,
        }
    }

    /// Composes a complete plan from the routine, meal plan and motivation
    /// generators, called concurrently.
    async fn generate_complete_plan(
        &self,
        text: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let generation = &self.generation;
        let (routine, meal_plan, motivation) = futures::try_join!(
            generation.generate_full_routine(text, history, cancel),
            generation.generate_meal_plan(text, history, cancel),
            generation.generate_motivational_support(text, history, cancel),
        )?;

        let catalog = self.router.catalog();
        let extract = |intent: Intent, response: &ToolResponse| {
            response
                .data
                .as_ref()
                .and_then(|data| catalog.profile(intent).extract_payload(data))
        };

        let mut plan = CompletePlan::default();
        if let Some(Payload::FullRoutine(r)) = extract(Intent::ExerciseRoutine, &routine) {
            plan.routine = r;
        }
        if let Some(Payload::DailyMealPlan(m)) = extract(Intent::MealPlan, &meal_plan) {
            plan.meal_plan = m;
        }
        if let Some(Payload::Motivation(m)) = extract(Intent::Motivation, &motivation) {
            plan.motivation = m;
        }

        let plan = serde_json::to_value(&plan)
            .map_err(|e| GenerationError::InvalidOutput(e.to_string()))?;
        Ok(ToolResponse::new(COMPLETE_PLAN_REPLY)
            .with_tool("complete_plan")
            .with_data(serde_json::json!({ "plan": plan })))
    }

    /// Appends a locally generated exchange to the remote transcript.
    ///
    /// Best-effort: failures are logged and never reach the conversation.
    async fn persist_exchange(&self, session_id: &str, question: &str, response: &ToolResponse) {
        let entry = match self.mapper.to_transcript_entry(question, response) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("[ConversationUseCase] Could not encode exchange: {}", e);
                return;
            }
        };

        if let Err(e) = self.transport.append_entry(session_id, &entry).await {
            tracing::warn!(
                "[ConversationUseCase] Failed to persist exchange to session {}: {}",
                session_id,
                e
            );
        }
    }

    // ============================================================================
    // Sessions and pagination
    // ============================================================================

    /// Creates a session, makes it active and shows the greeting.
    pub async fn create_session(&self, name: Option<&str>) -> Result<SessionSummary> {
        let summary = self.registry.create(name).await?;
        self.reset_to_greeting().await;
        Ok(summary)
    }

    /// Makes `session_id` active and shows its transcript.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown sessions, or the transport error if the
    /// first page cannot be loaded.
    pub async fn switch_session(&self, session_id: &str) -> Result<SessionSummary> {
        let summary = self.registry.switch_to(session_id).await?;
        self.activate(&summary).await?;
        Ok(summary)
    }

    /// Deletes a session.
    ///
    /// Deleting the active session shows the first remaining one, or the
    /// greeting state if none remain.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        match self.registry.delete(session_id).await? {
            DeleteOutcome::ActiveUnchanged => Ok(()),
            DeleteOutcome::Activated(next) => self.activate(&next).await,
            DeleteOutcome::Empty => {
                self.reset_to_greeting().await;
                Ok(())
            }
        }
    }

    /// Loads the next older page of the active transcript.
    ///
    /// Returns how many messages were prepended. Does nothing, without a
    /// transport call, when there is no more history or a load is running.
    pub async fn load_previous(&self) -> Result<usize> {
        let Some(session_id) = self.registry.active_id().await else {
            return Ok(0);
        };

        let (page, epoch) = {
            let mut state = self.state.write().await;
            match state.pagination.begin_previous() {
                Some(page) => (page, state.epoch),
                None => return Ok(0),
            }
        };

        let result = self.loader.load(&session_id, page).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            tracing::debug!(
                "[ConversationUseCase] Discarding page {} of {}, session changed",
                page,
                session_id
            );
            return Ok(0);
        }

        match result {
            Ok(loaded) => {
                let fresh = state.pagination.complete_previous(loaded);
                let count = fresh.len();
                state.store.prepend(fresh);
                Ok(count)
            }
            Err(e) => {
                state.pagination.abort_previous();
                Err(e)
            }
        }
    }

    /// Shows `summary`: its first transcript page, or the greeting if it has
    /// no transcript.
    async fn activate(&self, summary: &SessionSummary) -> Result<()> {
        let epoch = self.begin_activation().await;
        if !summary.has_transcript() {
            self.seed_greeting(epoch).await;
            return Ok(());
        }

        let result = self.loader.load(&summary.id, 1).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            tracing::debug!(
                "[ConversationUseCase] Discarding hydration of {}, session changed",
                summary.id
            );
            return Ok(());
        }

        match result {
            Ok(page) if !page.messages.is_empty() => {
                let messages = state.pagination.hydrate(page);
                tracing::debug!(
                    "[ConversationUseCase] Hydrated {} messages for {}",
                    messages.len(),
                    summary.id
                );
                state.store.replace_all(messages);
                Ok(())
            }
            Ok(_) => {
                Self::push_greeting(&mut state, &self.config.greeting, &self.router);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    "[ConversationUseCase] Failed to load transcript of {}: {}",
                    summary.id,
                    e
                );
                Self::push_greeting(&mut state, &self.config.greeting, &self.router);
                Err(e)
            }
        }
    }

    /// Cancels any send and clears the conversation for a new activation.
    async fn begin_activation(&self) -> u64 {
        self.cancellation.cancel_current();
        let mut state = self.state.write().await;
        state.epoch += 1;
        state.store.clear();
        state.pagination.reset();
        state.awaiting = AwaitingInput::None;
        state.epoch
    }

    async fn reset_to_greeting(&self) {
        let epoch = self.begin_activation().await;
        self.seed_greeting(epoch).await;
    }

    async fn seed_greeting(&self, epoch: u64) {
        let mut state = self.state.write().await;
        if state.epoch == epoch {
            Self::push_greeting(&mut state, &self.config.greeting, &self.router);
        }
    }

    fn push_greeting(state: &mut ConversationState, greeting: &str, router: &IntentRouter) {
        state.store.clear();
        state
            .store
            .append(Message::agent(greeting, router.catalog().default_menu()));
        state.awaiting = AwaitingInput::None;
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Snapshot of the rendered conversation.
    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.store.messages().to_vec()
    }

    pub async fn awaiting(&self) -> AwaitingInput {
        self.state.read().await.awaiting
    }

    pub async fn pagination(&self) -> PaginationState {
        self.state.read().await.pagination.state()
    }

    pub async fn sessions(&self) -> Vec<SessionSummary> {
        self.registry.sessions().await
    }

    pub async fn active_session(&self) -> Option<SessionSummary> {
        self.registry.active().await
    }

    pub fn is_sending(&self) -> bool {
        self.cancellation.has_in_flight()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Tears the conversation down: cancels any in-flight send, stops the
    /// cache sweeper and clears the cache.
    pub async fn shutdown(&self) {
        self.stop_background();
        self.cache.clear().await;
        tracing::info!("[ConversationUseCase] Shut down");
    }

    fn stop_background(&self) {
        self.cancellation.cancel_current();
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("[ConversationUseCase] Cache sweeper stopped");
        }
    }
}

impl Drop for ConversationUseCase {
    fn drop(&mut self) {
        self.stop_background();
    }
}
