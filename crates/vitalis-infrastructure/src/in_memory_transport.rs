//! In-process session backend.
//!
//! Implements [`SessionTransport`] over a lock-guarded session list. It pages
//! transcripts the way the remote service does (page 1 is the newest) and
//! answers `send_message` through a pluggable responder, which makes it the
//! standard test double for the orchestrator.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vitalis_core::error::{CoreError, Result};
use vitalis_core::session::{
    PaginationInfo, Session, SessionSummary, SessionTransport, ToolResponse, TranscriptEntry,
    TranscriptPage,
};

/// Name given to sessions created without one.
const DEFAULT_SESSION_NAME: &str = "Nueva conversación";

/// Produces the server's answer to `send_message`.
pub type Responder = Arc<dyn Fn(&str) -> Result<ToolResponse> + Send + Sync>;

/// Session transport backed by memory.
pub struct InMemorySessionTransport {
    /// Sessions, newest first
    sessions: RwLock<Vec<Session>>,
    responder: Responder,
    /// Delay applied to `send_message`, cancellable
    latency: Option<Duration>,
    /// Transport failures still to inject into `send_message` and `append_entry`
    failures_left: AtomicU32,
    send_calls: AtomicU32,
    page_calls: AtomicU32,
    append_calls: AtomicU32,
}

impl Default for InMemorySessionTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionTransport {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            responder: Arc::new(|text: &str| Ok(ToolResponse::new(format!("Recibido: {}", text)))),
            latency: None,
            failures_left: AtomicU32::new(0),
            send_calls: AtomicU32::new(0),
            page_calls: AtomicU32::new(0),
            append_calls: AtomicU32::new(0),
        }
    }

    /// Replaces the server-side answer to `send_message`.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Result<ToolResponse> + Send + Sync + 'static,
    {
        self.responder = Arc::new(responder);
        self
    }

    /// Delays every `send_message` by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next `count` sends or appends fail with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Adds a session with an existing transcript (oldest entry first).
    pub async fn insert_session(&self, name: &str, transcript: Vec<TranscriptEntry>) -> SessionSummary {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            transcript,
            created_at: now,
            updated_at: now,
        };
        let summary = session.summary();
        self.sessions.write().await.insert(0, session);
        summary
    }

    /// Full transcript of a session, oldest first.
    pub async fn transcript(&self, session_id: &str) -> Option<Vec<TranscriptEntry>> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .find(|s| s.id == session_id)
            .map(|s| s.transcript.clone())
    }

    pub fn send_calls(&self) -> u32 {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> u32 {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> u32 {
        self.append_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn push_entry(&self, session_id: &str, entry: TranscriptEntry) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| CoreError::not_found("Session", session_id))?;
        session.updated_at = Utc::now();
        session.transcript.push(entry);
        Ok(())
    }
}

/// Slices `page` (1 = newest) out of a chronological transcript.
///
/// Entries in the returned page stay oldest first.
pub fn paginate(transcript: &[TranscriptEntry], page: u32, page_size: u32) -> TranscriptPage {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = transcript.len() as u32;
    let total_pages = total.div_ceil(page_size);

    let skip_newest = ((page - 1) as usize).saturating_mul(page_size as usize);
    let end = transcript.len().saturating_sub(skip_newest);
    let start = end.saturating_sub(page_size as usize);

    TranscriptPage {
        entries: transcript[start..end].to_vec(),
        pagination: PaginationInfo {
            current_page: page,
            total_pages,
            total_messages: total,
            has_more: page < total_pages,
            page_size,
        },
    }
}

#[async_trait]
impl SessionTransport for InMemorySessionTransport {
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().map(Session::summary).collect())
    }

    async fn create_session(&self, name: Option<&str>) -> Result<SessionSummary> {
        let name = name.unwrap_or(DEFAULT_SESSION_NAME);
        let summary = self.insert_session(name, Vec::new()).await;
        tracing::debug!("[InMemorySessionTransport] Created session {}", summary.id);
        Ok(summary)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.id != session_id);
        if sessions.len() == before {
            return Err(CoreError::not_found("Session", session_id));
        }
        Ok(())
    }

    async fn get_session_messages(
        &self,
        session_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TranscriptPage> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let sessions = self.sessions.read().await;
        let session = sessions
            .iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| CoreError::not_found("Session", session_id))?;
        Ok(paginate(&session.transcript, page, page_size))
    }

    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolResponse> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CoreError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }
        if self.take_failure() {
            return Err(CoreError::transport("injected send failure"));
        }

        let response = (self.responder)(text)?;
        let raw = vitalis_core::session::encode_ai_response(&response)?;
        self.push_entry(session_id, TranscriptEntry::new(text, raw))
            .await?;
        Ok(response)
    }

    async fn append_entry(&self, session_id: &str, entry: &TranscriptEntry) -> Result<()> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(CoreError::transport("injected append failure"));
        }
        self.push_entry(session_id, entry.clone()).await
    }
}
