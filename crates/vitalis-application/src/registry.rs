use std::sync::Arc;
use tokio::sync::RwLock;
use vitalis_core::error::{CoreError, Result};
use vitalis_core::session::{SessionSummary, SessionTransport};

/// Known sessions and the active pointer.
///
/// `SessionRegistry` is responsible for:
/// - Mirroring the transport's session list
/// - Creating and deleting sessions through the transport
/// - Tracking which session is active
///
/// It does not touch rendered messages. The conversation use case reacts to
/// activation changes by hydrating or seeding its message store.
pub struct SessionRegistry {
    /// Session list in transport order
    sessions: Arc<RwLock<Vec<SessionSummary>>>,
    /// ID of the active session, if any
    active_session_id: Arc<RwLock<Option<String>>>,
    transport: Arc<dyn SessionTransport>,
    default_name: String,
}

/// What the registry selected after a deletion.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// A session other than the active one was removed.
    ActiveUnchanged,
    /// The active session was removed and this one took its place.
    Activated(SessionSummary),
    /// The active session was removed and none remain.
    Empty,
}

impl SessionRegistry {
    /// Creates an empty registry over `transport`.
    ///
    /// # Arguments
    ///
    /// * `transport` - Remote session backend
    /// * `default_name` - Name used by `create` when none is given
    pub fn new(transport: Arc<dyn SessionTransport>, default_name: impl Into<String>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Vec::new())),
            active_session_id: Arc::new(RwLock::new(None)),
            transport,
            default_name: default_name.into(),
        }
    }

    /// Reloads the session list from the transport.
    ///
    /// Clears the active pointer if its session no longer exists.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the cached list is left as it was.
    pub async fn refresh(&self) -> Result<Vec<SessionSummary>> {
        let listed = self.transport.list_sessions().await?;
        tracing::debug!("[SessionRegistry] Loaded {} sessions", listed.len());

        {
            let mut sessions = self.sessions.write().await;
            *sessions = listed.clone();
        }

        let mut active = self.active_session_id.write().await;
        if active
            .as_ref()
            .is_some_and(|id| !listed.iter().any(|s| &s.id == id))
        {
            *active = None;
        }

        Ok(listed)
    }

    /// Returns a snapshot of the session list.
    pub async fn sessions(&self) -> Vec<SessionSummary> {
        self.sessions.read().await.clone()
    }

    /// Returns the active session's summary.
    pub async fn active(&self) -> Option<SessionSummary> {
        let id = self.active_id().await?;
        self.get(&id).await
    }

    pub async fn active_id(&self) -> Option<String> {
        self.active_session_id.read().await.clone()
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionSummary> {
        let sessions = self.sessions.read().await;
        sessions.iter().find(|s| s.id == session_id).cloned()
    }

    /// Creates a session remotely and makes it active.
    ///
    /// # Errors
    ///
    /// Returns the transport error; nothing changes locally in that case.
    pub async fn create(&self, name: Option<&str>) -> Result<SessionSummary> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.default_name.as_str());
        let summary = self.transport.create_session(Some(name)).await?;

        {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|s| s.id != summary.id);
            sessions.insert(0, summary.clone());
        }
        *self.active_session_id.write().await = Some(summary.id.clone());

        tracing::info!("[SessionRegistry] Created session {} ({})", summary.id, summary.name);
        Ok(summary)
    }

    /// Makes `session_id` active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the registry does not know the session.
    pub async fn switch_to(&self, session_id: &str) -> Result<SessionSummary> {
        let summary = self
            .get(session_id)
            .await
            .ok_or_else(|| CoreError::not_found("Session", session_id))?;
        *self.active_session_id.write().await = Some(summary.id.clone());

        tracing::debug!("[SessionRegistry] Switched to session {}", session_id);
        Ok(summary)
    }

    /// Deletes a session remotely and re-points the active session if needed.
    ///
    /// When the active session goes, the first remaining session becomes
    /// active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or the transport error.
    pub async fn delete(&self, session_id: &str) -> Result<DeleteOutcome> {
        if self.get(session_id).await.is_none() {
            return Err(CoreError::not_found("Session", session_id));
        }
        self.transport.delete_session(session_id).await?;

        let next = {
            let mut sessions = self.sessions.write().await;
            sessions.retain(|s| s.id != session_id);
            sessions.first().cloned()
        };

        let mut active = self.active_session_id.write().await;
        if active.as_deref() != Some(session_id) {
            return Ok(DeleteOutcome::ActiveUnchanged);
        }

        tracing::info!("[SessionRegistry] Deleted active session {}", session_id);
        match next {
            Some(next) => {
                *active = Some(next.id.clone());
                Ok(DeleteOutcome::Activated(next))
            }
            None => {
                *active = None;
                Ok(DeleteOutcome::Empty)
            }
        }
    }

    /// Records that a message was added to `session_id` locally.
    pub async fn touch(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) {
            session.message_count += 1;
            session.updated_at = chrono::Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_infrastructure::InMemorySessionTransport;

    fn registry() -> (SessionRegistry, Arc<InMemorySessionTransport>) {
        let transport = Arc::new(InMemorySessionTransport::new());
        (
            SessionRegistry::new(transport.clone(), "Nueva conversación"),
            transport,
        )
    }

    #[tokio::test]
    async fn test_create_activates_with_default_name() {
        let (registry, _) = registry();
        let created = registry.create(None).await.unwrap();

        assert_eq!(created.name, "Nueva conversación");
        assert_eq!(registry.active_id().await, Some(created.id.clone()));
        assert_eq!(registry.sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_switch_unknown_is_not_found() {
        let (registry, _) = registry();
        let err = registry.switch_to("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_active_selects_first_remaining() {
        let (registry, _) = registry();
        let older = registry.create(Some("uno")).await.unwrap();
        let newer = registry.create(Some("dos")).await.unwrap();

        let outcome = registry.delete(&newer.id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Activated(older.clone()));
        assert_eq!(registry.active_id().await, Some(older.id));
    }

    #[tokio::test]
    async fn test_delete_sole_session_empties() {
        let (registry, _) = registry();
        let only = registry.create(None).await.unwrap();

        assert_eq!(registry.delete(&only.id).await.unwrap(), DeleteOutcome::Empty);
        assert!(registry.active().await.is_none());
        assert!(registry.sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_inactive_keeps_active() {
        let (registry, _) = registry();
        let first = registry.create(Some("uno")).await.unwrap();
        let second = registry.create(Some("dos")).await.unwrap();

        let outcome = registry.delete(&first.id).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::ActiveUnchanged);
        assert_eq!(registry.active_id().await, Some(second.id));
    }

    #[tokio::test]
    async fn test_refresh_drops_vanished_active() {
        let (registry, transport) = registry();
        let session = registry.create(None).await.unwrap();
        transport.delete_session(&session.id).await.unwrap();

        registry.refresh().await.unwrap();
        assert!(registry.active_id().await.is_none());
    }
}
