//! Backward pagination over a session's remote transcript.
//!
//! Page 1 is the newest page. Entries inside a page are oldest first, so
//! loading page `n + 1` yields messages that go in front of the store.

use crate::mapper::ResponseMapper;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use vitalis_core::error::Result;
use vitalis_core::message::{Message, MessageId};
use vitalis_core::session::{PaginationInfo, SessionTransport};

/// Cursor state for the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_messages: u32,
    pub has_more: bool,
    pub page_size: u32,
    pub is_loading: bool,
}

impl PaginationState {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            total_messages: 0,
            has_more: false,
            page_size: page_size.max(1),
            is_loading: false,
        }
    }

    /// Whether `load_previous` would do anything.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading
    }

    fn apply(&mut self, info: &PaginationInfo) {
        self.current_page = info.current_page;
        self.total_pages = info.total_pages;
        self.total_messages = info.total_messages;
        self.has_more = info.has_more;
    }
}

/// One fetched and reconstructed page.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub messages: Vec<Message>,
    pub info: PaginationInfo,
}

/// Cursor plus the ids already rendered for the active session.
///
/// Holds no transport; the orchestrator drives it around its own awaits so
/// that no lock is held across a network call.
#[derive(Debug, Clone)]
pub struct PaginationController {
    state: PaginationState,
    seen: HashSet<MessageId>,
}

impl PaginationController {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: PaginationState::new(page_size),
            seen: HashSet::new(),
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Forgets the cursor and seen ids. Used when the active session changes.
    pub fn reset(&mut self) {
        self.state = PaginationState::new(self.state.page_size);
        self.seen.clear();
    }

    /// Takes the first page of a freshly activated session.
    ///
    /// Resets the seen set and returns the messages that replace the store.
    pub fn hydrate(&mut self, page: LoadedPage) -> Vec<Message> {
        self.reset();
        self.state.apply(&page.info);
        self.seen.extend(page.messages.iter().map(|m| m.id.clone()));
        page.messages
    }

    /// Claims the next page to load.
    ///
    /// Returns `None` without touching any state when there is nothing more
    /// or a load is already running; otherwise marks the cursor loading.
    pub fn begin_previous(&mut self) -> Option<u32> {
        if !self.state.can_load_more() {
            return None;
        }
        self.state.is_loading = true;
        Some(self.state.current_page + 1)
    }

    /// Takes an older page and returns the unseen messages to prepend.
    ///
    /// The cursor moves to the server's pagination block in one step.
    pub fn complete_previous(&mut self, page: LoadedPage) -> Vec<Message> {
        let fresh: Vec<Message> = page
            .messages
            .into_iter()
            .filter(|m| self.seen.insert(m.id.clone()))
            .collect();
        self.state.apply(&page.info);
        self.state.is_loading = false;
        fresh
    }

    /// Releases the loading flag after a failed fetch.
    pub fn abort_previous(&mut self) {
        self.state.is_loading = false;
    }
}

/// Fetches transcript pages and rebuilds them into messages.
#[derive(Clone)]
pub struct TranscriptLoader {
    transport: Arc<dyn SessionTransport>,
    mapper: ResponseMapper,
    page_size: u32,
}

impl TranscriptLoader {
    pub fn new(transport: Arc<dyn SessionTransport>, mapper: ResponseMapper, page_size: u32) -> Self {
        Self {
            transport,
            mapper,
            page_size: page_size.max(1),
        }
    }

    /// Loads `page` (1 = newest) of `session_id`.
    ///
    /// # Errors
    ///
    /// Returns the transport's error unchanged.
    pub async fn load(&self, session_id: &str, page: u32) -> Result<LoadedPage> {
        tracing::debug!(
            "[TranscriptLoader] Loading page {} of session {}",
            page,
            session_id
        );
        let transcript = self
            .transport
            .get_session_messages(session_id, page, self.page_size)
            .await?;

        Ok(LoadedPage {
            messages: self
                .mapper
                .from_transcript_page(session_id, &transcript),
            info: transcript.pagination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_core::message::Message;

    fn page(ids: &[&str], current_page: u32, has_more: bool) -> LoadedPage {
        LoadedPage {
            messages: ids
                .iter()
                .map(|id| Message::user(*id).with_id(MessageId::new(*id)))
                .collect(),
            info: PaginationInfo {
                current_page,
                total_pages: 3,
                total_messages: 6,
                has_more,
                page_size: 2,
            },
        }
    }

    #[test]
    fn test_load_previous_noop_without_more() {
        let mut controller = PaginationController::new(2);
        controller.hydrate(page(&["a", "b"], 1, false));

        let before = controller.state();
        assert_eq!(controller.begin_previous(), None);
        assert_eq!(controller.state(), before);
    }

    #[test]
    fn test_load_previous_noop_while_loading() {
        let mut controller = PaginationController::new(2);
        controller.hydrate(page(&["a", "b"], 1, true));

        assert_eq!(controller.begin_previous(), Some(2));
        let loading = controller.state();
        assert!(loading.is_loading);
        assert_eq!(controller.begin_previous(), None);
        assert_eq!(controller.state(), loading);
    }

    #[test]
    fn test_previous_page_filters_seen_and_updates_cursor() {
        let mut controller = PaginationController::new(2);
        controller.hydrate(page(&["c", "d"], 1, true));
        controller.begin_previous();

        let fresh = controller.complete_previous(page(&["b", "c"], 2, false));
        let ids: Vec<_> = fresh.iter().map(|m| m.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["b"]);

        let state = controller.state();
        assert_eq!(state.current_page, 2);
        assert!(!state.has_more);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_hydrate_resets_seen() {
        let mut controller = PaginationController::new(2);
        controller.hydrate(page(&["a"], 1, true));
        controller.hydrate(page(&["x"], 1, true));
        controller.begin_previous();

        let fresh = controller.complete_previous(page(&["a"], 2, false));
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_abort_releases_loading() {
        let mut controller = PaginationController::new(2);
        controller.hydrate(page(&["a"], 1, true));
        controller.begin_previous();
        controller.abort_previous();
        assert!(controller.state().can_load_more());
    }
}
