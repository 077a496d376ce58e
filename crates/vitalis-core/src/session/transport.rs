//! Session transport trait.
//!
//! Defines what the core needs from the backend that stores sessions.

use super::model::{SessionSummary, TranscriptEntry};
use super::wire::ToolResponse;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Pagination block reported by the server with each transcript page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_messages: u32,
    pub has_more: bool,
    pub page_size: u32,
}

/// One page of a session transcript.
///
/// Page 1 holds the most recent entries; higher pages go back in time.
/// Entries within a page are oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptPage {
    #[serde(rename = "messages")]
    pub entries: Vec<TranscriptEntry>,
    pub pagination: PaginationInfo,
}

impl TranscriptPage {
    /// Chronological index of the page's first entry in the whole transcript.
    ///
    /// Stable while new entries are appended, since page 1 is anchored at the
    /// newest end.
    pub fn first_position(&self) -> u32 {
        let newer = self
            .pagination
            .current_page
            .saturating_sub(1)
            .saturating_mul(self.pagination.page_size);
        self.pagination
            .total_messages
            .saturating_sub(newer)
            .saturating_sub(self.entries.len() as u32)
    }
}

/// Backend access for sessions and their transcripts.
///
/// Implementations should treat the cancellation token passed to
/// `send_message` as a request to abandon the call.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Lists all sessions, most recently updated first.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Creates a session. The server picks a name when `name` is `None`.
    async fn create_session(&self, name: Option<&str>) -> Result<SessionSummary>;

    /// Deletes a session. Deleting a missing session is an error.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Fetches one transcript page. `page` is 1-based.
    async fn get_session_messages(
        &self,
        session_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TranscriptPage>;

    /// Sends a message to the server-side agent, which answers and persists
    /// the exchange.
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ToolResponse>;

    /// Appends an exchange produced on the client to the transcript.
    async fn append_entry(&self, session_id: &str, entry: &TranscriptEntry) -> Result<()>;
}
