//! Session domain model.
//!
//! Sessions live on the server. The client only ever sees summaries and
//! pages of transcript entries; the rendered message list is rebuilt from
//! those pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation session with its full transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// Human-readable session name
    pub name: String,
    /// Persisted question/answer pairs, oldest first
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            message_count: self.transcript.len() as u32,
        }
    }
}

/// Session metadata returned by listing, without the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of transcript entries stored for the session
    #[serde(default)]
    pub message_count: u32,
}

impl SessionSummary {
    pub fn has_transcript(&self) -> bool {
        self.message_count > 0
    }
}

/// One persisted question/answer pair.
///
/// This is also the wire shape: `{question, aiResponse, timestamp}`.
/// `ai_response_raw` is opaque here; it is normally an encoded
/// [`ToolResponse`](super::ToolResponse) but legacy entries may hold plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub question: String,
    #[serde(rename = "aiResponse")]
    pub ai_response_raw: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(question: impl Into<String>, ai_response_raw: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ai_response_raw: ai_response_raw.into(),
            timestamp: Utc::now(),
        }
    }
}
