//! Generation service trait.
//!
//! The model-backed generators are opaque to the core: slow, fallible and
//! untrusted. Each call receives the user input, a short reduced history and
//! a cancellation token it is expected to honor.

use crate::session::ToolResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failure reported by a generation adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The backend call failed (network, quota, model error)
    #[error("Generation failed: {0}")]
    Failed(String),

    /// The model answered with something that could not be used
    #[error("Invalid generation output: {0}")]
    InvalidOutput(String),

    /// The adapter observed the cancellation token and stopped
    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Speaker of a history turn as the generation backend sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Model,
}

/// One prior turn, reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub text: String,
}

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Model,
            text: text.into(),
        }
    }
}

pub type GenerationResult = std::result::Result<ToolResponse, GenerationError>;

/// One async function per generation tool.
///
/// Responses should put their structured output under the key the intent
/// catalog lists for the tool (for example `data.recipe`), and may set
/// `data.message` or `data.clarificationQuestion` to override the reply text.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_recipe(
        &self,
        input: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> GenerationResult;

    async fn generate_exercise(
        &self,
        input: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> GenerationResult;

    async fn generate_full_routine(
        &self,
        input: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> GenerationResult;

    async fn generate_meal_plan(
        &self,
        input: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> GenerationResult;

    async fn generate_motivational_support(
        &self,
        input: &str,
        history: &[HistoryTurn],
        cancel: &CancellationToken,
    ) -> GenerationResult;
}
