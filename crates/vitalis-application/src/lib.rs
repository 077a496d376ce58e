//! Application layer for the Vitalis conversational core.
//!
//! Holds the components the orchestrator is assembled from and the
//! [`ConversationUseCase`] that wires them together.

pub mod cache;
pub mod cancellation;
pub mod conversation_usecase;
pub mod history;
pub mod mapper;
pub mod pagination;
pub mod registry;
pub mod retry;
pub mod router;
pub mod store;

pub use cache::{CacheEntry, ResponseCache, cache_key};
pub use cancellation::{CancellationController, RequestToken};
pub use conversation_usecase::{ConversationUseCase, SendOutcome};
pub use history::build_history;
pub use mapper::ResponseMapper;
pub use pagination::{LoadedPage, PaginationController, PaginationState, TranscriptLoader};
pub use registry::{DeleteOutcome, SessionRegistry};
pub use retry::{RetryPolicy, retry, retry_when};
pub use router::{Classification, IntentRouter, MenuPrompt};
pub use store::MessageStore;
