//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: `Session`, `SessionSummary`, `TranscriptEntry`
//! - `wire`: versioned `aiResponse` encoding and `ToolResponse`
//! - `transport`: the `SessionTransport` trait and pagination types

mod model;
mod transport;
mod wire;

pub use model::{Session, SessionSummary, TranscriptEntry};
pub use transport::{PaginationInfo, SessionTransport, TranscriptPage};
pub use wire::{AI_RESPONSE_VERSION, ToolResponse, decode_ai_response, encode_ai_response};
