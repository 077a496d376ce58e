//! Domain layer for the Vitalis conversational core.
//!
//! Holds the types every other crate speaks: intents and their catalog,
//! messages and payloads, sessions and the transcript wire format, the
//! generation and transport traits, configuration, and the shared error.

pub mod config;
pub mod error;
pub mod generation;
pub mod intent;
pub mod message;
pub mod session;

// Re-export common error type
pub use error::{CoreError, Result};
