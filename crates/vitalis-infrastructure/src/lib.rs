//! Infrastructure adapters for the Vitalis conversational core.

pub mod config_service;
pub mod in_memory_transport;
pub mod paths;

pub use config_service::ConfigService;
pub use in_memory_transport::{InMemorySessionTransport, Responder, paginate};
pub use paths::{PathError, VitalisPaths};
