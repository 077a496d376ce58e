//! Intent domain module.
//!
//! - `model`: `Intent` and `AwaitingInput`
//! - `catalog`: the per-intent table shared by routing and response mapping

mod catalog;
mod model;

pub use catalog::{IntentCatalog, IntentProfile};
pub use model::{AwaitingInput, Intent};
