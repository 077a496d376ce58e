//! Message domain module.
//!
//! - `model`: rendered turns (`Message`), ids, quick options, updates
//! - `payload`: structured tool results (`Payload` and its variants)

mod model;
mod payload;

pub use model::{
    MenuAction, Message, MessageId, MessagePatch, MessageUpdate, QuickOption, Sender,
};
pub use payload::{
    CompletePlan, DailyMealPlan, Exercise, FullRoutine, Meal, Motivation, Payload, PayloadKind,
    Recipe, RoutineDay,
};
