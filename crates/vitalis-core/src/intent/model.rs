//! Intent and awaiting-input types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A conversation topic the router recognizes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Recipe,
    Exercise,
    ExerciseRoutine,
    MealPlan,
    Motivation,
    CompletePlan,
    /// No topic matched; handled as motivational support.
    General,
}

impl Intent {
    /// The awaiting state a menu prompt for this intent puts the router in.
    pub fn awaiting_state(self) -> AwaitingInput {
        match self {
            Intent::Recipe => AwaitingInput::RecipePreferences,
            Intent::Exercise => AwaitingInput::ExerciseDetails,
            Intent::ExerciseRoutine => AwaitingInput::RoutinePreferences,
            Intent::MealPlan => AwaitingInput::MealPlanPreferences,
            Intent::Motivation => AwaitingInput::MotivationTopic,
            Intent::CompletePlan => AwaitingInput::CompletePlanPreferences,
            Intent::General => AwaitingInput::None,
        }
    }
}

/// Marks that the next user turn answers a clarifying prompt.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AwaitingInput {
    #[default]
    None,
    RecipePreferences,
    ExerciseDetails,
    MotivationTopic,
    RoutinePreferences,
    MealPlanPreferences,
    CompletePlanPreferences,
}

impl AwaitingInput {
    /// Returns the intent a pending answer is forced to, if any.
    ///
    /// Only recipe, exercise and motivation prompts short-circuit. Routine,
    /// meal plan and complete plan answers go back through keyword matching.
    /// The asymmetry is long-standing behavior and kept as-is.
    pub fn short_circuit(self) -> Option<Intent> {
        match self {
            AwaitingInput::RecipePreferences => Some(Intent::Recipe),
            AwaitingInput::ExerciseDetails => Some(Intent::Exercise),
            AwaitingInput::MotivationTopic => Some(Intent::Motivation),
            AwaitingInput::None
            | AwaitingInput::RoutinePreferences
            | AwaitingInput::MealPlanPreferences
            | AwaitingInput::CompletePlanPreferences => None,
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, AwaitingInput::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_intent_wire_names() {
        assert_eq!(Intent::ExerciseRoutine.to_string(), "exercise_routine");
        assert_eq!(Intent::from_str("meal_plan").unwrap(), Intent::MealPlan);
        assert_eq!(
            serde_json::to_string(&Intent::CompletePlan).unwrap(),
            "\"complete_plan\""
        );
    }

    #[test]
    fn test_only_three_states_short_circuit() {
        let forced: Vec<_> = AwaitingInput::iter()
            .filter(|s| s.short_circuit().is_some())
            .collect();
        assert_eq!(
            forced,
            vec![
                AwaitingInput::RecipePreferences,
                AwaitingInput::ExerciseDetails,
                AwaitingInput::MotivationTopic,
            ]
        );
    }

    #[test]
    fn test_awaiting_state_round_trips_through_short_circuit() {
        for intent in [Intent::Recipe, Intent::Exercise, Intent::Motivation] {
            assert_eq!(intent.awaiting_state().short_circuit(), Some(intent));
        }
        assert!(Intent::General.awaiting_state().is_none());
    }
}
