//! Intent routing.
//!
//! Free text is classified by walking the catalog's keyword rules in order.
//! A pending clarification can force the intent instead, but only for the
//! recipe, exercise and motivation prompts (see
//! [`AwaitingInput::short_circuit`]).

use rand::Rng;
use rand::seq::SliceRandom;
use vitalis_core::intent::{AwaitingInput, Intent, IntentCatalog};
use vitalis_core::message::{MenuAction, QuickOption};

/// Result of classifying one free-text turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// Awaiting state once the exchange resolves. Free text always clears it.
    pub next_awaiting: AwaitingInput,
    /// True when a pending prompt decided the intent rather than keywords.
    pub short_circuited: bool,
}

/// A clarification prompt emitted for a menu selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuPrompt {
    pub intent: Intent,
    pub text: String,
    pub awaiting: AwaitingInput,
    pub quick_options: Vec<QuickOption>,
}

/// Classifies turns against an [`IntentCatalog`].
#[derive(Debug, Clone, Copy)]
pub struct IntentRouter {
    catalog: &'static IntentCatalog,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter {
    pub fn new() -> Self {
        Self {
            catalog: IntentCatalog::global(),
        }
    }

    pub fn catalog(&self) -> &'static IntentCatalog {
        self.catalog
    }

    /// Classifies `text` given the session's awaiting state.
    pub fn classify(&self, text: &str, awaiting: AwaitingInput) -> Classification {
        if let Some(intent) = awaiting.short_circuit() {
            tracing::debug!(
                "[IntentRouter] Awaiting {} forces intent {}",
                awaiting,
                intent
            );
            return Classification {
                intent,
                next_awaiting: AwaitingInput::None,
                short_circuited: true,
            };
        }

        let intent = self.catalog.match_text(text).unwrap_or(Intent::General);
        tracing::debug!("[IntentRouter] Classified as {}", intent);

        Classification {
            intent,
            next_awaiting: AwaitingInput::None,
            short_circuited: false,
        }
    }

    /// Picks a clarification prompt for a menu selection at random.
    pub fn prompt_for(&self, intent: Intent) -> MenuPrompt {
        self.prompt_with(intent, &mut rand::thread_rng())
    }

    /// Like [`prompt_for`](Self::prompt_for) with a caller-supplied RNG.
    pub fn prompt_with<R: Rng + ?Sized>(&self, intent: Intent, rng: &mut R) -> MenuPrompt {
        let profile = self.catalog.profile(intent);
        let text = profile
            .clarification_prompts
            .choose(rng)
            .copied()
            .unwrap_or("¿Me cuentas un poco más?")
            .to_string();

        MenuPrompt {
            intent,
            text,
            awaiting: intent.awaiting_state(),
            quick_options: vec![QuickOption::new(
                "menu",
                "Menú principal",
                MenuAction::ShowMenu,
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn classify(text: &str) -> Intent {
        IntentRouter::new().classify(text, AwaitingInput::None).intent
    }

    #[test]
    fn test_keyword_rules() {
        assert_eq!(classify("Necesito una rutina de ejercicios"), Intent::ExerciseRoutine);
        assert_eq!(classify("Dame una receta con pollo"), Intent::Recipe);
        assert_eq!(classify("quiero hacer ejercicio"), Intent::Exercise);
        assert_eq!(classify("Hazme un plan de comidas vegano"), Intent::MealPlan);
        assert_eq!(classify("Estoy muy desanimado hoy"), Intent::Motivation);
        assert_eq!(classify("Quiero un plan completo de bienestar"), Intent::CompletePlan);
        assert_eq!(classify("MOTIVACIÓN por favor"), Intent::Motivation);
    }

    #[test]
    fn test_no_match_is_general() {
        assert_eq!(classify("hola, ¿qué tal?"), Intent::General);
    }

    #[test]
    fn test_rule_order_prefers_specific_intents() {
        // "plan de comidas" must win over "comida"-style recipe words,
        // "rutina" over "ejercicio".
        assert_eq!(classify("un plan de comidas para cocinar"), Intent::MealPlan);
        assert_eq!(classify("rutina de ejercicio en casa"), Intent::ExerciseRoutine);
    }

    #[test]
    fn test_recipe_awaiting_short_circuits_any_text() {
        let result = IntentRouter::new()
            .classify("quiero hacer ejercicio", AwaitingInput::RecipePreferences);
        assert_eq!(result.intent, Intent::Recipe);
        assert!(result.short_circuited);
        assert_eq!(result.next_awaiting, AwaitingInput::None);
    }

    #[test]
    fn test_exercise_and_motivation_awaiting_short_circuit() {
        let router = IntentRouter::new();
        assert_eq!(
            router.classify("sin equipo", AwaitingInput::ExerciseDetails).intent,
            Intent::Exercise
        );
        assert_eq!(
            router.classify("el trabajo", AwaitingInput::MotivationTopic).intent,
            Intent::Motivation
        );
    }

    #[test]
    fn test_routine_and_meal_plan_awaiting_are_rederived() {
        let router = IntentRouter::new();
        let routine = router.classify("tres días, principiante", AwaitingInput::RoutinePreferences);
        assert_eq!(routine.intent, Intent::General);
        assert!(!routine.short_circuited);

        let meal = router.classify("dame una receta", AwaitingInput::MealPlanPreferences);
        assert_eq!(meal.intent, Intent::Recipe);

        let plan = router.classify("quiero bajar de peso", AwaitingInput::CompletePlanPreferences);
        assert_eq!(plan.intent, Intent::General);
    }

    #[test]
    fn test_prompt_sets_awaiting_and_comes_from_pool() {
        let router = IntentRouter::new();
        let mut rng = StdRng::seed_from_u64(7);
        for intent in [Intent::Recipe, Intent::MealPlan, Intent::CompletePlan] {
            let prompt = router.prompt_with(intent, &mut rng);
            assert_eq!(prompt.awaiting, intent.awaiting_state());
            assert!(router
                .catalog()
                .profile(intent)
                .clarification_prompts
                .contains(&prompt.text.as_str()));
            assert_eq!(prompt.quick_options[0].action, MenuAction::ShowMenu);
        }
    }
}
