//! Structured payloads attached to agent messages.
//!
//! Generation output is model-produced JSON, so every field is defaulted and
//! deserialization tolerates missing or extra keys.

use serde::{Deserialize, Serialize};

/// The one structured result an agent message can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Payload {
    Recipe(Recipe),
    Exercise(Exercise),
    Motivation(Motivation),
    FullRoutine(FullRoutine),
    DailyMealPlan(DailyMealPlan),
    CompletePlan(CompletePlan),
}

/// Selects which payload variant a tool's data decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Recipe,
    Exercise,
    Motivation,
    FullRoutine,
    DailyMealPlan,
    CompletePlan,
}

impl PayloadKind {
    /// Decodes `value` into the payload variant for this kind.
    pub fn decode(self, value: serde_json::Value) -> serde_json::Result<Payload> {
        Ok(match self {
            PayloadKind::Recipe => Payload::Recipe(serde_json::from_value(value)?),
            PayloadKind::Exercise => Payload::Exercise(serde_json::from_value(value)?),
            PayloadKind::Motivation => Payload::Motivation(serde_json::from_value(value)?),
            PayloadKind::FullRoutine => Payload::FullRoutine(serde_json::from_value(value)?),
            PayloadKind::DailyMealPlan => Payload::DailyMealPlan(serde_json::from_value(value)?),
            PayloadKind::CompletePlan => Payload::CompletePlan(serde_json::from_value(value)?),
        })
    }
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Recipe(_) => PayloadKind::Recipe,
            Payload::Exercise(_) => PayloadKind::Exercise,
            Payload::Motivation(_) => PayloadKind::Motivation,
            Payload::FullRoutine(_) => PayloadKind::FullRoutine,
            Payload::DailyMealPlan(_) => PayloadKind::DailyMealPlan,
            Payload::CompletePlan(_) => PayloadKind::CompletePlan,
        }
    }

    /// One-line description used when the payload is replayed as history.
    pub fn summary(&self) -> String {
        match self {
            Payload::Recipe(recipe) => recipe.summary(),
            Payload::Exercise(exercise) => exercise.summary(),
            Payload::Motivation(motivation) => motivation.summary(),
            Payload::FullRoutine(routine) => routine.summary(),
            Payload::DailyMealPlan(plan) => plan.summary(),
            Payload::CompletePlan(plan) => format!(
                "Plan completo: {} | {} | {}",
                plan.routine.summary(),
                plan.meal_plan.summary(),
                plan.motivation.summary()
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub prep_time_minutes: Option<u32>,
    pub calories: Option<u32>,
    pub tags: Vec<String>,
}

impl Recipe {
    pub fn summary(&self) -> String {
        let mut line = format!("Receta: {}", self.title);
        if !self.ingredients.is_empty() {
            line.push_str(&format!(" ({} ingredientes)", self.ingredients.len()));
        }
        if let Some(minutes) = self.prep_time_minutes {
            line.push_str(&format!(", {} min", minutes));
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub description: String,
    pub duration_minutes: Option<u32>,
    pub difficulty: Option<String>,
    pub instructions: Vec<String>,
    pub muscle_groups: Vec<String>,
}

impl Exercise {
    pub fn summary(&self) -> String {
        let mut line = format!("Ejercicio: {}", self.name);
        if let Some(minutes) = self.duration_minutes {
            line.push_str(&format!(", {} min", minutes));
        }
        if let Some(difficulty) = &self.difficulty {
            line.push_str(&format!(", nivel {}", difficulty));
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Motivation {
    pub message: String,
    pub quote: Option<String>,
    pub author: Option<String>,
    pub tips: Vec<String>,
}

impl Motivation {
    pub fn summary(&self) -> String {
        match (&self.quote, &self.author) {
            (Some(quote), Some(author)) => format!("Motivación: \"{}\" ({})", quote, author),
            (Some(quote), None) => format!("Motivación: \"{}\"", quote),
            _ => format!("Motivación: {}", first_line(&self.message)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutineDay {
    pub day: String,
    pub focus: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FullRoutine {
    pub title: String,
    pub goal: Option<String>,
    pub days: Vec<RoutineDay>,
    pub notes: Option<String>,
}

impl FullRoutine {
    pub fn summary(&self) -> String {
        let exercises: usize = self.days.iter().map(|d| d.exercises.len()).sum();
        format!(
            "Rutina: {} ({} días, {} ejercicios)",
            self.title,
            self.days.len(),
            exercises
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Meal {
    /// breakfast, lunch, dinner, snack
    pub kind: String,
    pub name: String,
    pub description: String,
    pub calories: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DailyMealPlan {
    pub title: String,
    pub meals: Vec<Meal>,
    pub total_calories: Option<u32>,
}

impl DailyMealPlan {
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self.meals.iter().map(|m| m.name.as_str()).collect();
        let mut line = format!("Plan de comidas: {}", self.title);
        if !names.is_empty() {
            line.push_str(&format!(" ({})", names.join(", ")));
        }
        if let Some(total) = self.total_calories {
            line.push_str(&format!(", {} kcal", total));
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletePlan {
    pub routine: FullRoutine,
    pub meal_plan: DailyMealPlan,
    pub motivation: Motivation,
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
