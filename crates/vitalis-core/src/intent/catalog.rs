//! The intent catalog.
//!
//! One table describes every intent: the keyword rule the router matches,
//! the tool names responses report, where the payload lives in tool data,
//! the clarification prompts and the follow-up menu. Both the router and the
//! response mapper read from it, so live and reloaded turns render the same.

use super::model::Intent;
use crate::message::{MenuAction, Payload, PayloadKind, QuickOption};
use once_cell::sync::Lazy;
use regex::Regex;

/// Static description of one intent.
#[derive(Debug)]
pub struct IntentProfile {
    pub intent: Intent,
    /// Label used in the top-level menu.
    pub label: &'static str,
    /// Keyword rule. `None` means the intent is never matched from text.
    pub keywords: Option<Regex>,
    /// Names a response may report in `tool_used` for this intent.
    pub tool_names: &'static [&'static str],
    /// Payload variant produced by the tool, if any.
    pub payload_kind: Option<PayloadKind>,
    /// Keys under `data` where the payload object may be found, in priority order.
    pub payload_keys: &'static [&'static str],
    /// Clarification prompts shown when the intent is picked from the menu.
    pub clarification_prompts: &'static [&'static str],
    /// Follow-up `(label, text)` pairs. Empty means follow-ups are not offered.
    pub follow_ups: &'static [(&'static str, &'static str)],
}

impl IntentProfile {
    pub fn allows_follow_ups(&self) -> bool {
        !self.follow_ups.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.keywords.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Pulls this intent's payload out of tool `data`.
    ///
    /// Returns `None` when no payload key is present or the object does not
    /// decode.
    pub fn extract_payload(&self, data: &serde_json::Value) -> Option<Payload> {
        let kind = self.payload_kind?;
        let value = self
            .payload_keys
            .iter()
            .find_map(|key| data.get(*key).filter(|v| v.is_object()))?;

        match kind.decode(value.clone()) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::debug!(
                    "[IntentCatalog] Payload for {} did not decode: {}",
                    self.intent,
                    e
                );
                None
            }
        }
    }
}

/// Ordered set of intent profiles.
///
/// The order of `profiles` is the classification order.
#[derive(Debug)]
pub struct IntentCatalog {
    profiles: Vec<IntentProfile>,
}

static CATALOG: Lazy<IntentCatalog> = Lazy::new(IntentCatalog::build);

fn rule(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("[IntentCatalog] Invalid keyword pattern {}: {}", pattern, e);
            None
        }
    }
}

impl IntentCatalog {
    /// The process-wide catalog.
    pub fn global() -> &'static IntentCatalog {
        &CATALOG
    }

    fn build() -> Self {
        let profiles = vec![
            IntentProfile {
                intent: Intent::CompletePlan,
                label: "Plan completo",
                keywords: rule(
                    r"(?i)(plan\s+(completo|integral|total|de\s+bienestar)|complete\s+plan|todo\s+en\s+uno)",
                ),
                tool_names: &["complete_plan", "completePlan", "generate_complete_plan"],
                payload_kind: Some(PayloadKind::CompletePlan),
                payload_keys: &["plan", "completePlan", "complete_plan"],
                clarification_prompts: &[
                    "¡Armemos tu plan completo! ¿Cuál es tu objetivo principal y cuántos días a la semana puedes entrenar?",
                    "Para tu plan integral necesito saber: ¿tu meta, tu nivel de actividad y alguna restricción alimentaria?",
                    "Cuéntame sobre ti: objetivo, experiencia entrenando y preferencias de comida.",
                ],
                follow_ups: &[
                    ("Ajustar plan", "Ajusta mi plan completo para una semana más ligera"),
                ],
            },
            IntentProfile {
                intent: Intent::MealPlan,
                label: "Plan de comidas",
                keywords: rule(
                    r"(?i)(plan\s+(de\s+)?(comidas?|alimenticio|alimentaci[oó]n|nutricional)|men[uú]\s+(semanal|diario|del\s+d[ií]a)|meal\s+plan|dieta)",
                ),
                tool_names: &[
                    "meal_plan",
                    "daily_meal_plan",
                    "dailyMealPlan",
                    "generateMealPlan",
                    "generate_meal_plan",
                ],
                payload_kind: Some(PayloadKind::DailyMealPlan),
                payload_keys: &["mealPlan", "dailyMealPlan", "meal_plan"],
                clarification_prompts: &[
                    "¿Cómo te gustaría tu plan de comidas? Dime calorías objetivo, alergias o preferencias.",
                    "¡Vamos a planear tu día! ¿Eres vegetariano, tienes alguna intolerancia o meta de peso?",
                    "Cuéntame tus gustos y restricciones para armar tu menú del día.",
                ],
                follow_ups: &[
                    ("Otro plan", "Dame otro plan de comidas diferente"),
                    ("Lista de compras", "Hazme la lista de compras de este plan de comidas"),
                ],
            },
            IntentProfile {
                intent: Intent::ExerciseRoutine,
                label: "Rutina de ejercicios",
                keywords: rule(r"(?i)(rutina|routine|plan\s+de\s+entrenamiento|workout\s+plan)"),
                tool_names: &[
                    "exercise_routine",
                    "full_routine",
                    "fullRoutine",
                    "generateFullRoutine",
                    "generate_full_routine",
                ],
                payload_kind: Some(PayloadKind::FullRoutine),
                payload_keys: &["routine", "fullRoutine", "full_routine"],
                clarification_prompts: &[
                    "¿Qué tipo de rutina buscas? Dime tu nivel, días disponibles y si tienes equipo.",
                    "¡Armemos tu rutina! ¿Cuál es tu objetivo: fuerza, resistencia o flexibilidad?",
                    "Cuéntame cuánto tiempo tienes por sesión y en qué quieres enfocarte.",
                ],
                follow_ups: &[
                    ("Ajustar rutina", "Ajusta la rutina para hacerla más corta"),
                    ("Plan de comidas", "Crea un plan de comidas que complemente esta rutina"),
                ],
            },
            IntentProfile {
                intent: Intent::Recipe,
                label: "Receta saludable",
                keywords: rule(
                    r"(?i)(receta|cocinar|recipe|platillo|preparar\s+(una\s+|un\s+)?(comida|cena|desayuno|almuerzo)|qu[eé]\s+(puedo\s+)?comer)",
                ),
                tool_names: &["recipe", "generateRecipe", "generate_recipe"],
                payload_kind: Some(PayloadKind::Recipe),
                payload_keys: &["recipe"],
                clarification_prompts: &[
                    "¿Qué tipo de receta te gustaría? Cuéntame ingredientes, restricciones o el tiempo que tienes.",
                    "¡Me encanta cocinar contigo! ¿Tienes algún ingrediente o antojo en mente?",
                    "¿Buscas algo dulce, salado, ligero o contundente? Dime tus preferencias.",
                ],
                follow_ups: &[
                    ("Otra receta", "Dame otra receta diferente"),
                    ("Más ligera", "Dame una receta más ligera y baja en calorías"),
                ],
            },
            IntentProfile {
                intent: Intent::Exercise,
                label: "Ejercicio",
                keywords: rule(
                    r"(?i)(ejercicio|entrenar|entrenamiento|exercise|workout|estiramiento|cardio|yoga)",
                ),
                tool_names: &["exercise", "generateExercise", "generate_exercise"],
                payload_kind: Some(PayloadKind::Exercise),
                payload_keys: &["exercise"],
                clarification_prompts: &[
                    "¿Qué zona del cuerpo quieres trabajar y cuánto tiempo tienes?",
                    "¡A moverse! ¿Prefieres algo de fuerza, cardio o estiramiento?",
                    "Cuéntame tu nivel y si tienes alguna molestia o lesión.",
                ],
                follow_ups: &[
                    ("Otro ejercicio", "Sugiéreme otro ejercicio"),
                    ("Más intenso", "Dame una versión más intensa de este ejercicio"),
                ],
            },
            IntentProfile {
                intent: Intent::Motivation,
                label: "Motivación",
                keywords: rule(
                    r"(?i)(motivaci[oó]n|motivar|mot[ií]vame|[aá]nimo|triste|estr[eé]s|ansiedad|cansad[oa]|desanimad[oa]|motivation)",
                ),
                tool_names: &[
                    "motivation",
                    "motivational_support",
                    "generateMotivationalSupport",
                    "generate_motivational_support",
                ],
                payload_kind: Some(PayloadKind::Motivation),
                payload_keys: &["motivation"],
                clarification_prompts: &[
                    "¿Cómo te sientes hoy? Cuéntame qué te gustaría lograr.",
                    "Estoy aquí para ti. ¿Sobre qué tema necesitas un empujón?",
                    "¿Qué te está costando más últimamente? Hablemos de ello.",
                ],
                follow_ups: &[
                    ("Más motivación", "Dame más motivación"),
                    ("Consejo práctico", "Dame un consejo práctico para tener más ánimo hoy"),
                ],
            },
            IntentProfile {
                intent: Intent::General,
                label: "Conversar",
                keywords: None,
                tool_names: &["general"],
                payload_kind: Some(PayloadKind::Motivation),
                payload_keys: &["motivation"],
                clarification_prompts: &["¿En qué puedo ayudarte hoy?"],
                follow_ups: &[],
            },
        ];

        Self { profiles }
    }

    /// All profiles in classification order.
    pub fn profiles(&self) -> impl Iterator<Item = &IntentProfile> {
        self.profiles.iter()
    }

    /// The profile for an intent. Every intent has exactly one.
    pub fn profile(&self, intent: Intent) -> &IntentProfile {
        self.profiles
            .iter()
            .find(|p| p.intent == intent)
            .unwrap_or_else(|| self.general())
    }

    fn general(&self) -> &IntentProfile {
        // `build` always ends with the general profile.
        &self.profiles[self.profiles.len() - 1]
    }

    /// Looks up the intent a `tool_used` value refers to.
    pub fn by_tool(&self, tool_used: &str) -> Option<&IntentProfile> {
        let tool = tool_used.trim();
        self.profiles.iter().find(|p| {
            p.tool_names.iter().any(|name| name.eq_ignore_ascii_case(tool))
                || p.intent.as_ref() == tool
        })
    }

    /// First intent whose keyword rule matches `text`.
    pub fn match_text(&self, text: &str) -> Option<Intent> {
        self.profiles
            .iter()
            .find(|p| p.matches(text))
            .map(|p| p.intent)
    }

    /// The top-level menu.
    pub fn default_menu(&self) -> Vec<QuickOption> {
        self.profiles
            .iter()
            .filter(|p| p.intent != Intent::General)
            .map(|p| {
                QuickOption::new(
                    format!("menu-{}", p.intent),
                    p.label,
                    MenuAction::SelectIntent(p.intent),
                )
            })
            .collect()
    }

    /// Follow-up options for an intent plus a way back to the menu.
    pub fn more_info_menu(&self, intent: Intent) -> Vec<QuickOption> {
        let profile = self.profile(intent);
        let mut options: Vec<QuickOption> = profile
            .follow_ups
            .iter()
            .enumerate()
            .map(|(index, (label, text))| {
                QuickOption::new(
                    format!("{}-more-{}", intent, index),
                    *label,
                    MenuAction::Ask((*text).to_string()),
                )
            })
            .collect();
        options.push(QuickOption::new("menu", "Menú principal", MenuAction::ShowMenu));
        options
    }
}
