//! Normalization of tool responses into messages.
//!
//! Live responses and persisted transcript entries go through the same
//! [`ResponseMapper::normalize`] step, driven by the intent catalog, so a
//! result carries the same payload and options whether it just arrived or
//! was reloaded. Reloaded turns show the stored `reply` as their text.

use uuid::Uuid;
use vitalis_core::error::Result;
use vitalis_core::intent::{Intent, IntentCatalog};
use vitalis_core::message::{Message, MessageId, MessageUpdate};
use vitalis_core::session::{
    ToolResponse, TranscriptEntry, TranscriptPage, decode_ai_response, encode_ai_response,
};

/// Translates between tool responses, transcript entries and messages.
#[derive(Debug, Clone, Copy)]
pub struct ResponseMapper {
    catalog: &'static IntentCatalog,
}

impl Default for ResponseMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseMapper {
    pub fn new() -> Self {
        Self {
            catalog: IntentCatalog::global(),
        }
    }

    /// Resolves the intent a response belongs to: its `tool_used` when the
    /// catalog knows it, otherwise `fallback`.
    pub fn resolve_intent(&self, response: &ToolResponse, fallback: Intent) -> Intent {
        response
            .tool_used
            .as_deref()
            .and_then(|tool| self.catalog.by_tool(tool))
            .map(|profile| profile.intent)
            .unwrap_or(fallback)
    }

    /// Shared normalization step.
    ///
    /// Text is `data.message`, else `data.clarificationQuestion`, else
    /// `reply`. Options are the intent's follow-up menu when the intent allows
    /// follow-ups and data is present, otherwise the top-level menu.
    pub fn normalize(&self, response: &ToolResponse, intent: Intent) -> MessageUpdate {
        let profile = self.catalog.profile(intent);

        let text = response
            .data_str("message")
            .or_else(|| response.data_str("clarificationQuestion"))
            .unwrap_or(response.reply.as_str())
            .to_string();

        let payload = response
            .data
            .as_ref()
            .and_then(|data| profile.extract_payload(data));

        let quick_options = if profile.allows_follow_ups() && response.has_data() {
            self.catalog.more_info_menu(intent)
        } else {
            self.catalog.default_menu()
        };

        MessageUpdate {
            text,
            quick_options,
            payload,
            is_error: false,
        }
    }

    /// Maps a response that just arrived for a turn classified as `classified`.
    pub fn from_live_response(&self, response: &ToolResponse, classified: Intent) -> MessageUpdate {
        let intent = self.resolve_intent(response, classified);
        self.normalize(response, intent)
    }

    /// Rebuilds the user and agent messages of one persisted exchange.
    ///
    /// `position` is the entry's chronological index in the whole transcript.
    /// The agent text is the stored `reply`. An `aiResponse` that does not
    /// decode is shown verbatim with no payload; this is expected for legacy
    /// entries and is not an error.
    pub fn from_transcript(
        &self,
        session_id: &str,
        entry: &TranscriptEntry,
        position: u32,
    ) -> [Message; 2] {
        let user = Message::user(entry.question.clone())
            .with_id(transcript_message_id(session_id, entry, position, "user"))
            .with_timestamp(entry.timestamp);

        let agent_id = transcript_message_id(session_id, entry, position, "agent");
        let agent = match decode_ai_response(&entry.ai_response_raw) {
            Ok(response) => {
                let intent = self.resolve_intent(&response, Intent::General);
                let update = self.normalize(&response, intent);
                Message::agent(response.reply, update.quick_options).with_payload(update.payload)
            }
            Err(e) => {
                tracing::debug!(
                    "[ResponseMapper] Transcript entry shown as plain text: {}",
                    e
                );
                Message::agent(entry.ai_response_raw.clone(), self.catalog.default_menu())
            }
        };

        [user, agent.with_id(agent_id).with_timestamp(entry.timestamp)]
    }

    /// Rebuilds a page of entries, preserving order.
    pub fn from_transcript_page(&self, session_id: &str, page: &TranscriptPage) -> Vec<Message> {
        let first = page.first_position();
        page.entries
            .iter()
            .zip(first..)
            .flat_map(|(entry, position)| self.from_transcript(session_id, entry, position))
            .collect()
    }

    /// Encodes a client-side exchange for the remote transcript.
    pub fn to_transcript_entry(&self, question: &str, response: &ToolResponse) -> Result<TranscriptEntry> {
        Ok(TranscriptEntry::new(question, encode_ai_response(response)?))
    }
}

/// Deterministic id for a reconstructed message.
///
/// Reloading the same entry always yields the same id, which is what lets
/// pagination drop duplicates. The position keeps repeated questions asked
/// within the same second apart.
fn transcript_message_id(
    session_id: &str,
    entry: &TranscriptEntry,
    position: u32,
    role: &str,
) -> MessageId {
    let key = format!(
        "{}|{}|{}|{}|{}|{}",
        session_id,
        position,
        entry.timestamp.to_rfc3339(),
        entry.question,
        entry.ai_response_raw,
        role
    );
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes());
    MessageId::new(format!("hist-{}", uuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vitalis_core::message::{MenuAction, Payload, PayloadKind, Sender};

    fn entry(question: &str, raw: &str) -> TranscriptEntry {
        TranscriptEntry::new(question, raw)
    }

    #[test]
    fn test_non_json_transcript_degrades_to_text() {
        let [user, agent] = ResponseMapper::new().from_transcript("s-1", &entry("hi", "not json"), 0);

        assert_eq!(user.sender, Sender::User);
        assert_eq!(user.text.as_deref(), Some("hi"));
        assert_eq!(agent.sender, Sender::Agent);
        assert_eq!(agent.text.as_deref(), Some("not json"));
        assert!(agent.payload.is_none());
        assert!(!agent.is_error);
    }

    #[test]
    fn test_transcript_payload_selected_by_tool_used() {
        let raw = json!({
            "reply": "Tu rutina está lista",
            "tool_used": "exercise_routine",
            "data": {"routine": {"title": "Fuerza", "days": []}}
        })
        .to_string();

        let [_, agent] = ResponseMapper::new().from_transcript("s-1", &entry("rutina", &raw), 0);
        assert_eq!(agent.text.as_deref(), Some("Tu rutina está lista"));
        assert_eq!(
            agent.payload.as_ref().map(Payload::kind),
            Some(PayloadKind::FullRoutine)
        );
    }

    #[test]
    fn test_text_priority() {
        let mapper = ResponseMapper::new();
        let response = ToolResponse::new("reply").with_data(json!({
            "message": "from message",
            "clarificationQuestion": "from question"
        }));
        assert_eq!(mapper.from_live_response(&response, Intent::Recipe).text, "from message");

        let response = ToolResponse::new("reply")
            .with_data(json!({"clarificationQuestion": "¿Para cuántas personas?"}));
        assert_eq!(
            mapper.from_live_response(&response, Intent::Recipe).text,
            "¿Para cuántas personas?"
        );

        let response = ToolResponse::new("reply");
        assert_eq!(mapper.from_live_response(&response, Intent::Recipe).text, "reply");
    }

    #[test]
    fn test_options_depend_on_follow_ups_and_data() {
        let mapper = ResponseMapper::new();
        let catalog = IntentCatalog::global();

        let with_data = ToolResponse::new("ok").with_data(json!({"recipe": {"title": "Sopa"}}));
        assert_eq!(
            mapper.from_live_response(&with_data, Intent::Recipe).quick_options,
            catalog.more_info_menu(Intent::Recipe)
        );

        let without_data = ToolResponse::new("ok");
        assert_eq!(
            mapper.from_live_response(&without_data, Intent::Recipe).quick_options,
            catalog.default_menu()
        );

        // General never offers follow-ups.
        let general = ToolResponse::new("ok").with_data(json!({"motivation": {"message": "¡Vamos!"}}));
        let options = mapper.from_live_response(&general, Intent::General).quick_options;
        assert!(options
            .iter()
            .any(|o| matches!(o.action, MenuAction::SelectIntent(_))));
    }

    #[test]
    fn test_reloaded_turn_keeps_payload_and_shows_reply() {
        let mapper = ResponseMapper::new();
        let response = ToolResponse::new("Receta lista")
            .with_tool("generateRecipe")
            .with_data(json!({
                "message": "Aquí tienes tus tacos",
                "recipe": {"title": "Tacos de frijol", "ingredients": ["frijol"]}
            }));

        let live = mapper.from_live_response(&response, Intent::General);
        let stored = mapper.to_transcript_entry("tacos", &response).unwrap();
        let [_, reloaded] = mapper.from_transcript("s-1", &stored, 0);

        assert_eq!(live.text, "Aquí tienes tus tacos");
        assert_eq!(reloaded.text.as_deref(), Some("Receta lista"));
        assert!(reloaded.payload.is_some());
        assert_eq!(reloaded.payload, live.payload);
        assert_eq!(reloaded.quick_options, live.quick_options);
    }

    #[test]
    fn test_transcript_text_ignores_data_message() {
        let raw = json!({
            "reply": "R",
            "tool_used": "recipe",
            "data": {"message": "M", "clarificationQuestion": "Q"}
        })
        .to_string();

        let [_, agent] = ResponseMapper::new().from_transcript("s-1", &entry("hola", &raw), 0);
        assert_eq!(agent.text.as_deref(), Some("R"));
    }

    #[test]
    fn test_transcript_ids_are_stable() {
        let mapper = ResponseMapper::new();
        let e = entry("hola", "plain");
        let first = mapper.from_transcript("s-1", &e, 4);
        let second = mapper.from_transcript("s-1", &e, 4);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[1].id, second[1].id);
        assert_ne!(first[0].id, first[1].id);

        let other_session = mapper.from_transcript("s-2", &e, 4);
        assert_ne!(first[0].id, other_session[0].id);
    }

    #[test]
    fn test_repeated_turns_get_distinct_ids() {
        let mapper = ResponseMapper::new();
        let e = entry("hola", "plain");
        let earlier = mapper.from_transcript("s-1", &e, 0);
        let later = mapper.from_transcript("s-1", &e, 1);
        assert_ne!(earlier[0].id, later[0].id);
        assert_ne!(earlier[1].id, later[1].id);
    }
}
