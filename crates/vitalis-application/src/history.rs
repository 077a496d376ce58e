//! Reduction of rendered messages to generation history.

use vitalis_core::generation::HistoryTurn;
use vitalis_core::message::{Message, Sender};

/// Builds the history passed to generation calls.
///
/// Takes the last `max_turns` settled messages. Loading placeholders and
/// error messages are skipped; payloads are flattened to their one-line
/// summary so the model sees what it produced before.
pub fn build_history(messages: &[Message], max_turns: usize) -> Vec<HistoryTurn> {
    let turns: Vec<HistoryTurn> = messages
        .iter()
        .filter(|m| !m.is_loading && !m.is_error)
        .filter_map(to_turn)
        .collect();

    let skip = turns.len().saturating_sub(max_turns);
    turns.into_iter().skip(skip).collect()
}

fn to_turn(message: &Message) -> Option<HistoryTurn> {
    let text = message
        .text
        .as_deref()
        .map(one_line)
        .filter(|t| !t.is_empty());
    let summary = message.payload.as_ref().map(|p| one_line(&p.summary()));

    let flattened = match (text, summary) {
        (Some(text), Some(summary)) => format!("{} [{}]", text, summary),
        (Some(text), None) => text,
        (None, Some(summary)) => summary,
        (None, None) => return None,
    };

    Some(match message.sender {
        Sender::User => HistoryTurn::user(flattened),
        Sender::Agent => HistoryTurn::model(flattened),
    })
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_core::generation::HistoryRole;
    use vitalis_core::message::{MessageUpdate, Payload, Recipe};

    #[test]
    fn test_skips_placeholders_and_errors() {
        let mut failed = Message::placeholder();
        failed.apply(MessageUpdate::error("falló", Vec::new()).into());
        let messages = vec![
            Message::user("hola"),
            failed,
            Message::placeholder(),
            Message::agent("¡Hola!", Vec::new()),
        ];

        let history = build_history(&messages, 10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, HistoryRole::User);
        assert_eq!(history[1], HistoryTurn::model("¡Hola!"));
    }

    #[test]
    fn test_flattens_payload_to_one_line() {
        let recipe = Recipe {
            title: "Ensalada\nfresca".to_string(),
            ingredients: vec!["lechuga".to_string()],
            ..Default::default()
        };
        let message =
            Message::agent("Aquí tienes:\n", Vec::new()).with_payload(Some(Payload::Recipe(recipe)));

        let history = build_history(&[message], 10);
        assert_eq!(
            history[0].text,
            "Aquí tienes: [Receta: Ensalada fresca (1 ingredientes)]"
        );
    }

    #[test]
    fn test_keeps_only_last_turns() {
        let messages: Vec<Message> = (0..8).map(|i| Message::user(format!("m{}", i))).collect();
        let history = build_history(&messages, 3);
        let texts: Vec<_> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["m5", "m6", "m7"]);
    }
}
