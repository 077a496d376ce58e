//! Ordered, capped log of rendered messages.
//!
//! The store is a local reconstruction of the conversation. The remote
//! transcript stays authoritative, so trimming here never loses data.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use vitalis_core::message::{Message, MessageId, MessagePatch};

/// Process-wide sequence shared by every store.
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Generates ids that sort in insertion order, as strings too.
///
/// The timestamp part is clamped so a clock step backwards cannot reorder
/// ids; the sequence part breaks ties within one millisecond.
#[derive(Debug, Default)]
struct IdGenerator {
    last_millis: i64,
}

impl IdGenerator {
    fn next(&mut self) -> MessageId {
        let millis = Utc::now().timestamp_millis().max(self.last_millis);
        self.last_millis = millis;
        let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        MessageId::new(format!("msg-{:013}-{:020}", millis, sequence))
    }
}

/// The rendered conversation for the active session.
#[derive(Debug)]
pub struct MessageStore {
    messages: Vec<Message>,
    max_history: usize,
    ids: IdGenerator,
}

impl MessageStore {
    /// Creates an empty store keeping at least `max_history` recent messages.
    pub fn new(max_history: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_history: max_history.max(1),
            ids: IdGenerator::default(),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Appends `message` with a fresh id and returns the id.
    pub fn append(&mut self, message: Message) -> MessageId {
        let id = self.ids.next();
        self.messages.push(message.with_id(id.clone()));
        self.trim();
        id
    }

    /// Applies `patch` to the message with `id` in place.
    ///
    /// Returns false if no such message exists (it was trimmed or the store
    /// was reset).
    pub fn update(&mut self, id: &MessageId, patch: MessagePatch) -> bool {
        match self.messages.iter_mut().find(|m| &m.id == id) {
            Some(message) => {
                message.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Once the store holds more than twice `max_history` messages, keeps
    /// only the most recent `max_history`.
    pub fn trim(&mut self) {
        if self.messages.len() > self.max_history * 2 {
            let excess = self.messages.len() - self.max_history;
            self.messages.drain(..excess);
            tracing::debug!("[MessageStore] Trimmed {} old messages", excess);
        }
    }

    /// Replaces the whole conversation, keeping the given ids.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Inserts older messages before the current ones, keeping their ids.
    pub fn prepend(&mut self, older: Vec<Message>) {
        if older.is_empty() {
            return;
        }
        let mut merged = older;
        merged.append(&mut self.messages);
        self.messages = merged;
    }

    /// Drops loading placeholders left behind by abandoned requests.
    pub fn remove_loading(&mut self) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| !m.is_loading);
        before - self.messages.len()
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.get(id).is_some()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
