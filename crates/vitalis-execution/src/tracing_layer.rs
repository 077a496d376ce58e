//! Tracing layer forwarding conversation events to the UI.
//!
//! The orchestrator logs with a `[Component]` prefix. This layer picks up
//! events from the Vitalis crates, splits the prefix off into a field, and
//! sends each event through a tokio channel so a presentation layer can show
//! progress (dispatching, retrying, superseded) without polling.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Target prefix of events forwarded by default.
pub const DEFAULT_TARGET_PREFIX: &str = "vitalis";

/// Event data sent to the UI
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationEvent {
    /// Event target (e.g., "vitalis_application::conversation_usecase")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    /// Component from the `[Component]` message prefix, if present
    pub component: Option<String>,
    /// Message with the prefix removed
    pub message: String,
    /// Structured fields from the event
    pub fields: HashMap<String, Value>,
    /// Fields of the enclosing span
    pub span: HashMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// Fields recorded on a span, kept in its extensions.
#[derive(Debug, Default, Clone)]
struct SpanFields(HashMap<String, Value>);

/// A tracing layer that sends conversation events to a channel
pub struct ConversationEventLayer {
    sender: mpsc::UnboundedSender<ConversationEvent>,
    target_prefix: &'static str,
}

impl ConversationEventLayer {
    /// Creates a layer forwarding events whose target starts with `vitalis`.
    pub fn new(sender: mpsc::UnboundedSender<ConversationEvent>) -> Self {
        Self {
            sender,
            target_prefix: DEFAULT_TARGET_PREFIX,
        }
    }

    fn accepts(&self, target: &str) -> bool {
        target.starts_with(self.target_prefix)
    }
}

impl<S> Layer<S> for ConversationEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = SpanFields::default();
        attrs.record(&mut FieldVisitor(&mut fields.0));
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldVisitor(&mut fields.0));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !self.accepts(target) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let mut span_fields = HashMap::new();
        if let Some(span) = ctx.event_span(event) {
            let extensions = span.extensions();
            if let Some(stored) = extensions.get::<SpanFields>() {
                span_fields = stored.0.clone();
            }
        }

        let raw = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let (component, message) = split_component(&raw);

        let conversation_event = ConversationEvent {
            target: target.to_string(),
            level: event.metadata().level().to_string(),
            component,
            message,
            fields,
            span: span_fields,
            timestamp: Utc::now(),
        };

        // A dropped receiver just means nobody is listening.
        let _ = self.sender.send(conversation_event);
    }
}

/// Splits `"[Component] text"` into `(Some("Component"), "text")`.
fn split_component(raw: &str) -> (Option<String>, String) {
    if let Some(rest) = raw.strip_prefix('[') {
        if let Some((component, message)) = rest.split_once(']') {
            if !component.is_empty() && !component.contains(char::is_whitespace) {
                return (Some(component.to_string()), message.trim_start().to_string());
            }
        }
    }
    (None, raw.to_string())
}

/// Field visitor that extracts tracing fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}
