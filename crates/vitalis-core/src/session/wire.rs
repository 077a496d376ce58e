//! Encoding of tool responses inside transcript entries.
//!
//! A persisted `aiResponse` is a JSON object `{v, reply, tool_used, data}`.
//! Entries written before versioning have no `v` and read as version 1.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current `aiResponse` encoding version.
pub const AI_RESPONSE_VERSION: u32 = 1;

/// The uniform result of a generation or remote send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Conversational text from the model
    #[serde(default)]
    pub reply: String,
    /// Name of the tool that produced `data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
    /// Structured tool output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResponse {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            tool_used: None,
            data: None,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool_used = Some(tool.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Non-empty string field of `data`, if any.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .as_ref()?
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// True when `data` carries anything beyond null or an empty object.
    pub fn has_data(&self) -> bool {
        match &self.data {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct AiResponseEnvelope {
    #[serde(default = "legacy_version")]
    v: u32,
    #[serde(flatten)]
    response: ToolResponse,
}

fn legacy_version() -> u32 {
    1
}

/// Encodes a response for the `aiResponse` field.
pub fn encode_ai_response(response: &ToolResponse) -> Result<String> {
    let envelope = AiResponseEnvelope {
        v: AI_RESPONSE_VERSION,
        response: response.clone(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes an `aiResponse` field.
///
/// Fails for non-JSON text, JSON that is not an object, and versions newer
/// than this build understands. Callers treat failure as plain text.
pub fn decode_ai_response(raw: &str) -> Result<ToolResponse> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(CoreError::Serialization {
            format: "JSON".to_string(),
            message: "aiResponse is not an object".to_string(),
        });
    }

    let envelope: AiResponseEnvelope = serde_json::from_value(value)?;
    if envelope.v > AI_RESPONSE_VERSION {
        return Err(CoreError::Serialization {
            format: "JSON".to_string(),
            message: format!("unsupported aiResponse version {}", envelope.v),
        });
    }

    Ok(envelope.response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_writes_version() {
        let raw = encode_ai_response(&ToolResponse::new("hola").with_tool("recipe")).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["v"], 1);
        assert_eq!(value["tool_used"], "recipe");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_decode_unversioned_legacy_entry() {
        let raw = r#"{"reply":"Aquí tienes","tool_used":"recipe","data":{"recipe":{"title":"Sopa"}}}"#;
        let response = decode_ai_response(raw).unwrap();
        assert_eq!(response.reply, "Aquí tienes");
        assert_eq!(response.tool_used.as_deref(), Some("recipe"));
        assert!(response.has_data());
    }

    #[test]
    fn test_decode_rejects_plain_text_and_scalars() {
        assert!(decode_ai_response("not json").is_err());
        assert!(decode_ai_response("\"just a string\"").is_err());
    }

    #[test]
    fn test_decode_rejects_future_version() {
        let err = decode_ai_response(r#"{"v":2,"reply":"x"}"#).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_data_str_ignores_blank_values() {
        let response = ToolResponse::new("r").with_data(json!({"message": "  ", "other": 3}));
        assert_eq!(response.data_str("message"), None);
        assert_eq!(response.data_str("other"), None);
        assert!(response.has_data());
    }
}
