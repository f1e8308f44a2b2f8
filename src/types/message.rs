//! Message types for model communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<MessagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a message from explicit parts.
    pub fn new(role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            role,
            parts,
            timestamp: Some(Utc::now()),
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![MessagePart::text(text)])
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![MessagePart::text(text)])
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![MessagePart::text(text)])
    }

    /// Create a tool message answering one function call.
    pub fn tool_response(response: FunctionResponse) -> Self {
        Self::new(Role::Tool, vec![MessagePart::FunctionResponse(response)])
    }

    /// Concatenate all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Function calls carried by this message.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// True when the message has no parts, or only whitespace text parts.
    pub fn is_blank(&self) -> bool {
        self.parts.iter().all(|part| match part {
            MessagePart::Text { text } => text.trim().is_empty(),
            _ => false,
        })
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::user(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::user(text)
    }
}

/// Conversation role.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single part of message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
            id: None,
        }
    }

    /// Build a call from a JSON value; non-object values yield empty arguments.
    pub fn from_value(name: impl Into<String>, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(name, args)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The answer to a function call, fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_detection_ignores_whitespace_text() {
        assert!(Message::new(Role::User, vec![]).is_blank());
        assert!(Message::user("  \n").is_blank());
        assert!(!Message::user("hi").is_blank());

        let call = FunctionCall::from_value("read_file", json!({"path": "a"}));
        let msg = Message::new(Role::Assistant, vec![MessagePart::FunctionCall(call)]);
        assert!(!msg.is_blank());
    }

    #[test]
    fn parts_serialize_with_type_tag() {
        let msg = Message::new(
            Role::Assistant,
            vec![
                MessagePart::text("checking"),
                MessagePart::FunctionCall(
                    FunctionCall::from_value("ls", json!({"dir": "."})).with_id("c1"),
                ),
            ],
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["parts"][0], json!({"type": "text", "text": "checking"}));
        assert_eq!(value["parts"][1]["type"], "function_call");
        assert_eq!(value["parts"][1]["id"], "c1");

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back.function_calls().len(), 1);
        assert_eq!(back.text(), "checking");
    }

    #[test]
    fn non_object_args_become_empty() {
        let call = FunctionCall::from_value("noop", json!([1, 2]));
        assert!(call.args.is_empty());
    }
}
