//! Tool-related types: parameter schemas, definitions, calls, results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

pub use crate::types::FunctionCall as ToolCall;

/// Kind of value a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParameterKind {
    /// Whether a JSON value is of this kind. `object` rejects arrays and null.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Recursive parameter schema, serialized in JSON Schema shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterSchema {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
        enum_values: Option<Vec<String>>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<ParameterSchema>>,
    },
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default)]
        properties: BTreeMap<String, ParameterSchema>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
    },
}

impl ParameterSchema {
    pub fn string(description: impl Into<String>) -> Self {
        Self::String {
            description: Some(description.into()),
            enum_values: None,
        }
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::Number {
            description: Some(description.into()),
        }
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::Boolean {
            description: Some(description.into()),
        }
    }

    pub fn array(description: impl Into<String>, items: ParameterSchema) -> Self {
        Self::Array {
            description: Some(description.into()),
            items: Some(Box::new(items)),
        }
    }

    /// An object schema with no properties.
    pub fn empty() -> Self {
        Self::Object {
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Start building an object schema.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder::default()
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::String { .. } => ParameterKind::String,
            Self::Number { .. } => ParameterKind::Number,
            Self::Boolean { .. } => ParameterKind::Boolean,
            Self::Array { .. } => ParameterKind::Array,
            Self::Object { .. } => ParameterKind::Object,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::String { description, .. }
            | Self::Number { description }
            | Self::Boolean { description }
            | Self::Array { description, .. }
            | Self::Object { description, .. } => description.as_deref(),
        }
    }
}

/// Builder for object parameter schemas.
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    properties: BTreeMap<String, ParameterSchema>,
    required: Vec<String>,
}

impl ParameterBuilder {
    /// Add an arbitrary property.
    pub fn property(mut self, name: impl Into<String>, schema: ParameterSchema, required: bool) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(name, ParameterSchema::string(description), required)
    }

    pub fn number(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(name, ParameterSchema::number(description), required)
    }

    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.property(name, ParameterSchema::boolean(description), required)
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        let schema = ParameterSchema::String {
            description: Some(description.into()),
            enum_values: Some(values.iter().map(|v| v.to_string()).collect()),
        };
        self.property(name, schema, required)
    }

    pub fn array(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        items: ParameterSchema,
        required: bool,
    ) -> Self {
        self.property(name, ParameterSchema::array(description, items), required)
    }

    pub fn build(self) -> ParameterSchema {
        ParameterSchema::Object {
            description: None,
            properties: self.properties,
            required: self.required,
        }
    }
}

/// What the model sees of a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Classification of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolErrorKind {
    ToolNotFound,
    InvalidParameters,
    ExecutionError,
    Timeout,
    PermissionDenied,
}

/// Error payload of a failed tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub kind: ToolErrorKind,
}

/// Outcome of one tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResult {
    pub fn ok(result: impl Into<Value>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(ToolError {
                message: message.into(),
                code: None,
                kind,
            }),
        }
    }

    /// Attach a machine-readable code to a failure.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.code = Some(code.into());
        }
        self
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Payload fed back to the model: the result, or `{"error": message}`.
    pub fn response_value(&self) -> Value {
        if self.success {
            self.result.clone().unwrap_or(Value::Null)
        } else {
            serde_json::json!({ "error": self.error_message().unwrap_or("Unknown error") })
        }
    }
}
