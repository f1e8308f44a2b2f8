//! Typed access to tool call arguments.

use serde_json::{Map, Value};

use crate::error::AgentError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// The raw argument map.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, AgentError> {
        self.get_str_opt(key)
            .ok_or_else(|| AgentError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Get a non-negative integer argument. Floats are truncated.
    pub fn get_u64_opt(&self, key: &str) -> Option<u64> {
        let value = self.values.get(key)?;
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, AgentError> {
        self.values
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| AgentError::InvalidArgument(format!("Missing number argument: {key}")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, AgentError> {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| AgentError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// String elements of an array argument; non-string elements are skipped.
    pub fn get_str_list_opt(&self, key: &str) -> Option<Vec<String>> {
        self.values.get(key).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    }

    /// An optional array of strings. Fails if the value is present but is not
    /// an array, or if any element is not a string.
    pub fn get_str_list(&self, key: &str) -> Result<Option<Vec<String>>, AgentError> {
        let Some(value) = self.values.get(key) else {
            return Ok(None);
        };
        let invalid = || AgentError::InvalidArgument(format!("{key} must be an array of strings"));
        value
            .as_array()
            .ok_or_else(invalid)?
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, AgentError> {
        serde_json::from_value(Value::Object(self.values.clone())).map_err(|e| {
            AgentError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}
