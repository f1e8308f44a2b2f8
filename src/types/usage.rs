//! Token usage reported by providers.

use serde::{Deserialize, Serialize};

/// Token counts as reported by the provider. Passed through, never computed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u32>,
}

impl UsageMetadata {
    /// Total tokens, falling back to prompt + candidates when no total was reported.
    pub fn total(&self) -> u32 {
        self.total_token_count.unwrap_or_else(|| {
            self.prompt_token_count.unwrap_or(0) + self.candidates_token_count.unwrap_or(0)
        })
    }

    /// Merge another usage into this one (accumulate).
    pub fn merge(&mut self, other: &UsageMetadata) {
        if let Some(v) = other.prompt_token_count {
            *self.prompt_token_count.get_or_insert(0) += v;
        }
        if let Some(v) = other.candidates_token_count {
            *self.candidates_token_count.get_or_insert(0) += v;
        }
        let total = other.total();
        if total > 0 || other.total_token_count.is_some() {
            *self.total_token_count.get_or_insert(0) += total;
        }
    }
}
