//! System prompt and environment context assembly.

use chrono::Local;

use crate::provider::ChatRequest;
use crate::tools::ToolDefinition;
use crate::types::{GenerationSettings, Message};

const TOOL_USAGE_HINT: &str =
    "When you need to use a tool, call it with the appropriate parameters.";

/// Assembles the pieces of a request that are plain text concatenation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Base prompt, then user memory, then a description of every tool.
    pub fn build_system_prompt(
        &self,
        base_prompt: Option<&str>,
        tools: &[ToolDefinition],
        user_memory: Option<&str>,
    ) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(base) = base_prompt.filter(|b| !b.is_empty()) {
            parts.push(base.to_string());
        }

        if let Some(memory) = user_memory.filter(|m| !m.is_empty()) {
            parts.push("\n## User Memory\n".to_string());
            parts.push(memory.to_string());
        }

        if !tools.is_empty() {
            parts.push("\n## Available Tools\n".to_string());
            parts.push("You have access to the following tools:".to_string());
            for tool in tools {
                parts.push(format!("\n### {}", tool.name));
                parts.push(tool.description.clone());
                parts.push("\nParameters:".to_string());
                parts.push(
                    serde_json::to_string_pretty(&tool.parameters)
                        .unwrap_or_else(|_| "{}".to_string()),
                );
            }
            parts.push(format!("\n\n{TOOL_USAGE_HINT}"));
        }

        parts.join("\n")
    }

    /// Date, time, platform and working directory.
    pub fn build_environment_context(&self) -> String {
        let now = Local::now();
        let mut parts = vec![
            format!("Current date: {}", now.format("%Y-%m-%d")),
            format!("Current time: {}", now.format("%H:%M:%S")),
            format!("Platform: {}", std::env::consts::OS),
        ];
        if let Ok(cwd) = std::env::current_dir() {
            parts.push(format!("Working directory: {}", cwd.display()));
        }
        parts.join("\n")
    }

    /// A system message with environment context, followed by `extra`.
    pub fn build_initial_history(&self, extra: impl IntoIterator<Item = Message>) -> Vec<Message> {
        std::iter::once(Message::system(self.build_environment_context()))
            .chain(extra)
            .collect()
    }

    /// Request carrying `messages`, the assembled system prompt and the tools.
    pub fn build_chat_request(
        &self,
        messages: Vec<Message>,
        system_prompt: Option<&str>,
        tools: Vec<ToolDefinition>,
        user_memory: Option<&str>,
    ) -> ChatRequest {
        let prompt = self.build_system_prompt(system_prompt, &tools, user_memory);
        ChatRequest {
            messages,
            system_prompt: (!prompt.is_empty()).then_some(prompt),
            tools,
            model: None,
            settings: GenerationSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParameterSchema;
    use crate::types::Role;

    #[test]
    fn system_prompt_lists_tools_after_memory() {
        let tools = vec![ToolDefinition::new(
            "read_file",
            "Read a file from disk",
            ParameterSchema::object().string("path", "File path", true).build(),
        )];

        let prompt = ContextBuilder::new().build_system_prompt(
            Some("You are helpful."),
            &tools,
            Some("Prefers short answers."),
        );

        assert!(prompt.starts_with("You are helpful."));
        let memory_at = prompt.find("## User Memory").unwrap();
        let tools_at = prompt.find("## Available Tools").unwrap();
        assert!(memory_at < tools_at);
        assert!(prompt.contains("### read_file"));
        assert!(prompt.contains("\"path\""));
        assert!(prompt.ends_with(TOOL_USAGE_HINT));
    }

    #[test]
    fn empty_inputs_give_empty_prompt() {
        let builder = ContextBuilder::new();
        assert_eq!(builder.build_system_prompt(None, &[], None), "");

        let request = builder.build_chat_request(vec![], None, vec![], None);
        assert!(request.system_prompt.is_none());
    }

    #[test]
    fn initial_history_starts_with_environment() {
        let history = ContextBuilder::new().build_initial_history(vec![Message::user("hi")]);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::System);
        assert!(history[0].text().contains("Platform:"));
        assert_eq!(history[1].text(), "hi");
    }
}
