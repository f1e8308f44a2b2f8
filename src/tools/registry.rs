//! Name-keyed tool registry.

use std::sync::Arc;

use super::tool::Tool;
use super::types::ToolDefinition;
use crate::error::{AgentError, Result};

/// Ordered set of uniquely named tools.
///
/// Tools are held as `Arc`s, so cloning or filtering a registry copies
/// membership while sharing the tool instances.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Fails if the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.has(tool.name()) {
            return Err(AgentError::ToolAlreadyRegistered(tool.name().to_string()));
        }
        tracing::debug!(tool = tool.name(), "registered tool");
        self.tools.push(tool);
        Ok(())
    }

    pub fn register_all(&mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<()> {
        tools.into_iter().try_for_each(|tool| self.register(tool))
    }

    /// Remove a tool by name. Returns whether it was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.tools.len();
        self.tools.retain(|tool| tool.name() != name);
        before != self.tools.len()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name() == name)
    }

    /// All tools in registration order.
    pub fn all(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition().clone()).collect()
    }

    /// Tools whose names appear in `names`, in registration order.
    pub fn filter_by_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<dyn Tool>> {
        self.tools
            .iter()
            .filter(|tool| names.iter().any(|name| name.as_ref() == tool.name()))
            .cloned()
            .collect()
    }

    /// A new registry restricted to `allowed`. `None` or an empty list keeps every tool.
    pub fn filtered<S: AsRef<str>>(&self, allowed: Option<&[S]>) -> ToolRegistry {
        match allowed {
            Some(names) if !names.is_empty() => ToolRegistry {
                tools: self.filter_by_names(names),
            },
            _ => self.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.tools.clear();
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
