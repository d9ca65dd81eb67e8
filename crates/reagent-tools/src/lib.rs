//! Built-in tools exposed to the generated code during agent runs.
//!
//! Each tool implements the [`Tool`] trait. The [`ToolRegistry`] holds the
//! fixed set of tools for the lifetime of an agent and always contains the
//! terminal `final_answer` tool.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use reagent_core::types::{ParamSpec, ValueKind};
use reagent_core::{ReagentError, Result};

pub mod final_answer;
pub mod visit_webpage;
pub mod web_search;

pub use final_answer::FinalAnswerTool;
pub use visit_webpage::VisitWebpageTool;
pub use web_search::WebSearchTool;

/// Name of the terminal tool whose invocation ends the agent loop.
pub const TERMINAL_TOOL_NAME: &str = "final_answer";

/// Output from a tool invocation.
///
/// Tool-level failures (no results, timeout, HTTP error) come back as
/// descriptive `content` — they never crash the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// The core tool trait. Every tool exposed to the generated code implements this.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed to the model (e.g., "web_search").
    fn name(&self) -> &str;

    /// Human-readable description for the system prompt.
    fn description(&self) -> &str;

    /// Declared parameters, rendered into the system prompt.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Kind tag of the value the tool returns.
    fn output_kind(&self) -> ValueKind;

    /// Invoke the tool with a JSON object of named arguments.
    async fn invoke(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput>;
}

/// Registry of the tools available to one agent instance.
///
/// Fixed at construction; the terminal tool is always present. Names are
/// unique — a duplicate is a construction-time error, not a runtime surprise.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Build a registry from the given tools, appending the terminal tool.
    pub fn with_tools(tools: Vec<Box<dyn Tool>>) -> Result<Self> {
        let mut all = tools;
        if !all.iter().any(|t| t.name() == TERMINAL_TOOL_NAME) {
            all.push(Box::new(FinalAnswerTool));
        }

        {
            let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
            for tool in &all {
                if seen.insert(tool.name(), ()).is_some() {
                    return Err(ReagentError::Registry(format!(
                        "duplicate tool name: '{}'",
                        tool.name()
                    )));
                }
            }
        }

        Ok(Self { tools: all })
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn terminal_name(&self) -> &'static str {
        TERMINAL_TOOL_NAME
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyTool(&'static str);

    #[async_trait]
    impl Tool for DummyTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "dummy"
        }
        fn parameters(&self) -> Vec<ParamSpec> {
            vec![]
        }
        fn output_kind(&self) -> ValueKind {
            ValueKind::Text
        }
        async fn invoke(&self, _args: serde_json::Value) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::text("ok"))
        }
    }

    #[test]
    fn test_terminal_tool_always_present() {
        let registry = ToolRegistry::with_tools(vec![]).unwrap();
        assert!(registry.get(TERMINAL_TOOL_NAME).is_some());
        assert_eq!(registry.names(), vec![TERMINAL_TOOL_NAME]);
    }

    #[test]
    fn test_duplicate_name_fails_fast() {
        let tools: Vec<Box<dyn Tool>> =
            vec![Box::new(DummyTool("lookup")), Box::new(DummyTool("lookup"))];
        let err = ToolRegistry::with_tools(tools).unwrap_err();
        assert!(matches!(err, ReagentError::Registry(_)));
        assert!(err.to_string().contains("lookup"));
    }

    #[test]
    fn test_user_supplied_terminal_not_duplicated() {
        let tools: Vec<Box<dyn Tool>> = vec![Box::new(FinalAnswerTool)];
        let registry = ToolRegistry::with_tools(tools).unwrap();
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn test_get_by_name() {
        let tools: Vec<Box<dyn Tool>> = vec![Box::new(DummyTool("lookup"))];
        let registry = ToolRegistry::with_tools(tools).unwrap();
        assert!(registry.get("lookup").is_some());
        assert!(registry.get("missing").is_none());
    }
}
