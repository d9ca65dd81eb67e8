//! final_answer tool — terminal signal that ends the agent loop.

use async_trait::async_trait;

use reagent_core::types::{ParamSpec, ValueKind};

use crate::{Tool, ToolOutput};

/// Identity passthrough. The executor treats a call to this tool as the end
/// of the run and captures its argument as the final answer.
pub struct FinalAnswerTool;

#[async_trait]
impl Tool for FinalAnswerTool {
    fn name(&self) -> &str {
        crate::TERMINAL_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Provides a final answer to the given problem. The answer supports full Markdown formatting including bold/italic text, lists, code blocks, tables, headers, and links."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec {
            name: "answer",
            kind: ValueKind::Opaque,
            description: "The final answer to the problem. Can include Markdown formatting for better presentation.",
        }]
    }

    fn output_kind(&self) -> ValueKind {
        ValueKind::Opaque
    }

    async fn invoke(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
        let answer = match args.get("answer") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Ok(ToolOutput::text(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_passthrough_string() {
        let out = FinalAnswerTool
            .invoke(json!({"answer": "42"}))
            .await
            .unwrap();
        assert_eq!(out.content, "42");
        assert!(!out.is_error);
    }

    #[tokio::test]
    async fn test_passthrough_number() {
        let out = FinalAnswerTool.invoke(json!({"answer": 4})).await.unwrap();
        assert_eq!(out.content, "4");
    }
}
