//! System prompt template and strict rendering.
//!
//! The template has exactly two inputs: the tool descriptions and the
//! authorized-imports list. Rendering is strict in both directions — an
//! unresolved placeholder and an unused variable are both render-time errors,
//! so a broken template is caught at agent construction, not as silently
//! blank instructions.

use reagent_core::{ReagentError, Result};
use reagent_tools::ToolRegistry;

pub const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are an expert assistant who can solve any task using code. You will be given a task to solve as best you can.

To solve the task, you must plan forward in a cycle of 'Thought:', 'Summary:', and code sequences.

At each step:
- In the 'Thought:' section, explain your reasoning towards solving the task and the tools you want to use.
- In the 'Summary:' section, write one short line summarizing what this step does. Every reply must contain a 'Summary:' line.
- Then write your code in a fenced block that starts with ```py and ends with ```<end_code>.

The code runs in a restricted interpreter. Keep it simple and linear: assignments, arithmetic, f-strings, list indexing, calls to the tools listed below, and print(...). Loops, conditionals, function definitions, and attribute access are not available. Variables persist between code blocks.

Use print(...) to save important information; everything you print shows up in the 'Observation:' message of the next step. When you know the final answer, call final_answer(answer) to return it and end the task.

You only have access to these tools:
{{tool_descriptions}}

You can also import these modules:
{{authorized_imports}}

Rules you must follow:
1. Always provide a 'Thought:' section, a 'Summary:' line, and a ```py code block ending with ```<end_code>.
2. Use only variables that you have defined.
3. Pass tool arguments directly, e.g. web_search(query="latest news"), never as a dict.
4. Don't chain too many tool calls in one block when their output format is unpredictable; print intermediate results and continue in the next step.
5. Call a tool only when needed, and never repeat a call with the exact same arguments.

Now begin!"#;

/// Render the system prompt from the registry and the authorized-imports list.
pub fn render_system_prompt(registry: &ToolRegistry, authorized_imports: &[String]) -> Result<String> {
    let tool_descriptions = describe_tools(registry);
    let imports = format!(
        "[{}]",
        authorized_imports
            .iter()
            .map(|m| format!("'{m}'"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    render_template(
        SYSTEM_PROMPT_TEMPLATE,
        &[
            ("tool_descriptions", tool_descriptions.as_str()),
            ("authorized_imports", imports.as_str()),
        ],
    )
}

/// Render `{{name}}` placeholders with strict-undefined semantics.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut used = vec![false; vars.len()];
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return Err(ReagentError::Template(
                "unclosed '{{' placeholder".to_string(),
            ));
        };
        let name = after[..end].trim();
        match vars.iter().position(|(key, _)| *key == name) {
            Some(i) => {
                used[i] = true;
                out.push_str(vars[i].1);
            }
            None => {
                return Err(ReagentError::Template(format!(
                    "placeholder '{{{{{name}}}}}' has no value"
                )));
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    if let Some(i) = used.iter().position(|u| !*u) {
        return Err(ReagentError::Template(format!(
            "variable '{}' is not referenced by the template",
            vars[i].0
        )));
    }

    Ok(out)
}

fn describe_tools(registry: &ToolRegistry) -> String {
    let mut blocks = Vec::new();
    for tool in registry.tools() {
        let params = tool.parameters();
        let inputs = if params.is_empty() {
            "none".to_string()
        } else {
            params
                .iter()
                .map(|p| format!("{} ({}): {}", p.name, p.kind.as_str(), p.description))
                .collect::<Vec<_>>()
                .join("; ")
        };
        blocks.push(format!(
            "- {}: {}\n    Takes inputs: {}\n    Returns an output of type: {}",
            tool.name(),
            tool.description(),
            inputs,
            tool.output_kind().as_str()
        ));
    }
    blocks.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reagent_tools::TERMINAL_TOOL_NAME;

    #[test]
    fn test_render_system_prompt_includes_tools_and_imports() {
        let registry = ToolRegistry::with_tools(vec![]).unwrap();
        let prompt =
            render_system_prompt(&registry, &["math".to_string(), "re".to_string()]).unwrap();
        assert!(prompt.contains(TERMINAL_TOOL_NAME));
        assert!(prompt.contains("['math', 're']"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_unknown_placeholder_is_render_error() {
        let err = render_template("hello {{missing}}", &[]).unwrap_err();
        assert!(matches!(err, ReagentError::Template(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_unused_variable_is_render_error() {
        let err = render_template("no placeholders", &[("extra", "x")]).unwrap_err();
        assert!(matches!(err, ReagentError::Template(_)));
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn test_unclosed_placeholder_is_render_error() {
        let err = render_template("broken {{oops", &[("oops", "x")]).unwrap_err();
        assert!(matches!(err, ReagentError::Template(_)));
    }

    #[test]
    fn test_render_substitutes_all_occurrences_in_order() {
        let out = render_template("a={{x}} b={{y}}", &[("x", "1"), ("y", "2")]).unwrap();
        assert_eq!(out, "a=1 b=2");
    }
}
