//! Step parser — extracts thought / summary / code from a raw model reply.
//!
//! A tolerant marker-based scan, not a grammar: formatting noise elsewhere in
//! the reply never rejects it. Only the `Summary:` line is load-bearing (the
//! loop needs it for progress display), so only its absence is an error.

use thiserror::Error;

use reagent_core::ReagentError;

const THOUGHT_MARKER: &str = "Thought:";
const SUMMARY_MARKER: &str = "Summary:";

/// Structured fields pulled out of one model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// Free text between `Thought:` and the next `Summary:` marker. Empty
    /// when the reply carries no thought marker.
    pub thought: String,
    /// First line after the `Summary:` marker. Always present.
    pub summary: String,
    /// Contents of the first ```py fenced block, fences excluded and
    /// whitespace-trimmed. `None` when the reply has no fenced block — which
    /// is distinct from a present-but-empty block.
    pub code: Option<String>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no 'Summary:' line found in model reply")]
    MissingSummary,
}

impl From<ParseError> for ReagentError {
    fn from(e: ParseError) -> Self {
        ReagentError::Contract(e.to_string())
    }
}

pub fn parse_reply(text: &str) -> Result<ParsedReply, ParseError> {
    let summary = extract_summary(text).ok_or(ParseError::MissingSummary)?;
    Ok(ParsedReply {
        thought: extract_thought(text),
        summary,
        code: extract_code(text),
    })
}

/// Text after the first `Summary:` marker, up to (not including) the next
/// newline or `Thought:`/`Summary:` marker.
fn extract_summary(text: &str) -> Option<String> {
    let start = text.find(SUMMARY_MARKER)? + SUMMARY_MARKER.len();
    let rest = &text[start..];
    let mut line = rest.split('\n').next().unwrap_or("");
    for marker in [THOUGHT_MARKER, SUMMARY_MARKER] {
        if let Some(pos) = line.find(marker) {
            line = &line[..pos];
        }
    }
    Some(line.trim().to_string())
}

/// Everything between the `Thought:` marker and the next `Summary:` marker
/// (or end of text). Empty when there is no thought marker.
fn extract_thought(text: &str) -> String {
    let Some(pos) = text.find(THOUGHT_MARKER) else {
        return String::new();
    };
    let start = pos + THOUGHT_MARKER.len();
    let rest = &text[start..];
    let end = rest.find(SUMMARY_MARKER).unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

/// Contents of the first fenced block tagged `py` or `python`. Tolerates a
/// missing closing fence (the stop sentinel can eat it) by running to the end
/// of the text.
fn extract_code(text: &str) -> Option<String> {
    let mut lines = text.lines();
    loop {
        let line = lines.next()?;
        let trimmed = line.trim();
        if trimmed == "```py" || trimmed == "```python" {
            break;
        }
    }

    let mut code_lines: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim_start().starts_with("```") {
            break;
        }
        code_lines.push(line);
    }
    Some(code_lines.join("\n").trim().to_string())
}
