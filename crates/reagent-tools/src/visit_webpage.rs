//! visit_webpage tool — HTTP GET with content extraction.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use reagent_core::config::Config;
use reagent_core::types::{ParamSpec, ValueKind};

use crate::{Tool, ToolOutput};

pub struct VisitWebpageTool {
    max_output_len: usize,
}

impl VisitWebpageTool {
    pub fn new(max_output_len: usize) -> Self {
        Self { max_output_len }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.webpage_max_output_len())
    }
}

#[derive(Deserialize)]
struct Params {
    url: String,
}

/// Strip HTML tags for readability. Simple approach — not a full parser.
fn strip_html_tags(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut in_tag = false;
    let mut in_script = false;
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        if in_script {
            // Look for </script>
            if i + 8 < len {
                let slice: String = chars[i..i + 9].iter().collect();
                if slice.to_lowercase() == "</script>" {
                    in_script = false;
                    i += 9;
                    continue;
                }
            }
            i += 1;
            continue;
        }

        match chars[i] {
            '<' => {
                // Check for <script
                if i + 6 < len {
                    let slice: String = chars[i..i + 7].iter().collect();
                    if slice.to_lowercase() == "<script" {
                        in_script = true;
                        in_tag = true;
                        i += 7;
                        continue;
                    }
                }
                // Check for <style
                if i + 5 < len {
                    let slice: String = chars[i..i + 6].iter().collect();
                    if slice.to_lowercase() == "<style" {
                        in_script = true; // reuse flag to skip content
                        in_tag = true;
                        i += 6;
                        continue;
                    }
                }
                in_tag = true;
            }
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            c if !in_tag => {
                result.push(c);
            }
            _ => {}
        }
        i += 1;
    }

    // Collapse whitespace
    let mut collapsed = String::with_capacity(result.len());
    let mut last_was_space = false;
    for c in result.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                collapsed.push(if c == '\n' { '\n' } else { ' ' });
            }
            last_was_space = true;
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }

    collapsed.trim().to_string()
}

/// Truncate at a char boundary, marking the cut for the model.
fn truncate_content(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_len).collect();
    format!("{truncated}\n..._This content has been truncated to stay below {max_len} characters_...")
}

#[async_trait]
impl Tool for VisitWebpageTool {
    fn name(&self) -> &str {
        "visit_webpage"
    }

    fn description(&self) -> &str {
        "Visits a webpage at the given url and reads its content as a text string. Use this to browse webpages."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec {
            name: "url",
            kind: ValueKind::Text,
            description: "The url of the webpage to visit.",
        }]
    }

    fn output_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    async fn invoke(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
        let p: Params = serde_json::from_value(args)?;
        debug!(url = %p.url, "visit_webpage");

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()?;

        // Fetch failures are part of the page-reading experience: the model
        // gets them back as text and can try another URL.
        let resp = match client.get(&p.url).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Ok(ToolOutput::text(
                    "The request timed out. Please try again later or check the URL.",
                ));
            }
            Err(e) => {
                return Ok(ToolOutput::text(format!("Error fetching the webpage: {e}")));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return Ok(ToolOutput::text(format!(
                "Error fetching the webpage: HTTP {status} for {}",
                p.url
            )));
        }

        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                return Ok(ToolOutput::text(format!("Error fetching the webpage: {e}")));
            }
        };

        let content = strip_html_tags(&body);
        Ok(ToolOutput::text(truncate_content(
            &content,
            self.max_output_len,
        )))
    }
}
