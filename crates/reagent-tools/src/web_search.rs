//! web_search tool — external search API wrapper.
//!
//! Supports configurable backend (SearXNG, Brave Search).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reagent_core::config::Config;
use reagent_core::types::{ParamSpec, ValueKind};

use crate::{Tool, ToolOutput};

pub struct WebSearchTool {
    api_url: Option<String>,
    api_key: Option<String>,
    max_results: usize,
}

impl WebSearchTool {
    pub fn from_config(config: &Config) -> Self {
        let tools = config.tools.as_ref();
        Self {
            api_url: tools
                .and_then(|t| t.search_api_url.clone())
                .or_else(|| std::env::var("SEARCH_API_URL").ok())
                .filter(|s| !s.is_empty()),
            api_key: tools
                .and_then(|t| t.search_api_key.clone())
                .or_else(|| std::env::var("SEARCH_API_KEY").ok())
                .filter(|s| !s.is_empty()),
            max_results: config.search_max_results(),
        }
    }

    pub fn new(api_url: Option<String>, api_key: Option<String>, max_results: usize) -> Self {
        Self {
            api_url,
            api_key,
            max_results,
        }
    }
}

#[derive(Deserialize)]
struct Params {
    query: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

/// Parse SearXNG JSON results.
fn parse_searxng_results(body: &serde_json::Value, max: usize) -> Vec<SearchResult> {
    let empty = vec![];
    let results = body["results"].as_array().unwrap_or(&empty);
    results
        .iter()
        .take(max)
        .filter_map(|r| {
            Some(SearchResult {
                title: r["title"].as_str()?.to_string(),
                url: r["url"].as_str()?.to_string(),
                snippet: r["content"].as_str().unwrap_or("").to_string(),
            })
        })
        .collect()
}

/// Parse Brave Search API results.
fn parse_brave_results(body: &serde_json::Value, max: usize) -> Vec<SearchResult> {
    let empty = vec![];
    let results = body["web"]["results"].as_array().unwrap_or(&empty);
    results
        .iter()
        .take(max)
        .filter_map(|r| {
            Some(SearchResult {
                title: r["title"].as_str()?.to_string(),
                url: r["url"].as_str()?.to_string(),
                snippet: r["description"].as_str().unwrap_or("").to_string(),
            })
        })
        .collect()
}

/// Render results as the markdown list the model reads in its observation.
fn format_results(results: &[SearchResult]) -> String {
    let entries: Vec<String> = results
        .iter()
        .map(|r| format!("[{}]({})\n{}", r.title, r.url, r.snippet))
        .collect();
    format!("## Search Results\n\n{}", entries.join("\n\n"))
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Performs a web search based on your query (think a Google search) then returns the top search results."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec {
            name: "query",
            kind: ValueKind::Text,
            description: "The search query to perform.",
        }]
    }

    fn output_kind(&self) -> ValueKind {
        ValueKind::Text
    }

    async fn invoke(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
        let p: Params = serde_json::from_value(args)?;
        debug!(query = %p.query, "web_search");

        let Some(base_url) = self.api_url.clone() else {
            return Ok(ToolOutput::error(
                "No search API configured. Set tools.search_api_url in config or SEARCH_API_URL environment variable. Supported: SearXNG (e.g. http://localhost:8888), Brave Search API (https://api.search.brave.com).",
            ));
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        // Detect API type from URL
        let is_brave = base_url.contains("brave.com");

        let resp = if is_brave {
            let key = self.api_key.clone().unwrap_or_default();
            client
                .get(format!("{base_url}/res/v1/web/search"))
                .header("X-Subscription-Token", key)
                .query(&[
                    ("q", p.query.as_str()),
                    ("count", &self.max_results.to_string()),
                ])
                .send()
                .await
        } else {
            // SearXNG-compatible
            client
                .get(format!("{base_url}/search"))
                .query(&[
                    ("q", p.query.as_str()),
                    ("format", "json"),
                    ("engines", "google,duckduckgo"),
                ])
                .send()
                .await
        };

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolOutput::error(format!("Search API error: {e}")));
            }
        };

        if !resp.status().is_success() {
            return Ok(ToolOutput::error(format!(
                "Search API returned HTTP {}",
                resp.status()
            )));
        }

        let body: serde_json::Value = resp.json().await?;

        let results = if is_brave {
            parse_brave_results(&body, self.max_results)
        } else {
            parse_searxng_results(&body, self.max_results)
        };

        if results.is_empty() {
            return Ok(ToolOutput::error(
                "No results found! Try a less restrictive/shorter query.",
            ));
        }

        Ok(ToolOutput::text(format_results(&results)))
    }
}
