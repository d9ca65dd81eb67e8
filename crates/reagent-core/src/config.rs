//! Configuration loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReagentError, Result};

/// Module names the generated code may import when nothing else is configured.
///
/// Mirrors the standard-library surface the system prompt advertises; the
/// executor rejects anything outside this list.
pub const BASE_AUTHORIZED_IMPORTS: &[&str] = &[
    "collections",
    "datetime",
    "itertools",
    "math",
    "queue",
    "random",
    "re",
    "stat",
    "statistics",
    "time",
    "unicodedata",
];

/// Top-level Reagent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentDefaults>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,
}

/// Model provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider id: "openai", "openrouter", or "ollama".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Model identifier sent to the completion API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl ModelConfig {
    /// Resolve the API key: check `api_key` first, then `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_imports: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// URL for the web search API (SearXNG, Brave, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_api_url: Option<String>,

    /// API key for the web search API (e.g. Brave Search).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_max_results: Option<usize>,

    /// Maximum characters of page text returned by visit_webpage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpage_max_output_len: Option<usize>,
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_default()
    })
    .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(ReagentError::Io)?;

        // Substitute ${ENV_VAR} references before parsing
        let substituted = substitute_env_vars(&raw);

        let config: Config =
            json5::from_str(&substituted).map_err(|e| ReagentError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn provider_id(&self) -> String {
        self.model
            .as_ref()
            .and_then(|m| m.provider.clone())
            .unwrap_or_else(|| "openai".to_string())
    }

    pub fn model_id(&self) -> Option<String> {
        self.model
            .as_ref()
            .and_then(|m| m.model.clone())
            .or_else(|| std::env::var("MODEL").ok().filter(|m| !m.is_empty()))
    }

    pub fn base_url(&self) -> Option<String> {
        self.model.as_ref().and_then(|m| m.base_url.clone())
    }

    pub fn max_steps(&self) -> usize {
        self.agent
            .as_ref()
            .and_then(|a| a.max_steps)
            .unwrap_or(10)
    }

    pub fn authorized_imports(&self) -> Vec<String> {
        self.agent
            .as_ref()
            .and_then(|a| a.authorized_imports.clone())
            .unwrap_or_else(|| {
                BASE_AUTHORIZED_IMPORTS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }

    pub fn search_max_results(&self) -> usize {
        self.tools
            .as_ref()
            .and_then(|t| t.search_max_results)
            .unwrap_or(10)
    }

    pub fn webpage_max_output_len(&self) -> usize {
        self.tools
            .as_ref()
            .and_then(|t| t.webpage_max_output_len)
            .unwrap_or(40_000)
    }

    /// Resolve the API key for the configured provider, falling back to the
    /// conventional environment variables.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.model.as_ref().and_then(|m| m.resolve_api_key()) {
            return Some(key);
        }
        for var in ["OPENAI_API_KEY", "OPENROUTER_API_KEY"] {
            if let Ok(val) = std::env::var(var) {
                if !val.is_empty() {
                    return Some(val);
                }
            }
        }
        None
    }

    /// Validate preconditions for starting an agent run.
    ///
    /// Missing credentials or a missing model id are reported here, before the
    /// loop starts, never discovered mid-loop.
    pub fn validate(&self) -> Result<()> {
        if self.model_id().is_none() {
            return Err(ReagentError::Config(
                "no model configured: set model.model in the config file or the MODEL environment variable".into(),
            ));
        }

        // Ollama runs locally without credentials; everything else needs a key.
        if self.provider_id() != "ollama" && self.resolve_api_key().is_none() {
            return Err(ReagentError::Config(format!(
                "no API key configured for provider '{}': set model.api_key, model.api_key_env, or OPENAI_API_KEY",
                self.provider_id()
            )));
        }

        Ok(())
    }
}
