use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reagent_agent::{Agent, AgentOptions};
use reagent_core::config::Config;
use reagent_providers::{ModelProvider, OpenAiProvider};
use reagent_tools::{Tool, VisitWebpageTool, WebSearchTool};

#[derive(Parser)]
#[command(
    name = "reagent",
    about = "Minimal ReAct-style code agent — answers questions by searching and reading the web",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: ./reagent.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the agent a question (one-shot)
    Ask {
        /// The question to answer (omit for a demo query)
        query: Vec<String>,

        /// Model to use
        #[arg(long)]
        model: Option<String>,

        /// Maximum reasoning steps
        #[arg(long)]
        max_steps: Option<usize>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
}

const DEFAULT_QUERY: &str =
    "What was the hottest day in 2024 and how much was the Dow Jones on that day?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("reagent.json"));
    let mut config = Config::load(&config_path)?;

    match cli.command {
        Commands::Ask {
            query,
            model,
            max_steps,
        } => {
            if let Some(model) = model {
                config.model.get_or_insert_default().model = Some(model);
            }
            if let Some(max_steps) = max_steps {
                config.agent.get_or_insert_default().max_steps = Some(max_steps);
            }

            let query = if query.is_empty() {
                DEFAULT_QUERY.to_string()
            } else {
                query.join(" ")
            };

            ask(&config, &query).await
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn ask(config: &Config, query: &str) -> anyhow::Result<()> {
    // Missing credentials or model id fail here, before any model call.
    config.validate()?;

    let provider = build_provider(config)?;
    let tools: Vec<Box<dyn Tool>> = vec![
        Box::new(WebSearchTool::from_config(config)),
        Box::new(VisitWebpageTool::from_config(config)),
    ];
    let mut agent = Agent::new(provider, tools, AgentOptions::from_config(config))?;

    let mut run = agent.run_incremental(query);
    let mut final_answer = None;
    let mut printed = 0;
    while let Some(update) = run.next_update().await? {
        for (i, step) in update.steps.iter().enumerate().skip(printed) {
            println!("Step {}: {}", i + 1, step.summary);
        }
        printed = update.steps.len();
        if update.final_answer.is_some() {
            final_answer = update.final_answer;
        }
    }

    println!("{}", "-".repeat(20));
    println!(
        "The final answer is:\n\n{}",
        final_answer.unwrap_or_default()
    );
    Ok(())
}

fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn ModelProvider>> {
    let model = config
        .model_id()
        .ok_or_else(|| anyhow::anyhow!("no model configured"))?;
    let base_url = config.base_url();
    let api_key = config.resolve_api_key();

    let provider: Arc<dyn ModelProvider> = match config.provider_id().as_str() {
        "openai" => Arc::new(OpenAiProvider::openai(model, api_key, base_url.as_deref())),
        "openrouter" => Arc::new(OpenAiProvider::openrouter(
            model,
            api_key,
            base_url.as_deref(),
        )),
        "ollama" => Arc::new(OpenAiProvider::ollama(model, base_url.as_deref())),
        other => anyhow::bail!("unknown provider '{other}' (expected openai, openrouter, or ollama)"),
    };
    Ok(provider)
}
