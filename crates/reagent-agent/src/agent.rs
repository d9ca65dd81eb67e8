//! Agent loop — orchestrates prompt, parse, execute, observe.
//!
//! One [`Agent`] owns one conversation. Runs against the same agent without a
//! [`Agent::reset`] in between are conversational continuation; concurrent
//! runs against one agent are not a thing — `&mut self` serializes callers
//! structurally.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use reagent_core::config::Config;
use reagent_core::types::ReasoningStep;
use reagent_core::{ReagentError, Result};
use reagent_executor::{CodeExecutor, RestrictedExecutor};
use reagent_providers::ModelProvider;
use reagent_tools::{Tool, ToolRegistry};

use crate::parser;
use crate::prompt;
use crate::transcript::Transcript;

/// Stop sentinel sent to the model so generation halts at the end of the
/// fenced code block.
pub const END_CODE: &str = "<end_code>";

/// Fixed result text when the step budget runs out. A defined terminal
/// outcome, not an error.
pub const BUDGET_EXCEEDED_MESSAGE: &str =
    "Could not solve task: Maximum number of steps exceeded.";

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub max_steps: usize,
    pub authorized_imports: Vec<String>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_steps: 10,
            authorized_imports: reagent_core::config::BASE_AUTHORIZED_IMPORTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AgentOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_steps: config.max_steps(),
            authorized_imports: config.authorized_imports(),
        }
    }
}

/// Snapshot yielded by the incremental run mode after every completed step.
#[derive(Debug, Clone, Serialize)]
pub struct RunUpdate {
    /// Present exactly once, on the last snapshot — the final answer text or
    /// the fixed budget-exceeded message.
    pub final_answer: Option<String>,
    pub steps: Vec<ReasoningStep>,
}

struct StepOutcome {
    is_final: bool,
    answer: Option<String>,
}

pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    executor: Arc<dyn CodeExecutor>,
    tools: Arc<ToolRegistry>,
    transcript: Transcript,
    steps: Vec<ReasoningStep>,
    max_steps: usize,
}

impl Agent {
    /// Build an agent. All construction-time validation happens here: the
    /// registry rejects duplicate tool names, the prompt template renders
    /// strictly, and the executor gets its fixed namespace.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: Vec<Box<dyn Tool>>,
        options: AgentOptions,
    ) -> Result<Self> {
        let tools = Arc::new(ToolRegistry::with_tools(tools)?);
        let system_prompt = prompt::render_system_prompt(&tools, &options.authorized_imports)?;
        let executor: Arc<dyn CodeExecutor> = Arc::new(RestrictedExecutor::new(
            tools.clone(),
            options.authorized_imports,
        ));

        Ok(Self {
            provider,
            executor,
            tools,
            transcript: Transcript::new(system_prompt),
            steps: Vec::new(),
            max_steps: options.max_steps,
        })
    }

    /// Swap in a different executor implementation.
    pub fn with_executor(mut self, executor: Arc<dyn CodeExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn reasoning_steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    /// Start the next run from a clean slate: transcript back to the system
    /// message only, step log cleared.
    pub fn reset(&mut self) {
        self.transcript.reset();
        self.steps.clear();
    }

    /// Run the task to completion and return the final answer text.
    ///
    /// Execution and tool failures never surface here — they flow back to the
    /// model through observations. Only contract and provider failures
    /// propagate.
    pub async fn run(&mut self, task: &str) -> Result<String> {
        let mut run = self.run_incremental(task);
        while let Some(update) = run.next_update().await? {
            if let Some(answer) = update.final_answer {
                return Ok(answer);
            }
        }
        // The producer always ends on a final snapshot; this is a fallback.
        Ok("Could not solve task: Unknown error.".to_string())
    }

    /// Run the task yielding a [`RunUpdate`] after every step, so a caller
    /// can render progress before completion. Pull-based and single-threaded:
    /// each `next_update` performs one full prompt/parse/execute step.
    pub fn run_incremental(&mut self, task: &str) -> AgentRun<'_> {
        self.steps.clear();
        self.transcript.push_user(format!("Task: {task}"));
        AgentRun {
            agent: self,
            nr_steps: 0,
            finished: false,
        }
    }

    async fn step(&mut self) -> Result<StepOutcome> {
        debug!(step = self.steps.len() + 1, "agent step");

        // 1. One blocking completion over the current transcript.
        let reply = self
            .provider
            .complete(self.transcript.messages(), END_CODE)
            .await
            .map_err(|e| ReagentError::Provider(e.to_string()))?;

        // 2. Record the raw reply before parsing, so the transcript always
        // shows exactly what the model said.
        self.transcript.push_assistant(&reply);

        // 3. Extract the structured fields; a missing summary is a contract
        // bug and fails the step.
        let parsed = parser::parse_reply(&reply)?;
        info!(summary = %parsed.summary, "step");

        // 4. Execute the code (or the no-code sentinel).
        let execution = self.executor.execute(parsed.code.as_deref()).await;

        // 5. Feed the execution log back as an observation.
        self.transcript.push_observation(&execution.logs);

        // 6. Keep the decomposed record for display.
        self.steps.push(ReasoningStep {
            summary: parsed.summary,
            thought: parsed.thought,
            code: parsed.code,
            observation: Some(execution.logs),
            timestamp: Utc::now(),
        });

        Ok(StepOutcome {
            is_final: execution.is_final_answer,
            answer: execution.value.map(|v| v.to_string()),
        })
    }
}

/// Pull-based producer over one run. Created by [`Agent::run_incremental`];
/// call [`AgentRun::next_update`] until it returns `None`.
pub struct AgentRun<'a> {
    agent: &'a mut Agent,
    nr_steps: usize,
    finished: bool,
}

impl AgentRun<'_> {
    /// Perform one step and return its snapshot, or `None` after the final
    /// snapshot has been yielded.
    ///
    /// The step counter is checked strictly after execution, so at least one
    /// step always runs and `max_steps` bounds the number of model calls.
    pub async fn next_update(&mut self) -> Result<Option<RunUpdate>> {
        if self.finished {
            return Ok(None);
        }

        let outcome = match self.agent.step().await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        self.nr_steps += 1;

        if outcome.is_final {
            self.finished = true;
            return Ok(Some(RunUpdate {
                final_answer: Some(outcome.answer.unwrap_or_default()),
                steps: self.agent.steps.clone(),
            }));
        }

        if self.nr_steps >= self.agent.max_steps {
            info!(steps = self.nr_steps, "step budget exceeded");
            self.finished = true;
            return Ok(Some(RunUpdate {
                final_answer: Some(BUDGET_EXCEEDED_MESSAGE.to_string()),
                steps: self.agent.steps.clone(),
            }));
        }

        Ok(Some(RunUpdate {
            final_answer: None,
            steps: self.agent.steps.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reagent_core::types::Message;

    /// Scripted provider: returns canned replies in order, repeating the last
    /// one when the script runs out.
    struct ScriptedProvider {
        replies: Mutex<Vec<String>>,
        calls: AtomicUsize,
        last_stop: Mutex<Option<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
                last_stop: Mutex::new(None),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            stop_sequence: &str,
        ) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_stop.lock().unwrap() = Some(stop_sequence.to_string());
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop().unwrap()
            } else {
                replies.last().cloned().unwrap_or_default()
            };
            Ok(reply)
        }
    }

    fn agent_with(provider: Arc<ScriptedProvider>, max_steps: usize) -> Agent {
        Agent::new(
            provider,
            vec![],
            AgentOptions {
                max_steps,
                ..Default::default()
            },
        )
        .unwrap()
    }

    const FINAL_REPLY: &str =
        "Thought: trivial arithmetic.\nSummary: compute\n```py\nfinal_answer(4)\n```";
    const BUSY_REPLY: &str = "Thought: still looking.\nSummary: keep going\n```py\nprint('working')\n```";

    #[tokio::test]
    async fn test_final_answer_terminates_on_first_step() {
        let provider = ScriptedProvider::new(&[FINAL_REPLY]);
        let mut agent = agent_with(provider.clone(), 10);

        let answer = agent.run("2+2?").await.unwrap();
        assert_eq!(answer, "4");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(agent.reasoning_steps().len(), 1);
        assert_eq!(agent.reasoning_steps()[0].summary, "compute");
        // system + task + assistant + observation
        assert_eq!(agent.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_missing_summary_is_contract_error() {
        let provider = ScriptedProvider::new(&["Thought: no summary\n```py\nprint(1)\n```"]);
        let mut agent = agent_with(provider, 10);

        let err = agent.run("anything").await.unwrap_err();
        assert!(matches!(err, ReagentError::Contract(_)));
    }

    #[tokio::test]
    async fn test_zero_max_steps_still_runs_one_step() {
        let provider = ScriptedProvider::new(&[BUSY_REPLY]);
        let mut agent = agent_with(provider.clone(), 0);

        let answer = agent.run("impossible").await.unwrap();
        assert_eq!(answer, BUDGET_EXCEEDED_MESSAGE);
        // At least one iteration always runs.
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_runtime_error_flows_into_observation() {
        let broken = "Thought: divide.\nSummary: divide by zero\n```py\nx = 1 / 0\n```";
        let provider = ScriptedProvider::new(&[broken, FINAL_REPLY]);
        let mut agent = agent_with(provider.clone(), 10);

        let answer = agent.run("does this crash?").await.unwrap();
        assert_eq!(answer, "4");
        assert_eq!(provider.call_count(), 2);

        let first_observation = agent.reasoning_steps()[0].observation.as_ref().unwrap();
        assert!(first_observation.contains("division by zero"));

        // The observation message in the transcript carries the same text.
        let exported = agent.transcript().export();
        assert!(
            exported
                .iter()
                .any(|m| m.content.contains("division by zero"))
        );
    }

    #[tokio::test]
    async fn test_termination_monotonicity() {
        let provider = ScriptedProvider::new(&[BUSY_REPLY]);
        let mut agent = agent_with(provider.clone(), 3);

        let answer = agent.run("never ends").await.unwrap();
        assert_eq!(answer, BUDGET_EXCEEDED_MESSAGE);
        assert!(provider.call_count() <= 3 + 1);
        assert_eq!(agent.reasoning_steps().len(), 3);
    }

    #[tokio::test]
    async fn test_incremental_final_snapshot_is_last_and_unique() {
        let provider = ScriptedProvider::new(&[BUSY_REPLY, BUSY_REPLY, FINAL_REPLY]);
        let mut agent = agent_with(provider, 10);

        let mut run = agent.run_incremental("slow task");
        let mut finals = 0;
        let mut updates = 0;
        let mut last_had_final = false;
        while let Some(update) = run.next_update().await.unwrap() {
            updates += 1;
            last_had_final = update.final_answer.is_some();
            if last_had_final {
                finals += 1;
            }
        }
        assert_eq!(updates, 3);
        assert_eq!(finals, 1);
        assert!(last_had_final);
    }

    #[tokio::test]
    async fn test_incremental_exhausted_producer_returns_none() {
        let provider = ScriptedProvider::new(&[FINAL_REPLY]);
        let mut agent = agent_with(provider, 10);

        let mut run = agent.run_incremental("quick");
        assert!(run.next_update().await.unwrap().is_some());
        assert!(run.next_update().await.unwrap().is_none());
        assert!(run.next_update().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_restores_system_only_transcript() {
        let provider = ScriptedProvider::new(&[FINAL_REPLY]);
        let mut agent = agent_with(provider, 10);

        agent.run("first").await.unwrap();
        assert!(agent.transcript().len() > 1);

        agent.reset();
        assert_eq!(agent.transcript().len(), 1);
        assert!(agent.reasoning_steps().is_empty());

        agent.reset();
        assert_eq!(agent.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_continuation_without_reset_keeps_history() {
        let provider = ScriptedProvider::new(&[FINAL_REPLY, FINAL_REPLY]);
        let mut agent = agent_with(provider, 10);

        agent.run("first").await.unwrap();
        let after_first = agent.transcript().len();

        agent.run("second").await.unwrap();
        assert_eq!(agent.transcript().len(), after_first + 3);
    }

    #[tokio::test]
    async fn test_stop_sentinel_passed_to_provider() {
        let provider = ScriptedProvider::new(&[FINAL_REPLY]);
        let mut agent = agent_with(provider.clone(), 10);

        agent.run("check stop").await.unwrap();
        assert_eq!(
            provider.last_stop.lock().unwrap().as_deref(),
            Some(END_CODE)
        );
    }

    #[tokio::test]
    async fn test_raw_reply_recorded_before_parsing() {
        let provider = ScriptedProvider::new(&["Thought: oops, nothing else"]);
        let mut agent = agent_with(provider, 10);

        let _ = agent.run("contract break").await;
        // Even though parsing failed, the raw reply is in the transcript.
        let exported = agent.transcript().export();
        assert!(
            exported
                .iter()
                .any(|m| m.content.contains("oops, nothing else"))
        );
    }

    #[tokio::test]
    async fn test_reply_without_code_block_still_completes_step() {
        let no_code = "Thought: musing only.\nSummary: think\n";
        let provider = ScriptedProvider::new(&[no_code, FINAL_REPLY]);
        let mut agent = agent_with(provider.clone(), 10);

        let answer = agent.run("code-free step").await.unwrap();
        assert_eq!(answer, "4");
        let first_observation = agent.reasoning_steps()[0].observation.as_ref().unwrap();
        assert!(first_observation.contains("no code block found"));
    }
}
