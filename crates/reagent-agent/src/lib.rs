//! Agent runtime — the ReAct-style reasoning loop.
//!
//! Each step prompts the model for a 'Thought:' / 'Summary:' / code reply,
//! executes the code in the restricted executor, and appends the execution
//! log as an observation for the next prompt. The loop ends when the terminal
//! tool fires or the step budget runs out.

pub mod agent;
pub mod parser;
pub mod prompt;
pub mod transcript;

pub use agent::{
    Agent, AgentOptions, AgentRun, BUDGET_EXCEEDED_MESSAGE, END_CODE, RunUpdate,
};
pub use parser::{ParseError, ParsedReply, parse_reply};
pub use transcript::Transcript;
