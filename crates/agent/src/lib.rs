//! The autochat agent: prompts, output repair and the ReAct loop.
//!
//! The agent follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Install** a system prompt describing the tools, the JSON schema of
//!    a step and the user's objective
//! 2. **Ask** the model for its next step
//! 3. **Decode** the reply, repairing it through the model when needed
//! 4. **Dispatch** the chosen action to its tool and feed the output back
//! 5. **Stop** on `give_final_answer` or when a budget runs out

pub mod loop_runner;
pub mod prompts;
pub mod repair;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::{AgentOutcome, AgentState, AgentStep, StepKind, ToolDispatchLoop, BUDGET_NOTICE};
pub use prompts::ContentType;
pub use repair::{RepairError, Repaired, StructuredOutputRepairer};
