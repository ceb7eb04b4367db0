//! The ReAct tool-dispatch loop.
//!
//! Each step the model replies with a thought and one [`Action`]. The
//! reply is decoded (with repair), the action is dispatched to its tool,
//! and the tool's output goes back as the next observation. The loop ends
//! on `give_final_answer` or when a budget runs out.

use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::Arc;

use autochat_core::action::{Action, ReactResponse};
use autochat_core::conversation::Conversation;
use autochat_core::error::{ProviderError, ToolError};
use autochat_core::message::{Message, Role};
use autochat_core::schema::OutputSchema;
use autochat_core::tool::ToolRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::prompts;
use crate::repair::{RepairError, StructuredOutputRepairer};

/// Observation recorded when the action budget runs out.
pub const BUDGET_NOTICE: &str = "I have used my maximum number of actions. I will now stop.";

/// Where a run stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AgentState {
    Running { actions_taken: u32 },
    Finished { answer: String },
    BudgetExhausted,
}

/// What kind of step was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// A tool ran and produced output.
    Tool,
    /// A tool ran and failed; the failure is the observation.
    ToolFailed,
    /// The reply was unusable; a corrective observation was sent.
    Correction,
    /// The model gave its final answer.
    Final,
}

/// One step of a run, as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub index: u32,
    pub kind: StepKind,
    pub thought: Option<String>,
    pub action: Option<Action>,
    pub observation: String,
}

/// The result of [`ToolDispatchLoop::run`].
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub state: AgentState,
    pub steps: Vec<AgentStep>,
    /// Tool invocations, failed ones included.
    pub actions_taken: u32,
    /// Corrective observations issued.
    pub corrections: u32,
}

impl AgentOutcome {
    pub fn answer(&self) -> Option<&str> {
        match &self.state {
            AgentState::Finished { answer } => Some(answer),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, AgentState::Finished { .. })
    }

    /// The text to show the user when the run ends.
    pub fn final_message(&self) -> &str {
        self.answer().unwrap_or(BUDGET_NOTICE)
    }
}

/// Drives a conversation through thought/action/observation steps.
pub struct ToolDispatchLoop {
    tools: Arc<ToolRegistry>,
    repairer: StructuredOutputRepairer,
    schema: OutputSchema<ReactResponse>,
    temperature: f32,
    history_len: NonZeroUsize,
    max_actions: NonZeroU32,
    max_corrections: NonZeroU32,
}

impl ToolDispatchLoop {
    pub fn new(tools: Arc<ToolRegistry>, repairer: StructuredOutputRepairer) -> Self {
        Self {
            tools,
            repairer,
            schema: OutputSchema::derive(),
            temperature: 0.5,
            history_len: NonZeroUsize::new(25).unwrap_or(NonZeroUsize::MIN),
            max_actions: NonZeroU32::new(50).unwrap_or(NonZeroU32::MIN),
            max_corrections: NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_history_len(mut self, len: NonZeroUsize) -> Self {
        self.history_len = len;
        self
    }

    /// Set the maximum number of tool invocations per run.
    pub fn with_max_actions(mut self, max: NonZeroU32) -> Self {
        self.max_actions = max;
        self
    }

    /// Set how many corrective observations a run tolerates.
    pub fn with_max_corrections(mut self, max: NonZeroU32) -> Self {
        self.max_corrections = max;
        self
    }

    /// The system prompt installed for `objective`.
    pub fn system_prompt(&self, objective: &str) -> String {
        prompts::agent_prompt(
            &self.schema.to_pretty_string(),
            &self.tools.describe(),
            objective,
        )
    }

    /// Run until the model answers or a budget is spent.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        objective: &str,
    ) -> Result<AgentOutcome, ProviderError> {
        self.run_with(conversation, objective, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_step` with each step and the
    /// state it left the run in.
    ///
    /// Only transport errors are fatal. Unusable replies and tool failures
    /// become observations the model sees on its next step.
    pub async fn run_with<F>(
        &self,
        conversation: &mut Conversation,
        objective: &str,
        mut on_step: F,
    ) -> Result<AgentOutcome, ProviderError>
    where
        F: FnMut(&AgentStep, &AgentState),
    {
        conversation.set_system_prompt(self.system_prompt(objective));

        info!(
            conversation_id = %conversation.id(),
            max_actions = self.max_actions.get(),
            tools = self.tools.len(),
            "Starting agent run"
        );

        let mut steps: Vec<AgentStep> = Vec::new();
        let mut actions_taken = 0u32;
        let mut corrections = 0u32;
        let mut input = serde_json::json!({ "objective": objective }).to_string();

        loop {
            let raw = conversation
                .send(Role::User, input, self.temperature, self.history_len)
                .await?;

            let index = steps.len() as u32 + 1;
            let step = match self.repairer.parse(&raw, &self.schema).await {
                Err(RepairError::Transport(e)) => return Err(e),
                Err(RepairError::Exhausted(e)) => {
                    corrections += 1;
                    warn!(
                        step = index,
                        attempts = e.attempts,
                        original = %e.original,
                        last_candidate = %e.last_candidate,
                        error = %e.last_error.message,
                        "Model reply could not be repaired"
                    );
                    let observation = prompts::correction(&e.last_error.message);
                    conversation
                        .transcript_mut()
                        .push(Message::assistant(&observation));
                    AgentStep {
                        index,
                        kind: StepKind::Correction,
                        thought: None,
                        action: None,
                        observation,
                    }
                }
                Ok(repaired) => {
                    let response = repaired.value;
                    normalize_last_reply(conversation, &response);
                    debug!(step = index, thought = %response.thought, action = %response.action, "Model chose action");

                    match response.action {
                        Action::GiveFinalAnswer { ref answer } => {
                            let step = AgentStep {
                                index,
                                kind: StepKind::Final,
                                thought: Some(response.thought.clone()),
                                action: Some(response.action.clone()),
                                observation: answer.clone(),
                            };
                            let state = AgentState::Finished {
                                answer: answer.clone(),
                            };
                            on_step(&step, &state);
                            steps.push(step);
                            info!(steps = steps.len(), actions_taken, corrections, "Agent finished");
                            return Ok(AgentOutcome {
                                state,
                                steps,
                                actions_taken,
                                corrections,
                            });
                        }
                        Action::GetAllInboxTasks
                        | Action::GetAllTasks
                        | Action::GetAllProjects
                        | Action::MoveTask { .. }
                        | Action::CreateNewProject { .. } => {
                            let (kind, observation) = match self.tools.execute(&response.action).await {
                                Ok(result) => {
                                    actions_taken += 1;
                                    (StepKind::Tool, result.output)
                                }
                                Err(ToolError::UnknownAction(tag)) => {
                                    corrections += 1;
                                    warn!(action = %tag, "No tool registered for action");
                                    let error = ToolError::UnknownAction(tag).to_string();
                                    let observation = prompts::correction(&error);
                                    conversation
                                        .transcript_mut()
                                        .push(Message::assistant(&observation));
                                    (StepKind::Correction, observation)
                                }
                                Err(e) => {
                                    actions_taken += 1;
                                    warn!(action = response.action.tag(), error = %e, "Tool failed");
                                    (
                                        StepKind::ToolFailed,
                                        format!("Action `{}` failed: {e}", response.action.tag()),
                                    )
                                }
                            };
                            AgentStep {
                                index,
                                kind,
                                thought: Some(response.thought),
                                action: Some(response.action),
                                observation,
                            }
                        }
                    }
                }
            };

            on_step(&step, &AgentState::Running { actions_taken });
            input = serde_json::json!({ "observation": step.observation }).to_string();
            steps.push(step);

            if actions_taken >= self.max_actions.get()
                || corrections >= self.max_corrections.get()
            {
                warn!(actions_taken, corrections, "Agent budget exhausted");
                return Ok(AgentOutcome {
                    state: AgentState::BudgetExhausted,
                    steps,
                    actions_taken,
                    corrections,
                });
            }
        }
    }
}

/// Rewrite the model's last reply to the canonical JSON of what was decoded.
fn normalize_last_reply(conversation: &mut Conversation, response: &ReactResponse) {
    let Ok(text) = serde_json::to_string(response) else {
        return;
    };
    let transcript = conversation.transcript_mut();
    let Some(index) = transcript.history().len().checked_sub(1) else {
        return;
    };
    transcript.set_content(index, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{CountingTool, SequentialMockProvider, final_answer, step};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry(tools: Vec<CountingTool>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(Box::new(tool));
        }
        Arc::new(registry)
    }

    fn setup(
        provider: &Arc<SequentialMockProvider>,
        tools: Arc<ToolRegistry>,
    ) -> (ToolDispatchLoop, Conversation) {
        let repairer = StructuredOutputRepairer::new(provider.clone(), "mock-model");
        let agent = ToolDispatchLoop::new(tools, repairer);
        let conversation = Conversation::new(provider.clone(), "mock-model");
        (agent, conversation)
    }

    fn budget(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn counted(name: &'static str) -> (CountingTool, Arc<AtomicUsize>) {
        let tool = CountingTool::new(name);
        let counter = tool.counter();
        (tool, counter)
    }

    #[tokio::test]
    async fn final_answer_on_first_step_runs_no_tools() {
        let provider = Arc::new(SequentialMockProvider::new(vec![final_answer("Nothing to do.")]));
        let (tool, calls) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));

        let outcome = agent.run(&mut conv, "Tidy my inbox").await.unwrap();

        assert_eq!(outcome.answer(), Some("Nothing to do."));
        assert_eq!(outcome.actions_taken, 0);
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.steps[0].kind, StepKind::Final);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn budget_stops_after_exactly_max_actions() {
        let provider = Arc::new(SequentialMockProvider::always(&step(
            "Let me look again.",
            json!({"type": "get_all_tasks"}),
        )));
        let (tool, calls) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));
        let agent = agent.with_max_actions(budget(3));

        let outcome = agent.run(&mut conv, "Loop forever").await.unwrap();

        assert_eq!(outcome.state, AgentState::BudgetExhausted);
        assert_eq!(outcome.final_message(), BUDGET_NOTICE);
        assert_eq!(outcome.actions_taken, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(provider.call_count(), 3);
        assert!(outcome.steps.iter().all(|s| s.kind == StepKind::Tool));
    }

    #[tokio::test]
    async fn unknown_action_gets_a_correction_and_the_loop_continues() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            step(
                "Move it.",
                json!({"type": "move_task", "task_id": "1", "project_id": "2"}),
            ),
            final_answer("Done."),
        ]));
        let (tool, calls) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));

        let outcome = agent.run(&mut conv, "Move task 1").await.unwrap();

        assert!(outcome.is_finished());
        assert_eq!(outcome.corrections, 1);
        assert_eq!(outcome.actions_taken, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.steps[0].kind, StepKind::Correction);
        assert!(
            outcome.steps[0]
                .observation
                .starts_with("Your response caused the following error: Unknown action: move_task")
        );

        // The correction was fed back as the next observation.
        let second = provider.requests()[1].messages.last().cloned().unwrap();
        let input: serde_json::Value = serde_json::from_str(&second.content).unwrap();
        assert!(input["observation"].as_str().unwrap().contains("Please try again"));
    }

    #[tokio::test]
    async fn tool_failure_becomes_an_observation() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            step("List.", json!({"type": "get_all_projects"})),
            final_answer("Could not list projects."),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CountingTool::failing("get_all_projects")));
        let (agent, mut conv) = setup(&provider, Arc::new(registry));

        let outcome = agent.run(&mut conv, "List projects").await.unwrap();

        assert!(outcome.is_finished());
        assert_eq!(outcome.actions_taken, 1);
        assert_eq!(outcome.steps[0].kind, StepKind::ToolFailed);
        assert!(outcome.steps[0].observation.starts_with("Action `get_all_projects` failed"));
        assert!(outcome.steps[0].observation.contains("backend said no"));
    }

    #[tokio::test]
    async fn malformed_reply_is_repaired_and_normalized() {
        let repaired = step("Check the board.", json!({"type": "get_all_tasks"}));
        let provider = Arc::new(SequentialMockProvider::new(vec![
            "thought: check the board, action: get_all_tasks".to_string(),
            repaired,
            final_answer("All good."),
        ]));
        let (tool, calls) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));

        let outcome = agent.run(&mut conv, "Check").await.unwrap();

        assert!(outcome.is_finished());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.corrections, 0);
        assert_eq!(provider.call_count(), 3);

        // The garbled reply in the transcript now holds the decoded JSON.
        let first_reply = &conv.transcript().history()[1];
        assert_eq!(first_reply.role, Role::Assistant);
        let decoded: ReactResponse = serde_json::from_str(&first_reply.content).unwrap();
        assert_eq!(decoded.action, Action::GetAllTasks);
    }

    #[tokio::test]
    async fn exhausted_repair_becomes_a_correction() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            "not json".to_string(),
            "still not json".to_string(),
            final_answer("Recovered."),
        ]));
        let (tool, _) = counted("get_all_tasks");
        let repairer =
            StructuredOutputRepairer::new(provider.clone(), "mock-model").with_max_retries(1);
        let agent = ToolDispatchLoop::new(registry(vec![tool]), repairer);
        let mut conv = Conversation::new(provider.clone(), "mock-model");

        let outcome = agent.run(&mut conv, "Anything").await.unwrap();

        assert_eq!(outcome.answer(), Some("Recovered."));
        assert_eq!(outcome.corrections, 1);
        assert_eq!(outcome.steps[0].kind, StepKind::Correction);
        assert!(
            outcome.steps[0]
                .observation
                .starts_with("Your response caused the following error:")
        );
        // The correction is kept in the transcript as an assistant message.
        assert!(
            conv.transcript()
                .history()
                .iter()
                .any(|m| m.role == Role::Assistant && m.content == outcome.steps[0].observation)
        );
    }

    #[tokio::test]
    async fn correction_budget_ends_the_run() {
        let provider = Arc::new(SequentialMockProvider::always(&step(
            "Move it.",
            json!({"type": "move_task", "task_id": "1", "project_id": "2"}),
        )));
        let (agent, mut conv) = setup(&provider, registry(vec![]));
        let agent = agent.with_max_corrections(budget(2));

        let outcome = agent.run(&mut conv, "Move").await.unwrap();

        assert_eq!(outcome.state, AgentState::BudgetExhausted);
        assert_eq!(outcome.corrections, 2);
        assert_eq!(outcome.actions_taken, 0);
    }

    #[tokio::test]
    async fn tight_correction_budget_leaves_clean_steps_alone() {
        let provider = Arc::new(SequentialMockProvider::always(&step(
            "Look again.",
            json!({"type": "get_all_tasks"}),
        )));
        let (tool, calls) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));
        let agent = agent
            .with_max_actions(budget(3))
            .with_max_corrections(budget(1));

        let outcome = agent.run(&mut conv, "Keep looking").await.unwrap();

        assert_eq!(outcome.state, AgentState::BudgetExhausted);
        assert_eq!(outcome.actions_taken, 3);
        assert_eq!(outcome.corrections, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_action_budget_runs_one_tool() {
        let provider = Arc::new(SequentialMockProvider::always(&step(
            "Look.",
            json!({"type": "get_all_tasks"}),
        )));
        let (tool, calls) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));
        let agent = agent.with_max_actions(NonZeroU32::MIN);

        let outcome = agent.run(&mut conv, "Look once").await.unwrap();

        assert_eq!(outcome.state, AgentState::BudgetExhausted);
        assert_eq!(outcome.actions_taken, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn transport_error_is_fatal() {
        let provider = Arc::new(SequentialMockProvider::scripted(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let (agent, mut conv) = setup(&provider, registry(vec![]));

        let err = agent.run(&mut conv, "Anything").await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn first_input_carries_the_objective() {
        let provider = Arc::new(SequentialMockProvider::new(vec![final_answer("ok")]));
        let (tool, _) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));

        agent.run(&mut conv, "Sort my inbox").await.unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("- get_all_tasks: Counts invocations"));
        assert!(request.messages[0].content.contains("give_final_answer"));
        assert!(request.messages[0].content.ends_with("Sort my inbox"));
        let input: serde_json::Value = serde_json::from_str(&request.messages[1].content).unwrap();
        assert_eq!(input, json!({"objective": "Sort my inbox"}));
    }

    #[tokio::test]
    async fn steps_are_reported_as_they_complete() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            step("Look.", json!({"type": "get_all_tasks"})),
            final_answer("Seen."),
        ]));
        let (tool, _) = counted("get_all_tasks");
        let (agent, mut conv) = setup(&provider, registry(vec![tool]));

        let mut seen = Vec::new();
        agent
            .run_with(&mut conv, "Look", |s, state| {
                seen.push((s.index, s.kind, state.clone()))
            })
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![
                (1, StepKind::Tool, AgentState::Running { actions_taken: 1 }),
                (
                    2,
                    StepKind::Final,
                    AgentState::Finished {
                        answer: "Seen.".into()
                    }
                ),
            ]
        );
    }
}
