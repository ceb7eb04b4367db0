//! `autochat agent` — Run the task-management agent on one objective.

use std::num::NonZeroU32;
use std::sync::Arc;

use autochat_agent::{AgentState, AgentStep, StepKind, StructuredOutputRepairer, ToolDispatchLoop};
use autochat_config::AppConfig;
use autochat_core::error::ToolError;
use autochat_core::provider::Provider;
use autochat_tools::{InMemoryTaskBoard, TaskBackend, TodoistClient, task_registry};

/// The task backend: Todoist, or a sample board for `--dry-run`.
fn backend(config: &AppConfig, dry_run: bool) -> Result<Arc<dyn TaskBackend>, Box<dyn std::error::Error>> {
    if dry_run {
        return Ok(Arc::new(sample_board()?));
    }
    let api_key = config.todoist.api_key.clone().ok_or(
        "No Todoist API key configured. Set TODOIST_API_KEY, add [todoist] api_key to the config, or use --dry-run.",
    )?;
    Ok(Arc::new(TodoistClient::new(&config.todoist.api_url, api_key)))
}

/// A small board to try the agent on without touching a real account.
fn sample_board() -> Result<InMemoryTaskBoard, ToolError> {
    let board = InMemoryTaskBoard::new();
    let groceries = board.add_project("Groceries")?;
    board.add_project("Work")?;
    board.add_project("Health")?;
    board.add_task("Buy oat milk", None)?;
    board.add_task("Book a dentist appointment", None)?;
    board.add_task("Draft the quarterly report", None)?;
    board.add_task("Pick up bread", Some(&groceries))?;
    Ok(board)
}

/// The dispatch loop as configured.
fn build_loop(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    backend: Arc<dyn TaskBackend>,
    max_actions: Option<NonZeroU32>,
) -> ToolDispatchLoop {
    let repairer = StructuredOutputRepairer::new(provider, &config.default_model)
        .with_max_retries(config.repair.max_retries)
        .with_temperature(config.repair.temperature)
        .with_history_len(config.repair.history_len);

    ToolDispatchLoop::new(Arc::new(task_registry(backend)), repairer)
        .with_temperature(config.default_temperature)
        .with_history_len(config.history_len)
        .with_max_actions(max_actions.unwrap_or(config.agent.max_actions))
        .with_max_corrections(config.agent.max_corrections)
}

fn print_step(step: &AgentStep) {
    println!("  Step {}", step.index);
    if let Some(thought) = &step.thought {
        println!("  Thought:     {thought}");
    }
    if let Some(action) = &step.action {
        println!("  Action:      {action}");
    }
    let label = match step.kind {
        StepKind::Tool => "Observation:",
        StepKind::ToolFailed => "Failed:     ",
        StepKind::Correction => "Correction: ",
        StepKind::Final => "Answer:     ",
    };
    for (i, line) in step.observation.lines().enumerate() {
        if i == 0 {
            println!("  {label} {line}");
        } else {
            println!("               {line}");
        }
    }
    println!();
}

pub async fn run(
    config: &AppConfig,
    objective: &str,
    max_actions: Option<NonZeroU32>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = super::provider(config)?;
    let backend = backend(config, dry_run)?;
    let agent = build_loop(config, provider.clone(), backend, max_actions);
    let mut conversation = super::conversation(config, provider);

    println!();
    println!("  Objective: {objective}");
    if dry_run {
        println!("  (dry run: working on an in-memory sample board)");
    }
    println!();

    let outcome = agent
        .run_with(&mut conversation, objective, |step, _| print_step(step))
        .await?;

    match &outcome.state {
        AgentState::Finished { answer } => println!("  {answer}"),
        AgentState::BudgetExhausted | AgentState::Running { .. } => {
            println!("  {}", outcome.final_message())
        }
    }
    println!();
    println!(
        "  ({} actions, {} corrections)",
        outcome.actions_taken, outcome.corrections
    );
    println!();
    Ok(())
}
