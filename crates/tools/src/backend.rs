//! Task backend: the task manager the agent's tools operate on.

use async_trait::async_trait;
use autochat_core::error::ToolError;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// An active task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    pub project_id: String,
}

/// A project (task list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_inbox_project: bool,
}

/// Operations the agent can perform on a task manager.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Tasks in the Inbox project.
    async fn inbox_tasks(&self) -> Result<Vec<Task>, ToolError>;

    /// All active tasks.
    async fn all_tasks(&self) -> Result<Vec<Task>, ToolError>;

    /// All projects.
    async fn all_projects(&self) -> Result<Vec<Project>, ToolError>;

    /// Move `task_id` into `project_id`.
    async fn move_task(&self, task_id: &str, project_id: &str) -> Result<(), ToolError>;

    /// Create a project named `name`.
    async fn create_project(&self, name: &str) -> Result<Project, ToolError>;
}

/// A task board held in memory.
///
/// Used for `--dry-run` sessions and tests; ids are sequential strings.
pub struct InMemoryTaskBoard {
    state: Mutex<BoardState>,
}

struct BoardState {
    next_id: u64,
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

impl BoardState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn inbox_id(&self) -> Option<String> {
        self.projects
            .iter()
            .find(|p| p.is_inbox_project)
            .map(|p| p.id.clone())
    }
}

impl InMemoryTaskBoard {
    /// A board containing only an empty Inbox.
    pub fn new() -> Self {
        let mut state = BoardState {
            next_id: 0,
            projects: Vec::new(),
            tasks: Vec::new(),
        };
        let id = state.next_id();
        state.projects.push(Project {
            id,
            name: "Inbox".into(),
            is_inbox_project: true,
        });
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BoardState>, ToolError> {
        self.state
            .lock()
            .map_err(|_| ToolError::Backend("task board lock poisoned".into()))
    }

    /// Add a project and return its id.
    pub fn add_project(&self, name: &str) -> Result<String, ToolError> {
        let mut state = self.lock()?;
        let id = state.next_id();
        state.projects.push(Project {
            id: id.clone(),
            name: name.into(),
            is_inbox_project: false,
        });
        Ok(id)
    }

    /// Add a task; `None` puts it in the Inbox. Returns the task id.
    pub fn add_task(&self, content: &str, project_id: Option<&str>) -> Result<String, ToolError> {
        let mut state = self.lock()?;
        let project_id = match project_id {
            Some(id) => id.to_string(),
            None => state
                .inbox_id()
                .ok_or_else(|| ToolError::Backend("no inbox project".into()))?,
        };
        let id = state.next_id();
        state.tasks.push(Task {
            id: id.clone(),
            content: content.into(),
            description: String::new(),
            project_id,
        });
        Ok(id)
    }

    /// Snapshot of one task.
    pub fn task(&self, id: &str) -> Option<Task> {
        self.lock().ok()?.tasks.iter().find(|t| t.id == id).cloned()
    }
}

impl Default for InMemoryTaskBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskBackend for InMemoryTaskBoard {
    async fn inbox_tasks(&self) -> Result<Vec<Task>, ToolError> {
        let state = self.lock()?;
        let inbox = state
            .inbox_id()
            .ok_or_else(|| ToolError::Backend("no inbox project".into()))?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.project_id == inbox)
            .cloned()
            .collect())
    }

    async fn all_tasks(&self) -> Result<Vec<Task>, ToolError> {
        Ok(self.lock()?.tasks.clone())
    }

    async fn all_projects(&self) -> Result<Vec<Project>, ToolError> {
        Ok(self.lock()?.projects.clone())
    }

    async fn move_task(&self, task_id: &str, project_id: &str) -> Result<(), ToolError> {
        let mut state = self.lock()?;
        if !state.projects.iter().any(|p| p.id == project_id) {
            return Err(ToolError::ExecutionFailed {
                tool_name: "move_task".into(),
                reason: format!("no project with id {project_id}"),
            });
        }
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ToolError::ExecutionFailed {
                tool_name: "move_task".into(),
                reason: format!("no task with id {task_id}"),
            })?;
        task.project_id = project_id.to_string();
        Ok(())
    }

    async fn create_project(&self, name: &str) -> Result<Project, ToolError> {
        let mut state = self.lock()?;
        let id = state.next_id();
        let project = Project {
            id,
            name: name.to_string(),
            is_inbox_project: false,
        };
        state.projects.push(project.clone());
        Ok(project)
    }
}
