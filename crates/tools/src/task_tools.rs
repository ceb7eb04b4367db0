//! Agent tools backed by a [`TaskBackend`].
//!
//! One tool per side-effecting action tag. Each returns text the model
//! reads as its next observation.

use async_trait::async_trait;
use autochat_core::error::ToolError;
use autochat_core::tool::{Tool, ToolResult};
use serde::Serialize;
use std::sync::Arc;

use crate::backend::TaskBackend;

fn to_observation<T: Serialize>(items: &[T]) -> Result<ToolResult, ToolError> {
    serde_json::to_string_pretty(items)
        .map(ToolResult::ok)
        .map_err(|e| ToolError::Backend(e.to_string()))
}

fn required_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

pub struct GetInboxTasksTool {
    backend: Arc<dyn TaskBackend>,
}

impl GetInboxTasksTool {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetInboxTasksTool {
    fn name(&self) -> &str {
        "get_all_inbox_tasks"
    }

    fn description(&self) -> &str {
        "List every task in the Inbox with its id, content and description."
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let tasks = self.backend.inbox_tasks().await?;
        if tasks.is_empty() {
            return Ok(ToolResult::ok("The inbox is empty."));
        }
        to_observation(&tasks)
    }
}

pub struct GetAllTasksTool {
    backend: Arc<dyn TaskBackend>,
}

impl GetAllTasksTool {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetAllTasksTool {
    fn name(&self) -> &str {
        "get_all_tasks"
    }

    fn description(&self) -> &str {
        "List every active task across all projects, including its project_id."
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let tasks = self.backend.all_tasks().await?;
        if tasks.is_empty() {
            return Ok(ToolResult::ok("There are no active tasks."));
        }
        to_observation(&tasks)
    }
}

pub struct GetAllProjectsTool {
    backend: Arc<dyn TaskBackend>,
}

impl GetAllProjectsTool {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GetAllProjectsTool {
    fn name(&self) -> &str {
        "get_all_projects"
    }

    fn description(&self) -> &str {
        "List every project with its id and name."
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let projects = self.backend.all_projects().await?;
        to_observation(&projects)
    }
}

pub struct MoveTaskTool {
    backend: Arc<dyn TaskBackend>,
}

impl MoveTaskTool {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for MoveTaskTool {
    fn name(&self) -> &str {
        "move_task"
    }

    fn description(&self) -> &str {
        "Move the task with task_id into the project with project_id. Both ids must come from earlier observations."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let task_id = required_str(&arguments, "task_id")?;
        let project_id = required_str(&arguments, "project_id")?;
        self.backend.move_task(task_id, project_id).await?;
        Ok(ToolResult::ok(format!(
            "Task with id {task_id} moved to project with id {project_id}."
        )))
    }
}

pub struct CreateProjectTool {
    backend: Arc<dyn TaskBackend>,
}

impl CreateProjectTool {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn name(&self) -> &str {
        "create_new_project"
    }

    fn description(&self) -> &str {
        "Create a new project named project_name and return its id."
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let name = required_str(&arguments, "project_name")?;
        let project = self.backend.create_project(name).await?;
        Ok(ToolResult::ok(format!(
            "Project '{}' created with id {}.",
            project.name, project.id
        )))
    }
}
