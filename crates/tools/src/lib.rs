//! Task-management tools for the autochat agent.
//!
//! Tools give the agent the ability to act on a task manager: list tasks
//! and projects, move tasks between projects and create projects. They
//! all sit on a [`TaskBackend`], either the Todoist API or an in-memory
//! board.

pub mod backend;
pub mod task_tools;
pub mod todoist;

use autochat_core::tool::ToolRegistry;
use std::sync::Arc;

pub use backend::{InMemoryTaskBoard, Project, Task, TaskBackend};
pub use todoist::TodoistClient;

/// Create a registry with every task tool over `backend`.
pub fn task_registry(backend: Arc<dyn TaskBackend>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(task_tools::GetInboxTasksTool::new(backend.clone())));
    registry.register(Box::new(task_tools::GetAllTasksTool::new(backend.clone())));
    registry.register(Box::new(task_tools::GetAllProjectsTool::new(backend.clone())));
    registry.register(Box::new(task_tools::MoveTaskTool::new(backend.clone())));
    registry.register(Box::new(task_tools::CreateProjectTool::new(backend)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use autochat_core::action::Action;

    #[test]
    fn registry_covers_every_side_effecting_action() {
        let registry = task_registry(Arc::new(InMemoryTaskBoard::new()));
        let expected: Vec<&str> = Action::TAGS
            .into_iter()
            .filter(|t| *t != "give_final_answer")
            .collect();
        let mut names = registry.names();
        names.sort();
        let mut expected_sorted = expected.clone();
        expected_sorted.sort();
        assert_eq!(names, expected_sorted);
    }

    #[tokio::test]
    async fn registry_dispatches_to_board() {
        let board = Arc::new(InMemoryTaskBoard::new());
        let registry = task_registry(board.clone());
        let result = registry
            .execute(&Action::CreateNewProject {
                project_name: "Reading".into(),
            })
            .await
            .unwrap();
        assert!(result.output.contains("Reading"));
        assert_eq!(board.all_projects().await.unwrap().len(), 2);
    }
}
