//! Agent actions, the closed set of things the model may ask for.
//!
//! Each agent step the model answers with a [`ReactResponse`]: a free-form
//! thought plus exactly one [`Action`]. Actions are internally tagged by
//! `type`; a tag outside this enum fails to decode.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One action the model can choose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// List every task in the Inbox project.
    GetAllInboxTasks,
    /// List every active task across all projects.
    GetAllTasks,
    /// List every project with its id.
    GetAllProjects,
    /// Move a task into another project.
    MoveTask { task_id: String, project_id: String },
    /// Create a project and report its id.
    CreateNewProject { project_name: String },
    /// Stop and answer the user.
    GiveFinalAnswer { answer: String },
}

impl Action {
    /// Every tag, in declaration order.
    pub const TAGS: [&'static str; 6] = [
        "get_all_inbox_tasks",
        "get_all_tasks",
        "get_all_projects",
        "move_task",
        "create_new_project",
        "give_final_answer",
    ];

    /// The `type` tag this action serializes with.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::GetAllInboxTasks => "get_all_inbox_tasks",
            Action::GetAllTasks => "get_all_tasks",
            Action::GetAllProjects => "get_all_projects",
            Action::MoveTask { .. } => "move_task",
            Action::CreateNewProject { .. } => "create_new_project",
            Action::GiveFinalAnswer { .. } => "give_final_answer",
        }
    }

    /// The variant's fields as a JSON object, without the tag.
    pub fn arguments(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(map) = value.as_object_mut() {
            map.remove("type");
        }
        value
    }

    /// The answer text when this is the terminal action.
    pub fn final_answer(&self) -> Option<&str> {
        match self {
            Action::GiveFinalAnswer { answer } => Some(answer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.tag(), self.arguments())
    }
}

/// The structured reply expected on every agent step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReactResponse {
    /// Reasoning about what to do next.
    pub thought: String,
    /// The single action to take.
    pub action: Action,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OutputSchema;

    fn every_variant() -> Vec<Action> {
        vec![
            Action::GetAllInboxTasks,
            Action::GetAllTasks,
            Action::GetAllProjects,
            Action::MoveTask {
                task_id: "123".into(),
                project_id: "456".into(),
            },
            Action::CreateNewProject {
                project_name: "Groceries".into(),
            },
            Action::GiveFinalAnswer {
                answer: "All done.".into(),
            },
        ]
    }

    #[test]
    fn every_variant_survives_encode_decode() {
        for action in every_variant() {
            let response = ReactResponse {
                thought: "thinking".into(),
                action: action.clone(),
            };
            let json = serde_json::to_string(&response).unwrap();
            let back: ReactResponse = serde_json::from_str(&json).unwrap();
            assert_eq!(back, response, "{json}");
        }
    }

    #[test]
    fn tags_match_serialized_type_field() {
        let variants = every_variant();
        assert_eq!(variants.len(), Action::TAGS.len());
        for (action, tag) in variants.iter().zip(Action::TAGS) {
            let value = serde_json::to_value(action).unwrap();
            assert_eq!(value["type"], tag);
            assert_eq!(action.tag(), tag);
        }
    }

    #[test]
    fn arguments_drop_the_tag() {
        let action = Action::MoveTask {
            task_id: "1".into(),
            project_id: "2".into(),
        };
        assert_eq!(
            action.arguments(),
            serde_json::json!({"task_id": "1", "project_id": "2"})
        );
        assert_eq!(Action::GetAllTasks.arguments(), serde_json::json!({}));
    }

    #[test]
    fn unknown_tag_is_a_decode_error() {
        let schema = OutputSchema::<ReactResponse>::derive();
        let err = schema
            .decode(r#"{"thought": "hm", "action": {"type": "delete_everything"}}"#)
            .unwrap_err();
        assert!(err.message.contains("delete_everything"), "{}", err.message);
    }

    #[test]
    fn missing_variant_field_is_a_decode_error() {
        let schema = OutputSchema::<ReactResponse>::derive();
        assert!(schema
            .decode(r#"{"thought": "hm", "action": {"type": "move_task", "task_id": "1"}}"#)
            .is_err());
    }

    #[test]
    fn final_answer_only_for_terminal_variant() {
        assert_eq!(
            Action::GiveFinalAnswer { answer: "x".into() }.final_answer(),
            Some("x")
        );
        assert_eq!(Action::GetAllProjects.final_answer(), None);
    }

    #[test]
    fn schema_mentions_every_tag() {
        let schema = OutputSchema::<ReactResponse>::derive().to_pretty_string();
        for tag in Action::TAGS {
            assert!(schema.contains(tag), "schema missing {tag}");
        }
    }
}
