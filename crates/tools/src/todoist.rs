//! Todoist backend over HTTP.
//!
//! Reads and project creation use the REST v2 API. Moving a task between
//! projects is only exposed by the Sync API, so that goes through an
//! `item_move` command.

use async_trait::async_trait;
use autochat_core::error::ToolError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::{Project, TaskBackend, Task};

pub struct TodoistClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TodoistClient {
    /// `base_url` is the API host, e.g. `https://api.todoist.com`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v2/{}", self.base_url, path)
    }

    fn sync_url(&self) -> String {
        format!("{}/sync/v9/sync", self.base_url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ToolError> {
        debug!(%url, "Todoist GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ToolError::Backend(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ToolError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "Todoist returned error");
            return Err(ToolError::Backend(format!(
                "Todoist API returned {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ToolError::Backend(format!("unexpected Todoist response: {e}")))
    }

    fn move_command(task_id: &str, project_id: &str, uuid: &str) -> serde_json::Value {
        serde_json::json!({
            "commands": [{
                "type": "item_move",
                "uuid": uuid,
                "args": { "id": task_id, "project_id": project_id }
            }]
        })
    }
}

#[derive(Debug, Deserialize)]
struct SyncResponse {
    #[serde(default)]
    sync_status: serde_json::Map<String, serde_json::Value>,
}

#[async_trait]
impl TaskBackend for TodoistClient {
    async fn inbox_tasks(&self) -> Result<Vec<Task>, ToolError> {
        let projects = self.all_projects().await?;
        let inbox = projects
            .iter()
            .find(|p| p.is_inbox_project)
            .ok_or_else(|| ToolError::Backend("no inbox project found".into()))?;
        self.get_json(&self.rest_url(&format!("tasks?project_id={}", inbox.id)))
            .await
    }

    async fn all_tasks(&self) -> Result<Vec<Task>, ToolError> {
        self.get_json(&self.rest_url("tasks")).await
    }

    async fn all_projects(&self) -> Result<Vec<Project>, ToolError> {
        self.get_json(&self.rest_url("projects")).await
    }

    async fn move_task(&self, task_id: &str, project_id: &str) -> Result<(), ToolError> {
        let uuid = uuid::Uuid::new_v4().to_string();
        let response = self
            .client
            .post(self.sync_url())
            .bearer_auth(&self.api_key)
            .json(&Self::move_command(task_id, project_id, &uuid))
            .send()
            .await
            .map_err(|e| ToolError::Backend(e.to_string()))?;
        let sync: SyncResponse = Self::read_json(response).await?;

        match sync.sync_status.get(&uuid) {
            Some(serde_json::Value::String(s)) if s == "ok" => Ok(()),
            Some(other) => Err(ToolError::ExecutionFailed {
                tool_name: "move_task".into(),
                reason: other.to_string(),
            }),
            None => Err(ToolError::Backend("sync response missing command status".into())),
        }
    }

    async fn create_project(&self, name: &str) -> Result<Project, ToolError> {
        let response = self
            .client
            .post(self.rest_url("projects"))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| ToolError::Backend(e.to_string()))?;
        Self::read_json(response).await
    }
}
