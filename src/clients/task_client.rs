use crate::{
    clients::{ensure_success, traits::TaskService},
    config::TaskApiConfig,
    error::{PipelineError, Result},
    models::{TaskStatus, TaskStatusReport, TaskSubmission},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const MULTIVIEW_TASK_TYPE: &str = "multiview_to_model";

#[derive(Debug, Serialize)]
pub struct TaskFile {
    #[serde(rename = "type")]
    pub view: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTaskBody {
    #[serde(rename = "type")]
    pub task_type: String,
    pub files: Vec<TaskFile>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedTask {
    pub task_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskOutput {
    pub model: Option<String>,
    pub pbr_model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskState {
    pub status: TaskStatus,
    #[serde(default)]
    pub output: Option<TaskOutput>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Task-based multiview-to-3D API authenticated with an API key and client id.
#[derive(Clone)]
pub struct MeshTaskClient {
    client: Client,
    api_key: String,
    client_id: String,
    api_base: String,
}

impl MeshTaskClient {
    pub fn new(client: Client, config: &TaskApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PipelineError::Configuration("MESH_API_KEY is not set".into()))?;
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| PipelineError::Configuration("MESH_CLIENT_ID is not set".into()))?;

        Ok(Self {
            client,
            api_key,
            client_id,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn build_body(submission: &TaskSubmission) -> CreateTaskBody {
        CreateTaskBody {
            task_type: MULTIVIEW_TASK_TYPE.to_string(),
            files: submission
                .views
                .iter()
                .map(|(view, url)| TaskFile {
                    view: view.as_str().to_string(),
                    url: url.clone(),
                })
                .collect(),
        }
    }

    pub fn parse_created(body: &str) -> Result<String> {
        let envelope: Envelope<CreatedTask> = serde_json::from_str(body).map_err(|e| {
            PipelineError::ReconstructionProtocol(format!("task creation response: {}", e))
        })?;
        envelope
            .data
            .and_then(|data| data.task_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                PipelineError::ReconstructionProtocol(format!(
                    "task creation response has no task_id{}",
                    envelope
                        .message
                        .map(|m| format!(" ({})", m))
                        .unwrap_or_default()
                ))
            })
    }

    pub fn parse_status(body: &str) -> Result<TaskStatusReport> {
        let envelope: Envelope<TaskState> = serde_json::from_str(body).map_err(|e| {
            PipelineError::ReconstructionProtocol(format!("task status response: {}", e))
        })?;
        let state = envelope.data.ok_or_else(|| {
            PipelineError::ReconstructionProtocol("task status response has no data".into())
        })?;

        let model_url = state
            .output
            .and_then(|output| output.pbr_model.or(output.model))
            .filter(|url| !url.is_empty());

        Ok(TaskStatusReport {
            status: state.status,
            model_url,
            message: state.message.or(envelope.message),
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .header("X-Client-Id", &self.client_id)
    }
}

#[async_trait]
impl TaskService for MeshTaskClient {
    async fn create_task(&self, submission: &TaskSubmission) -> Result<String> {
        let body = Self::build_body(submission);
        let response = self
            .authorized(self.client.post(format!("{}/tasks", self.api_base)))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success("Mesh task API", response).await?;
        let text = response.text().await?;
        log::debug!("Task creation response: {}", text);
        Self::parse_created(&text)
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/tasks/{}", self.api_base, task_id)),
            )
            .send()
            .await?;
        let response = ensure_success("Mesh task API", response).await?;
        let text = response.text().await?;
        Self::parse_status(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViewName;

    #[test]
    fn test_body_keeps_empty_slots() {
        let submission = TaskSubmission {
            views: vec![
                (ViewName::Front, "data:image/png;base64,AA==".into()),
                (ViewName::Top, String::new()),
            ],
        };
        let json = serde_json::to_value(MeshTaskClient::build_body(&submission)).unwrap();
        assert_eq!(json["type"], "multiview_to_model");
        assert_eq!(json["files"][0]["type"], "front");
        assert_eq!(json["files"][1]["type"], "top");
        assert_eq!(json["files"][1]["url"], "");
    }

    #[test]
    fn test_parse_created() {
        assert_eq!(
            MeshTaskClient::parse_created(r#"{"code":0,"data":{"task_id":"t-1"}}"#).unwrap(),
            "t-1"
        );
        let missing = MeshTaskClient::parse_created(r#"{"code":2001,"message":"bad key"}"#);
        match missing {
            Err(PipelineError::ReconstructionProtocol(msg)) => assert!(msg.contains("bad key")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_running_status() {
        let report = MeshTaskClient::parse_status(r#"{"data":{"status":"running"}}"#).unwrap();
        assert_eq!(report.status, TaskStatus::Running);
        assert_eq!(report.model_url, None);
    }

    #[test]
    fn test_parse_success_prefers_pbr_model() {
        let report = MeshTaskClient::parse_status(
            r#"{"data":{"status":"success","output":{"model":"https://x/a.glb","pbr_model":"https://x/pbr.glb"}}}"#,
        )
        .unwrap();
        assert_eq!(report.status, TaskStatus::Success);
        assert_eq!(report.model_url.as_deref(), Some("https://x/pbr.glb"));
    }
}
