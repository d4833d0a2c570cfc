use serde::{Deserialize, Serialize};

use super::ViewName;

/// Status reported by the reconstruction task API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    /// Any status string the provider adds later; treated as still in progress.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

/// A remote reconstruction job, updated from status polls only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconstructionTask {
    pub task_id: String,
    pub status: TaskStatus,
    pub result_asset_url: Option<String>,
    pub attempts: u32,
}

impl ReconstructionTask {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            result_asset_url: None,
            attempts: 0,
        }
    }
}

/// One poll result, already lifted out of the provider's wire envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusReport {
    pub status: TaskStatus,
    pub model_url: Option<String>,
    pub message: Option<String>,
}

/// View URLs submitted to the task API, one slot per canonical view.
/// Views that were not generated are submitted as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSubmission {
    pub views: Vec<(ViewName, String)>,
}

/// Material flags for the subscribe reconstruction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshOptions {
    pub textured_mesh: bool,
    pub enable_pbr: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            textured_mesh: true,
            enable_pbr: true,
        }
    }
}

/// Input for the synchronous multiview-to-mesh call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshSubscribeInput {
    pub front_image_url: String,
    pub back_image_url: String,
    pub left_image_url: String,
    pub right_image_url: String,
    pub textured_mesh: bool,
    pub enable_pbr: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshFile {
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// Result of the synchronous mesh call. Every field is optional so a
/// contract mismatch surfaces as a protocol error instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshOutput {
    pub model_mesh: Option<MeshFile>,
}

impl MeshOutput {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            model_mesh: Some(MeshFile {
                url: Some(url.into()),
                content_type: None,
                file_name: None,
            }),
        }
    }

    pub fn mesh_url(&self) -> Option<&str> {
        self.model_mesh
            .as_ref()
            .and_then(|mesh| mesh.url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_is_not_terminal() {
        let status: TaskStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(status, TaskStatus::Unknown);
        assert!(!status.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn test_mesh_url_ignores_empty_string() {
        assert_eq!(MeshOutput::with_url("").mesh_url(), None);
        assert_eq!(
            MeshOutput::with_url("https://x/model.glb").mesh_url(),
            Some("https://x/model.glb")
        );
    }

    #[test]
    fn test_mesh_output_parses_provider_body() {
        let output: MeshOutput =
            serde_json::from_str(r#"{"model_mesh":{"url":"https://x/m.glb","file_size":10}}"#)
                .unwrap();
        assert_eq!(output.mesh_url(), Some("https://x/m.glb"));
    }
}
