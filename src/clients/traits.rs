use crate::{
    error::Result,
    models::{
        ContentRequest, MeshOutput, MeshSubscribeInput, ModelResponse, TaskStatusReport,
        TaskSubmission,
    },
};
use async_trait::async_trait;

/// Multimodal model that can return generated images.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate_content(&self, request: &ContentRequest) -> Result<ModelResponse>;
}

/// Raw bytes of a remote reference image.
#[derive(Debug, Clone)]
pub struct FetchedReference {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedReference>;
}

/// Multiview-to-mesh service that blocks until the mesh is ready.
#[async_trait]
pub trait MeshSubscriber: Send + Sync {
    async fn subscribe(&self, input: &MeshSubscribeInput) -> Result<MeshOutput>;
}

/// Multiview-to-mesh service driven by task creation and status polling.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn create_task(&self, submission: &TaskSubmission) -> Result<String>;
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport>;
}
