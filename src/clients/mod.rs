pub mod fal_client;
pub mod fetch_client;
pub mod gemini_client;
pub mod task_client;
pub mod traits;

use crate::error::{PipelineError, Result};

pub use fal_client::FalMeshClient;
pub use fetch_client::HttpReferenceFetcher;
pub use gemini_client::GeminiImageClient;
pub use task_client::MeshTaskClient;
pub use traits::{FetchedReference, ImageModel, MeshSubscriber, ReferenceFetcher, TaskService};

/// Turn a non-2xx provider response into a `Provider` error carrying the body.
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::error!("{} responded with HTTP {}: {}", provider, status, body);
    Err(PipelineError::Provider(format!(
        "{} responded with HTTP {}: {}",
        provider,
        status.as_u16(),
        body
    )))
}
