use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate-3d`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
    #[serde(default)]
    pub refs: Vec<String>,
}

/// Body of `POST /functions/v1/generate-3d-model`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateModelRequest {
    pub prompt: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Response envelope of the synchronous endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationEnvelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationEnvelope {
    pub fn success(model: impl Into<String>) -> Self {
        Self {
            ok: true,
            model: Some(model.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            model: None,
            error: Some(error.into()),
        }
    }
}

/// Success body of the polling endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolledGenerationResponse {
    pub success: bool,
    pub model_url: String,
    pub generated_images: Vec<String>,
    pub message: String,
}

/// Failure body of the polling endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub sync_pipeline: bool,
    pub poll_pipeline: bool,
}
