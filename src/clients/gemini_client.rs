use crate::{
    clients::{ensure_success, traits::ImageModel},
    config::ImageModelConfig,
    error::{PipelineError, Result},
    models::{ContentRequest, ImagePayload, ModelPart, ModelResponse},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// `generateContent` client for Gemini image models.
#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiImageClient {
    pub fn new(client: Client, config: &ImageModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PipelineError::Configuration("GEMINI_API_KEY is not set".into()))?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    pub fn build_request(request: &ContentRequest) -> GeminiRequest {
        let mut parts = vec![GeminiPart {
            text: Some(request.prompt.clone()),
            inline_data: None,
        }];
        parts.extend(request.images.iter().map(|image| GeminiPart {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            }),
        }));

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: request
                    .modalities
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            },
        }
    }

    pub fn parse_response(response: GeminiResponse) -> Result<ModelResponse> {
        let mut parts = Vec::new();
        for candidate in response.candidates {
            let Some(content) = candidate.content else {
                continue;
            };
            for part in content.parts {
                parts.push(Self::convert_part(part)?);
            }
        }
        Ok(ModelResponse::new(parts))
    }

    fn convert_part(part: GeminiPart) -> Result<ModelPart> {
        if let Some(inline) = part.inline_data.filter(|inline| !inline.data.is_empty()) {
            let image = ImagePayload::from_base64(inline.mime_type, &inline.data)?;
            return Ok(ModelPart::Image(image));
        }
        match part.text {
            Some(text) if !text.is_empty() => Ok(ModelPart::Text(text)),
            _ => Ok(ModelPart::Empty),
        }
    }
}

#[async_trait]
impl ImageModel for GeminiImageClient {
    async fn generate_content(&self, request: &ContentRequest) -> Result<ModelResponse> {
        let body = Self::build_request(request);

        log::info!(
            "Generating image with model: {} ({} reference images)",
            self.model,
            request.images.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success("Gemini", response).await?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Serialization(format!("Gemini response: {}", e)))?;

        Self::parse_response(parsed)
    }
}
