use crate::{
    clients::{ensure_success, traits::MeshSubscriber},
    config::SubscribeConfig,
    error::{PipelineError, Result},
    models::{MeshOutput, MeshSubscribeInput},
};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client};

/// Calls a fal.ai multiview-to-3D app on its synchronous run endpoint,
/// which holds the connection open until the mesh is ready.
#[derive(Clone)]
pub struct FalMeshClient {
    client: Client,
    api_key: String,
    api_base: String,
    app: String,
}

impl FalMeshClient {
    pub fn new(client: Client, config: &SubscribeConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PipelineError::Configuration("FAL_KEY is not set".into()))?;

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            app: config.app.trim_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.api_base, self.app)
    }
}

#[async_trait]
impl MeshSubscriber for FalMeshClient {
    async fn subscribe(&self, input: &MeshSubscribeInput) -> Result<MeshOutput> {
        log::info!("Submitting views to {}", self.app);

        let response = self
            .client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Key {}", self.api_key))
            .json(input)
            .send()
            .await?;
        let response = ensure_success("fal.ai", response).await?;

        let body = response.text().await?;
        log::debug!("fal.ai raw response: {}", body);

        serde_json::from_str(&body)
            .map_err(|e| PipelineError::ReconstructionProtocol(format!("fal.ai response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_and_app() {
        let config = SubscribeConfig {
            api_base: "https://fal.run/".into(),
            app: "/fal-ai/hunyuan3d/v2/multi-view".into(),
            ..SubscribeConfig::new().with_api_key("k")
        };
        let client = FalMeshClient::new(Client::new(), &config).unwrap();
        assert_eq!(client.endpoint(), "https://fal.run/fal-ai/hunyuan3d/v2/multi-view");
    }

    #[test]
    fn test_input_wire_format() {
        let input = MeshSubscribeInput {
            front_image_url: "data:image/png;base64,AA==".into(),
            back_image_url: "b".into(),
            left_image_url: "l".into(),
            right_image_url: "r".into(),
            textured_mesh: true,
            enable_pbr: false,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["front_image_url"], "data:image/png;base64,AA==");
        assert_eq!(json["textured_mesh"], true);
        assert_eq!(json["enable_pbr"], false);
    }
}
