use std::sync::Arc;

use crate::{
    clients::ImageModel,
    error::{PipelineError, Result},
    models::{ContentRequest, ImagePayload, ViewRequest},
};

/// Produces exactly one image per call from the image model.
#[derive(Clone)]
pub struct ViewGenerator {
    model: Arc<dyn ImageModel>,
}

impl ViewGenerator {
    pub fn new(model: Arc<dyn ImageModel>) -> Self {
        Self { model }
    }

    pub async fn generate_view(
        &self,
        prompt_text: &str,
        references: &[ImagePayload],
    ) -> Result<ImagePayload> {
        let request = ContentRequest::new(prompt_text, references.to_vec());
        let response = self.model.generate_content(&request).await?;

        let text = response.text();
        if !text.is_empty() {
            log::debug!("Model commentary: {}", text);
        }

        response
            .first_image()
            .cloned()
            .ok_or_else(|| PipelineError::Generation("model returned no image".into()))
    }

    pub async fn generate(&self, request: &ViewRequest) -> Result<ImagePayload> {
        self.generate_view(&request.prompt_text, &request.references)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelPart, ModelResponse};
    use async_trait::async_trait;

    struct FixedModel(ModelResponse);

    #[async_trait]
    impl ImageModel for FixedModel {
        async fn generate_content(&self, _request: &ContentRequest) -> Result<ModelResponse> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_returns_first_image() {
        let generator = ViewGenerator::new(Arc::new(FixedModel(ModelResponse::new(vec![
            ModelPart::Text("ok".into()),
            ModelPart::Image(ImagePayload::new("image/png", vec![9])),
        ]))));

        let image = generator.generate_view("a barn", &[]).await.unwrap();
        assert_eq!(image.bytes, vec![9]);
    }

    #[tokio::test]
    async fn test_text_only_response_is_generation_error() {
        let generator = ViewGenerator::new(Arc::new(FixedModel(ModelResponse::new(vec![
            ModelPart::Text("I cannot draw that".into()),
        ]))));

        match generator.generate_view("a barn", &[]).await {
            Err(PipelineError::Generation(msg)) => assert_eq!(msg, "model returned no image"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
