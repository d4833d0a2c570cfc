use std::sync::Arc;

use futures::future::join_all;

use crate::{
    clients::ReferenceFetcher,
    error::Result,
    models::{ImagePayload, DEFAULT_IMAGE_MIME},
};

/// Normalizes reference strings (data URIs or remote URLs) into image payloads.
#[derive(Clone)]
pub struct ImageEncoder {
    fetcher: Arc<dyn ReferenceFetcher>,
}

impl ImageEncoder {
    pub fn new(fetcher: Arc<dyn ReferenceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Encode one reference. A reference that cannot be decoded or fetched is
    /// logged and yields `None`; it never fails the caller.
    pub async fn encode(&self, reference: &str) -> Option<ImagePayload> {
        match self.try_encode(reference).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                log::warn!("Dropping reference image: {}", e);
                None
            }
        }
    }

    async fn try_encode(&self, reference: &str) -> Result<ImagePayload> {
        if let Some(parsed) = ImagePayload::from_data_uri(reference) {
            return parsed;
        }

        let fetched = self.fetcher.fetch(reference).await?;
        let mime_type = fetched
            .content_type
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
        Ok(ImagePayload::new(mime_type, fetched.bytes))
    }

    /// Encode every reference concurrently, keeping input order and skipping drops.
    pub async fn encode_all(&self, references: &[String]) -> Vec<ImagePayload> {
        let encoded = join_all(references.iter().map(|r| self.encode(r))).await;
        let payloads: Vec<ImagePayload> = encoded.into_iter().flatten().collect();
        if payloads.len() < references.len() {
            log::info!(
                "Using {} of {} reference images",
                payloads.len(),
                references.len()
            );
        }
        payloads
    }
}
