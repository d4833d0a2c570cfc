use crate::{
    clients::traits::{FetchedReference, ReferenceFetcher},
    error::{PipelineError, Result},
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};

/// Downloads reference images over plain HTTP(S).
#[derive(Clone, Default)]
pub struct HttpReferenceFetcher {
    client: Client,
}

impl HttpReferenceFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReferenceFetcher for HttpReferenceFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedReference> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::ReferenceFetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(PipelineError::ReferenceFetch(format!(
                "{}: HTTP {}",
                url,
                response.status().as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::ReferenceFetch(format!("{}: {}", url, e)))?;

        Ok(FetchedReference {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}
