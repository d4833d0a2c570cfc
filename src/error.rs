use crate::models::ViewName;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Generation error: {0}")]
    Generation(String),
    #[error("Reference fetch error: {0}")]
    ReferenceFetch(String),
    #[error("View set is missing the {0} view")]
    IncompleteViewSet(ViewName),
    #[error("3D reconstruction failed: {0}")]
    ReconstructionFailed(String),
    #[error("3D reconstruction timed out after {attempts} status checks")]
    ReconstructionTimeout { attempts: u32 },
    #[error("Reconstruction protocol error: {0}")]
    ReconstructionProtocol(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// HTTP status the request handlers answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Validation(_) => 400,
            PipelineError::MethodNotAllowed => 405,
            PipelineError::ReconstructionTimeout { .. } => 408,
            PipelineError::Configuration(_)
            | PipelineError::Generation(_)
            | PipelineError::ReferenceFetch(_)
            | PipelineError::IncompleteViewSet(_)
            | PipelineError::ReconstructionFailed(_)
            | PipelineError::ReconstructionProtocol(_)
            | PipelineError::Provider(_)
            | PipelineError::Serialization(_) => 500,
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Provider(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PipelineError::Validation("x".into()).status_code(), 400);
        assert_eq!(PipelineError::MethodNotAllowed.status_code(), 405);
        assert_eq!(
            PipelineError::ReconstructionTimeout { attempts: 30 }.status_code(),
            408
        );
        assert_eq!(
            PipelineError::ReconstructionProtocol("no url".into()).status_code(),
            500
        );
        assert_eq!(PipelineError::Configuration("key".into()).status_code(), 500);
    }

    #[test]
    fn test_timeout_message_names_attempts() {
        let msg = PipelineError::ReconstructionTimeout { attempts: 30 }.to_string();
        assert!(msg.contains("30"));
    }
}
