use actix_web::{
    http::StatusCode,
    web::{self, Bytes},
    HttpResponse, HttpResponseBuilder,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    error::{PipelineError, Result},
    models::{
        ErrorBody, GenerateModelRequest, GenerateRequest, GenerationEnvelope, HealthResponse,
        PolledGenerationResponse,
    },
    server::AppState,
};

pub const SUCCESS_MESSAGE: &str = "3D model generated successfully";
const REQUEST_ID_HEADER: &str = "x-request-id";

fn status_of(error: &PipelineError) -> StatusCode {
    StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn respond(status: StatusCode, request_id: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::build(status);
    builder.insert_header((REQUEST_ID_HEADER, request_id.to_string()));
    builder
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| PipelineError::Validation(format!("Invalid JSON body: {}", e)))
}

/// The prompt must be present and contain something other than whitespace.
pub fn validate_prompt(prompt: Option<String>) -> Result<String> {
    match prompt {
        Some(prompt) if !prompt.trim().is_empty() => Ok(prompt.trim().to_string()),
        _ => Err(PipelineError::Validation("Prompt is required".into())),
    }
}

fn log_failure(request_id: &str, endpoint: &str, error: &PipelineError) {
    match error {
        PipelineError::Validation(_) | PipelineError::MethodNotAllowed => {
            log::warn!("[req:{}] {} rejected: {}", request_id, endpoint, error)
        }
        PipelineError::ReconstructionProtocol(_) => log::error!(
            "[req:{}] {} provider contract mismatch: {}",
            request_id,
            endpoint,
            error
        ),
        _ => log::error!("[req:{}] {} failed: {}", request_id, endpoint, error),
    }
}

async fn run_generate_3d(state: &AppState, body: &Bytes, request_id: &str) -> Result<String> {
    let request: GenerateRequest = parse_body(body)?;
    let prompt = validate_prompt(request.prompt)?;
    let pipeline = state.sync.as_ref().map_err(Clone::clone)?;

    log::info!(
        "[req:{}] generate-3d: \"{}\" with {} references",
        request_id,
        prompt,
        request.refs.len()
    );
    pipeline.run(&prompt, &request.refs).await
}

/// `POST /api/generate-3d`: all views must succeed before reconstruction.
pub async fn generate_3d(state: web::Data<AppState>, body: Bytes) -> HttpResponse {
    let request_id = Uuid::new_v4().to_string();

    match run_generate_3d(&state, &body, &request_id).await {
        Ok(model) => {
            log::info!("[req:{}] generate-3d finished: {}", request_id, model);
            respond(StatusCode::OK, &request_id).json(GenerationEnvelope::success(model))
        }
        Err(e) => {
            log_failure(&request_id, "generate-3d", &e);
            respond(status_of(&e), &request_id).json(GenerationEnvelope::failure(e.to_string()))
        }
    }
}

pub async fn generate_3d_method_not_allowed() -> HttpResponse {
    let error = PipelineError::MethodNotAllowed;
    HttpResponse::build(status_of(&error)).json(GenerationEnvelope::failure(error.to_string()))
}

async fn run_generate_model(
    state: &AppState,
    body: &Bytes,
    request_id: &str,
) -> Result<PolledGenerationResponse> {
    let request: GenerateModelRequest = parse_body(body)?;
    let prompt = validate_prompt(request.prompt)?;
    let pipeline = state.polled.as_ref().map_err(Clone::clone)?;

    log::info!(
        "[req:{}] generate-3d-model: \"{}\" with {} image URLs",
        request_id,
        prompt,
        request.image_urls.len()
    );
    let outcome = pipeline.run(&prompt, &request.image_urls).await?;

    Ok(PolledGenerationResponse {
        success: true,
        model_url: outcome.model_url,
        generated_images: outcome.generated_images,
        message: SUCCESS_MESSAGE.to_string(),
    })
}

/// `POST /functions/v1/generate-3d-model`: views are best effort, then the
/// reconstruction task is polled until it finishes or times out.
pub async fn generate_model(state: web::Data<AppState>, body: Bytes) -> HttpResponse {
    let request_id = Uuid::new_v4().to_string();

    match run_generate_model(&state, &body, &request_id).await {
        Ok(response) => {
            log::info!(
                "[req:{}] generate-3d-model finished: {} ({} images)",
                request_id,
                response.model_url,
                response.generated_images.len()
            );
            respond(StatusCode::OK, &request_id).json(response)
        }
        Err(e) => {
            log_failure(&request_id, "generate-3d-model", &e);
            respond(status_of(&e), &request_id).json(ErrorBody {
                error: e.to_string(),
            })
        }
    }
}

pub async fn generate_model_method_not_allowed() -> HttpResponse {
    let error = PipelineError::MethodNotAllowed;
    HttpResponse::build(status_of(&error)).json(ErrorBody {
        error: error.to_string(),
    })
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        sync_pipeline: state.sync.is_ok(),
        poll_pipeline: state.polled.is_ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_prompt() {
        assert_eq!(
            validate_prompt(Some("  a stone tower ".into())).unwrap(),
            "a stone tower"
        );
        assert!(matches!(
            validate_prompt(Some("   ".into())),
            Err(PipelineError::Validation(_))
        ));
        assert!(validate_prompt(None).is_err());
    }

    #[test]
    fn test_non_string_prompt_is_validation_error() {
        let result: Result<GenerateRequest> = parse_body(&Bytes::from_static(br#"{"prompt":42}"#));
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_status_of_timeout() {
        assert_eq!(
            status_of(&PipelineError::ReconstructionTimeout { attempts: 30 }),
            StatusCode::REQUEST_TIMEOUT
        );
    }
}
