pub mod handlers;

use std::sync::Arc;

use actix_web::{http::Method, middleware::DefaultHeaders, web, App, HttpServer};

use crate::{
    clients::{FalMeshClient, GeminiImageClient, HttpReferenceFetcher, MeshTaskClient},
    config::AppConfig,
    error::{PipelineError, Result},
    models::MeshOptions,
    pipeline::{
        ConsistentMultiViewPipeline, ImageEncoder, PolledGeneration, PollingReconstruction,
        SubscribeReconstruction, SyncGeneration, ViewGenerator,
    },
};

pub const GENERATE_3D_PATH: &str = "/api/generate-3d";
pub const FUNCTIONS_SCOPE: &str = "/functions/v1";
pub const GENERATE_MODEL_PATH: &str = "/generate-3d-model";

/// Reference images may arrive inline as data URIs.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Pipelines shared by every request. A pipeline whose credentials are
/// missing is kept as the configuration error that every request returns.
pub struct AppState {
    pub sync: std::result::Result<Arc<SyncGeneration>, PipelineError>,
    pub polled: std::result::Result<Arc<PolledGeneration>, PipelineError>,
}

impl AppState {
    pub fn new(sync: Result<SyncGeneration>, polled: Result<PolledGeneration>) -> Self {
        Self {
            sync: sync.map(Arc::new),
            polled: polled.map(Arc::new),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let http = reqwest::Client::new();
        Self::new(
            build_sync_generation(config, &http),
            build_polled_generation(config, &http),
        )
    }
}

fn missing_credentials(missing: Vec<&'static str>) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Configuration(format!(
            "missing credentials: {}",
            missing.join(", ")
        )))
    }
}

fn shared_stages(
    config: &AppConfig,
    http: &reqwest::Client,
) -> Result<(ImageEncoder, ConsistentMultiViewPipeline)> {
    let model = GeminiImageClient::new(http.clone(), &config.image)?;
    let encoder = ImageEncoder::new(Arc::new(HttpReferenceFetcher::new(http.clone())));
    let views = ConsistentMultiViewPipeline::new(ViewGenerator::new(Arc::new(model)));
    Ok((encoder, views))
}

pub fn build_sync_generation(config: &AppConfig, http: &reqwest::Client) -> Result<SyncGeneration> {
    missing_credentials(config.missing_sync_credentials())?;
    let (encoder, views) = shared_stages(config, http)?;
    let mesh = FalMeshClient::new(http.clone(), &config.subscribe)?;
    let options = MeshOptions {
        textured_mesh: config.subscribe.textured_mesh,
        enable_pbr: config.subscribe.enable_pbr,
    };

    Ok(SyncGeneration {
        encoder,
        views,
        reconstruction: SubscribeReconstruction::new(Arc::new(mesh), options),
    })
}

pub fn build_polled_generation(
    config: &AppConfig,
    http: &reqwest::Client,
) -> Result<PolledGeneration> {
    missing_credentials(config.missing_poll_credentials())?;
    let (encoder, views) = shared_stages(config, http)?;
    let tasks = MeshTaskClient::new(http.clone(), &config.tasks)?;

    Ok(PolledGeneration {
        encoder,
        views,
        reconstruction: PollingReconstruction::new(
            Arc::new(tasks),
            config.tasks.poll_interval,
            config.tasks.max_attempts,
        ),
    })
}

fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add((
            "Access-Control-Allow-Headers",
            "authorization, x-client-info, apikey, content-type",
        ))
        .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
}

/// Registers every route. The caller provides `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::resource(GENERATE_3D_PATH)
                .route(web::post().to(handlers::generate_3d))
                .default_service(web::to(handlers::generate_3d_method_not_allowed)),
        )
        .service(
            web::scope(FUNCTIONS_SCOPE).wrap(cors_headers()).service(
                web::resource(GENERATE_MODEL_PATH)
                    .route(web::post().to(handlers::generate_model))
                    .route(web::method(Method::OPTIONS).to(handlers::preflight))
                    .default_service(web::to(handlers::generate_model_method_not_allowed)),
            ),
        );
}

pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::from_config(&config));
    if let Err(e) = &state.sync {
        log::warn!("{} is disabled: {}", GENERATE_3D_PATH, e);
    }
    if let Err(e) = &state.polled {
        log::warn!("{}{} is disabled: {}", FUNCTIONS_SCOPE, GENERATE_MODEL_PATH, e);
    }

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
