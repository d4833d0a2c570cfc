//! Prompt-to-building pipeline: generates a consistent set of elevation
//! renders with an image model, then reconstructs a 3D mesh from them.

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod server;

pub use config::AppConfig;
pub use error::{PipelineError, Result};
pub use models::*;
pub use pipeline::{
    ConsistentMultiViewPipeline, ImageEncoder, PolledGeneration, PollingReconstruction,
    SubscribeReconstruction, SyncGeneration, ViewGenerator,
};
pub use server::AppState;
