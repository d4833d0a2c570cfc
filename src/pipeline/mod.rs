pub mod encoder;
pub mod generator;
pub mod multiview;
pub mod reconstruction;

pub use encoder::ImageEncoder;
pub use generator::ViewGenerator;
pub use multiview::{ConsistentMultiViewPipeline, MultiViewOptions};
pub use reconstruction::{PollingReconstruction, Sleeper, SubscribeReconstruction, TokioSleeper};

use crate::error::Result;

/// Encode references, generate every view, then reconstruct synchronously.
/// Any failure aborts the whole run.
#[derive(Clone)]
pub struct SyncGeneration {
    pub encoder: ImageEncoder,
    pub views: ConsistentMultiViewPipeline,
    pub reconstruction: SubscribeReconstruction,
}

impl SyncGeneration {
    pub async fn run(&self, prompt: &str, references: &[String]) -> Result<String> {
        let payloads = self.encoder.encode_all(references).await;
        let views = self.views.generate_all(prompt, &payloads).await?;
        self.reconstruction.reconstruct(&views).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledOutcome {
    pub model_url: String,
    pub generated_images: Vec<String>,
}

/// Encode references, generate whichever views succeed, then reconstruct
/// through the task API with whatever was produced.
#[derive(Clone)]
pub struct PolledGeneration {
    pub encoder: ImageEncoder,
    pub views: ConsistentMultiViewPipeline,
    pub reconstruction: PollingReconstruction,
}

impl PolledGeneration {
    pub async fn run(&self, prompt: &str, image_urls: &[String]) -> Result<PolledOutcome> {
        let payloads = self.encoder.encode_all(image_urls).await;
        let views = self.views.generate_available(prompt, &payloads).await;
        if views.is_empty() {
            log::warn!("No views were generated; submitting an empty view set");
        }

        let task = self.reconstruction.reconstruct(&views).await?;
        let model_url = task.result_asset_url.unwrap_or_default();

        Ok(PolledOutcome {
            model_url,
            generated_images: views.data_uris(),
        })
    }
}
