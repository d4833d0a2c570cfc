use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::{
    error::{PipelineError, Result},
    logger,
    models::{ImagePayload, ViewName, ViewSet},
    pipeline::generator::ViewGenerator,
};

/// Prepended to every per-view prompt.
pub const IDENTITY_INSTRUCTION: &str = "You are rendering architectural elevations of one \
single building for 3D reconstruction. Across every view the building must stay identical: \
same materials and textures, same colors, same number and placement of windows and doors, \
same roofline and roof pitch, same floor count and the same proportions. Show the whole \
building centered on a plain neutral light-gray background with soft even lighting, no \
people, no vehicles, no vegetation in front of the facade and no text.";

#[derive(Debug, Clone, Copy, Default)]
pub struct MultiViewOptions {
    pub include_top: bool,
}

/// Generates the front view first and uses it to anchor every other view.
#[derive(Clone)]
pub struct ConsistentMultiViewPipeline {
    generator: ViewGenerator,
    options: MultiViewOptions,
}

type SideViewTask = (ViewName, JoinHandle<Result<ImagePayload>>);

impl ConsistentMultiViewPipeline {
    pub fn new(generator: ViewGenerator) -> Self {
        Self {
            generator,
            options: MultiViewOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MultiViewOptions) -> Self {
        self.options = options;
        self
    }

    pub fn side_views(&self) -> Vec<ViewName> {
        let mut views = vec![ViewName::Back, ViewName::Left, ViewName::Right];
        if self.options.include_top {
            views.push(ViewName::Top);
        }
        views
    }

    pub fn front_prompt(prompt: &str) -> String {
        format!(
            "{}\n\nBuilding description: {}\n\n{}",
            IDENTITY_INSTRUCTION,
            prompt,
            ViewName::Front.camera_hint()
        )
    }

    pub fn anchored_prompt(prompt: &str, view: ViewName) -> String {
        format!(
            "{}\n\nBuilding description: {}\n\nThe last attached image is the front view of \
             this exact building. Preserve the exact building identity shown in it and only \
             move the camera.\n\n{}",
            IDENTITY_INSTRUCTION,
            prompt,
            view.camera_hint()
        )
    }

    fn unanchored_prompt(prompt: &str, view: ViewName) -> String {
        format!(
            "{}\n\nBuilding description: {}\n\n{}",
            IDENTITY_INSTRUCTION,
            prompt,
            view.camera_hint()
        )
    }

    /// Every view must succeed; the first failure in canonical order is returned.
    pub async fn generate_all(&self, prompt: &str, references: &[ImagePayload]) -> Result<ViewSet> {
        let _timer = logger::timer("multi-view generation");

        let front = self
            .generator
            .generate_view(&Self::front_prompt(prompt), references)
            .await
            .map_err(|e| {
                log::error!("Front view failed: {}", e);
                e
            })?;
        log::info!("Front view generated ({} bytes)", front.len());

        let tasks = self.spawn_side_views(prompt, references, Some(&front));
        let mut views = ViewSet::new();
        views.insert(ViewName::Front, front);

        let mut first_error = None;
        for (view, result) in Self::join_side_views(tasks).await {
            match result {
                Ok(image) => {
                    log::info!("{} view generated ({} bytes)", view, image.len());
                    views.insert(view, image);
                }
                Err(e) => {
                    log::error!("{} view failed: {}", view, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(views),
        }
    }

    /// Best effort: failed views are logged and left out, and the result may be empty.
    /// Without a front view the remaining views are generated unanchored.
    pub async fn generate_available(&self, prompt: &str, references: &[ImagePayload]) -> ViewSet {
        let _timer = logger::timer("multi-view generation (best effort)");
        let mut views = ViewSet::new();

        let front = match self
            .generator
            .generate_view(&Self::front_prompt(prompt), references)
            .await
        {
            Ok(front) => Some(front),
            Err(e) => {
                log::warn!("Skipping front view: {}", e);
                None
            }
        };

        let tasks = self.spawn_side_views(prompt, references, front.as_ref());
        if let Some(front) = front {
            views.insert(ViewName::Front, front);
        }

        for (view, result) in Self::join_side_views(tasks).await {
            match result {
                Ok(image) => views.insert(view, image),
                Err(e) => log::warn!("Skipping {} view: {}", view, e),
            }
        }

        log::info!("Generated {} views: {:?}", views.len(), views.names());
        views
    }

    fn spawn_side_views(
        &self,
        prompt: &str,
        references: &[ImagePayload],
        anchor: Option<&ImagePayload>,
    ) -> Vec<SideViewTask> {
        let mut inputs = references.to_vec();
        if let Some(anchor) = anchor {
            inputs.push(anchor.clone());
        }

        self.side_views()
            .into_iter()
            .map(|view| {
                let generator = self.generator.clone();
                let inputs = inputs.clone();
                let prompt = match anchor {
                    Some(_) => Self::anchored_prompt(prompt, view),
                    None => Self::unanchored_prompt(prompt, view),
                };
                let handle =
                    tokio::spawn(async move { generator.generate_view(&prompt, &inputs).await });
                (view, handle)
            })
            .collect()
    }

    /// Waits for every task; a task that panicked counts as a failed view.
    async fn join_side_views(tasks: Vec<SideViewTask>) -> Vec<(ViewName, Result<ImagePayload>)> {
        join_all(tasks.into_iter().map(|(view, handle)| async move {
            let result = handle.await.unwrap_or_else(|e| {
                Err(PipelineError::Generation(format!(
                    "{} view task aborted: {}",
                    view, e
                )))
            });
            (view, result)
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ImageModel;
    use crate::models::{ContentRequest, ModelPart, ModelResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::sync::{Arc, Mutex};

    /// Returns a distinct one-byte image per call and records every request.
    #[derive(Default)]
    struct CountingModel {
        counter: AtomicU8,
        requests: Mutex<Vec<ContentRequest>>,
        fail_when_prompt_contains: Option<&'static str>,
    }

    #[async_trait]
    impl ImageModel for CountingModel {
        async fn generate_content(&self, request: &ContentRequest) -> Result<ModelResponse> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(marker) = self.fail_when_prompt_contains {
                if request.prompt.contains(marker) {
                    return Ok(ModelResponse::new(vec![ModelPart::Text("no".into())]));
                }
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(ModelResponse::new(vec![ModelPart::Image(ImagePayload::new(
                "image/png",
                vec![n],
            ))]))
        }
    }

    fn pipeline(model: Arc<CountingModel>) -> ConsistentMultiViewPipeline {
        ConsistentMultiViewPipeline::new(ViewGenerator::new(model))
    }

    #[tokio::test]
    async fn test_front_anchors_every_side_view() {
        let model = Arc::new(CountingModel::default());
        let views = pipeline(model.clone())
            .generate_all("a red brick cottage", &[])
            .await
            .unwrap();

        assert_eq!(
            views.names(),
            vec![ViewName::Front, ViewName::Back, ViewName::Left, ViewName::Right]
        );

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].images.is_empty());
        assert!(requests[0].prompt.contains(ViewName::Front.camera_hint()));

        let front = views.get(ViewName::Front).unwrap();
        for side in &requests[1..] {
            assert_eq!(side.images.len(), 1);
            assert_eq!(&side.images[0], front);
            assert!(side.prompt.contains("Preserve the exact building identity"));
        }
    }

    #[tokio::test]
    async fn test_user_references_precede_anchor() {
        let model = Arc::new(CountingModel::default());
        let reference = ImagePayload::new("image/jpeg", vec![200]);
        pipeline(model.clone())
            .generate_all("a barn", &[reference.clone()])
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].images, vec![reference.clone()]);
        for side in &requests[1..] {
            assert_eq!(side.images.len(), 2);
            assert_eq!(side.images[0], reference);
        }
    }

    #[tokio::test]
    async fn test_top_view_is_optional() {
        let model = Arc::new(CountingModel::default());
        let views = pipeline(model.clone())
            .with_options(MultiViewOptions { include_top: true })
            .generate_all("a barn", &[])
            .await
            .unwrap();
        assert!(views.contains(ViewName::Top));
        assert_eq!(model.requests.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_side_view_fails_whole_set_after_all_finish() {
        let model = Arc::new(CountingModel {
            fail_when_prompt_contains: Some(ViewName::Left.camera_hint()),
            ..Default::default()
        });
        let result = pipeline(model.clone()).generate_all("a barn", &[]).await;

        assert!(matches!(result, Err(PipelineError::Generation(_))));
        assert_eq!(model.requests.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_front_stops_before_side_views() {
        let model = Arc::new(CountingModel {
            fail_when_prompt_contains: Some(ViewName::Front.camera_hint()),
            ..Default::default()
        });
        let result = pipeline(model.clone()).generate_all("a barn", &[]).await;

        assert!(result.is_err());
        assert_eq!(model.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_skips_failed_views() {
        let model = Arc::new(CountingModel {
            fail_when_prompt_contains: Some(ViewName::Back.camera_hint()),
            ..Default::default()
        });
        let views = pipeline(model).generate_available("a barn", &[]).await;
        assert_eq!(
            views.names(),
            vec![ViewName::Front, ViewName::Left, ViewName::Right]
        );
    }

    #[tokio::test]
    async fn test_best_effort_without_front_runs_unanchored() {
        let model = Arc::new(CountingModel {
            fail_when_prompt_contains: Some(ViewName::Front.camera_hint()),
            ..Default::default()
        });
        let views = pipeline(model.clone()).generate_available("a barn", &[]).await;

        assert_eq!(views.len(), 3);
        let requests = model.requests.lock().unwrap();
        for side in &requests[1..] {
            assert!(side.images.is_empty());
            assert!(!side.prompt.contains("Preserve the exact building identity"));
        }
    }
}
