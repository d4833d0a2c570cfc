use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    clients::{MeshSubscriber, TaskService},
    error::{PipelineError, Result},
    logger,
    models::{
        MeshOptions, MeshSubscribeInput, ReconstructionTask, TaskStatus, TaskSubmission, ViewName,
        ViewSet,
    },
};

/// Source of the wait between status polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Submits front/back/left/right and blocks until the provider returns a mesh.
#[derive(Clone)]
pub struct SubscribeReconstruction {
    service: Arc<dyn MeshSubscriber>,
    options: MeshOptions,
}

impl SubscribeReconstruction {
    pub fn new(service: Arc<dyn MeshSubscriber>, options: MeshOptions) -> Self {
        Self { service, options }
    }

    pub fn build_input(&self, views: &ViewSet) -> Result<MeshSubscribeInput> {
        views.require(&ViewName::ELEVATIONS)?;
        Ok(MeshSubscribeInput {
            front_image_url: views.data_uri(ViewName::Front),
            back_image_url: views.data_uri(ViewName::Back),
            left_image_url: views.data_uri(ViewName::Left),
            right_image_url: views.data_uri(ViewName::Right),
            textured_mesh: self.options.textured_mesh,
            enable_pbr: self.options.enable_pbr,
        })
    }

    pub async fn reconstruct(&self, views: &ViewSet) -> Result<String> {
        let input = self.build_input(views)?;
        let _timer = logger::timer("3D reconstruction (subscribe)");

        let output = self.service.subscribe(&input).await?;
        match output.mesh_url() {
            Some(url) => {
                log::info!("Mesh ready: {}", url);
                Ok(url.to_string())
            }
            None => {
                log::error!("Protocol mismatch: reconstruction result has no model_mesh.url");
                Err(PipelineError::ReconstructionProtocol(
                    "reconstruction result has no model_mesh.url".into(),
                ))
            }
        }
    }
}

/// Creates a reconstruction task and polls it on a fixed interval until it
/// reaches a terminal status or the attempt budget runs out.
#[derive(Clone)]
pub struct PollingReconstruction {
    service: Arc<dyn TaskService>,
    sleeper: Arc<dyn Sleeper>,
    interval: Duration,
    max_attempts: u32,
}

impl PollingReconstruction {
    pub fn new(service: Arc<dyn TaskService>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            service,
            sleeper: Arc::new(TokioSleeper),
            interval,
            max_attempts,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// One slot per canonical view, empty when that view is missing.
    pub fn build_submission(views: &ViewSet) -> TaskSubmission {
        TaskSubmission {
            views: ViewName::ALL
                .iter()
                .map(|view| (*view, views.data_uri(*view)))
                .collect(),
        }
    }

    pub async fn reconstruct(&self, views: &ViewSet) -> Result<ReconstructionTask> {
        let submission = Self::build_submission(views);
        let task_id = self.service.create_task(&submission).await?;
        log::info!("Reconstruction task created: {}", task_id);

        let mut task = ReconstructionTask::new(task_id);
        self.wait_for(&mut task).await?;
        Ok(task)
    }

    async fn wait_for(&self, task: &mut ReconstructionTask) -> Result<()> {
        let _timer = logger::timer("3D reconstruction (polling)");

        while task.attempts < self.max_attempts {
            self.sleeper.sleep(self.interval).await;
            task.attempts += 1;

            let report = self.service.task_status(&task.task_id).await?;
            task.status = report.status.clone();
            log::debug!(
                "Task {} attempt {}/{}: {:?}",
                task.task_id,
                task.attempts,
                self.max_attempts,
                task.status
            );

            match report.status {
                TaskStatus::Success => {
                    let Some(url) = report.model_url else {
                        log::error!(
                            "Protocol mismatch: task {} succeeded without a model URL",
                            task.task_id
                        );
                        return Err(PipelineError::ReconstructionProtocol(format!(
                            "task {} succeeded without a model URL",
                            task.task_id
                        )));
                    };
                    log::info!("Task {} finished: {}", task.task_id, url);
                    task.result_asset_url = Some(url);
                    return Ok(());
                }
                TaskStatus::Failed => {
                    let reason = report
                        .message
                        .unwrap_or_else(|| "provider reported failure".to_string());
                    log::error!("Task {} failed: {}", task.task_id, reason);
                    return Err(PipelineError::ReconstructionFailed(reason));
                }
                TaskStatus::Pending | TaskStatus::Running | TaskStatus::Unknown => {}
            }
        }

        log::error!(
            "Task {} still {:?} after {} status checks",
            task.task_id,
            task.status,
            task.attempts
        );
        Err(PipelineError::ReconstructionTimeout {
            attempts: task.attempts,
        })
    }
}
