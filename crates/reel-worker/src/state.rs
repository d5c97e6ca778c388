//! Render job registry.
//!
//! Each job entry is written only by the pipeline that owns it; pollers
//! read snapshots concurrently.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use reel_models::{JobId, JobUpdate, RenderJob, SceneUpdate};

/// Storage for job and per-scene status.
#[async_trait]
pub trait RenderStore: Send + Sync {
    /// Create a queued job with `scene_count` pending scenes.
    async fn init(&self, job_id: &JobId, scene_count: usize) -> RenderJob;

    /// Merge a job update. Returns `false` if the job is unknown.
    async fn update(&self, job_id: &JobId, update: JobUpdate) -> bool;

    /// Merge a scene update. Returns `false` if the job or scene is
    /// unknown or the transition was rejected.
    async fn update_scene(&self, job_id: &JobId, scene_id: u32, update: SceneUpdate) -> bool;

    /// Current snapshot, if the job exists.
    async fn get(&self, job_id: &JobId) -> Option<RenderJob>;

    /// Remove terminal jobs last updated at least `older_than` ago.
    /// Returns how many were removed.
    async fn evict_terminal(&self, older_than: Duration) -> usize;
}

/// Process-local store.
///
/// Finished jobs stay until [`RenderStore::evict_terminal`] removes them;
/// the executor calls it on every loop turn.
#[derive(Debug, Default)]
pub struct InMemoryRenderStore {
    jobs: RwLock<HashMap<JobId, RenderJob>>,
}

impl InMemoryRenderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl RenderStore for InMemoryRenderStore {
    async fn init(&self, job_id: &JobId, scene_count: usize) -> RenderJob {
        let job = RenderJob::new(job_id.clone(), scene_count);
        self.jobs.write().await.insert(job_id.clone(), job.clone());
        job
    }

    async fn update(&self, job_id: &JobId, update: JobUpdate) -> bool {
        match self.jobs.write().await.get_mut(job_id) {
            Some(job) => {
                job.apply(update);
                true
            }
            None => false,
        }
    }

    async fn update_scene(&self, job_id: &JobId, scene_id: u32, update: SceneUpdate) -> bool {
        match self.jobs.write().await.get_mut(job_id) {
            Some(job) => job.apply_scene(scene_id, update),
            None => false,
        }
    }

    async fn get(&self, job_id: &JobId) -> Option<RenderJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    async fn evict_terminal(&self, older_than: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };

        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !(job.is_terminal() && job.updated_at <= cutoff));
        before - jobs.len()
    }
}
