//! Progress events.
//!
//! Delivery is at-most-once with no backlog: a subscriber only sees
//! events published after it subscribed. Emitting never fails the caller.

use async_trait::async_trait;
use futures_util::Stream;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use reel_models::{JobId, ProgressUpdate};

use crate::error::QueueResult;

/// Buffered events per in-process subscriber before it starts lagging.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Pinned stream of progress events for one job.
pub type ProgressStream = Pin<Box<dyn Stream<Item = ProgressEvent> + Send>>;

/// Progress event keyed by job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Job ID
    pub job_id: JobId,
    /// Status notification
    #[serde(flatten)]
    pub update: ProgressUpdate,
}

impl ProgressEvent {
    pub fn new(job_id: JobId, update: ProgressUpdate) -> Self {
        Self { job_id, update }
    }
}

/// Fire-and-forget sink for state transitions.
#[async_trait]
pub trait ProgressEmitter: Send + Sync {
    /// Publish an update. Failures are logged, never returned.
    async fn emit(&self, job_id: &JobId, update: ProgressUpdate);
}

/// In-process broadcast over a tokio channel.
#[derive(Clone)]
pub struct BroadcastProgress {
    sender: broadcast::Sender<ProgressEvent>,
}

impl BroadcastProgress {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events for every job.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastProgress {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

#[async_trait]
impl ProgressEmitter for BroadcastProgress {
    async fn emit(&self, job_id: &JobId, update: ProgressUpdate) {
        // No subscribers is not an error; the event is simply dropped.
        let _ = self.sender.send(ProgressEvent::new(job_id.clone(), update));
    }
}

/// Channel for publishing/subscribing to progress events via Redis Pub/Sub.
pub struct RedisProgressChannel {
    client: redis::Client,
}

impl RedisProgressChannel {
    /// Create a new progress channel.
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Get the channel name for a job.
    pub fn channel_name(job_id: &JobId) -> String {
        format!("render:{}", job_id)
    }

    /// Publish a progress event.
    pub async fn publish(&self, event: &ProgressEvent) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.job_id);
        let payload = serde_json::to_string(event)?;

        debug!("Publishing progress event to {}", channel);
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Subscribe to progress events for a job.
    /// Returns a pinned stream that can be polled with `.next()`.
    pub async fn subscribe(&self, job_id: &JobId) -> QueueResult<ProgressStream> {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        let channel = Self::channel_name(job_id);

        pubsub.subscribe(&channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl ProgressEmitter for RedisProgressChannel {
    async fn emit(&self, job_id: &JobId, update: ProgressUpdate) {
        let event = ProgressEvent::new(job_id.clone(), update);
        if let Err(e) = self.publish(&event).await {
            warn!(job_id = %job_id, error = %e, "Failed to publish progress event");
        }
    }
}

/// Sends every event to each inner emitter in order.
#[derive(Clone, Default)]
pub struct FanoutProgress {
    emitters: Vec<Arc<dyn ProgressEmitter>>,
}

impl FanoutProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, emitter: Arc<dyn ProgressEmitter>) -> Self {
        self.emitters.push(emitter);
        self
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}

#[async_trait]
impl ProgressEmitter for FanoutProgress {
    async fn emit(&self, job_id: &JobId, update: ProgressUpdate) {
        for emitter in &self.emitters {
            emitter.emit(job_id, update.clone()).await;
        }
    }
}
