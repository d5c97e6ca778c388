//! Render job payloads and progress delivery.
//!
//! This crate provides:
//! - The render job payload handed to an executor
//! - The `ProgressEmitter` seam used by the pipeline
//! - In-process broadcast and Redis Pub/Sub progress channels

pub mod error;
pub mod job;
pub mod progress;

pub use error::{QueueError, QueueResult};
pub use job::RenderVideoJob;
pub use progress::{
    BroadcastProgress, FanoutProgress, ProgressEmitter, ProgressEvent, ProgressStream,
    RedisProgressChannel, DEFAULT_BROADCAST_CAPACITY,
};
