//! Render worker.
//!
//! This crate provides:
//! - Scene planning and the cost gate
//! - Per-scene generation with retries and provider fallback
//! - Final assembly, vertical short and chapter description
//! - Job executor with a watchdog and graceful shutdown
//! - Job state store and progress emission

pub mod config;
pub mod cost;
pub mod description;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod planner;
pub mod prompt;
pub mod retry;
pub mod scene_executor;
pub mod state;

pub use config::WorkerConfig;
pub use cost::CostGuard;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use pipeline::{AssembledArtifacts, RenderOutcome, RenderPipeline};
pub use planner::ScenePlanner;
pub use retry::{retry_async, RetryConfig};
pub use scene_executor::{SceneExecutor, SceneOutput};
pub use state::{InMemoryRenderStore, RenderStore};
