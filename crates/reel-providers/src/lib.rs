//! Generation provider adapters for the Reel render pipeline.
//!
//! Each modality has a capability trait with a uniform contract: the
//! adapter writes its asset to a caller-chosen path or returns a
//! [`ProviderError`]. Async-job providers submit, poll with a bounded
//! budget, then download.
//!
//! [`FallbackChain`] orders interchangeable providers (credentialed
//! first) and tries them in turn under a [`FallbackPolicy`].

pub mod chain;
pub mod config;
pub mod elevenlabs;
pub mod error;
pub mod http;
pub mod ken_burns;
pub mod krea;
pub mod nanobanana;
pub mod placeholder;
pub mod pollinations;
pub mod provider;
pub mod registry;
pub mod runway;

pub use chain::{ChainSuccess, FallbackChain, FallbackPolicy, Modality};
pub use config::{ImageSelection, ProviderConfig, VideoSelection};
pub use error::{ProviderError, ProviderResult};
pub use provider::{
    ImageProvider, ImageRequest, Provider, SpeechOutput, SpeechProvider, VideoProvider,
    VideoRequest,
};
pub use registry::ProviderRegistry;
