//! Provider configuration.

use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::elevenlabs::DEFAULT_VOICE_ID;

/// Which image providers are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSelection {
    /// Krea, then NanoBanana, then the keyless public fallback
    #[default]
    Auto,
    Krea,
    NanoBanana,
    Pollinations,
    /// Placeholder images, no generation
    Mock,
}

impl FromStr for ImageSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "krea" => Ok(Self::Krea),
            "nanobanana" => Ok(Self::NanoBanana),
            "pollinations" => Ok(Self::Pollinations),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown image provider '{}'", other)),
        }
    }
}

/// Preferred video provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSelection {
    #[default]
    Krea,
    Runway,
    /// Local Ken Burns animation of the scene still
    Mock,
}

impl FromStr for VideoSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "krea" | "" => Ok(Self::Krea),
            "runway" => Ok(Self::Runway),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown video provider '{}'", other)),
        }
    }
}

/// Credentials and selection for generation providers.
///
/// Missing keys are not an error here; they drive credential-aware
/// ordering and fail the individual call.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    pub krea_api_key: Option<String>,
    pub nanobanana_api_key: Option<String>,
    pub runway_api_key: Option<String>,
    pub image: ImageSelection,
    pub video: VideoSelection,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: None,
            elevenlabs_voice_id: DEFAULT_VOICE_ID.to_string(),
            krea_api_key: None,
            nanobanana_api_key: None,
            runway_api_key: None,
            image: ImageSelection::Auto,
            video: VideoSelection::Krea,
            http_timeout: Duration::from_secs(120),
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn selection<T: FromStr<Err = String> + Default>(name: &str) -> T {
    match std::env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!("{}: {}, using default", name, e);
            T::default()
        }),
        Err(_) => T::default(),
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            elevenlabs_api_key: non_empty("ELEVENLABS_API_KEY"),
            elevenlabs_voice_id: non_empty("ELEVENLABS_VOICE_ID")
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            krea_api_key: non_empty("KREA_API_KEY"),
            nanobanana_api_key: non_empty("NANOBANANA_API_KEY"),
            runway_api_key: non_empty("RUNWAY_API_KEY").or_else(|| non_empty("RUNWAYML_API_SECRET")),
            image: selection("IMAGE_PROVIDER"),
            video: selection("VIDEO_PROVIDER"),
            http_timeout: Duration::from_secs(
                std::env::var("PROVIDER_HTTP_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}
