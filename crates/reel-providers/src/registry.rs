//! Provider wiring from configuration.

use reqwest::Client;
use std::sync::Arc;
use tracing::info;

use reel_media::MediaToolchain;

use crate::chain::{FallbackChain, FallbackPolicy, Modality};
use crate::config::{ImageSelection, ProviderConfig, VideoSelection};
use crate::elevenlabs::ElevenLabs;
use crate::error::ProviderResult;
use crate::ken_burns::KenBurns;
use crate::krea::Krea;
use crate::nanobanana::NanoBanana;
use crate::placeholder::Placeholder;
use crate::pollinations::Pollinations;
use crate::provider::{ImageProvider, SpeechProvider, VideoProvider};
use crate::runway::Runway;

/// Everything the scene executor needs to generate assets.
#[derive(Clone)]
pub struct ProviderRegistry {
    pub speech: FallbackChain<dyn SpeechProvider>,
    pub images: FallbackChain<dyn ImageProvider>,
    pub videos: FallbackChain<dyn VideoProvider>,
}

impl ProviderRegistry {
    pub fn new(
        speech: FallbackChain<dyn SpeechProvider>,
        images: FallbackChain<dyn ImageProvider>,
        videos: FallbackChain<dyn VideoProvider>,
    ) -> Self {
        Self {
            speech,
            images,
            videos,
        }
    }

    /// Build adapters and chains from configuration.
    pub fn from_config(config: &ProviderConfig, toolchain: Arc<dyn MediaToolchain>) -> ProviderResult<Self> {
        let http = Client::builder().timeout(config.http_timeout).build()?;

        let elevenlabs: Arc<dyn SpeechProvider> = Arc::new(ElevenLabs::new(
            http.clone(),
            config.elevenlabs_api_key.clone(),
            config.elevenlabs_voice_id.clone(),
        ));
        let speech = FallbackChain::<dyn SpeechProvider>::new(Modality::Speech, FallbackPolicy::Exhaustive)
            .with(elevenlabs);
        let images = image_chain(config, &http);
        let videos = video_chain(config, &http, toolchain);

        info!(
            speech = ?speech.attempt_order(),
            images = ?images.attempt_order(),
            videos = ?videos.attempt_order(),
            "Provider chains configured"
        );

        Ok(Self::new(speech, images, videos))
    }
}

fn image_chain(config: &ProviderConfig, http: &Client) -> FallbackChain<dyn ImageProvider> {
    let krea: Arc<dyn ImageProvider> = Arc::new(Krea::new(http.clone(), config.krea_api_key.clone()));
    let nanobanana: Arc<dyn ImageProvider> =
        Arc::new(NanoBanana::new(http.clone(), config.nanobanana_api_key.clone()));
    let pollinations: Arc<dyn ImageProvider> = Arc::new(Pollinations::new(http.clone()));
    let chain = FallbackChain::<dyn ImageProvider>::new(Modality::Image, FallbackPolicy::Exhaustive);

    match config.image {
        ImageSelection::Auto => chain.with(krea).with(nanobanana).with(pollinations),
        ImageSelection::Krea => chain.with(krea),
        ImageSelection::NanoBanana => chain.with(nanobanana),
        ImageSelection::Pollinations => chain.with(pollinations),
        ImageSelection::Mock => chain.with(Arc::new(Placeholder::new(http.clone()))),
    }
}

fn video_chain(
    config: &ProviderConfig,
    http: &Client,
    toolchain: Arc<dyn MediaToolchain>,
) -> FallbackChain<dyn VideoProvider> {
    let krea: Arc<dyn VideoProvider> = Arc::new(Krea::new(http.clone(), config.krea_api_key.clone()));
    let runway: Arc<dyn VideoProvider> = Arc::new(Runway::new(http.clone(), config.runway_api_key.clone()));
    let chain = FallbackChain::<dyn VideoProvider>::new(Modality::Video, FallbackPolicy::SingleHop);

    match config.video {
        VideoSelection::Krea => chain.with(krea).with(runway),
        VideoSelection::Runway => chain.with(runway).with(krea),
        VideoSelection::Mock => chain.with(Arc::new(KenBurns::new(toolchain))),
    }
}
