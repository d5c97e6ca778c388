//! Visual style presets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Available style presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StylePreset {
    #[default]
    Cinematic,
    Documentary,
    Horror,
    Bright,
    Minimal,
    Animation,
    AnimeGhibli,
    Noir,
    Cyberpunk,
    FineArt,
}

/// Prompt fragments contributed by a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetSpec {
    pub description: &'static str,
    pub camera: &'static str,
    pub lighting: &'static str,
    pub mood: &'static str,
}

impl StylePreset {
    pub const ALL: &'static [StylePreset] = &[
        StylePreset::Cinematic,
        StylePreset::Documentary,
        StylePreset::Horror,
        StylePreset::Bright,
        StylePreset::Minimal,
        StylePreset::Animation,
        StylePreset::AnimeGhibli,
        StylePreset::Noir,
        StylePreset::Cyberpunk,
        StylePreset::FineArt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StylePreset::Cinematic => "cinematic",
            StylePreset::Documentary => "documentary",
            StylePreset::Horror => "horror",
            StylePreset::Bright => "bright",
            StylePreset::Minimal => "minimal",
            StylePreset::Animation => "animation",
            StylePreset::AnimeGhibli => "anime_ghibli",
            StylePreset::Noir => "noir",
            StylePreset::Cyberpunk => "cyberpunk",
            StylePreset::FineArt => "fine_art",
        }
    }

    pub fn spec(&self) -> PresetSpec {
        match self {
            StylePreset::Cinematic => PresetSpec {
                description: "Ultra-photorealistic cinematic style",
                camera: "slow cinematic wide shot",
                lighting: "dramatic but balanced lighting, high dynamic range",
                mood: "epic, cinematic",
            },
            StylePreset::Documentary => PresetSpec {
                description: "Natural documentary realism",
                camera: "handheld or steady observational camera",
                lighting: "natural daylight, realistic exposure",
                mood: "grounded, realistic",
            },
            StylePreset::Horror => PresetSpec {
                description: "Dark atmospheric horror style",
                camera: "slow creeping camera movement",
                lighting: "low-key lighting, deep shadows",
                mood: "ominous, tense",
            },
            StylePreset::Bright => PresetSpec {
                description: "Bright, uplifting visual style",
                camera: "smooth wide camera movement",
                lighting: "bright daylight, no crushed blacks",
                mood: "optimistic, vibrant",
            },
            StylePreset::Minimal => PresetSpec {
                description: "Minimalist clean visuals",
                camera: "static or gentle movement",
                lighting: "soft neutral lighting",
                mood: "calm, simple",
            },
            StylePreset::Animation => PresetSpec {
                description: "Stylized 3D with 2D overlays, halftone textures, and comic book ink lines",
                camera: "dynamic low-angle tracking shot with extreme perspective",
                lighting: "vibrant neon rim lighting with colorful chromatic aberration",
                mood: "energetic, kinetic, and expressive",
            },
            StylePreset::AnimeGhibli => PresetSpec {
                description: "Hand-drawn 2D aesthetic with lush watercolor-painted backgrounds",
                camera: "steady medium shot with a soft focus on the environment",
                lighting: "soft natural sunlight, dappled shadows, high-key daytime glow",
                mood: "whimsical, peaceful, and nostalgic",
            },
            StylePreset::Noir => PresetSpec {
                description: "High-contrast monochrome, heavy ink-wash textures, and film grain",
                camera: "static dutch angle, extreme close-up or silhouette framing",
                lighting: "chiaroscuro, harsh single-source light through venetian blinds",
                mood: "mysterious, dark, and suspenseful",
            },
            StylePreset::Cyberpunk => PresetSpec {
                description: "High-tech futuristic armor, rain-slicked surfaces, and holographic UI",
                camera: "wide anamorphic lens shot with heavy lens flares",
                lighting: "dark environment saturated with pink and cyan neon pulses",
                mood: "gritty, advanced, and dystopian",
            },
            StylePreset::FineArt => PresetSpec {
                description: "Classical oil on canvas, visible thick impasto brushstrokes",
                camera: "epic eye-level portrait, centered hero composition",
                lighting: "warm golden-hour glow, Tenebrism (dramatic dark vs light)",
                mood: "majestic, heroic, and timeless",
            },
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StylePreset {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        StylePreset::ALL
            .iter()
            .copied()
            .find(|preset| preset.as_str() == lower)
            .ok_or(ModelError::InvalidStyle(lower))
    }
}
