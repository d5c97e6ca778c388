//! Generation prompt composition.

use reel_models::{Scene, StylePreset};

/// Compose the image/video prompt for a scene under a style preset.
pub fn build_prompt(scene: &Scene, style: StylePreset) -> String {
    let preset = style.spec();
    let environment = if scene.action.trim().is_empty() {
        "derived from narration"
    } else {
        scene.action.as_str()
    };

    format!(
        "{narration}\n\n\
         Visual interpretation of the narration above.\n\n\
         Style: {description}\n\
         Camera: {camera}\n\
         Lighting: {lighting}\n\
         Mood: {mood}\n\n\
         Environment: {environment}\n\
         No text, no logos, no watermarks.\n\
         Photorealistic, sharp focus.\n\
         Duration: {duration} seconds.",
        narration = scene.narration.trim(),
        description = preset.description,
        camera = preset.camera,
        lighting = preset.lighting,
        mood = preset.mood,
        environment = environment,
        duration = scene.duration,
    )
}
