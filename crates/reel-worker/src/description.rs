//! Chapter-timestamped video description.

use std::path::Path;

use reel_models::Scene;

const TITLE_CHARS: usize = 40;

/// Chapter list with `MM:SS` offsets advancing by each scene's duration.
pub fn chapter_description(scenes: &[Scene]) -> String {
    let mut description = String::from("🎬 AI Generated Story\n\nChapters:\n");
    let mut offset_secs: u64 = 0;

    for scene in scenes {
        let title: String = scene
            .narration
            .chars()
            .take(TITLE_CHARS)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        description.push_str(&format!(
            "{:02}:{:02} - {}...\n",
            offset_secs / 60,
            offset_secs % 60,
            title
        ));
        offset_secs += u64::from(scene.duration);
    }

    description.push_str("\n---\nCreated with Reel\n#AI #Automation #Storytelling");
    description
}

/// Write the description next to the final video.
pub async fn write_description(scenes: &[Scene], path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, chapter_description(scenes)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::Mood;

    fn scene(id: u32, narration: &str, duration: u32) -> Scene {
        Scene {
            id,
            narration: narration.into(),
            duration,
            mood: Mood::Cinematic,
            camera: String::new(),
            action: String::new(),
        }
    }

    #[test]
    fn test_chapters_advance_by_duration() {
        let scenes = vec![
            scene(0, "Short opening", 29),
            scene(1, "A much longer narration that runs well past forty characters", 45),
            scene(2, "Finale", 20),
        ];
        let text = chapter_description(&scenes);

        assert!(text.starts_with("🎬 AI Generated Story\n\nChapters:\n"));
        assert!(text.contains("00:00 - Short opening...\n"));
        assert!(text.contains("00:29 - A much longer narration that runs well p...\n"));
        assert!(text.contains("01:14 - Finale...\n"));
        assert!(text.ends_with("#AI #Automation #Storytelling"));
    }
}
