//! Script to scene decomposition.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::sync::{LazyLock, Mutex};

use reel_models::{Mood, Scene};

/// Words per scene, roughly 25 seconds of narration.
pub const WORDS_PER_SCENE: usize = 70;
/// Scene duration estimate range in seconds (`MAX` exclusive).
pub const MIN_SCENE_SECS: u32 = 15;
pub const MAX_SCENE_SECS: u32 = 30;
pub const DEFAULT_CAMERA: &str = "slow cinematic wide";
pub const DEFAULT_ACTION: &str = "abstract cinematic environment";

static INTENSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)destroy|explode|chaos").expect("valid regex"));
static OMINOUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)dark|mystery|unknown").expect("valid regex"));

/// Known entities and the environment they imply, checked in order.
static ACTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)kong", "Kong in jungle environment"),
        (r"(?i)godzilla", "Godzilla emerging from ocean"),
    ]
    .into_iter()
    .map(|(pattern, action)| (Regex::new(pattern).expect("valid regex"), action))
    .collect()
});

/// First matching keyword category, else cinematic.
pub fn detect_mood(text: &str) -> Mood {
    if INTENSE.is_match(text) {
        Mood::Intense
    } else if OMINOUS.is_match(text) {
        Mood::Ominous
    } else {
        Mood::Cinematic
    }
}

/// First matching known entity, else a generic environment.
pub fn extract_action(text: &str) -> &'static str {
    ACTIONS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, action)| *action)
        .unwrap_or(DEFAULT_ACTION)
}

/// Splits scripts into fixed-size scenes.
///
/// Chunking is deterministic. Durations come from the planner's random
/// source, which can be seeded to pin them.
pub struct ScenePlanner {
    rng: Mutex<StdRng>,
}

impl ScenePlanner {
    /// Planner seeded from the OS.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Planner with reproducible durations.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded when `seed` is set, OS-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_default()
    }

    /// Plan scenes for `script`. Yields `ceil(words / 70)` scenes.
    pub fn plan(&self, script: &str) -> Vec<Scene> {
        let words: Vec<&str> = script.split_whitespace().collect();
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        words
            .chunks(WORDS_PER_SCENE)
            .enumerate()
            .map(|(id, chunk)| {
                let narration = chunk.join(" ");
                Scene {
                    id: id as u32,
                    duration: rng.random_range(MIN_SCENE_SECS..MAX_SCENE_SECS),
                    mood: detect_mood(&narration),
                    camera: DEFAULT_CAMERA.to_string(),
                    action: extract_action(&narration).to_string(),
                    narration,
                }
            })
            .collect()
    }
}

impl Default for ScenePlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_scene_count_is_ceil_of_words() {
        let planner = ScenePlanner::seeded(1);
        for (n, expected) in [(1, 1), (70, 1), (71, 2), (140, 2), (141, 3)] {
            assert_eq!(planner.plan(&words(n)).len(), expected, "{} words", n);
        }
        assert!(planner.plan("  \n ").is_empty());
    }

    #[test]
    fn test_narration_is_contiguous_slices() {
        let script = words(150);
        let scenes = ScenePlanner::seeded(1).plan(&script);

        let rejoined = scenes
            .iter()
            .map(|s| s.narration.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, script);
        assert!(scenes[1].narration.starts_with("w70 "));
        assert_eq!(scenes[2].narration, "w140 w141 w142 w143 w144 w145 w146 w147 w148 w149");
        assert_eq!(scenes.iter().map(|s| s.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_durations_in_range_and_reproducible() {
        let script = words(700);
        let a = ScenePlanner::seeded(42).plan(&script);
        let b = ScenePlanner::seeded(42).plan(&script);

        assert_eq!(a, b);
        assert!(a
            .iter()
            .all(|s| (MIN_SCENE_SECS..MAX_SCENE_SECS).contains(&s.duration)));
    }

    #[test]
    fn test_mood_keywords_in_priority_order() {
        assert_eq!(detect_mood("The city will EXPLODE"), Mood::Intense);
        assert_eq!(detect_mood("a dark mystery, then chaos"), Mood::Intense);
        assert_eq!(detect_mood("into the Unknown"), Mood::Ominous);
        assert_eq!(detect_mood("a quiet morning"), Mood::Cinematic);
    }

    #[test]
    fn test_action_keywords() {
        assert_eq!(extract_action("kong roars"), "Kong in jungle environment");
        assert_eq!(extract_action("Godzilla and Kong"), "Kong in jungle environment");
        assert_eq!(extract_action("GODZILLA rises"), "Godzilla emerging from ocean");
        assert_eq!(extract_action("a lighthouse"), DEFAULT_ACTION);

        let scene = &ScenePlanner::seeded(0).plan("Kong climbs into the dark")[0];
        assert_eq!(scene.mood, Mood::Ominous);
        assert_eq!(scene.camera, DEFAULT_CAMERA);
        assert_eq!(scene.action, "Kong in jungle environment");
    }
}
