//! Mood scoring — aggregates a per-label emotion distribution into a
//! category, a stress indicator, and an attention flag.
//!
//! Pure and total: given a well-formed distribution this always produces a
//! report. Detection failure is the backend's problem and is short-circuited
//! before this runs.

use crate::emotion::{Emotion, EmotionScores};
use serde::{Deserialize, Serialize};

/// Stress above this marks the report as needing attention.
const STRESS_ATTENTION_THRESHOLD: f32 = 0.3;
/// Negative score above this marks the report as needing attention.
const NEGATIVE_ATTENTION_THRESHOLD: f32 = 0.5;

/// Mood category derived from aggregated emotion scores.
///
/// Distinct from the backend's dominant emotion label: the category collapses
/// the seven labels into three buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoodCategory {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoodCategory::Positive => f.write_str("Positive"),
            MoodCategory::Negative => f.write_str("Negative"),
            MoodCategory::Neutral => f.write_str("Neutral"),
        }
    }
}

/// Derived analysis report for one image. Built once, rendered, discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// The raw per-label scores the backend produced.
    pub emotions: EmotionScores,
    /// The backend's own highest-probability label.
    pub dominant_emotion: Emotion,
    pub category: MoodCategory,
    /// (happy + surprise) / 100, in [0, 1] for nominal inputs.
    pub positive_score: f32,
    /// (angry + disgust + fear + sad) / 100.
    pub negative_score: f32,
    /// neutral / 100.
    pub neutral_score: f32,
    /// (fear + sad) / 200, in [0, 1].
    pub stress_score: f32,
    pub needs_attention: bool,
    /// Passthrough age estimate, when the backend produced one.
    pub age: Option<u32>,
    /// Passthrough dominant gender, when the backend produced one.
    pub gender: Option<String>,
}

/// Aggregate a distribution into an [`AnalysisReport`].
///
/// The category is the argmax over {Positive, Negative, Neutral}; on exact
/// ties the first in that order wins, so an all-zero distribution resolves
/// to Positive. Scores are never normalized — the three aggregates need not
/// sum to 1.
pub fn aggregate(
    emotions: &EmotionScores,
    dominant_emotion: Emotion,
    age: Option<u32>,
    gender: Option<&str>,
) -> AnalysisReport {
    let positive_score = (emotions.get(Emotion::Happy) + emotions.get(Emotion::Surprise)) / 100.0;
    let negative_score = (emotions.get(Emotion::Angry)
        + emotions.get(Emotion::Disgust)
        + emotions.get(Emotion::Fear)
        + emotions.get(Emotion::Sad))
        / 100.0;
    let neutral_score = emotions.get(Emotion::Neutral) / 100.0;
    let stress_score = (emotions.get(Emotion::Fear) + emotions.get(Emotion::Sad)) / 200.0;

    // Argmax with first-wins tie-break: Positive > Negative > Neutral.
    let mut category = MoodCategory::Positive;
    let mut best = positive_score;
    if negative_score > best {
        category = MoodCategory::Negative;
        best = negative_score;
    }
    if neutral_score > best {
        category = MoodCategory::Neutral;
    }

    let needs_attention = stress_score > STRESS_ATTENTION_THRESHOLD
        || negative_score > NEGATIVE_ATTENTION_THRESHOLD;

    AnalysisReport {
        emotions: emotions.clone(),
        dominant_emotion,
        category,
        positive_score,
        negative_score,
        neutral_score,
        stress_score,
        needs_attention,
        age,
        gender: gender.map(str::to_string),
    }
}
