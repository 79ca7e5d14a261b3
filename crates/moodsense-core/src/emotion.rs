//! Emotion label set and per-label score distribution.
//!
//! The seven labels match the emotion head's output classes. Scores are
//! nominally 0–100 per label but are NOT guaranteed to sum to 100 — the
//! backend's softmax covers only the face crop it was given, and this layer
//! never normalizes.

use serde::{Deserialize, Serialize};

/// The closed set of emotion labels, in the emotion head's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// All labels in declaration (= model output) order.
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    /// Lowercase label string, as rendered and serialized.
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-label emotion scores, each nominally in [0, 100].
///
/// A label that was never written reads as 0. Serializes as a label→score
/// map; labels absent from the input default to 0 on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionScores {
    pub angry: f32,
    pub disgust: f32,
    pub fear: f32,
    pub happy: f32,
    pub sad: f32,
    pub surprise: f32,
    pub neutral: f32,
}

impl EmotionScores {
    /// Score for a single label.
    pub fn get(&self, emotion: Emotion) -> f32 {
        match emotion {
            Emotion::Angry => self.angry,
            Emotion::Disgust => self.disgust,
            Emotion::Fear => self.fear,
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Surprise => self.surprise,
            Emotion::Neutral => self.neutral,
        }
    }

    /// Set the score for a single label.
    pub fn set(&mut self, emotion: Emotion, score: f32) {
        match emotion {
            Emotion::Angry => self.angry = score,
            Emotion::Disgust => self.disgust = score,
            Emotion::Fear => self.fear = score,
            Emotion::Happy => self.happy = score,
            Emotion::Sad => self.sad = score,
            Emotion::Surprise => self.surprise = score,
            Emotion::Neutral => self.neutral = score,
        }
    }

    /// Build from per-label values in [`Emotion::ALL`] order.
    pub fn from_values(values: [f32; 7]) -> Self {
        let mut scores = Self::default();
        for (emotion, value) in Emotion::ALL.iter().zip(values) {
            scores.set(*emotion, value);
        }
        scores
    }

    /// The highest-scoring label; first in declaration order wins on ties.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::ALL[0];
        let mut best_score = self.get(best);
        for &emotion in &Emotion::ALL[1..] {
            let score = self.get(emotion);
            if score > best_score {
                best = emotion;
                best_score = score;
            }
        }
        best
    }

    /// Iterate (label, score) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().map(|&e| (e, self.get(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_label_reads_zero() {
        let mut scores = EmotionScores::default();
        scores.happy = 90.0;
        assert_eq!(scores.get(Emotion::Fear), 0.0);
        assert_eq!(scores.get(Emotion::Happy), 90.0);
    }

    #[test]
    fn test_dominant_picks_max() {
        let mut scores = EmotionScores::default();
        scores.sad = 60.0;
        scores.fear = 20.0;
        scores.neutral = 10.0;
        assert_eq!(scores.dominant(), Emotion::Sad);
    }

    #[test]
    fn test_dominant_tie_first_declared_wins() {
        // All zero — first label in declaration order wins
        let scores = EmotionScores::default();
        assert_eq!(scores.dominant(), Emotion::Angry);

        let mut scores = EmotionScores::default();
        scores.fear = 50.0;
        scores.happy = 50.0;
        assert_eq!(scores.dominant(), Emotion::Fear);
    }

    #[test]
    fn test_from_values_order() {
        let scores = EmotionScores::from_values([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(scores.angry, 1.0);
        assert_eq!(scores.disgust, 2.0);
        assert_eq!(scores.fear, 3.0);
        assert_eq!(scores.happy, 4.0);
        assert_eq!(scores.sad, 5.0);
        assert_eq!(scores.surprise, 6.0);
        assert_eq!(scores.neutral, 7.0);
    }

    #[test]
    fn test_deserialize_missing_labels_default_to_zero() {
        let scores: EmotionScores = serde_json::from_str(r#"{"happy": 80.5}"#).unwrap();
        assert_eq!(scores.happy, 80.5);
        assert_eq!(scores.sad, 0.0);
        assert_eq!(scores.neutral, 0.0);
    }

    #[test]
    fn test_label_roundtrip() {
        for emotion in Emotion::ALL {
            let json = serde_json::to_string(&emotion).unwrap();
            assert_eq!(json, format!("\"{}\"", emotion.label()));
            let back: Emotion = serde_json::from_str(&json).unwrap();
            assert_eq!(back, emotion);
        }
    }
}
