//! moodsense-core — Mood analysis engine.
//!
//! Detects a face with UltraFace, estimates an emotion distribution (plus
//! age and gender) with ONNX attribute heads, aggregates the distribution
//! into a mood category and stress score, and maps that to work-task
//! recommendations.

pub mod analyzer;
pub mod detector;
pub mod emotion;
pub mod recommend;
pub mod scoring;

pub use analyzer::{AnalyzerError, FaceAnalysis, FaceAnalyzer, OnnxAnalyzer};
pub use emotion::{Emotion, EmotionScores};
pub use recommend::{recommend, EnergyLevel, Recommendation};
pub use scoring::{aggregate, AnalysisReport, MoodCategory};

use std::path::PathBuf;

/// Default directory for ONNX model files:
/// `$XDG_DATA_HOME/moodsense/models` or `~/.local/share/moodsense/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("moodsense/models")
}
