//! Outcome record and plain-text rendering.
//!
//! Analysis either succeeds with a full report or fails with a single error
//! message; there is no partial-result state. The JSON shape carries an
//! explicit `success` flag either way.

use moodsense_core::{AnalysisReport, Recommendation};
use serde::Serialize;

/// The rendered result of one analysis: a full report or an error message.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(flatten)]
    pub report: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn success(report: AnalysisReport, recommendation: Recommendation) -> Self {
        Self {
            success: true,
            report: Some(report),
            recommendation: Some(recommendation),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            report: None,
            recommendation: None,
            error: Some(message),
        }
    }
}

/// Render a successful analysis as plain key/value text plus tables.
pub fn render_text(report: &AnalysisReport, recommendation: &Recommendation) -> String {
    let mut out = String::new();

    out.push_str(&format!("Dominant Emotion: {}\n", report.dominant_emotion));
    out.push_str(&format!("Category: {}\n", report.category));
    out.push_str(&format!(
        "Age: {} | Gender: {}\n",
        report
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        report.gender.as_deref().unwrap_or("unknown"),
    ));

    out.push_str("\nEmotion Scores\n");
    for (emotion, score) in report.emotions.iter() {
        out.push_str(&format!("  {:<10} {:>6.2}\n", emotion, score));
    }

    out.push_str(&format!("\nPositive Score: {:.2}\n", report.positive_score));
    out.push_str(&format!("Negative Score: {:.2}\n", report.negative_score));
    out.push_str(&format!("Stress Score: {:.2}\n", report.stress_score));

    out.push_str(&format!(
        "\nEnergy Level Recommended: {}\n",
        recommendation.energy
    ));
    out.push_str("Task Recommendations\n");
    for task in recommendation.tasks {
        out.push_str(&format!("  - {task}\n"));
    }

    if report.needs_attention {
        out.push_str("\n⚠ Attention: Consider a break or seek support.\n");
    }

    out
}
