//! Task recommendation — maps a mood category and stress score to an energy
//! level and a fixed, ordered list of suggested work tasks.

use crate::scoring::MoodCategory;
use serde::Serialize;

/// Stress below this qualifies a Positive mood for high-energy tasks.
const HIGH_ENERGY_STRESS_CEILING: f32 = 0.2;
/// Stress above this forces low-energy tasks regardless of category.
const LOW_ENERGY_STRESS_FLOOR: f32 = 0.3;

/// Energy level the recommended tasks are sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyLevel::Low => f.write_str("Low"),
            EnergyLevel::Medium => f.write_str("Medium"),
            EnergyLevel::High => f.write_str("High"),
        }
    }
}

/// Recommended energy level and tasks for one report. Built once, rendered,
/// discarded.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub energy: EnergyLevel,
    /// Exactly three task descriptions, in presentation order.
    pub tasks: [&'static str; 3],
}

/// Pick an energy level and task list for a mood.
///
/// A three-row decision table evaluated top-to-bottom, first match wins:
/// Positive with low stress gets high-energy tasks, Negative or high stress
/// gets low-energy tasks, everything else gets medium. Total over all inputs;
/// stress exactly 0.2 or 0.3 falls through to the medium row for a Positive
/// or Neutral category.
///
/// `positive_score` is accepted but not read by the table. It is part of the
/// published signature and callers pass it; kept rather than silently
/// dropped. Candidate for removal in a signature-breaking release.
pub fn recommend(
    category: MoodCategory,
    stress_score: f32,
    positive_score: f32,
) -> Recommendation {
    let _ = positive_score;

    if category == MoodCategory::Positive && stress_score < HIGH_ENERGY_STRESS_CEILING {
        Recommendation {
            energy: EnergyLevel::High,
            tasks: ["Work on challenging project", "Lead a meeting", "Deep work session"],
        }
    } else if category == MoodCategory::Negative || stress_score > LOW_ENERGY_STRESS_FLOOR {
        Recommendation {
            energy: EnergyLevel::Low,
            tasks: ["Take a short break", "Mindfulness activity", "Review light tasks"],
        }
    } else {
        Recommendation {
            energy: EnergyLevel::Medium,
            tasks: ["Reply to emails", "Attend a routine meeting", "Organize workspace"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_low_stress_is_high() {
        let rec = recommend(MoodCategory::Positive, 0.0, 0.95);
        assert_eq!(rec.energy, EnergyLevel::High);
        assert_eq!(rec.tasks[0], "Work on challenging project");
    }

    #[test]
    fn test_negative_is_low() {
        let rec = recommend(MoodCategory::Negative, 0.0, 0.0);
        assert_eq!(rec.energy, EnergyLevel::Low);
        assert_eq!(rec.tasks, ["Take a short break", "Mindfulness activity", "Review light tasks"]);
    }

    #[test]
    fn test_high_stress_is_low_regardless_of_category() {
        let rec = recommend(MoodCategory::Neutral, 0.31, 0.0);
        assert_eq!(rec.energy, EnergyLevel::Low);
        let rec = recommend(MoodCategory::Positive, 0.31, 0.9);
        assert_eq!(rec.energy, EnergyLevel::Low);
    }

    #[test]
    fn test_neutral_is_medium() {
        let rec = recommend(MoodCategory::Neutral, 0.05, 0.1);
        assert_eq!(rec.energy, EnergyLevel::Medium);
        assert_eq!(rec.tasks, ["Reply to emails", "Attend a routine meeting", "Organize workspace"]);
    }

    #[test]
    fn test_boundary_stress_exactly_point_two() {
        // 0.2 fails the strict `< 0.2` check — Positive falls to Medium
        let rec = recommend(MoodCategory::Positive, 0.2, 0.9);
        assert_eq!(rec.energy, EnergyLevel::Medium);
        // just below, High
        let rec = recommend(MoodCategory::Positive, 0.199, 0.9);
        assert_eq!(rec.energy, EnergyLevel::High);
    }

    #[test]
    fn test_boundary_stress_exactly_point_three() {
        // 0.3 fails the strict `> 0.3` check — non-Negative stays Medium
        let rec = recommend(MoodCategory::Neutral, 0.3, 0.0);
        assert_eq!(rec.energy, EnergyLevel::Medium);
        let rec = recommend(MoodCategory::Positive, 0.3, 0.0);
        assert_eq!(rec.energy, EnergyLevel::Medium);
        // just above, Low
        let rec = recommend(MoodCategory::Neutral, 0.301, 0.0);
        assert_eq!(rec.energy, EnergyLevel::Low);
    }

    #[test]
    fn test_table_is_total() {
        // Exactly one row applies for every (category, stress) combination
        for category in [MoodCategory::Positive, MoodCategory::Negative, MoodCategory::Neutral] {
            for stress in [0.0, 0.1, 0.2, 0.25, 0.3, 0.5, 1.0] {
                let rec = recommend(category, stress, 0.0);
                assert_eq!(rec.tasks.len(), 3);
            }
        }
    }

    #[test]
    fn test_positive_score_does_not_influence_result() {
        // The dead parameter must be inert: identical output across its range
        let a = recommend(MoodCategory::Positive, 0.1, 0.0);
        let b = recommend(MoodCategory::Positive, 0.1, 1.0);
        assert_eq!(a.energy, b.energy);
        assert_eq!(a.tasks, b.tasks);
    }
}
