//! Efficiency figures for learner-facing messaging.

use serde::{Deserialize, Serialize};

/// How many questions an adaptive session saved against a fixed battery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyMetrics {
    pub questions_asked: u32,
    pub baseline_questions: u32,
    /// `baseline - asked`, floored at zero.
    pub questions_saved: u32,
    /// `saved / baseline * 100`, clamped to `[0, 100]`.
    pub efficiency_score: f64,
}

impl EfficiencyMetrics {
    pub fn compute(questions_asked: u32, baseline_questions: u32) -> Self {
        let questions_saved = baseline_questions.saturating_sub(questions_asked);
        let efficiency_score = if baseline_questions == 0 {
            0.0
        } else {
            (f64::from(questions_saved) / f64::from(baseline_questions) * 100.0).clamp(0.0, 100.0)
        };
        Self {
            questions_asked,
            baseline_questions,
            questions_saved,
            efficiency_score,
        }
    }

    /// Short sentence for the learner.
    pub fn message(&self) -> String {
        if self.questions_saved == 0 {
            format!(
                "Assessment used {} questions, the same as a standard {}-question quiz",
                self.questions_asked, self.baseline_questions
            )
        } else {
            format!(
                "Assessed in {} questions instead of {}, {:.0}% fewer",
                self.questions_asked, self.baseline_questions, self.efficiency_score
            )
        }
    }
}
