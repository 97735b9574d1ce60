use serde::Serialize;

use super::label::PredictedLabel;

/// Outcome of analysing one uploaded video.
///
/// Every pipeline path, including failures, produces this same shape.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub label: PredictedLabel,
    /// Mean probability of the predicted label, 0.0 for failed runs
    pub confidence: f32,
    pub feedback: String,
    pub suggestions: Vec<String>,
    /// Set when no model was loaded and the result was generated at random
    pub is_simulated: bool,
}

impl AnalysisResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            label: PredictedLabel::Failed,
            confidence: 0.0,
            feedback: message.into(),
            suggestions: Vec::new(),
            is_simulated: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.label.is_failed()
    }
}
