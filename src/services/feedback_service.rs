/// Coaching feedback rules
///
/// Maps classifier verdicts to the human-readable message shown after an
/// upload and to the per-exercise improvement suggestions served by the
/// personalized feedback endpoint. Both tables are static.
use crate::models::{Correctness, Exercise, PostureLabel};

/// Confidence above which a verdict is reported with the strong wording
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Build the coaching message for a verdict.
///
/// The strong wording requires confidence strictly above 0.8.
pub fn generate_feedback(label: PostureLabel, confidence: f32) -> String {
    let exercise = label.exercise.as_str();
    let confident = confidence > HIGH_CONFIDENCE_THRESHOLD;

    match (label.correctness, confident) {
        (Correctness::Correct, true) => {
            format!("Excellent! Your {} form is perfect. Keep it up!", exercise)
        }
        (Correctness::Correct, false) => {
            format!("Good {} form, but there's room for improvement.", exercise)
        }
        (Correctness::Incorrect, true) => {
            format!("Your {} form needs attention. Focus on proper technique.", exercise)
        }
        (Correctness::Incorrect, false) => format!(
            "Your {} form could be improved. Consider reviewing the basics.",
            exercise
        ),
    }
}

/// Ordered improvement suggestions for a verdict
pub fn improvement_suggestions(label: PostureLabel) -> Vec<String> {
    suggestion_table(label.exercise, label.correctness)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Suggestions for a stored class label string.
///
/// Labels without a known exercise name (including `failed`) get no
/// suggestions.
pub fn suggestions_for_class_label(class_label: &str) -> Vec<String> {
    PostureLabel::decode(class_label)
        .map(improvement_suggestions)
        .unwrap_or_default()
}

fn suggestion_table(exercise: Exercise, correctness: Correctness) -> &'static [&'static str] {
    match (exercise, correctness) {
        (Exercise::Squat, Correctness::Incorrect) => &[
            "Keep your knees aligned with your toes",
            "Lower your body as if sitting back into a chair",
            "Keep your chest up and back straight",
            "Make sure your knees don't go past your toes",
        ],
        (Exercise::Squat, Correctness::Correct) => &[
            "Great squat form! Keep practicing to maintain consistency",
            "Try adding some variations like jump squats",
            "Focus on controlled movement both down and up",
        ],
        (Exercise::ArmRaise, Correctness::Incorrect) => &[
            "Keep your arms straight but not locked",
            "Raise arms to shoulder level, not above",
            "Engage your core to maintain balance",
            "Keep your shoulders relaxed, not shrugged",
        ],
        (Exercise::ArmRaise, Correctness::Correct) => &[
            "Excellent arm raise technique!",
            "Try adding some resistance with light weights",
            "Focus on smooth, controlled movements",
        ],
        (Exercise::KneeExtension, Correctness::Incorrect) => &[
            "Keep your supporting leg slightly bent",
            "Extend your leg fully but don't lock the knee",
            "Maintain good posture throughout the movement",
            "Focus on balance and stability",
        ],
        (Exercise::KneeExtension, Correctness::Correct) => &[
            "Perfect knee extension form!",
            "Try adding ankle weights for more challenge",
            "Practice on both legs for balance",
        ],
    }
}
