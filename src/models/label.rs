use serde::{Deserialize, Serialize};
use std::fmt;

/// Exercises the posture classifier was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exercise {
    Squat,
    #[serde(rename = "Arm_Raise")]
    ArmRaise,
    #[serde(rename = "Knee_Extension")]
    KneeExtension,
}

impl Exercise {
    pub const ALL: [Exercise; 3] = [Exercise::Squat, Exercise::ArmRaise, Exercise::KneeExtension];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exercise::Squat => "Squat",
            Exercise::ArmRaise => "Arm_Raise",
            Exercise::KneeExtension => "Knee_Extension",
        }
    }

    /// First exercise whose name occurs in `text`, checked in declaration order
    pub fn detect(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|exercise| text.contains(exercise.as_str()))
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Correctness {
    Correct,
    Incorrect,
}

impl Correctness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Correctness::Correct => "Correct",
            Correctness::Incorrect => "Incorrect",
        }
    }
}

/// One of the six classifier outputs: an exercise paired with a correctness verdict.
///
/// The index order matches the output layer of the trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostureLabel {
    pub exercise: Exercise,
    pub correctness: Correctness,
}

impl PostureLabel {
    pub const COUNT: usize = 6;

    pub const ALL: [PostureLabel; Self::COUNT] = [
        PostureLabel::new(Exercise::Squat, Correctness::Correct),
        PostureLabel::new(Exercise::Squat, Correctness::Incorrect),
        PostureLabel::new(Exercise::ArmRaise, Correctness::Correct),
        PostureLabel::new(Exercise::ArmRaise, Correctness::Incorrect),
        PostureLabel::new(Exercise::KneeExtension, Correctness::Correct),
        PostureLabel::new(Exercise::KneeExtension, Correctness::Incorrect),
    ];

    /// Labels drawn from when no model is loaded
    pub const SIMULATED: [PostureLabel; 4] = [
        PostureLabel::new(Exercise::Squat, Correctness::Correct),
        PostureLabel::new(Exercise::Squat, Correctness::Incorrect),
        PostureLabel::new(Exercise::ArmRaise, Correctness::Correct),
        PostureLabel::new(Exercise::ArmRaise, Correctness::Incorrect),
    ];

    pub const fn new(exercise: Exercise, correctness: Correctness) -> Self {
        Self {
            exercise,
            correctness,
        }
    }

    /// Map a model output index to its label
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|label| label == self)
            .unwrap_or_default()
    }

    pub fn is_correct(&self) -> bool {
        self.correctness == Correctness::Correct
    }

    /// Decode a stored class label such as `Squat_Incorrect`.
    ///
    /// Matching is by substring: the exercise name must occur somewhere in the
    /// text, and the verdict is `Incorrect` whenever that word occurs,
    /// `Correct` otherwise. Returns `None` when no known exercise is present.
    pub fn decode(text: &str) -> Option<Self> {
        let exercise = Exercise::detect(text)?;
        let correctness = if text.contains("Incorrect") {
            Correctness::Incorrect
        } else {
            Correctness::Correct
        };
        Some(Self::new(exercise, correctness))
    }
}

impl fmt::Display for PostureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.exercise.as_str(), self.correctness.as_str())
    }
}

impl Serialize for PostureLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PostureLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PostureLabel::ALL
            .into_iter()
            .find(|label| label.to_string() == raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown posture label: {}", raw)))
    }
}

/// Label reported by an analysis run: a posture verdict, or `failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictedLabel {
    Posture(PostureLabel),
    Failed,
}

impl PredictedLabel {
    pub const FAILED: &'static str = "failed";

    pub fn posture(&self) -> Option<PostureLabel> {
        match self {
            PredictedLabel::Posture(label) => Some(*label),
            PredictedLabel::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PredictedLabel::Failed)
    }
}

impl fmt::Display for PredictedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictedLabel::Posture(label) => label.fmt(f),
            PredictedLabel::Failed => f.write_str(Self::FAILED),
        }
    }
}

impl Serialize for PredictedLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
