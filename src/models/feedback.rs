use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeedbackReport {
    pub report_id: i64,
    pub video_id: i64,
    pub user_id: i64,
    pub feedback_text: String,
    pub recommended_music_id: Option<i64>,
    pub generated_at: DateTime<Utc>,
}

/// Feedback report joined with the label of the video it describes
#[derive(Debug, Clone, FromRow)]
pub struct LabeledFeedbackReport {
    #[sqlx(flatten)]
    pub report: FeedbackReport,
    pub class_label: String,
    pub exercise_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MusicRecommendation {
    pub music_id: i64,
    pub dance_style: String,
    pub music_title: String,
    pub tempo_bpm: Option<i32>,
    pub duration_seconds: i32,
    pub mp4_file_path: String,
}

#[derive(Debug, Serialize)]
pub struct PersonalizedFeedback {
    pub feedback: FeedbackReport,
    pub music_recommendations: Vec<MusicRecommendation>,
    pub improvement_suggestions: Vec<String>,
}
