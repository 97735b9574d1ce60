use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Processing status of a stored video
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Processed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Processed => "processed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Video record as stored in the `videos` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoAsset {
    pub video_id: i64,
    pub user_id: i64,
    pub video_name: String,
    pub file_path: String,
    pub class_label: String,
    pub confidence: f32,
    pub is_simulated: bool,
    pub exercise_type: Option<String>,
    pub processing_status: String,
    pub upload_time: DateTime<Utc>,
}

/// Data needed to insert a video and its feedback report
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub user_id: i64,
    pub video_name: String,
    pub file_path: String,
    pub class_label: String,
    pub confidence: f32,
    pub is_simulated: bool,
    pub exercise_type: Option<String>,
    pub status: ProcessingStatus,
    pub feedback_text: String,
}

#[derive(Debug, Serialize)]
pub struct VideoUploadResponse {
    pub message: String,
    pub video_id: i64,
    pub feedback: String,
    pub class_label: String,
    pub confidence: f32,
    pub is_simulated: bool,
    pub improvement_suggestions: Vec<String>,
}

/// Video with its feedback, as listed for a user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VideoAnalysis {
    pub video_id: i64,
    pub user_id: i64,
    pub class_label: String,
    pub feedback_text: String,
    pub processing_status: String,
    pub upload_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VideoList {
    pub videos: Vec<VideoAnalysis>,
    pub total_count: i64,
}

/// Full video record joined with feedback text and owner name
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VideoDetails {
    pub video_id: i64,
    pub user_id: i64,
    pub video_name: String,
    pub file_path: String,
    pub class_label: String,
    pub confidence: f32,
    pub is_simulated: bool,
    pub exercise_type: Option<String>,
    pub processing_status: String,
    pub upload_time: DateTime<Utc>,
    pub feedback_text: Option<String>,
    pub user_name: Option<String>,
}
