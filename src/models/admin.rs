use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Aggregate counters for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_videos: i64,
    pub correct_postures: i64,
    pub incorrect_postures: i64,
    pub total_sessions: i64,
    pub simulated_analyses: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecentVideoRow {
    pub video_id: i64,
    pub video_name: String,
    pub class_label: String,
    pub upload_time: Option<DateTime<Utc>>,
    pub processing_status: String,
    pub user_name: String,
}

/// Recent upload reshaped for display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecentVideo {
    pub video_id: String,
    pub upload_date: String,
    pub analysis_result: String,
    pub status: String,
    pub user_name: String,
}

impl From<RecentVideoRow> for RecentVideo {
    fn from(row: RecentVideoRow) -> Self {
        Self {
            video_id: format!("#VID-{:04}", row.video_id),
            upload_date: row
                .upload_time
                .map(|t| t.format("%d/%m/%Y, %H:%M").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            analysis_result: row.class_label.replace('_', " "),
            status: row.processing_status,
            user_name: row.user_name,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserActivityRow {
    pub name: String,
    pub email: String,
    pub video_count: i64,
    pub last_upload: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserActivity {
    pub name: String,
    pub email: String,
    pub video_count: i64,
    pub last_upload: String,
}

impl From<UserActivityRow> for UserActivity {
    fn from(row: UserActivityRow) -> Self {
        Self {
            name: row.name,
            email: row.email,
            video_count: row.video_count,
            last_upload: row
                .last_upload
                .map(|t| t.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "Never".to_string()),
        }
    }
}

/// `GET /admin/videos` body
#[derive(Debug, Clone, Serialize)]
pub struct RecentVideoList {
    pub videos: Vec<RecentVideo>,
}

/// `GET /admin/users` body
#[derive(Debug, Clone, Serialize)]
pub struct UserActivityList {
    pub users: Vec<UserActivity>,
}
