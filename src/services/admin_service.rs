use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{DashboardStats, RecentVideo, RecentVideoRow, UserActivity, UserActivityRow};

/// Read-only queries backing the admin dashboard
#[derive(Debug, Clone)]
pub struct AdminService {
    db: PgPool,
}

impl AdminService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await
            .context("Failed to count users")?;

        let (total_videos, correct_postures, incorrect_postures, total_sessions, simulated_analyses): (
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE class_label LIKE '%\_Correct'),
                   COUNT(*) FILTER (WHERE class_label LIKE '%\_Incorrect'),
                   COUNT(DISTINCT user_id),
                   COUNT(*) FILTER (WHERE is_simulated)
            FROM videos
            "#,
        )
        .fetch_one(&self.db)
        .await
        .context("Failed to aggregate video stats")?;

        Ok(DashboardStats {
            total_users,
            total_videos,
            correct_postures,
            incorrect_postures,
            total_sessions,
            simulated_analyses,
        })
    }

    /// The ten most recent uploads across all users
    pub async fn recent_videos(&self) -> Result<Vec<RecentVideo>> {
        let rows = sqlx::query_as::<_, RecentVideoRow>(
            r#"
            SELECT v.video_id, v.video_name, v.class_label, v.upload_time,
                   v.processing_status, u.name AS user_name
            FROM videos v
            JOIN users u ON v.user_id = u.user_id
            ORDER BY v.upload_time DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("Failed to fetch recent videos")?;

        Ok(rows.into_iter().map(RecentVideo::from).collect())
    }

    /// The ten users with the most uploads
    pub async fn user_activity(&self) -> Result<Vec<UserActivity>> {
        let rows = sqlx::query_as::<_, UserActivityRow>(
            r#"
            SELECT u.name, u.email, COUNT(v.video_id) AS video_count,
                   MAX(v.upload_time) AS last_upload
            FROM users u
            LEFT JOIN videos v ON u.user_id = v.user_id
            GROUP BY u.user_id, u.name, u.email
            ORDER BY video_count DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("Failed to fetch user stats")?;

        Ok(rows.into_iter().map(UserActivity::from).collect())
    }
}
