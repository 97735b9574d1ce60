use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{NewVideo, VideoAnalysis, VideoDetails, VideoList};

/// Database operations for uploaded videos and their feedback reports
#[derive(Debug, Clone)]
pub struct VideoService {
    db: PgPool,
}

impl VideoService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Insert a video and its feedback report in one transaction.
    ///
    /// Returns the new video id. Nothing is written if either insert fails.
    pub async fn record_video(&self, video: &NewVideo) -> Result<i64> {
        let mut tx = self.db.begin().await.context("Failed to start transaction")?;

        let video_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO videos
                (user_id, video_name, file_path, class_label, confidence,
                 is_simulated, exercise_type, processing_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING video_id
            "#,
        )
        .bind(video.user_id)
        .bind(&video.video_name)
        .bind(&video.file_path)
        .bind(&video.class_label)
        .bind(video.confidence)
        .bind(video.is_simulated)
        .bind(&video.exercise_type)
        .bind(video.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert video record")?;

        sqlx::query(
            r#"
            INSERT INTO feedback_reports (video_id, user_id, feedback_text)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(video_id)
        .bind(video.user_id)
        .bind(&video.feedback_text)
        .execute(&mut *tx)
        .await
        .context("Failed to insert feedback report")?;

        tx.commit().await.context("Failed to commit video record")?;

        Ok(video_id)
    }

    /// Videos of one user, newest first, with the total count for pagination
    pub async fn list_user_videos(&self, user_id: i64, limit: i64, offset: i64) -> Result<VideoList> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .context("Failed to count user videos")?;

        let videos = sqlx::query_as::<_, VideoAnalysis>(
            r#"
            SELECT v.video_id, v.user_id, v.class_label, v.processing_status,
                   v.upload_time, COALESCE(fr.feedback_text, '') AS feedback_text
            FROM videos v
            LEFT JOIN feedback_reports fr ON v.video_id = fr.video_id
            WHERE v.user_id = $1
            ORDER BY v.upload_time DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("Failed to fetch user videos")?;

        Ok(VideoList {
            videos,
            total_count,
        })
    }

    pub async fn get_video_details(&self, video_id: i64) -> Result<Option<VideoDetails>> {
        let video = sqlx::query_as::<_, VideoDetails>(
            r#"
            SELECT v.video_id, v.user_id, v.video_name, v.file_path, v.class_label,
                   v.confidence, v.is_simulated, v.exercise_type, v.processing_status,
                   v.upload_time, fr.feedback_text, u.name AS user_name
            FROM videos v
            LEFT JOIN feedback_reports fr ON v.video_id = fr.video_id
            LEFT JOIN users u ON v.user_id = u.user_id
            WHERE v.video_id = $1
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.db)
        .await
        .context("Failed to fetch video details")?;

        Ok(video)
    }
}
