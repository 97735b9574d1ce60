use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::{FeedbackReport, LabeledFeedbackReport, MusicRecommendation, PersonalizedFeedback};
use crate::services::feedback_service::suggestions_for_class_label;

/// Dance style used when a report has no exercise type
pub const GENERAL_DANCE_STYLE: &str = "general";

/// Read side of feedback: stored reports, music and personalised summaries
#[derive(Debug, Clone)]
pub struct ReportService {
    db: PgPool,
}

impl ReportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Feedback reports of one user, newest first
    pub async fn list_user_reports(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedbackReport>> {
        let reports = sqlx::query_as::<_, FeedbackReport>(
            r#"
            SELECT fr.report_id, fr.video_id, fr.user_id, fr.feedback_text,
                   fr.recommended_music_id, fr.generated_at
            FROM feedback_reports fr
            JOIN videos v ON fr.video_id = v.video_id
            WHERE fr.user_id = $1
            ORDER BY fr.generated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("Failed to fetch feedback reports")?;

        Ok(reports)
    }

    /// Active music, optionally restricted to one dance style
    pub async fn music_recommendations(
        &self,
        dance_style: Option<&str>,
        limit: i64,
    ) -> Result<Vec<MusicRecommendation>> {
        let music = sqlx::query_as::<_, MusicRecommendation>(
            r#"
            SELECT music_id, dance_style, music_title, tempo_bpm, duration_seconds, mp4_file_path
            FROM music_recommendations
            WHERE is_active = TRUE AND ($1::TEXT IS NULL OR dance_style = $1)
            ORDER BY upload_time DESC
            LIMIT $2
            "#,
        )
        .bind(dance_style)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("Failed to fetch music recommendations")?;

        Ok(music)
    }

    /// Latest report of a user with matching music and suggestions.
    ///
    /// Returns `None` when the user has no feedback yet.
    pub async fn personalized_feedback(&self, user_id: i64) -> Result<Option<PersonalizedFeedback>> {
        let latest = sqlx::query_as::<_, LabeledFeedbackReport>(
            r#"
            SELECT fr.report_id, fr.video_id, fr.user_id, fr.feedback_text,
                   fr.recommended_music_id, fr.generated_at,
                   v.class_label, v.exercise_type
            FROM feedback_reports fr
            JOIN videos v ON fr.video_id = v.video_id
            WHERE fr.user_id = $1
            ORDER BY fr.generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("Failed to fetch latest feedback report")?;

        let Some(latest) = latest else {
            return Ok(None);
        };

        let style = latest
            .exercise_type
            .as_deref()
            .unwrap_or(GENERAL_DANCE_STYLE);

        let music_recommendations = sqlx::query_as::<_, MusicRecommendation>(
            r#"
            SELECT music_id, dance_style, music_title, tempo_bpm, duration_seconds, mp4_file_path
            FROM music_recommendations
            WHERE (dance_style = $1 OR dance_style = $2) AND is_active = TRUE
            ORDER BY upload_time DESC
            LIMIT 5
            "#,
        )
        .bind(style)
        .bind(GENERAL_DANCE_STYLE)
        .fetch_all(&self.db)
        .await
        .context("Failed to fetch personalised music")?;

        Ok(Some(PersonalizedFeedback {
            improvement_suggestions: suggestions_for_class_label(&latest.class_label),
            feedback: latest.report,
            music_recommendations,
        }))
    }
}
