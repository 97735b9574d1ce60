use sqlx::PgPool;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::services::{
    AdminService, ReportService, VideoAnalysisService, VideoService, VideoStorageService,
};

/// Services shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub video_service: VideoService,
    pub report_service: ReportService,
    pub admin_service: AdminService,
    pub analysis_service: VideoAnalysisService,
    pub storage_service: VideoStorageService,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: PgPool, analysis_service: VideoAnalysisService, config: &AppConfig) -> Self {
        Self {
            auth_service: AuthService::new(db.clone(), &config.jwt_secret),
            video_service: VideoService::new(db.clone()),
            report_service: ReportService::new(db.clone()),
            admin_service: AdminService::new(db),
            analysis_service,
            storage_service: VideoStorageService::new(config.upload_dir.clone()),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}
