// Business logic services

pub mod admin_service;
pub mod feedback_service;
pub mod frame_extraction_service;
pub mod posture_classifier;
pub mod report_service;
pub mod user_service;
pub mod video_analysis_service;
pub mod video_service;
pub mod video_storage_service;

pub use admin_service::AdminService;
pub use frame_extraction_service::FrameExtractionService;
pub use posture_classifier::{load_posture_model, PostureClassifier};
pub use report_service::ReportService;
pub use user_service::UserService;
pub use video_analysis_service::{AnalysisError, VideoAnalysisService};
pub use video_service::VideoService;
pub use video_storage_service::VideoStorageService;
