use anyhow::{Context, Result};
use bytes::Bytes;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Service for keeping uploaded videos on the local filesystem
#[derive(Debug, Clone)]
pub struct VideoStorageService {
    upload_dir: PathBuf,
}

/// A video written to the upload directory
#[derive(Debug, Clone)]
pub struct StoredVideo {
    /// Unique file name, `<uuid>_<original name>`
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: usize,
}

impl VideoStorageService {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_upload_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| format!("Failed to create upload dir {:?}", self.upload_dir))
    }

    /// Save an uploaded video under a unique name.
    ///
    /// The bytes go to a temporary file in the upload directory first and are
    /// renamed into place, so a crashed upload never leaves a partial video
    /// under its final name.
    pub async fn save_video(
        &self,
        original_name: Option<&str>,
        content_type: &str,
        data: Bytes,
    ) -> Result<StoredVideo> {
        let file_name = self.generate_file_name(original_name, content_type);
        let path = self.upload_dir.join(&file_name);
        let size_bytes = data.len();

        info!(
            "Saving video to storage: dir={:?}, name={}, size={}",
            self.upload_dir, file_name, size_bytes
        );

        let dir = self.upload_dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)
                .context("Failed to create temporary upload file")?;
            tmp.write_all(&data).context("Failed to write video data")?;
            tmp.persist(&target)
                .map_err(|e| e.error)
                .context("Failed to move video into place")?;
            Ok(())
        })
        .await
        .context("Upload writer task panicked")??;

        Ok(StoredVideo {
            file_name,
            path,
            size_bytes,
        })
    }

    /// Delete a stored video; a file that is already gone is not an error
    pub async fn delete_video(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!("Deleted video from storage: {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Video already removed from storage: {:?}", path);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete video {:?}", path)),
        }
    }

    /// Build `<uuid>_<name>` from the client's file name, or from the content type
    fn generate_file_name(&self, original_name: Option<&str>, content_type: &str) -> String {
        let name = original_name
            .map(sanitize_file_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("video.{}", extract_file_extension(content_type)));

        format!("{}_{}", Uuid::new_v4(), name)
    }
}

/// Whether a multipart content type is a video (`video/*`)
pub fn is_video_content_type(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|mime| mime.type_() == mime::VIDEO)
        .unwrap_or(false)
}

/// Keep only the final path component and replace unsafe characters
fn sanitize_file_name(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));

    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = unsafe_chars.replace_all(base, "_");
    cleaned.trim_start_matches('.').to_string()
}

/// Extract file extension from content type
fn extract_file_extension(content_type: &str) -> &'static str {
    match content_type {
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/x-msvideo" => "avi",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        _ => "mp4", // Default to mp4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_file_name() {
        let service = VideoStorageService::new("uploads");

        let name = service.generate_file_name(Some("my squat.mp4"), "video/mp4");
        let (id, rest) = name.split_once('_').unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(rest, "my_squat.mp4");

        let name = service.generate_file_name(None, "video/quicktime");
        assert!(name.ends_with("_video.mov"));
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\clips\\arm raise.webm"), "arm_raise.webm");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("../"), "");
    }

    #[test]
    fn test_extract_file_extension() {
        assert_eq!(extract_file_extension("video/mp4"), "mp4");
        assert_eq!(extract_file_extension("video/quicktime"), "mov");
        assert_eq!(extract_file_extension("video/webm"), "webm");
        assert_eq!(extract_file_extension("unknown"), "mp4");
    }

    #[test]
    fn test_is_video_content_type() {
        assert!(is_video_content_type("video/mp4"));
        assert!(is_video_content_type("video/x-matroska"));
        assert!(!is_video_content_type("image/png"));
        assert!(!is_video_content_type("application/octet-stream"));
        assert!(!is_video_content_type("garbage"));
    }

    #[tokio::test]
    async fn test_save_and_delete_video() {
        let dir = tempfile::tempdir().unwrap();
        let service = VideoStorageService::new(dir.path().join("uploads"));
        service.ensure_upload_dir().await.unwrap();

        let stored = service
            .save_video(Some("clip.mp4"), "video/mp4", Bytes::from_static(b"frames"))
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, 6);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"frames");
        assert!(stored.path.starts_with(service.upload_dir()));

        service.delete_video(&stored.path).await.unwrap();
        assert!(!stored.path.exists());

        // Second delete is a no-op
        service.delete_video(&stored.path).await.unwrap();
    }
}
