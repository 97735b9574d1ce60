use anyhow::{Context, Result};
use ndarray::Array3;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use crate::services::video_analysis_service::AnalysisError;

/// Side length of the square frames fed to the classifier
pub const FRAME_SIZE: usize = 224;
/// Colour channels per pixel, in BGR order
pub const FRAME_CHANNELS: usize = 3;

const FRAME_BYTES: usize = FRAME_SIZE * FRAME_SIZE * FRAME_CHANNELS;

/// Pixel format requested from FFmpeg. The posture model was trained on
/// OpenCV captures, which are BGR.
const PIXEL_FORMAT: &str = "bgr24";

/// Decoder diagnostics kept for the log; the rest is read and discarded
const STDERR_CAPTURE_BYTES: usize = 8 * 1024;

/// A decoded frame, `[height, width, channel]` with BGR channels in `[0.0, 1.0]`
pub type Frame = Array3<f32>;

/// Decodes videos into classifier-ready frames using FFmpeg
#[derive(Debug, Clone)]
pub struct FrameExtractionService {
    ffmpeg_path: String,
}

impl FrameExtractionService {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }

    /// Create service with a custom FFmpeg binary
    pub fn with_ffmpeg_path(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Start decoding `video_path`.
    ///
    /// FFmpeg scales every frame to 224x224 and writes raw BGR24 to stdout;
    /// the returned stream reads one frame at a time as it is consumed.
    /// Stderr is drained on a helper thread so a chatty decoder cannot
    /// block on a full pipe while we wait for frames.
    pub fn open(&self, video_path: &Path) -> Result<FrameStream, AnalysisError> {
        let metadata = std::fs::metadata(video_path).map_err(|e| {
            warn!("Cannot open video {:?}: {}", video_path, e);
            AnalysisError::EmptyInput
        })?;

        if metadata.len() == 0 {
            return Err(AnalysisError::EmptyInput);
        }

        info!("Extracting frames from video: {:?}", video_path);

        let scale = format!("scale={}:{}", FRAME_SIZE, FRAME_SIZE);
        let mut child = Command::new(&self.ffmpeg_path)
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(video_path)
            .args(["-vf", &scale, "-f", "rawvideo", "-pix_fmt", PIXEL_FORMAT, "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to execute ffmpeg")
            .map_err(|e| AnalysisError::Decode(format!("{:#}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AnalysisError::Decode("ffmpeg stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AnalysisError::Decode("ffmpeg stderr unavailable".to_string()))?;

        Ok(FrameStream {
            path: video_path.to_path_buf(),
            child: Some(child),
            stderr: Some(spawn_stderr_drain(stderr)),
            reader: BufReader::with_capacity(FRAME_BYTES, stdout),
            buffer: vec![0u8; FRAME_BYTES],
            frames_read: 0,
        })
    }
}

impl Default for FrameExtractionService {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the decoder's stderr to EOF, keeping the first few KiB
fn spawn_stderr_drain(mut stderr: ChildStderr) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut captured = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stderr.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    let room = STDERR_CAPTURE_BYTES.saturating_sub(captured.len());
                    captured.extend_from_slice(&chunk[..n.min(room)]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        captured
    })
}

/// Rescale packed BGR24 bytes into a normalized frame
pub fn normalize_frame(bgr: &[u8]) -> Result<Frame, AnalysisError> {
    if bgr.len() != FRAME_BYTES {
        return Err(AnalysisError::Decode(format!(
            "expected {} bytes per frame, got {}",
            FRAME_BYTES,
            bgr.len()
        )));
    }

    let pixels: Vec<f32> = bgr.iter().map(|&v| v as f32 / 255.0).collect();
    Array3::from_shape_vec((FRAME_SIZE, FRAME_SIZE, FRAME_CHANNELS), pixels)
        .map_err(|e| AnalysisError::Decode(e.to_string()))
}

/// Lazy, single-pass sequence of frames from one decoder run.
///
/// Yields frames in file order and ends when the decoder does. A fresh
/// `FrameExtractionService::open` is needed to read the video again.
#[derive(Debug)]
pub struct FrameStream {
    path: PathBuf,
    child: Option<Child>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    reader: BufReader<ChildStdout>,
    buffer: Vec<u8>,
    frames_read: usize,
}

impl FrameStream {
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    // The drain thread is left detached here; it exits once the pipe closes.
    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.stderr.take();
    }

    /// Reap the decoder and turn a failed exit into an error
    fn finish(&mut self) -> Option<Result<Frame, AnalysisError>> {
        let mut child = self.child.take()?;
        let status = child.wait();
        let captured = self
            .stderr
            .take()
            .and_then(|drain| drain.join().ok())
            .unwrap_or_default();

        let status = match status {
            Ok(status) => status,
            Err(e) => return Some(Err(AnalysisError::Decode(e.to_string()))),
        };

        debug!(
            "Decoder finished for {:?} after {} frames",
            self.path, self.frames_read
        );

        if status.success() {
            return None;
        }

        let stderr = String::from_utf8_lossy(&captured);
        warn!("ffmpeg failed on {:?}: {}", self.path, stderr.trim());

        if self.frames_read == 0 {
            Some(Err(AnalysisError::EmptyInput))
        } else {
            Some(Err(AnalysisError::Decode(format!(
                "ffmpeg failed: {}",
                stderr.trim()
            ))))
        }
    }
}

impl Iterator for FrameStream {
    type Item = Result<Frame, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.child.as_ref()?;

        match self.reader.read_exact(&mut self.buffer) {
            Ok(()) => {
                self.frames_read += 1;
                Some(normalize_frame(&self.buffer))
            }
            // A trailing partial frame is dropped, same as an exact end of stream.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => self.finish(),
            Err(e) => {
                self.kill();
                Some(Err(AnalysisError::Decode(e.to_string())))
            }
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.kill();
    }
}
