/// Posture classifier backends
///
/// The analysis pipeline talks to the model only through [`PostureClassifier`].
/// The model is loaded once at start-up by [`load_posture_model`]; when that
/// fails the pipeline runs in simulation mode for the lifetime of the process.
use anyhow::Result;
use ndarray::{Array2, Array4};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::services::video_analysis_service::AnalysisError;

/// A trained model scoring frames against the six posture labels
#[cfg_attr(test, mockall::automock)]
pub trait PostureClassifier: Send + Sync {
    /// Score a batch of frames.
    ///
    /// Input is `[N, 224, 224, 3]` with BGR channels in `[0, 1]`, N at most
    /// `PREDICT_BATCH_FRAMES`; output is `[N, 6]`, one probability row per
    /// frame in `PostureLabel::ALL` order.
    fn predict(&self, frames: &Array4<f32>) -> Result<Array2<f32>>;
}

/// Load the classifier at `model_path`.
///
/// Failure is not fatal for the service: callers keep the error only to
/// report it and fall back to simulation.
pub fn load_posture_model(
    model_path: &Path,
) -> Result<Arc<dyn PostureClassifier>, AnalysisError> {
    if !model_path.exists() {
        warn!(
            "Posture model not found at {}; video analysis will be simulated",
            model_path.display()
        );
        return Err(AnalysisError::ModelUnavailable(format!(
            "no model file at {}",
            model_path.display()
        )));
    }

    match open_model(model_path) {
        Ok(classifier) => {
            info!("Posture model loaded from {}", model_path.display());
            Ok(classifier)
        }
        Err(e) => {
            error!("Error loading posture model: {:#}", e);
            warn!("Video analysis will be simulated");
            Err(AnalysisError::ModelUnavailable(format!("{:#}", e)))
        }
    }
}

#[cfg(feature = "onnx")]
fn open_model(model_path: &Path) -> Result<Arc<dyn PostureClassifier>> {
    Ok(Arc::new(onnx::OnnxPostureClassifier::new(model_path)?))
}

#[cfg(not(feature = "onnx"))]
fn open_model(_model_path: &Path) -> Result<Arc<dyn PostureClassifier>> {
    anyhow::bail!("built without the `onnx` feature, no inference backend available")
}

#[cfg(feature = "onnx")]
pub mod onnx {
    use anyhow::{anyhow, Context, Result};
    use ndarray::{Array2, Array4, Ix2};
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use ort::value::TensorRef;
    use std::path::Path;
    use std::sync::Mutex;

    use super::PostureClassifier;
    use crate::models::PostureLabel;

    fn ort_error(e: impl std::fmt::Display) -> anyhow::Error {
        anyhow!("{}", e)
    }

    /// Classifier backed by an ONNX export of the trained Keras model
    pub struct OnnxPostureClassifier {
        // Session::run needs exclusive access; requests take turns.
        session: Mutex<Session>,
    }

    impl OnnxPostureClassifier {
        pub fn new(model_path: &Path) -> Result<Self> {
            let session = Session::builder()
                .map_err(ort_error)
                .context("Failed to create session builder")?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(ort_error)?
                .with_intra_threads(4)
                .map_err(ort_error)?
                .commit_from_file(model_path)
                .map_err(ort_error)
                .context("Failed to load ONNX model")?;

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl PostureClassifier for OnnxPostureClassifier {
        fn predict(&self, frames: &Array4<f32>) -> Result<Array2<f32>> {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("classifier session poisoned"))?;

            let input = TensorRef::from_array_view(frames.view()).map_err(ort_error)?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(ort_error)
                .context("Failed to run inference")?;

            let probabilities = outputs[0]
                .try_extract_array::<f32>()
                .map_err(ort_error)
                .context("Failed to extract output tensor")?
                .into_dimensionality::<Ix2>()
                .context("Classifier output is not two-dimensional")?
                .to_owned();

            if probabilities.ncols() != PostureLabel::COUNT {
                return Err(anyhow!(
                    "classifier produced {} classes, expected {}",
                    probabilities.ncols(),
                    PostureLabel::COUNT
                ));
            }

            Ok(probabilities)
        }
    }
}
