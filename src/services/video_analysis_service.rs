/// Video posture analysis pipeline
///
/// Runs one uploaded video end to end:
/// 1. Decode the file into normalized 224x224 frames
/// 2. Score every frame with the loaded posture classifier
/// 3. Average the per-frame probabilities and take the best label
/// 4. Attach coaching feedback and improvement suggestions
///
/// When the process has no classifier, results are simulated instead and
/// flagged with `is_simulated`. Errors never escape [`VideoAnalysisService::analyze`];
/// they come back as a `failed` result carrying the error message.
use ndarray::{Array2, Array4, Axis};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::models::{AnalysisResult, Exercise, PostureLabel, PredictedLabel};
use crate::services::feedback_service::{generate_feedback, improvement_suggestions};
use crate::services::frame_extraction_service::{Frame, FrameExtractionService};
use crate::services::posture_classifier::PostureClassifier;

/// Lower bound of simulated confidence scores (inclusive)
pub const SIMULATED_CONFIDENCE_MIN: f32 = 0.7;
/// Upper bound of simulated confidence scores (exclusive)
pub const SIMULATED_CONFIDENCE_MAX: f32 = 0.95;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no frames extracted")]
    EmptyInput,
    #[error("posture model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("failed to decode video: {0}")]
    Decode(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

impl AnalysisError {
    /// Text stored as feedback when an analysis is rejected
    pub fn feedback_message(&self) -> String {
        match self {
            AnalysisError::EmptyInput => "No frames extracted from video".to_string(),
            other => format!("Error analyzing video: {}", other),
        }
    }
}

/// Analysis pipeline holding the process-wide, read-only classifier
#[derive(Clone)]
pub struct VideoAnalysisService {
    classifier: Option<Arc<dyn PostureClassifier>>,
    frame_extractor: FrameExtractionService,
}

impl VideoAnalysisService {
    pub fn new(
        classifier: Option<Arc<dyn PostureClassifier>>,
        frame_extractor: FrameExtractionService,
    ) -> Self {
        if classifier.is_none() {
            warn!("No posture model loaded, all analyses will be simulated");
        }

        Self {
            classifier,
            frame_extractor,
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Analyse the video at `file_path`.
    ///
    /// `exercise_hint` is the exercise the user said they performed; it is
    /// recorded for tracing only and does not steer the classifier.
    #[instrument(skip(self), fields(simulated = self.classifier.is_none()))]
    pub fn analyze(&self, file_path: &Path, exercise_hint: Option<&str>) -> AnalysisResult {
        let Some(classifier) = self.classifier.as_deref() else {
            let result = simulate_analysis(&mut rand::thread_rng());
            warn!(
                simulated = true,
                label = %result.label,
                confidence = result.confidence,
                "Returning simulated analysis, no posture model loaded"
            );
            return result;
        };

        let outcome = self
            .frame_extractor
            .open(file_path)
            .and_then(|frames| classify_frames(classifier, frames));

        match outcome {
            Ok((label, confidence)) => {
                info!(
                    simulated = false,
                    label = %label,
                    confidence,
                    "Video analysis completed"
                );
                if let Some(hinted) = exercise_hint.and_then(Exercise::detect) {
                    if hinted != label.exercise {
                        debug!(
                            "Predicted exercise {} differs from hint {}",
                            label.exercise, hinted
                        );
                    }
                }
                build_result(label, confidence, false)
            }
            Err(e) => {
                error!("Error analyzing video {:?}: {}", file_path, e);
                AnalysisResult::failed(e.feedback_message())
            }
        }
    }
}

/// Frames scored per classifier call
pub const PREDICT_BATCH_FRAMES: usize = 32;

/// Score a full frame sequence and reduce it to one label and confidence.
///
/// Frames are consumed in order and sent to the classifier in chunks of
/// [`PREDICT_BATCH_FRAMES`]; the first decode error aborts the run.
pub fn classify_frames<I>(
    classifier: &dyn PostureClassifier,
    frames: I,
) -> Result<(PostureLabel, f32), AnalysisError>
where
    I: IntoIterator<Item = Result<Frame, AnalysisError>>,
{
    let mut totals = LabelTotals::default();
    let mut chunk: Vec<Frame> = Vec::with_capacity(PREDICT_BATCH_FRAMES);

    for frame in frames {
        chunk.push(frame?);
        if chunk.len() == PREDICT_BATCH_FRAMES {
            predict_chunk(classifier, &chunk, &mut totals)?;
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        predict_chunk(classifier, &chunk, &mut totals)?;
    }

    totals.best()
}

fn predict_chunk(
    classifier: &dyn PostureClassifier,
    chunk: &[Frame],
    totals: &mut LabelTotals,
) -> Result<(), AnalysisError> {
    let views: Vec<_> = chunk.iter().map(|frame| frame.view()).collect();
    let batch: Array4<f32> =
        ndarray::stack(Axis(0), &views).map_err(|e| AnalysisError::Inference(e.to_string()))?;

    let predictions = classifier
        .predict(&batch)
        .map_err(|e| AnalysisError::Inference(format!("{:#}", e)))?;

    if predictions.nrows() != chunk.len() {
        return Err(AnalysisError::Inference(format!(
            "classifier returned {} rows for {} frames",
            predictions.nrows(),
            chunk.len()
        )));
    }

    totals.add(&predictions)
}

/// Running per-label probability sums over every scored frame
#[derive(Debug, Default)]
struct LabelTotals {
    sums: [f64; PostureLabel::COUNT],
    rows: usize,
}

impl LabelTotals {
    fn add(&mut self, predictions: &Array2<f32>) -> Result<(), AnalysisError> {
        if predictions.ncols() != PostureLabel::COUNT {
            return Err(AnalysisError::Inference(format!(
                "expected {} classes per frame, got {}",
                PostureLabel::COUNT,
                predictions.ncols()
            )));
        }

        for row in predictions.rows() {
            for (sum, &p) in self.sums.iter_mut().zip(row.iter()) {
                *sum += f64::from(p);
            }
        }
        self.rows += predictions.nrows();
        Ok(())
    }

    /// Mean-probability argmax; ties go to the lowest label index
    fn best(&self) -> Result<(PostureLabel, f32), AnalysisError> {
        if self.rows == 0 {
            return Err(AnalysisError::EmptyInput);
        }

        let mean = self.sums.map(|sum| (sum / self.rows as f64) as f32);
        if mean.iter().any(|p| p.is_nan()) {
            return Err(AnalysisError::Inference(
                "classifier produced NaN probabilities".to_string(),
            ));
        }

        let mut best_index = 0;
        let mut best = mean[0];
        for (index, &probability) in mean.iter().enumerate().skip(1) {
            if probability > best {
                best_index = index;
                best = probability;
            }
        }

        let label = PostureLabel::from_index(best_index).ok_or_else(|| {
            AnalysisError::Inference(format!("label index {} out of range", best_index))
        })?;

        Ok((label, best))
    }
}

/// Average per-frame probabilities and pick the most likely label.
///
/// Ties go to the lowest label index.
pub fn aggregate_predictions(
    predictions: &Array2<f32>,
) -> Result<(PostureLabel, f32), AnalysisError> {
    let mut totals = LabelTotals::default();
    totals.add(predictions)?;
    totals.best()
}

/// Random stand-in result used when no model is loaded
pub fn simulate_analysis<R: Rng + ?Sized>(rng: &mut R) -> AnalysisResult {
    let label = PostureLabel::SIMULATED[rng.gen_range(0..PostureLabel::SIMULATED.len())];
    let confidence = rng.gen_range(SIMULATED_CONFIDENCE_MIN..SIMULATED_CONFIDENCE_MAX);
    build_result(label, confidence, true)
}

fn build_result(label: PostureLabel, confidence: f32, is_simulated: bool) -> AnalysisResult {
    AnalysisResult {
        label: PredictedLabel::Posture(label),
        confidence,
        feedback: generate_feedback(label, confidence),
        suggestions: improvement_suggestions(label),
        is_simulated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::frame_extraction_service::{FRAME_CHANNELS, FRAME_SIZE};
    use crate::services::posture_classifier::MockPostureClassifier;
    use assert_matches::assert_matches;
    use ndarray::{array, Array3};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blank_frames(n: usize) -> Vec<Result<Frame, AnalysisError>> {
        (0..n)
            .map(|_| Ok(Array3::<f32>::zeros((FRAME_SIZE, FRAME_SIZE, FRAME_CHANNELS))))
            .collect()
    }

    #[test]
    fn test_aggregate_takes_mean_argmax() {
        let predictions = array![
            [0.1, 0.6, 0.1, 0.1, 0.05, 0.05],
            [0.1, 0.2, 0.5, 0.1, 0.05, 0.05],
            [0.1, 0.7, 0.0, 0.1, 0.05, 0.05],
        ];

        let (label, confidence) = aggregate_predictions(&predictions).unwrap();
        assert_eq!(label.to_string(), "Squat_Incorrect");
        assert!((confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_aggregate_ties_pick_lowest_index() {
        let predictions = array![[0.1, 0.1, 0.4, 0.4, 0.0, 0.0]];
        let (label, confidence) = aggregate_predictions(&predictions).unwrap();
        assert_eq!(label.to_string(), "Arm_Raise_Correct");
        assert_eq!(confidence, 0.4);
    }

    #[test]
    fn test_aggregate_rejects_wrong_class_count() {
        let predictions = array![[0.5, 0.5]];
        assert_matches!(
            aggregate_predictions(&predictions),
            Err(AnalysisError::Inference(_))
        );
    }

    #[test]
    fn test_aggregate_rejects_empty_batch() {
        let predictions = Array2::<f32>::zeros((0, PostureLabel::COUNT));
        assert_matches!(
            aggregate_predictions(&predictions),
            Err(AnalysisError::EmptyInput)
        );
    }

    #[test]
    fn test_classify_frames_batches_all_frames() {
        let mut classifier = MockPostureClassifier::new();
        classifier
            .expect_predict()
            .withf(|batch| batch.shape() == [4, FRAME_SIZE, FRAME_SIZE, FRAME_CHANNELS])
            .times(1)
            .returning(|batch| {
                let mut out = Array2::<f32>::zeros((batch.shape()[0], PostureLabel::COUNT));
                out.column_mut(5).fill(0.9);
                out.column_mut(0).fill(0.1);
                Ok(out)
            });

        let (label, confidence) = classify_frames(&classifier, blank_frames(4)).unwrap();
        assert_eq!(label.to_string(), "Knee_Extension_Incorrect");
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    fn leaning_rows(n: usize, favourite: usize) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros((n, PostureLabel::COUNT));
        out.column_mut(favourite).fill(0.6);
        out.column_mut(0).fill(0.4);
        out
    }

    #[test]
    fn test_classify_frames_scores_long_videos_in_chunks() {
        let mut classifier = MockPostureClassifier::new();
        // Full chunks lean to index 1, the short last chunk to index 2
        classifier
            .expect_predict()
            .withf(|batch| batch.shape()[0] == PREDICT_BATCH_FRAMES)
            .times(2)
            .returning(|batch| Ok(leaning_rows(batch.shape()[0], 1)));
        classifier
            .expect_predict()
            .withf(|batch| batch.shape()[0] == 6)
            .times(1)
            .returning(|batch| Ok(leaning_rows(batch.shape()[0], 2)));

        let frames = blank_frames(2 * PREDICT_BATCH_FRAMES + 6);
        let (label, confidence) = classify_frames(&classifier, frames).unwrap();

        // Mean over all 70 frames, not a mean of chunk means
        assert_eq!(label.to_string(), "Squat_Incorrect");
        assert!((confidence - 0.6 * 64.0 / 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_classify_frames_without_frames_is_empty_input() {
        let mut classifier = MockPostureClassifier::new();
        classifier.expect_predict().times(0);

        assert_matches!(
            classify_frames(&classifier, blank_frames(0)),
            Err(AnalysisError::EmptyInput)
        );
    }

    #[test]
    fn test_classify_frames_stops_on_decode_error() {
        let mut classifier = MockPostureClassifier::new();
        classifier.expect_predict().times(0);

        let mut frames = blank_frames(2);
        frames.push(Err(AnalysisError::Decode("corrupt packet".to_string())));

        assert_matches!(
            classify_frames(&classifier, frames),
            Err(AnalysisError::Decode(_))
        );
    }

    #[test]
    fn test_classifier_failure_becomes_inference_error() {
        let mut classifier = MockPostureClassifier::new();
        classifier
            .expect_predict()
            .returning(|_| Err(anyhow::anyhow!("runtime exploded")));

        let err = classify_frames(&classifier, blank_frames(1)).unwrap_err();
        assert_matches!(err, AnalysisError::Inference(_));
        assert_eq!(
            err.feedback_message(),
            "Error analyzing video: inference failed: runtime exploded"
        );
    }

    #[test]
    fn test_analyze_empty_file_fails_with_no_frames() {
        let mut classifier = MockPostureClassifier::new();
        classifier.expect_predict().times(0);
        let service =
            VideoAnalysisService::new(Some(Arc::new(classifier)), FrameExtractionService::new());

        let file = tempfile::NamedTempFile::new().unwrap();
        let result = service.analyze(file.path(), Some("squat"));

        assert!(result.is_failed());
        assert_eq!(result.label.to_string(), "failed");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.feedback, "No frames extracted from video");
        assert!(result.suggestions.is_empty());
        assert!(!result.is_simulated);
    }

    #[test]
    fn test_analyze_without_model_is_simulated() {
        let service = VideoAnalysisService::new(None, FrameExtractionService::new());
        assert!(!service.is_model_loaded());

        let result = service.analyze(Path::new("/does/not/matter.mp4"), None);
        assert!(result.is_simulated);
        assert!(!result.is_failed());
        assert!(!result.suggestions.is_empty());
    }

    #[test]
    fn test_simulation_is_reproducible_with_seed() {
        let a = simulate_analysis(&mut StdRng::seed_from_u64(7));
        let b = simulate_analysis(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.label, b.label);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.feedback, b.feedback);
    }

    #[test]
    fn test_simulation_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2_000 {
            let result = simulate_analysis(&mut rng);
            let label = result.label.posture().unwrap();
            assert!(PostureLabel::SIMULATED.contains(&label));
            assert!(result.confidence >= SIMULATED_CONFIDENCE_MIN);
            assert!(result.confidence < SIMULATED_CONFIDENCE_MAX);
            assert!(result.is_simulated);
        }
    }

    proptest! {
        #[test]
        fn prop_aggregation_is_reproducible(
            rows in prop::collection::vec(prop::collection::vec(0.0f32..1.0, 6), 1..40)
        ) {
            let n = rows.len();
            let flat: Vec<f32> = rows.into_iter().flatten().collect();
            let predictions = Array2::from_shape_vec((n, PostureLabel::COUNT), flat).unwrap();

            let (first_label, first_conf) = aggregate_predictions(&predictions).unwrap();
            let (second_label, second_conf) = aggregate_predictions(&predictions.clone()).unwrap();

            prop_assert_eq!(first_label, second_label);
            prop_assert_eq!(first_conf.to_bits(), second_conf.to_bits());

            let mean = predictions.mean_axis(Axis(0)).unwrap();
            prop_assert!(mean.iter().all(|&p| p <= first_conf + 1e-5));
            prop_assert!((mean[first_label.index()] - first_conf).abs() < 1e-5);
        }
    }
}
