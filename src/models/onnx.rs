//! ONNX Runtime classifier backend

use crate::error::{ScoringError, ScoringResult};
use crate::features::FeatureMatrix;
use crate::models::classifier::Classifier;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

fn ort_err(e: ort::Error) -> ScoringError {
    ScoringError::Inference(e.to_string())
}

/// Classifier backed by an ONNX graph (e.g. an skl2onnx export).
///
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex; the model itself never changes after load.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> ScoringResult<Self> {
        let path = path.as_ref();
        let invalid = |e: ort::Error| ScoringError::invalid_artifact(path, e);

        info!(path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(invalid)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(invalid)?
            .with_intra_threads(threads.max(1))
            .map_err(invalid)?
            .commit_from_file(path)
            .map_err(invalid)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| ScoringError::invalid_artifact(path, "model has no inputs"))?;

        // skl2onnx names the outputs "label" and "probabilities"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().find(|o| !o.name.contains("label")))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| ScoringError::invalid_artifact(path, "model has no outputs"))?;

        info!(
            input = %input_name,
            output = %output_name,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Positive-class probabilities from the named output, or from the first
    /// non-label output that can be read
    fn extract_probabilities(&self, outputs: &SessionOutputs, rows: usize) -> ScoringResult<Vec<f64>> {
        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Some(probs) = Self::read_output(output, rows) {
                return Ok(probs);
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(probs) = Self::read_output(&output, rows) {
                debug!(output = %name, "Extracted probabilities (fallback)");
                return Ok(probs);
            }
        }

        Err(ScoringError::Inference(
            "model produced no readable probability output".to_string(),
        ))
    }

    fn read_output(output: &DynValue, rows: usize) -> Option<Vec<f64>> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Self::probabilities_from_tensor(&dims, data, rows);
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return Self::probabilities_from_sequence_map(output, rows).ok();
        }

        None
    }

    /// `[N, 2]` keeps column 1; `[N, 1]` and `[N]` are already the positive class
    fn probabilities_from_tensor(dims: &[i64], data: &[f32], rows: usize) -> Option<Vec<f64>> {
        match dims {
            [n, classes] if *n as usize == rows && *classes >= 2 => {
                let classes = *classes as usize;
                Some((0..rows).map(|i| data[i * classes + 1] as f64).collect())
            }
            [n, 1] | [n] if *n as usize == rows => {
                Some(data[..rows].iter().map(|&p| p as f64).collect())
            }
            _ => None,
        }
    }

    /// seq(map(int64, float)), one map per row (ZipMap output)
    fn probabilities_from_sequence_map(output: &DynValue, rows: usize) -> ScoringResult<Vec<f64>> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(ort_err)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(ort_err)?;

        if maps.len() != rows {
            return Err(ScoringError::Inference(format!(
                "expected {} probability maps, got {}",
                rows,
                maps.len()
            )));
        }

        maps.iter()
            .map(|map_value| {
                let kv_pairs = map_value
                    .try_extract_key_values::<i64, f32>()
                    .map_err(ort_err)?;

                if let Some((_, p)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
                    return Ok(*p as f64);
                }
                if let Some((_, p)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
                    return Ok(1.0 - *p as f64);
                }
                Err(ScoringError::Inference(
                    "no class probability in map".to_string(),
                ))
            })
            .collect()
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    /// The graph's input width is only checked by ONNX Runtime at run time
    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> ScoringResult<Vec<f64>> {
        let rows = matrix.n_rows();
        if rows == 0 {
            return Ok(Vec::new());
        }

        let shape = vec![rows as i64, matrix.n_cols() as i64];
        let data: Vec<f32> = matrix.values().iter().map(|&v| v as f32).collect();
        let input_tensor = Tensor::from_array((shape, data)).map_err(ort_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ScoringError::Inference(format!("Lock error: {}", e)))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(ort_err)?;

        self.extract_probabilities(&outputs, rows)
    }
}
