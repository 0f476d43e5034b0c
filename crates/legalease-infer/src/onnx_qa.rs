//! ONNX-based extractive QA using a DistilBERT-SQuAD style model.
//!
//! Loads an ONNX export with `start_logits` / `end_logits` outputs and its
//! HuggingFace tokenizer. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;
    use std::sync::Arc;

    use legalease_core::{Error, Result};
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info};

    use crate::qa::{decode_best_span, QaPrediction, QuestionAnswerer, MAX_ANSWER_TOKENS};

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    fn inference_err(e: impl std::fmt::Display) -> Error {
        Error::Inference(e.to_string())
    }

    /// Local extractive QA engine.
    pub struct OnnxQuestionAnswerer {
        session: Arc<Mutex<Session>>,
        tokenizer: Tokenizer,
    }

    impl OnnxQuestionAnswerer {
        /// Load an ONNX model and tokenizer from the given directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx`: the ONNX model file
        /// - `model_dir/tokenizer.json`: the HuggingFace tokenizer
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::Config(format!("Model not found: {}", model_path.display())));
            }
            if !tokenizer_path.exists() {
                return Err(Error::Config(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.so
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| inference_err(format!("Failed to create session builder: {}", e)))?
                .with_intra_threads(2)
                .map_err(|e| inference_err(format!("Failed to set threads: {}", e)))?
                .commit_from_file(&model_path)
                .map_err(|e| inference_err(format!("Failed to load ONNX model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Config(format!("Failed to load tokenizer: {}", e)))?;

            info!("ONNX QA model loaded: {}", model_path.display());

            Ok(Self {
                session: Arc::new(Mutex::new(session)),
                tokenizer,
            })
        }

        /// Run the model and return (start_logits, end_logits).
        fn logits(&self, ids: Vec<i64>, mask: Vec<i64>) -> Result<(Vec<f32>, Vec<f32>)> {
            let seq_len = ids.len();
            let ids_tensor = Tensor::from_array(([1usize, seq_len], ids)).map_err(inference_err)?;
            let mask_tensor =
                Tensor::from_array(([1usize, seq_len], mask)).map_err(inference_err)?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor])
                .map_err(|e| inference_err(format!("ONNX inference failed: {}", e)))?;

            let (_, start) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(inference_err)?;
            let (_, end) = outputs[1]
                .try_extract_tensor::<f32>()
                .map_err(inference_err)?;
            Ok((start.to_vec(), end.to_vec()))
        }
    }

    impl QuestionAnswerer for OnnxQuestionAnswerer {
        fn answer(&self, question: &str, context: &str) -> Result<QaPrediction> {
            let encoding = self
                .tokenizer
                .encode((question, context), true)
                .map_err(|e| inference_err(format!("Tokenization failed: {}", e)))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let ids: Vec<i64> = encoding.get_ids()[..seq_len]
                .iter()
                .map(|&id| id as i64)
                .collect();
            let mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
                .iter()
                .map(|&m| m as i64)
                .collect();
            let is_context: Vec<bool> = encoding.get_sequence_ids()[..seq_len]
                .iter()
                .map(|s| *s == Some(1))
                .collect();

            let (start_logits, end_logits) = self.logits(ids, mask)?;

            let Some((s, e, score)) =
                decode_best_span(&start_logits, &end_logits, &is_context, MAX_ANSWER_TOKENS)
            else {
                debug!("No context tokens survived truncation");
                return Ok(QaPrediction {
                    answer: String::new(),
                    score: 0.0,
                    span: 0..0,
                });
            };

            let offsets = encoding.get_offsets();
            let span = offsets[s].0..offsets[e].1;
            let answer = context.get(span.clone()).unwrap_or_default().to_string();

            Ok(QaPrediction { answer, score, span })
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxQuestionAnswerer;
