//! Local ONNX Runtime embedding provider.
//!
//! Runs all-MiniLM-L6-v2 via `ort`: tokenize, infer, mean-pool the token
//! embeddings under the attention mask, then L2-normalize.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ndarray::{Array1, ArrayView2};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{l2_normalize, EmbeddingProvider};
use crate::config::{expand_tilde, EmbeddingConfig};

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimensions: usize,
    model: String,
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = model_paths(config);

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `career-nexus model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `career-nexus model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;
        tracing::info!(model = %model_path.display(), "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions: config.dimensions(),
            model: config.model.clone(),
        })
    }
}

/// `(model.onnx, tokenizer.json)` under the configured model directory.
pub fn model_paths(config: &EmbeddingConfig) -> (PathBuf, PathBuf) {
    let dir = expand_tilde(&config.model_dir);
    (dir.join(MODEL_FILE), dir.join(TOKENIZER_FILE))
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let seq_len = ids.len();
        anyhow::ensure!(seq_len > 0, "tokenizer produced no tokens");

        let shape = vec![1i64, seq_len as i64];
        let input_ids = Tensor::from_array((shape.clone(), ids.into_boxed_slice()))?;
        let attention_mask = Tensor::from_array((shape.clone(), mask.clone().into_boxed_slice()))?;
        // Single segment: token types are all zero.
        let token_type_ids =
            Tensor::from_array((shape, vec![0i64; seq_len].into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        })?;

        // Output name varies by export.
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);
        let (dims, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings")?;

        let dims: &[i64] = &dims;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] == 1 && dims[2] == self.dimensions as i64,
            "unexpected token embedding shape {dims:?}, expected [1, seq, {}]",
            self.dimensions
        );
        let out_seq = dims[1] as usize;
        let width = dims[2] as usize;

        let tokens = ArrayView2::from_shape((out_seq, width), &data[..out_seq * width])
            .context("token embeddings do not fit the reported shape")?;
        let weights: Array1<f32> = mask.iter().take(out_seq).map(|&m| m as f32).collect();
        let count = weights.sum().max(1.0);
        let pooled = tokens.t().dot(&weights) / count;

        Ok(l2_normalize(&pooled.to_vec()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}
