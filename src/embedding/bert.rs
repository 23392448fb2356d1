use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::backend::EmbeddingBackend;
use super::config::{BackendKind, EmbedderConfig};
use super::device::select_device;
use super::error::EmbeddingError;
use super::utils::{l2_normalize, load_tokenizer};

/// Mean-pooled sentence embeddings from a BERT-family checkpoint.
pub struct BertBackend {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
    hidden_size: usize,
}

impl std::fmt::Debug for BertBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertBackend")
            .field("model_name", &self.model_name)
            .field("device", &format!("{:?}", self.device))
            .field("hidden_size", &self.hidden_size)
            .finish()
    }
}

impl BertBackend {
    /// Loads `config.json`, `model.safetensors` and `tokenizer.json` from the
    /// configured model directory.
    pub fn load(config: &EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;
        let Some(model_dir) = config.model_path.as_deref() else {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_path is required for the bert backend".to_string(),
            });
        };

        let device = select_device()?;
        debug!(?device, "Selected compute device for embeddings");

        let (model, hidden_size) = Self::load_model(model_dir, &device)?;
        let tokenizer = load_tokenizer(model_dir, config.max_seq_len).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("failed to load tokenizer: {e}"),
            }
        })?;

        info!(
            model_path = %model_dir.display(),
            model_name = %config.model_name,
            hidden_size,
            max_seq_len = config.max_seq_len,
            "BERT embedding model loaded"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: config.model_name.clone(),
            hidden_size,
        })
    }

    fn load_model(model_dir: &Path, device: &Device) -> Result<(BertModel, usize), EmbeddingError> {
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");
        for path in [&config_path, &weights_path] {
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path: path.clone() });
            }
        }

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("failed to read {}: {e}", config_path.display()),
            }
        })?;
        let config: Config = serde_json::from_str(&raw)
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to parse {}: {e}", config_path.display()),
            })?;

        // SAFETY: the weights file is memory-mapped read-only for the model's lifetime.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        // Sentence-transformer exports keep the encoder at the root, HF
        // checkpoints nest it under `bert.`.
        let model = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)
        } else {
            BertModel::load(vb, &config)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("failed to load BERT weights: {e}"),
        })?;

        Ok((model, config.hidden_size))
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encoding.get_ids().is_empty() {
            return Ok(vec![0.0; self.hidden_size]);
        }

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        // [1, seq_len, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &type_ids, Some(&attention_mask))?;

        // Mean pooling over non-padding tokens.
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?.squeeze(0)?;

        let mut embedding = pooled.to_vec1::<f32>()?;
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

impl EmbeddingBackend for BertBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Bert
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(count = texts.len(), model = %self.model_name, "Encoding with BERT backend");
        // Sequential; batching would need padding-aware pooling.
        texts.iter().map(|text| self.embed_one(text)).collect()
    }
}
