use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tokenizers::{Encoding, Tokenizer};
use tracing::{debug, info};

use crate::application::{EmbeddingProvider, WarmUp};
use crate::domain::DomainError;

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
const MAX_SEQ_LENGTH: usize = 256;
const BATCH_SIZE: usize = 32;

/// Output sizes of sentence-transformer models we know without running them.
const KNOWN_DIMENSIONS: &[(&str, usize)] = &[
    ("sentence-transformers/all-MiniLM-L6-v2", 384),
    ("sentence-transformers/all-MiniLM-L12-v2", 384),
    ("sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2", 384),
    ("sentence-transformers/all-mpnet-base-v2", 768),
    ("BAAI/bge-small-en-v1.5", 384),
    ("BAAI/bge-base-en-v1.5", 768),
];

/// Sentence-transformer embeddings run locally through ONNX Runtime.
pub struct OrtEmbedding {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: Option<usize>,
}

impl OrtEmbedding {
    /// Downloads (or reuses the hub cache of) `model_id` and loads it.
    pub fn new(model_id: &str) -> Result<Self, DomainError> {
        info!("Initializing ORT embedding provider with model: {}", model_id);

        let api = hf_hub::api::sync::ApiBuilder::new()
            .with_progress(true)
            .build()
            .map_err(|e| DomainError::embedding(format!("Failed to create HF API: {}", e)))?;

        let repo = api.model(model_id.to_string());

        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| DomainError::embedding(format!("Failed to download tokenizer: {}", e)))?;

        let model_path = repo
            .get("model.onnx")
            .or_else(|_| repo.get("onnx/model.onnx"))
            .map_err(|e| DomainError::embedding(format!("Failed to download ONNX model: {}", e)))?;

        Self::from_paths(model_path, tokenizer_path, model_id)
    }

    pub fn from_paths(
        model_path: PathBuf,
        tokenizer_path: PathBuf,
        model_name: &str,
    ) -> Result<Self, DomainError> {
        info!("Loading ONNX model from: {:?}", model_path);

        let session = Session::builder()
            .map_err(|e| DomainError::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| DomainError::embedding(format!("Failed to set optimization level: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load ONNX model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| DomainError::embedding(format!("Failed to load tokenizer: {}", e)))?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name: model_name.to_string(),
            dimension: known_dimension(model_name),
        })
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| DomainError::embedding(format!("Tokenization failed: {}", e)))?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(MAX_SEQ_LENGTH);

        let input_ids = padded(&encodings, max_len, Encoding::get_ids);
        let attention_mask = padded(&encodings, max_len, Encoding::get_attention_mask);
        let token_type_ids = padded(&encodings, max_len, Encoding::get_type_ids);

        let shape = [batch_size, max_len];
        let to_tensor = |name: &str, data: Vec<i64>| {
            Tensor::from_array((shape, data)).map_err(|e| {
                DomainError::embedding(format!("Failed to create {} tensor: {}", name, e))
            })
        };
        let input_ids_tensor = to_tensor("input_ids", input_ids)?;
        let attention_mask_tensor = to_tensor("attention_mask", attention_mask)?;
        let token_type_ids_tensor = to_tensor("token_type_ids", token_type_ids)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| DomainError::embedding(format!("Failed to lock session: {}", e)))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor,
            ])
            .map_err(|e| DomainError::embedding(format!("Inference failed: {}", e)))?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| DomainError::embedding("No output tensor found"))?;

        let (shape, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| DomainError::embedding(format!("Failed to extract output tensor: {}", e)))?;

        let shape: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        debug!("Output tensor shape: {:?}", shape);

        match shape.as_slice() {
            // token embeddings: mean-pool over the attention mask
            [_, seq_len, hidden_size] => Ok((0..batch_size)
                .map(|i| {
                    let mask = encodings[i].get_attention_mask();
                    let mut pooled = vec![0.0f32; *hidden_size];
                    let mut count = 0.0f32;

                    for j in 0..(*seq_len).min(max_len) {
                        if mask.get(j).copied().unwrap_or(0) == 0 {
                            continue;
                        }
                        let offset = (i * seq_len + j) * hidden_size;
                        for (k, value) in pooled.iter_mut().enumerate() {
                            *value += data[offset + k];
                        }
                        count += 1.0;
                    }

                    if count > 0.0 {
                        pooled.iter_mut().for_each(|v| *v /= count);
                    }
                    normalize(pooled)
                })
                .collect()),
            // already pooled
            [_, hidden_size] => Ok((0..batch_size)
                .map(|i| normalize(data[i * hidden_size..(i + 1) * hidden_size].to_vec()))
                .collect()),
            other => Err(DomainError::embedding(format!(
                "Unexpected output tensor shape: {:?}",
                other
            ))),
        }
    }
}

fn known_dimension(model_name: &str) -> Option<usize> {
    KNOWN_DIMENSIONS
        .iter()
        .find(|(name, _)| *name == model_name)
        .map(|(_, dimension)| *dimension)
}

/// Flattens one tokenizer field across the batch, truncated and zero-padded to `max_len`.
fn padded(encodings: &[Encoding], max_len: usize, field: fn(&Encoding) -> &[u32]) -> Vec<i64> {
    let mut flat = Vec::with_capacity(encodings.len() * max_len);
    for encoding in encodings {
        let values = field(encoding);
        let len = values.len().min(max_len);
        flat.extend(values[..len].iter().map(|&x| x as i64));
        flat.extend(std::iter::repeat_n(0i64, max_len - len));
    }
    flat
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}

#[async_trait]
impl WarmUp for OrtEmbedding {
    async fn warm_up(&self) -> Result<(), DomainError> {
        self.embed_texts(&["Hi"]).map(|_| ())
    }
}

#[async_trait]
impl EmbeddingProvider for OrtEmbedding {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn output_dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_texts(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("Failed to generate embedding"))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            vectors.extend(self.embed_texts(&refs)?);
        }
        Ok(vectors)
    }
}
