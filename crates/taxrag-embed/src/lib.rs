//! taxrag-embed
//!
//! Sentence embedders for query text. `SentenceEmbedder` runs a local
//! BERT-family model (MiniLM class) with candle; `FakeEmbedder` is a
//! deterministic token-hashing stand-in selected by `APP_USE_FAKE_EMBEDDINGS=1`.

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use taxrag_core::config::EmbeddingSettings;
use taxrag_core::traits::Embedder;

pub mod encode;

pub use encode::{encode_query, mean_pool_normalized, select_device};

/// Output width of the all-MiniLM-L6-v2 family.
pub const MINILM_DIM: usize = 384;

pub struct SentenceEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading sentence embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?["hidden_size"].as_u64().map_or(MINILM_DIM, |d| d as usize);
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        tracing::info!(dim, "sentence embedding model ready");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = encode_query(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool_normalized(&hidden, &attention_mask)?;
        let emb: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        anyhow::ensure!(emb.len() == self.dim, "embedding width {} != model width {}", emb.len(), self.dim);
        let elapsed = start.elapsed().as_millis();
        if elapsed > 100 { tracing::warn!(elapsed_ms = elapsed as u64, "slow embedding"); }
        Ok(emb)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed(&self, text: &str) -> Result<Vec<f32>> { self.embed_text(text) }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<std::collections::HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pth = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&pth)?;
    weights.into_iter().map(|(name, t)| Ok((name, t.to_device(device)?))).collect()
}

/// Deterministic bag-of-tokens embedder: each whitespace token hashes into one
/// slot, then the vector is L2-normalized. Texts sharing tokens land close.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() { continue; }
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; } Ok(v)
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() { tracing::info!("using FakeEmbedder"); return Ok(Box::new(FakeEmbedder::new(MINILM_DIM))); }
    let dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Box::new(SentenceEmbedder::load(&dir, settings.max_len)?))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured { let p = taxrag_core::config::expand_path(dir); if p.exists() { return Ok(p); } tracing::warn!(dir = %p.display(), "configured model dir missing"); }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) { let p = PathBuf::from(&dir); if p.exists() { tracing::info!(var, dir = %p.display(), "using model dir from env"); return Ok(p); } }
    }
    for candidate in ["models/all-MiniLM-L6-v2", "../models/all-MiniLM-L6-v2"] {
        let p = Path::new(candidate); if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(anyhow!("Could not locate a sentence embedding model directory"))
}
