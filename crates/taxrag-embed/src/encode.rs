//! Text to tensor and hidden states to sentence vector.

use anyhow::{Result, anyhow};
use candle_core::{DType, Device, Tensor};
use tokenizers::Tokenizer;

/// Metal when built with the `metal` feature and a GPU is present, else CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                tracing::info!("embedding on metal");
                return dev;
            }
            Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to cpu"),
        }
    }
    tracing::debug!("embedding on cpu");
    Device::Cpu
}

/// Token ids and attention mask for one query, each `[1, T]` with `T <= max_len`.
///
/// Queries are embedded one at a time, so nothing is padded.
pub fn encode_query(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let encoding = tokenizer.encode(text, true).map_err(|e| anyhow!("tokenizing query failed: {}", e))?;
    let keep = encoding.get_ids().len().min(max_len.max(1));
    let ids = &encoding.get_ids()[..keep];
    let mask = &encoding.get_attention_mask()[..keep];
    let ids = Tensor::new(ids, device)?.unsqueeze(0)?;
    let mask = Tensor::new(mask, device)?.unsqueeze(0)?;
    Ok((ids, mask))
}

/// Average the hidden states of unmasked tokens, then scale to unit length.
/// `[B, T, H]` with mask `[B, T]` gives `[B, H]`.
pub fn mean_pool_normalized(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _, width) = hidden.dims3()?;
    let hidden = hidden.to_dtype(DType::F32)?;
    let weights = attention_mask.to_device(hidden.device())?.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
    let counts = weights.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    let mean = summed.broadcast_div(&counts)?;
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12f32, f32::MAX)?;
    let pooled = mean.broadcast_div(&norms)?;
    anyhow::ensure!(pooled.dims() == [batch, width], "pooled shape {:?} != [{batch}, {width}]", pooled.dims());
    Ok(pooled)
}
