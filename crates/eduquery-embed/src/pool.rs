use anyhow::{Result, ensure};
use candle_core::{DType, Tensor};

/// Masked mean over the token axis, then per-row L2 normalisation.
/// `hidden` is `[B, T, H]` and `attention_mask` is `[B, T]`; the result is
/// `[B, H]`. Rows whose mask is all zero come back as zero vectors.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _, hidden_dim) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1f32, f32::MAX)?;
    let mean = summed.broadcast_div(&counts)?;
    let eps = match hidden.dtype() { DType::F16 | DType::BF16 => 1e-6f32, _ => 1e-12f32 };
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(eps, f32::MAX)?;
    let pooled = mean.broadcast_div(&norms)?;
    ensure!(pooled.dims() == [batch, hidden_dim], "pooled shape {:?} != [{}, {}]", pooled.dims(), batch, hidden_dim);
    Ok(pooled)
}
