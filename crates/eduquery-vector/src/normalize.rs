use anyhow::{bail, Result};

/// Scale `v` to unit length. A zero vector stays zero rather than becoming
/// NaN.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Check a provider's output before it becomes index state: one row per
/// input, a single non-zero dimensionality, finite values.
pub fn validate_embeddings(rows: &[Vec<f32>], expected_rows: usize) -> Result<usize> {
    if rows.len() != expected_rows {
        bail!("embedder returned {} vectors for {} inputs", rows.len(), expected_rows);
    }
    let dim = rows.first().map(Vec::len).unwrap_or(0);
    if expected_rows > 0 && dim == 0 {
        bail!("embedder returned zero-length vectors");
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != dim {
            bail!("vector {} has dim {}, expected {}", i, row.len(), dim);
        }
        if row.iter().any(|x| !x.is_finite()) {
            bail!("vector {} contains non-finite values", i);
        }
    }
    Ok(dim)
}
