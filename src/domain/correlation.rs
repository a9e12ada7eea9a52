//! Pairwise correlation of asset returns.

use std::collections::BTreeMap;

use super::error::InvalidInput;
use super::price_series::PriceSeries;

pub type CorrelationMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Pearson correlation of two equally long samples, clamped to `[-1, 1]`.
/// Fewer than two observations or a zero-variance side yield `0.0`.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }

    // Correlation is scale-free; unit-scaling keeps the sums finite.
    let (x, y) = (unit_scaled(&x[..n]), unit_scaled(&y[..n]));
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(&y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }

    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

fn unit_scaled(values: &[f64]) -> Vec<f64> {
    let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return values.to_vec();
    }
    values.iter().map(|v| v / scale).collect()
}

/// Correlation matrix of simple returns, aligned on the most recent common
/// length of each pair. The diagonal is `1.0`.
pub fn correlation_matrix(
    history: &BTreeMap<String, PriceSeries>,
) -> Result<CorrelationMatrix, InvalidInput> {
    let mut returns = BTreeMap::new();
    for (asset, series) in history {
        returns.insert(asset.as_str(), series.returns()?);
    }

    let mut matrix = CorrelationMatrix::new();
    for (&a, ra) in &returns {
        let row = matrix.entry(a.to_string()).or_default();
        for (&b, rb) in &returns {
            let value = if a == b {
                1.0
            } else {
                let n = ra.len().min(rb.len());
                pearson(&ra[ra.len() - n..], &rb[rb.len() - n..])
            };
            row.insert(b.to_string(), value);
        }
    }
    Ok(matrix)
}
