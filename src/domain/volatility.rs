//! Return-series statistics.
//!
//! Volatility is the population standard deviation of simple period-over-period
//! returns: VOL = sqrt(sum((r[i] - mean(r))^2) / N), N = number of returns.

use super::error::InvalidInput;
use super::price_series::PriceSeries;

/// Population standard deviation of `values`; `0.0` for an empty slice.
///
/// Values are scaled by their largest magnitude first so that finite inputs
/// near `f64::MAX` give a finite result.
pub fn population_stddev(values: &[f64]) -> f64 {
    let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|v| v / scale).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| (v / scale - mean).powi(2))
        .sum::<f64>()
        / n;
    scale * variance.sqrt()
}

/// Volatility of a price series. Fewer than two prices yield exactly `0.0`.
pub fn calculate_volatility(prices: &PriceSeries) -> Result<f64, InvalidInput> {
    if prices.len() < 2 {
        return Ok(0.0);
    }

    let returns = prices.returns()?;
    Ok(population_stddev(&returns))
}
