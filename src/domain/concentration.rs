//! Concentration index.
//!
//! Herfindahl index over holding proportions: HHI = sum((amount[i] / total)^2).
//! Ranges from 1/n (even split across n non-zero holdings) to 1 (single asset).

use super::holdings::HoldingsMap;

/// Herfindahl index from weights. Higher = more concentrated.
pub fn herfindahl_index(weights: &[f64]) -> f64 {
    weights.iter().map(|w| w * w).sum()
}

/// Concentration risk of `holdings`; exactly `0.0` when empty or valueless.
pub fn calculate_concentration_risk(holdings: &HoldingsMap) -> f64 {
    if holdings.is_empty() {
        return 0.0;
    }

    let weights: Vec<f64> = holdings.proportions().into_iter().map(|(_, p)| p).collect();
    if weights.is_empty() {
        return 0.0;
    }
    herfindahl_index(&weights)
}

/// Equivalent number of equally weighted holdings, `1 / HHI`.
pub fn effective_asset_count(holdings: &HoldingsMap) -> f64 {
    let hhi = calculate_concentration_risk(holdings);
    if hhi > 0.0 { 1.0 / hhi } else { 0.0 }
}
