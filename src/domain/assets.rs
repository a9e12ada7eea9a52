//! Parsing of asset lists and inline holdings/price arguments.
//!
//! Asset identifiers are trimmed and upper-cased; lists are comma-separated.

use std::collections::HashSet;

use super::holdings::{normalize_asset_id, HoldingsMap};
use super::price_series::PriceSeries;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetListError {
    #[error("empty token in asset list")]
    EmptyToken,

    #[error("duplicate asset: {0}")]
    DuplicateAsset(String),

    #[error("expected ASSET=AMOUNT, got {0:?}")]
    MalformedHolding(String),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("{0}")]
    Rejected(String),
}

pub fn parse_assets(input: &str) -> Result<Vec<String>, AssetListError> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let asset = normalize_asset_id(token);
        if asset.is_empty() {
            return Err(AssetListError::EmptyToken);
        }
        if !seen.insert(asset.clone()) {
            return Err(AssetListError::DuplicateAsset(asset));
        }
        assets.push(asset);
    }

    Ok(assets)
}

/// Parses `"USDC=5000,BTC=0.5"` into holdings.
pub fn parse_holdings(input: &str) -> Result<HoldingsMap, AssetListError> {
    let mut holdings = HoldingsMap::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(AssetListError::EmptyToken);
        }
        let (asset, amount) = trimmed
            .split_once('=')
            .ok_or_else(|| AssetListError::MalformedHolding(trimmed.to_string()))?;
        let asset = normalize_asset_id(asset);
        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|_| AssetListError::InvalidNumber(amount.trim().to_string()))?;

        if holdings.contains(&asset) {
            return Err(AssetListError::DuplicateAsset(asset));
        }
        holdings
            .insert(asset, amount)
            .map_err(|e| AssetListError::Rejected(e.to_string()))?;
    }

    Ok(holdings)
}

/// Parses `"100,102,101.5"` into a price series.
pub fn parse_prices(input: &str) -> Result<PriceSeries, AssetListError> {
    let prices = input
        .split(',')
        .map(|token| {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Err(AssetListError::EmptyToken);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| AssetListError::InvalidNumber(trimmed.to_string()))
        })
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(PriceSeries::new(prices))
}
