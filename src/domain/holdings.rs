//! Wallet holdings: asset identifier to non-negative amount.

use std::collections::BTreeMap;

use super::error::InvalidInput;

/// Canonical form of an asset identifier: trimmed and upper-cased.
pub fn normalize_asset_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Validated asset → amount mapping.
///
/// Ordered by asset identifier so that every aggregate over the holdings is
/// summed in the same order for identical input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingsMap {
    amounts: BTreeMap<String, f64>,
}

impl HoldingsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, InvalidInput>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut holdings = Self::new();
        for (asset, amount) in pairs {
            holdings.insert(asset, amount)?;
        }
        Ok(holdings)
    }

    /// Adds a holding. Identifiers are normalized with [`normalize_asset_id`],
    /// must be non-empty and must not already be present; amounts must be
    /// finite and non-negative.
    pub fn insert(&mut self, asset: impl Into<String>, amount: f64) -> Result<(), InvalidInput> {
        let asset = normalize_asset_id(&asset.into());
        if asset.is_empty() {
            return Err(InvalidInput::EmptyAssetId);
        }
        if !amount.is_finite() {
            return Err(InvalidInput::NonFiniteAmount { asset });
        }
        if amount < 0.0 {
            return Err(InvalidInput::NegativeAmount { asset, amount });
        }
        if self.amounts.contains_key(&asset) {
            return Err(InvalidInput::DuplicateAsset(asset));
        }
        self.amounts.insert(asset, amount);
        Ok(())
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.amounts.get(asset).copied()
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.amounts.contains_key(asset)
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.amounts.values().sum()
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.amounts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.amounts.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Each holding's share of the total; empty when the total is zero.
    ///
    /// Amounts are scaled by the largest one before summing, so shares stay
    /// finite even when the raw total would overflow.
    pub fn proportions(&self) -> Vec<(&str, f64)> {
        let max = self.amounts.values().fold(0.0_f64, |m, &a| m.max(a));
        if max == 0.0 {
            return Vec::new();
        }
        let total: f64 = self.amounts.values().map(|a| a / max).sum();
        self.iter()
            .map(|(asset, amount)| (asset, (amount / max) / total))
            .collect()
    }
}
