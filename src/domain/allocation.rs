//! Target allocations by risk profile and rebalancing actions.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use super::error::InvalidInput;
use super::holdings::HoldingsMap;

pub const STABLE_BUCKET: &str = "stable_assets";
pub const GROWTH_BUCKET: &str = "growth_assets";

/// Stable assets assumed when none are configured.
pub const DEFAULT_STABLE_ASSETS: [&str; 4] = ["USDC", "USDT", "USD", "EURC"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum RiskProfile {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [
        RiskProfile::Conservative,
        RiskProfile::Moderate,
        RiskProfile::Aggressive,
    ];

    /// Parses `label`, falling back to [`RiskProfile::default`] when it is not
    /// recognised. The second element is `true` when the fallback was used.
    pub fn parse_or_default(label: &str) -> (RiskProfile, bool) {
        match label.parse() {
            Ok(profile) => (profile, false),
            Err(_) => (RiskProfile::default(), true),
        }
    }

    pub fn target_allocation(&self) -> Allocation {
        match self {
            RiskProfile::Conservative => Allocation {
                stable: 0.7,
                growth: 0.3,
            },
            RiskProfile::Moderate => Allocation {
                stable: 0.5,
                growth: 0.5,
            },
            RiskProfile::Aggressive => Allocation {
                stable: 0.3,
                growth: 0.7,
            },
        }
    }
}

impl FromStr for RiskProfile {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "moderate" => Ok(RiskProfile::Moderate),
            "aggressive" => Ok(RiskProfile::Aggressive),
            _ => Err(InvalidInput::UnknownRiskProfile(s.to_string())),
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Moderate => "moderate",
            RiskProfile::Aggressive => "aggressive",
        };
        write!(f, "{label}")
    }
}

/// Target split between stable and growth assets; the two shares sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Allocation {
    pub stable: f64,
    pub growth: f64,
}

impl Allocation {
    pub fn as_weights(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            (STABLE_BUCKET.to_string(), self.stable),
            (GROWTH_BUCKET.to_string(), self.growth),
        ])
    }
}

pub fn suggest_allocation(profile: RiskProfile) -> Allocation {
    profile.target_allocation()
}

/// Value held in each bucket. Assets listed in `stable_assets` count as
/// stable, everything else as growth.
pub fn current_allocation(
    holdings: &HoldingsMap,
    stable_assets: &HashSet<String>,
) -> BTreeMap<String, f64> {
    let mut stable = 0.0;
    let mut growth = 0.0;
    for (asset, amount) in holdings.iter() {
        if stable_assets.contains(asset) {
            stable += amount;
        } else {
            growth += amount;
        }
    }
    BTreeMap::from([
        (STABLE_BUCKET.to_string(), stable),
        (GROWTH_BUCKET.to_string(), growth),
    ])
}

/// Amount to trade per key to move `current` values onto `target_weights`.
///
/// Positive means buy, negative means sell. Keys absent from `target_weights`
/// have a target of zero. An empty or valueless `current` yields no actions.
pub fn rebalancing_actions(
    current: &BTreeMap<String, f64>,
    target_weights: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    let total: f64 = current.values().sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }

    current
        .keys()
        .chain(target_weights.keys())
        .map(|key| {
            let have = current.get(key).copied().unwrap_or(0.0);
            let weight = target_weights.get(key).copied().unwrap_or(0.0);
            (key.clone(), weight * total - have)
        })
        .collect()
}
