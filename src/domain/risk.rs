//! Portfolio risk aggregation.
//!
//! Combines per-asset volatility and holdings concentration into a single
//! [`RiskAssessment`]:
//!
//! - `volatility_risk` = sum(amount[i] * VOL[i]) / sum(amount[i]) over held assets
//!   with at least two prices
//! - `concentration_risk` = HHI over all holdings
//! - `overall_risk_score` = w_vol * normalize(volatility_risk) + w_conc * concentration_risk
//!
//! The weights, the normalization curve and the treatment of assets without
//! price history come from a [`RiskPolicy`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::concentration::calculate_concentration_risk;
use super::error::InvalidInput;
use super::event::{RiskEvent, SkipReason};
use super::holdings::{normalize_asset_id, HoldingsMap};
use super::price_series::PriceSeries;
use super::volatility::calculate_volatility;
use crate::ports::event_port::EventPort;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

pub const DEFAULT_VOLATILITY_CAP: f64 = 0.10;
pub const DEFAULT_LOGISTIC_STEEPNESS: f64 = 20.0;

/// Everything the aggregator needs, materialised in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioSnapshot {
    pub holdings: HoldingsMap,
    pub price_history: BTreeMap<String, PriceSeries>,
    /// Assets whose history could not be fetched, with the reason.
    pub unavailable: BTreeMap<String, String>,
}

impl PortfolioSnapshot {
    pub fn new(holdings: HoldingsMap) -> Self {
        Self {
            holdings,
            ..Self::default()
        }
    }

    pub fn with_prices(mut self, asset: &str, prices: impl Into<PriceSeries>) -> Self {
        self.price_history.insert(normalize_asset_id(asset), prices.into());
        self
    }
}

/// Linear weights of the two sub-scores. Always finite, strictly positive and
/// summing to one, so the overall score is zero only when both sub-scores are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskWeights {
    volatility: f64,
    concentration: f64,
}

impl RiskWeights {
    pub fn new(volatility: f64, concentration: f64) -> Result<Self, InvalidInput> {
        for (name, w) in [("volatility", volatility), ("concentration", concentration)] {
            if !(w.is_finite() && w > 0.0) {
                return Err(InvalidInput::InvalidWeights {
                    reason: format!("{name} weight must be a positive number, got {w}"),
                });
            }
        }
        let sum = volatility + concentration;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(InvalidInput::InvalidWeights {
                reason: format!("weights must sum to 1, got {sum}"),
            });
        }
        Ok(Self {
            volatility,
            concentration,
        })
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            volatility: 0.5,
            concentration: 0.5,
        }
    }
}

/// Maps raw volatility (unbounded above) into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolatilityNormalization {
    /// `min(v / cap, 1)`.
    Linear { cap: f64 },
    /// Centered logistic `2 / (1 + e^(-k * v)) - 1`; zero at zero, approaches one.
    /// Evaluated as the equivalent `tanh(k * v / 2)` so tiny volatilities stay
    /// above zero.
    Logistic { steepness: f64 },
}

impl VolatilityNormalization {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        match *self {
            VolatilityNormalization::Linear { cap } if !(cap.is_finite() && cap > 0.0) => {
                Err(InvalidInput::InvalidNormalization {
                    reason: format!("cap must be positive, got {cap}"),
                })
            }
            VolatilityNormalization::Logistic { steepness }
                if !(steepness.is_finite() && steepness > 0.0) =>
            {
                Err(InvalidInput::InvalidNormalization {
                    reason: format!("steepness must be positive, got {steepness}"),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn normalize(&self, volatility: f64) -> f64 {
        if volatility <= 0.0 {
            return 0.0;
        }
        let value = match *self {
            VolatilityNormalization::Linear { cap } => volatility / cap,
            VolatilityNormalization::Logistic { steepness } => {
                (steepness * volatility / 2.0).tanh()
            }
        };
        value.clamp(0.0, 1.0)
    }
}

impl Default for VolatilityNormalization {
    fn default() -> Self {
        VolatilityNormalization::Linear {
            cap: DEFAULT_VOLATILITY_CAP,
        }
    }
}

/// What to do with a held asset that has no usable price history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingHistoryPolicy {
    /// Exclude it from the volatility average and emit a data-quality warning.
    #[default]
    Skip,
    /// Fail the whole call with [`InvalidInput::MissingPriceHistory`].
    Fail,
}

impl FromStr for MissingHistoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(MissingHistoryPolicy::Skip),
            "fail" => Ok(MissingHistoryPolicy::Fail),
            other => Err(format!("expected skip or fail, got {other:?}")),
        }
    }
}

impl fmt::Display for MissingHistoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingHistoryPolicy::Skip => write!(f, "skip"),
            MissingHistoryPolicy::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskPolicy {
    pub weights: RiskWeights,
    pub normalization: VolatilityNormalization,
    pub missing_history: MissingHistoryPolicy,
}

impl RiskPolicy {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        RiskWeights::new(self.weights.volatility, self.weights.concentration)?;
        self.normalization.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct AssetContribution {
    pub asset: String,
    pub volatility: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SkippedAsset {
    pub asset: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RiskAssessment {
    pub volatility_risk: f64,
    pub normalized_volatility: f64,
    pub concentration_risk: f64,
    pub overall_risk_score: f64,
    pub contributions: Vec<AssetContribution>,
    pub skipped: Vec<SkippedAsset>,
}

/// Scores a portfolio under `policy`.
///
/// Total on every valid input: an empty or valueless portfolio yields an
/// all-zero assessment. Invalid prices always propagate; missing history is
/// handled by [`RiskPolicy::missing_history`].
pub fn score_portfolio_risk(
    portfolio: &PortfolioSnapshot,
    policy: &RiskPolicy,
    events: &dyn EventPort,
) -> Result<RiskAssessment, InvalidInput> {
    policy.validate()?;

    let mut contributions = Vec::new();
    let mut skipped = Vec::new();

    for (asset, amount) in portfolio.holdings.iter() {
        if amount == 0.0 {
            continue;
        }

        let series = match portfolio.price_history.get(asset) {
            Some(series) if series.len() >= 2 => series,
            other => {
                let reason = match (other, portfolio.unavailable.get(asset)) {
                    (Some(series), _) => SkipReason::InsufficientHistory {
                        points: series.len(),
                    },
                    (None, Some(reason)) => SkipReason::FetchFailed {
                        reason: reason.clone(),
                    },
                    (None, None) => SkipReason::MissingHistory,
                };
                if policy.missing_history == MissingHistoryPolicy::Fail {
                    return Err(InvalidInput::MissingPriceHistory {
                        asset: asset.to_string(),
                    });
                }
                events.emit(&RiskEvent::DataQualityWarning {
                    asset: asset.to_string(),
                    reason: reason.clone(),
                });
                skipped.push(SkippedAsset {
                    asset: asset.to_string(),
                    reason: reason.to_string(),
                });
                continue;
            }
        };

        let volatility = calculate_volatility(series)?;
        events.emit(&RiskEvent::AssetVolatility {
            asset: asset.to_string(),
            volatility,
            weight: amount,
        });
        contributions.push(AssetContribution {
            asset: asset.to_string(),
            volatility,
            weight: amount,
        });
    }

    // Weights are scaled by the largest one so huge amounts cannot overflow.
    let max_weight = contributions.iter().fold(0.0_f64, |m, c| m.max(c.weight));
    let volatility_risk = if max_weight > 0.0 {
        let (weighted, total) = contributions.iter().fold((0.0, 0.0), |(sum, total), c| {
            let w = c.weight / max_weight;
            (sum + w * c.volatility, total + w)
        });
        weighted / total
    } else {
        0.0
    };

    let concentration_risk = calculate_concentration_risk(&portfolio.holdings);
    let normalized_volatility = policy.normalization.normalize(volatility_risk);
    let overall_risk_score = (policy.weights.volatility() * normalized_volatility
        + policy.weights.concentration() * concentration_risk)
        .clamp(0.0, 1.0);

    events.emit(&RiskEvent::RiskScored {
        volatility_risk,
        concentration_risk,
        overall_risk_score,
    });

    Ok(RiskAssessment {
        volatility_risk,
        normalized_volatility,
        concentration_risk,
        overall_risk_score,
        contributions,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_port::NullEventPort;
    use approx::assert_relative_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingEvents {
        events: RefCell<Vec<RiskEvent>>,
    }

    impl EventPort for RecordingEvents {
        fn emit(&self, event: &RiskEvent) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    fn holdings(pairs: &[(&str, f64)]) -> HoldingsMap {
        HoldingsMap::from_pairs(pairs.iter().map(|&(a, v)| (a, v))).unwrap()
    }

    fn score(snapshot: &PortfolioSnapshot) -> RiskAssessment {
        score_portfolio_risk(snapshot, &RiskPolicy::default(), &NullEventPort).unwrap()
    }

    #[test]
    fn empty_portfolio_is_all_zero() {
        let assessment = score(&PortfolioSnapshot::default());
        assert_eq!(assessment, RiskAssessment::default());
    }

    #[test]
    fn valueless_portfolio_is_all_zero() {
        let snapshot = PortfolioSnapshot::new(holdings(&[("BTC", 0.0)]));
        let assessment = score(&snapshot);
        assert_eq!(assessment.overall_risk_score, 0.0);
        assert!(assessment.skipped.is_empty());
    }

    #[test]
    fn single_asset_with_flat_prices() {
        let snapshot = PortfolioSnapshot::new(holdings(&[("USDC", 100.0)]))
            .with_prices("USDC", vec![1.0, 1.0, 1.0]);
        let assessment = score(&snapshot);
        assert_eq!(assessment.volatility_risk, 0.0);
        assert_eq!(assessment.concentration_risk, 1.0);
        assert_relative_eq!(assessment.overall_risk_score, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn volatility_is_amount_weighted() {
        // A: returns +0.1, -0.1 -> vol 0.1; B: flat -> vol 0.
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0), ("B", 3.0)]))
            .with_prices("A", vec![100.0, 110.0, 99.0])
            .with_prices("B", vec![5.0, 5.0, 5.0]);
        let assessment = score(&snapshot);
        assert_relative_eq!(assessment.volatility_risk, 0.025, epsilon = 1e-12);
        assert_eq!(assessment.contributions.len(), 2);
    }

    #[test]
    fn overall_score_combines_normalized_terms() {
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0), ("B", 1.0)]))
            .with_prices("A", vec![100.0, 110.0, 99.0])
            .with_prices("B", vec![100.0, 110.0, 99.0]);
        let assessment = score(&snapshot);
        // vol 0.1 hits the default cap -> normalized 1.0; HHI 0.5
        assert_relative_eq!(assessment.normalized_volatility, 1.0, epsilon = 1e-12);
        assert_relative_eq!(assessment.overall_risk_score, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn missing_history_is_skipped_with_warning() {
        let events = RecordingEvents::default();
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0), ("B", 1.0)]))
            .with_prices("A", vec![100.0, 110.0, 99.0]);

        let assessment =
            score_portfolio_risk(&snapshot, &RiskPolicy::default(), &events).unwrap();

        assert_relative_eq!(assessment.volatility_risk, 0.1, epsilon = 1e-12);
        assert_eq!(
            assessment.skipped,
            vec![SkippedAsset {
                asset: "B".into(),
                reason: "no price history".into(),
            }]
        );
        let warnings: Vec<_> = events
            .events
            .borrow()
            .iter()
            .filter(|e| e.is_warning())
            .cloned()
            .collect();
        assert_eq!(
            warnings,
            vec![RiskEvent::DataQualityWarning {
                asset: "B".into(),
                reason: SkipReason::MissingHistory,
            }]
        );
    }

    #[test]
    fn single_point_history_is_skipped() {
        let snapshot =
            PortfolioSnapshot::new(holdings(&[("A", 1.0)])).with_prices("A", vec![100.0]);
        let assessment = score(&snapshot);
        assert_eq!(assessment.volatility_risk, 0.0);
        assert_eq!(assessment.skipped.len(), 1);
        assert!(assessment.skipped[0].reason.contains("only 1 price point"));
    }

    #[test]
    fn fetch_failure_reason_is_reported() {
        let mut snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0)]));
        snapshot
            .unavailable
            .insert("A".into(), "file not found".into());
        let assessment = score(&snapshot);
        assert_eq!(assessment.skipped[0].reason, "fetch failed: file not found");
    }

    #[test]
    fn missing_history_fails_under_fail_policy() {
        let policy = RiskPolicy {
            missing_history: MissingHistoryPolicy::Fail,
            ..RiskPolicy::default()
        };
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0)]));
        let err = score_portfolio_risk(&snapshot, &policy, &NullEventPort).unwrap_err();
        assert_eq!(err, InvalidInput::MissingPriceHistory { asset: "A".into() });
    }

    #[test]
    fn invalid_prices_are_not_swallowed() {
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0)]))
            .with_prices("A", vec![100.0, 0.0, 100.0]);
        let err = score_portfolio_risk(&snapshot, &RiskPolicy::default(), &NullEventPort)
            .unwrap_err();
        assert!(matches!(err, InvalidInput::InvalidPrice { index: 1, .. }));
    }

    #[test]
    fn history_for_unheld_assets_is_ignored() {
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0)]))
            .with_prices("A", vec![1.0, 1.0])
            .with_prices("Z", vec![100.0, 0.0, 1.0]);
        let assessment = score(&snapshot);
        assert_eq!(assessment.contributions.len(), 1);
    }

    #[test]
    fn scored_event_is_emitted_last() {
        let events = RecordingEvents::default();
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0)]))
            .with_prices("A", vec![100.0, 110.0, 99.0]);
        let assessment = score_portfolio_risk(&snapshot, &RiskPolicy::default(), &events).unwrap();

        let recorded = events.events.borrow();
        assert_eq!(recorded.len(), 2);
        assert!(matches!(recorded[0], RiskEvent::AssetVolatility { ref asset, .. } if asset == "A"));
        assert_eq!(
            recorded[1],
            RiskEvent::RiskScored {
                volatility_risk: assessment.volatility_risk,
                concentration_risk: assessment.concentration_risk,
                overall_risk_score: assessment.overall_risk_score,
            }
        );
    }

    #[test]
    fn weights_must_sum_to_one() {
        assert!(RiskWeights::new(0.3, 0.7).is_ok());
        assert!(matches!(
            RiskWeights::new(0.6, 0.6),
            Err(InvalidInput::InvalidWeights { .. })
        ));
        assert!(matches!(
            RiskWeights::new(-0.5, 1.5),
            Err(InvalidInput::InvalidWeights { .. })
        ));
        assert!(RiskWeights::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn custom_weights_change_overall_score() {
        let policy = RiskPolicy {
            weights: RiskWeights::new(0.2, 0.8).unwrap(),
            ..RiskPolicy::default()
        };
        // vol 0.1 -> normalized 1.0 under the default cap; one asset -> HHI 1.0
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0)]))
            .with_prices("A", vec![100.0, 110.0, 99.0]);
        let assessment = score_portfolio_risk(&snapshot, &policy, &NullEventPort).unwrap();
        assert_relative_eq!(assessment.overall_risk_score, 1.0, epsilon = 1e-12);

        let policy = RiskPolicy {
            weights: RiskWeights::new(0.2, 0.8).unwrap(),
            normalization: VolatilityNormalization::Linear { cap: 0.4 },
            ..RiskPolicy::default()
        };
        let assessment = score_portfolio_risk(&snapshot, &policy, &NullEventPort).unwrap();
        assert_relative_eq!(assessment.overall_risk_score, 0.2 * 0.25 + 0.8, epsilon = 1e-12);
    }

    #[test]
    fn zero_weight_is_rejected() {
        assert!(matches!(
            RiskWeights::new(1.0, 0.0),
            Err(InvalidInput::InvalidWeights { .. })
        ));
        assert!(matches!(
            RiskWeights::new(0.0, 1.0),
            Err(InvalidInput::InvalidWeights { .. })
        ));
    }

    #[test]
    fn tiny_volatility_normalizes_above_zero() {
        let norm = VolatilityNormalization::Logistic { steepness: 20.0 };
        assert!(norm.normalize(1e-20) > 0.0);
        assert!(VolatilityNormalization::default().normalize(1e-300) > 0.0);
    }

    #[test]
    fn extreme_amounts_keep_scores_bounded() {
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1e308), ("B", 1e308)]))
            .with_prices("A", vec![100.0, 110.0, 99.0])
            .with_prices("B", vec![100.0, 110.0, 99.0]);
        let assessment = score(&snapshot);
        assert_relative_eq!(assessment.concentration_risk, 0.5, epsilon = 1e-12);
        assert_relative_eq!(assessment.volatility_risk, 0.1, epsilon = 1e-12);
        assert!((0.0..=1.0).contains(&assessment.overall_risk_score));
    }

    #[test]
    fn overflowing_returns_are_invalid_input() {
        let snapshot = PortfolioSnapshot::new(holdings(&[("A", 1.0)]))
            .with_prices("A", vec![1e-300, 1e300, 1e-300]);
        let result = score_portfolio_risk(&snapshot, &RiskPolicy::default(), &NullEventPort);
        assert_eq!(result, Err(InvalidInput::NonFiniteReturn { index: 0 }));
    }

    #[test]
    fn linear_normalization_caps_at_one() {
        let norm = VolatilityNormalization::Linear { cap: 0.2 };
        assert_eq!(norm.normalize(0.0), 0.0);
        assert_relative_eq!(norm.normalize(0.05), 0.25, epsilon = 1e-12);
        assert_eq!(norm.normalize(0.5), 1.0);
    }

    #[test]
    fn logistic_normalization_is_centered() {
        let norm = VolatilityNormalization::Logistic { steepness: 20.0 };
        assert_eq!(norm.normalize(0.0), 0.0);
        let low = norm.normalize(0.01);
        let high = norm.normalize(0.1);
        assert!(low > 0.0 && low < high && high < 1.0);
        assert_relative_eq!(low, (20.0_f64 * 0.01 / 2.0).tanh(), epsilon = 1e-12);
    }

    #[test]
    fn normalization_validation() {
        assert!(VolatilityNormalization::Linear { cap: 0.0 }.validate().is_err());
        assert!(VolatilityNormalization::Logistic { steepness: -1.0 }.validate().is_err());
        assert!(VolatilityNormalization::default().validate().is_ok());
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = RiskPolicy {
            normalization: VolatilityNormalization::Linear { cap: f64::NAN },
            ..RiskPolicy::default()
        };
        let result = score_portfolio_risk(&PortfolioSnapshot::default(), &policy, &NullEventPort);
        assert!(matches!(result, Err(InvalidInput::InvalidNormalization { .. })));
    }

    #[test]
    fn missing_history_policy_parses() {
        assert_eq!("skip".parse::<MissingHistoryPolicy>(), Ok(MissingHistoryPolicy::Skip));
        assert_eq!(" FAIL ".parse::<MissingHistoryPolicy>(), Ok(MissingHistoryPolicy::Fail));
        assert!("ignore".parse::<MissingHistoryPolicy>().is_err());
        assert_eq!(MissingHistoryPolicy::Fail.to_string(), "fail");
    }
}
