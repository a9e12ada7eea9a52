//! Structured events emitted while analysing a portfolio.
//!
//! Events are handed to an [`EventPort`](crate::ports::event_port::EventPort)
//! supplied by the caller; the domain never writes to a global logger.

use std::fmt;

/// Why an asset was left out of an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingHistory,
    InsufficientHistory { points: usize },
    FetchFailed { reason: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingHistory => write!(f, "no price history"),
            SkipReason::InsufficientHistory { points } => {
                write!(f, "only {points} price point(s), need at least 2")
            }
            SkipReason::FetchFailed { reason } => write!(f, "fetch failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RiskEvent {
    /// Non-fatal: an asset was excluded from the volatility aggregate.
    DataQualityWarning { asset: String, reason: SkipReason },
    AssetVolatility { asset: String, volatility: f64, weight: f64 },
    RiskScored {
        volatility_risk: f64,
        concentration_risk: f64,
        overall_risk_score: f64,
    },
    /// An unrecognised risk profile label was replaced by the default profile.
    ProfileFallback { requested: String, used: String },
}

impl RiskEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RiskEvent::DataQualityWarning { .. } | RiskEvent::ProfileFallback { .. }
        )
    }
}
