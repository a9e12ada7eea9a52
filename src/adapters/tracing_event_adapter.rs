//! Forwards domain events to `tracing` with structured fields.

use tracing::{debug, info, warn};

use crate::domain::event::RiskEvent;
use crate::ports::event_port::EventPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventAdapter;

impl EventPort for TracingEventAdapter {
    fn emit(&self, event: &RiskEvent) {
        match event {
            RiskEvent::DataQualityWarning { asset, reason } => {
                warn!(asset = %asset, reason = %reason, "asset excluded from volatility aggregate");
            }
            RiskEvent::AssetVolatility {
                asset,
                volatility,
                weight,
            } => {
                debug!(asset = %asset, volatility, weight, "asset volatility");
            }
            RiskEvent::RiskScored {
                volatility_risk,
                concentration_risk,
                overall_risk_score,
            } => {
                info!(
                    volatility_risk,
                    concentration_risk, overall_risk_score, "portfolio risk scored"
                );
            }
            RiskEvent::ProfileFallback { requested, used } => {
                warn!(requested = %requested, used = %used, "unknown risk profile, using default");
            }
        }
    }
}
