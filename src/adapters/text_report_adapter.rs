//! Plain `key = value` report adapter implementing ReportPort.

use crate::domain::analysis::PortfolioAnalysis;
use crate::domain::error::AstraportError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy)]
pub struct TextReportAdapter {
    precision: usize,
}

impl TextReportAdapter {
    pub fn new(precision: usize) -> Self {
        Self { precision }
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new(6)
    }
}

impl ReportPort for TextReportAdapter {
    fn render(&self, analysis: &PortfolioAnalysis) -> Result<String, AstraportError> {
        let p = self.precision;
        let risk = &analysis.risk;
        let mut out = String::new();

        out.push_str(&format!("wallet = {}\n", analysis.wallet));
        out.push_str(&format!("profile = {}\n", analysis.profile));
        out.push_str(&format!("volatility_risk = {:.p$}\n", risk.volatility_risk));
        out.push_str(&format!("normalized_volatility = {:.p$}\n", risk.normalized_volatility));
        out.push_str(&format!("concentration_risk = {:.p$}\n", risk.concentration_risk));
        out.push_str(&format!("overall_risk_score = {:.p$}\n", risk.overall_risk_score));

        for c in &risk.contributions {
            out.push_str(&format!("contribution.{}.volatility = {:.p$}\n", c.asset, c.volatility));
            out.push_str(&format!("contribution.{}.weight = {:.p$}\n", c.asset, c.weight));
        }
        for s in &risk.skipped {
            out.push_str(&format!("skipped.{} = {}\n", s.asset, s.reason));
        }

        for (bucket, weight) in analysis.target_allocation.as_weights() {
            out.push_str(&format!("target.{} = {:.p$}\n", bucket, weight));
        }
        for (bucket, value) in &analysis.current_allocation {
            out.push_str(&format!("current.{} = {:.p$}\n", bucket, value));
        }
        for (bucket, amount) in &analysis.rebalancing_actions {
            out.push_str(&format!("rebalance.{} = {:.p$}\n", bucket, amount));
        }

        for (a, row) in &analysis.correlation {
            for (b, value) in row {
                if a < b {
                    out.push_str(&format!("correlation.{}.{} = {:.p$}\n", a, b, value));
                }
            }
        }

        Ok(out)
    }
}
