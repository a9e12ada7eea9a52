//! JSON report adapter implementing ReportPort.

use crate::domain::analysis::PortfolioAnalysis;
use crate::domain::error::AstraportError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportAdapter {
    pub pretty: bool,
}

impl ReportPort for JsonReportAdapter {
    fn render(&self, analysis: &PortfolioAnalysis) -> Result<String, AstraportError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(analysis)
        } else {
            serde_json::to_string(analysis)
        };
        rendered.map_err(|e| AstraportError::Io(std::io::Error::other(e)))
    }
}
