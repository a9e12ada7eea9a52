//! Report generation port trait.

use std::fs;
use std::path::Path;

use crate::domain::analysis::PortfolioAnalysis;
use crate::domain::error::AstraportError;

/// Port for rendering an analysis into a structured text format.
pub trait ReportPort {
    fn render(&self, analysis: &PortfolioAnalysis) -> Result<String, AstraportError>;

    /// Default implementation: renders and writes the result to `output_path`.
    fn write(&self, analysis: &PortfolioAnalysis, output_path: &Path) -> Result<(), AstraportError> {
        let content = self.render(analysis)?;
        fs::write(output_path, content)?;
        Ok(())
    }
}
