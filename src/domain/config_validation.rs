//! Configuration validation.
//!
//! Validates all config fields before an analysis runs.

use crate::domain::assets::parse_assets;
use crate::domain::error::AstraportError;
use crate::domain::risk::{
    MissingHistoryPolicy, DEFAULT_LOGISTIC_STEEPNESS, DEFAULT_VOLATILITY_CAP,
};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    validate_data_path(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    validate_weights(config)?;
    validate_normalization(config)?;
    validate_missing_history(config)?;
    Ok(())
}

pub fn validate_allocation_config(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    validate_stable_assets(config)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> AstraportError {
    AstraportError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AstraportError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid("data", "start_date", "start_date must not be after end_date"));
        }
    }
    Ok(())
}

/// Reads an optional `YYYY-MM-DD` date from the `[data]` section.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, AstraportError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("data", key, format!("invalid {key} format, expected YYYY-MM-DD"))),
    }
}

/// Reads a number from `[section] key`, falling back to `default` when the key
/// is absent or blank. Anything else that does not parse is a config error.
pub fn parse_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, AstraportError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) if s.trim().is_empty() => Ok(default),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(section, key, format!("{key} must be a number, got {s:?}"))),
    }
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    let volatility = parse_number(config, "risk", "volatility_weight", 0.5)?;
    let concentration = parse_number(config, "risk", "concentration_weight", 0.5)?;

    for (key, value) in [
        ("volatility_weight", volatility),
        ("concentration_weight", concentration),
    ] {
        if !(value > 0.0 && value <= 1.0) {
            return Err(invalid(
                "risk",
                key,
                format!("{key} must be greater than 0 and at most 1"),
            ));
        }
    }

    if ((volatility + concentration) - 1.0).abs() > 1e-9 {
        return Err(invalid(
            "risk",
            "volatility_weight",
            "volatility_weight and concentration_weight must sum to 1",
        ));
    }
    Ok(())
}

fn validate_normalization(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    let kind = config
        .get_string("risk", "normalization")
        .unwrap_or_else(|| "linear".to_string());

    match kind.trim().to_lowercase().as_str() {
        "linear" => {
            let cap = parse_number(config, "risk", "volatility_cap", DEFAULT_VOLATILITY_CAP)?;
            if !(cap.is_finite() && cap > 0.0) {
                return Err(invalid("risk", "volatility_cap", "volatility_cap must be positive"));
            }
        }
        "logistic" => {
            let steepness =
                parse_number(config, "risk", "logistic_steepness", DEFAULT_LOGISTIC_STEEPNESS)?;
            if !(steepness.is_finite() && steepness > 0.0) {
                return Err(invalid(
                    "risk",
                    "logistic_steepness",
                    "logistic_steepness must be positive",
                ));
            }
        }
        other => {
            return Err(invalid(
                "risk",
                "normalization",
                format!("unknown normalization {other:?}, expected linear or logistic"),
            ));
        }
    }
    Ok(())
}

fn validate_missing_history(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    if let Some(value) = config.get_string("risk", "missing_history") {
        value
            .parse::<MissingHistoryPolicy>()
            .map_err(|reason| invalid("risk", "missing_history", reason))?;
    }
    Ok(())
}

fn validate_stable_assets(config: &dyn ConfigPort) -> Result<(), AstraportError> {
    match config.get_string("allocation", "stable_assets") {
        Some(s) if !s.trim().is_empty() => parse_assets(&s)
            .map(|_| ())
            .map_err(|e| invalid("allocation", "stable_assets", e.to_string())),
        _ => Ok(()),
    }
}
