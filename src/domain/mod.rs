//! Core domain types and logic.

pub mod price_series;
pub mod volatility;
pub mod holdings;
pub mod concentration;
pub mod risk;
pub mod event;
pub mod allocation;
pub mod correlation;
pub mod assets;
pub mod analysis;
pub mod config_validation;
pub mod error;
