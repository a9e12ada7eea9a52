//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "json")]
pub mod json_report_adapter;
pub mod text_report_adapter;
pub mod tracing_event_adapter;
