//! Port traits through which the domain reaches its collaborators.

pub mod config_port;
pub mod data_port;
pub mod event_port;
pub mod report_port;
