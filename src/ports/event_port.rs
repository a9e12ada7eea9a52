//! Structured event sink port.

use crate::domain::event::RiskEvent;

pub trait EventPort {
    fn emit(&self, event: &RiskEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventPort;

impl EventPort for NullEventPort {
    fn emit(&self, _event: &RiskEvent) {}
}
