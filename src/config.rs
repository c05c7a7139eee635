//! Session configuration.

use std::time::Duration;

use crate::error::EtiquetaError;
use crate::printer::{DeviceModel, DeviceTable, DeviceTarget};
use crate::session::HEARTBEAT_INTERVAL;

/// Everything a controller needs to run one printer session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub target: DeviceTarget,
    pub model: DeviceModel,
    pub heartbeat_interval: Duration,
}

impl SessionConfig {
    /// Resolve `model_key` against `table` and validate `address`.
    pub fn new(table: &DeviceTable, model_key: &str, address: &str) -> Result<Self, EtiquetaError> {
        let model = table.require(model_key)?.clone();
        let target = DeviceTarget::new(address)?;
        Ok(Self {
            target,
            model,
            heartbeat_interval: HEARTBEAT_INTERVAL,
        })
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Result<Self, EtiquetaError> {
        if interval.is_zero() {
            return Err(EtiquetaError::Config(
                "Heartbeat interval must be positive".to_string(),
            ));
        }
        self.heartbeat_interval = interval;
        Ok(self)
    }
}
