//! Session state types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::printer::DeviceTarget;

/// Connection lifecycle of the one device session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        };
        f.write_str(name)
    }
}

/// Whether a print job currently owns the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintJobState {
    #[default]
    Idle,
    InProgress,
}

/// Device status fields exactly as the printer reported them.
///
/// The session never interprets these; they are forwarded to the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatus(pub BTreeMap<String, i64>);

impl RawStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: i64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One heartbeat observation.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatSample {
    pub state: ConnectionState,
    pub raw: Option<RawStatus>,
    pub at: DateTime<Utc>,
}

impl HeartbeatSample {
    pub fn now(state: ConnectionState, raw: Option<RawStatus>) -> Self {
        Self {
            state,
            raw,
            at: Utc::now(),
        }
    }
}

/// Point-in-time copy of the session state, published after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub print_job: PrintJobState,
    /// Target of the current connection, if any
    pub target: Option<DeviceTarget>,
    pub last_heartbeat: Option<HeartbeatSample>,
}
