//! # Printer Session
//!
//! The asynchronous core: one long-lived session per printer connection.
//!
//! ## Modules
//!
//! - [`state`]: Connection and print-job state, heartbeat samples, snapshots
//! - [`event`]: Events sent to the controller
//! - [`request`]: Validated print requests
//! - [`orchestrator`]: The session task and its handle
//!
//! ## State Machine
//!
//! ```text
//!              connect ok                     disconnect
//! Disconnected ──────────▶ Connecting ──▶ Connected ──────▶ Disconnecting
//!      ▲  ▲      connect failed │               │                │
//!      │  └─────────────────────┘               │ heartbeat      │
//!      │◀───────────────────────────────────────┘ failure        │
//!      └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Print jobs are orthogonal: `Idle ──▶ InProgress ──▶ Idle`, and while a job
//! is in progress nothing else reaches the device.

pub mod event;
pub mod orchestrator;
pub mod request;
pub mod state;

pub use event::{EventStream, SessionEvent};
pub use orchestrator::{HEARTBEAT_INTERVAL, Orchestrator, SessionHandle};
pub use request::{MAX_QUANTITY, PrintRequest};
pub use state::{ConnectionState, HeartbeatSample, PrintJobState, RawStatus, SessionSnapshot};
