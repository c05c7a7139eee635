//! Events emitted by the session to its controller.

use tokio::sync::mpsc;

use super::state::RawStatus;

/// A state change the presentation layer may want to show.
///
/// Events arrive in the order of the transitions that caused them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connection state settled or a heartbeat reported in.
    ///
    /// `raw` is present only for heartbeat observations.
    ConnectionChanged {
        connected: bool,
        raw: Option<RawStatus>,
    },
    /// A print job finished, successfully or not.
    PrintCompleted { success: bool },
}

/// Receiving end of a session's events.
pub type EventStream = mpsc::UnboundedReceiver<SessionEvent>;
