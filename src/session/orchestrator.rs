//! # Session Orchestrator
//!
//! One task owns the device and the session state. User operations reach it
//! as commands on a queue and run strictly one at a time; the heartbeat runs
//! on the same task between commands.
//!
//! ```text
//!   SessionHandle ──Command──▶ ┌──────────────────────┐ ──▶ DeviceHandle
//!   SessionHandle ──Command──▶ │  Orchestrator task   │
//!                              │  (commands + ticker) │ ──SessionEvent──▶ controller
//!                              └──────────────────────┘ ──snapshot (watch)──▶ anyone
//! ```
//!
//! ## Ordering
//!
//! - Queued commands are always served before a heartbeat tick.
//! - A heartbeat in flight is abandoned as soon as a command arrives, so a
//!   hung device query never delays connect, disconnect or print, and a
//!   stale observation is never applied over a newer transition. The
//!   abandoned heartbeat is retried once the queue is empty instead of
//!   waiting for the next interval.
//! - No heartbeat is issued while a print is running; the print occupies the
//!   task until the device answers.
//! - Events are emitted from the task itself, in transition order, before
//!   the operation's reply is sent.
//!
//! ## Teardown
//!
//! The task ends when every [`SessionHandle`] is dropped or
//! [`SessionHandle::shutdown`] is called. The device is dropped with it.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::event::{EventStream, SessionEvent};
use super::request::PrintRequest;
use super::state::{ConnectionState, HeartbeatSample, PrintJobState, SessionSnapshot};
use crate::device::{DeviceHandle, Heartbeat};
use crate::error::EtiquetaError;
use crate::printer::DeviceTarget;

/// Default time between heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Callers wait in `send` once this many commands are queued.
const COMMAND_QUEUE_DEPTH: usize = 16;

type Reply = oneshot::Sender<Result<bool, EtiquetaError>>;

enum Command {
    Connect { target: DeviceTarget, reply: Reply },
    Disconnect { reply: Reply },
    Print { request: PrintRequest, reply: Reply },
    Shutdown,
}

enum Tick {
    Done,
    Preempted(Command),
    Closed,
}

/// Owner of the device session. Created and driven by [`Orchestrator::spawn`].
pub struct Orchestrator<D: DeviceHandle> {
    device: D,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshot: watch::Sender<SessionSnapshot>,
    heartbeat_interval: Duration,
    connection: ConnectionState,
    print_job: PrintJobState,
    target: Option<DeviceTarget>,
}

impl<D: DeviceHandle> Orchestrator<D> {
    /// Start a session on the current tokio runtime.
    ///
    /// The session starts Disconnected and Idle. The first heartbeat tick
    /// fires immediately.
    pub fn spawn(device: D, heartbeat_interval: Duration) -> (SessionHandle, EventStream) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let orchestrator = Self {
            device,
            commands: command_rx,
            events: event_tx,
            snapshot: snapshot_tx,
            heartbeat_interval,
            connection: ConnectionState::Disconnected,
            print_job: PrintJobState::Idle,
            target: None,
        };
        tokio::spawn(orchestrator.run());

        let handle = SessionHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        };
        (handle, event_rx)
    }

    async fn run(mut self) {
        let mut ticker = time::interval(self.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.heartbeat_interval, "Session started");

        loop {
            let command = tokio::select! {
                biased;
                command = self.commands.recv() => command,
                _ = ticker.tick() => match self.heartbeat_tick().await {
                    Tick::Done => continue,
                    Tick::Preempted(command) => {
                        // Retry the lost observation as soon as the queue is empty
                        ticker.reset_immediately();
                        Some(command)
                    }
                    Tick::Closed => None,
                },
            };
            match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => self.dispatch(command).await,
            }
        }

        info!("Session closed");
    }

    async fn dispatch(&mut self, command: Command) {
        match command {
            Command::Connect { target, reply } => {
                let result = self.connect(target).await;
                let _ = reply.send(result);
            }
            Command::Disconnect { reply } => {
                let result = self.disconnect().await;
                let _ = reply.send(result);
            }
            Command::Print { request, reply } => {
                let result = self.print(request).await;
                let _ = reply.send(result);
            }
            Command::Shutdown => {}
        }
    }

    async fn connect(&mut self, target: DeviceTarget) -> Result<bool, EtiquetaError> {
        if self.connection != ConnectionState::Disconnected {
            return Err(EtiquetaError::Precondition(format!(
                "connect requires a disconnected session, session is {}",
                self.connection
            )));
        }
        self.require_idle("connect")?;

        info!(%target, "Connecting");
        self.set_connection(ConnectionState::Connecting);

        let connected = match self.device.connect(&target).await {
            Ok(true) => true,
            Ok(false) => {
                warn!(%target, "Device refused connection");
                false
            }
            Err(e) => {
                warn!(%target, error = %e, "Connect failed");
                false
            }
        };

        if connected {
            info!(%target, "Connected");
            self.target = Some(target);
            self.set_connection(ConnectionState::Connected);
        } else {
            self.set_connection(ConnectionState::Disconnected);
        }
        self.emit(SessionEvent::ConnectionChanged {
            connected,
            raw: None,
        });
        Ok(connected)
    }

    async fn disconnect(&mut self) -> Result<bool, EtiquetaError> {
        if self.connection != ConnectionState::Connected {
            return Err(EtiquetaError::Precondition(format!(
                "disconnect requires a connected session, session is {}",
                self.connection
            )));
        }
        self.require_idle("disconnect")?;

        info!("Disconnecting");
        self.set_connection(ConnectionState::Disconnecting);

        let reported = match self.device.disconnect().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "Disconnect failed");
                false
            }
        };
        if !reported {
            warn!("Device did not confirm disconnect; session is disconnected anyway");
        }

        self.target = None;
        self.set_connection(ConnectionState::Disconnected);
        self.emit(SessionEvent::ConnectionChanged {
            connected: false,
            raw: None,
        });
        Ok(reported)
    }

    async fn print(&mut self, request: PrintRequest) -> Result<bool, EtiquetaError> {
        self.require_idle("print")?;

        let (width, height) = request.image().dimensions();
        info!(
            job = %request.id(),
            width,
            height,
            density = request.density(),
            quantity = request.quantity(),
            "Printing"
        );
        self.set_print_job(PrintJobState::InProgress);

        let success = match self
            .device
            .print(request.image(), request.density(), request.quantity())
            .await
        {
            Ok(ok) => ok,
            Err(e) => {
                warn!(job = %request.id(), error = %e, "Print failed");
                false
            }
        };

        self.set_print_job(PrintJobState::Idle);
        if success {
            info!(job = %request.id(), "Print completed");
        } else {
            warn!(job = %request.id(), "Printer reported failure");
        }
        self.emit(SessionEvent::PrintCompleted { success });
        Ok(success)
    }

    /// Run one heartbeat, giving way to any command that arrives meanwhile.
    async fn heartbeat_tick(&mut self) -> Tick {
        if self.print_job == PrintJobState::InProgress {
            return Tick::Done;
        }
        if self.connection != ConnectionState::Connected {
            self.emit(SessionEvent::ConnectionChanged {
                connected: false,
                raw: None,
            });
            return Tick::Done;
        }

        let reply = tokio::select! {
            biased;
            command = self.commands.recv() => {
                return match command {
                    Some(command) => {
                        debug!("Heartbeat abandoned for incoming command");
                        Tick::Preempted(command)
                    }
                    None => Tick::Closed,
                };
            }
            reply = self.device.heartbeat() => reply,
        };

        self.apply_heartbeat(reply);
        Tick::Done
    }

    fn apply_heartbeat(&mut self, reply: Result<Heartbeat, EtiquetaError>) {
        let sample = match reply {
            Ok(Heartbeat { state, raw }) => HeartbeatSample::now(state, Some(raw)),
            Err(e) => {
                warn!(error = %e, "Heartbeat failed, treating device as disconnected");
                HeartbeatSample::now(ConnectionState::Disconnected, None)
            }
        };
        debug!(state = %sample.state, raw = ?sample.raw, "Heartbeat");

        let connected = sample.state.is_connected();
        if !connected {
            if let Some(target) = self.target.take() {
                warn!(%target, "Device lost");
            }
            self.set_connection(ConnectionState::Disconnected);
        }
        let raw = sample.raw.clone();
        self.snapshot
            .send_modify(|snapshot| snapshot.last_heartbeat = Some(sample));
        self.emit(SessionEvent::ConnectionChanged { connected, raw });
    }

    fn require_idle(&self, operation: &str) -> Result<(), EtiquetaError> {
        if self.print_job == PrintJobState::InProgress {
            return Err(EtiquetaError::Precondition(format!(
                "{} while a print job is in progress",
                operation
            )));
        }
        Ok(())
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.connection != state {
            debug!(from = %self.connection, to = %state, "Connection state");
        }
        self.connection = state;
        let target = self.target.clone();
        self.snapshot.send_modify(|snapshot| {
            snapshot.connection = state;
            snapshot.target = target;
        });
    }

    fn set_print_job(&mut self, state: PrintJobState) {
        self.print_job = state;
        self.snapshot
            .send_modify(|snapshot| snapshot.print_job = state);
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("No event listener");
        }
    }
}

/// Cloneable handle to a running session.
///
/// Operations resolve once the session has finished them. `Ok(false)` means
/// the device failed; `Err` means the request was refused (precondition) or
/// the session is gone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Connect to `target`. Requires a Disconnected session.
    pub async fn connect(&self, target: DeviceTarget) -> Result<bool, EtiquetaError> {
        self.request(|reply| Command::Connect { target, reply }).await
    }

    /// Disconnect. Requires a Connected session; always ends Disconnected.
    ///
    /// The result is the device's own report.
    pub async fn disconnect(&self) -> Result<bool, EtiquetaError> {
        self.request(|reply| Command::Disconnect { reply }).await
    }

    /// Print a validated request. The session is Idle again when this resolves.
    pub async fn print(&self, request: PrintRequest) -> Result<bool, EtiquetaError> {
        self.request(|reply| Command::Print { request, reply }).await
    }

    /// Stop the session task once queued commands ahead of it are done.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.snapshot.borrow().connection
    }

    pub fn print_job(&self) -> PrintJobState {
        self.snapshot.borrow().print_job
    }

    /// Subscribe to state snapshots.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<F>(&self, make: F) -> Result<bool, EtiquetaError>
    where
        F: FnOnce(Reply) -> Command,
    {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| EtiquetaError::SessionClosed)?;
        response.await.map_err(|_| EtiquetaError::SessionClosed)?
    }
}

// ============================================================================
// TESTS
// ============================================================================
