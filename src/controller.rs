//! # Session Controller
//!
//! The UI-facing facade. It turns button presses into session operations,
//! keeps the buttons' enabled state honest while an operation is pending,
//! and forwards session events to a [`Presenter`].
//!
//! The controller decides between connect and disconnect by looking at the
//! session state before dispatching; the session itself never arbitrates.

use std::path::Path;

use tracing::{debug, info};

use crate::compose::{CanvasSnapshot, CompositeImage, export_to_image, rotate_for_feed};
use crate::config::SessionConfig;
use crate::error::EtiquetaError;
use crate::session::{EventStream, PrintRequest, SessionEvent, SessionHandle};

/// What pressing the connect button will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAction {
    Connect,
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectButton {
    pub action: ConnectAction,
    pub enabled: bool,
}

impl ConnectButton {
    const IDLE: Self = Self {
        action: ConnectAction::Connect,
        enabled: true,
    };
}

/// Presentation layer driven by the controller.
pub trait Presenter {
    /// Status bar connection indicator.
    fn connection_status(&mut self, connected: bool);

    fn connect_button(&mut self, button: ConnectButton);

    fn print_button(&mut self, enabled: bool);

    /// Outcome of the last print job.
    fn print_result(&mut self, success: bool);
}

/// Presenter that writes everything to the log.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn connection_status(&mut self, connected: bool) {
        info!(connected, "Status");
    }

    fn connect_button(&mut self, button: ConnectButton) {
        debug!(action = ?button.action, enabled = button.enabled, "Connect button");
    }

    fn print_button(&mut self, enabled: bool) {
        debug!(enabled, "Print button");
    }

    fn print_result(&mut self, success: bool) {
        info!(success, "Print finished");
    }
}

pub struct SessionController<P: Presenter> {
    session: SessionHandle,
    config: SessionConfig,
    presenter: P,
    connect_button: ConnectButton,
    print_enabled: bool,
}

impl<P: Presenter> SessionController<P> {
    pub fn new(session: SessionHandle, config: SessionConfig, mut presenter: P) -> Self {
        presenter.connect_button(ConnectButton::IDLE);
        presenter.print_button(true);
        Self {
            session,
            config,
            presenter,
            connect_button: ConnectButton::IDLE,
            print_enabled: true,
        }
    }

    /// Connect button pressed.
    ///
    /// Returns whether the session is connected afterwards.
    pub async fn toggle_connection(&mut self) -> Result<bool, EtiquetaError> {
        self.set_connect_button(ConnectButton {
            enabled: false,
            ..self.connect_button
        });

        let result = if self.session.connection_state().is_connected() {
            self.session.disconnect().await
        } else {
            self.session.connect(self.config.target.clone()).await
        };

        let connected = self.session.connection_state().is_connected();
        self.set_connect_button(ConnectButton {
            action: if connected {
                ConnectAction::Disconnect
            } else {
                ConnectAction::Connect
            },
            enabled: true,
        });
        result?;
        self.presenter.connection_status(connected);
        Ok(connected)
    }

    /// Save button pressed: export the bounding region to a PNG.
    pub fn save_image<Q: AsRef<Path>>(
        &self,
        snapshot: &CanvasSnapshot,
        region: &str,
        path: Q,
    ) -> Result<CompositeImage, EtiquetaError> {
        let label = export_to_image(snapshot, region)?;
        label.save_png(&path)?;
        info!(path = %path.as_ref().display(), "Saved label");
        Ok(label)
    }

    /// Print button pressed.
    ///
    /// The label is exported and rotated into feed orientation before the
    /// request is validated, so a bad region or bad settings never reach the
    /// session. The print button stays disabled until the job is done.
    pub async fn print_label(
        &mut self,
        snapshot: &CanvasSnapshot,
        region: &str,
        density: u8,
        quantity: u8,
    ) -> Result<bool, EtiquetaError> {
        let label = export_to_image(snapshot, region)?;
        let image = rotate_for_feed(label.image());
        let request = PrintRequest::new(image, density, quantity, &self.config.model)?;

        self.set_print_button(false);
        let result = self.session.print(request).await;
        self.set_print_button(true);
        result
    }

    /// Dispatch one session event to the presenter.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ConnectionChanged { connected, .. } => {
                // A pending toggle owns the button until it settles
                if !connected && self.connect_button.enabled {
                    self.set_connect_button(ConnectButton::IDLE);
                }
                self.presenter.connection_status(connected);
            }
            SessionEvent::PrintCompleted { success } => {
                self.presenter.print_result(success);
            }
        }
    }

    /// Dispatch every event already waiting on `events`.
    pub fn pump(&mut self, events: &mut EventStream) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn connect_button(&self) -> ConnectButton {
        self.connect_button
    }

    pub fn print_enabled(&self) -> bool {
        self.print_enabled
    }

    fn set_connect_button(&mut self, button: ConnectButton) {
        self.connect_button = button;
        self.presenter.connect_button(button);
    }

    fn set_print_button(&mut self, enabled: bool) {
        self.print_enabled = enabled;
        self.presenter.print_button(enabled);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{BoundingRegion, CanvasItem};
    use crate::device::{SimulatedPrinter, SimulatorProbe};
    use crate::error::CompositingError;
    use crate::printer::DeviceTable;
    use crate::session::Orchestrator;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Shown {
        Status(bool),
        Connect(ConnectButton),
        Print(bool),
        Result(bool),
    }

    #[derive(Debug, Default)]
    struct Recorder {
        shown: Vec<Shown>,
    }

    impl Presenter for Recorder {
        fn connection_status(&mut self, connected: bool) {
            self.shown.push(Shown::Status(connected));
        }

        fn connect_button(&mut self, button: ConnectButton) {
            self.shown.push(Shown::Connect(button));
        }

        fn print_button(&mut self, enabled: bool) {
            self.shown.push(Shown::Print(enabled));
        }

        fn print_result(&mut self, success: bool) {
            self.shown.push(Shown::Result(success));
        }
    }

    fn setup() -> (SessionController<Recorder>, EventStream, SimulatorProbe) {
        let config = SessionConfig::new(&DeviceTable::built_in(), "d110", "00:11:22:33:44:55")
            .unwrap();
        let (device, probe) = SimulatedPrinter::new();
        let (session, events) = Orchestrator::spawn(device, config.heartbeat_interval);
        (
            SessionController::new(session, config, Recorder::default()),
            events,
            probe,
        )
    }

    fn canvas() -> CanvasSnapshot {
        CanvasSnapshot::new(120, 60)
            .with_item(CanvasItem::text(
                "title",
                4.0,
                4.0,
                RgbaImage::from_pixel(30, 10, Rgba([0, 0, 0, 255])),
            ))
            .with_region(BoundingRegion::new("label", 0.0, 0.0, 96.0, 40.0))
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_connects_then_disconnects() {
        let (mut controller, _events, probe) = setup();

        assert!(controller.toggle_connection().await.unwrap());
        assert_eq!(
            controller.connect_button(),
            ConnectButton {
                action: ConnectAction::Disconnect,
                enabled: true
            }
        );
        assert!(probe.is_connected());

        assert!(!controller.toggle_connection().await.unwrap());
        assert_eq!(controller.connect_button(), ConnectButton::IDLE);
        assert_eq!(probe.disconnect_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_disables_button_while_pending() {
        let (mut controller, _events, _probe) = setup();
        controller.toggle_connection().await.unwrap();

        let shown = &controller.presenter().shown;
        assert_eq!(
            &shown[2..],
            &[
                Shown::Connect(ConnectButton {
                    action: ConnectAction::Connect,
                    enabled: false
                }),
                Shown::Connect(ConnectButton {
                    action: ConnectAction::Disconnect,
                    enabled: true
                }),
                Shown::Status(true),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_connect_restores_button() {
        let (mut controller, _events, probe) = setup();
        probe.fail_next_connect();

        assert!(!controller.toggle_connection().await.unwrap());
        assert_eq!(controller.connect_button(), ConnectButton::IDLE);
        assert_eq!(
            controller.presenter().shown.last(),
            Some(&Shown::Status(false))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_device_resets_connect_button() {
        let (mut controller, mut events, probe) = setup();
        controller.toggle_connection().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.pump(&mut events);

        probe.drop_link();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(controller.pump(&mut events) >= 1);

        assert_eq!(controller.connect_button(), ConnectButton::IDLE);
        assert_eq!(
            controller.presenter().shown.last(),
            Some(&Shown::Status(false))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_print_label_rotates_and_reports() {
        let (mut controller, mut events, probe) = setup();
        controller.toggle_connection().await.unwrap();

        assert!(controller.print_label(&canvas(), "label", 3, 2).await.unwrap());
        assert!(controller.print_enabled());

        let jobs = probe.jobs();
        assert_eq!(jobs.len(), 1);
        // 96x40 label, fed sideways
        assert_eq!((jobs[0].width, jobs[0].height), (40, 96));
        assert_eq!((jobs[0].density, jobs[0].quantity), (3, 2));

        controller.pump(&mut events);
        assert!(controller.presenter().shown.contains(&Shown::Result(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_print_label_missing_region_never_reaches_device() {
        let (mut controller, _events, probe) = setup();
        controller.toggle_connection().await.unwrap();

        let err = controller
            .print_label(&canvas(), "nope", 3, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EtiquetaError::Compositing(CompositingError::RegionNotFound(_))
        ));
        assert_eq!(probe.print_calls(), 0);
        assert!(controller.print_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_print_label_rejects_density_above_model() {
        let (mut controller, _events, probe) = setup();
        let err = controller
            .print_label(&canvas(), "label", 5, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, EtiquetaError::Precondition(_)));
        assert_eq!(probe.print_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_image() {
        let (controller, _events, _probe) = setup();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etiqueta.png");

        let label = controller.save_image(&canvas(), "label", &path).unwrap();
        let saved = image::open(&path).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (96, 40));
        assert_eq!(saved, *label.image());
    }
}
