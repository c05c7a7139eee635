//! # Simulated Printer
//!
//! An in-process [`DeviceHandle`] that behaves like a label printer on a
//! Bluetooth link without touching any hardware.
//!
//! The printer is moved into a session, so it is steered and observed
//! through a [`SimulatorProbe`] that shares its state:
//!
//! ```
//! use std::time::Duration;
//! use etiqueta::device::SimulatedPrinter;
//!
//! let (printer, probe) = SimulatedPrinter::new();
//! probe.set_print_latency(Duration::from_secs(2));
//! probe.fail_next_print();
//! assert_eq!(probe.heartbeat_calls(), 0);
//! # drop(printer);
//! ```
//!
//! Outcomes are scripted per call: queued results are used first, then the
//! default (success). Latencies use `tokio::time`, so tests with a paused
//! clock run instantly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;

use super::{DeviceHandle, Heartbeat};
use crate::error::EtiquetaError;
use crate::printer::DeviceTarget;
use crate::session::state::{ConnectionState, RawStatus};

/// Record of one job the simulator accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedJob {
    pub width: u32,
    pub height: u32,
    pub density: u8,
    pub quantity: u8,
    pub success: bool,
}

#[derive(Debug, Default)]
struct Script {
    connect_results: VecDeque<bool>,
    disconnect_results: VecDeque<bool>,
    print_results: VecDeque<bool>,
    /// Heartbeats fail with a transport error while the link is down
    link_down: bool,
    /// Heartbeats never complete
    hang_heartbeat: bool,
    /// Chance that a heartbeat fails, for demos
    flakiness: f64,
    latency: Duration,
    print_latency: Duration,
    target: Option<DeviceTarget>,
    jobs: Vec<PrintedJob>,
}

#[derive(Debug, Default)]
struct Shared {
    script: Mutex<Script>,
    connected: AtomicBool,
    printing: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    heartbeat_calls: AtomicUsize,
    heartbeats_during_print: AtomicUsize,
    print_calls: AtomicUsize,
}

impl Shared {
    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread may poison the lock; the script is still usable.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The device half, owned by the session.
#[derive(Debug)]
pub struct SimulatedPrinter {
    shared: Arc<Shared>,
}

/// The observer half, kept by the caller.
#[derive(Debug, Clone)]
pub struct SimulatorProbe {
    shared: Arc<Shared>,
}

impl SimulatedPrinter {
    pub fn new() -> (Self, SimulatorProbe) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: shared.clone(),
            },
            SimulatorProbe { shared },
        )
    }

    async fn pause(duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    fn status(&self) -> RawStatus {
        RawStatus::new()
            .with("closing_state", 0)
            .with("power_level", 4)
            .with("paper_state", 0)
            .with("rfid_read_state", 1)
    }
}

#[async_trait]
impl DeviceHandle for SimulatedPrinter {
    async fn connect(&mut self, target: &DeviceTarget) -> Result<bool, EtiquetaError> {
        self.shared.connect_calls.fetch_add(1, Ordering::SeqCst);
        let (latency, ok) = {
            let mut script = self.shared.script();
            let ok = script.connect_results.pop_front().unwrap_or(true);
            if ok {
                script.target = Some(target.clone());
                script.link_down = false;
            }
            (script.latency, ok)
        };
        Self::pause(latency).await;
        if ok {
            self.shared.connected.store(true, Ordering::SeqCst);
            Ok(true)
        } else {
            Err(EtiquetaError::Transport(format!(
                "Device {} not reachable",
                target.address
            )))
        }
    }

    async fn disconnect(&mut self) -> Result<bool, EtiquetaError> {
        self.shared.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let (latency, ok) = {
            let mut script = self.shared.script();
            let ok = script.disconnect_results.pop_front().unwrap_or(true);
            script.target = None;
            (script.latency, ok)
        };
        Self::pause(latency).await;
        self.shared.connected.store(false, Ordering::SeqCst);
        Ok(ok)
    }

    async fn heartbeat(&mut self) -> Result<Heartbeat, EtiquetaError> {
        self.shared.heartbeat_calls.fetch_add(1, Ordering::SeqCst);
        if self.shared.printing.load(Ordering::SeqCst) {
            self.shared
                .heartbeats_during_print
                .fetch_add(1, Ordering::SeqCst);
        }
        let (latency, hang, link_down, flakiness) = {
            let script = self.shared.script();
            (
                script.latency,
                script.hang_heartbeat,
                script.link_down,
                script.flakiness,
            )
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Self::pause(latency).await;

        if link_down || (flakiness > 0.0 && rand::random::<f64>() < flakiness) {
            self.shared.connected.store(false, Ordering::SeqCst);
            return Err(EtiquetaError::Transport("Heartbeat timed out".to_string()));
        }
        let state = if self.shared.connected.load(Ordering::SeqCst) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        Ok(Heartbeat {
            state,
            raw: self.status(),
        })
    }

    async fn print(
        &mut self,
        image: &RgbaImage,
        density: u8,
        quantity: u8,
    ) -> Result<bool, EtiquetaError> {
        self.shared.print_calls.fetch_add(1, Ordering::SeqCst);
        self.shared.printing.store(true, Ordering::SeqCst);
        let (latency, ok) = {
            let mut script = self.shared.script();
            let ok = script.print_results.pop_front().unwrap_or(true)
                && self.shared.connected.load(Ordering::SeqCst);
            (script.print_latency, ok)
        };
        Self::pause(latency).await;
        self.shared.printing.store(false, Ordering::SeqCst);

        self.shared.script().jobs.push(PrintedJob {
            width: image.width(),
            height: image.height(),
            density,
            quantity,
            success: ok,
        });
        Ok(ok)
    }
}

impl SimulatorProbe {
    /// Make the next connect attempt fail with a transport error.
    pub fn fail_next_connect(&self) {
        self.shared.script().connect_results.push_back(false);
    }

    /// Make the next disconnect report failure.
    pub fn fail_next_disconnect(&self) {
        self.shared.script().disconnect_results.push_back(false);
    }

    /// Make the next print report failure.
    pub fn fail_next_print(&self) {
        self.shared.script().print_results.push_back(false);
    }

    /// Simulate the printer walking out of range or powering off.
    pub fn drop_link(&self) {
        self.shared.script().link_down = true;
    }

    /// Make heartbeats never answer (`true`) or behave normally (`false`).
    pub fn hang_heartbeats(&self, hang: bool) {
        self.shared.script().hang_heartbeat = hang;
    }

    /// Probability in `0.0..=1.0` that any heartbeat fails.
    pub fn set_flakiness(&self, probability: f64) {
        self.shared.script().flakiness = probability.clamp(0.0, 1.0);
    }

    /// Latency of connect, disconnect and heartbeat.
    pub fn set_latency(&self, latency: Duration) {
        self.shared.script().latency = latency;
    }

    pub fn set_print_latency(&self, latency: Duration) {
        self.shared.script().print_latency = latency;
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    pub fn target(&self) -> Option<DeviceTarget> {
        self.shared.script().target.clone()
    }

    pub fn jobs(&self) -> Vec<PrintedJob> {
        self.shared.script().jobs.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.shared.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.shared.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn heartbeat_calls(&self) -> usize {
        self.shared.heartbeat_calls.load(Ordering::SeqCst)
    }

    /// Heartbeats that reached the device while a print was running.
    pub fn heartbeats_during_print(&self) -> usize {
        self.shared.heartbeats_during_print.load(Ordering::SeqCst)
    }

    pub fn print_calls(&self) -> usize {
        self.shared.print_calls.load(Ordering::SeqCst)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> DeviceTarget {
        DeviceTarget::new("00:11:22:33:44:55").unwrap()
    }

    #[tokio::test]
    async fn test_connect_then_heartbeat() {
        let (mut printer, probe) = SimulatedPrinter::new();
        assert!(printer.connect(&target()).await.unwrap());
        let beat = printer.heartbeat().await.unwrap();
        assert_eq!(beat.state, ConnectionState::Connected);
        assert_eq!(beat.raw.get("power_level"), Some(4));
        assert_eq!(probe.target(), Some(target()));
    }

    #[tokio::test]
    async fn test_scripted_connect_failure() {
        let (mut printer, probe) = SimulatedPrinter::new();
        probe.fail_next_connect();
        assert!(printer.connect(&target()).await.is_err());
        assert!(!probe.is_connected());
        // Script consumed, next attempt succeeds
        assert!(printer.connect(&target()).await.unwrap());
        assert_eq!(probe.connect_calls(), 2);
    }

    #[tokio::test]
    async fn test_dropped_link_fails_heartbeat() {
        let (mut printer, probe) = SimulatedPrinter::new();
        printer.connect(&target()).await.unwrap();
        probe.drop_link();
        assert!(printer.heartbeat().await.is_err());
        assert!(!probe.is_connected());
    }

    #[tokio::test]
    async fn test_print_requires_connection() {
        let (mut printer, probe) = SimulatedPrinter::new();
        let image = RgbaImage::new(40, 96);
        assert!(!printer.print(&image, 3, 1).await.unwrap());
        printer.connect(&target()).await.unwrap();
        assert!(printer.print(&image, 3, 2).await.unwrap());

        let jobs = probe.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(
            jobs[1],
            PrintedJob {
                width: 40,
                height: 96,
                density: 3,
                quantity: 2,
                success: true,
            }
        );
    }

    #[tokio::test]
    async fn test_disconnect_report() {
        let (mut printer, probe) = SimulatedPrinter::new();
        printer.connect(&target()).await.unwrap();
        probe.fail_next_disconnect();
        assert!(!printer.disconnect().await.unwrap());
        assert!(!probe.is_connected());
        assert_eq!(probe.target(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_uses_tokio_clock() {
        let (mut printer, probe) = SimulatedPrinter::new();
        probe.set_latency(Duration::from_secs(3));
        let start = tokio::time::Instant::now();
        printer.connect(&target()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
