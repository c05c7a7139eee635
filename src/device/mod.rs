//! # Device Handles
//!
//! This module defines the capability a printer backend must provide to be
//! driven by a session.
//!
//! ## Available Devices
//!
//! - [`simulated`]: In-process printer with scripted outcomes, for demos and tests
//!
//! Real backends (Bluetooth LE, RFCOMM) live outside this crate and only need
//! to implement [`DeviceHandle`]. Packet framing and the printer's wire
//! protocol are their concern.

pub mod simulated;

use async_trait::async_trait;
use image::RgbaImage;

use crate::error::EtiquetaError;
use crate::printer::DeviceTarget;
use crate::session::state::{ConnectionState, RawStatus};

pub use simulated::{SimulatedPrinter, SimulatorProbe};

/// Reply to a heartbeat query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heartbeat {
    pub state: ConnectionState,
    pub raw: RawStatus,
}

/// # Device Handle
///
/// Opaque printer connection. Every method is a suspension point; none may
/// block the calling thread.
///
/// `Ok(false)` means the device answered and refused, `Err` means it could
/// not be reached. Timeouts are the implementation's responsibility.
///
/// ## Cancellation
///
/// The session may drop an in-flight [`heartbeat`](DeviceHandle::heartbeat)
/// future when a user operation arrives. Implementations must leave the
/// link usable when that happens. The other methods always run to
/// completion.
#[async_trait]
pub trait DeviceHandle: Send + 'static {
    /// Open a connection to `target`.
    async fn connect(&mut self, target: &DeviceTarget) -> Result<bool, EtiquetaError>;

    /// Close the current connection.
    async fn disconnect(&mut self) -> Result<bool, EtiquetaError>;

    /// Query liveness and status.
    async fn heartbeat(&mut self) -> Result<Heartbeat, EtiquetaError>;

    /// Print `quantity` copies of `image` at `density`.
    async fn print(
        &mut self,
        image: &RgbaImage,
        density: u8,
        quantity: u8,
    ) -> Result<bool, EtiquetaError>;
}

#[async_trait]
impl<D: DeviceHandle + ?Sized> DeviceHandle for Box<D> {
    async fn connect(&mut self, target: &DeviceTarget) -> Result<bool, EtiquetaError> {
        (**self).connect(target).await
    }

    async fn disconnect(&mut self) -> Result<bool, EtiquetaError> {
        (**self).disconnect().await
    }

    async fn heartbeat(&mut self) -> Result<Heartbeat, EtiquetaError> {
        (**self).heartbeat().await
    }

    async fn print(
        &mut self,
        image: &RgbaImage,
        density: u8,
        quantity: u8,
    ) -> Result<bool, EtiquetaError> {
        (**self).print(image, density, quantity).await
    }
}
