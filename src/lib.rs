//! # Etiqueta - Label Printer Session Library
//!
//! Etiqueta drives Bluetooth label printers from a composed label layout.
//! It provides:
//!
//! - **Session core**: one long-lived device session with a background
//!   heartbeat, serialized connect/disconnect/print and ordered events
//! - **Compositing**: flatten positioned image and text layers, crop to a
//!   bounding region, rotate into feed orientation, save as PNG
//! - **Device table**: per-model maximum density and head width
//! - **Controller**: button-level facade for a UI
//!
//! ## Quick Start
//!
//! ```no_run
//! use etiqueta::{
//!     compose::{BoundingRegion, CanvasSnapshot, export_to_image, rotate_for_feed},
//!     device::SimulatedPrinter,
//!     printer::{DeviceTable, DeviceTarget},
//!     session::{Orchestrator, PrintRequest, HEARTBEAT_INTERVAL},
//! };
//!
//! # async fn example() -> Result<(), etiqueta::EtiquetaError> {
//! let table = DeviceTable::built_in();
//! let model = table.require("d110")?;
//!
//! // Start a session; the device handle is owned by it from now on
//! let (printer, _probe) = SimulatedPrinter::new();
//! let (session, mut events) = Orchestrator::spawn(printer, HEARTBEAT_INTERVAL);
//! session.connect(DeviceTarget::new("00:11:22:33:44:55")?).await?;
//!
//! // Flatten the canvas and print it
//! let canvas = CanvasSnapshot::new(240, 96)
//!     .with_region(BoundingRegion::new("label", 0.0, 0.0, 240.0, 96.0));
//! let label = export_to_image(&canvas, "label")?;
//! let request = PrintRequest::new(rotate_for_feed(label.image()), 3, 1, model)?;
//! let printed = session.print(request).await?;
//!
//! while let Ok(event) = events.try_recv() {
//!     println!("{:?}", event);
//! }
//! # let _ = printed;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | Session orchestrator, state and events |
//! | [`device`] | Device handle trait and simulated printer |
//! | [`compose`] | Compositing and export pipeline |
//! | [`controller`] | UI-facing facade |
//! | [`printer`] | Device descriptor table and targets |
//! | [`layout`] | JSON layout files |
//! | [`config`] | Session configuration |
//! | [`error`] | Error types |

pub mod compose;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod layout;
pub mod printer;
pub mod session;

// Re-exports for convenience
pub use config::SessionConfig;
pub use error::{CompositingError, EtiquetaError};
pub use printer::{DeviceModel, DeviceTable, DeviceTarget};
pub use session::{Orchestrator, SessionHandle};
