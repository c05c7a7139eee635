//! # Printer Module
//!
//! This module provides printer-specific configurations and utilities.
//!
//! ## Modules
//!
//! - [`config`]: Device descriptor table (max density, head width)
//! - [`target`]: Connection targets and address validation

pub mod config;
pub mod target;

pub use config::{DeviceModel, DeviceTable};
pub use target::DeviceTarget;
