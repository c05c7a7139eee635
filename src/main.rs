//! # Etiqueta CLI
//!
//! Command-line interface for label export and printer sessions.
//!
//! ## Usage
//!
//! ```bash
//! # List known printer models
//! etiqueta models
//!
//! # Export a layout's bounding region to PNG
//! etiqueta export layout.json --region label --png label.png
//!
//! # Run a full session against the simulated printer
//! etiqueta simulate layout.json --region label --model d110 \
//!     --target 00:11:22:33:44:55 --density 3 --copies 2
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use etiqueta::{
    EtiquetaError, SessionConfig,
    compose::export_to_png,
    controller::{LogPresenter, SessionController},
    device::{DeviceHandle, SimulatedPrinter},
    layout,
    printer::DeviceTable,
    session::Orchestrator,
};

/// Etiqueta - Label printer utility
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON device table replacing the built-in models
    #[arg(long, global = true, value_name = "FILE")]
    table: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List printer models and their limits
    Models,

    /// Composite a layout and save its bounding region as PNG
    Export {
        /// Layout file (JSON)
        layout: PathBuf,

        /// Bounding region to export
        #[arg(long, default_value = "label")]
        region: String,

        /// Output file
        #[arg(long, value_name = "FILE", default_value = "etiqueta.png")]
        png: PathBuf,

        /// Save in printer feed orientation
        #[arg(long)]
        rotate: bool,
    },

    /// Connect, watch heartbeats, print and disconnect on a simulated printer
    Simulate {
        /// Layout file (JSON)
        layout: PathBuf,

        /// Bounding region to print
        #[arg(long, default_value = "label")]
        region: String,

        /// Printer model key
        #[arg(long, default_value = "d110")]
        model: String,

        /// Printer Bluetooth address
        #[arg(long, default_value = "00:11:22:33:44:55")]
        target: String,

        /// Print density (defaults to 3, capped at the model's maximum)
        #[arg(long)]
        density: Option<u8>,

        /// Number of copies (1-100)
        #[arg(long, default_value = "1")]
        copies: u8,

        /// Heartbeat interval in milliseconds
        #[arg(long, default_value = "5000")]
        interval_ms: u64,

        /// Simulated print duration in milliseconds
        #[arg(long, default_value = "2000")]
        print_ms: u64,

        /// Chance (0-1) that a heartbeat fails
        #[arg(long, default_value = "0")]
        flakiness: f64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), EtiquetaError> {
    let table = match &cli.table {
        Some(path) => DeviceTable::load(path)?,
        None => DeviceTable::built_in(),
    };

    match cli.command {
        Commands::Models => {
            println!("{:<8} {:<16} {:>11} {:>10}", "KEY", "NAME", "MAX DENSITY", "WIDTH");
            for model in table.models() {
                println!(
                    "{:<8} {:<16} {:>11} {:>7.1} mm",
                    model.key,
                    model.name,
                    model.max_density,
                    model.width_mm()
                );
            }
        }

        Commands::Export {
            layout,
            region,
            png,
            rotate,
        } => {
            let snapshot = layout::load_snapshot(&layout)?;
            let saved = export_to_png(&snapshot, &region, &png, rotate)?;
            let (width, height) = saved.dimensions();
            println!("Saved {}x{} label to {}", width, height, png.display());
        }

        Commands::Simulate {
            layout,
            region,
            model,
            target,
            density,
            copies,
            interval_ms,
            print_ms,
            flakiness,
        } => {
            let config = SessionConfig::new(&table, &model, &target)?
                .with_heartbeat_interval(Duration::from_millis(interval_ms))?;
            let density = density.unwrap_or_else(|| config.model.default_density());
            let snapshot = layout::load_snapshot(&layout)?;

            let (printer, probe) = SimulatedPrinter::new();
            probe.set_latency(Duration::from_millis(150));
            probe.set_print_latency(Duration::from_millis(print_ms));
            probe.set_flakiness(flakiness);
            let device: Box<dyn DeviceHandle> = Box::new(printer);

            let (session, mut events) = Orchestrator::spawn(device, config.heartbeat_interval);
            let mut controller = SessionController::new(session.clone(), config, LogPresenter);

            if !controller.toggle_connection().await? {
                warn!("Could not connect to {}", controller.config().target);
                return Ok(());
            }

            // Let a couple of heartbeats come in
            tokio::time::sleep(controller.config().heartbeat_interval * 2).await;
            controller.pump(&mut events);

            let printed = controller
                .print_label(&snapshot, &region, density, copies)
                .await?;
            controller.pump(&mut events);

            if session.connection_state().is_connected() {
                controller.toggle_connection().await?;
            }
            controller.pump(&mut events);
            session.shutdown().await;

            info!(
                printed,
                heartbeats = probe.heartbeat_calls(),
                jobs = probe.jobs().len(),
                "Simulation finished"
            );
        }
    }

    Ok(())
}
