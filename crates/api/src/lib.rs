//! # Blobmeter App
//!
//! Console simulator driving the metering engine with fake blob transfers.
//!
//! This crate contains:
//! - The application context (configuration plus the meter context)
//! - Menu commands and the interactive console loop
//! - The transfer simulator feeding PUT and GET trackers
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - No real transport: network latency is simulated with `tokio::time::sleep`

pub mod commands;
pub mod console;
pub mod context;
pub mod simulation;
pub mod utils;

// Re-export for convenience
pub use commands::{MenuCommand, Scenario};
pub use context::AppContext;
pub use simulation::{Provider, SimulationSettings, Simulator, TransferSummary};
