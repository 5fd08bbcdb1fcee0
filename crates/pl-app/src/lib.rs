//! pl-app: application service layer for pressloop.
//!
//! This crate wires the engine to its outer surfaces. It provides:
//! - Engine configuration loading and validation
//! - The gain-command channel (line parsing, coalescing)
//! - The telemetry sink (bounded, non-blocking hand-off to a JSON writer)
//! - Wall-clock pacing and cooperative shutdown
//! - The control-loop service tying them together

pub mod command;
pub mod config;
pub mod error;
pub mod pacing;
pub mod run_service;
pub mod telemetry;

pub use command::{ChannelCommandSource, CommandSource, parse_command, spawn_line_reader};
pub use config::EngineConfig;
pub use error::{AppError, AppResult};
pub use pacing::{Pacer, Shutdown};
pub use run_service::{RunOptions, RunSummary, run_loop};
pub use telemetry::{ChannelSink, TelemetrySink, spawn_json_writer};
