//! Session telemetry pipeline
//!
//! Turns a game's log lines and per-frame detection batches into round
//! outcomes, running statistics, plugin hook calls and persisted matches.

pub mod config;
pub mod detection;
pub mod error;
pub mod log_scan;
pub mod messaging;
pub mod plugins;
pub mod rounds;
pub mod session;
pub mod store;

pub use config::TelemetryConfig;
pub use error::{AppResult, ConfigError, PluginError, SessionError, StoreError, TailError};
pub use log_scan::{LogLine, LogScanner, Outcome, OutcomeRule, RoundBoundary, ScannerConfig};
pub use messaging::{Event, EventBus};
pub use rounds::{RoundAggregator, RoundRecord, SessionSummary};
pub use session::GameSession;
pub use store::{Match, MatchStore};
