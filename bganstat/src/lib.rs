//! BGAN M2M terminal stat monitoring.
//!
//! Polls the terminal's local REST API for signal, satellite, identity,
//! registration, APN, and PDP state, merging every cycle into one
//! consistent [`DeviceSnapshot`]; keeps a bounded signal history; and
//! issues APN/PDP commands whose effects are reconciled by re-polling
//! rather than trusted from the command response.

pub mod args;
pub mod client;
pub mod command;
pub mod error;
pub mod monitor;
pub mod signal;
pub mod status;

pub use client::{PdpActivation, PdpStatus, TerminalClient};
pub use command::{CommandKind, CommandOutcome, PendingCommand};
pub use error::{ClientError, CommandError};
pub use monitor::{MonitorConfig, SignalMonitor};
pub use signal::{classify_signal, normalize_signal, SignalQuality};
pub use status::{ApnProfile, DeviceSnapshot, NetworkStatus, SignalSample};
