//! Virtual gamepad controller core.
//!
//! Two touch-driven analog sticks are clamped into normalized positions, encoded into a small
//! newline-delimited text protocol, and streamed to a remote listener by a per-connection worker
//! thread. A polling session ties the pieces together and owns the retry policy.

pub mod config;
pub mod link;
pub mod protocol;
pub mod session;
pub mod settings;
pub mod stick;
pub mod telemetry;

pub use link::{ConnectionState, ConnectionTarget, ConnectionWorker, LinkOptions};
pub use protocol::{Axis, Button, Command, OutgoingCommand};
pub use session::{ControllerSession, SessionNotice, SessionOptions, SessionPhase};
pub use settings::{ServerInfo, SettingsError, SettingsManager};
pub use stick::{NormalizedPosition, StickConfig, StickGeometry, StickWidget};
