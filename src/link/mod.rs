//! TCP link to the pad server: one worker thread per connection attempt.

mod worker;

use core::fmt;
use core::time::Duration;

use crate::config::{LINK_CONNECT_TIMEOUT_MS, LINK_READ_TIMEOUT_MS};
use crate::protocol::{self, Button, Command, OutgoingCommand};
use crate::stick::NormalizedPosition;

pub use worker::ConnectionWorker;

/// Server endpoint. The host may be an IPv4 literal or a resolvable name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionTarget {
    host: String,
    port: u16,
}

impl ConnectionTarget {
    /// Returns `None` for an empty host or port 0.
    pub fn new(host: impl Into<String>, port: u16) -> Option<Self> {
        let host = host.into().trim().to_string();
        if host.is_empty() || port == 0 {
            return None;
        }
        Some(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkOptions {
    pub connect_timeout: Duration,
    /// Socket read timeout; bounds how long a stop request waits to be observed.
    pub read_timeout: Duration,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(LINK_CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(LINK_READ_TIMEOUT_MS),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Handle on one connection lifecycle.
///
/// `is_connected` and `is_connecting` are read independently and are not jointly atomic: a
/// reader racing a transition may see both `false`, never both `true`.
pub trait Link: Send {
    fn is_connected(&self) -> bool;
    fn is_connecting(&self) -> bool;
    /// Queues one command. Never blocks; commands are dropped once the link is gone.
    fn enqueue(&self, command: OutgoingCommand);
    /// Requests shutdown. Idempotent and non-blocking.
    fn close(&self);

    fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else if self.is_connecting() {
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }

    fn dispatch_left_stick(&self, position: NormalizedPosition) {
        for command in protocol::left_stick(position) {
            self.enqueue(command);
        }
    }

    fn dispatch_right_stick(&self, position: NormalizedPosition) {
        for command in protocol::right_stick(position) {
            self.enqueue(command);
        }
    }

    fn dispatch_button(&self, button: Button, pressed: bool) {
        self.enqueue(Command::button(button, pressed).encode());
    }

    fn start_pressed(&self) {
        self.dispatch_button(Button::Start, true);
    }

    fn start_released(&self) {
        self.dispatch_button(Button::Start, false);
    }

    fn select_pressed(&self) {
        self.dispatch_button(Button::Select, true);
    }

    fn select_released(&self) {
        self.dispatch_button(Button::Select, false);
    }
}

/// Opens a fresh link per connection attempt.
pub trait LinkFactory: Send {
    fn open(&mut self, target: &ConnectionTarget) -> Box<dyn Link>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TcpLinkFactory {
    pub options: LinkOptions,
}

impl TcpLinkFactory {
    pub fn new(options: LinkOptions) -> Self {
        Self { options }
    }
}

impl LinkFactory for TcpLinkFactory {
    fn open(&mut self, target: &ConnectionTarget) -> Box<dyn Link> {
        Box::new(ConnectionWorker::spawn_with(target.clone(), self.options))
    }
}
