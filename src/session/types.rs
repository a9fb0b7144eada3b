use core::time::Duration;

use crate::config::{SESSION_MAX_CONNECTION_ATTEMPTS, SESSION_POLL_MS};
use crate::protocol::Button;
use crate::stick::NormalizedPosition;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Stopped,
    AwaitingTarget,
    Connecting,
    Ready,
    Unavailable,
}

/// User-facing notices. Each is emitted once per occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionNotice {
    CannotConnect,
    CannotLoadSettings,
    /// No server configured on the first load; the settings screen should open.
    OpenSettings,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub max_attempts: u8,
    pub poll_period: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_attempts: SESSION_MAX_CONNECTION_ATTEMPTS,
            poll_period: Duration::from_millis(SESSION_POLL_MS),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickSide {
    Left,
    Right,
}

/// Latest normalized position of both sticks, re-sent on every ready tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SticksSnapshot {
    pub left: NormalizedPosition,
    pub right: NormalizedPosition,
}

impl SticksSnapshot {
    pub fn set(&mut self, side: StickSide, position: NormalizedPosition) {
        match side {
            StickSide::Left => self.left = position,
            StickSide::Right => self.right = position,
        }
    }
}

/// Physical keys mapped onto pad buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HardwareKey {
    VolumeUp,
    VolumeDown,
}

impl HardwareKey {
    pub const fn button(self) -> Button {
        match self {
            Self::VolumeUp => Button::Select,
            Self::VolumeDown => Button::Start,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOutput {
    pub phase: SessionPhase,
    pub notices: Vec<SessionNotice>,
}

/// Fixed-period deadline in caller-supplied milliseconds.
#[derive(Clone, Copy, Debug)]
pub(super) struct PollTimer {
    period_ms: u64,
    next_due_ms: Option<u64>,
}

impl PollTimer {
    pub(super) fn new(period: Duration) -> Self {
        Self {
            period_ms: u64::try_from(period.as_millis()).unwrap_or(u64::MAX).max(1),
            next_due_ms: None,
        }
    }

    pub(super) fn arm(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    pub(super) fn disarm(&mut self) {
        self.next_due_ms = None;
    }

    pub(super) fn is_armed(&self) -> bool {
        self.next_due_ms.is_some()
    }

    /// Fires at most once per call and re-arms one period after `now_ms`.
    pub(super) fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.next_due_ms {
            Some(due) if now_ms >= due => {
                self.arm(now_ms);
                true
            }
            _ => false,
        }
    }
}
