//! Process-wide link counters. Lock-free; readable from any thread as a [`Snapshot`].

use core::sync::atomic::{AtomicU32, Ordering};

use log::trace;

static LINK_CONNECT_ATTEMPTS: AtomicU32 = AtomicU32::new(0);
static LINK_CONNECT_SUCCESSES: AtomicU32 = AtomicU32::new(0);
static LINK_CONNECT_FAILURES: AtomicU32 = AtomicU32::new(0);
static LINK_COMMANDS_WRITTEN: AtomicU32 = AtomicU32::new(0);
static LINK_BYTES_WRITTEN: AtomicU32 = AtomicU32::new(0);
static LINK_WRITE_FAILURES: AtomicU32 = AtomicU32::new(0);
static LINK_PEER_QUITS: AtomicU32 = AtomicU32::new(0);
static LINK_PEER_EOFS: AtomicU32 = AtomicU32::new(0);
static LINK_INBOUND_OVERFLOWS: AtomicU32 = AtomicU32::new(0);
static LINK_DROPPED_COMMANDS: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub link_connect_attempts: u32,
    pub link_connect_successes: u32,
    pub link_connect_failures: u32,
    pub link_commands_written: u32,
    pub link_bytes_written: u32,
    pub link_write_failures: u32,
    pub link_peer_quits: u32,
    pub link_peer_eofs: u32,
    pub link_inbound_overflows: u32,
    pub link_dropped_commands: u32,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        link_connect_attempts: LINK_CONNECT_ATTEMPTS.load(Ordering::Relaxed),
        link_connect_successes: LINK_CONNECT_SUCCESSES.load(Ordering::Relaxed),
        link_connect_failures: LINK_CONNECT_FAILURES.load(Ordering::Relaxed),
        link_commands_written: LINK_COMMANDS_WRITTEN.load(Ordering::Relaxed),
        link_bytes_written: LINK_BYTES_WRITTEN.load(Ordering::Relaxed),
        link_write_failures: LINK_WRITE_FAILURES.load(Ordering::Relaxed),
        link_peer_quits: LINK_PEER_QUITS.load(Ordering::Relaxed),
        link_peer_eofs: LINK_PEER_EOFS.load(Ordering::Relaxed),
        link_inbound_overflows: LINK_INBOUND_OVERFLOWS.load(Ordering::Relaxed),
        link_dropped_commands: LINK_DROPPED_COMMANDS.load(Ordering::Relaxed),
    }
}

pub(crate) fn record_link_connect_attempt() {
    LINK_CONNECT_ATTEMPTS.fetch_add(1, Ordering::Relaxed);
    trace!("telemetry link_connect_attempt");
}

pub(crate) fn record_link_connect_success() {
    LINK_CONNECT_SUCCESSES.fetch_add(1, Ordering::Relaxed);
    trace!("telemetry link_connect_success");
}

pub(crate) fn record_link_connect_failure() {
    LINK_CONNECT_FAILURES.fetch_add(1, Ordering::Relaxed);
    trace!("telemetry link_connect_failure");
}

pub(crate) fn record_link_write(bytes: usize) {
    LINK_COMMANDS_WRITTEN.fetch_add(1, Ordering::Relaxed);
    LINK_BYTES_WRITTEN.fetch_add(bytes.min(u32::MAX as usize) as u32, Ordering::Relaxed);
}

pub(crate) fn record_link_write_failure() {
    LINK_WRITE_FAILURES.fetch_add(1, Ordering::Relaxed);
    trace!("telemetry link_write_failure");
}

pub(crate) fn record_link_peer_quit() {
    LINK_PEER_QUITS.fetch_add(1, Ordering::Relaxed);
    trace!("telemetry link_peer_quit");
}

pub(crate) fn record_link_peer_eof() {
    LINK_PEER_EOFS.fetch_add(1, Ordering::Relaxed);
    trace!("telemetry link_peer_eof");
}

pub(crate) fn record_link_inbound_overflow() {
    LINK_INBOUND_OVERFLOWS.fetch_add(1, Ordering::Relaxed);
}

/// Commands still queued when a worker shut down.
pub(crate) fn record_link_dropped_commands(count: usize) {
    if count == 0 {
        return;
    }
    LINK_DROPPED_COMMANDS.fetch_add(count.min(u32::MAX as usize) as u32, Ordering::Relaxed);
    trace!("telemetry link_dropped_commands count={count}");
}
