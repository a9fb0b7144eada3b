use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use crossbeam_channel::Receiver;
use log::{info, warn};
use stickpad::session::{SessionNotice, SessionOutput, StickSide};
use stickpad::stick::StickMoved;
use stickpad::{
    telemetry, ControllerSession, LinkOptions, SessionOptions, SessionPhase, SettingsManager,
};

use crate::env_utils::{parse_env_u64, parse_env_u8};
use crate::layout::{Pad, PadLayout};
use crate::trace::{self, TraceInput};

const IDLE_SLICE: Duration = Duration::from_millis(10);

pub struct StreamOptions {
    pub trace_path: PathBuf,
    pub layout_path: Option<PathBuf>,
    pub settings_path: PathBuf,
    pub linger_ms: u64,
}

struct Listeners {
    left: Receiver<StickMoved>,
    right: Receiver<StickMoved>,
}

impl Listeners {
    fn attach(pad: &mut Pad) -> Self {
        let (left_tx, left) = crossbeam_channel::unbounded();
        let (right_tx, right) = crossbeam_channel::unbounded();
        pad.left.set_listener(Some(left_tx));
        pad.right.set_listener(Some(right_tx));
        Self { left, right }
    }

    fn forward(&self, session: &mut ControllerSession) {
        for moved in self.left.try_iter() {
            session.on_stick_moved(StickSide::Left, moved.position);
        }
        for moved in self.right.try_iter() {
            session.on_stick_moved(StickSide::Right, moved.position);
        }
    }
}

/// Replays a touch trace in real time into a live session bound to the stored server.
pub fn run_stream(options: StreamOptions) -> Result<()> {
    let layout = PadLayout::load(options.layout_path.as_deref())?;
    let mut pad = Pad::from_layout(&layout)?;
    let events = trace::load(&options.trace_path)?;
    let listeners = Listeners::attach(&mut pad);

    let session_options = SessionOptions {
        max_attempts: parse_env_u8("PADCTL_MAX_ATTEMPTS", SessionOptions::default().max_attempts)?,
        poll_period: Duration::from_millis(parse_env_u64(
            "PADCTL_POLL_MS",
            stickpad::config::SESSION_POLL_MS,
        )?),
    };
    let link_options = LinkOptions {
        connect_timeout: Duration::from_millis(parse_env_u64(
            "PADCTL_CONNECT_TIMEOUT_MS",
            stickpad::config::LINK_CONNECT_TIMEOUT_MS,
        )?),
        ..LinkOptions::default()
    };

    let settings = SettingsManager::open(&options.settings_path)
        .with_context(|| format!("failed opening {}", options.settings_path.display()))?;
    let mut session = ControllerSession::tcp(link_options, session_options);
    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;

    let mut ever_ready = false;
    let mut report = |output: SessionOutput| {
        ever_ready |= output.phase == SessionPhase::Ready;
        for notice in output.notices {
            match notice {
                SessionNotice::CannotConnect => warn!("stream: cannot connect to server"),
                SessionNotice::CannotLoadSettings => warn!("stream: cannot load settings"),
                SessionNotice::OpenSettings => {
                    warn!("stream: no server configured; run `padctl config set`")
                }
            }
        }
    };

    report(session.start(&settings));
    for event in &events {
        while now_ms() < event.ms {
            report(session.poll(now_ms()));
            let remaining = Duration::from_millis(event.ms.saturating_sub(now_ms()));
            thread::sleep(remaining.min(IDLE_SLICE));
        }
        match event.input {
            TraceInput::Touch { side, action } => {
                pad.touch(now_ms(), side, action);
                listeners.forward(&mut session);
            }
            TraceInput::Key { key, pressed } => session.on_key(key, pressed),
        }
        report(session.poll(now_ms()));
    }

    let linger_until = now_ms().saturating_add(options.linger_ms);
    while now_ms() < linger_until {
        report(session.poll(now_ms()));
        thread::sleep(IDLE_SLICE);
    }
    report(session.stop());
    drop(report);

    print_telemetry();
    if !ever_ready {
        bail!("session never reached the server");
    }
    info!("stream: done events={}", events.len());
    Ok(())
}

pub fn print_telemetry() {
    let snapshot = telemetry::snapshot();
    info!(
        "telemetry: connect attempts={} ok={} failed={} commands={} bytes={} write_failures={} peer_quits={} peer_eofs={} overflows={} dropped={}",
        snapshot.link_connect_attempts,
        snapshot.link_connect_successes,
        snapshot.link_connect_failures,
        snapshot.link_commands_written,
        snapshot.link_bytes_written,
        snapshot.link_write_failures,
        snapshot.link_peer_quits,
        snapshot.link_peer_eofs,
        snapshot.link_inbound_overflows,
        snapshot.link_dropped_commands,
    );
}
