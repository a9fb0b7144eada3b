use crossbeam_channel::TryRecvError;
use log::debug;
use statig::blocking::IntoStateMachineExt as _;

use crate::link::{ConnectionState, ConnectionTarget, LinkFactory, LinkOptions, TcpLinkFactory};
use crate::settings::{ServerInfo, ServerInfoReply, SettingsError, SettingsManager};
use crate::stick::NormalizedPosition;

use super::events::SessionEvent;
use super::machine::{DispatchContext, SessionMachine};
use super::types::{
    HardwareKey, PollTimer, SessionOptions, SessionOutput, SessionPhase, StickSide,
    SticksSnapshot,
};

/// Drives the pad session: settings load, bounded connection retries, periodic stick
/// re-sends and input forwarding.
///
/// Single-threaded and caller-clocked. `poll` must be called regularly with a monotonic
/// millisecond timestamp; the retry routine runs from there.
pub struct ControllerSession {
    machine: statig::blocking::StateMachine<SessionMachine>,
    timer: PollTimer,
    sticks: SticksSnapshot,
    pending_settings: Option<ServerInfoReply>,
    clock_ms: u64,
}

impl ControllerSession {
    pub fn new(factory: Box<dyn LinkFactory>, options: SessionOptions) -> Self {
        Self {
            machine: SessionMachine::new(factory, options.max_attempts).state_machine(),
            timer: PollTimer::new(options.poll_period),
            sticks: SticksSnapshot::default(),
            pending_settings: None,
            clock_ms: 0,
        }
    }

    pub fn tcp(link: LinkOptions, options: SessionOptions) -> Self {
        Self::new(Box::new(TcpLinkFactory::new(link)), options)
    }

    pub fn phase(&self) -> SessionPhase {
        self.machine.inner().phase
    }

    /// Consecutive failed attempts against the current target.
    pub fn attempts(&self) -> u8 {
        self.machine.inner().attempts
    }

    pub fn target(&self) -> Option<&ConnectionTarget> {
        self.machine.inner().target.as_ref()
    }

    pub fn link_state(&self) -> ConnectionState {
        self.machine
            .inner()
            .link
            .as_deref()
            .map_or(ConnectionState::Disconnected, |link| link.state())
    }

    pub fn sticks(&self) -> SticksSnapshot {
        self.sticks
    }

    pub fn is_timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Leaves `Stopped` and waits for a settings result.
    pub fn begin(&mut self) -> SessionOutput {
        self.dispatch(self.clock_ms, SessionEvent::Start)
    }

    /// Starts the session and requests the stored server target.
    pub fn start(&mut self, settings: &SettingsManager) -> SessionOutput {
        let output = self.begin();
        self.load_from(settings.get_server_connection_info());
        output
    }

    /// Re-reads the server target after the user edited it.
    pub fn settings_changed(&mut self, settings: &SettingsManager) {
        self.load_from(settings.get_server_connection_info());
    }

    /// Replaces any pending settings request; the result is applied on a later `poll`.
    pub fn load_from(&mut self, reply: ServerInfoReply) {
        if self.pending_settings.replace(reply).is_some() {
            debug!("session: superseded pending settings request");
        }
    }

    pub fn apply_settings(
        &mut self,
        now_ms: u64,
        result: Result<ServerInfo, SettingsError>,
    ) -> SessionOutput {
        let event = match result {
            Ok(info) => SessionEvent::TargetLoaded(info.target()),
            Err(err) => {
                debug!("session: settings result err={err}");
                SessionEvent::SettingsFailed
            }
        };
        self.dispatch(now_ms, event)
    }

    /// Applies a finished settings request, then runs the retry routine when due.
    pub fn poll(&mut self, now_ms: u64) -> SessionOutput {
        self.clock_ms = self.clock_ms.max(now_ms);
        let mut notices = Vec::new();

        let settings = match self.pending_settings.as_ref().map(|reply| reply.try_recv()) {
            Some(Ok(result)) => Some(result),
            Some(Err(TryRecvError::Disconnected)) => Some(Err(SettingsError::Disposed)),
            Some(Err(TryRecvError::Empty)) | None => None,
        };
        if let Some(result) = settings {
            self.pending_settings = None;
            notices.extend(self.apply_settings(now_ms, result).notices);
        }

        if self.timer.fire_if_due(now_ms) {
            notices.extend(self.dispatch(now_ms, SessionEvent::Tick).notices);
        }

        SessionOutput {
            phase: self.phase(),
            notices,
        }
    }

    pub fn on_stick_moved(&mut self, side: StickSide, position: NormalizedPosition) {
        self.sticks.set(side, position);
        self.dispatch(self.clock_ms, SessionEvent::StickMoved { side, position });
    }

    pub fn on_key(&mut self, key: HardwareKey, pressed: bool) {
        self.dispatch(self.clock_ms, SessionEvent::Key { key, pressed });
    }

    /// Closes the link and halts the routine. `begin` or `start` resumes.
    pub fn stop(&mut self) -> SessionOutput {
        self.pending_settings = None;
        self.dispatch(self.clock_ms, SessionEvent::Stop)
    }

    fn dispatch(&mut self, now_ms: u64, event: SessionEvent) -> SessionOutput {
        let mut context = DispatchContext::new(self.sticks);
        self.machine.handle_with_context(&event, &mut context);

        let phase = self.phase();
        match phase {
            SessionPhase::Connecting | SessionPhase::Ready => {
                if context.rearm_timer {
                    self.timer.arm(now_ms);
                }
            }
            _ => self.timer.disarm(),
        }

        SessionOutput {
            phase,
            notices: context.notices,
        }
    }
}

impl Drop for ControllerSession {
    fn drop(&mut self) {
        if !matches!(self.phase(), SessionPhase::Stopped) {
            self.stop();
        }
    }
}
