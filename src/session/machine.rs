use log::{debug, info, warn};
use statig::prelude::*;

use crate::link::{ConnectionTarget, Link, LinkFactory};

use super::events::SessionEvent;
use super::types::{SessionNotice, SessionPhase, StickSide, SticksSnapshot};

pub(super) struct DispatchContext {
    pub(super) sticks: SticksSnapshot,
    pub(super) notices: Vec<SessionNotice>,
    /// Set when the retry routine ran; the poll period restarts from this dispatch.
    pub(super) rearm_timer: bool,
}

impl DispatchContext {
    pub(super) fn new(sticks: SticksSnapshot) -> Self {
        Self {
            sticks,
            notices: Vec::new(),
            rearm_timer: false,
        }
    }
}

pub(super) struct SessionMachine {
    factory: Box<dyn LinkFactory>,
    pub(super) link: Option<Box<dyn Link>>,
    pub(super) target: Option<ConnectionTarget>,
    pub(super) attempts: u8,
    max_attempts: u8,
    settings_shown: bool,
    pub(super) phase: SessionPhase,
}

impl SessionMachine {
    pub(super) fn new(factory: Box<dyn LinkFactory>, max_attempts: u8) -> Self {
        Self {
            factory,
            link: None,
            target: None,
            attempts: 0,
            max_attempts,
            settings_shown: false,
            phase: SessionPhase::Stopped,
        }
    }

    fn enter(&mut self, phase: SessionPhase) -> Outcome<State> {
        if self.phase != phase {
            debug!("session: phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        match phase {
            SessionPhase::Stopped => Transition(State::stopped()),
            SessionPhase::AwaitingTarget => Transition(State::awaiting_target()),
            SessionPhase::Connecting => Transition(State::connecting()),
            SessionPhase::Ready => Transition(State::ready()),
            SessionPhase::Unavailable => Transition(State::unavailable()),
        }
    }

    fn connected_link(&self) -> Option<&dyn Link> {
        self.link.as_deref().filter(|link| link.is_connected())
    }

    fn drop_link(&mut self) {
        if let Some(link) = self.link.take() {
            link.close();
        }
    }

    /// Stick and key input is forwarded only while the link is up, whatever the phase.
    fn forward_input(&self, event: &SessionEvent) {
        match *event {
            SessionEvent::StickMoved { side, position } => {
                if let Some(link) = self.connected_link() {
                    match side {
                        StickSide::Left => link.dispatch_left_stick(position),
                        StickSide::Right => link.dispatch_right_stick(position),
                    }
                }
            }
            SessionEvent::Key { key, pressed } => {
                if let Some(link) = self.connected_link() {
                    link.dispatch_button(key.button(), pressed);
                }
            }
            _ => {}
        }
    }

    fn on_target_loaded(
        &mut self,
        context: &mut DispatchContext,
        target: Option<&ConnectionTarget>,
    ) -> Outcome<State> {
        let Some(target) = target else {
            info!("session: no server configured");
            self.target = None;
            self.drop_link();
            if !self.settings_shown {
                self.settings_shown = true;
                context.notices.push(SessionNotice::OpenSettings);
            }
            return self.enter(SessionPhase::Unavailable);
        };

        if self.target.as_ref() != Some(target) {
            info!("session: server target={target}");
            self.drop_link();
            self.target = Some(target.clone());
        }
        self.attempts = 0;
        self.routine(context)
    }

    fn on_settings_failed(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        warn!("session: settings could not be loaded");
        context.notices.push(SessionNotice::CannotLoadSettings);
        self.enter(SessionPhase::Unavailable)
    }

    /// One retry-routine cycle: open a link when none is alive, give up after
    /// `max_attempts` consecutive failures, and re-send both sticks while connected.
    fn routine(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        context.rearm_timer = true;
        let Some(target) = self.target.clone() else {
            return self.enter(SessionPhase::Unavailable);
        };

        let alive = self
            .link
            .as_deref()
            .is_some_and(|link| link.is_connected() || link.is_connecting());
        if !alive {
            self.attempts = self.attempts.saturating_add(1);
            if self.attempts > self.max_attempts {
                warn!(
                    "session: giving up target={target} attempts={}",
                    self.max_attempts
                );
                self.drop_link();
                context.notices.push(SessionNotice::CannotConnect);
                return self.enter(SessionPhase::Unavailable);
            }
            info!("session: connect attempt={} target={target}", self.attempts);
            self.drop_link();
            self.link = Some(self.factory.open(&target));
        }

        let Some(link) = self.link.as_deref() else {
            return self.enter(SessionPhase::Connecting);
        };
        if link.is_connected() {
            link.dispatch_left_stick(context.sticks.left);
            link.dispatch_right_stick(context.sticks.right);
            self.attempts = 0;
            return self.enter(SessionPhase::Ready);
        }
        self.enter(SessionPhase::Connecting)
    }

    fn stop(&mut self) -> Outcome<State> {
        self.drop_link();
        self.enter(SessionPhase::Stopped)
    }
}

#[state_machine(initial = "State::stopped()")]
impl SessionMachine {
    #[state]
    fn stopped(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        let _ = context;
        match event {
            SessionEvent::Start => self.enter(SessionPhase::AwaitingTarget),
            _ => Handled,
        }
    }

    #[state(superstate = "running")]
    fn awaiting_target(
        &mut self,
        context: &mut DispatchContext,
        event: &SessionEvent,
    ) -> Outcome<State> {
        let _ = context;
        match event {
            SessionEvent::Tick => Handled,
            _ => Super,
        }
    }

    #[state(superstate = "running")]
    fn connecting(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Tick => self.routine(context),
            _ => Super,
        }
    }

    #[state(superstate = "running")]
    fn ready(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Tick => self.routine(context),
            _ => Super,
        }
    }

    /// Re-armed only by a fresh settings load.
    #[state(superstate = "running")]
    fn unavailable(
        &mut self,
        context: &mut DispatchContext,
        event: &SessionEvent,
    ) -> Outcome<State> {
        let _ = context;
        match event {
            SessionEvent::Tick => Handled,
            _ => Super,
        }
    }

    #[superstate]
    fn running(&mut self, context: &mut DispatchContext, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::TargetLoaded(target) => self.on_target_loaded(context, target.as_ref()),
            SessionEvent::SettingsFailed => self.on_settings_failed(context),
            SessionEvent::Stop => self.stop(),
            SessionEvent::StickMoved { .. } | SessionEvent::Key { .. } => {
                self.forward_input(event);
                Handled
            }
            SessionEvent::Start | SessionEvent::Tick => Handled,
        }
    }
}
