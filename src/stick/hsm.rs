use statig::prelude::*;

use super::geometry::StickGeometry;
use super::types::{NotifyReason, StickAxes, StickMoved, StickPolicy};

/// Touch in center-relative integer pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum RelativeTouch {
    Down { x: i32, y: i32 },
    Move { x: i32, y: i32 },
    Up,
}

#[derive(Clone, Copy, Debug)]
pub(super) enum StickHsmEvent {
    Touch { now_ms: u64, touch: RelativeTouch },
    Cancel { now_ms: u64 },
    Resize { now_ms: u64, radius: i32, stick_radius: i32 },
    SetNormalized { now_ms: u64, x: f64, y: f64 },
    SetPolar { now_ms: u64, amplitude: f64, angle: f64 },
    Center { now_ms: u64 },
    SetAxes(StickAxes),
    SetRecenter(bool),
    SetFixedCenter(bool),
    SetNotifyInterval(u64),
}

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct DispatchContext {
    pub(super) notification: Option<StickMoved>,
    pub(super) redraw: bool,
}

pub(super) struct StickHsm {
    pub(super) geometry: StickGeometry,
    notify_min_interval_ms: u64,
    last_notify_ms: Option<u64>,
}

impl StickHsm {
    pub(super) fn new(policy: StickPolicy, notify_min_interval_ms: u64) -> Self {
        Self {
            geometry: StickGeometry::new(policy),
            notify_min_interval_ms,
            last_notify_ms: None,
        }
    }

    pub(super) fn notify_min_interval_ms(&self) -> u64 {
        self.notify_min_interval_ms
    }

    fn notify(
        &mut self,
        context: &mut DispatchContext,
        now_ms: u64,
        reason: NotifyReason,
        forced: bool,
    ) {
        let due = self
            .last_notify_ms
            .is_none_or(|last| now_ms.saturating_sub(last) > self.notify_min_interval_ms);
        if !forced && !due {
            return;
        }
        self.last_notify_ms = Some(now_ms);
        context.notification = Some(StickMoved {
            t_ms: now_ms,
            reason,
            position: self.geometry.normalized(),
            amplitude: self.geometry.amplitude(),
            angle: self.geometry.angle(),
        });
    }

    fn start_drag(&mut self, context: &mut DispatchContext, now_ms: u64, x: i32, y: i32) {
        context.redraw |= self.geometry.begin_touch(x, y);
        self.notify(context, now_ms, NotifyReason::TouchStart, true);
    }

    fn finish_drag(&mut self, context: &mut DispatchContext, now_ms: u64) {
        context.redraw |= self.geometry.end_touch();
        self.notify(context, now_ms, NotifyReason::TouchEnd, true);
    }

    /// Events that behave the same whether or not a drag is in progress.
    fn apply_common(&mut self, context: &mut DispatchContext, event: &StickHsmEvent) {
        match *event {
            StickHsmEvent::SetNormalized { now_ms, x, y } => {
                if self.geometry.set_position_normalized(x, y) {
                    context.redraw = true;
                    self.notify(context, now_ms, NotifyReason::Programmatic, true);
                }
            }
            StickHsmEvent::SetPolar {
                now_ms,
                amplitude,
                angle,
            } => {
                if self.geometry.set_position_polar(amplitude, angle) {
                    context.redraw = true;
                    self.notify(context, now_ms, NotifyReason::Programmatic, true);
                }
            }
            StickHsmEvent::Center { now_ms } => {
                if self.geometry.center() {
                    context.redraw = true;
                    self.notify(context, now_ms, NotifyReason::Programmatic, true);
                }
            }
            StickHsmEvent::SetAxes(axes) => {
                context.redraw |= self.geometry.set_axes(axes);
            }
            StickHsmEvent::SetRecenter(recenter) => {
                context.redraw |= self.geometry.set_recenter_on_release(recenter);
            }
            StickHsmEvent::SetFixedCenter(fixed) => {
                context.redraw |= self.geometry.set_fixed_center(fixed);
            }
            StickHsmEvent::SetNotifyInterval(interval_ms) => {
                self.notify_min_interval_ms = interval_ms;
            }
            StickHsmEvent::Resize {
                radius,
                stick_radius,
                ..
            } => {
                self.geometry.resize(radius, stick_radius);
                context.redraw = true;
            }
            StickHsmEvent::Touch { .. } | StickHsmEvent::Cancel { .. } => {}
        }
    }
}

#[state_machine(initial = "State::idle()")]
impl StickHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &StickHsmEvent) -> Outcome<State> {
        match event {
            StickHsmEvent::Touch {
                now_ms,
                touch: RelativeTouch::Down { x, y },
            } => {
                self.start_drag(context, *now_ms, *x, *y);
                Transition(State::dragging())
            }
            // Moves and releases without a preceding press belong to nobody.
            StickHsmEvent::Touch { .. } | StickHsmEvent::Cancel { .. } => Handled,
            _ => {
                self.apply_common(context, event);
                Handled
            }
        }
    }

    #[state]
    fn dragging(&mut self, context: &mut DispatchContext, event: &StickHsmEvent) -> Outcome<State> {
        match event {
            StickHsmEvent::Touch { now_ms, touch } => match *touch {
                RelativeTouch::Down { x, y } => {
                    self.start_drag(context, *now_ms, x, y);
                    Handled
                }
                RelativeTouch::Move { x, y } => {
                    context.redraw |= self.geometry.move_touch(x, y);
                    self.notify(context, *now_ms, NotifyReason::Drag, false);
                    Handled
                }
                RelativeTouch::Up => {
                    self.finish_drag(context, *now_ms);
                    Transition(State::idle())
                }
            },
            StickHsmEvent::Cancel { now_ms } => {
                self.finish_drag(context, *now_ms);
                Transition(State::idle())
            }
            StickHsmEvent::Resize { now_ms, .. } => {
                // Relayout drops the touch session; report the resting value.
                self.apply_common(context, event);
                self.notify(context, *now_ms, NotifyReason::TouchEnd, true);
                Transition(State::idle())
            }
            _ => {
                self.apply_common(context, event);
                Handled
            }
        }
    }
}
