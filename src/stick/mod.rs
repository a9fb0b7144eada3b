//! On-screen analog stick: geometry, touch handling, listener notifications and rendering.

mod geometry;
mod hsm;
#[cfg(feature = "graphics")]
mod render;
pub mod style;
mod types;

#[cfg(test)]
mod tests;

use crossbeam_channel::Sender;
use log::debug;
use statig::blocking::IntoStateMachineExt as _;

pub use geometry::{StickGeometry, StickPoint, StickState};
#[cfg(feature = "graphics")]
pub use render::{SpriteCache, StickSprite};
pub use style::{Paint, ResolvedStyle, StickAppearance, StickImage, StickStyle};
pub use types::{
    NormalizedPosition, NotifyReason, Padding, StickAxes, StickConfig, StickMoved, StickPolicy,
    TouchAction,
};

use hsm::{DispatchContext, RelativeTouch, StickHsm, StickHsmEvent};
use types::clip_fraction_f32;

/// Pixel layout derived from the widget size, padding, scale and border width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StickLayout {
    pub width: i32,
    pub height: i32,
    pub padding: Padding,
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
    pub stick_radius: i32,
}

impl StickLayout {
    fn compute(
        width: i32,
        height: i32,
        padding: Padding,
        scale: f32,
        stick_size_ratio: f32,
        border_width: i32,
    ) -> Self {
        let usable_width = width - padding.left - padding.right;
        let usable_height = height - padding.top - padding.bottom;
        let dimension = (scale * usable_width.min(usable_height) as f32) as i32;
        let (radius, stick_radius) = if dimension <= 0 {
            (0, 0)
        } else {
            let radius = ((dimension - border_width.max(0)) / 2).max(0);
            (radius, (radius as f32 * stick_size_ratio) as i32)
        };
        Self {
            width,
            height,
            padding,
            center_x: padding.left + usable_width / 2,
            center_y: padding.top + usable_height / 2,
            radius,
            stick_radius,
        }
    }
}

/// Square side for a widget offered `width x height`.
pub fn measure(width: i32, height: i32) -> i32 {
    width.min(height).max(0)
}

pub struct StickWidget {
    machine: statig::blocking::StateMachine<StickHsm>,
    config: StickConfig,
    appearance: StickAppearance,
    enabled: bool,
    layout: StickLayout,
    listener: Option<Sender<StickMoved>>,
    redraw_pending: bool,
    #[cfg(feature = "graphics")]
    sprites: SpriteCache,
}

impl Default for StickWidget {
    fn default() -> Self {
        Self::new(StickConfig::default(), StickAppearance::default())
    }
}

impl StickWidget {
    pub fn new(config: StickConfig, appearance: StickAppearance) -> Self {
        let config = config.sanitized();
        Self {
            machine: StickHsm::new(config.policy, config.notify_min_interval_ms).state_machine(),
            config,
            appearance,
            enabled: true,
            layout: StickLayout::default(),
            listener: None,
            redraw_pending: true,
            #[cfg(feature = "graphics")]
            sprites: SpriteCache::default(),
        }
    }

    pub fn from_style(style: &ResolvedStyle) -> Self {
        let mut widget = Self::new(style.config, style.appearance.clone());
        widget.enabled = style.enabled;
        widget
    }

    /// Registers the listener; replaces any previous one. `None` silences notifications.
    pub fn set_listener(&mut self, listener: Option<Sender<StickMoved>>) {
        self.listener = listener;
    }

    pub fn config(&self) -> StickConfig {
        StickConfig {
            policy: self.geometry().policy(),
            notify_min_interval_ms: self.machine.inner().notify_min_interval_ms(),
            ..self.config
        }
    }

    pub fn appearance(&self) -> &StickAppearance {
        &self.appearance
    }

    pub fn layout(&self) -> StickLayout {
        self.layout
    }

    pub fn geometry(&self) -> &StickGeometry {
        &self.machine.inner().geometry
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Recomputes radii and center for a new widget size. Any touch in progress is
    /// dropped and the stick re-centers.
    pub fn set_size(
        &mut self,
        now_ms: u64,
        width: i32,
        height: i32,
        padding: Padding,
    ) -> Option<StickMoved> {
        self.layout.width = width;
        self.layout.height = height;
        self.layout.padding = padding;
        self.relayout(now_ms)
    }

    fn relayout(&mut self, now_ms: u64) -> Option<StickMoved> {
        self.layout = StickLayout::compute(
            self.layout.width,
            self.layout.height,
            self.layout.padding,
            self.config.scale,
            self.config.stick_size_ratio,
            self.appearance.border_width,
        );
        debug!(
            "stick layout center=({}, {}) radius={} stick_radius={}",
            self.layout.center_x, self.layout.center_y, self.layout.radius, self.layout.stick_radius
        );
        self.dispatch(StickHsmEvent::Resize {
            now_ms,
            radius: self.layout.radius,
            stick_radius: self.layout.stick_radius,
        })
    }

    /// Feeds one touch action in widget coordinates. Returns the notification, if
    /// one was emitted; it is also sent to the listener.
    pub fn on_touch(&mut self, now_ms: u64, action: TouchAction) -> Option<StickMoved> {
        if !self.enabled {
            return None;
        }
        let cx = self.layout.center_x as f32;
        let cy = self.layout.center_y as f32;
        let touch = match action {
            TouchAction::Down { x, y } => RelativeTouch::Down {
                x: (x - cx) as i32,
                y: (y - cy) as i32,
            },
            TouchAction::Move { x, y } => RelativeTouch::Move {
                x: (x - cx) as i32,
                y: (y - cy) as i32,
            },
            TouchAction::Up => RelativeTouch::Up,
        };
        self.dispatch(StickHsmEvent::Touch { now_ms, touch })
    }

    /// Disabling ends any drag in progress; touches are ignored while disabled.
    pub fn set_enabled(&mut self, now_ms: u64, enabled: bool) -> Option<StickMoved> {
        if self.enabled == enabled {
            return None;
        }
        self.enabled = enabled;
        self.redraw_pending = true;
        if enabled {
            return None;
        }
        self.dispatch(StickHsmEvent::Cancel { now_ms })
    }

    pub fn x(&self) -> f64 {
        self.geometry().x()
    }

    pub fn y(&self) -> f64 {
        self.geometry().y()
    }

    pub fn position(&self) -> NormalizedPosition {
        self.geometry().normalized()
    }

    pub fn amplitude(&self) -> f64 {
        self.geometry().amplitude()
    }

    pub fn angle(&self) -> f64 {
        self.geometry().angle()
    }

    pub fn set_position_normalized(&mut self, now_ms: u64, x: f64, y: f64) -> Option<StickMoved> {
        self.dispatch(StickHsmEvent::SetNormalized { now_ms, x, y })
    }

    pub fn set_position_polar(
        &mut self,
        now_ms: u64,
        amplitude: f64,
        angle: f64,
    ) -> Option<StickMoved> {
        self.dispatch(StickHsmEvent::SetPolar {
            now_ms,
            amplitude,
            angle,
        })
    }

    pub fn center_stick(&mut self, now_ms: u64) -> Option<StickMoved> {
        self.dispatch(StickHsmEvent::Center { now_ms })
    }

    pub fn set_scale(&mut self, now_ms: u64, scale: f32) -> Option<StickMoved> {
        let scale = clip_fraction_f32(scale);
        if self.config.scale == scale {
            return None;
        }
        self.config.scale = scale;
        self.relayout(now_ms)
    }

    pub fn set_stick_size_ratio(&mut self, now_ms: u64, ratio: f32) -> Option<StickMoved> {
        let ratio = clip_fraction_f32(ratio);
        if self.config.stick_size_ratio == ratio {
            return None;
        }
        self.config.stick_size_ratio = ratio;
        self.relayout(now_ms)
    }

    pub fn set_border_width(&mut self, now_ms: u64, width: i32) -> Option<StickMoved> {
        let width = width.max(0);
        if self.appearance.border_width == width {
            return None;
        }
        self.appearance.border_width = width;
        self.relayout(now_ms)
    }

    pub fn set_appearance(&mut self, now_ms: u64, appearance: StickAppearance) -> Option<StickMoved> {
        let relayout = appearance.border_width != self.appearance.border_width;
        self.appearance = appearance;
        self.appearance.border_width = self.appearance.border_width.max(0);
        self.redraw_pending = true;
        if relayout {
            return self.relayout(now_ms);
        }
        None
    }

    pub fn set_axes(&mut self, axes: StickAxes) {
        self.dispatch(StickHsmEvent::SetAxes(axes));
    }

    pub fn set_recenter_on_release(&mut self, recenter: bool) {
        self.dispatch(StickHsmEvent::SetRecenter(recenter));
    }

    pub fn set_fixed_center(&mut self, fixed: bool) {
        self.dispatch(StickHsmEvent::SetFixedCenter(fixed));
    }

    pub fn set_notify_min_interval_ms(&mut self, interval_ms: u64) {
        self.dispatch(StickHsmEvent::SetNotifyInterval(interval_ms));
    }

    /// Returns `true` once after any visible change.
    pub fn take_redraw_request(&mut self) -> bool {
        core::mem::take(&mut self.redraw_pending)
    }

    fn dispatch(&mut self, event: StickHsmEvent) -> Option<StickMoved> {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        self.redraw_pending |= context.redraw;
        let notification = context.notification?;
        if let Some(listener) = &self.listener {
            if listener.send(notification).is_err() {
                debug!("stick listener dropped; notifications silenced");
                self.listener = None;
            }
        }
        Some(notification)
    }
}
