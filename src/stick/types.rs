use bitflags::bitflags;

use crate::config::{
    STICK_DEFAULT_NOTIFY_MIN_INTERVAL_MS, STICK_DEFAULT_SCALE, STICK_DEFAULT_SIZE_RATIO,
};

bitflags! {
    /// Degrees of freedom a stick is allowed to move along.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct StickAxes: u8 {
        const HORIZONTAL = 0x1;
        const VERTICAL = 0x2;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

impl StickAxes {
    /// Masks a persisted attribute value down to the known axis bits.
    pub fn from_persisted(value: u32) -> Self {
        Self::from_bits_truncate((value & u32::from(Self::BOTH.bits())) as u8)
    }
}

impl Default for StickAxes {
    fn default() -> Self {
        Self::BOTH
    }
}

/// Geometric policies of a stick. Changing any of them re-runs the clamp pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StickPolicy {
    pub axes: StickAxes,
    pub recenter_on_release: bool,
    pub fixed_center: bool,
}

impl Default for StickPolicy {
    fn default() -> Self {
        Self {
            axes: StickAxes::BOTH,
            recenter_on_release: true,
            fixed_center: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickConfig {
    pub scale: f32,
    pub stick_size_ratio: f32,
    pub policy: StickPolicy,
    pub notify_min_interval_ms: u64,
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            scale: STICK_DEFAULT_SCALE,
            stick_size_ratio: STICK_DEFAULT_SIZE_RATIO,
            policy: StickPolicy::default(),
            notify_min_interval_ms: STICK_DEFAULT_NOTIFY_MIN_INTERVAL_MS,
        }
    }
}

impl StickConfig {
    /// Returns a copy with both fractions clipped to `[0, 1]`.
    pub fn sanitized(mut self) -> Self {
        self.scale = clip_fraction_f32(self.scale);
        self.stick_size_ratio = clip_fraction_f32(self.stick_size_ratio);
        self
    }
}

/// Stick position in `[-1, 1] x [-1, 1]`; `y` grows downwards like screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedPosition {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPosition {
    pub const CENTER: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Touch input in widget coordinates (pixels, origin at the widget's top-left corner).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TouchAction {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyReason {
    TouchStart,
    Drag,
    TouchEnd,
    Programmatic,
}

/// Listener payload, sent whenever the widget decides to notify.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickMoved {
    pub t_ms: u64,
    pub reason: NotifyReason,
    pub position: NormalizedPosition,
    pub amplitude: f64,
    pub angle: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Padding {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Padding {
    pub const fn uniform(value: i32) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }
}

pub(crate) fn clip_fraction_f32(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub(crate) fn clip_fraction_f64(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
