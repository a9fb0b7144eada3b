use super::types::{clip_fraction_f64, NormalizedPosition, StickAxes, StickPolicy};

#[cfg(test)]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StickPoint {
    pub x: i32,
    pub y: i32,
}

impl StickPoint {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    fn squared_len(self) -> i64 {
        let x = i64::from(self.x);
        let y = i64::from(self.y);
        x * x + y * y
    }
}

/// Read-only view of the pixel state, mostly for rendering and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StickState {
    pub radius_px: i32,
    pub stick_radius_px: i32,
    pub position: StickPoint,
    pub offset: StickPoint,
    pub touched: bool,
}

/// Clamped 2-D offset of one analog stick, in pixels relative to the widget center.
///
/// Every mutation ends with [`StickGeometry::clamp`], which restores the invariants:
/// the position lies inside the base circle, locked axes read exactly zero, and an
/// untouched stick with re-centering enabled rests at the origin. A degenerate stick
/// (either radius zero) is pinned at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StickGeometry {
    policy: StickPolicy,
    radius: i32,
    stick_radius: i32,
    position: StickPoint,
    offset: StickPoint,
    touched: bool,
}

impl Default for StickGeometry {
    fn default() -> Self {
        Self::new(StickPolicy::default())
    }
}

impl StickGeometry {
    pub fn new(policy: StickPolicy) -> Self {
        Self {
            policy,
            radius: 0,
            stick_radius: 0,
            position: StickPoint::ZERO,
            offset: StickPoint::ZERO,
            touched: false,
        }
    }

    pub fn policy(&self) -> StickPolicy {
        self.policy
    }

    pub fn state(&self) -> StickState {
        StickState {
            radius_px: self.radius,
            stick_radius_px: self.stick_radius,
            position: self.position,
            offset: self.offset,
            touched: self.touched,
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn stick_radius(&self) -> i32 {
        self.stick_radius
    }

    pub fn position(&self) -> StickPoint {
        self.position
    }

    pub fn offset(&self) -> StickPoint {
        self.offset
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn is_active(&self) -> bool {
        self.radius > 0 && self.stick_radius > 0
    }

    /// Applies new radii. Drops any touch session in progress and re-centers.
    pub fn resize(&mut self, radius: i32, stick_radius: i32) -> bool {
        let before = *self;
        self.radius = radius.max(0);
        self.stick_radius = stick_radius.max(0);
        self.touched = false;
        self.position = StickPoint::ZERO;
        self.offset = StickPoint::ZERO;
        *self != before
    }

    /// Starts a touch session at `(raw_x, raw_y)`, relative to the widget center.
    ///
    /// With a floating center the first contact becomes the local origin.
    pub fn begin_touch(&mut self, raw_x: i32, raw_y: i32) -> bool {
        let before = self.mutable_snapshot();
        if !self.policy.fixed_center {
            self.offset = StickPoint::new(raw_x, raw_y);
        }
        self.move_touch(raw_x, raw_y);
        self.mutable_snapshot() != before
    }

    pub fn move_touch(&mut self, raw_x: i32, raw_y: i32) -> bool {
        let before = self.mutable_snapshot();
        self.touched = true;
        self.position = StickPoint::new(
            raw_x.saturating_sub(self.offset.x),
            raw_y.saturating_sub(self.offset.y),
        );
        self.clamp();
        self.mutable_snapshot() != before
    }

    pub fn end_touch(&mut self) -> bool {
        let before = self.mutable_snapshot();
        self.touched = false;
        self.offset = StickPoint::ZERO;
        if self.policy.recenter_on_release {
            self.center();
        }
        self.mutable_snapshot() != before
    }

    /// Restores the geometry invariants. Returns whether position or offset changed.
    pub fn clamp(&mut self) -> bool {
        let before = (self.position, self.offset);

        if !self.is_active() {
            self.position = StickPoint::ZERO;
            self.offset = StickPoint::ZERO;
            return (self.position, self.offset) != before;
        }

        if self.policy.fixed_center && !self.offset.is_zero() {
            self.position = StickPoint::new(
                self.position.x.saturating_add(self.offset.x),
                self.position.y.saturating_add(self.offset.y),
            );
            self.offset = StickPoint::ZERO;
        }

        let radius_sq = i64::from(self.radius) * i64::from(self.radius);
        if self.position.squared_len() > radius_sq {
            self.position = project_inside(self.position, self.radius);
        }

        if !self.policy.axes.contains(StickAxes::HORIZONTAL) {
            self.position.x = 0;
        }
        if !self.policy.axes.contains(StickAxes::VERTICAL) {
            self.position.y = 0;
        }

        if !self.touched && self.policy.recenter_on_release {
            self.position = StickPoint::ZERO;
            self.offset = StickPoint::ZERO;
        }

        (self.position, self.offset) != before
    }

    pub fn center(&mut self) -> bool {
        let changed = !self.position.is_zero() || !self.offset.is_zero();
        self.position = StickPoint::ZERO;
        self.offset = StickPoint::ZERO;
        changed
    }

    /// Moves the stick programmatically. Inputs are clipped to `[-1, 1]`.
    pub fn set_position_normalized(&mut self, x: f64, y: f64) -> bool {
        let before = self.mutable_snapshot();
        let radius = f64::from(self.radius);
        // `as` truncates toward zero and maps NaN to 0.
        self.position = StickPoint::new(
            (clip_unit(x) * radius) as i32,
            (clip_unit(y) * radius) as i32,
        );
        self.clamp();
        self.mutable_snapshot() != before
    }

    /// Moves the stick using polar coordinates; `angle` is in radians, clockwise
    /// from the positive x axis in screen space.
    pub fn set_position_polar(&mut self, amplitude: f64, angle: f64) -> bool {
        let amplitude = clip_fraction_f64(amplitude);
        self.set_position_normalized(amplitude * angle.cos(), amplitude * angle.sin())
    }

    pub fn set_axes(&mut self, axes: StickAxes) -> bool {
        self.policy.axes = axes & StickAxes::BOTH;
        self.clamp()
    }

    pub fn set_recenter_on_release(&mut self, recenter: bool) -> bool {
        self.policy.recenter_on_release = recenter;
        self.clamp()
    }

    pub fn set_fixed_center(&mut self, fixed: bool) -> bool {
        self.policy.fixed_center = fixed;
        self.clamp()
    }

    pub fn x(&self) -> f64 {
        if self.radius <= 0 {
            return 0.0;
        }
        f64::from(self.position.x) / f64::from(self.radius)
    }

    pub fn y(&self) -> f64 {
        if self.radius <= 0 {
            return 0.0;
        }
        f64::from(self.position.y) / f64::from(self.radius)
    }

    pub fn normalized(&self) -> NormalizedPosition {
        NormalizedPosition::new(self.x(), self.y())
    }

    pub fn amplitude(&self) -> f64 {
        if self.radius <= 0 {
            return 0.0;
        }
        f64::from(self.position.x).hypot(f64::from(self.position.y)) / f64::from(self.radius)
    }

    pub fn angle(&self) -> f64 {
        f64::from(self.position.y).atan2(f64::from(self.position.x))
    }

    fn mutable_snapshot(&self) -> (StickPoint, StickPoint, bool) {
        (self.position, self.offset, self.touched)
    }
}

fn clip_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(-1.0, 1.0)
}

/// Scales `point` onto the circle of `radius`, keeping its angle. Components are
/// truncated toward zero, then trimmed one pixel at a time until the integer point
/// is inside the circle again.
fn project_inside(point: StickPoint, radius: i32) -> StickPoint {
    let magnitude = f64::from(point.x).hypot(f64::from(point.y));
    let scale = magnitude / f64::from(radius);
    let mut projected = StickPoint::new(
        (f64::from(point.x) / scale) as i32,
        (f64::from(point.y) / scale) as i32,
    );
    let radius_sq = i64::from(radius) * i64::from(radius);
    while projected.squared_len() > radius_sq {
        if projected.x.abs() >= projected.y.abs() {
            projected.x -= projected.x.signum();
        } else {
            projected.y -= projected.y.signum();
        }
    }
    projected
}
