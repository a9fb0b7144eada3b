use super::*;

fn geometry(policy: StickPolicy, radius: i32) -> StickGeometry {
    let mut geometry = StickGeometry::new(policy);
    geometry.resize(radius, radius / 3);
    geometry
}

fn floating() -> StickPolicy {
    StickPolicy {
        fixed_center: false,
        ..StickPolicy::default()
    }
}

fn assert_inside(geometry: &StickGeometry) {
    let p = geometry.position();
    let r = i64::from(geometry.radius());
    let len_sq = i64::from(p.x) * i64::from(p.x) + i64::from(p.y) * i64::from(p.y);
    assert!(len_sq <= r * r, "position {p:?} escapes radius {r}");
}

/// Small deterministic LCG so sweeps are reproducible without extra crates.
struct Lcg(u64);

impl Lcg {
    fn next_i32(&mut self, span: i32) -> i32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) as i64 % i64::from(2 * span + 1)) as i32 - span
    }
}

#[test]
fn touch_sweep_never_leaves_the_circle() {
    let mut rng = Lcg(7);
    for policy in [StickPolicy::default(), floating()] {
        let mut g = geometry(policy, 50);
        for step in 0..2_000 {
            let (x, y) = (rng.next_i32(400), rng.next_i32(400));
            match step % 7 {
                0 => {
                    g.begin_touch(x, y);
                }
                6 => {
                    g.end_touch();
                }
                _ => {
                    g.move_touch(x, y);
                }
            }
            assert_inside(&g);
        }
    }
}

#[test]
fn far_touch_projects_onto_boundary_preserving_direction() {
    let mut g = geometry(StickPolicy::default(), 50);
    g.begin_touch(300, 400);
    assert_eq!(g.position(), StickPoint::new(30, 40));
    assert!((g.amplitude() - 1.0).abs() < 1e-9);
    assert!((g.angle() - 400f64.atan2(300.0)).abs() < 1e-9);
}

#[test]
fn locked_axis_reads_exactly_zero() {
    let horizontal_only = StickPolicy {
        axes: StickAxes::HORIZONTAL,
        ..StickPolicy::default()
    };
    let mut g = geometry(horizontal_only, 60);
    let mut rng = Lcg(11);
    for _ in 0..500 {
        g.move_touch(rng.next_i32(200), rng.next_i32(200));
        assert_eq!(g.position().y, 0);
        assert_eq!(g.y(), 0.0);
    }

    let mut g = geometry(StickPolicy::default(), 60);
    g.begin_touch(20, 25);
    assert!(g.set_axes(StickAxes::VERTICAL));
    assert_eq!(g.position(), StickPoint::new(0, 25));
}

#[test]
fn clamp_is_idempotent() {
    let mut rng = Lcg(3);
    let mut g = geometry(floating(), 40);
    for _ in 0..200 {
        g.move_touch(rng.next_i32(120), rng.next_i32(120));
        g.clamp();
        let first = g.state();
        assert!(!g.clamp());
        assert_eq!(g.state(), first);
    }
}

#[test]
fn polar_round_trip_within_pixel_rounding() {
    let mut g = geometry(StickPolicy::default(), 100);
    g.begin_touch(0, 0);
    for (amplitude, angle) in [(0.5, 1.0), (1.0, -2.5), (0.8, 3.0), (0.25, -0.3)] {
        g.set_position_polar(amplitude, angle);
        assert!((g.amplitude() - amplitude).abs() < 0.02, "{amplitude} {angle}");
        assert!((g.angle() - angle).abs() < 0.05, "{amplitude} {angle}");
    }
}

#[test]
fn polar_amplitude_is_clipped() {
    let mut g = geometry(StickPolicy::default(), 100);
    g.begin_touch(0, 0);
    g.set_position_polar(3.0, 0.0);
    assert!((g.amplitude() - 1.0).abs() < 0.02);
    g.set_position_polar(-1.0, 1.0);
    assert_eq!(g.position(), StickPoint::ZERO);
}

#[test]
fn normalized_inputs_are_clipped() {
    let mut g = geometry(StickPolicy::default(), 80);
    g.begin_touch(0, 0);
    g.set_position_normalized(4.0, 0.0);
    assert_eq!(g.position(), StickPoint::new(80, 0));
    g.set_position_normalized(f64::NAN, -2.0);
    assert_eq!(g.position(), StickPoint::new(0, -80));
}

#[test]
fn release_recenters_when_enabled() {
    let mut g = geometry(StickPolicy::default(), 50);
    g.begin_touch(10, -20);
    assert!(g.end_touch());
    assert_eq!(g.normalized(), NormalizedPosition::CENTER);
    assert!(!g.is_touched());
}

#[test]
fn release_keeps_position_without_recenter() {
    let sticky = StickPolicy {
        recenter_on_release: false,
        ..StickPolicy::default()
    };
    let mut g = geometry(sticky, 50);
    g.begin_touch(10, -20);
    g.end_touch();
    assert_eq!(g.position(), StickPoint::new(10, -20));
}

#[test]
fn floating_center_uses_first_contact_as_origin() {
    let mut g = geometry(floating(), 50);
    g.begin_touch(10, 0);
    assert_eq!(g.offset(), StickPoint::new(10, 0));
    assert_eq!(g.position(), StickPoint::ZERO);
    g.move_touch(30, 0);
    assert_eq!(g.position(), StickPoint::new(20, 0));
}

#[test]
fn fixing_the_center_folds_the_offset_back() {
    let mut g = geometry(floating(), 50);
    g.begin_touch(10, 5);
    g.move_touch(20, 5);
    assert!(g.set_fixed_center(true));
    assert_eq!(g.offset(), StickPoint::ZERO);
    assert_eq!(g.position(), StickPoint::new(20, 5));
}

#[test]
fn degenerate_radius_pins_the_stick() {
    let mut g = StickGeometry::default();
    g.resize(-5, 10);
    assert!(!g.is_active());
    g.begin_touch(12, 12);
    assert_eq!(g.position(), StickPoint::ZERO);
    assert_eq!(g.x(), 0.0);
    assert_eq!(g.amplitude(), 0.0);
}

#[test]
fn resize_drops_touch_and_recenters() {
    let mut g = geometry(StickPolicy::default(), 50);
    g.begin_touch(20, 20);
    assert!(g.resize(100, 33));
    assert!(!g.is_touched());
    assert_eq!(g.position(), StickPoint::ZERO);
}

#[test]
fn untouched_recenter_policy_forces_origin() {
    let sticky = StickPolicy {
        recenter_on_release: false,
        ..StickPolicy::default()
    };
    let mut g = geometry(sticky, 50);
    g.begin_touch(10, 10);
    g.end_touch();
    assert!(g.set_recenter_on_release(true));
    assert_eq!(g.position(), StickPoint::ZERO);
}
