use super::*;

fn floating_widget() -> StickWidget {
    let config = StickConfig {
        scale: 0.5,
        policy: StickPolicy {
            fixed_center: false,
            ..StickPolicy::default()
        },
        ..StickConfig::default()
    };
    let mut widget = StickWidget::new(config, StickAppearance::default());
    widget.set_size(0, 200, 200, Padding::default());
    widget
}

fn fixed_widget() -> StickWidget {
    let mut widget = StickWidget::new(
        StickConfig {
            scale: 0.5,
            ..StickConfig::default()
        },
        StickAppearance::default(),
    );
    widget.set_size(0, 200, 200, Padding::default());
    widget
}

#[test]
fn layout_uses_the_shorter_usable_side() {
    let mut widget = StickWidget::default();
    widget.set_size(0, 300, 200, Padding::uniform(10));
    let layout = widget.layout();
    assert_eq!(layout.radius, 67);
    assert_eq!(layout.stick_radius, 22);
    assert_eq!((layout.center_x, layout.center_y), (150, 100));
    assert_eq!(measure(300, 200), 200);
}

#[test]
fn floating_center_drag_reports_relative_motion() {
    let mut widget = floating_widget();
    assert_eq!(widget.layout().radius, 50);
    assert_eq!((widget.layout().center_x, widget.layout().center_y), (100, 100));

    let start = widget
        .on_touch(0, TouchAction::Down { x: 110.0, y: 100.0 })
        .unwrap();
    assert_eq!(start.reason, NotifyReason::TouchStart);
    assert_eq!(start.position, NormalizedPosition::CENTER);
    assert_eq!(widget.geometry().offset(), StickPoint::new(10, 0));

    assert!(widget
        .on_touch(10, TouchAction::Move { x: 130.0, y: 100.0 })
        .is_none());
    assert_eq!(widget.geometry().position(), StickPoint::new(20, 0));
    assert!((widget.x() - 0.4).abs() < 1e-9);
}

#[test]
fn drag_notifications_are_rate_limited() {
    let mut widget = fixed_widget();
    widget.on_touch(0, TouchAction::Down { x: 100.0, y: 100.0 });
    assert!(widget
        .on_touch(50, TouchAction::Move { x: 110.0, y: 100.0 })
        .is_none());
    let moved = widget
        .on_touch(51, TouchAction::Move { x: 120.0, y: 100.0 })
        .unwrap();
    assert_eq!(moved.reason, NotifyReason::Drag);
    assert!((moved.position.x - 0.4).abs() < 1e-9);

    let released = widget.on_touch(52, TouchAction::Up).unwrap();
    assert_eq!(released.reason, NotifyReason::TouchEnd);
    assert_eq!(released.position, NormalizedPosition::CENTER);
    assert_eq!(released.amplitude, 0.0);
}

#[test]
fn listener_receives_every_emitted_notification() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut widget = fixed_widget();
    widget.set_listener(Some(tx));
    widget.on_touch(0, TouchAction::Down { x: 130.0, y: 140.0 });
    widget.on_touch(5, TouchAction::Move { x: 131.0, y: 140.0 });
    widget.on_touch(6, TouchAction::Up);

    let received: Vec<_> = rx.try_iter().map(|m| m.reason).collect();
    assert_eq!(
        received,
        [NotifyReason::TouchStart, NotifyReason::TouchEnd]
    );
}

#[test]
fn dropped_listener_is_forgotten() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut widget = fixed_widget();
    widget.set_listener(Some(tx));
    drop(rx);
    assert!(widget
        .on_touch(0, TouchAction::Down { x: 120.0, y: 100.0 })
        .is_some());
    assert!(widget.listener.is_none());
}

#[test]
fn disabling_ends_the_drag_and_ignores_touches() {
    let mut widget = fixed_widget();
    widget.on_touch(0, TouchAction::Down { x: 120.0, y: 100.0 });
    let ended = widget.set_enabled(1, false).unwrap();
    assert_eq!(ended.reason, NotifyReason::TouchEnd);
    assert!(!widget.geometry().is_touched());

    assert!(widget
        .on_touch(100, TouchAction::Down { x: 120.0, y: 100.0 })
        .is_none());
    assert_eq!(widget.position(), NormalizedPosition::CENTER);

    assert!(widget.set_enabled(101, true).is_none());
    assert!(widget
        .on_touch(200, TouchAction::Down { x: 120.0, y: 100.0 })
        .is_some());
}

#[test]
fn programmatic_moves_always_notify_when_changed() {
    let mut widget = fixed_widget();
    widget.set_recenter_on_release(false);
    let first = widget.set_position_normalized(0, 0.5, -0.5).unwrap();
    assert_eq!(first.reason, NotifyReason::Programmatic);
    assert_eq!(first.position, NormalizedPosition::new(0.5, -0.5));

    // Within the drag interval, yet still reported.
    assert!(widget.set_position_polar(1, 1.0, 0.0).is_some());
    assert!(widget.set_position_polar(2, 1.0, 0.0).is_none());

    assert!(widget.center_stick(3).is_some());
    assert!(widget.center_stick(4).is_none());
}

#[test]
fn untouched_stick_holds_programmatic_moves_only_without_recenter() {
    // With recentering on, an untouched stick is forced back to the origin.
    let mut widget = fixed_widget();
    assert!(widget.set_position_normalized(0, 0.5, 0.0).is_none());
    assert_eq!(widget.position(), NormalizedPosition::CENTER);

    widget.set_recenter_on_release(false);
    assert!(widget.set_position_normalized(1, 0.5, 0.0).is_some());
    assert_eq!(widget.position(), NormalizedPosition::new(0.5, 0.0));
}

#[test]
fn relayout_drops_the_touch_session() {
    let mut widget = fixed_widget();
    widget.on_touch(0, TouchAction::Down { x: 120.0, y: 100.0 });
    let ended = widget.set_scale(10, 1.0).unwrap();
    assert_eq!(ended.reason, NotifyReason::TouchEnd);
    assert_eq!(widget.layout().radius, 100);
    assert!(!widget.geometry().is_touched());

    // Moves after the relayout belong to no touch session.
    assert!(widget
        .on_touch(100, TouchAction::Move { x: 150.0, y: 100.0 })
        .is_none());
    assert_eq!(widget.position(), NormalizedPosition::CENTER);
}

#[test]
fn setters_clip_and_report_back() {
    let mut widget = fixed_widget();
    widget.set_scale(0, 7.0);
    widget.set_stick_size_ratio(0, -1.0);
    widget.set_axes(StickAxes::VERTICAL);
    widget.set_notify_min_interval_ms(5);
    let config = widget.config();
    assert_eq!(config.scale, 1.0);
    assert_eq!(config.stick_size_ratio, 0.0);
    assert_eq!(config.policy.axes, StickAxes::VERTICAL);
    assert_eq!(config.notify_min_interval_ms, 5);
    assert!(!widget.geometry().is_active());
}

#[test]
fn redraw_requests_are_taken_once() {
    let mut widget = fixed_widget();
    assert!(widget.take_redraw_request());
    assert!(!widget.take_redraw_request());
    widget.on_touch(0, TouchAction::Down { x: 140.0, y: 100.0 });
    assert!(widget.take_redraw_request());
    assert!(!widget.take_redraw_request());
}

#[test]
fn style_builds_a_widget() {
    let style = StickStyle::from_toml_str("enabled = false\njoystick_axis = 1")
        .unwrap()
        .resolve()
        .unwrap();
    let widget = StickWidget::from_style(&style);
    assert!(!widget.is_enabled());
    assert_eq!(widget.config().policy.axes, StickAxes::HORIZONTAL);
}

#[test]
fn resize_during_drag_reports_release_at_the_resize_time() {
    let mut widget = fixed_widget();
    widget.on_touch(0, TouchAction::Down { x: 100.0, y: 100.0 });
    widget.on_touch(200, TouchAction::Move { x: 130.0, y: 100.0 });

    let released = widget.set_size(500, 300, 300, Padding::default()).unwrap();
    assert_eq!(released.t_ms, 500);
    assert_eq!(released.reason, NotifyReason::TouchEnd);
    assert_eq!(released.position, NormalizedPosition::CENTER);
    assert_eq!(widget.layout().radius, 75);

    // The touch session is gone; a later move is ignored.
    assert!(widget
        .on_touch(600, TouchAction::Move { x: 160.0, y: 150.0 })
        .is_none());
}
