pub mod decoration;
pub mod geometry;
pub mod gesture;
pub mod momentum;
pub mod mount;
pub mod scheduler;
pub mod velocity;

use crate::config::CarouselConfig;
use decoration::Decoration;
use geometry::{Breakpoint, BreakpointGeometry, LayoutSnapshot};
use gesture::{GestureMachine, GestureStep, PointerId, PointerKind};
use momentum::{MomentumController, MotionStep, SnapGrid};
use scheduler::{FrameScheduler, FrameTicket};
use serde::Serialize;

/// Rotations closer than this to a slot count as settled.
const SLOT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Grab,
    Grabbing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOutcome {
    pub breakpoint: Breakpoint,
    pub width: f64,
    pub content_height: f64,
}

/// Side effects the host must perform after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureResponse {
    pub relayout: bool,
    pub capture_pointer: bool,
    /// Suspend native scrolling and narrow the touch region (touch/pen only).
    pub lock_scroll: bool,
    pub release_scroll: bool,
    pub cursor: Option<CursorShape>,
    pub resized: Option<ResizeOutcome>,
}

impl GestureResponse {
    fn relayout() -> Self {
        Self {
            relayout: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameOutcome {
    pub relayout: bool,
    pub settled: bool,
    pub resized: Option<ResizeOutcome>,
}

#[derive(Debug, Clone)]
pub struct Carousel {
    config: CarouselConfig,
    width: f64,
    pending_width: Option<f64>,
    rotation: f64,
    gesture: GestureMachine,
    momentum: MomentumController,
    frames: FrameScheduler,
    outbox: Option<FrameTicket>,
}

impl Carousel {
    pub fn new(config: CarouselConfig, width: f64) -> Self {
        Self {
            gesture: GestureMachine::new(config.gesture_config()),
            momentum: MomentumController::new(config.momentum_config()),
            config,
            width,
            pending_width: None,
            rotation: 0.0,
            frames: FrameScheduler::default(),
            outbox: None,
        }
    }

    pub fn config(&self) -> &CarouselConfig {
        &self.config
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn total_cards(&self) -> usize {
        self.config.cards.len()
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.config.breakpoints.resolve(self.width)
    }

    pub fn geometry(&self) -> &BreakpointGeometry {
        self.config.breakpoints.geometry(self.breakpoint())
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    pub fn has_gesture(&self) -> bool {
        self.gesture.session().is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.momentum.is_active()
    }

    fn grid(&self) -> SnapGrid {
        SnapGrid {
            arc_span: self.geometry().arc_span,
            total_cards: self.total_cards(),
            mode: self.config.rotation,
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        geometry::snapshot(
            self.rotation,
            self.total_cards(),
            self.width,
            &self.config.breakpoints,
            &self.config.layout_options(),
        )
    }

    pub fn decoration(&self, container_height: f64, scale_factor: f64) -> Decoration {
        let geometry = self.geometry();
        Decoration::compute(
            &geometry.arc(self.width),
            self.breakpoint(),
            self.width,
            container_height,
            geometry.stable_height,
            scale_factor,
        )
    }

    pub fn take_frame_request(&mut self) -> Option<FrameTicket> {
        self.outbox.take()
    }

    fn set_rotation(&mut self, rotation: f64) {
        let grid = self.grid();
        self.rotation = grid.mode.constrain(rotation, grid.total_cards, grid.arc_span);
    }

    fn cancel_motion(&mut self) {
        self.momentum.stop();
        self.frames.cancel();
        self.outbox = None;
    }

    fn request_frame(&mut self) {
        if let Some(ticket) = self.frames.request() {
            self.outbox = Some(ticket);
        }
    }

    fn snap(&mut self, now_ms: f64) {
        let grid = self.grid();
        self.momentum.snap(self.rotation, &grid, now_ms);
        self.request_frame();
    }

    fn apply_width(&mut self, width: f64) -> ResizeOutcome {
        self.width = width;
        // Bounds depend on the arc span of the new breakpoint.
        self.set_rotation(self.rotation);
        let grid = self.grid();
        self.momentum.retarget(&grid);
        ResizeOutcome {
            breakpoint: self.breakpoint(),
            width,
            content_height: self.snapshot().content_height(),
        }
    }

    fn apply_pending_width(&mut self) -> Option<ResizeOutcome> {
        self.pending_width.take().map(|w| self.apply_width(w))
    }

    /// Puts the rotation back on a slot after an interrupted animation.
    fn resettle(&mut self, now_ms: f64) -> Option<ResizeOutcome> {
        let resized = self.apply_pending_width();
        let target = self.grid().target(self.rotation);
        if !self.momentum.is_active() && (target - self.rotation).abs() > SLOT_TOLERANCE {
            self.snap(now_ms);
        }
        resized
    }

    pub fn pointer_down(
        &mut self,
        pointer: PointerId,
        pos: Point,
        kind: PointerKind,
        primary: bool,
        now_ms: f64,
    ) -> GestureResponse {
        if self.gesture.pointer_down(pointer, pos, kind, primary, now_ms) == GestureStep::Started {
            self.cancel_motion();
        }
        GestureResponse::default()
    }

    pub fn pointer_move(&mut self, pointer: PointerId, pos: Point, now_ms: f64) -> GestureResponse {
        match self.gesture.pointer_move(pointer, pos, now_ms) {
            GestureStep::Committed {
                kind,
                rotation_delta,
            } => {
                self.set_rotation(self.rotation + rotation_delta);
                GestureResponse {
                    relayout: true,
                    capture_pointer: kind == PointerKind::Mouse,
                    lock_scroll: kind.locks_scroll(),
                    cursor: Some(CursorShape::Grabbing),
                    ..GestureResponse::default()
                }
            }
            GestureStep::Dragged { rotation_delta } => {
                self.set_rotation(self.rotation + rotation_delta);
                GestureResponse::relayout()
            }
            GestureStep::ScrollReleased => GestureResponse {
                resized: self.resettle(now_ms),
                ..GestureResponse::default()
            },
            _ => GestureResponse::default(),
        }
    }

    pub fn pointer_up(&mut self, pointer: PointerId, now_ms: f64) -> GestureResponse {
        match self.gesture.pointer_up(pointer) {
            GestureStep::Thrown { kind, velocity } => {
                self.momentum.throw(velocity);
                self.request_frame();
                GestureResponse {
                    release_scroll: kind.locks_scroll(),
                    cursor: Some(CursorShape::Grab),
                    ..GestureResponse::default()
                }
            }
            GestureStep::Abandoned => GestureResponse {
                resized: self.resettle(now_ms),
                ..GestureResponse::default()
            },
            _ => GestureResponse::default(),
        }
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId, now_ms: f64) -> GestureResponse {
        match self.gesture.pointer_cancel(pointer) {
            GestureStep::Cancelled { kind } => {
                let resized = self.apply_pending_width();
                self.snap(now_ms);
                GestureResponse {
                    release_scroll: kind.locks_scroll(),
                    cursor: Some(CursorShape::Grab),
                    resized,
                    ..GestureResponse::default()
                }
            }
            GestureStep::Abandoned => GestureResponse {
                resized: self.resettle(now_ms),
                ..GestureResponse::default()
            },
            _ => GestureResponse::default(),
        }
    }

    pub fn wheel(&mut self, delta_y: f64, now_ms: f64) -> GestureResponse {
        if !self.config.wheel || self.gesture.session().is_some() {
            return GestureResponse::default();
        }
        self.cancel_motion();
        self.set_rotation(self.rotation - delta_y * self.config.sensitivity);
        self.momentum.wait_for_quiet(now_ms, self.config.wheel_settle);
        self.request_frame();
        GestureResponse::relayout()
    }

    /// Container width changed. Deferred while a drag or decay owns the rotation.
    pub fn resize(&mut self, width: f64) -> Option<ResizeOutcome> {
        if self.gesture.is_dragging() || self.momentum.is_decaying() {
            self.pending_width = Some(width);
            return None;
        }
        self.pending_width = None;
        Some(self.apply_width(width))
    }

    pub fn frame(&mut self, ticket: FrameTicket, now_ms: f64) -> FrameOutcome {
        if !self.frames.accept(ticket) {
            return FrameOutcome::default();
        }

        let grid = self.grid();
        match self.momentum.step(self.rotation, now_ms, &grid) {
            MotionStep::Idle => FrameOutcome::default(),
            MotionStep::Waiting => {
                self.request_frame();
                FrameOutcome::default()
            }
            MotionStep::Advanced(rotation) => {
                self.set_rotation(rotation);
                self.request_frame();
                FrameOutcome {
                    relayout: true,
                    ..FrameOutcome::default()
                }
            }
            MotionStep::SnapStarted { .. } => {
                let resized = self.apply_pending_width();
                if resized.is_some() {
                    // Re-target on the grid of the new breakpoint.
                    let grid = self.grid();
                    self.momentum.snap(self.rotation, &grid, now_ms);
                }
                self.request_frame();
                FrameOutcome {
                    relayout: resized.is_some(),
                    resized,
                    ..FrameOutcome::default()
                }
            }
            MotionStep::Settled(rotation) => {
                self.set_rotation(rotation);
                FrameOutcome {
                    relayout: true,
                    settled: true,
                    resized: self.apply_pending_width(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Card, CardId};
    use geometry::RotationMode;

    const FRAME: f64 = 1000.0 / 60.0;
    const MOUSE: PointerId = PointerId(1);
    const WIDTH: f64 = 375.0;

    fn cards(n: u32) -> Vec<Card> {
        (1..=n)
            .map(|i| Card::new(CardId::from(i), format!("Card {i}"), "description"))
            .collect()
    }

    fn carousel(mode: RotationMode) -> Carousel {
        let config = CarouselConfig {
            cards: cards(5),
            rotation: mode,
            ..CarouselConfig::default()
        };
        Carousel::new(config, WIDTH)
    }

    /// Drives frames until the carousel stops asking for them.
    fn run_frames(c: &mut Carousel, mut now: f64) -> (f64, usize) {
        let mut frames = 0;
        while let Some(ticket) = c.take_frame_request() {
            now += FRAME;
            frames += 1;
            c.frame(ticket, now);
            assert!(frames < 10_000, "animation never settled");
        }
        (now, frames)
    }

    fn drag(c: &mut Carousel, from: f64, to: f64, steps: usize, now: f64) -> f64 {
        let mut now = now;
        c.pointer_down(MOUSE, Point::new(from, 200.0), PointerKind::Mouse, true, now);
        for i in 1..=steps {
            now += FRAME;
            let x = from + (to - from) * i as f64 / steps as f64;
            c.pointer_move(MOUSE, Point::new(x, 200.0), now);
        }
        now
    }

    #[test]
    fn test_drag_release_settles_on_a_slot() {
        let mut c = carousel(RotationMode::Infinite);
        let now = drag(&mut c, 100.0, 400.0, 10, 0.0);
        assert!(c.is_dragging());
        assert!((c.rotation() - 300.0 * 0.12).abs() < 1e-9);

        let response = c.pointer_up(MOUSE, now);
        assert_eq!(response.cursor, Some(CursorShape::Grab));
        assert!(c.is_animating());

        run_frames(&mut c, now);
        assert!(!c.is_animating());
        let arc = c.geometry().arc_span;
        assert_eq!(c.rotation(), (c.rotation() / arc).round() * arc);
        assert!(c.rotation() > 36.0, "momentum should carry past the release point");
    }

    #[test]
    fn test_commit_response_depends_on_pointer_kind() {
        let mut c = carousel(RotationMode::Infinite);
        c.pointer_down(MOUSE, Point::new(0.0, 0.0), PointerKind::Mouse, true, 0.0);
        let r = c.pointer_move(MOUSE, Point::new(20.0, 0.0), 16.0);
        assert!(r.relayout && r.capture_pointer && !r.lock_scroll);
        assert_eq!(r.cursor, Some(CursorShape::Grabbing));
        c.pointer_cancel(MOUSE, 32.0);
        run_frames(&mut c, 32.0);

        let finger = PointerId(9);
        c.pointer_down(finger, Point::new(0.0, 0.0), PointerKind::Touch, true, 1000.0);
        let r = c.pointer_move(finger, Point::new(-20.0, 0.0), 1016.0);
        assert!(r.lock_scroll && !r.capture_pointer);
        let r = c.pointer_up(finger, 1032.0);
        assert!(r.release_scroll);
    }

    #[test]
    fn test_pointer_down_cancels_momentum_and_stale_frames() {
        let mut c = carousel(RotationMode::Infinite);
        let now = drag(&mut c, 0.0, 300.0, 5, 0.0);
        c.pointer_up(MOUSE, now);
        let stale = c.take_frame_request().unwrap();
        c.frame(stale, now + FRAME);
        let stale = c.take_frame_request().unwrap();

        c.pointer_down(MOUSE, Point::new(50.0, 50.0), PointerKind::Mouse, true, now + 2.0 * FRAME);
        assert!(!c.is_animating());
        assert!(c.take_frame_request().is_none());

        let before = c.rotation();
        assert_eq!(c.frame(stale, now + 3.0 * FRAME), FrameOutcome::default());
        assert_eq!(c.rotation(), before);
    }

    #[test]
    fn test_cancel_snaps_without_momentum() {
        let mut c = carousel(RotationMode::Infinite);
        let now = drag(&mut c, 0.0, 100.0, 4, 0.0);
        // 100 px * 0.12 = 12 degrees, nearest slot is 18.
        c.pointer_cancel(MOUSE, now);
        run_frames(&mut c, now);
        assert_eq!(c.rotation(), 18.0);
    }

    #[test]
    fn test_tap_is_a_noop() {
        let mut c = carousel(RotationMode::Infinite);
        c.pointer_down(MOUSE, Point::new(10.0, 10.0), PointerKind::Mouse, true, 0.0);
        c.pointer_move(MOUSE, Point::new(13.0, 15.0), 10.0);
        let r = c.pointer_up(MOUSE, 20.0);
        assert_eq!(r, GestureResponse::default());
        assert_eq!(c.rotation(), 0.0);
        assert!(c.take_frame_request().is_none());
    }

    #[test]
    fn test_exclusive_commit_through_carousel() {
        let mut c = carousel(RotationMode::Infinite);
        c.pointer_down(MOUSE, Point::new(0.0, 0.0), PointerKind::Mouse, true, 0.0);
        assert!(!c.pointer_move(MOUSE, Point::new(3.0, 5.0), 10.0).relayout);
        assert!(!c.is_dragging());
        assert!(c.pointer_move(MOUSE, Point::new(13.0, 5.0), 20.0).relayout);
        assert!(c.is_dragging());
    }

    #[test]
    fn test_wheel_rotates_then_snaps_after_quiet_period() {
        let mut c = carousel(RotationMode::Infinite);
        let r = c.wheel(-50.0, 0.0);
        assert!(r.relayout);
        assert!((c.rotation() - 6.0).abs() < 1e-9);
        c.wheel(-50.0, 100.0);
        assert!((c.rotation() - 12.0).abs() < 1e-9);

        let (now, _) = run_frames(&mut c, 100.0);
        assert!(now >= 500.0);
        assert_eq!(c.rotation(), 18.0);
    }

    #[test]
    fn test_wheel_is_ignored_during_a_gesture() {
        let mut c = carousel(RotationMode::Infinite);
        c.pointer_down(MOUSE, Point::new(0.0, 0.0), PointerKind::Mouse, true, 0.0);
        assert_eq!(c.wheel(100.0, 5.0), GestureResponse::default());
        assert_eq!(c.rotation(), 0.0);
    }

    #[test]
    fn test_bounded_rotation_never_leaves_range() {
        let mut c = carousel(RotationMode::Bounded);
        let mut now = 0.0;
        for (from, to) in [(0.0, 2000.0), (2000.0, -3000.0), (0.0, 900.0), (900.0, -5000.0)] {
            now = drag(&mut c, from, to, 8, now);
            assert!(c.rotation() <= 0.0 && c.rotation() >= -72.0);
            c.pointer_up(MOUSE, now);
            while let Some(ticket) = c.take_frame_request() {
                now += FRAME;
                c.frame(ticket, now);
                assert!(c.rotation() <= 0.0 && c.rotation() >= -72.0);
            }
        }
        assert!(c.wheel(-10_000.0, now).relayout);
        assert_eq!(c.rotation(), 0.0);
    }

    #[test]
    fn test_resize_is_deferred_during_drag() {
        let mut c = carousel(RotationMode::Infinite);
        let now = drag(&mut c, 0.0, 60.0, 3, 0.0);
        assert_eq!(c.resize(1280.0), None);
        assert_eq!(c.breakpoint(), Breakpoint::Small);

        let r = c.pointer_cancel(MOUSE, now);
        let resized = r.resized.unwrap();
        assert_eq!(resized.breakpoint, Breakpoint::Large);
        assert!(resized.content_height > 0.0);
        run_frames(&mut c, now);
        assert_eq!(c.rotation() % 20.0, 0.0);
    }

    #[test]
    fn test_resize_at_rest_preserves_rotation() {
        let mut c = carousel(RotationMode::Infinite);
        c.wheel(-150.0, 0.0);
        run_frames(&mut c, 0.0);
        let rotation = c.rotation();
        let outcome = c.resize(900.0).unwrap();
        assert_eq!(outcome.breakpoint, Breakpoint::Medium);
        assert_eq!(c.rotation(), rotation);
    }

    #[test]
    fn test_resize_mid_snap_lands_on_new_grid() {
        let mut c = carousel(RotationMode::Infinite);
        let mut now = 0.0;
        c.wheel(-100.0, now);
        assert_eq!(c.rotation(), 12.0);
        while !matches!(c.momentum.motion(), momentum::Motion::Snap(_)) {
            let ticket = c.take_frame_request().unwrap();
            now += FRAME;
            c.frame(ticket, now);
        }
        for _ in 0..3 {
            let ticket = c.take_frame_request().unwrap();
            now += FRAME;
            c.frame(ticket, now);
        }

        let outcome = c.resize(1280.0).unwrap();
        assert_eq!(outcome.breakpoint, Breakpoint::Large);
        run_frames(&mut c, now);
        assert_eq!(c.rotation(), 20.0);
    }

    #[test]
    fn test_wheel_disabled_is_ignored() {
        let config = CarouselConfig {
            cards: cards(5),
            wheel: false,
            ..CarouselConfig::default()
        };
        let mut c = Carousel::new(config, WIDTH);
        assert_eq!(c.wheel(-100.0, 0.0), GestureResponse::default());
        assert_eq!(c.rotation(), 0.0);
        assert!(c.take_frame_request().is_none());
    }

    #[test]
    fn test_decoration_follows_current_breakpoint() {
        let c = carousel(RotationMode::Infinite);
        let deco = c.decoration(0.0, 2.0);
        assert_eq!(deco.height, 600.0 + decoration::EXTRA_TOP);
        assert_eq!(deco.raster.width, 750);
    }
}
