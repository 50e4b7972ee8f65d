use super::geometry::RotationMode;
use std::time::Duration;

pub const DEFAULT_DECAY: f64 = 0.93;
pub const DEFAULT_EPSILON: f64 = 0.5;
pub const DEFAULT_SNAP_DURATION: Duration = Duration::from_millis(400);
pub const DEFAULT_WHEEL_SETTLE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumConfig {
    pub sensitivity: f64,
    pub decay: f64,
    pub epsilon: f64,
    pub snap_duration: Duration,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            sensitivity: super::gesture::DEFAULT_SENSITIVITY,
            decay: DEFAULT_DECAY,
            epsilon: DEFAULT_EPSILON,
            snap_duration: DEFAULT_SNAP_DURATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGrid {
    pub arc_span: f64,
    pub total_cards: usize,
    pub mode: RotationMode,
}

impl SnapGrid {
    pub fn target(&self, rotation: f64) -> f64 {
        let rotation = self.mode.constrain(rotation, self.total_cards, self.arc_span);
        if self.arc_span <= 0.0 {
            return rotation;
        }
        (rotation / self.arc_span).round() * self.arc_span
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTween {
    pub from: f64,
    pub to: f64,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl SnapTween {
    pub fn new(from: f64, to: f64, start_ms: f64, duration: Duration) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: duration.as_secs_f64() * 1000.0,
        }
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn sample(&self, now_ms: f64) -> (f64, bool) {
        let t = self.progress(now_ms);
        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from + (self.to - self.from) * ease_out_cubic(t), false)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Motion {
    #[default]
    Idle,
    Decay {
        velocity: f64,
    },
    WheelQuiet {
        deadline_ms: f64,
    },
    Snap(SnapTween),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    Idle,
    Waiting,
    Advanced(f64),
    /// Decay or wheel quiet period ended; a snap tween starts from here.
    SnapStarted {
        target: f64,
    },
    Settled(f64),
}

#[derive(Debug, Clone, Default)]
pub struct MomentumController {
    config: MomentumConfig,
    motion: Motion,
}

impl MomentumController {
    pub fn new(config: MomentumConfig) -> Self {
        Self {
            config,
            motion: Motion::Idle,
        }
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn is_active(&self) -> bool {
        self.motion != Motion::Idle
    }

    pub fn is_decaying(&self) -> bool {
        matches!(self.motion, Motion::Decay { .. })
    }

    pub fn stop(&mut self) {
        self.motion = Motion::Idle;
    }

    pub fn throw(&mut self, velocity: f64) {
        self.motion = Motion::Decay { velocity };
    }

    pub fn wait_for_quiet(&mut self, now_ms: f64, quiet: Duration) {
        self.motion = Motion::WheelQuiet {
            deadline_ms: now_ms + quiet.as_secs_f64() * 1000.0,
        };
    }

    pub fn snap(&mut self, rotation: f64, grid: &SnapGrid, now_ms: f64) -> f64 {
        let target = grid.target(rotation);
        self.motion = Motion::Snap(SnapTween::new(
            rotation,
            target,
            now_ms,
            self.config.snap_duration,
        ));
        target
    }

    /// Moves a running snap onto `grid` without restarting its tween.
    pub fn retarget(&mut self, grid: &SnapGrid) {
        if let Motion::Snap(tween) = &mut self.motion {
            tween.to = grid.target(tween.to);
        }
    }

    pub fn step(&mut self, rotation: f64, now_ms: f64, grid: &SnapGrid) -> MotionStep {
        match self.motion {
            Motion::Idle => MotionStep::Idle,
            Motion::Decay { velocity } => {
                let velocity = velocity * self.config.decay;
                if velocity.abs() > self.config.epsilon {
                    self.motion = Motion::Decay { velocity };
                    MotionStep::Advanced(rotation + velocity * self.config.sensitivity)
                } else {
                    let target = self.snap(rotation, grid, now_ms);
                    MotionStep::SnapStarted { target }
                }
            }
            Motion::WheelQuiet { deadline_ms } => {
                if now_ms < deadline_ms {
                    MotionStep::Waiting
                } else {
                    let target = self.snap(rotation, grid, now_ms);
                    MotionStep::SnapStarted { target }
                }
            }
            Motion::Snap(tween) => {
                let (value, done) = tween.sample(now_ms);
                if done {
                    self.motion = Motion::Idle;
                    MotionStep::Settled(value)
                } else {
                    MotionStep::Advanced(value)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1000.0 / 60.0;

    fn grid() -> SnapGrid {
        SnapGrid {
            arc_span: 18.0,
            total_cards: 5,
            mode: RotationMode::Infinite,
        }
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
        assert_eq!(ease_out_cubic(2.0), 1.0);
    }

    #[test]
    fn test_snap_target_rounds_to_slot() {
        let g = grid();
        assert_eq!(g.target(10.0), 18.0);
        assert_eq!(g.target(8.0), 0.0);
        assert_eq!(g.target(-30.0), -36.0);
        assert_eq!(g.target(400.0), 396.0);
    }

    #[test]
    fn test_bounded_snap_target_is_clamped_first() {
        let g = SnapGrid {
            mode: RotationMode::Bounded,
            ..grid()
        };
        assert_eq!(g.target(25.0), 0.0);
        assert_eq!(g.target(-95.0), -72.0);
    }

    #[test]
    fn test_decay_terminates_and_snaps_once() {
        let config = MomentumConfig {
            decay: 0.92,
            epsilon: 0.3,
            ..MomentumConfig::default()
        };
        let mut controller = MomentumController::new(config);
        controller.throw(10.0);

        let bound = ((0.3f64 / 10.0).ln() / 0.92f64.ln()).ceil() as usize;
        let mut rotation = 0.0;
        let mut now = 0.0;
        let mut frames = 0;
        let mut snaps = 0;

        loop {
            now += FRAME;
            match controller.step(rotation, now, &grid()) {
                MotionStep::Advanced(r) => {
                    rotation = r;
                    if controller.is_decaying() {
                        frames += 1;
                    }
                }
                MotionStep::SnapStarted { .. } => {
                    frames += 1;
                    snaps += 1;
                }
                MotionStep::Settled(r) => {
                    rotation = r;
                    break;
                }
                MotionStep::Waiting | MotionStep::Idle => unreachable!(),
            }
            assert!(frames <= bound + 1, "decay never terminated");
        }

        assert!(frames <= bound, "took {frames} frames, bound {bound}");
        assert_eq!(snaps, 1);
        assert_eq!(rotation, grid().target(rotation));
        assert!(!controller.is_active());
    }

    #[test]
    fn test_snap_at_rest_is_idempotent() {
        let mut controller = MomentumController::default();
        let g = grid();
        let rotation = 36.0;
        let target = controller.snap(rotation, &g, 0.0);
        assert_eq!(target, rotation);

        assert_eq!(controller.step(rotation, 200.0, &g), MotionStep::Advanced(36.0));
        assert_eq!(controller.step(rotation, 400.0, &g), MotionStep::Settled(36.0));
        assert_eq!(controller.snap(36.0, &g, 500.0), target);
    }

    #[test]
    fn test_snap_tween_eases_toward_target() {
        let tween = SnapTween::new(0.0, 18.0, 100.0, Duration::from_millis(400));
        assert_eq!(tween.sample(100.0), (0.0, false));
        let (mid, done) = tween.sample(300.0);
        assert!(!done);
        assert!((mid - 18.0 * 0.875).abs() < 1e-9);
        assert_eq!(tween.sample(500.0), (18.0, true));
        assert_eq!(tween.sample(900.0), (18.0, true));
    }

    #[test]
    fn test_wheel_quiet_period_then_snap() {
        let mut controller = MomentumController::default();
        controller.wait_for_quiet(0.0, DEFAULT_WHEEL_SETTLE);
        assert_eq!(controller.step(11.0, 200.0, &grid()), MotionStep::Waiting);
        assert_eq!(
            controller.step(11.0, 400.0, &grid()),
            MotionStep::SnapStarted { target: 18.0 }
        );
        assert!(matches!(controller.motion(), Motion::Snap(_)));
    }

    #[test]
    fn test_stop_cancels_any_motion() {
        let mut controller = MomentumController::default();
        controller.throw(25.0);
        controller.stop();
        assert_eq!(controller.step(0.0, 16.0, &grid()), MotionStep::Idle);
    }
}
