use super::Point;
use super::velocity::VelocityTracker;
use derive_more::{Display, From, Into};
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumString};

pub const DEFAULT_DEAD_ZONE: f64 = 8.0;
pub const DEFAULT_SENSITIVITY: f64 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct PointerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

impl PointerKind {
    pub fn locks_scroll(self) -> bool {
        matches!(self, Self::Touch | Self::Pen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Undecided,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub dead_zone: f64,
    pub sensitivity: f64,
    pub velocity_window: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            sensitivity: DEFAULT_SENSITIVITY,
            velocity_window: super::velocity::DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub pointer: PointerId,
    pub kind: PointerKind,
    pub origin: Point,
    pub last_x: f64,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureStep {
    Ignored,
    Started,
    Pending,
    /// Vertical intent won; the session is gone and the page scrolls.
    ScrollReleased,
    Committed {
        kind: PointerKind,
        rotation_delta: f64,
    },
    Dragged {
        rotation_delta: f64,
    },
    Abandoned,
    Thrown {
        kind: PointerKind,
        velocity: f64,
    },
    /// Committed drag cancelled by the platform; velocity is discarded.
    Cancelled {
        kind: PointerKind,
    },
}

#[derive(Debug, Clone)]
pub struct GestureMachine {
    config: GestureConfig,
    session: Option<GestureSession>,
    velocity: VelocityTracker,
}

impl GestureMachine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            velocity: VelocityTracker::new(config.velocity_window),
            config,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.intent == Intent::Dragging)
    }

    pub fn pointer_down(
        &mut self,
        pointer: PointerId,
        pos: Point,
        kind: PointerKind,
        primary: bool,
        now_ms: f64,
    ) -> GestureStep {
        if !primary || self.session.is_some() {
            return GestureStep::Ignored;
        }

        self.session = Some(GestureSession {
            pointer,
            kind,
            origin: pos,
            last_x: pos.x,
            intent: Intent::Undecided,
        });
        self.velocity.reset();
        self.velocity.push(pos.x, now_ms);
        GestureStep::Started
    }

    pub fn pointer_move(&mut self, pointer: PointerId, pos: Point, now_ms: f64) -> GestureStep {
        let dead_zone = self.config.dead_zone;
        let Some(session) = self.session.as_mut().filter(|s| s.pointer == pointer) else {
            return GestureStep::Ignored;
        };

        let committing = session.intent == Intent::Undecided;
        if committing {
            let dx = (pos.x - session.origin.x).abs();
            let dy = (pos.y - session.origin.y).abs();

            if dy > dead_zone {
                self.session = None;
                return GestureStep::ScrollReleased;
            }
            if dx <= dead_zone {
                return GestureStep::Pending;
            }
            session.intent = Intent::Dragging;
        }

        let rotation_delta = (pos.x - session.last_x) * self.config.sensitivity;
        session.last_x = pos.x;
        let kind = session.kind;
        self.velocity.push(pos.x, now_ms);

        if committing {
            GestureStep::Committed {
                kind,
                rotation_delta,
            }
        } else {
            GestureStep::Dragged { rotation_delta }
        }
    }

    pub fn pointer_up(&mut self, pointer: PointerId) -> GestureStep {
        match self.end(pointer) {
            None => GestureStep::Ignored,
            Some(s) if s.intent == Intent::Undecided => GestureStep::Abandoned,
            Some(s) => GestureStep::Thrown {
                kind: s.kind,
                velocity: self.velocity.estimate(),
            },
        }
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) -> GestureStep {
        match self.end(pointer) {
            None => GestureStep::Ignored,
            Some(s) if s.intent == Intent::Undecided => GestureStep::Abandoned,
            Some(s) => GestureStep::Cancelled { kind: s.kind },
        }
    }

    fn end(&mut self, pointer: PointerId) -> Option<GestureSession> {
        self.session.take_if(|s| s.pointer == pointer)
    }
}
