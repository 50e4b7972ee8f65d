pub const MAX_MOUNT_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MountPoll {
    Missing,
    Waiting { attempt: u32 },
    Ready { width: f64 },
    Forced { width: f64 },
}

impl MountPoll {
    pub fn width(&self) -> Option<f64> {
        match self {
            Self::Ready { width } | Self::Forced { width } => Some(*width),
            Self::Missing | Self::Waiting { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MountProbe {
    attempts: u32,
    max_attempts: u32,
}

impl Default for MountProbe {
    fn default() -> Self {
        Self::new(MAX_MOUNT_ATTEMPTS)
    }
}

impl MountProbe {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Called once per frame with the current container width, if any.
    pub fn poll(&mut self, width: Option<f64>) -> MountPoll {
        let Some(width) = width else {
            log::warn!("No mount target found; carousel will not render");
            return MountPoll::Missing;
        };

        log::debug!("Mount attempt {}, width: {}", self.attempts, width);
        if width > 0.0 {
            return MountPoll::Ready { width };
        }
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            return MountPoll::Waiting {
                attempt: self.attempts,
            };
        }

        log::error!(
            "Container still has zero width after {} frames, forcing layout",
            self.max_attempts
        );
        MountPoll::Forced { width: width.max(0.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_immediately_with_width() {
        let mut probe = MountProbe::default();
        assert_eq!(probe.poll(Some(1280.0)), MountPoll::Ready { width: 1280.0 });
        assert_eq!(probe.attempts(), 0);
    }

    #[test]
    fn test_waits_then_becomes_ready() {
        let mut probe = MountProbe::default();
        assert_eq!(probe.poll(Some(0.0)), MountPoll::Waiting { attempt: 1 });
        assert_eq!(probe.poll(Some(0.0)), MountPoll::Waiting { attempt: 2 });
        assert_eq!(probe.poll(Some(390.0)).width(), Some(390.0));
    }

    #[test]
    fn test_forces_layout_after_bound() {
        let mut probe = MountProbe::new(3);
        for attempt in 1..=3 {
            assert_eq!(probe.poll(Some(0.0)), MountPoll::Waiting { attempt });
        }
        assert_eq!(probe.poll(Some(0.0)), MountPoll::Forced { width: 0.0 });
    }

    #[test]
    fn test_missing_target_is_not_fatal() {
        let mut probe = MountProbe::default();
        assert_eq!(probe.poll(None), MountPoll::Missing);
        assert_eq!(probe.poll(None).width(), None);
    }
}
