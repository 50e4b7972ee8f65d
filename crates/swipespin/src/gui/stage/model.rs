use crate::carousel::decoration::Decoration;
use crate::carousel::mount::{MountPoll, MountProbe};
use crate::carousel::scheduler::FrameTicket;
use crate::carousel::{Carousel, ResizeOutcome};
use crate::config::{Card, Config, Media};
use crate::embed::{HeightReporter, ResizeMessage};
use crate::typewriter::Typewriter;
use gdk_pixbuf::Pixbuf;

#[derive(Clone)]
pub struct CardFace {
    pub card: Card,
    pub pixbuf: Option<Pixbuf>,
}

impl CardFace {
    pub fn load(card: &Card) -> Self {
        let pixbuf = match &card.media {
            Media::Image(path) => Pixbuf::from_file(path)
                .inspect_err(|e| log::error!("Failed to load image {}: {}", path.display(), e))
                .ok(),
            Media::Video(_) | Media::Placeholder(_) => None,
        };
        Self {
            card: card.clone(),
            pixbuf,
        }
    }

    pub fn media_label(&self) -> Option<String> {
        if self.pixbuf.is_some() {
            return None;
        }
        match &self.card.media {
            Media::Placeholder(text) => Some(text.clone()),
            Media::Video(path) | Media::Image(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

pub struct Backdrop {
    pub decoration: Decoration,
    pub surface: cairo::ImageSurface,
}

pub struct State {
    pub config: Config,
    pub faces: Vec<CardFace>,
    pub carousel: Option<Carousel>,
    pub probe: MountProbe,
    pub backdrop: Option<Backdrop>,
    pub reporter: HeightReporter,
    pub headline: Typewriter,
    pub container_height: f64,
    pub scale_factor: f64,
}

impl State {
    pub fn new(config: Config, now_ms: f64) -> Self {
        let faces = config.carousel.cards.iter().map(CardFace::load).collect();
        Self {
            headline: Typewriter::new(config.page.headline.clone(), now_ms),
            faces,
            config,
            carousel: None,
            probe: MountProbe::default(),
            backdrop: None,
            reporter: HeightReporter::default(),
            container_height: 0.0,
            scale_factor: 1.0,
        }
    }

    pub fn wheel_enabled(&self) -> bool {
        self.config.carousel.wheel
    }

    pub fn reload(&mut self, config: Config, now_ms: f64) {
        let (height, scale) = (self.container_height, self.scale_factor);
        *self = Self::new(config, now_ms);
        self.container_height = height;
        self.scale_factor = scale;
    }

    pub fn is_mounted(&self) -> bool {
        self.carousel.is_some()
    }

    /// One mount attempt. On success the layout and backdrop exist and the
    /// first content height is returned for reporting.
    pub fn mount(&mut self, width: Option<f64>) -> (MountPoll, Option<ResizeMessage>) {
        let poll = self.probe.poll(width);
        let Some(width) = poll.width() else {
            return (poll, None);
        };

        let carousel = Carousel::new(self.config.carousel.clone(), width);
        let content_height = carousel.snapshot().content_height();
        log::info!(
            "Mounted {} cards at {}px ({})",
            carousel.total_cards(),
            width,
            carousel.breakpoint()
        );
        self.carousel = Some(carousel);
        self.reporter.reset();
        (poll, self.restructure(content_height))
    }

    pub fn resize(&mut self, width: f64, height: f64, scale_factor: f64) -> Option<ResizeMessage> {
        self.container_height = height;
        self.scale_factor = scale_factor;
        let outcome = self.carousel.as_mut()?.resize(width);
        self.absorb(outcome)
    }

    pub fn absorb(&mut self, outcome: Option<ResizeOutcome>) -> Option<ResizeMessage> {
        let outcome = outcome?;
        log::debug!(
            "Layout now {} at {}px, content height {}",
            outcome.breakpoint,
            outcome.width,
            outcome.content_height
        );
        self.restructure(outcome.content_height)
    }

    fn restructure(&mut self, content_height: f64) -> Option<ResizeMessage> {
        self.backdrop = self.carousel.as_ref().and_then(|carousel| {
            let decoration = carousel.decoration(self.container_height, self.scale_factor);
            match super::view::render_backdrop(&decoration) {
                Ok(surface) => Some(Backdrop {
                    decoration,
                    surface,
                }),
                Err(e) => {
                    log::debug!("Skipping backdrop: {}", e);
                    None
                }
            }
        });
        self.reporter.report(content_height)
    }

    pub fn take_frame_request(&mut self) -> Option<FrameTicket> {
        self.carousel.as_mut()?.take_frame_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bundled_config;

    #[test]
    fn test_mount_waits_for_width_then_reports_height() {
        let mut state = State::new(bundled_config().unwrap(), 0.0);
        assert_eq!(state.mount(Some(0.0)).0, MountPoll::Waiting { attempt: 1 });
        assert!(!state.is_mounted());

        let (poll, report) = state.mount(Some(1280.0));
        assert_eq!(poll, MountPoll::Ready { width: 1280.0 });
        assert!(state.is_mounted());
        assert!(report.is_some_and(|m| m.height > 0.0));
        assert!(state.backdrop.is_some());
    }

    #[test]
    fn test_placeholder_faces_have_labels() {
        let state = State::new(bundled_config().unwrap(), 0.0);
        assert_eq!(state.faces.len(), 5);
        assert_eq!(state.faces[0].media_label().as_deref(), Some("🎨 Image"));
    }

    #[test]
    fn test_resize_before_mount_is_ignored() {
        let mut state = State::new(bundled_config().unwrap(), 0.0);
        assert!(state.resize(900.0, 700.0, 1.0).is_none());
        assert_eq!(state.container_height, 700.0);
    }

    #[test]
    fn test_wheel_enabled_follows_config() {
        let mut config = bundled_config().unwrap();
        assert!(State::new(config.clone(), 0.0).wheel_enabled());
        config.carousel.wheel = false;
        assert!(!State::new(config, 0.0).wheel_enabled());
    }
}
