use crate::carousel::gesture::PointerKind;
use crate::carousel::scheduler::Clock;
use crate::embed::EmbedAttributes;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;

/// Same time base as the input event and frame clock timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlibClock;

impl Clock for GlibClock {
    fn now_ms(&self) -> f64 {
        glib::monotonic_time() as f64 / 1000.0
    }
}

pub fn pointer_kind(device: Option<gdk::Device>) -> PointerKind {
    match device.map(|d| d.source()) {
        Some(gdk::InputSource::Touchscreen) => PointerKind::Touch,
        Some(gdk::InputSource::Pen) => PointerKind::Pen,
        _ => PointerKind::Mouse,
    }
}

fn primary_monitor() -> Option<gdk::Monitor> {
    let display = gdk::Display::default()?;
    display
        .monitors()
        .item(0)
        .and_then(|item| item.downcast::<gdk::Monitor>().ok())
}

pub fn apply_embed_size(window: &gtk::ApplicationWindow, attrs: &EmbedAttributes) {
    let (monitor_w, monitor_h) = primary_monitor()
        .map(|m| m.geometry())
        .map_or((1280.0, 800.0), |g| (g.width() as f64, g.height() as f64));

    let width = attrs.width.resolve(monitor_w).round() as i32;
    let height = attrs.height.resolve(monitor_h).round() as i32;
    log::debug!("Window size {}x{} from {:?}", width, height, attrs);
    window.set_default_size(width.max(1), height.max(1));
}
