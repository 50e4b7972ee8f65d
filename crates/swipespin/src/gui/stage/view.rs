use super::model::{CardFace, State};
use super::{
    CARD_CORNER_RADIUS, CARD_PADDING, DESCRIPTION_SIZE_FACTOR, MEDIA_FRACTION, PLACEHOLDER_ALPHA,
    TITLE_SIZE_FACTOR,
};
use crate::carousel::decoration::{DASH_PATTERN, Decoration, LINE_WIDTH};
use crate::carousel::geometry::{CardTransform, LayoutSnapshot};
use crate::gui::theme::ThemeColors;
use cairo::{Context, Format, ImageSurface};
use gdk_pixbuf::Pixbuf;
use gdk4::prelude::*;
use palette::Srgba;
use std::f64::consts::PI;

fn set_source(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

fn rounded_rect(cr: &Context, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    cr.new_sub_path();
    cr.arc(x + w - r, y + r, r, -PI / 2.0, 0.0);
    cr.arc(x + w - r, y + h - r, r, 0.0, PI / 2.0);
    cr.arc(x + r, y + h - r, r, PI / 2.0, PI);
    cr.arc(x + r, y + r, r, PI, 3.0 * PI / 2.0);
    cr.close_path();
}

/// Greedy word wrap against the current font.
fn wrap_lines(cr: &Context, text: &str, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        let fits = cr
            .text_extents(&candidate)
            .map(|ext| ext.x_advance() <= max_width)
            .unwrap_or(true);
        if fits || line.is_empty() {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

pub fn render_backdrop(decoration: &Decoration) -> Result<ImageSurface, cairo::Error> {
    let surface = ImageSurface::create(
        Format::ARgb32,
        decoration.raster.width as i32,
        decoration.raster.height as i32,
    )?;
    surface.set_device_scale(decoration.scale_factor, decoration.scale_factor);

    let cr = Context::new(&surface)?;
    cr.set_line_width(LINE_WIDTH);
    cr.set_dash(&DASH_PATTERN, 0.0);
    for arc in decoration.visible_arcs() {
        cr.set_source_rgba(1.0, 1.0, 1.0, arc.opacity);
        cr.new_path();
        cr.arc(
            decoration.center_x,
            decoration.center_y,
            arc.radius,
            decoration.start_angle,
            decoration.end_angle,
        );
        cr.stroke()?;
    }
    drop(cr);
    surface.flush();
    Ok(surface)
}

struct CardRenderer<'a> {
    face: &'a CardFace,
    transform: &'a CardTransform,
    width: f64,
    height: f64,
}

impl<'a> CardRenderer<'a> {
    fn new(face: &'a CardFace, transform: &'a CardTransform, layout: &LayoutSnapshot) -> Self {
        Self {
            face,
            transform,
            width: layout.card_width,
            height: layout.card_height,
        }
    }

    fn draw(&self, cr: &Context) -> Result<(), cairo::Error> {
        let (cx, cy) = self.transform.center(self.width, self.height);

        cr.save()?;
        cr.translate(cx, cy);
        cr.rotate(self.transform.tilt.to_radians());
        cr.scale(self.transform.scale, self.transform.scale);
        cr.translate(-self.width / 2.0, -self.height / 2.0);

        cr.push_group();
        self.draw_body(cr)?;
        self.draw_media(cr)?;
        self.draw_text(cr)?;
        cr.pop_group_to_source()?;
        cr.paint_with_alpha(self.transform.opacity)?;
        cr.restore()
    }

    fn draw_body(&self, cr: &Context) -> Result<(), cairo::Error> {
        set_source(cr, self.face.card.background().to_srgba(1.0));
        rounded_rect(cr, 0.0, 0.0, self.width, self.height, CARD_CORNER_RADIUS);
        cr.fill()
    }

    fn media_rect(&self) -> (f64, f64, f64, f64) {
        (
            CARD_PADDING,
            CARD_PADDING,
            self.width - 2.0 * CARD_PADDING,
            self.height * MEDIA_FRACTION - CARD_PADDING,
        )
    }

    fn draw_media(&self, cr: &Context) -> Result<(), cairo::Error> {
        let (x, y, w, h) = self.media_rect();
        cr.save()?;
        rounded_rect(cr, x, y, w, h, CARD_CORNER_RADIUS / 2.0);
        cr.clip();

        match (&self.face.pixbuf, self.face.media_label()) {
            (Some(pixbuf), _) => self.draw_image(cr, pixbuf, (x, y, w, h))?,
            (None, label) => {
                set_source(cr, self.face.card.foreground().to_srgba(PLACEHOLDER_ALPHA));
                cr.paint()?;
                if let Some(label) = label {
                    set_source(cr, self.face.card.foreground().to_srgba(0.6));
                    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
                    cr.set_font_size(self.width * DESCRIPTION_SIZE_FACTOR);
                    if let Ok(ext) = cr.text_extents(&label) {
                        cr.move_to(x + (w - ext.width()) / 2.0, y + (h + ext.height()) / 2.0);
                        cr.show_text(&label)?;
                    }
                }
            }
        }
        cr.restore()
    }

    fn draw_image(
        &self,
        cr: &Context,
        pixbuf: &Pixbuf,
        (x, y, w, h): (f64, f64, f64, f64),
    ) -> Result<(), cairo::Error> {
        // cover the media area
        let (pw, ph) = (pixbuf.width() as f64, pixbuf.height() as f64);
        let scale = (w / pw).max(h / ph);
        cr.translate(x + (w - pw * scale) / 2.0, y + (h - ph * scale) / 2.0);
        cr.scale(scale, scale);
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.paint()
    }

    fn draw_text(&self, cr: &Context) -> Result<(), cairo::Error> {
        let card = &self.face.card;
        let max_width = self.width - 2.0 * CARD_PADDING;
        let mut y = self.height * MEDIA_FRACTION + CARD_PADDING;
        set_source(cr, card.foreground().to_srgba(1.0));

        let title_size = self.width * TITLE_SIZE_FACTOR;
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
        cr.set_font_size(title_size);
        for line in wrap_lines(cr, &card.title, max_width) {
            y += title_size;
            cr.move_to(CARD_PADDING, y);
            cr.show_text(&line)?;
        }

        let body_size = self.width * DESCRIPTION_SIZE_FACTOR;
        y += body_size * 0.8;
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
        cr.set_font_size(body_size);
        set_source(cr, card.foreground().to_srgba(0.8));
        for line in wrap_lines(cr, &card.description, max_width) {
            y += body_size * 1.4;
            if y > self.height - CARD_PADDING {
                break;
            }
            cr.move_to(CARD_PADDING, y);
            cr.show_text(&line)?;
        }
        Ok(())
    }
}

pub fn draw(cr: &Context, state: &State, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let Some(carousel) = &state.carousel else {
        return Ok(());
    };

    if let Some(backdrop) = &state.backdrop {
        cr.save()?;
        set_source(cr, colors.arc);
        cr.mask_surface(&backdrop.surface, 0.0, backdrop.decoration.offset_top)?;
        cr.restore()?;
    }

    let layout = carousel.snapshot();
    for transform in layout.draw_order() {
        if let Some(face) = state.faces.get(transform.index) {
            CardRenderer::new(face, transform, &layout).draw(cr)?;
        }
    }
    Ok(())
}
