use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

/// Screen angle of the top of the ring (0° east, 90° south).
pub const FRONT_ANGLE: f64 = -90.0;
pub const FADE_RANGE: f64 = 60.0;
pub const MIN_SCALE: f64 = 0.55;
pub const MIN_OPACITY: f64 = 0.15;
pub const MAX_STACK_ORDER: f64 = 100.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum Breakpoint {
    #[strum(to_string = "small", serialize = "sm")]
    Small,
    #[strum(to_string = "medium", serialize = "md")]
    Medium,
    #[strum(to_string = "large", serialize = "lg")]
    Large,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
pub enum RotationMode {
    #[default]
    #[strum(to_string = "infinite", serialize = "wrap")]
    Infinite,
    #[strum(to_string = "bounded", serialize = "clamp")]
    Bounded,
}

impl RotationMode {
    pub fn bounds(total_cards: usize, arc_span: f64) -> (f64, f64) {
        (-(total_cards.saturating_sub(1) as f64) * arc_span, 0.0)
    }

    pub fn constrain(self, rotation: f64, total_cards: usize, arc_span: f64) -> f64 {
        match self {
            Self::Infinite => rotation,
            Self::Bounded => {
                let (a, b) = Self::bounds(total_cards, arc_span);
                rotation.clamp(a.min(b), a.max(b))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakpointGeometry {
    pub card_width: f64,
    pub card_height: f64,
    /// Ring radius is `max(width * radius_factor, radius_floor)`.
    pub radius_factor: f64,
    pub radius_floor: f64,
    pub arc_span: f64,
    pub vertical_offset: f64,
    pub stable_height: f64,
}

impl BreakpointGeometry {
    pub fn radius(&self, width: f64) -> f64 {
        (width * self.radius_factor).max(self.radius_floor)
    }

    pub fn is_valid(&self) -> bool {
        let positive = [
            self.card_width,
            self.card_height,
            self.radius_floor,
            self.arc_span,
            self.stable_height,
        ];
        positive.iter().all(|v| v.is_finite() && *v > 0.0)
            && self.radius_factor.is_finite()
            && self.vertical_offset.is_finite()
    }

    pub fn arc(&self, width: f64) -> ArcParams {
        let radius = self.radius(width);
        ArcParams {
            center_x: width / 2.0,
            center_y: radius + self.stable_height * self.vertical_offset + self.card_height / 2.0,
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointTable {
    pub medium_min: f64,
    pub large_min: f64,
    pub small: BreakpointGeometry,
    pub medium: BreakpointGeometry,
    pub large: BreakpointGeometry,
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self {
            medium_min: 768.0,
            large_min: 1024.0,
            small: BreakpointGeometry {
                card_width: 280.0,
                card_height: 385.0,
                radius_factor: 0.9,
                radius_floor: 800.0,
                arc_span: 18.0,
                vertical_offset: 0.05,
                stable_height: 600.0,
            },
            medium: BreakpointGeometry {
                card_width: 400.0,
                card_height: 550.0,
                radius_factor: 1.4,
                radius_floor: 900.0,
                arc_span: 24.0,
                vertical_offset: 0.02,
                stable_height: 800.0,
            },
            large: BreakpointGeometry {
                card_width: 590.0,
                card_height: 809.0,
                radius_factor: 0.9,
                radius_floor: 800.0,
                arc_span: 20.0,
                vertical_offset: 0.03,
                stable_height: 1100.0,
            },
        }
    }
}

impl BreakpointTable {
    pub fn resolve(&self, width: f64) -> Breakpoint {
        if width >= self.large_min {
            Breakpoint::Large
        } else if width >= self.medium_min {
            Breakpoint::Medium
        } else {
            Breakpoint::Small
        }
    }

    pub fn geometry(&self, breakpoint: Breakpoint) -> &BreakpointGeometry {
        match breakpoint {
            Breakpoint::Small => &self.small,
            Breakpoint::Medium => &self.medium,
            Breakpoint::Large => &self.large,
        }
    }

    fn geometry_mut(&mut self, breakpoint: Breakpoint) -> &mut BreakpointGeometry {
        match breakpoint {
            Breakpoint::Small => &mut self.small,
            Breakpoint::Medium => &mut self.medium,
            Breakpoint::Large => &mut self.large,
        }
    }

    /// Puts the default geometry back wherever a breakpoint is unusable.
    pub fn sanitize(&mut self) -> Vec<Breakpoint> {
        let defaults = Self::default();
        let mut replaced = Vec::new();
        for breakpoint in Breakpoint::iter() {
            if !self.geometry(breakpoint).is_valid() {
                *self.geometry_mut(breakpoint) = *defaults.geometry(breakpoint);
                replaced.push(breakpoint);
            }
        }
        replaced
    }

    pub fn for_width(&self, width: f64) -> (Breakpoint, &BreakpointGeometry) {
        let breakpoint = self.resolve(width);
        (breakpoint, self.geometry(breakpoint))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutOptions {
    pub mode: RotationMode,
    pub depth_fade: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArcParams {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardTransform {
    pub index: usize,
    pub angle: f64,
    pub x: f64,
    pub y: f64,
    pub tilt: f64,
    pub scale: f64,
    pub opacity: f64,
    pub stack_order: i32,
}

impl CardTransform {
    pub fn center(&self, card_width: f64, card_height: f64) -> (f64, f64) {
        (self.x + card_width / 2.0, self.y + card_height / 2.0)
    }

    pub fn bottom(&self, card_width: f64, card_height: f64) -> f64 {
        let (_, cy) = self.center(card_width, card_height);
        let tilt = self.tilt.to_radians();
        let half_height =
            (card_width / 2.0 * tilt.sin().abs() + card_height / 2.0 * tilt.cos().abs())
                * self.scale;
        cy + half_height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub breakpoint: Breakpoint,
    pub card_width: f64,
    pub card_height: f64,
    pub arc: ArcParams,
    pub cards: Vec<CardTransform>,
}

impl LayoutSnapshot {
    /// Cards sorted back to front. Equal stack orders keep index order.
    pub fn draw_order(&self) -> Vec<&CardTransform> {
        let mut ordered: Vec<_> = self.cards.iter().collect();
        ordered.sort_by_key(|c| c.stack_order);
        ordered
    }

    pub fn content_height(&self) -> f64 {
        self.cards
            .iter()
            .map(|c| c.bottom(self.card_width, self.card_height))
            .fold(0.0, f64::max)
    }

    pub fn front_card(&self) -> Option<&CardTransform> {
        self.cards.iter().max_by_key(|c| c.stack_order)
    }
}

pub fn card_angle(
    rotation: f64,
    index: usize,
    total_cards: usize,
    arc_span: f64,
    mode: RotationMode,
) -> f64 {
    let rotation = mode.constrain(rotation, total_cards, arc_span);
    let total_span = total_cards.saturating_sub(1) as f64 * arc_span;
    let start = FRONT_ANGLE - total_span / 2.0;
    let base = start + index as f64 * arc_span + rotation;

    match mode {
        RotationMode::Bounded => base,
        RotationMode::Infinite => {
            let full_circle = total_cards.max(1) as f64 * arc_span;
            if full_circle <= 0.0 {
                return base;
            }
            start + (base - start).rem_euclid(full_circle)
        }
    }
}

/// Angular distance from the front-facing position, folded into `[0, 180]`.
pub fn distance_from_front(angle: f64) -> f64 {
    let normalized = (angle - FRONT_ANGLE).rem_euclid(360.0);
    if normalized > 180.0 {
        360.0 - normalized
    } else {
        normalized
    }
}

fn depth(distance: f64, depth_fade: bool) -> (f64, f64) {
    if !depth_fade {
        return (1.0, 1.0);
    }
    let t = (distance / FADE_RANGE).min(1.0);
    (1.0 - (1.0 - MIN_SCALE) * t, 1.0 - (1.0 - MIN_OPACITY) * t)
}

pub fn stack_order(distance: f64) -> i32 {
    ((1.0 - distance / 180.0) * MAX_STACK_ORDER).round() as i32
}

fn transform(
    rotation: f64,
    index: usize,
    total_cards: usize,
    width: f64,
    geometry: &BreakpointGeometry,
    options: &LayoutOptions,
) -> CardTransform {
    let arc = geometry.arc(width);
    let angle = card_angle(rotation, index, total_cards, geometry.arc_span, options.mode);
    let rad = angle.to_radians();
    let distance = distance_from_front(angle);
    let (scale, opacity) = depth(distance, options.depth_fade);

    CardTransform {
        index,
        angle,
        x: arc.center_x + arc.radius * rad.cos() - geometry.card_width / 2.0,
        y: arc.center_y + arc.radius * rad.sin() - geometry.card_height / 2.0,
        tilt: angle - FRONT_ANGLE,
        scale,
        opacity,
        stack_order: stack_order(distance),
    }
}

pub fn layout(
    rotation: f64,
    index: usize,
    total_cards: usize,
    width: f64,
    table: &BreakpointTable,
    options: &LayoutOptions,
) -> CardTransform {
    let (_, geometry) = table.for_width(width);
    transform(rotation, index, total_cards, width, geometry, options)
}

pub fn snapshot(
    rotation: f64,
    total_cards: usize,
    width: f64,
    table: &BreakpointTable,
    options: &LayoutOptions,
) -> LayoutSnapshot {
    let (breakpoint, geometry) = table.for_width(width);
    LayoutSnapshot {
        breakpoint,
        card_width: geometry.card_width,
        card_height: geometry.card_height,
        arc: geometry.arc(width),
        cards: (0..total_cards)
            .map(|i| transform(rotation, i, total_cards, width, geometry, options))
            .collect(),
    }
}
