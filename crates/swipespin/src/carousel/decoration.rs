use super::geometry::{ArcParams, Breakpoint, FRONT_ANGLE};
use serde::Serialize;

pub const ARC_COUNT: usize = 50;
pub const ARC_STEP: f64 = 24.0;
/// Half of the angular range covered by every arc, in degrees.
pub const ARC_HALF_RANGE: f64 = 75.0;
pub const MIN_ARC_RADIUS: f64 = 50.0;
pub const LINE_WIDTH: f64 = 1.5;
pub const DASH_PATTERN: [f64; 2] = [3.0, 14.0];
pub const EXTRA_TOP: f64 = 300.0;
pub const LIFT_FRACTION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecorationStyle {
    pub fade_edge: usize,
    pub max_opacity: f64,
}

impl DecorationStyle {
    pub fn for_breakpoint(breakpoint: Breakpoint) -> Self {
        match breakpoint {
            Breakpoint::Small => Self {
                fade_edge: 20,
                max_opacity: 0.5,
            },
            Breakpoint::Medium | Breakpoint::Large => Self {
                fade_edge: 10,
                max_opacity: 1.0,
            },
        }
    }

    pub fn opacity(&self, arc: usize) -> f64 {
        let fade = self.fade_edge.max(1) as f64;
        let last = ARC_COUNT - 1;
        let ramp = if arc < self.fade_edge {
            arc as f64 / fade
        } else if arc + self.fade_edge > last {
            last.saturating_sub(arc) as f64 / fade
        } else {
            1.0
        };
        ramp * self.max_opacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashedArc {
    pub radius: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoration {
    pub width: f64,
    pub height: f64,
    pub offset_top: f64,
    pub scale_factor: f64,
    pub raster: RasterSize,
    pub center_x: f64,
    pub center_y: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub arcs: Vec<DashedArc>,
}

impl Decoration {
    /// `container_height` falls back to `stable_height` while the container has
    /// not been sized yet. `scale_factor` is the device pixel ratio.
    pub fn compute(
        arc: &ArcParams,
        breakpoint: Breakpoint,
        width: f64,
        container_height: f64,
        stable_height: f64,
        scale_factor: f64,
    ) -> Self {
        let style = DecorationStyle::for_breakpoint(breakpoint);
        let scale_factor = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        let base_height = if container_height > 0.0 {
            container_height
        } else {
            stable_height
        };
        let height = base_height + EXTRA_TOP;
        let lift = base_height * LIFT_FRACTION;

        let arcs = (0..ARC_COUNT)
            .filter_map(|a| {
                let radius = arc.radius + (a as f64 - (ARC_COUNT / 2) as f64) * ARC_STEP;
                (radius >= MIN_ARC_RADIUS).then(|| DashedArc {
                    radius,
                    opacity: style.opacity(a),
                })
            })
            .collect();

        Self {
            width,
            height,
            offset_top: -EXTRA_TOP,
            scale_factor,
            raster: RasterSize {
                width: (width.max(0.0) * scale_factor).ceil() as u32,
                height: (height * scale_factor).ceil() as u32,
            },
            center_x: arc.center_x,
            center_y: arc.center_y - lift + EXTRA_TOP,
            start_angle: (FRONT_ANGLE - ARC_HALF_RANGE).to_radians(),
            end_angle: (FRONT_ANGLE + ARC_HALF_RANGE).to_radians(),
            arcs,
        }
    }

    pub fn visible_arcs(&self) -> impl Iterator<Item = &DashedArc> {
        self.arcs.iter().filter(|a| a.opacity > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(radius: f64) -> ArcParams {
        ArcParams {
            center_x: 640.0,
            center_y: radius + 300.0,
            radius,
        }
    }

    #[test]
    fn test_large_ring_draws_every_arc() {
        let deco = Decoration::compute(&ring(1152.0), Breakpoint::Large, 1280.0, 900.0, 1100.0, 1.0);
        assert_eq!(deco.arcs.len(), ARC_COUNT);
        assert_eq!(deco.arcs[0].radius, 1152.0 - 25.0 * ARC_STEP);
        assert_eq!(deco.arcs[0].opacity, 0.0);
        assert_eq!(deco.arcs[25].opacity, 1.0);
        assert_eq!(deco.arcs[49].opacity, 0.0);
        assert!((deco.arcs[5].opacity - 0.5).abs() < 1e-12);
        assert!((deco.arcs[44].opacity - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_small_breakpoint_has_wider_fade_and_lower_peak() {
        let deco = Decoration::compute(&ring(800.0), Breakpoint::Small, 375.0, 700.0, 600.0, 1.0);
        let peak = deco.arcs.iter().map(|a| a.opacity).fold(0.0, f64::max);
        assert_eq!(peak, 0.5);
        assert!((deco.arcs[10].opacity - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_tiny_radii_are_skipped() {
        let deco = Decoration::compute(&ring(100.0), Breakpoint::Large, 1280.0, 900.0, 1100.0, 1.0);
        assert!(deco.arcs.iter().all(|a| a.radius >= MIN_ARC_RADIUS));
        assert!(deco.arcs.len() < ARC_COUNT);
    }

    #[test]
    fn test_raster_accounts_for_pixel_density() {
        let deco = Decoration::compute(&ring(1152.0), Breakpoint::Large, 1280.0, 900.0, 1100.0, 2.0);
        assert_eq!(deco.height, 1200.0);
        assert_eq!(deco.raster, RasterSize { width: 2560, height: 2400 });
        assert_eq!(deco.offset_top, -EXTRA_TOP);
    }

    #[test]
    fn test_unsized_container_uses_stable_height() {
        let arc = ring(800.0);
        let deco = Decoration::compute(&arc, Breakpoint::Small, 375.0, 0.0, 600.0, 0.0);
        assert_eq!(deco.height, 600.0 + EXTRA_TOP);
        assert_eq!(deco.scale_factor, 1.0);
        assert!((deco.center_y - (arc.center_y - 30.0 + EXTRA_TOP)).abs() < 1e-9);
    }

    #[test]
    fn test_arc_span_is_symmetric_around_top() {
        let deco = Decoration::compute(&ring(900.0), Breakpoint::Medium, 900.0, 800.0, 800.0, 1.0);
        assert!((deco.start_angle - (-165.0f64).to_radians()).abs() < 1e-12);
        assert!((deco.end_angle - (-15.0f64).to_radians()).abs() < 1e-12);
    }
}
