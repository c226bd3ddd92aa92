//! Free-propagation-region slab boundary synthesis.
//!
//! The slab is a capsule: a rectangle whose left and right edges are
//! replaced by outward circular arcs. Input (left) and output (right)
//! arcs may use different radii. Arc extreme points land exactly on the
//! rectangle corners, which pins the arc center offset to
//! `r·cos(α)` with `α = asin(h/2 / r)`.

use std::fmt;

use nalgebra::Vector2;

use crate::geometry::{Cladding, Layer, Polygon};
use crate::offset::cladding_polygon;

/// Which slab side an arc belongs to. Input is the left (-X) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Input,
    Output,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => write!(f, "input"),
            Side::Output => write!(f, "output"),
        }
    }
}

/// Derived per-side arc descriptor.
///
/// Invariant: `effective_radius >= height_rect / 2`, so the arc always
/// reaches both rectangle corners. The arcsine argument is clamped to
/// [-1, 1] to absorb floating-point overshoot at the exact boundary.
#[derive(Debug, Clone, Copy)]
pub struct ArcSide {
    pub side: Side,
    pub effective_radius: f64,
    /// Angular half-extent of the arc, radians.
    pub half_angle: f64,
    /// X coordinate of the arc center.
    pub center_x: f64,
}

impl ArcSide {
    pub fn new(side: Side, radius: f64, width_rect: f64, height_rect: f64) -> Self {
        let half_h = height_rect / 2.0;
        let effective_radius = radius.max(half_h);
        let half_angle = (half_h / effective_radius).clamp(-1.0, 1.0).asin();
        let reach = effective_radius * half_angle.cos();
        let center_x = match side {
            Side::Output => width_rect / 2.0 - reach,
            Side::Input => -width_rect / 2.0 + reach,
        };
        Self {
            side,
            effective_radius,
            half_angle,
            center_x,
        }
    }

    /// Point on the arc surface at angle `theta` (radians, 0 at the arc
    /// apex, positive towards +Y).
    pub fn surface_point(&self, theta: f64) -> Vector2<f64> {
        let r = self.effective_radius;
        let x = match self.side {
            Side::Output => self.center_x + r * theta.cos(),
            Side::Input => self.center_x - r * theta.cos(),
        };
        Vector2::new(x, r * theta.sin())
    }

    /// Unit outward surface normal at angle `theta`.
    pub fn outward_normal(&self, theta: f64) -> Vector2<f64> {
        match self.side {
            Side::Output => Vector2::new(theta.cos(), theta.sin()),
            Side::Input => Vector2::new(-theta.cos(), theta.sin()),
        }
    }

    /// Outward surface normal angle in degrees (0° along +X).
    pub fn outward_normal_deg(&self, theta: f64) -> f64 {
        match self.side {
            Side::Output => theta.to_degrees(),
            Side::Input => 180.0 - theta.to_degrees(),
        }
    }
}

/// Parameters of the slab boundary synthesizer.
#[derive(Debug, Clone)]
pub struct SlabParams {
    pub input_radius: f64,
    pub output_radius: f64,
    pub width_rect: f64,
    pub height_rect: f64,
    pub layer: Layer,
    /// Sample count per arc.
    pub npoints: usize,
    pub clad: Option<Cladding>,
}

/// Compute the slab core polygon (and optional cladding polygon).
///
/// The ring is wound continuously: right arc top->bottom, then the left
/// arc bottom->top. The rectangle's top and bottom edges are the chords
/// between the arc endpoints, which sit exactly on the corners.
pub fn fpr_slab_polygons(params: &SlabParams) -> Vec<Polygon> {
    let left = ArcSide::new(
        Side::Input,
        params.input_radius,
        params.width_rect,
        params.height_rect,
    );
    let right = ArcSide::new(
        Side::Output,
        params.output_radius,
        params.width_rect,
        params.height_rect,
    );

    let mut ring = Vec::with_capacity(2 * params.npoints);
    // Right arc, +alpha (top corner) down to -alpha (bottom corner).
    for theta in sample_angles(right.half_angle, params.npoints) {
        ring.push(right.surface_point(theta));
    }
    // Left arc reversed: -alpha (bottom corner) up to +alpha (top corner).
    for theta in sample_angles(left.half_angle, params.npoints).into_iter().rev() {
        ring.push(left.surface_point(theta));
    }

    let core = Polygon::new(ring, params.layer);
    let mut polygons = Vec::with_capacity(2);
    if let Some(clad) = &params.clad {
        let clad_poly = cladding_polygon(&core, clad);
        polygons.push(core);
        polygons.push(clad_poly);
    } else {
        polygons.push(core);
    }
    polygons
}

/// Linearly spaced angles from `+half_angle` to `-half_angle`.
fn sample_angles(half_angle: f64, npoints: usize) -> Vec<f64> {
    let n = npoints.max(2);
    (0..n)
        .map(|i| half_angle - 2.0 * half_angle * (i as f64) / ((n - 1) as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn params() -> SlabParams {
        SlabParams {
            input_radius: 130.0,
            output_radius: 130.0,
            width_rect: 80.54,
            height_rect: 152.824,
            layer: Layer(1, 0),
            npoints: 361,
            clad: None,
        }
    }

    #[test]
    fn arc_endpoints_land_on_rectangle_corners() {
        let p = params();
        let right = ArcSide::new(Side::Output, p.output_radius, p.width_rect, p.height_rect);
        let top = right.surface_point(right.half_angle);
        let bottom = right.surface_point(-right.half_angle);
        assert!((top.x - p.width_rect / 2.0).abs() < TOL);
        assert!((top.y - p.height_rect / 2.0).abs() < TOL);
        assert!((bottom.y + p.height_rect / 2.0).abs() < TOL);

        let left = ArcSide::new(Side::Input, p.input_radius, p.width_rect, p.height_rect);
        let top = left.surface_point(left.half_angle);
        assert!((top.x + p.width_rect / 2.0).abs() < TOL);
        assert!((top.y - p.height_rect / 2.0).abs() < TOL);
    }

    #[test]
    fn radius_is_clamped_to_half_height() {
        let side = ArcSide::new(Side::Output, 10.0, 80.0, 152.824);
        assert!((side.effective_radius - 152.824 / 2.0).abs() < TOL);
        // Degenerate radius: the arc is a half circle.
        assert!((side.half_angle - std::f64::consts::FRAC_PI_2).abs() < TOL);
    }

    #[test]
    fn core_ring_has_two_arcs_worth_of_points() {
        let polys = fpr_slab_polygons(&params());
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].points.len(), 2 * 361);
    }

    #[test]
    fn cladding_adds_offset_polygon() {
        let mut p = params();
        p.clad = Some(Cladding {
            layer: Layer(111, 0),
            offset: 3.0,
        });
        let polys = fpr_slab_polygons(&p);
        assert_eq!(polys.len(), 2);
        assert_eq!(polys[1].layer, Layer(111, 0));

        let (core_min, core_max) = polys[0].bbox().unwrap();
        let (clad_min, clad_max) = polys[1].bbox().unwrap();
        assert!(clad_min.x < core_min.x - 2.9);
        assert!(clad_max.x > core_max.x + 2.9);
        assert!(clad_min.y < core_min.y - 2.9);
        assert!(clad_max.y > core_max.y + 2.9);
    }

    #[test]
    fn outward_normals_point_away_from_slab() {
        let p = params();
        let right = ArcSide::new(Side::Output, p.output_radius, p.width_rect, p.height_rect);
        assert!(right.outward_normal(0.0).x > 0.0);
        let left = ArcSide::new(Side::Input, p.input_radius, p.width_rect, p.height_rect);
        assert!(left.outward_normal(0.0).x < 0.0);
        // Normal angle convention: apex normals are exactly 0° / 180°.
        assert!((right.outward_normal_deg(0.0)).abs() < TOL);
        assert!((left.outward_normal_deg(0.0) - 180.0).abs() < TOL);
    }

    #[test]
    fn dual_radius_sides_are_independent() {
        let mut p = params();
        p.output_radius = 170.0;
        let left = ArcSide::new(Side::Input, p.input_radius, p.width_rect, p.height_rect);
        let right = ArcSide::new(Side::Output, p.output_radius, p.width_rect, p.height_rect);
        assert!(right.half_angle < left.half_angle);
        // Both must still satisfy the corner-reachability relation.
        for side in [&left, &right] {
            let h = side.effective_radius * side.half_angle.sin();
            assert!((h - p.height_rect / 2.0).abs() < TOL);
        }
    }
}
