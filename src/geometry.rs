//! Core 2D layout primitives: layers, polygons, ports, and the rigid
//! transform used to stamp out taper copies.
//!
//! All coordinates are in µm. Port orientations are kept in the canonical
//! [-180, 180) degree range; downstream tooling (the solver driver and the
//! GDS consumers) relies on that range, so normalization happens in the
//! `Port` constructor rather than at the consumers.

use nalgebra::{Rotation2, Vector2};
use serde::Serialize;

/// Fallback manufacturing grid in µm when no PDK context supplies one.
pub const DEFAULT_GRID: f64 = 1e-3;

/// A fabrication mask layer: (layer number, datatype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Layer(pub i16, pub i16);

/// Cladding generation parameters: target layer and uniform outward offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cladding {
    pub layer: Layer,
    pub offset: f64,
}

/// An ordered, closed point sequence tagged with a layer. Consumers treat
/// the last->first edge as implicit; no closure point is duplicated.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub points: Vec<Vector2<f64>>,
    pub layer: Layer,
}

impl Polygon {
    pub fn new(points: Vec<Vector2<f64>>, layer: Layer) -> Self {
        Self { points, layer }
    }

    /// Axis-aligned rectangle from two opposite corners.
    pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64, layer: Layer) -> Self {
        let (xmin, xmax) = (x0.min(x1), x0.max(x1));
        let (ymin, ymax) = (y0.min(y1), y0.max(y1));
        Self::new(
            vec![
                Vector2::new(xmin, ymin),
                Vector2::new(xmax, ymin),
                Vector2::new(xmax, ymax),
                Vector2::new(xmin, ymax),
            ],
            layer,
        )
    }

    /// Axis-aligned bounding box as (min, max).
    pub fn bbox(&self) -> Option<(Vector2<f64>, Vector2<f64>)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }
}

/// A named, directed connection point on a waveguide.
///
/// The orientation is the direction optical power exits the port, in
/// degrees, with 0° along +X. It is normalized on construction and on
/// every rotation, so a stored `Port` never carries values like 353.374°.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub center: Vector2<f64>,
    pub width: f64,
    orientation: f64,
    pub layer: Layer,
}

impl Port {
    pub fn new(
        name: impl Into<String>,
        center: Vector2<f64>,
        width: f64,
        orientation: f64,
        layer: Layer,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            width,
            orientation: normalize_angle(orientation),
            layer,
        }
    }

    /// Orientation in degrees, guaranteed to lie in [-180, 180).
    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    /// Unit vector pointing in the port's exit direction.
    pub fn direction(&self) -> Vector2<f64> {
        let rad = self.orientation.to_radians();
        Vector2::new(rad.cos(), rad.sin())
    }

    /// Copy of this port under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut port = self.clone();
        port.name = name.into();
        port
    }

    /// Copy of this port with the center quantized to `grid`.
    pub fn snapped(&self, grid: f64) -> Self {
        let mut port = self.clone();
        port.center = snap_point(self.center, grid);
        port
    }
}

/// Reduce an angle in degrees to the canonical [-180, 180) range.
pub fn normalize_angle(angle_deg: f64) -> f64 {
    let angle = angle_deg.rem_euclid(360.0);
    if angle >= 180.0 {
        angle - 360.0
    } else {
        angle
    }
}

/// Quantize a coordinate to the nearest multiple of `grid`.
pub fn snap(value: f64, grid: f64) -> f64 {
    (value / grid).round() * grid
}

/// Quantize both components of a point to the manufacturing grid.
pub fn snap_point(p: Vector2<f64>, grid: f64) -> Vector2<f64> {
    Vector2::new(snap(p.x, grid), snap(p.y, grid))
}

/// A rotation (about the origin) followed by a translation.
#[derive(Debug, Clone, Copy)]
pub struct RigidTransform {
    rotation: Rotation2<f64>,
    rotation_deg: f64,
    translation: Vector2<f64>,
}

impl RigidTransform {
    pub fn new(rotation_deg: f64, translation: Vector2<f64>) -> Self {
        Self {
            rotation: Rotation2::new(rotation_deg.to_radians()),
            rotation_deg,
            translation,
        }
    }

    pub fn apply_point(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.rotation * p + self.translation
    }

    pub fn apply_polygon(&self, polygon: &Polygon) -> Polygon {
        Polygon::new(
            polygon.points.iter().map(|&p| self.apply_point(p)).collect(),
            polygon.layer,
        )
    }

    pub fn apply_port(&self, port: &Port) -> Port {
        Port::new(
            port.name.clone(),
            self.apply_point(port.center),
            port.width,
            port.orientation + self.rotation_deg,
            port.layer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn normalize_maps_into_canonical_range() {
        assert!((normalize_angle(353.374) - (-6.626)).abs() < TOL);
        assert!((normalize_angle(180.0) - (-180.0)).abs() < TOL);
        assert!((normalize_angle(-190.0) - 170.0).abs() < TOL);
        assert!((normalize_angle(720.0)).abs() < TOL);
    }

    #[test]
    fn normalize_is_idempotent() {
        for &angle in &[0.0, 12.5, 179.999, -180.0, -6.626, 90.0] {
            let once = normalize_angle(angle);
            assert_eq!(once, normalize_angle(once));
        }
    }

    #[test]
    fn snap_is_idempotent() {
        let grid = 1e-3;
        for &v in &[0.1234567, -7.7775, 130.0, 0.0005] {
            let once = snap(v, grid);
            assert_eq!(once, snap(once, grid));
        }
        assert!((snap(0.12349, grid) - 0.123).abs() < TOL);
    }

    #[test]
    fn port_constructor_normalizes_orientation() {
        let p = Port::new("o1", Vector2::new(0.0, 0.0), 0.5, 353.374, Layer(1, 0));
        assert!((p.orientation() - (-6.626)).abs() < TOL);
    }

    #[test]
    fn rigid_transform_preserves_port_distance() {
        let length = 40.0;
        let a = Port::new("o1", Vector2::new(-length / 2.0, 0.0), 0.5, 180.0, Layer(1, 0));
        let b = Port::new("o2", Vector2::new(length / 2.0, 0.0), 3.0, 0.0, Layer(1, 0));
        let t = RigidTransform::new(-173.2, Vector2::new(41.7, -12.9));
        let (ta, tb) = (t.apply_port(&a), t.apply_port(&b));
        let d = (ta.center - tb.center).norm();
        assert!((d - length).abs() < TOL);
    }

    #[test]
    fn rigid_transform_rotates_orientation() {
        let p = Port::new("o2", Vector2::new(1.0, 0.0), 3.0, 0.0, Layer(1, 0));
        let t = RigidTransform::new(270.0, Vector2::zeros());
        assert!((t.apply_port(&p).orientation() - (-90.0)).abs() < TOL);
    }

    #[test]
    fn rectangle_bbox_matches_corners() {
        let r = Polygon::rectangle(2.0, -1.0, -3.0, 4.0, Layer(1, 0));
        let (min, max) = r.bbox().unwrap();
        assert_eq!((min.x, min.y), (-3.0, -1.0));
        assert_eq!((max.x, max.y), (2.0, 4.0));
    }
}
