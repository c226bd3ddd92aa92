//! Outward polygon offset ("buffer") used for cladding generation.
//!
//! The offset of a convex outline by distance `d` with round joins is the
//! Minkowski sum of the outline with a disk of radius `d`. We compute it
//! by sampling a disk around every vertex and taking the convex hull of
//! all samples. Every outline this crate buffers (the capsule slab, the
//! taper trapezoid, straight waveguides) is convex, so the result is
//! exact up to the disk discretization.

use geo::{ConvexHull, MultiPoint, Point as GeoPoint};
use nalgebra::Vector2;

use crate::geometry::{Cladding, Polygon};

/// Disk discretization used for the round joins.
const DISK_POINTS: usize = 64;

/// Offset a convex outline outward by `distance`, returning the buffered
/// boundary as an open ring (no duplicated closure point).
pub fn outward_offset(points: &[Vector2<f64>], distance: f64) -> Vec<Vector2<f64>> {
    debug_assert!(distance > 0.0);

    let mut samples = Vec::with_capacity(points.len() * DISK_POINTS);
    for p in points {
        for i in 0..DISK_POINTS {
            let angle = 2.0 * std::f64::consts::PI * (i as f64) / (DISK_POINTS as f64);
            samples.push(GeoPoint::new(
                p.x + distance * angle.cos(),
                p.y + distance * angle.sin(),
            ));
        }
    }

    let hull = MultiPoint::from(samples).convex_hull();
    let mut ring: Vec<Vector2<f64>> = hull
        .exterior()
        .coords()
        .map(|c| Vector2::new(c.x, c.y))
        .collect();

    // geo closes the exterior ring; drop the duplicated closure point.
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

/// Cladding polygon for a core polygon: the outward offset on the
/// cladding layer.
pub fn cladding_polygon(core: &Polygon, clad: &Cladding) -> Polygon {
    Polygon::new(outward_offset(&core.points, clad.offset), clad.layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Layer;

    #[test]
    fn square_offset_grows_bbox_by_distance() {
        let square = Polygon::rectangle(-1.0, -1.0, 1.0, 1.0, Layer(1, 0));
        let clad = cladding_polygon(
            &square,
            &Cladding {
                layer: Layer(111, 0),
                offset: 3.0,
            },
        );
        let (min, max) = clad.bbox().unwrap();
        assert!((min.x - (-4.0)).abs() < 1e-2);
        assert!((min.y - (-4.0)).abs() < 1e-2);
        assert!((max.x - 4.0).abs() < 1e-2);
        assert!((max.y - 4.0).abs() < 1e-2);
        assert_eq!(clad.layer, Layer(111, 0));
    }

    #[test]
    fn offset_ring_is_open() {
        let square = Polygon::rectangle(0.0, 0.0, 2.0, 2.0, Layer(1, 0));
        let ring = outward_offset(&square.points, 0.5);
        assert!(ring.len() >= 8);
        assert_ne!(ring.first(), ring.last());
    }
}
