//! Taper template synthesis.
//!
//! One trapezoid is computed per build and stamped out for every channel
//! by rigid transform, so all tapers are geometrically identical up to
//! rotation and translation.

use nalgebra::Vector2;

use crate::geometry::{Cladding, Layer, Polygon, Port};
use crate::offset::cladding_polygon;

/// Taper geometry centered at the origin, long axis along X. `o1` is the
/// narrow end at (-L/2, 0) facing 180°, `o2` the wide end at (L/2, 0)
/// facing 0°.
#[derive(Debug, Clone)]
pub struct TaperTemplate {
    pub polygons: Vec<Polygon>,
    pub port_narrow: Port,
    pub port_wide: Port,
}

pub fn taper_template(
    length: f64,
    width_narrow: f64,
    width_wide: f64,
    layer: Layer,
    clad: Option<&Cladding>,
) -> TaperTemplate {
    let half_l = length / 2.0;
    let core = Polygon::new(
        vec![
            Vector2::new(-half_l, -width_narrow / 2.0),
            Vector2::new(half_l, -width_wide / 2.0),
            Vector2::new(half_l, width_wide / 2.0),
            Vector2::new(-half_l, width_narrow / 2.0),
        ],
        layer,
    );

    let mut polygons = Vec::with_capacity(2);
    if let Some(clad) = clad {
        let clad_poly = cladding_polygon(&core, clad);
        polygons.push(core);
        polygons.push(clad_poly);
    } else {
        polygons.push(core);
    }

    TaperTemplate {
        polygons,
        port_narrow: Port::new("o1", Vector2::new(-half_l, 0.0), width_narrow, 180.0, layer),
        port_wide: Port::new("o2", Vector2::new(half_l, 0.0), width_wide, 0.0, layer),
    }
}
