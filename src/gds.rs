//! GDSII serialization of a flat component.
//!
//! One top-level struct, one boundary element per polygon. Database unit
//! is 1 nm, user unit 1 µm, matching the µm coordinates used throughout
//! the generator.

use std::path::Path;

use anyhow::Result;
use gds21::{GdsBoundary, GdsElement, GdsLibrary, GdsPoint, GdsStruct, GdsUnits};

use crate::component::Component;

/// Database unit expressed in user units (1 nm in µm).
const DB_PER_USER: f64 = 1e-3;
/// Database unit in meters (1 nm).
const DB_UNIT_METERS: f64 = 1e-9;
/// Micrometers to database units.
const UM_TO_DB: f64 = 1e3;

/// Write the component's polygons into a GDS library at `path`.
pub fn write_gds(component: &Component, path: &Path) -> Result<()> {
    let mut lib = GdsLibrary::new(component.name());
    lib.units = GdsUnits::new(DB_PER_USER, DB_UNIT_METERS);

    let mut top = GdsStruct::new(component.name());
    for polygon in component.polygons() {
        let mut xy: Vec<GdsPoint> = polygon
            .points
            .iter()
            .map(|p| {
                GdsPoint::new(
                    (p.x * UM_TO_DB).round() as i32,
                    (p.y * UM_TO_DB).round() as i32,
                )
            })
            .collect();
        if xy.len() < 3 {
            continue;
        }
        // GDS boundaries are explicitly closed.
        xy.push(xy[0].clone());

        let mut boundary = GdsBoundary::default();
        boundary.layer = polygon.layer.0;
        boundary.datatype = polygon.layer.1;
        boundary.xy = xy;
        top.elems.push(GdsElement::GdsBoundary(boundary));
    }
    lib.structs.push(top);

    lib.save(path)
        .map_err(|e| anyhow::anyhow!("failed to save GDS to {:?}: {:?}", path, e))?;

    tracing::info!(path = %path.display(), "wrote GDS");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::star_coupler::StarCouplerConfig;

    #[test]
    fn written_library_loads_back() {
        let component = StarCouplerConfig::default().build().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("star_coupler.gds");

        write_gds(&component, &path).unwrap();

        let lib = GdsLibrary::load(&path).unwrap();
        assert_eq!(lib.structs.len(), 1);
        assert_eq!(lib.structs[0].elems.len(), component.polygons().len());
    }
}
