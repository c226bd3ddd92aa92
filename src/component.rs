//! Flat geometry accumulator.
//!
//! A `Component` is a single polygon list plus a name->port map; no
//! hierarchy, no instancing. All sub-geometry is transformed into place
//! and added flat, which keeps the output portable across GDS consumers.

use nalgebra::Vector2;
use serde::Serialize;
use thiserror::Error;

use crate::geometry::{Polygon, Port};

#[derive(Debug, Error, PartialEq)]
pub enum ComponentError {
    #[error("duplicate port name '{0}'")]
    DuplicatePort(String),
}

/// The top-level build result: all emitted polygons plus the named ports
/// other tooling connects to. Built once per invocation, never mutated
/// afterwards by external code.
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    polygons: Vec<Polygon>,
    ports: Vec<Port>,
}

/// Serializable per-port summary, the hand-off record for the solver
/// driver and routing tooling.
#[derive(Debug, Clone, Serialize)]
pub struct PortReport {
    pub name: String,
    pub center: [f64; 2],
    pub width: f64,
    pub orientation: f64,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            polygons: Vec::new(),
            ports: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_polygon(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    pub fn add_port(&mut self, port: Port) -> Result<(), ComponentError> {
        if self.ports.iter().any(|p| p.name == port.name) {
            return Err(ComponentError::DuplicatePort(port.name));
        }
        self.ports.push(port);
        Ok(())
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Bounding box over all polygons as (min, max).
    pub fn bbox(&self) -> Option<(Vector2<f64>, Vector2<f64>)> {
        let mut boxes = self.polygons.iter().filter_map(Polygon::bbox);
        let (mut min, mut max) = boxes.next()?;
        for (bmin, bmax) in boxes {
            min.x = min.x.min(bmin.x);
            min.y = min.y.min(bmin.y);
            max.x = max.x.max(bmax.x);
            max.y = max.y.max(bmax.y);
        }
        Some((min, max))
    }

    pub fn port_report(&self) -> Vec<PortReport> {
        self.ports
            .iter()
            .map(|p| PortReport {
                name: p.name.clone(),
                center: [p.center.x, p.center.y],
                width: p.width,
                orientation: p.orientation(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Layer;
    use nalgebra::Vector2;
    use pretty_assertions::assert_eq;

    #[test]
    fn duplicate_port_names_are_rejected() {
        let mut c = Component::new("star_coupler");
        let port = Port::new("o1", Vector2::zeros(), 0.5, 180.0, Layer(1, 0));
        c.add_port(port.clone()).unwrap();
        assert_eq!(
            c.add_port(port),
            Err(ComponentError::DuplicatePort("o1".to_string()))
        );
    }

    #[test]
    fn port_report_serializes() {
        let mut c = Component::new("star_coupler");
        c.add_port(Port::new("out1", Vector2::new(60.0, -5.0), 0.5, 0.0, Layer(1, 0)))
            .unwrap();
        let json = serde_json::to_string(&c.port_report()).unwrap();
        assert!(json.contains("\"out1\""));
        assert!(json.contains("60.0"));
    }

    #[test]
    fn bbox_spans_all_polygons() {
        let mut c = Component::new("c");
        c.add_polygon(Polygon::rectangle(0.0, 0.0, 1.0, 1.0, Layer(1, 0)));
        c.add_polygon(Polygon::rectangle(5.0, -2.0, 6.0, 3.0, Layer(1, 0)));
        let (min, max) = c.bbox().unwrap();
        assert_eq!((min.x, min.y), (0.0, -2.0));
        assert_eq!((max.x, max.y), (6.0, 3.0));
    }
}
