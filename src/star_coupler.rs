//! Star-coupler port placement and assembly.
//!
//! Builds the full device as one flat `Component`: the FPR slab, one
//! transformed taper copy per channel, and optional straight bus
//! waveguides ending on a common loading edge per side. The component is
//! a pure function of the configuration; repeated builds with equal
//! parameters produce identical geometry.

use nalgebra::Vector2;
use thiserror::Error;
use tracing::warn;

use crate::component::{Component, ComponentError};
use crate::geometry::{snap_point, Cladding, Layer, Polygon, Port, DEFAULT_GRID};
use crate::slab::{fpr_slab_polygons, ArcSide, Side, SlabParams};
use crate::taper::{taper_template, TaperTemplate};

/// Tolerated floating-point overshoot when comparing channel angles
/// against the arc half-angle.
const ANGLE_EPS: f64 = 1e-9;

/// Channel spacing along an arc: either a linear pitch in µm along the
/// chord, or an angular pitch in degrees of arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pitch {
    Linear(f64),
    Angular(f64),
}

impl Pitch {
    fn value(&self) -> f64 {
        match self {
            Pitch::Linear(v) | Pitch::Angular(v) => *v,
        }
    }
}

/// Straight bus waveguides attached to every taper, ending on a shared
/// loading-edge X coordinate per side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusConfig {
    /// Length of the input-side waveguides, µm.
    pub input_length: f64,
    /// Length of the output-side waveguides, µm.
    pub output_length: f64,
    /// Penetration into the taper at the shared boundary, µm.
    pub overlap: f64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            input_length: 10.0,
            output_length: 10.0,
            overlap: 0.02,
        }
    }
}

#[derive(Debug, Error)]
pub enum StarCouplerError {
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error(
        "{side} port {index} at {theta_deg:.3}° exceeds the arc half-angle {half_angle_deg:.3}°"
    )]
    PortBeyondArc {
        side: Side,
        index: usize,
        theta_deg: f64,
        half_angle_deg: f64,
    },
    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// Full configuration surface of the star coupler. Defaults match the
/// reference 3x4 device on the (1, 0) waveguide layer.
#[derive(Debug, Clone)]
pub struct StarCouplerConfig {
    pub n_inputs: usize,
    pub n_outputs: usize,
    pub pitch_inputs: Pitch,
    pub pitch_outputs: Pitch,
    /// Rotate input tapers to follow the local arc normal.
    pub angled_inputs: bool,
    /// Rotate output tapers to follow the local arc normal.
    pub angled_outputs: bool,
    pub taper_length: f64,
    /// Wide (slab-facing) taper end width, µm.
    pub taper_wide: f64,
    /// Bus waveguide width; also the narrow taper end width, µm.
    pub wg_width: f64,
    pub input_radius: f64,
    pub output_radius: f64,
    pub width_rect: f64,
    pub height_rect: f64,
    pub layer: Layer,
    /// Sample count per slab arc.
    pub npoints: usize,
    /// Taper penetration into the slab body, µm.
    pub taper_overlap: f64,
    pub clad: Option<Cladding>,
    pub bus: Option<BusConfig>,
    /// Fail the build when a channel would land beyond the arc span.
    /// When disabled the violation is logged and the port emitted as-is.
    pub strict: bool,
    /// Manufacturing grid for port snapping, µm.
    pub grid: f64,
}

impl Default for StarCouplerConfig {
    fn default() -> Self {
        Self {
            n_inputs: 3,
            n_outputs: 4,
            pitch_inputs: Pitch::Linear(10.0),
            pitch_outputs: Pitch::Linear(10.0),
            angled_inputs: true,
            angled_outputs: true,
            taper_length: 40.0,
            taper_wide: 3.0,
            wg_width: 0.5,
            input_radius: 130.0,
            output_radius: 130.0,
            width_rect: 80.54,
            height_rect: 152.824,
            layer: Layer(1, 0),
            npoints: 361,
            taper_overlap: 0.1,
            clad: Some(Cladding {
                layer: Layer(111, 0),
                offset: 3.0,
            }),
            bus: Some(BusConfig::default()),
            strict: true,
            grid: DEFAULT_GRID,
        }
    }
}

impl StarCouplerConfig {
    /// Build the star coupler component.
    pub fn build(&self) -> Result<Component, StarCouplerError> {
        self.validate()?;

        let mut component = Component::new("star_coupler");

        for polygon in fpr_slab_polygons(&SlabParams {
            input_radius: self.input_radius,
            output_radius: self.output_radius,
            width_rect: self.width_rect,
            height_rect: self.height_rect,
            layer: self.layer,
            npoints: self.npoints,
            clad: self.clad,
        }) {
            component.add_polygon(polygon);
        }

        let template = taper_template(
            self.taper_length,
            self.wg_width,
            self.taper_wide,
            self.layer,
            self.clad.as_ref(),
        );

        let output_arc = ArcSide::new(
            Side::Output,
            self.output_radius,
            self.width_rect,
            self.height_rect,
        );
        let input_arc = ArcSide::new(
            Side::Input,
            self.input_radius,
            self.width_rect,
            self.height_rect,
        );

        let output_thetas = self.channel_thetas(self.n_outputs, self.pitch_outputs, &output_arc)?;
        let input_thetas = self.channel_thetas(self.n_inputs, self.pitch_inputs, &input_arc)?;

        let output_ports = self.place_side(
            &mut component,
            &template,
            &output_arc,
            &output_thetas,
            self.angled_outputs,
        );
        let input_ports = self.place_side(
            &mut component,
            &template,
            &input_arc,
            &input_thetas,
            self.angled_inputs,
        );

        if let Some(bus) = self.bus {
            self.attach_bus_waveguides(&mut component, &bus, &input_ports, &output_ports)?;
        } else {
            for (i, port) in input_ports.iter().enumerate() {
                component.add_port(port.renamed(format!("o{}", i + 1)))?;
            }
            for (i, port) in output_ports.iter().enumerate() {
                component.add_port(port.renamed(format!("e{}", i + 1)))?;
            }
        }

        Ok(component)
    }

    fn validate(&self) -> Result<(), StarCouplerError> {
        let positive: [(&'static str, f64); 9] = [
            ("taper_length", self.taper_length),
            ("taper_wide", self.taper_wide),
            ("wg_width", self.wg_width),
            ("input_radius", self.input_radius),
            ("output_radius", self.output_radius),
            ("width_rect", self.width_rect),
            ("height_rect", self.height_rect),
            ("grid", self.grid),
            ("pitch", self.pitch_inputs.value().min(self.pitch_outputs.value())),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(StarCouplerError::InvalidParameter {
                    name,
                    value,
                    reason: "must be positive",
                });
            }
        }
        if self.n_inputs == 0 || self.n_outputs == 0 {
            return Err(StarCouplerError::InvalidParameter {
                name: "channel count",
                value: self.n_inputs.min(self.n_outputs) as f64,
                reason: "need at least one channel per side",
            });
        }
        if self.npoints < 2 {
            return Err(StarCouplerError::InvalidParameter {
                name: "npoints",
                value: self.npoints as f64,
                reason: "arc needs at least two samples",
            });
        }
        if self.taper_overlap < 0.0 {
            return Err(StarCouplerError::InvalidParameter {
                name: "taper_overlap",
                value: self.taper_overlap,
                reason: "must be non-negative",
            });
        }
        if let Some(clad) = &self.clad {
            if !(clad.offset > 0.0) {
                return Err(StarCouplerError::InvalidParameter {
                    name: "clad.offset",
                    value: clad.offset,
                    reason: "must be positive",
                });
            }
        }
        if let Some(bus) = &self.bus {
            for (name, value) in [
                ("bus.input_length", bus.input_length),
                ("bus.output_length", bus.output_length),
            ] {
                if !(value > 0.0) {
                    return Err(StarCouplerError::InvalidParameter {
                        name,
                        value,
                        reason: "must be positive",
                    });
                }
            }
            if bus.overlap < 0.0 {
                return Err(StarCouplerError::InvalidParameter {
                    name: "bus.overlap",
                    value: bus.overlap,
                    reason: "must be non-negative",
                });
            }
        }
        Ok(())
    }

    /// Angular position of every channel on a side, centered about the
    /// slab axis. Reachability is enforced here: a channel beyond the arc
    /// half-angle is a configuration error (or a warning when `strict`
    /// is off).
    fn channel_thetas(
        &self,
        count: usize,
        pitch: Pitch,
        arc: &ArcSide,
    ) -> Result<Vec<f64>, StarCouplerError> {
        let mut thetas = Vec::with_capacity(count);
        for i in 0..count {
            let offset = i as f64 - (count as f64 - 1.0) / 2.0;
            let theta = match pitch {
                Pitch::Linear(p) => {
                    let y = offset * p;
                    (y / arc.effective_radius).clamp(-1.0, 1.0).asin()
                }
                Pitch::Angular(deg) => (offset * deg).to_radians(),
            };
            if theta.abs() > arc.half_angle + ANGLE_EPS {
                if self.strict {
                    return Err(StarCouplerError::PortBeyondArc {
                        side: arc.side,
                        index: i + 1,
                        theta_deg: theta.to_degrees(),
                        half_angle_deg: arc.half_angle.to_degrees(),
                    });
                }
                warn!(
                    side = %arc.side,
                    index = i + 1,
                    theta_deg = theta.to_degrees(),
                    half_angle_deg = arc.half_angle.to_degrees(),
                    "channel lands beyond the arc span"
                );
            }
            thetas.push(theta);
        }
        Ok(thetas)
    }

    /// Stamp one taper copy per channel onto the arc and return the
    /// transformed narrow-end ports (grid-snapped, in channel order).
    fn place_side(
        &self,
        component: &mut Component,
        template: &TaperTemplate,
        arc: &ArcSide,
        thetas: &[f64],
        angled: bool,
    ) -> Vec<Port> {
        let fixed_deg = match arc.side {
            Side::Output => 0.0,
            Side::Input => 180.0,
        };
        let wide_x = template.port_wide.center.x;

        let mut ports = Vec::with_capacity(thetas.len());
        for &theta in thetas {
            let orient_deg = if angled {
                arc.outward_normal_deg(theta)
            } else {
                fixed_deg
            };
            // Rotate the taper so its wide end faces the slab, then align
            // that end onto the arc surface.
            let rotation_deg = orient_deg - 180.0;
            let rot = rotation_deg.to_radians();
            let arc_point = arc.surface_point(theta);
            let mut translation =
                arc_point - Vector2::new(wide_x * rot.cos(), wide_x * rot.sin());
            // Push the taper into the slab along the outward normal so the
            // boolean merge never leaves a sliver gap.
            translation -= self.taper_overlap * arc.outward_normal(theta);

            let transform = crate::geometry::RigidTransform::new(rotation_deg, translation);
            for polygon in &template.polygons {
                component.add_polygon(transform.apply_polygon(polygon));
            }
            ports.push(transform.apply_port(&template.port_narrow).snapped(self.grid));
        }
        ports
    }

    /// Attach straight bus waveguides to every taper and expose the far
    /// ends as the public `i{n}` / `out{n}` ports. Each side's far ends
    /// share one loading-edge X coordinate.
    fn attach_bus_waveguides(
        &self,
        component: &mut Component,
        bus: &BusConfig,
        input_ports: &[Port],
        output_ports: &[Port],
    ) -> Result<(), StarCouplerError> {
        let half_w = self.wg_width / 2.0;

        let min_x_in = input_ports
            .iter()
            .map(|p| p.center.x)
            .fold(f64::INFINITY, f64::min);
        let edge_x = min_x_in - bus.overlap;
        for (i, port) in input_ports.iter().enumerate() {
            // Anchor slightly inside the taper, against the port direction.
            let anchor = port.center - bus.overlap * port.direction();
            let x_start = edge_x - bus.input_length;
            component.add_polygon(Polygon::rectangle(
                x_start,
                anchor.y - half_w,
                anchor.x,
                anchor.y + half_w,
                self.layer,
            ));
            component.add_port(Port::new(
                format!("i{}", i + 1),
                snap_point(Vector2::new(x_start, anchor.y), self.grid),
                self.wg_width,
                180.0,
                self.layer,
            ))?;
        }

        let max_x_out = output_ports
            .iter()
            .map(|p| p.center.x)
            .fold(f64::NEG_INFINITY, f64::max);
        let edge_x = max_x_out + bus.overlap + bus.output_length;
        for (i, port) in output_ports.iter().enumerate() {
            let anchor = port.center - bus.overlap * port.direction();
            component.add_polygon(Polygon::rectangle(
                anchor.x,
                anchor.y - half_w,
                edge_x,
                anchor.y + half_w,
                self.layer,
            ));
            component.add_port(Port::new(
                format!("out{}", i + 1),
                snap_point(Vector2::new(edge_x, anchor.y), self.grid),
                self.wg_width,
                0.0,
                self.layer,
            ))?;
        }

        Ok(())
    }
}
