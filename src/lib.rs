//! starcoupler: parametric star-coupler (FPR) layout generation with
//! Lumerical varFDTD export.
//!
//! This crate provides:
//! - Closed-form synthesis of the free-propagation-region slab boundary
//!   (dual-radius capsule) and tapered waveguide ports
//! - A flat component accumulator with canonical, grid-snapped ports
//! - GDSII serialization of the generated geometry
//! - Python driver-script generation for Lumerical varFDTD
//!   characterization (S-parameter amplitude and phase per port)
//!
//! All layout coordinates are in µm. The build is a pure function of its
//! configuration and holds no global state, so independent invocations
//! may run concurrently.

pub mod codegen;
pub mod component;
pub mod gds;
pub mod geometry;
pub mod offset;
pub mod slab;
pub mod star_coupler;
pub mod taper;

pub use codegen::{generate_varfdtd_script, SimulationConfig};
pub use component::{Component, ComponentError, PortReport};
pub use gds::write_gds;
pub use geometry::{normalize_angle, snap, Cladding, Layer, Polygon, Port, DEFAULT_GRID};
pub use slab::{ArcSide, Side};
pub use star_coupler::{BusConfig, Pitch, StarCouplerConfig, StarCouplerError};
pub use taper::{taper_template, TaperTemplate};
