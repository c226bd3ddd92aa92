//! Lumerical varFDTD driver-script generation.
//!
//! Produces a Python script that opens a `lumapi.MODE` session, imports
//! the generated GDS, sets up the oxide stack and the varFDTD region,
//! places one mode source per input port and one power monitor per
//! output port, runs the solver, and dumps per-port transmission to an
//! `.npz` file. The script is the hand-off artifact; this crate never
//! talks to the solver itself.

use anyhow::{anyhow, Result};
use minijinja::{context, Environment};

use crate::component::Component;

const VARFDTD_TEMPLATE: &str = r##"#!/usr/bin/env python3
"""
Lumerical varFDTD driver - auto-generated star coupler characterization
{{ header_comment }}

Generated: {{ timestamp }}
Device cell: {{ cell_name }}
"""

import sys
import os

import numpy as np

lumerical_api_path = r"{{ lumerical_api_path }}"
if lumerical_api_path not in sys.path:
    sys.path.append(lumerical_api_path)

import lumapi

GDS_PATH = r"{{ gds_path }}"
CELL_NAME = "{{ cell_name }}"
CORE_LAYER = "{{ core_layer }}"

WG_HEIGHT = {{ "%.6e"|format(wg_height) }}
WG_Z_CENTER = WG_HEIGHT / 2
MESH_ACCURACY = {{ mesh_accuracy }}
SIM_TIME = {{ "%.6e"|format(sim_time) }}
SIM_X_SPAN = {{ "%.6e"|format(x_span) }}
SIM_Y_SPAN = {{ "%.6e"|format(y_span) }}
BACKGROUND_INDEX = {{ "%.4f"|format(background_index) }}

mode = lumapi.MODE(hide={{ hide_gui }})

# Structure: GDS import plus the oxide stack
mode.eval(f"""
deleteall;
switchtolayout;
gdsimport("{GDS_PATH.replace(os.sep, '/')}", "{CELL_NAME}", "{CORE_LAYER}", "{{ core_material }}", 0, {WG_HEIGHT});

addrect;
set("name", "SiO2_Substrate");
set("x", 0);
set("y", 0);
set("x span", 500e-6);
set("y span", 500e-6);
set("z min", -2e-6);
set("z max", 0);
set("material", "{{ clad_material }}");
set("override mesh order from material database", 1);
set("mesh order", 1);

addrect;
set("name", "SiO2_Overcladding");
set("x", 0);
set("y", 0);
set("x span", 500e-6);
set("y span", 500e-6);
set("z min", {WG_HEIGHT});
set("z max", {WG_HEIGHT + 2e-6});
set("material", "{{ clad_material }}");
set("override mesh order from material database", 1);
set("mesh order", 1);
""")

# varFDTD solver region
mode.eval(f"""
addvarfdtd;
set("x", 0);
set("y", 0);
set("x span", {SIM_X_SPAN});
set("y span", {SIM_Y_SPAN});
set("z", {WG_Z_CENTER});
set("simulation time", {SIM_TIME});
set("mesh accuracy", {MESH_ACCURACY});
set("background index", {BACKGROUND_INDEX});
""")

# Mode sources on the input ports
{% for port in input_ports %}
mode.eval("""
addport;
set("name", "{{ port.name }}");
set("x", {{ "%.6e"|format(port.x) }});
set("y", {{ "%.6e"|format(port.y) }});
set("y span", {{ "%.6e"|format(port.span) }});
set("injection axis", "x-axis");
set("direction", "Backward");
set("mode selection", "fundamental TE mode");
""")
{% endfor %}

# Power monitors on the output ports
{% for port in output_ports %}
mode.eval("""
addpower;
set("name", "monitor_{{ port.name }}");
set("monitor type", "Linear X");
set("x", {{ "%.6e"|format(port.x) }});
set("y", {{ "%.6e"|format(port.y) }});
set("y span", {{ "%.6e"|format(port.span) }});
""")
{% endfor %}

fsp_path = os.path.join(os.getcwd(), f"{CELL_NAME}_varFDTD.fsp")
mode.save(fsp_path)
print(f"saved {fsp_path}")

mode.eval("findmodes;")
mode.eval("run;")

# Transmission extraction
results = {}
{% for port in output_ports %}
try:
    results["{{ port.name }}"] = mode.eval('getresult("monitor_{{ port.name }}", "P");')
except Exception as exc:
    print(f"no data for {{ port.name }}: {exc}")
{% endfor %}

os.makedirs("simulations", exist_ok=True)
results_path = os.path.join("simulations", f"{CELL_NAME}_varFDTD_results.npz")
np.savez(results_path, **results)
print(f"results saved to {results_path}")
"##;

/// varFDTD solver setup. Defaults match the reference 220 nm SOI stack.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Location of the Lumerical Python API on the target machine.
    pub lumerical_api_path: String,
    /// Guiding layer thickness in meters.
    pub wg_height: f64,
    pub mesh_accuracy: u32,
    /// Simulation time in seconds.
    pub sim_time: f64,
    /// varFDTD region X span in meters.
    pub x_span: f64,
    /// varFDTD region Y span in meters.
    pub y_span: f64,
    pub background_index: f64,
    pub hide_gui: bool,
    /// Lumerical material database name for the core.
    pub core_material: String,
    /// Lumerical material database name for the cladding stack.
    pub clad_material: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lumerical_api_path: r"C:\Program Files\Lumerical\v252\api\python".to_string(),
            wg_height: 0.22e-6,
            mesh_accuracy: 2,
            sim_time: 5000e-15,
            x_span: 350e-6,
            y_span: 250e-6,
            background_index: 1.444,
            hide_gui: false,
            core_material: "Si (Silicon) - Palik".to_string(),
            clad_material: "SiO2 (Glass) - Palik".to_string(),
        }
    }
}

/// Render the varFDTD driver script for a built component.
///
/// Input ports (`i*`, or the raw `o*` tapers) become backward-injecting
/// mode sources; output ports (`out*` / `e*`) become power monitors.
/// Port coordinates are converted from µm to meters.
pub fn generate_varfdtd_script(
    component: &Component,
    gds_path: &str,
    config: &SimulationConfig,
) -> Result<String> {
    let core_layer = component
        .polygons()
        .first()
        .map(|p| p.layer)
        .ok_or_else(|| anyhow!("component has no geometry"))?;

    let port_ctx = |name: &str, x: f64, y: f64, width: f64| {
        serde_json::json!({
            "name": name,
            "x": x * 1e-6,
            "y": y * 1e-6,
            // The mode/monitor span covers three waveguide widths.
            "span": width * 3.0 * 1e-6,
        })
    };

    let mut input_ports = Vec::new();
    let mut output_ports = Vec::new();
    for port in component.ports() {
        let ctx = port_ctx(&port.name, port.center.x, port.center.y, port.width);
        if port.name.starts_with("out") || port.name.starts_with('e') {
            output_ports.push(ctx);
        } else {
            input_ports.push(ctx);
        }
    }
    if input_ports.is_empty() || output_ports.is_empty() {
        return Err(anyhow!(
            "component needs at least one input and one output port"
        ));
    }

    let mut env = Environment::new();
    env.add_template("varfdtd", VARFDTD_TEMPLATE)?;
    let template = env.get_template("varfdtd")?;

    let output = template.render(context! {
        header_comment => "Drives Lumerical MODE through lumapi; never run from inside the generator",
        timestamp => chrono::Utc::now().to_rfc3339(),
        gds_path => gds_path,
        cell_name => component.name(),
        core_layer => format!("{}:{}", core_layer.0, core_layer.1),
        lumerical_api_path => config.lumerical_api_path,
        wg_height => config.wg_height,
        mesh_accuracy => config.mesh_accuracy,
        sim_time => config.sim_time,
        x_span => config.x_span,
        y_span => config.y_span,
        background_index => config.background_index,
        hide_gui => if config.hide_gui { "True" } else { "False" },
        core_material => config.core_material,
        clad_material => config.clad_material,
        input_ports => input_ports,
        output_ports => output_ports,
    })?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::star_coupler::StarCouplerConfig;

    #[test]
    fn script_covers_every_port() {
        let component = StarCouplerConfig::default().build().unwrap();
        let script = generate_varfdtd_script(
            &component,
            "star_coupler.gds",
            &SimulationConfig::default(),
        )
        .unwrap();

        assert!(script.contains("import lumapi"));
        assert!(script.contains("addvarfdtd;"));
        assert!(script.contains("gdsimport("));
        for i in 1..=3 {
            assert!(script.contains(&format!("set(\"name\", \"i{i}\");")));
        }
        for i in 1..=4 {
            assert!(script.contains(&format!("monitor_out{i}")));
        }
        assert!(script.contains("\"1:0\""));
    }

    #[test]
    fn empty_component_is_rejected() {
        let component = crate::component::Component::new("empty");
        let err = generate_varfdtd_script(
            &component,
            "empty.gds",
            &SimulationConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no geometry"));
    }

    #[test]
    fn raw_taper_ports_map_to_sources_and_monitors() {
        let component = StarCouplerConfig {
            bus: None,
            ..Default::default()
        }
        .build()
        .unwrap();
        let script = generate_varfdtd_script(
            &component,
            "star_coupler.gds",
            &SimulationConfig::default(),
        )
        .unwrap();
        assert!(script.contains("set(\"name\", \"o1\");"));
        assert!(script.contains("monitor_e4"));
    }
}
