//! starcoupler-gen: CLI for generating star-coupler layouts and their
//! varFDTD driver scripts.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use starcoupler::{
    generate_varfdtd_script, write_gds, BusConfig, Cladding, Layer, Pitch, SimulationConfig,
    StarCouplerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "starcoupler-gen")]
#[command(about = "Generate a star-coupler GDS layout and its Lumerical varFDTD driver")]
#[command(version)]
struct Args {
    /// Output GDS file
    #[arg(short, long, default_value = "star_coupler.gds")]
    output: PathBuf,

    /// Output Python driver script (skipped when omitted)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Output JSON port report (skipped when omitted)
    #[arg(long)]
    ports_json: Option<PathBuf>,

    /// Print the driver script to stdout instead of a file
    #[arg(long)]
    stdout: bool,

    /// Number of input channels
    #[arg(long, default_value = "3")]
    n_inputs: usize,

    /// Number of output channels
    #[arg(long, default_value = "4")]
    n_outputs: usize,

    /// Input-side pitch (µm, or degrees with --angular-pitch)
    #[arg(long, default_value = "10.0")]
    pitch_inputs: f64,

    /// Output-side pitch (µm, or degrees with --angular-pitch)
    #[arg(long, default_value = "10.0")]
    pitch_outputs: f64,

    /// Interpret pitches as angular spacing in degrees of arc
    #[arg(long)]
    angular_pitch: bool,

    /// Input-side slab arc radius in µm
    #[arg(long, default_value = "130.0")]
    input_radius: f64,

    /// Output-side slab arc radius in µm
    #[arg(long, default_value = "130.0")]
    output_radius: f64,

    /// Slab rectangle width in µm
    #[arg(long, default_value = "80.54")]
    width_rect: f64,

    /// Slab rectangle height in µm
    #[arg(long, default_value = "152.824")]
    height_rect: f64,

    /// Taper length in µm
    #[arg(long, default_value = "40.0")]
    taper_length: f64,

    /// Wide (slab-facing) taper end width in µm
    #[arg(long, default_value = "3.0")]
    taper_wide: f64,

    /// Bus waveguide width in µm
    #[arg(long, default_value = "0.5")]
    wg_width: f64,

    /// Skip the cladding layer
    #[arg(long)]
    no_clad: bool,

    /// Skip the bus waveguides (exposes the raw taper ports)
    #[arg(long)]
    no_bus: bool,

    /// Emit out-of-arc ports as warnings instead of failing
    #[arg(long)]
    no_strict: bool,

    /// varFDTD mesh accuracy (1..8)
    #[arg(long, default_value = "2")]
    mesh_accuracy: u32,

    /// Hide the Lumerical GUI in the generated driver
    #[arg(long)]
    hide_gui: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let pitch = |value: f64| {
        if args.angular_pitch {
            Pitch::Angular(value)
        } else {
            Pitch::Linear(value)
        }
    };

    let config = StarCouplerConfig {
        n_inputs: args.n_inputs,
        n_outputs: args.n_outputs,
        pitch_inputs: pitch(args.pitch_inputs),
        pitch_outputs: pitch(args.pitch_outputs),
        taper_length: args.taper_length,
        taper_wide: args.taper_wide,
        wg_width: args.wg_width,
        input_radius: args.input_radius,
        output_radius: args.output_radius,
        width_rect: args.width_rect,
        height_rect: args.height_rect,
        clad: if args.no_clad {
            None
        } else {
            Some(Cladding {
                layer: Layer(111, 0),
                offset: 3.0,
            })
        },
        bus: if args.no_bus {
            None
        } else {
            Some(BusConfig::default())
        },
        strict: !args.no_strict,
        ..Default::default()
    };

    let component = config.build().context("layout generation failed")?;
    info!(
        polygons = component.polygons().len(),
        ports = component.ports().len(),
        "built star coupler"
    );
    if let Some((min, max)) = component.bbox() {
        info!(
            width_um = max.x - min.x,
            height_um = max.y - min.y,
            "device extent"
        );
    }
    for port in component.ports() {
        info!(
            name = %port.name,
            x = port.center.x,
            y = port.center.y,
            orientation = port.orientation(),
            "port"
        );
    }

    write_gds(&component, &args.output)
        .with_context(|| format!("failed to write GDS to {:?}", args.output))?;

    if let Some(path) = &args.ports_json {
        let json = serde_json::to_string_pretty(&component.port_report())?;
        fs::write(path, json)
            .with_context(|| format!("failed to write port report to {path:?}"))?;
        info!(path = %path.display(), "wrote port report");
    }

    if args.script.is_some() || args.stdout {
        let sim_config = SimulationConfig {
            mesh_accuracy: args.mesh_accuracy,
            hide_gui: args.hide_gui,
            ..Default::default()
        };
        let script = generate_varfdtd_script(
            &component,
            &args.output.to_string_lossy(),
            &sim_config,
        )
        .context("driver script generation failed")?;

        if args.stdout {
            println!("{script}");
        }
        if let Some(path) = &args.script {
            fs::write(path, &script)
                .with_context(|| format!("failed to write driver script to {path:?}"))?;
            info!(path = %path.display(), "wrote varFDTD driver");
        }
    }

    Ok(())
}
