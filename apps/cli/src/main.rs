// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Honeybee CLI - create, edit and validate models.
//!
//! # Commands
//!
//! - `honeybee validate <model.json>` - run every model check, exit 1 on failure
//! - `honeybee adjacency <model.json>` - set Surface boundary conditions
//!   between touching rooms and write the model back out
//! - `honeybee convert-units <model.json> <units>` - scale to another unit system
//! - `honeybee windows-by-ratio <model.json> <ratio>` - glaze every outdoor wall
//! - `honeybee overhang | louvers-by-count | extruded-border <model.json>` -
//!   shade outdoor windows or walls
//! - `honeybee shoe-box <width> <depth> <height>` - a one-room model

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use honeybee_core::typing::clean_and_id_string;
use honeybee_core::{
    parse_distance_string, CheckReport, Entity, LouverHost, LouverSpec, Model, Room, Units,
};
use honeybee_geometry::{ContourDirection, Point3};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::{Config, LogFormat};

/// Honeybee model tools
#[derive(Parser, Debug)]
#[command(name = "honeybee", version)]
#[command(about = "Create, edit and validate Honeybee models", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every model check
    Validate {
        /// Path to a model JSON file
        model: PathBuf,

        /// Print structured validation records as JSON
        #[arg(long)]
        json: bool,

        /// Distance tolerance overriding the model's
        #[arg(long)]
        tolerance: Option<f64>,

        /// Angle tolerance in degrees overriding the model's
        #[arg(long)]
        angle_tolerance: Option<f64>,
    },
    /// Solve adjacency between the model rooms
    Adjacency {
        /// Path to a model JSON file
        model: PathBuf,

        /// Where to write the updated model (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Distance tolerance overriding the model's
        #[arg(long)]
        tolerance: Option<f64>,
    },
    /// Convert a model to another units system
    ConvertUnits {
        /// Path to a model JSON file
        model: PathBuf,

        /// Meters, Millimeters, Feet, Inches or Centimeters
        units: String,

        /// Relabel the units without scaling the geometry
        #[arg(long)]
        no_scale: bool,

        /// Where to write the updated model (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the sub-faces of every outdoor wall with windows
    WindowsByRatio {
        /// Path to a model JSON file
        model: PathBuf,

        /// Window to wall area ratio, at least 0 and below 1
        ratio: f64,

        /// Where to write the updated model (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add an overhang over every outdoor window or wall
    Overhang {
        /// Path to a model JSON file
        model: PathBuf,

        /// Depth, optionally with units (e.g. 3ft)
        #[arg(short, long, default_value = "1m")]
        depth: String,

        /// Rotation in degrees; positive tilts the overhang down
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        angle: f64,

        #[command(flatten)]
        placement: Placement,
    },
    /// Add evenly spaced louvers to every outdoor window or wall
    LouversByCount {
        /// Path to a model JSON file
        model: PathBuf,

        /// Louvers per window or wall
        count: usize,

        /// Depth, optionally with units (e.g. 3ft)
        #[arg(short, long, default_value = "0.25m")]
        depth: String,

        /// Rotation in degrees; positive tilts the louvers down
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        angle: f64,

        /// Distance from the glass, optionally with units
        #[arg(long, default_value = "0")]
        offset: String,

        /// Vertical fins instead of horizontal louvers
        #[arg(long)]
        vertical: bool,

        /// Start from the bottom (or left) edge
        #[arg(long)]
        flip_start: bool,

        #[command(flatten)]
        placement: Placement,
    },
    /// Extrude a border around every outdoor window
    ExtrudedBorder {
        /// Path to a model JSON file
        model: PathBuf,

        /// Depth, optionally with units (e.g. 3ft)
        #[arg(short, long, default_value = "0.2m")]
        depth: String,

        /// Extrude into the room instead of outward
        #[arg(long)]
        indoor: bool,

        /// Where to write the updated model (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a model with one box room glazed on its front face
    ShoeBox {
        /// Size along X
        width: f64,
        /// Size along Y
        depth: f64,
        /// Size along Z
        height: f64,

        /// Counterclockwise rotation of the box in degrees
        #[arg(short = 'a', long, default_value_t = 0.0)]
        orientation_angle: f64,

        /// Window to wall ratio of the front face
        #[arg(short, long, default_value_t = 0.4)]
        window_ratio: f64,

        /// Meters, Millimeters, Feet, Inches or Centimeters
        #[arg(short, long, default_value = "Meters")]
        units: String,

        /// Model tolerance (the units' default when omitted)
        #[arg(short, long)]
        tolerance: Option<f64>,

        /// Where to write the model (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Where generated shading goes.
#[derive(clap::Args, Debug)]
struct Placement {
    /// Shade whole walls instead of each window
    #[arg(long)]
    per_wall: bool,

    /// Place the shading inside, like a light shelf
    #[arg(long)]
    indoor: bool,

    /// Where to write the updated model (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Shading added to each window or wall.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Shading {
    Overhang,
    Louvers(usize),
    Border,
}

fn main() -> Result<ExitCode> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    let args = Args::parse();
    match args.command {
        Command::Validate {
            model,
            json,
            tolerance,
            angle_tolerance,
        } => {
            let mut model = load_model(&model)?;
            apply_tolerances(
                &mut model,
                tolerance.or(config.tolerance),
                angle_tolerance.or(config.angle_tolerance),
            )?;
            validate(&model, json)
        }
        Command::Adjacency {
            model,
            output,
            tolerance,
        } => {
            let mut model = load_model(&model)?;
            apply_tolerances(&mut model, tolerance.or(config.tolerance), config.angle_tolerance)?;
            adjacency(&mut model, output.as_deref())
        }
        Command::ConvertUnits {
            model,
            units,
            no_scale,
            output,
        } => {
            let mut model = load_model(&model)?;
            let units = Units::by_name(&units)?;
            if no_scale {
                model.set_units(units);
            } else {
                model.convert_to_units(units);
            }
            info!(model = %model.full_id(), %units, scaled = !no_scale, "Converted units");
            write_model(&model, output.as_deref())
        }
        Command::WindowsByRatio {
            model,
            ratio,
            output,
        } => {
            let mut model = load_model(&model)?;
            let walls = model
                .windows_by_ratio(ratio)
                .context("Failed to set windows by ratio")?;
            info!(walls, ratio, "Glazed outdoor walls");
            write_model(&model, output.as_deref())
        }
        Command::Overhang {
            model,
            depth,
            angle,
            placement,
        } => {
            let mut model = load_model(&model)?;
            let spec = LouverSpec {
                angle,
                indoor: placement.indoor,
                tolerance: model.tolerance(),
                ..LouverSpec::new(parse_distance_string(&depth, model.units())?)
            };
            add_shading(&mut model, Shading::Overhang, &spec, placement.per_wall)?;
            write_model(&model, placement.output.as_deref())
        }
        Command::LouversByCount {
            model,
            count,
            depth,
            angle,
            offset,
            vertical,
            flip_start,
            placement,
        } => {
            let mut model = load_model(&model)?;
            let spec = LouverSpec {
                offset: parse_distance_string(&offset, model.units())?,
                angle,
                direction: if vertical {
                    ContourDirection::Vertical
                } else {
                    ContourDirection::Horizontal
                },
                flip_start_side: flip_start,
                indoor: placement.indoor,
                tolerance: model.tolerance(),
                ..LouverSpec::new(parse_distance_string(&depth, model.units())?)
            };
            add_shading(&mut model, Shading::Louvers(count), &spec, placement.per_wall)?;
            write_model(&model, placement.output.as_deref())
        }
        Command::ExtrudedBorder {
            model,
            depth,
            indoor,
            output,
        } => {
            let mut model = load_model(&model)?;
            let spec = LouverSpec {
                indoor,
                ..LouverSpec::new(parse_distance_string(&depth, model.units())?)
            };
            add_shading(&mut model, Shading::Border, &spec, false)?;
            write_model(&model, output.as_deref())
        }
        Command::ShoeBox {
            width,
            depth,
            height,
            orientation_angle,
            window_ratio,
            units,
            tolerance,
            output,
        } => {
            let units = Units::by_name(&units)?;
            let model = shoe_box(
                [width, depth, height],
                orientation_angle,
                window_ratio,
                units,
                tolerance.unwrap_or_else(|| units.default_tolerance()),
            )?;
            write_model(&model, output.as_deref())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("honeybee_core=info,honeybee_cli=info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn load_model(path: &Path) -> Result<Model> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let model = Model::from_json(&json)
        .with_context(|| format!("Failed to load a model from {}", path.display()))?;
    info!(
        model = %model.full_id(),
        rooms = model.rooms().len(),
        units = %model.units(),
        "Loaded model"
    );
    Ok(model)
}

fn write_model(model: &Model, output: Option<&Path>) -> Result<ExitCode> {
    let json = model.to_json_pretty()?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(ExitCode::SUCCESS)
}

fn apply_tolerances(model: &mut Model, tolerance: Option<f64>, angle_tolerance: Option<f64>) -> Result<()> {
    if let Some(tolerance) = tolerance {
        model.set_tolerance(tolerance)?;
    }
    if let Some(angle_tolerance) = angle_tolerance {
        model.set_angle_tolerance(angle_tolerance)?;
    }
    Ok(())
}

fn validate(model: &Model, json: bool) -> Result<ExitCode> {
    let report = model.check_all(false, json)?;
    let valid = report.is_valid();
    match &report {
        CheckReport::Detailed(errors) => {
            println!("{}", serde_json::to_string_pretty(errors)?);
        }
        CheckReport::Message(_) if valid => {
            println!("Model \"{}\" is valid.", model.display_name());
        }
        CheckReport::Message(message) => {
            println!("{}", message);
        }
    }
    if valid {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(model = %model.full_id(), "Model is not valid");
        Ok(ExitCode::FAILURE)
    }
}

fn adjacency(model: &mut Model, output: Option<&Path>) -> Result<ExitCode> {
    let info = model.solve_adjacency().context("Failed to solve adjacency")?;
    info!(
        faces = info.faces.len(),
        apertures = info.apertures.len(),
        doors = info.doors.len(),
        "Solved adjacency"
    );
    write_model(model, output)
}

fn shade<H: LouverHost>(host: &mut H, shading: Shading, spec: &LouverSpec) -> honeybee_core::Result<usize> {
    Ok(match shading {
        Shading::Overhang => usize::from(host.overhang(spec)?.is_some()),
        Shading::Louvers(count) => host.louvers_by_count(count, spec)?.len(),
        Shading::Border => host.extruded_border(spec.depth, spec.indoor)?.len(),
    })
}

/// Adds shading to every outdoor wall, or to every window in one.
/// Returns the number of shades created.
fn add_shading(model: &mut Model, shading: Shading, spec: &LouverSpec, per_wall: bool) -> Result<usize> {
    let mut created = 0;
    for wall in model.outdoor_walls_mut() {
        if per_wall {
            created += shade(wall, shading, spec)
                .with_context(|| format!("Failed to shade wall {}", wall.full_id()))?;
        } else {
            for aperture in wall.apertures_mut() {
                created += shade(aperture, shading, spec)
                    .with_context(|| format!("Failed to shade window {}", aperture.full_id()))?;
            }
        }
    }
    info!(shades = created, ?shading, per_wall, "Added shading");
    Ok(created)
}

fn shoe_box(
    [width, depth, height]: [f64; 3],
    orientation_angle: f64,
    window_ratio: f64,
    units: Units,
    tolerance: f64,
) -> Result<Model> {
    let mut room = Room::from_box(
        &clean_and_id_string("Shoe_Box_Room"),
        width,
        depth,
        height,
        orientation_angle,
        Point3::origin(),
    )?;
    room.set_display_name("Shoe_Box_Room");
    room.faces_mut()
        .get_mut(1)
        .context("box room has no front face")?
        .apertures_by_ratio(window_ratio)?;

    let mut model = Model::new(&clean_and_id_string("Shoe_Box_Model"))?;
    model.set_display_name("Shoe_Box_Model");
    model.set_units(units);
    model.set_tolerance(tolerance)?;
    model.add_room(room);
    info!(model = %model.full_id(), %units, "Created shoe box");
    Ok(model)
}
