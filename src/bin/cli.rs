// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshmend CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use meshmend::cli::Reporter;
use meshmend::geometry::Primitive;
use meshmend::{export_mesh, import_mesh, MeshStats, RepairConfig, SegmentRecorder};
use nalgebra::Vector3;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "meshmend")]
#[command(about = "Weld open seams and find self-intersections in polygon meshes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge coincident open edges
    Weld {
        /// Input mesh (.obj or .stl)
        input: PathBuf,

        /// Output mesh (.obj or .stl)
        output: PathBuf,

        #[arg(long)]
        abs_tolerance: Option<f64>,

        #[arg(long)]
        rel_tolerance: Option<f64>,

        /// Merge any coincident edges, not only open ones
        #[arg(long)]
        merge_any: bool,

        /// Color faces by connected region
        #[arg(long)]
        mark_regions: bool,

        /// Merge only edges flagged by `split --flag-new-edges`
        #[arg(long)]
        weld_flagged_edges: bool,

        /// Configuration file (defaults to ./meshmend.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Find edges that cut through coplanar faces
    Split {
        /// Input mesh (.obj or .stl)
        input: PathBuf,

        /// Output mesh (.obj or .stl)
        output: PathBuf,

        #[arg(long)]
        abs_tolerance: Option<f64>,

        #[arg(long)]
        rel_tolerance: Option<f64>,

        /// Add red marker cylinders along each intersection
        #[arg(long)]
        mark_intersections: bool,

        /// Flag edges that cross a face
        #[arg(long)]
        flag_new_edges: bool,

        /// Configuration file (defaults to ./meshmend.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print mesh statistics
    Info {
        /// Input mesh (.obj or .stl)
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write a generated test mesh
    Generate {
        #[arg(value_enum)]
        shape: Shape,

        /// Output mesh (.obj or .stl)
        output: PathBuf,

        /// Edge length, radius or cell size
        #[arg(long, default_value = "1.0")]
        size: f64,

        /// Segments for round shapes, cells per side for the fan
        #[arg(long, default_value = "16")]
        segments: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Shape {
    Cube,
    Sphere,
    Cylinder,
    Fan,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli.command) {
        Reporter::report_error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Weld {
            input,
            output,
            abs_tolerance,
            rel_tolerance,
            merge_any,
            mark_regions,
            weld_flagged_edges,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            let weld = &mut config.weld;
            weld.absolute_tolerance = abs_tolerance.unwrap_or(weld.absolute_tolerance);
            weld.relative_tolerance = rel_tolerance.unwrap_or(weld.relative_tolerance);
            weld.merge_any |= merge_any;
            weld.mark_regions |= mark_regions;
            weld.weld_flagged_edges |= weld_flagged_edges;
            weld_command(&input, &output, &config)
        }
        Commands::Split {
            input,
            output,
            abs_tolerance,
            rel_tolerance,
            mark_intersections,
            flag_new_edges,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            let split = &mut config.split;
            split.absolute_tolerance = abs_tolerance.unwrap_or(split.absolute_tolerance);
            split.relative_tolerance = rel_tolerance.unwrap_or(split.relative_tolerance);
            split.mark_intersections |= mark_intersections;
            split.flag_new_edges |= flag_new_edges;
            split_command(&input, &output, &config)
        }
        Commands::Info { input, json } => info_command(&input, json),
        Commands::Generate {
            shape,
            output,
            size,
            segments,
        } => generate_command(shape, &output, size, segments),
    }
}

fn load_config(path: Option<&Path>) -> Result<RepairConfig> {
    match path {
        Some(path) => {
            let mut config = RepairConfig::from_file(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => RepairConfig::load(),
    }
}

fn weld_command(input: &Path, output: &Path, config: &RepairConfig) -> Result<()> {
    let mut mesh = import_mesh(input)?;
    let mut welder = config.welder();

    let start = Instant::now();
    let summary = welder.weld(&mut mesh);
    let elapsed = start.elapsed();

    export_mesh(&mesh, output)?;
    Reporter::report_weld(&input.display().to_string(), &summary, elapsed);
    Ok(())
}

fn split_command(input: &Path, output: &Path, config: &RepairConfig) -> Result<()> {
    let mut mesh = import_mesh(input)?;
    if !mesh.all_faces_are_triangles() {
        anyhow::bail!("split needs a triangle mesh: {}", input.display());
    }
    let mut splitter = config.splitter();
    let mut recorder = SegmentRecorder::new();

    let start = Instant::now();
    let summary = splitter.split_faces(&mut mesh, &mut recorder);
    let elapsed = start.elapsed();

    export_mesh(&mesh, output)?;
    Reporter::report_split(&input.display().to_string(), &summary, elapsed);
    Ok(())
}

fn info_command(input: &Path, json: bool) -> Result<()> {
    let mesh = import_mesh(input)?;
    let stats = MeshStats::analyze(&mesh);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?);
    } else {
        Reporter::report_stats(&input.display().to_string(), &stats);
    }
    Ok(())
}

fn generate_command(shape: Shape, output: &Path, size: f64, segments: u32) -> Result<()> {
    let primitive = match shape {
        Shape::Cube => Primitive::cube(Vector3::new(size, size, size), true),
        Shape::Sphere => Primitive::sphere(size, segments),
        Shape::Cylinder => Primitive::cylinder(size * 2.0, size, segments),
        Shape::Fan => Primitive::square_fan(segments, size),
    };
    let mesh = primitive.to_mesh();
    export_mesh(&mesh, output)?;
    Reporter::success(&format!(
        "Wrote {} vertices and {} faces to {}",
        mesh.vertex_count(),
        mesh.face_count(),
        output.display()
    ));
    Ok(())
}
