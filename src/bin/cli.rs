// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Solidcut Contributors

//! Solidcut CLI

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::Vector3;
use solidcut::{boolean, cuboid, export_stl, import_stl, BooleanOp};
use std::path::Path;

#[derive(Parser)]
#[command(name = "solidcut")]
#[command(about = "Solidcut - boolean operations on watertight triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Operator {
    Union,
    Intersect,
    Subtract,
}

impl From<Operator> for BooleanOp {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Union => BooleanOp::Union,
            Operator::Intersect => BooleanOp::Intersect,
            Operator::Subtract => BooleanOp::Subtract,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a boolean operator to two STL files
    Op {
        /// Operator to apply
        #[arg(value_enum)]
        operator: Operator,

        /// First operand (STL file)
        a: String,

        /// Second operand (STL file)
        b: String,

        /// Output STL file
        #[arg(short, long)]
        output: String,
    },

    /// Subtract one box from another and export the result
    Frame {
        /// Outer box dimensions (x y z)
        #[arg(long, num_args = 3, default_values_t = [5.0, 5.0, 1.0])]
        outer: Vec<f64>,

        /// Inner box dimensions (x y z)
        #[arg(long, num_args = 3, default_values_t = [3.0, 3.0, 1.0])]
        inner: Vec<f64>,

        /// Inner box offset (x y z)
        #[arg(long, num_args = 3, default_values_t = [1.0, 1.0, 0.0])]
        offset: Vec<f64>,

        /// Output STL file
        #[arg(short, long, default_value = "out.stl")]
        output: String,
    },

    /// Print mesh statistics for an STL file
    Stats {
        /// Input STL file
        input: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Op {
            operator,
            a,
            b,
            output,
        } => op_command(*operator, a, b, output, cli.verbose)?,
        Commands::Frame {
            outer,
            inner,
            offset,
            output,
        } => frame_command(outer, inner, offset, output, cli.verbose)?,
        Commands::Stats { input } => stats_command(input)?,
        Commands::Version => {
            println!("Solidcut v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn op_command(
    operator: Operator,
    a: &str,
    b: &str,
    output: &str,
    verbose: bool,
) -> Result<()> {
    for input in [a, b] {
        if !Path::new(input).exists() {
            eprintln!("Error: Input file not found: {}", input);
            std::process::exit(1);
        }
    }

    let mesh_a = import_stl(a)?;
    let mesh_b = import_stl(b)?;
    if verbose {
        println!(
            "Operands: {} ({} faces), {} ({} faces)",
            a,
            mesh_a.face_count(),
            b,
            mesh_b.face_count()
        );
    }

    let start = std::time::Instant::now();
    let result = boolean(&mesh_a, &mesh_b, operator.into())?;
    if verbose {
        println!("Computed in {:.2?}", start.elapsed());
        print_stats(&result);
    }

    export_stl(&result, output)?;
    println!("Wrote {}", output);
    Ok(())
}

fn frame_command(
    outer: &[f64],
    inner: &[f64],
    offset: &[f64],
    output: &str,
    verbose: bool,
) -> Result<()> {
    let outer_box = cuboid(Vector3::new(outer[0], outer[1], outer[2]));
    let inner_box = cuboid(Vector3::new(inner[0], inner[1], inner[2]))
        .translated(Vector3::new(offset[0], offset[1], offset[2]));

    let start = std::time::Instant::now();
    let result = outer_box.subtract(&inner_box)?;
    if verbose {
        println!("Computed in {:.2?}", start.elapsed());
        print_stats(&result);
    }

    export_stl(&result, output)?;
    println!("Wrote {}", output);
    Ok(())
}

fn stats_command(input: &str) -> Result<()> {
    if !Path::new(input).exists() {
        eprintln!("Error: Input file not found: {}", input);
        std::process::exit(1);
    }
    let mesh = import_stl(input)?;
    print_stats(&mesh);
    Ok(())
}

fn print_stats(mesh: &solidcut::Mesh) {
    println!("Vertices: {}", mesh.vertex_count());
    println!("Faces: {}", mesh.face_count());
    println!("Volume: {:.6}", mesh.volume());
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Euler characteristic: {}", mesh.euler_characteristic());
}
