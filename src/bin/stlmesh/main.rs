//! stlmesh CLI - inspect and re-serialize STL meshes.
//!
//! Usage: stlmesh <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `stlmesh --help` for available commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};

use stlmesh::algo::weld::{weld_triangles, WeldOptions};
use stlmesh::io::{self, ascii, stl, AsciiOptions};
use stlmesh::mesh::TriangleMesh;

#[derive(Parser)]
#[command(name = "stlmesh")]
#[command(author, version, about = "STL half-edge mesh tool", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input STL file
        input: PathBuf,

        /// Weld points closer than this distance before building
        #[arg(long)]
        weld: Option<f64>,
    },

    /// Rewrite an STL file
    Convert {
        /// Input STL file
        input: PathBuf,

        /// Output STL file
        output: PathBuf,

        /// Write binary STL instead of ASCII
        #[arg(long)]
        binary: bool,

        /// Move the vertex centroid to the origin
        #[arg(long)]
        center: bool,

        /// Weld points closer than this distance before building
        #[arg(long)]
        weld: Option<f64>,

        /// Solid name for ASCII output
        #[arg(long, default_value = "mesh")]
        name: String,

        /// Significant digits for ASCII output (default: exact)
        #[arg(long)]
        precision: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, weld } => {
            cmd_info(&input, weld)?;
        }

        Commands::Convert {
            input,
            output,
            binary,
            center,
            weld,
            name,
            precision,
        } => {
            let options = AsciiOptions {
                name,
                precision,
            };
            cmd_convert(&input, &output, binary, center, weld, &options)?;
        }
    }

    Ok(())
}

/// Load a mesh, optionally welding the soup first.
fn load_mesh(input: &Path, weld: Option<f64>) -> Result<TriangleMesh, Box<dyn std::error::Error>> {
    let mesh: TriangleMesh = match weld {
        None => io::load(input)?,
        Some(tolerance) => {
            let soup = io::load_triangles(input)?;
            let welded = weld_triangles(&soup, &WeldOptions::default().with_tolerance(tolerance))?;
            if welded.dropped_triangles > 0 {
                println!("Dropped {} collapsed triangles", welded.dropped_triangles);
            }
            welded.into_mesh()?
        }
    };
    Ok(mesh)
}

fn cmd_info(input: &Path, weld: Option<f64>) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load_mesh(input, weld)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Facets: {}", mesh.num_facets());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Edges: {}", mesh.num_edges());

    let mut min_area = f64::MAX;
    let mut max_area = 0.0_f64;
    for f in mesh.facet_ids() {
        let area = mesh.facet_area(f);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
    }

    println!("Surface area: {:.6}", mesh.area());
    if mesh.num_facets() > 0 {
        println!("Facet area range: [{:.6}, {:.6}]", min_area, max_area);
    }

    let bbox = mesh.bbox();
    if !bbox.is_empty() {
        let (min, max) = (bbox.min(), bbox.max());
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let size = bbox.extent();
        println!("Dimensions: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z);
    }

    let lamina = mesh.lamina_halfedges().len();
    if lamina == 0 {
        println!("Topology: Closed (no lamina edges)");
        println!("Volume: {:.6}", mesh.volume());
    } else {
        println!("Topology: Open ({} lamina half-edges)", lamina);
    }

    Ok(())
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    binary: bool,
    center: bool,
    weld: Option<f64>,
    options: &AsciiOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load_mesh(input, weld)?;
    println!(
        "Loaded: {} vertices, {} facets",
        mesh.num_vertices(),
        mesh.num_facets()
    );

    if center {
        mesh.center();
    }

    let start = Instant::now();
    if binary {
        stl::save_binary(&mesh, output)?;
    } else {
        ascii::save(&mesh, output, options)?;
    }
    let elapsed = start.elapsed();

    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
