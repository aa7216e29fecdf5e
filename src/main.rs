use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use groundgen::export;
use groundgen::terrain::Terrain;

#[derive(Parser, Debug)]
#[command(name = "groundgen")]
#[command(about = "Generate a layered 2D terrain and run the contour pipeline")]
struct Args {
    /// Width of the cell grid
    #[arg(short = 'W', long, default_value = "256")]
    width: i32,

    /// Height of the cell grid
    #[arg(short = 'H', long, default_value = "160")]
    height: i32,

    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of random edits to apply after the full pipeline, to
    /// exercise the selective rebuild
    #[arg(short, long, default_value = "0")]
    edits: usize,

    /// Side length of each random edit square, in cells
    #[arg(long, default_value = "6")]
    edit_size: i32,

    /// Export the painted grid to a PNG (chunk edges highlighted)
    #[arg(long)]
    export_png: Option<String>,

    /// Export chunk contours and triangulations to a JSON file
    #[arg(long)]
    export_json: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("Generating terrain with seed: {}", seed);
    println!("Grid size: {}x{}", args.width, args.height);

    let mut terrain = Terrain::new(args.width, args.height);
    terrain.generate_with_seed(seed);
    for material in 1..=2 {
        println!(
            "Material {}: {} cells painted",
            material,
            terrain.grid().count_material(material)
        );
    }

    println!("Tracing contours...");
    if let Err(err) = terrain.march() {
        eprintln!("Tracing failed: {}", err);
        std::process::exit(1);
    }
    let total_points: usize = terrain.chunks().map(|c| c.outer.len()).sum();
    let total_holes: usize = terrain.chunks().map(|c| c.holes.len()).sum();
    println!(
        "Traced {} chunks ({} holes, {} outer contour points)",
        terrain.chunk_count(),
        total_holes,
        total_points
    );

    println!("Smoothing contours...");
    terrain.smooth_contours();

    println!("Removing collinear vertices...");
    terrain.remove_vertices();
    let reduced_points: usize = terrain.chunks().map(|c| c.outer.len()).sum();
    println!(
        "Outer contour points after reduction: {} (was {})",
        reduced_points, total_points
    );

    println!("Triangulating...");
    let failures = terrain.decompose();
    let triangles: usize = terrain
        .chunks()
        .filter_map(|c| c.triangulation.as_ref())
        .map(|t| t.triangle_count())
        .sum();
    println!("Emitted {} triangles", triangles);
    for (id, err) in &failures {
        eprintln!("Chunk {:?} left untriangulated: {}", id, err);
    }

    if args.edits > 0 {
        println!("Applying {} random edits...", args.edits);
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x9e3779b97f4a7c15);
        let mut applied = 0;
        for _ in 0..args.edits {
            let x = rng.gen_range(0..args.width - args.edit_size);
            let y = rng.gen_range(0..args.height - args.edit_size);
            let material = rng.gen_range(0..=2);
            match terrain.edit_region(x, y, args.edit_size, material) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(err) => {
                    eprintln!("Edit at ({}, {}) failed: {}", x, y, err);
                    std::process::exit(1);
                }
            }
        }
        println!(
            "{} edits changed ground; terrain now has {} chunks",
            applied,
            terrain.chunk_count()
        );
    }

    if let Some(path) = &args.export_png {
        let img = export::grid_to_image_with_ownership(terrain.grid());
        match img.save(path) {
            Ok(()) => println!("Wrote {}", path),
            Err(err) => eprintln!("Failed to write {}: {}", path, err),
        }
    }

    if let Some(path) = &args.export_json {
        match export::terrain_to_json(&terrain) {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => println!("Wrote {}", path),
                Err(err) => eprintln!("Failed to write {}: {}", path, err),
            },
            Err(err) => eprintln!("Failed to serialize terrain: {}", err),
        }
    }
}
