//! World generator binary: pre-generates a square of chunks and saves it.
//!
//! Usage: cargo run --release --bin generate_world -- [OPTIONS]
//!
//! Options:
//!   --seed <SEED>       World seed (default: 12345)
//!   --radius <CHUNKS>   Chunks generated around the origin (default: 8)
//!   --out <DIR>         Save directory (default: config save_dir, "map")
//!   --config <FILE>     Engine config JSON (terrain params, compression)
//!   --jobs <N>          Max parallel chunk builds (default: all cores)
//!   --raw               Store chunk payloads uncompressed
//!
//! Output structure:
//!   <dir>/
//!     seed.txt
//!     0_0.chunk
//!     -1_0.chunk
//!     ...

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use terrastream::core::EngineConfig;
use terrastream::streaming::{StreamingWindow, save_world};
use terrastream::voxel::{ChunkCoord, World};

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => match EngineConfig::load(&PathBuf::from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    if let Some(out) = parse_str_arg(&args, "--out") {
        config.save_dir = PathBuf::from(out);
    }
    if args.iter().any(|a| a == "--raw") {
        config.compress_chunks = false;
    }

    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let radius = parse_i32_arg(&args, "--radius").unwrap_or(8).max(0);

    if let Some(jobs) = parse_usize_arg(&args, "--jobs") {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            log::warn!("Could not size thread pool: {}", e);
        }
    }

    println!("=== Terrastream World Generator ===");
    println!("Seed:   {}", seed);
    println!("Radius: {} chunks", radius);
    println!("Output: {}", config.save_dir.display());
    println!();

    let world = World::with_params(seed, config.terrain.clone());
    let coords = StreamingWindow::new(ChunkCoord::new(0, 0), radius).coords();
    let total = coords.len();

    let start = Instant::now();
    let generated = AtomicUsize::new(0);
    let solid: usize = coords
        .par_iter()
        .map(|&coord| {
            let chunk = world.get_chunk(coord);
            let done = generated.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 64 == 0 || done == total {
                eprintln!("  [{}/{}] {:.0} chunks/sec", done, total, done as f64 / start.elapsed().as_secs_f64());
            }
            chunk.solid_count()
        })
        .sum();

    let gen_time = start.elapsed();
    println!(
        "Generated {} chunks ({} solid blocks) in {:.2}s",
        total,
        solid,
        gen_time.as_secs_f64()
    );

    match save_world(&config.save_dir, &world, config.compress_chunks) {
        Ok(written) => println!(
            "Saved {} chunks in {:.2}s total",
            written,
            start.elapsed().as_secs_f64()
        ),
        Err(e) => {
            log::error!("Failed to save world: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_i32_arg(args: &[String], flag: &str) -> Option<i32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
