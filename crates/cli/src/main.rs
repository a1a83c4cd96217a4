//! `raster` — a small command-line front end over `raster-core`: builds a
//! scene (a built-in demo, or a JSON description), drives a
//! [`RenderingContext`] over it, and writes the result to a PNG.

mod scene;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use raster_core::context::create_info::ContextCreateInfo;
use raster_core::export;
use raster_core::target::format::PixelFormat;
use raster_core::target::Image;
use raster_core::RenderingContext;

#[derive(Parser)]
#[command(name = "raster", version, about = "Exercise the raster-core engine from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a scene (demo, or a JSON scene file) to a PNG.
    Render {
        /// Output PNG path.
        #[arg(short, long)]
        output: PathBuf,
        /// Image width in pixels.
        #[arg(long, default_value_t = 512)]
        width: u32,
        /// Image height in pixels.
        #[arg(long, default_value_t = 512)]
        height: u32,
        /// JSON scene file; falls back to a built-in demo scene if omitted.
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Worker thread count for asynchronous rendering (0/1 = synchronous).
        #[arg(long, default_value_t = 0)]
        threads: u32,
    },
    /// Render the demo scene `frames` times on independent images, using
    /// `rayon` to parallelize across frames (distinct from the engine's own
    /// worker pool, which parallelizes within a single frame).
    Bench {
        #[arg(long, default_value_t = 256)]
        width: u32,
        #[arg(long, default_value_t = 256)]
        height: u32,
        #[arg(long, default_value_t = 32)]
        frames: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            output,
            width,
            height,
            scene: scene_path,
            threads,
        } => render(output, width, height, scene_path, threads),
        Command::Bench { width, height, frames } => bench(width, height, frames),
    }
}

fn render(
    output: PathBuf,
    width: u32,
    height: u32,
    scene_path: Option<PathBuf>,
    threads: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed_scene = match &scene_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        None => scene::demo_scene(width as f64, height as f64),
    };

    let mut image = Image::new(width, height, PixelFormat::Prgb32)?;
    let create_info = ContextCreateInfo {
        thread_count: threads,
        ..ContextCreateInfo::default()
    };
    let mut ctx = RenderingContext::begin(&mut image, create_info)?;
    scene::execute(&mut ctx, &parsed_scene)?;
    ctx.end()?;

    let flags = ctx.accumulated_error_flags();
    if !flags.is_empty() {
        log::warn!("render completed with accumulated error flags: {flags:?}");
    }

    export::write_png(&image, &output)?;
    log::info!("wrote {}x{} PNG to {}", width, height, output.display());
    Ok(())
}

fn bench(width: u32, height: u32, frames: u32) -> Result<(), Box<dyn std::error::Error>> {
    use rayon::prelude::*;

    let start = Instant::now();
    let errors: Vec<_> = (0..frames)
        .into_par_iter()
        .map(|_| -> Result<(), String> {
            let mut image = Image::new(width, height, PixelFormat::Prgb32).map_err(|e| e.to_string())?;
            let mut ctx = RenderingContext::begin(&mut image, ContextCreateInfo::default()).map_err(|e| e.to_string())?;
            scene::execute(&mut ctx, &scene::demo_scene(width as f64, height as f64)).map_err(|e| e.to_string())?;
            ctx.end().map_err(|e| e.to_string())
        })
        .filter_map(Result::err)
        .collect();

    let elapsed = start.elapsed();
    if !errors.is_empty() {
        return Err(format!("{} of {frames} frames failed: {}", errors.len(), errors[0]).into());
    }

    println!(
        "rendered {frames} frames of {width}x{height} in {:.2?} ({:.3?}/frame)",
        elapsed,
        elapsed / frames.max(1)
    );
    Ok(())
}
