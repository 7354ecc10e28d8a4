//! Lumina demo: renders a procedural scene through the illumination
//! composer and optionally writes it to a PNG.

mod render;
mod scene;

use clap::Parser;
use lumina_config::{CliArgs, Config};

use crate::render::Renderer;
use crate::scene::Scene;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => lumina_config::default_config_dir()?,
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    lumina_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(err) = config.validate() {
        tracing::warn!(%err, "config has out-of-range shading values");
    }

    let demo = &config.demo;
    let threads = if demo.threads == 0 {
        num_cpus::get().max(2)
    } else {
        demo.threads
    };
    tracing::info!(
        width = demo.width,
        height = demo.height,
        threads,
        "rendering test scene"
    );

    let scene = Scene::new();
    let renderer = Renderer::new(&scene, &config.shading, demo);
    let frame = renderer.render(demo.width, demo.height, threads)?;

    let stats = frame.stats();
    tracing::info!(
        mean_luminance = stats.mean_luminance,
        peak_luminance = stats.peak_luminance,
        "frame complete"
    );

    if let Some(path) = &demo.output {
        frame.save_png(path, demo.exposure)?;
        tracing::info!(path = %path.display(), "wrote image");
    }

    Ok(())
}
