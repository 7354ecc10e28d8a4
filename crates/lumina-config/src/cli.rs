//! Command-line argument parsing for the Lumina demo.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Lumina demo command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "lumina", about = "Render a global-illumination test scene")]
pub struct CliArgs {
    /// Image width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Ambient occlusion for every shading point.
    #[arg(long)]
    pub occlusion: Option<f32>,

    /// Worker threads (0 = one per core).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Write the render to this PNG file.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Disable reflection probes and use the fallback specular color.
    #[arg(long)]
    pub no_reflections: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.demo.width = w;
        }
        if let Some(h) = args.height {
            self.demo.height = h;
        }
        if let Some(occlusion) = args.occlusion {
            self.demo.occlusion = occlusion;
        }
        if let Some(threads) = args.threads {
            self.demo.threads = threads;
        }
        if let Some(ref output) = args.output {
            self.demo.output = Some(output.clone());
        }
        if args.no_reflections {
            self.shading.reflections.enabled = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
