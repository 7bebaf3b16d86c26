//! `perceptkit` CLI - load images, generate stimuli and inspect moments.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ndarray::Axis;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use perceptkit::image::{load_images, save_image, ColorMode, ImageBatch, ImageSource};
use perceptkit::stats::{kurtosis, skew, variance, Reduction};
use perceptkit::synthetic::{make_synthetic_stimuli, Stimulus, StimulusConfig};

/// Image loading, synthetic stimuli and moment statistics for perception models.
#[derive(Parser, Debug)]
#[command(name = "perceptkit")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load images and report the batch shape and value range.
    Load {
        /// Image files, or a single directory.
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Keep color channels instead of converting to grayscale.
        #[arg(long)]
        color: bool,
    },

    /// Generate the synthetic stimulus battery and save it as PNG files.
    Stimuli {
        /// Height and width of each stimulus.
        #[arg(short, long, default_value = "256", value_name = "INT")]
        size: usize,

        /// Fractal dimension of the pink noise stimulus.
        #[arg(long, default_value = "0.8", value_name = "FLOAT")]
        fract_dim: f64,

        /// Random seed for reproducibility.
        #[arg(long, value_name = "INT")]
        seed: Option<u64>,

        /// Output directory.
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,
    },

    /// Print variance, skew and kurtosis of every loaded image.
    Moments {
        /// Image files, or a single directory.
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Keep color channels instead of converting to grayscale.
        #[arg(long)]
        color: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("perceptkit={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&cli.command) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: &Command) -> Result<()> {
    match command {
        Command::Load { paths, color } => {
            let batch = load(paths, *color)?;
            let min = batch.iter().copied().fold(f32::INFINITY, f32::min);
            let max = batch.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            println!("shape {:?}, values in [{min}, {max}]", batch.shape());
        }
        Command::Stimuli {
            size,
            fract_dim,
            seed,
            out,
        } => {
            let config = StimulusConfig {
                size: *size,
                fract_dim: *fract_dim,
                seed: *seed,
                ..StimulusConfig::default()
            };
            write_stimuli(&config, out)?;
        }
        Command::Moments { paths, color } => {
            let batch = load(paths, *color)?;
            print_moments(&batch)?;
        }
    }

    Ok(())
}

fn load(paths: &[PathBuf], color: bool) -> Result<ImageBatch> {
    // A lone argument may be a directory.
    let source = match paths {
        [single] => ImageSource::Path(single.clone()),
        _ => ImageSource::Paths(paths.to_vec()),
    };
    let mode = if color {
        ColorMode::Color
    } else {
        ColorMode::Gray
    };

    load_images(source, mode).context("Failed to load images")
}

fn write_stimuli(config: &StimulusConfig, out: &Path) -> Result<()> {
    let set = make_synthetic_stimuli(config).context("Failed to generate stimuli")?;

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    for (stimulus, image) in Stimulus::ALL.iter().zip(set.stimuli.axis_iter(Axis(0))) {
        let path = out.join(format!("{:02}_{}.png", stimulus.index(), stimulus.name()));
        save_image(&image, &path)
            .with_context(|| format!("Failed to save {}", stimulus.name()))?;
    }

    println!(
        "Wrote {} stimuli of size {}x{} to {}",
        Stimulus::ALL.len(),
        config.size,
        config.size,
        out.display()
    );
    Ok(())
}

fn print_moments(batch: &ImageBatch) -> Result<()> {
    let per_image = Reduction::over([1, 2, 3]);

    let var = variance(batch, None, &per_image)?;
    let skewness = skew(batch, None, Some(&var), &per_image)?;
    let kurt = kurtosis(batch, None, Some(&var), &per_image)?;

    println!("{:>5} {:>12} {:>12} {:>12}", "image", "variance", "skew", "kurtosis");
    for (i, ((v, s), k)) in var.iter().zip(skewness.iter()).zip(kurt.iter()).enumerate() {
        println!("{i:>5} {v:>12.6} {s:>12.6} {k:>12.6}");
    }

    Ok(())
}
