//! tiltpick command-line interface.
//!
//! Orders tilt-series images by the tilt angles recorded in a SerialEM
//! metadata document and stacks them into a normalized volume.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

use tiltpick_core::{
    get_ordered_tilt_matches, LowConfidencePolicy, MatchConfig, TiltMatch, DEFAULT_MIN_SCORE,
};
use tiltpick_io::{lazy_tilt_series_from_tilt_images, write_mrc, MrcHeader};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("Core error: {0}")]
    Core(#[from] tiltpick_core::Error),

    #[error("I/O error: {0}")]
    TiltpickIo(#[from] tiltpick_io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tilt-series image ordering for cryo-ET preprocessing.
#[derive(Parser)]
#[command(name = "tiltpick")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that match files to a metadata document.
#[derive(clap::Args)]
struct MatchArgs {
    /// SerialEM metadata document (.mdoc)
    mdoc: PathBuf,

    /// Candidate tilt image files (.mrc)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Score (0-100) below which a match is reported as low confidence
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    min_score: f64,

    /// Fail instead of warning on low-confidence matches
    #[arg(long)]
    strict: bool,
}

impl MatchArgs {
    fn config(&self) -> MatchConfig {
        let policy = if self.strict {
            LowConfidencePolicy::Reject
        } else {
            LowConfidencePolicy::Warn
        };
        MatchConfig::default()
            .with_min_score(self.min_score)
            .with_low_confidence(policy)
    }

    fn ordered(&self) -> Result<Vec<TiltMatch>> {
        Ok(get_ordered_tilt_matches(
            &self.mdoc,
            &self.images,
            &self.config(),
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print tilt images in ascending tilt-angle order
    Order {
        #[command(flatten)]
        matching: MatchArgs,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the header of an MRC file
    Info {
        /// Input MRC file
        input: PathBuf,
    },

    /// Build the normalized tilt series and report per-slice statistics
    Stack {
        #[command(flatten)]
        matching: MatchArgs,

        /// Write the normalized stack to this MRC file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn format_angle(m: &TiltMatch) -> String {
    m.tilt_angle
        .map_or_else(|| "-".to_string(), |a| format!("{:.2}", a))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Order { matching, json } => {
            let ordered = matching.ordered()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ordered)?);
            } else {
                println!("{:<6} | {:>8} | {:>6} | File", "Index", "Angle", "Score");
                println!("{:-<60}", "");
                for (i, m) in ordered.iter().enumerate() {
                    println!(
                        "{:<6} | {:>8} | {:>6.1} | {}",
                        i,
                        format_angle(m),
                        m.score,
                        m.path.display()
                    );
                }
            }
        }

        Commands::Info { input } => {
            let header = MrcHeader::read_from(&input)?;
            let [vx, vy, vz] = header.voxel_size();

            println!("File: {}", input.display());
            println!("Shape (nz, ny, nx): {:?}", header.shape());
            println!("Mode: {}", header.mode);
            println!("Voxel size: {:.3} x {:.3} x {:.3} A", vx, vy, vz);
            println!(
                "Density: min {} max {} mean {} rms {}",
                header.dmin, header.dmax, header.dmean, header.rms
            );
            println!(
                "Byte order: {}",
                if header.big_endian { "big" } else { "little" }
            );
            println!("Extended header: {} bytes", header.extended_header_size);
            for label in &header.labels {
                println!("Label: {}", label);
            }
        }

        Commands::Stack { matching, output } => {
            let start = Instant::now();
            let ordered = matching.ordered()?;
            let files: Vec<PathBuf> = ordered.iter().map(|m| m.path.clone()).collect();
            let series = lazy_tilt_series_from_tilt_images(&files)?;
            let [k, h, w] = series.shape();
            println!("Tilt series: {} slices of {} x {} ({})", k, h, w, series.mode());

            println!(
                "{:<6} | {:>8} | {:>10} | {:>10} | {:>10} | File",
                "Index", "Angle", "Min", "Max", "Mean"
            );
            println!("{:-<80}", "");
            for (i, m) in ordered.iter().enumerate() {
                let raw = series.raw_slice(i)?;
                let min = raw.iter().copied().fold(f32::INFINITY, f32::min);
                let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mean = raw.iter().map(|&v| f64::from(v)).sum::<f64>() / raw.len() as f64;
                println!(
                    "{:<6} | {:>8} | {:>10.2} | {:>10.2} | {:>10.2} | {}",
                    i,
                    format_angle(m),
                    min,
                    max,
                    mean,
                    m.path.display()
                );
            }

            if let Some(output) = output {
                let volume = series.compute()?;
                let non_finite = volume.iter().filter(|v| !v.is_finite()).count();
                if non_finite > 0 {
                    log::warn!(
                        "{} non-finite values after normalization (constant slices?)",
                        non_finite
                    );
                }
                write_mrc(&output, &volume)?;
                println!("Wrote {}", output.display());
            }

            println!("Done in {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_score_defaults_to_library_value() {
        let cli =
            Cli::try_parse_from(["tiltpick", "order", "TS_01.mdoc", "TS_01_000.mrc"]).unwrap();
        let Commands::Order { matching, json } = cli.command else {
            panic!("expected the order command");
        };
        assert!(!json);
        assert_eq!(matching.min_score, DEFAULT_MIN_SCORE);
        let config = matching.config();
        assert_eq!(config.min_score, MatchConfig::default().min_score);
        assert_eq!(config.low_confidence, LowConfidencePolicy::Warn);
    }

    #[test]
    fn test_strict_and_min_score_flags() {
        let cli = Cli::try_parse_from([
            "tiltpick",
            "stack",
            "--min-score",
            "75",
            "--strict",
            "TS_01.mdoc",
            "a.mrc",
            "b.mrc",
        ])
        .unwrap();
        let Commands::Stack { matching, output } = cli.command else {
            panic!("expected the stack command");
        };
        assert!(output.is_none());
        assert_eq!(matching.images.len(), 2);
        let config = matching.config();
        assert_eq!(config.min_score, 75.0);
        assert_eq!(config.low_confidence, LowConfidencePolicy::Reject);
    }
}
