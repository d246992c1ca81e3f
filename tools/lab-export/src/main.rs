//! lab-export - legacy .lab to COLLADA converter
//!
//! Converts .lab skeletal animation assets (bones, dummies, clips and an
//! optional skinned mesh) to .dae documents.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use lab_export::config::{self, SpaceSection};
use lab_export::space::UpAxis;
use lab_export::{batch, convert, info};

#[derive(Parser)]
#[command(name = "lab-export")]
#[command(about = "Legacy .lab skeletal animation to COLLADA converter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single .lab file to .dae
    Lab2dae {
        /// Input .lab file
        input: PathBuf,

        /// Output .dae file (default: input with .dae extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: lab2dae.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Up axis of the output
        #[arg(long, value_enum)]
        up_axis: Option<UpAxis>,

        /// Multiplier for translations and vertex positions
        #[arg(long)]
        unit_scale: Option<f32>,

        /// Reverse triangle winding (`--flip-winding=false` overrides the config)
        #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
        flip_winding: Option<bool>,
    },

    /// Convert many .lab files (directories are searched recursively)
    Batch {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: next to each input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file (default: lab2dae.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List bones, dummies, clips and mesh statistics
    Info {
        /// Input .lab file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lab2dae {
            input,
            output,
            config,
            up_axis,
            unit_scale,
            flip_winding,
        } => {
            let overrides = SpaceSection {
                up_axis,
                unit_scale,
                flip_winding,
            };
            let options = config::load_or_default(config.as_deref())?.resolve(&overrides)?;
            let output = output.unwrap_or_else(|| convert::default_output(&input));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            convert::convert_to_file(&input, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::Batch {
            inputs,
            output,
            config,
        } => {
            let options =
                config::load_or_default(config.as_deref())?.resolve(&SpaceSection::default())?;
            let files = batch::collect_inputs(&inputs);
            if files.is_empty() {
                anyhow::bail!("No .lab files found in {:?}", inputs);
            }
            tracing::info!("Converting {} files", files.len());

            let report = batch::convert_all(&files, output.as_deref(), &options);
            let failed: Vec<_> = report.failures().collect();
            tracing::info!(
                "{} converted, {} failed",
                report.succeeded(),
                failed.len()
            );
            if !failed.is_empty() {
                for entry in &failed {
                    if let Err(e) = &entry.result {
                        tracing::error!("  {:?}: {:#}", entry.input, e);
                    }
                }
                anyhow::bail!("{} of {} files failed", failed.len(), files.len());
            }
        }

        Commands::Info { input } => {
            info::list_asset(&input)?;
        }
    }

    Ok(())
}
