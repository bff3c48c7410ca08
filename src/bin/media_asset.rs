// media_asset - inspect, copy and thumbnail media assets from the command line

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use media_asset::{AssetConfig, Classifier, CopyOptions, FrameTemplate};

#[derive(Parser)]
#[command(name = "media_asset", version, about = "Classify, inspect and copy media assets")]
struct Args {
    /// YAML configuration file (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print what a path classifies as
    Info {
        path: PathBuf,
        /// Also probe resolution and video frame counts
        #[arg(long)]
        probe: bool,
    },
    /// Copy an asset; sequences need a frame template destination
    Copy {
        source: PathBuf,
        destination: PathBuf,
        /// Leading source frames to drop
        #[arg(long, default_value_t = 0)]
        start_offset: u32,
        /// First destination frame (defaults to the source start)
        #[arg(long)]
        new_start_frame: Option<u32>,
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Render a thumbnail into the temp dir and print its path
    Thumbnail {
        path: PathBuf,
        #[arg(long)]
        width: Option<i32>,
        #[arg(long)]
        height: Option<i32>,
    },
    /// Print whether the asset starts with a slate
    Slate { path: PathBuf },
    /// Print the frames present on disk for a frame template
    Frames { template: PathBuf },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => AssetConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AssetConfig::builtin().context("Failed to build default config")?,
    };
    let classifier = Classifier::new(config);

    match args.command {
        Cmd::Info { path, probe } => {
            let asset = classifier
                .classify(&path)
                .with_context(|| format!("Failed to classify {}", path.display()))?;
            let info = asset.info(probe).context("Failed to collect asset info")?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Cmd::Copy {
            source,
            destination,
            start_offset,
            new_start_frame,
            overwrite,
            dry_run,
        } => {
            let asset = classifier
                .classify(&source)
                .with_context(|| format!("Failed to classify {}", source.display()))?;
            let options = CopyOptions {
                start_offset,
                new_start_frame,
                overwrite,
                dry_run,
            };
            let report = asset
                .copy_to(&destination, &options)
                .with_context(|| format!("Failed to copy {}", source.display()))?;

            let result = report
                .asset
                .as_ref()
                .map(|a| a.info(false))
                .transpose()
                .context("Failed to inspect the copied asset")?;
            let summary = json!({
                "dry_run": report.dry_run,
                "planned": report.planned(),
                "copied": report.copied(),
                "skipped": report.skipped(),
                "warnings": report.warnings,
                "frames": report.frames,
                "result": result,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Cmd::Thumbnail {
            path,
            width,
            height,
        } => {
            let mut asset = classifier
                .classify(&path)
                .with_context(|| format!("Failed to classify {}", path.display()))?;
            let (default_width, default_height) = classifier.config().thumbnail_size();
            let thumbnail = asset.generate_thumbnail(
                width.unwrap_or(default_width),
                height.unwrap_or(default_height),
            );
            match thumbnail {
                // the printed file is the caller's to remove
                Ok(Some(thumb)) => println!("{}", thumb.display()),
                result => {
                    asset
                        .remove_tmp_files()
                        .context("Failed to remove temporary files")?;
                    result.context("Failed to generate thumbnail")?;
                    anyhow::bail!("No thumbnail was produced for {}", path.display());
                }
            }
        }
        Cmd::Slate { path } => {
            let asset = classifier
                .classify(&path)
                .with_context(|| format!("Failed to classify {}", path.display()))?;
            let slate = asset.has_slate().context("Slate detection failed")?;
            println!("{}", slate);
        }
        Cmd::Frames { template } => {
            let template = FrameTemplate::parse(&template)?;
            let frames = template
                .existing_frames()
                .with_context(|| format!("Failed to scan {}", template.dir().display()))?;
            println!("{} [{}]", template, frames);
        }
    }

    Ok(())
}
