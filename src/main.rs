//! plate-scout CLI - batch plate detection over image files
//!
//! Decodes each input image, runs the detection pipeline, writes the
//! diagnostic artifacts (edge map, morphed map, annotated original) and
//! crops next to a CSV/JSON results table. The OCR engine is an external
//! collaborator; without one configured, recognized text is reported as
//! unavailable and regions resolve through the empty-text sentinel.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use plate_scout::config::{self, AppConfig, ResolverPolicy};
use plate_scout::report;
use plate_scout::PlatePipeline;

/// Classical license plate detection with region mapping
#[derive(Parser, Debug)]
#[command(name = "plate-scout")]
#[command(about = "Locate license plates in photos and map plate text to regions")]
struct Args {
    /// Input image files (JPEG/PNG)
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Configuration file (TOML); defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolver policy override: national_prefix or province_code
    #[arg(long)]
    policy: Option<String>,

    /// Output directory for artifacts and result tables
    #[arg(short, long, default_value = "plate-scout-out")]
    output: PathBuf,

    /// Skip writing per-image diagnostic artifacts
    #[arg(long)]
    no_artifacts: bool,

    /// Write a default configuration file to the given path and exit
    #[arg(long)]
    write_default_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        config::save_config(&AppConfig::default(), path)
            .with_context(|| format!("failed to write config to {:?}", path))?;
        info!("Wrote default configuration to {:?}", path);
        return Ok(());
    }

    let mut app_config = load_or_default_config(args.config.as_deref())?;
    if let Some(policy) = &args.policy {
        app_config.resolver.policy = parse_policy(policy)?;
    }

    let pipeline = PlatePipeline::new(app_config).context("invalid configuration")?;
    info!("No OCR engine configured; recognized text will be reported as unavailable");

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory {:?}", args.output))?;

    let mut reports = Vec::new();
    for path in &args.images {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{}: unreadable, skipping ({})", name, e);
                continue;
            }
        };
        let image = match plate_scout::decode_image(&bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!("{}: not a decodable image, skipping ({})", name, e);
                continue;
            }
        };

        let detection = pipeline.process(&name, &image);
        if !args.no_artifacts {
            write_artifacts(&args.output, &detection)?;
        }
        reports.push(detection);
    }

    let csv = report::to_csv(&reports);
    std::fs::write(args.output.join("results.csv"), &csv).context("failed to write results.csv")?;
    let json = report::to_json(&reports).context("failed to serialize results")?;
    std::fs::write(args.output.join("results.json"), &json)
        .context("failed to write results.json")?;

    let summary = report::BatchSummary::from_reports(&reports);
    info!(
        "Done: {} image(s), {} with plates ({:.1}% success), {} plate(s) total",
        summary.images_processed,
        summary.images_with_plates,
        summary.success_rate,
        summary.plates_found
    );

    Ok(())
}

/// Load configuration from the given path, or fall back to defaults.
fn load_or_default_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let config = config::load_config(path)
                .with_context(|| format!("failed to load config from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        None => {
            info!("Using default configuration");
            Ok(AppConfig::default())
        }
    }
}

fn parse_policy(value: &str) -> Result<ResolverPolicy> {
    match value {
        "national_prefix" => Ok(ResolverPolicy::NationalPrefix),
        "province_code" => Ok(ResolverPolicy::ProvinceCode),
        other => anyhow::bail!(
            "unknown policy {:?}, expected national_prefix or province_code",
            other
        ),
    }
}

/// Write edge map, morphed map, annotated original and crops as PNGs.
fn write_artifacts(output: &Path, detection: &report::DetectionReport) -> Result<()> {
    let stem = Path::new(&detection.image_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| detection.image_name.clone());

    let save = |suffix: &str, write: &dyn Fn(&Path) -> image::ImageResult<()>| -> Result<()> {
        let path = output.join(format!("{}_{}.png", stem, suffix));
        write(&path).with_context(|| format!("failed to write {:?}", path))?;
        Ok(())
    };

    save("edges", &|p| detection.edge_map.save(p))?;
    save("morph", &|p| detection.morphed_map.save(p))?;
    save("annotated", &|p| detection.annotated.save(p))?;
    for record in &detection.records {
        save(&format!("plate_{}", record.plate_index), &|p| {
            record.crop.save(p)
        })?;
    }
    Ok(())
}
