use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bargal::{
    load_catalog, run_batch, save_png, select_range, AcquisitionClient, BatchReport, Config,
    CutoutFormat, GalaxyRef, HttpCutoutSource, ObservationOptions, PresetRegistry,
    TieredCache,
};

#[derive(Parser)]
#[command(name = "bargal")]
#[command(about = "Galaxy cutout acquisition and bar feature extraction")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base log level; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write daily rotated logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a colour cutout at the given coordinates
    Download {
        /// Right ascension (degrees)
        ra: f64,
        /// Declination (degrees)
        #[arg(allow_negative_numbers = true)]
        dec: f64,
        /// File name without extension
        #[arg(short, long)]
        name: Option<String>,
        /// Also download each band separately
        #[arg(long)]
        by_bands: bool,
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Fill a cache directory with the cutouts of a catalog
    DownloadDataset {
        /// CSV catalog with name, objra, objdec and Bars columns
        catalog: PathBuf,
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Number of rows to skip
        #[arg(short, long)]
        skip: Option<usize>,
        /// Number of rows to process
        #[arg(short, long)]
        top: Option<usize>,
        /// Also fetch these bands as separate rasters (e.g. "grz")
        #[arg(long)]
        bands: Option<String>,
        /// Also fetch the FITS cube
        #[arg(long)]
        cube: bool,
    },

    /// Write the feature image of every catalog galaxy as a PNG
    Preprocess {
        catalog: PathBuf,
        /// Cache directory holding (or receiving) the cutouts
        img_dir: PathBuf,
        #[arg(short, long, default_value = "data/processed")]
        output_dir: PathBuf,
        /// Preset name; defaults to the configured preset
        #[arg(long)]
        preset: Option<String>,
        #[arg(short, long)]
        skip: Option<usize>,
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// List the available preprocessing presets
    Presets,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    common::log_setup::setup_logging(&cli.log_level, cli.log_dir.as_deref())
        .context("Failed to initialise logging")?;

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Download {
            ra,
            dec,
            name,
            by_bands,
            output_dir,
        } => download(&config, ra, dec, name, by_bands, &output_dir),
        Commands::DownloadDataset {
            catalog,
            output_dir,
            skip,
            top,
            bands,
            cube,
        } => download_dataset(config, &catalog, output_dir, skip, top, bands, cube),
        Commands::Preprocess {
            catalog,
            img_dir,
            output_dir,
            preset,
            skip,
            top,
        } => preprocess(config, &catalog, img_dir, &output_dir, preset, skip, top),
        Commands::Presets => list_presets(&config),
    }
}

fn download(
    config: &Config,
    ra: f64,
    dec: f64,
    name: Option<String>,
    by_bands: bool,
    output_dir: &Path,
) -> Result<ExitCode> {
    let name = name.unwrap_or_else(|| format!("cutout_ra{}_dec{}", ra, dec));
    let galaxy = GalaxyRef::new(name, ra, dec);

    // Direct downloads bypass every cache tier.
    let source = HttpCutoutSource::new(config.acquisition.clone())?;
    let client = AcquisitionClient::new(source, TieredCache::new());

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let filename = format!("{}.jpg", galaxy.cache_name());
    let path = output_dir.join(&filename);
    let composite = client.get_composite(&galaxy, false)?;
    std::fs::write(&path, composite)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Image saved as {}", path.display());

    if by_bands {
        let bands = client.get_bands(&galaxy, "grz", CutoutFormat::Raster, false)?;
        for (band, bytes) in bands {
            let path = output_dir.join(format!("{}.{}.jpg", filename, band));
            std::fs::write(&path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Band image saved as {}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn download_dataset(
    mut config: Config,
    catalog: &Path,
    output_dir: PathBuf,
    skip: Option<usize>,
    top: Option<usize>,
    bands: Option<String>,
    cube: bool,
) -> Result<ExitCode> {
    let galaxies = load_catalog(catalog)?;
    let galaxies = select_range(&galaxies, skip, top);
    tracing::info!("Downloading cutouts for {} galaxies", galaxies.len());

    config.cache.dir = Some(output_dir);
    config.cache.persist = true;
    let client = AcquisitionClient::from_config(&config)?;
    let cube_options = ObservationOptions {
        use_cube_format: true,
        include_composite: false,
        persist: true,
    };

    let report = run_batch(galaxies, config.retry_passes, |galaxy| {
        client.get_composite(galaxy, true)?;
        if let Some(bands) = &bands {
            client.get_bands(galaxy, bands, CutoutFormat::Raster, true)?;
        }
        if cube {
            client.get_observation(galaxy, &cube_options)?;
        }
        Ok(())
    });

    Ok(finish(&report))
}

fn preprocess(
    mut config: Config,
    catalog: &Path,
    img_dir: PathBuf,
    output_dir: &Path,
    preset: Option<String>,
    skip: Option<usize>,
    top: Option<usize>,
) -> Result<ExitCode> {
    let registry = PresetRegistry::with_definitions(&config.presets)?;
    let preset = preset.unwrap_or_else(|| config.preset.clone());
    let processor = registry.get(&preset)?;
    tracing::info!("Preprocessing with '{}': {}", preset, processor.describe());

    let galaxies = load_catalog(catalog)?;
    let galaxies = select_range(&galaxies, skip, top);

    config.cache.dir = Some(img_dir);
    let client = AcquisitionClient::from_config(&config)?;
    let options = ObservationOptions {
        use_cube_format: true,
        include_composite: false,
        persist: config.cache.persist,
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let report = run_batch(galaxies, config.retry_passes, |galaxy| {
        let observation = client.get_observation(galaxy, &options)?;
        let feature = processor.preprocess(&observation)?;
        let path = output_dir.join(format!("{}_processed.png", galaxy.cache_name()));
        save_png(&feature, &path)?;
        Ok(path)
    });

    for (_, path) in &report.succeeded {
        println!("Wrote {}", path.display());
    }
    Ok(finish(&report))
}

fn list_presets(config: &Config) -> Result<ExitCode> {
    let registry = PresetRegistry::with_definitions(&config.presets)?;
    for (name, processor) in registry.iter() {
        let marker = if name == config.preset { " (default)" } else { "" };
        println!("{}{}", name, marker);
        println!("    {}", processor.describe());
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints the failure list and maps it to the exit status.
fn finish<R>(report: &BatchReport<'_, GalaxyRef, R>) -> ExitCode {
    println!(
        "{} of {} galaxies processed",
        report.succeeded.len(),
        report.total()
    );
    if report.is_complete() {
        return ExitCode::SUCCESS;
    }

    println!("Failed ({}):", report.failed.len());
    for failure in &report.failed {
        println!(
            "  {} after {} attempt(s): {}",
            failure.item.cache_name(),
            failure.attempts,
            failure.error
        );
    }
    ExitCode::FAILURE
}
