use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colored::*;
use env_logger::{Builder, Env};
use image::{DynamicImage, ImageReader};
use log::{error, info, Level};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use imgpheno::core::db::{TaxaRepository, TaxonomyDb};
use imgpheno::core::report;
use imgpheno::features::{self, BinSections};
use imgpheno::segmentation;

/// Bin drawn by `bgr-means draw`
const DRAWN_BINS: &[usize] = &[2];

#[derive(Parser)]
#[command(name = "imgpheno")]
#[command(version, about = "Color and shape features from plant specimen photographs")]
struct Cli {
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test image segmentation
    Grabcut(GrabcutArgs),

    /// Get the rough shape of the main object and its binned BGR means
    BgrMeans(BgrMeansArgs),

    /// Print database statistics in LaTeX format
    Stats(StatsArgs),
}

#[derive(Args)]
struct GrabcutArgs {
    /// Input image
    #[arg(short = 'i', value_name = "FILE")]
    input: PathBuf,

    /// Output image
    #[arg(short = 'o', value_name = "FILE", default_value = "grabcut_output.png")]
    output: PathBuf,

    /// The number of GrabCut iterations
    #[arg(long, value_name = "N", default_value_t = 5)]
    iters: u32,

    /// The margin of the foreground rectangle from the edges
    #[arg(long, value_name = "N", default_value_t = 5)]
    margin: u32,

    /// Draw the ROI in the output, next to the segmented image
    #[arg(long)]
    roi: bool,

    /// Downscale the input so that width + height does not exceed N
    #[arg(long, value_name = "N")]
    max_perimeter: Option<u32>,
}

#[derive(Args)]
struct BgrMeansArgs {
    /// The number of segmentation iterations
    #[arg(long, value_name = "N", default_value_t = 5)]
    iters: u32,

    /// The margin of the foreground rectangle from the edges
    #[arg(long, value_name = "N", default_value_t = 1)]
    margin: u32,

    /// The number of horizontal and vertical bins
    #[arg(long, value_name = "N", default_value_t = 20)]
    bins: u32,

    /// Downscale the input so that width + height does not exceed N
    #[arg(long, value_name = "N")]
    max_perimeter: Option<u32>,

    #[command(subcommand)]
    task: BgrMeansTask,
}

#[derive(Subcommand)]
enum BgrMeansTask {
    /// Print BGR data in TSV format
    Tsv {
        /// Path to input image
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Copy the image with the first horizontal and vertical bins drawn
    Draw {
        /// Path to input image
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Path for output image
        #[arg(short = 'o', value_name = "FILE", default_value = "out.png")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct StatsArgs {
    /// Path to the metadata database
    #[arg(value_name = "META")]
    meta: PathBuf,

    #[command(subcommand)]
    task: StatsTask,
}

#[derive(Subcommand)]
enum StatsTask {
    /// Print stats as LaTeX commands
    DbStats,

    /// Taxa table with photo count per taxon
    Taxa {
        /// The number of species per row
        #[arg(long, value_name = "N", default_value_t = 1)]
        col: usize,
    },

    /// Section and species count per genus, with photo totals
    TaxaSummary,
}

fn init_logger(verbosity: &Verbosity<WarnLevel>) {
    // If user didn't pass -v/-q and RUST_LOG is set, honor the env var.
    let use_env = !verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();

    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let mut b = Builder::new();
        b.filter_level(verbosity.log_level_filter());
        b
    };

    logger
        .format(|buf, record| {
            let level_str = match record.level() {
                Level::Error => "ERROR".red().bold().to_string(),
                Level::Warn => "WARN".yellow().to_string(),
                Level::Info => "INFO".green().to_string(),
                Level::Debug => "DEBUG".blue().to_string(),
                Level::Trace => "TRACE".magenta().to_string(),
            };
            writeln!(buf, "[{}] {}", level_str, record.args())
        })
        .init();
}

/// Decode an image, failing explicitly when the file is missing or not an image
fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to read {:?}", path))?
        .with_guessed_format()
        .with_context(|| format!("Failed to read {:?}", path))?
        .decode()
        .with_context(|| format!("Failed to decode {:?}", path))?;
    if img.width() == 0 || img.height() == 0 {
        anyhow::bail!("Failed to read {:?}: image is empty", path);
    }
    info!("Loaded {:?} ({}x{})", path, img.width(), img.height());
    Ok(img)
}

fn run_grabcut(args: &GrabcutArgs) -> anyhow::Result<()> {
    let img = segmentation::scale_max_perimeter(load_image(&args.input)?, args.max_perimeter);
    let rgb = img.to_rgb8();

    info!("Segmenting...");
    let roi = segmentation::roi_from_margin(&rgb, args.margin)?;
    let mask = segmentation::grabcut(&rgb, &roi, args.iters)?;
    let binary = segmentation::binary_mask(&mask);
    let masked = segmentation::apply_mask(&rgb, &binary)?;

    let result = if args.roi {
        let mut with_roi = rgb.clone();
        features::draw_roi(&mut with_roi, &roi);
        features::draw::side_by_side(&with_roi, &masked)
    } else {
        masked
    };

    info!("Saving image to {:?}", args.output);
    result
        .save(&args.output)
        .with_context(|| format!("Failed to save output: {:?}", args.output))?;
    Ok(())
}

fn run_bgr_means(args: &BgrMeansArgs) -> anyhow::Result<()> {
    let path = match &args.task {
        BgrMeansTask::Tsv { path } | BgrMeansTask::Draw { path, .. } => path,
    };
    let img = segmentation::scale_max_perimeter(load_image(path)?, args.max_perimeter);
    let rgb = img.to_rgb8();

    let (_, binary) = segmentation::segment(&rgb, args.margin, args.iters)?;
    let contour = features::largest_contour(&binary)
        .with_context(|| format!("No foreground object found in {:?}", path))?;
    let masked = segmentation::apply_mask(&rgb, &binary)?;

    match &args.task {
        BgrMeansTask::Tsv { .. } => {
            let means =
                features::color_bgr_means(&DynamicImage::ImageRgb8(masked), &binary, &contour, args.bins)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            means.write_tsv(&mut out)?;
        }
        BgrMeansTask::Draw { output, .. } => {
            let rect = contour
                .bounding_rect()
                .context("Largest contour has no points")?;
            let sections = BinSections::new(&rect, args.bins, masked.width(), masked.height())?;
            let mut canvas = masked;
            features::draw_sections(&mut canvas, &sections, Some(DRAWN_BINS));
            canvas
                .save(output)
                .with_context(|| format!("Failed to save output: {:?}", output))?;
            info!("Saved {:?}", output);
        }
    }
    Ok(())
}

async fn run_stats(args: &StatsArgs) -> anyhow::Result<()> {
    let db = TaxonomyDb::open(&args.meta).await?;

    let mut buffer = Vec::new();
    let result = match &args.task {
        StatsTask::DbStats => {
            let photos = db.photo_count().await?;
            let species = db.species_count().await?;
            report::write_db_stats(&mut buffer, photos, species)
        }
        StatsTask::Taxa { col } => {
            let rows = db.taxa_photo_count().await?;
            report::write_taxa_table(&mut buffer, &rows, *col)
        }
        StatsTask::TaxaSummary => {
            let rows = db.taxa_photo_count_summary().await?;
            report::write_taxa_summary(&mut buffer, &rows)
        }
    };
    db.close().await;
    result?;

    io::stdout().lock().write_all(&buffer)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logger(&cli.verbosity);

    let result = match &cli.command {
        Commands::Grabcut(args) => run_grabcut(args),
        Commands::BgrMeans(args) => run_bgr_means(args),
        Commands::Stats(args) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")
            .and_then(|rt| rt.block_on(run_stats(args))),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
