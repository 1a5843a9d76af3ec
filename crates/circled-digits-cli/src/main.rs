//! Batch driver: run the extraction engine over a directory of book-cover
//! photos, save the annotation crops, and write one `results.json` with the
//! per-photo classification scores.

mod paths;

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use serde::Serialize;

use circled_digits::{ExtractConfig, ExtractError, Extractor, Method, OcrResult, Template};
use circled_digits_core::{init_with_level, GrayImage};

#[derive(Parser, Debug)]
#[command(
    name = "circled-digits",
    version,
    about = "Locate and classify circled digit annotations on book-cover photos"
)]
struct Args {
    /// Reference series-title artwork image (not needed for circleDetect)
    #[arg(short = 'i', long)]
    title_img: Option<PathBuf>,

    /// Directory of book-cover photos to process
    #[arg(short = 'd', long)]
    img_dir: PathBuf,

    /// Directory receiving the annotation crops and results.json
    #[arg(short = 'o', long)]
    output_dir: PathBuf,

    /// Extraction method: homography, edgeTemplate or circleDetect
    #[arg(short = 'm', long, default_value = "homography")]
    method: String,

    /// Directory of digit templates; the filename stem is the label
    #[arg(short = 't', long)]
    templates_dir: PathBuf,

    /// Log debug detail
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// One entry of `results.json`, in input order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhotoRecord {
    source_filename: String,
    ocr_result: OcrResult,
}

fn load_gray(path: &Path) -> Result<GrayImage, ExtractError> {
    let decoded = image::open(path).map_err(|_| ExtractError::MissingOrUnreadableImage {
        path: path.display().to_string(),
    })?;
    let luma = decoded.to_luma8();
    Ok(GrayImage {
        width: luma.width() as usize,
        height: luma.height() as usize,
        data: luma.into_raw(),
    })
}

fn save_gray(path: &Path, img: &GrayImage) -> Result<(), image::ImageError> {
    image::save_buffer(
        path,
        &img.data,
        img.width as u32,
        img.height as u32,
        image::ExtendedColorType::L8,
    )
}

fn load_templates(dir: &Path) -> Result<Vec<Template>, Box<dyn Error>> {
    let mut templates = Vec::new();
    for path in paths::list_regular_files(dir)? {
        let full = path.to_string_lossy();
        let (_, stem, _) = paths::split_path(&full);
        let image = load_gray(&path)?;
        info!("template '{}': {}x{}", stem, image.width, image.height);
        templates.push(Template { label: stem, image });
    }
    Ok(templates)
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    // Unknown method names abort before any file is touched.
    Method::parse(&args.method)?;

    let config = ExtractConfig {
        method: args.method.clone(),
        ..ExtractConfig::default()
    };

    let reference = match &args.title_img {
        Some(path) => Some(load_gray(path)?),
        None => None,
    };
    let reference_view = reference.as_ref().map(|r| r.as_view());

    let templates = load_templates(&args.templates_dir)?;
    if templates.is_empty() {
        return Err(ExtractError::NoTemplatesLoaded.into());
    }
    info!("loaded {} digit templates", templates.len());

    let engine = Extractor::new(&config, reference_view.as_ref(), templates)?;

    fs::create_dir_all(&args.output_dir)?;

    let photos = paths::list_regular_files(&args.img_dir)?;
    let mut records = Vec::new();
    for path in &photos {
        let full = path.to_string_lossy();
        let (_, stem, extension) = paths::split_path(&full);

        let photo = match load_gray(path) {
            Ok(photo) => photo,
            Err(err) => {
                warn!("skipping {full}: {err}");
                continue;
            }
        };
        let extraction = match engine.process(&photo.as_view()) {
            Ok(extraction) => extraction,
            Err(err) => {
                warn!("skipping {full}: {err}");
                continue;
            }
        };

        let crop_path = args
            .output_dir
            .join(format!("{stem}_circledDigits{extension}"));
        save_gray(&crop_path, &extraction.crop)?;
        info!(
            "{full}: '{}' at ({}, {}), crop saved to {}",
            extraction.ocr.evaluated_digits,
            extraction.region.x,
            extraction.region.y,
            crop_path.display()
        );

        records.push(PhotoRecord {
            source_filename: full.into_owned(),
            ocr_result: extraction.ocr,
        });
    }

    let results_path = args.output_dir.join("results.json");
    let file = fs::File::create(&results_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records)?;
    info!(
        "wrote {} of {} photos to {}",
        records.len(),
        photos.len(),
        results_path.display()
    );

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = init_with_level(level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
