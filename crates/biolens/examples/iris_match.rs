//! Example: match one eye image against a set of enrolled eye images.
//!
//! Every image goes through the full iris pipeline (pupil, iris boundary,
//! rubber-sheet unwrap, Gabor phase code). The enrolled codes are stored in a
//! `CodeLibrary`, and the probe is compared against each of them with the
//! shift-tolerant Hamming distance. Images where no iris is found are
//! reported and skipped.
//!
//! Run from the workspace root:
//!   cargo run -p biolens --example iris_match -- --help
//!   cargo run -p biolens --example iris_match -- --probe a.png --enrolled b.png c.png

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use biolens::{
    CodeLibrary, ComparatorConfig, IrisCode, IrisPipeline, PixelBuffer, RecordTags, compare,
};
use clap::Parser;
use image::ImageReader;
use log::warn;
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Match a probe eye image against enrolled eye images")]
struct Args {
    /// Eye image to identify.
    #[arg(long)]
    probe: PathBuf,

    /// Eye images to enroll; each file stem becomes the record name.
    #[arg(long, num_args = 1.., required = true)]
    enrolled: Vec<PathBuf>,

    /// Pipeline configuration as JSON; missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Largest fractional Hamming distance that still counts as a match.
    #[arg(long, default_value_t = 0.2)]
    threshold: f32,

    /// Column shifts tried in each direction.
    #[arg(long, default_value_t = 8)]
    max_shift: usize,

    /// Output JSON path for the ranking.
    #[arg(long)]
    out: Option<PathBuf>,
}

// ── JSON DTOs ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CandidateDto {
    name: String,
    distance: f32,
    shift: i32,
    is_match: bool,
}

#[derive(Serialize)]
struct MatchResult {
    probe: String,
    /// Enrolled images whose pipeline failed, with the reason.
    skipped: Vec<(String, String)>,
    /// Sorted by ascending distance.
    candidates: Vec<CandidateDto>,
    best: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_rgba(path: &Path) -> Result<PixelBuffer> {
    let rgba = ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?
        .into_rgba8();
    let (w, h) = rgba.dimensions();
    PixelBuffer::from_rgba_bytes(w as usize, h as usize, rgba.as_raw())
        .with_context(|| format!("building pixel buffer for {}", path.display()))
}

fn encode_file(pipeline: &IrisPipeline, path: &Path) -> Result<IrisCode> {
    let img = load_rgba(path)?;
    let t0 = Instant::now();
    let analysis = pipeline
        .analyze(&img)
        .with_context(|| format!("analyzing {}", path.display()))?;
    println!(
        "  {}: pupil r={:.1}, iris r={:.1}  ({:.2} ms)",
        path.display(),
        analysis.pupil.radius,
        analysis.boundary.geometry.iris_radius(),
        t0.elapsed().as_secs_f64() * 1e3
    );
    Ok(analysis.encoding.code)
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let pipeline: IrisPipeline = match &args.config {
        Some(path) => {
            let data =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice(&data)
                .with_context(|| format!("parsing pipeline config {}", path.display()))?
        }
        None => IrisPipeline::default(),
    };
    pipeline.validate().context("invalid pipeline config")?;

    let cfg = ComparatorConfig {
        threshold: args.threshold,
        max_shift: args.max_shift,
    };
    cfg.validate().context("invalid comparator config")?;

    println!("enrolling {} images", args.enrolled.len());
    let mut library = CodeLibrary::new();
    let mut skipped = Vec::new();
    for (i, path) in args.enrolled.iter().enumerate() {
        match encode_file(&pipeline, path) {
            Ok(code) => {
                library
                    .save(&stem(path), code, RecordTags::default(), i as u64)
                    .context("enrolling code")?;
            }
            Err(err) => {
                warn!("skipping {}: {err:#}", path.display());
                skipped.push((path.display().to_string(), format!("{err:#}")));
            }
        }
    }
    if library.is_empty() {
        bail!("no enrolled image produced an iris code");
    }

    println!("probe:");
    let probe = encode_file(&pipeline, &args.probe)?;

    let mut candidates = library
        .iter()
        .map(|record| -> Result<CandidateDto> {
            let report = compare(&probe, &record.code, &cfg)?;
            Ok(CandidateDto {
                name: record.name.clone(),
                distance: report.distance,
                shift: report.shift,
                is_match: report.is_match,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    for c in &candidates {
        println!(
            "  {:<24} distance {:.4}  shift {:+}  {}",
            c.name,
            c.distance,
            c.shift,
            if c.is_match { "MATCH" } else { "" }
        );
    }

    let best = candidates
        .first()
        .filter(|c| c.is_match)
        .map(|c| c.name.clone());
    match &best {
        Some(name) => println!("identified as {name}"),
        None => println!("no enrolled image matches"),
    }

    if let Some(out) = &args.out {
        let result = MatchResult {
            probe: args.probe.display().to_string(),
            skipped,
            candidates,
            best,
        };
        let file =
            std::fs::File::create(out).with_context(|| format!("creating {}", out.display()))?;
        serde_json::to_writer_pretty(file, &result)
            .with_context(|| format!("writing JSON to {}", out.display()))?;
        println!("results written to {}", out.display());
    }

    Ok(())
}
