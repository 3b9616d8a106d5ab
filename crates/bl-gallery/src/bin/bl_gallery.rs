use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use bl_core::analysis::histogram_rgb;
use bl_core::color::{PointAdjustments, contrast_stretch, normalize};
use bl_core::draw::{draw_circle, draw_crosshair};
use bl_core::{Image, Kernel, PixelBuffer};
use bl_filter::{CannyConfig, CannyDetector, ConvolveMode, convolve, directional_filter};
use bl_iris::{
    CodeLibrary, ComparatorConfig, Eye, IrisCode, IrisPipeline, PupilConfig, RecordTags, compare,
    get_pupil, localize_pupil,
};
use bl_morph::{MorphOp, apply_sequence, distance_transform};
use bl_skeleton::{Polarity, SkeletonConfig, ThinningAlgorithm, skeletonize};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::{GrayImage, RgbaImage};
use log::info;
use serde::{Deserialize, Serialize};

const OVERLAY: [u8; 4] = [255, 64, 64, 255];
const CODE_SCALE: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "bl_gallery")]
#[command(about = "Run biolens algorithms on image files")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "adjust")]
    Adjust(AdjustArgs),
    #[command(name = "filter")]
    Filter(FilterArgs),
    #[command(name = "canny")]
    Canny(CannyArgs),
    #[command(name = "morphology")]
    Morphology(MorphologyArgs),
    #[command(name = "pupil")]
    Pupil(PupilArgs),
    #[command(name = "iris_code")]
    IrisCode(IrisCodeArgs),
    #[command(name = "compare")]
    Compare(CompareArgs),
    #[command(name = "skeleton")]
    Skeleton(SkeletonArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct AdjustArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long)]
    grayscale: bool,
    #[arg(long, default_value_t = 100.0)]
    brightness: f32,
    #[arg(long, default_value_t = 100.0)]
    contrast: f32,
    #[arg(long)]
    negative: bool,
    #[arg(long)]
    threshold: Option<f32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KernelArg {
    Average,
    Gaussian,
    Sharpen,
    Sobel,
    Roberts,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    WeightedMean,
    Raw,
}

impl ModeArg {
    fn name(self) -> &'static str {
        match self {
            Self::WeightedMean => "weighted_mean",
            Self::Raw => "raw",
        }
    }

    fn to_core(self) -> ConvolveMode {
        match self {
            Self::WeightedMean => ConvolveMode::WeightedMean,
            Self::Raw => ConvolveMode::Raw,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, value_enum, default_value_t = KernelArg::Gaussian)]
    kernel: KernelArg,
    /// Ignored for the directional kernels.
    #[arg(long, value_enum, default_value_t = ModeArg::WeightedMean)]
    mode: ModeArg,
}

#[derive(Args, Debug, Clone)]
struct CannyArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 50.0)]
    low: f32,
    #[arg(long, default_value_t = 100.0)]
    high: f32,
    #[arg(long)]
    no_blur: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MorphOpArg {
    Erode,
    Dilate,
    Open,
    Close,
}

impl MorphOpArg {
    fn to_core(self) -> MorphOp {
        match self {
            Self::Erode => MorphOp::Erode,
            Self::Dilate => MorphOp::Dilate,
            Self::Open => MorphOp::Open,
            Self::Close => MorphOp::Close,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct MorphologyArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, value_enum, value_delimiter = ',', default_value = "open,close")]
    ops: Vec<MorphOpArg>,
    #[arg(long, default_value_t = 3)]
    size: usize,
}

#[derive(Args, Debug, Clone)]
struct PupilArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Full pupil configuration as JSON; missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Start from the eye-image preset instead of the default configuration.
    #[arg(long, conflicts_with = "config")]
    eye_preset: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EyeArg {
    Left,
    Right,
}

impl EyeArg {
    fn to_core(self) -> Eye {
        match self {
            Self::Left => Eye::Left,
            Self::Right => Eye::Right,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct IrisCodeArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Pipeline configuration as JSON; missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Library file to append the code to; created when missing.
    #[arg(long, requires = "name")]
    library: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    person_id: Option<u32>,
    #[arg(long, value_enum)]
    eye: Option<EyeArg>,
    #[arg(long)]
    image_id: Option<u32>,
}

#[derive(Args, Debug, Clone)]
struct CompareArgs {
    /// First code, as written by `iris_code` (`code.json`).
    #[arg(long, required = true)]
    first: PathBuf,
    #[arg(long, required = true)]
    second: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
    #[arg(long, default_value_t = 0.2)]
    threshold: f32,
    #[arg(long, default_value_t = 8)]
    max_shift: usize,
    /// Also rank the first code against every record of this library.
    #[arg(long)]
    library: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    HitAndMiss,
    Kmm,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolarityArg {
    DarkOnLight,
    LightOnDark,
}

#[derive(Args, Debug, Clone)]
struct SkeletonArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, value_enum, default_value_t = AlgorithmArg::HitAndMiss)]
    algorithm: AlgorithmArg,
    #[arg(long, default_value_t = 10)]
    iterations: usize,
    #[arg(long, value_enum, default_value_t = PolarityArg::DarkOnLight)]
    polarity: PolarityArg,
}

#[derive(Debug, Clone, Serialize)]
struct MetaAdjust {
    adjustments: PointAdjustments,
    identity: bool,
}

#[derive(Debug, Clone, Serialize)]
struct MetaFilter {
    kernel: &'static str,
    mode: &'static str,
    kernel_weights: Vec<f32>,
    kernel_dims: [usize; 2],
}

#[derive(Debug, Clone, Serialize)]
struct MetaCanny {
    config: CannyConfig,
    edge_pixels: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaMorphology {
    ops: Vec<&'static str>,
    structuring_element: &'static str,
    se_size: usize,
    distance_rule: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct MetaIris {
    pupil: bl_iris::PupilInfo,
    iris_radius: f32,
    pupil_jump_radius: usize,
    iris_jump_radius: usize,
    iris_jump_index: usize,
    code_dims: [usize; 2],
    code_ones: usize,
    library_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct RankDto {
    id: String,
    name: String,
    distance: f32,
    shift: i32,
    is_match: bool,
}

#[derive(Debug, Clone, Serialize)]
struct MetaCompare {
    report: bl_iris::ComparisonReport,
    mismatched_bits: usize,
    total_bits: usize,
    library_best: Option<RankDto>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaSkeleton {
    config: SkeletonConfig,
    ridge_pixels_before: usize,
    ridge_pixels_after: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Adjust(args) => run_adjust(args),
        Command::Filter(args) => run_filter(args),
        Command::Canny(args) => run_canny(args),
        Command::Morphology(args) => run_morphology(args),
        Command::Pupil(args) => run_pupil(args),
        Command::IrisCode(args) => run_iris_code(args),
        Command::Compare(args) => run_compare(args),
        Command::Skeleton(args) => run_skeleton(args),
    }
}

fn run_adjust(args: AdjustArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "adjust")?;
    let img = load_input(&args.common.input)?;

    let adjustments = PointAdjustments {
        grayscale: args.grayscale,
        brightness: args.brightness,
        contrast: args.contrast,
        negative: args.negative,
        threshold: args.threshold,
    };
    let adjusted = adjustments.apply(&img);

    save_rgba(case_dir.join("adjusted.png"), &adjusted)?;
    save_luma(
        case_dir.join("normalized.png"),
        &contrast_stretch(&normalize(&img)),
    )?;
    write_json(case_dir.join("histogram.json"), &histogram_rgb(&adjusted))?;
    write_json(
        case_dir.join("meta.json"),
        &MetaAdjust {
            identity: adjustments.is_identity(),
            adjustments,
        },
    )?;

    Ok(())
}

fn run_filter(args: FilterArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "filter")?;
    let img = load_input(&args.common.input)?;

    let (name, mode, kernel, out) = match args.kernel {
        KernelArg::Sobel => {
            let out = directional_filter(&img, &Kernel::sobel_x(), &Kernel::sobel_y())
                .context("sobel filter")?;
            ("sobel", "directional", Kernel::sobel_x(), out)
        }
        KernelArg::Roberts => {
            let out = directional_filter(&img, &Kernel::roberts_x(), &Kernel::roberts_y())
                .context("roberts filter")?;
            ("roberts", "directional", Kernel::roberts_x(), out)
        }
        preset => {
            let (name, kernel) = match preset {
                KernelArg::Average => ("average", Kernel::average()),
                KernelArg::Sharpen => ("sharpen", Kernel::sharpen()),
                _ => ("gaussian", Kernel::gaussian()),
            };
            let out = convolve(&img, &kernel, args.mode.to_core())
                .with_context(|| format!("convolving with the {name} kernel"))?;
            (name, args.mode.name(), kernel, out)
        }
    };

    save_rgba(case_dir.join("filtered.png"), &out)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaFilter {
            kernel: name,
            mode,
            kernel_dims: [kernel.width(), kernel.height()],
            kernel_weights: kernel.weights().to_vec(),
        },
    )?;

    Ok(())
}

fn run_canny(args: CannyArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "canny")?;
    let img = load_input(&args.common.input)?;

    let cfg = CannyConfig {
        blur: if args.no_blur {
            None
        } else {
            Some(Kernel::gaussian())
        },
        low_threshold: args.low,
        high_threshold: args.high,
    };
    let mut detector = CannyDetector::new();
    let edges = detector.detect(&img, &cfg).context("canny detection")?;
    let edge_pixels = edges.data().iter().filter(|&&v| v != 0).count();
    info!("canny: {edge_pixels} edge pixels");

    save_luma(case_dir.join("edges.png"), &edges)?;
    save_luma(
        case_dir.join("magnitude.png"),
        &contrast_stretch(detector.magnitude()),
    )?;
    write_json(
        case_dir.join("meta.json"),
        &MetaCanny {
            config: cfg,
            edge_pixels,
        },
    )?;

    Ok(())
}

fn run_morphology(args: MorphologyArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "morphology")?;
    let img = load_input(&args.common.input)?;

    let ops: Vec<MorphOp> = args.ops.iter().map(|op| op.to_core()).collect();
    let kernel = Kernel::square(args.size)
        .with_context(|| format!("building a {0}x{0} square mask", args.size))?;
    let morphed = apply_sequence(&ops, &img, &kernel).context("applying morphology")?;

    save_rgba(case_dir.join("morphed.png"), &morphed)?;
    save_rgba(case_dir.join("distance.png"), &distance_transform(&img))?;
    write_json(
        case_dir.join("meta.json"),
        &MetaMorphology {
            ops: ops.iter().map(|op| op.name()).collect(),
            structuring_element: "square",
            se_size: args.size,
            distance_rule: "chessboard distance to the nearest pixel with a channel > 128",
        },
    )?;

    Ok(())
}

fn run_pupil(args: PupilArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "pupil")?;
    let img = load_input(&args.common.input)?;

    let cfg: PupilConfig = match &args.config {
        Some(path) => {
            ensure_file_exists(path, "pupil config")?;
            read_json(path)?
        }
        None if args.eye_preset => PupilConfig::eye_preset(),
        None => PupilConfig::default(),
    };

    let mask = get_pupil(&img, &cfg).context("building the pupil mask")?;
    save_rgba(case_dir.join("mask.png"), &mask)?;

    let pupil = localize_pupil(&img, &cfg).context("localizing the pupil")?;
    info!(
        "pupil at ({:.1}, {:.1}) r={:.1}",
        pupil.center_x, pupil.center_y, pupil.radius
    );

    let overlay = draw_circle(&img, pupil.center(), pupil.radius, OVERLAY);
    let overlay = draw_crosshair(&overlay, pupil.center(), 5, OVERLAY);
    save_rgba(case_dir.join("overlay.png"), &overlay)?;
    write_json(case_dir.join("pupil.json"), &pupil)?;
    write_json(case_dir.join("config.json"), &cfg)?;

    Ok(())
}

fn run_iris_code(args: IrisCodeArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "iris_code")?;
    let img = load_input(&args.common.input)?;

    let pipeline: IrisPipeline = match &args.config {
        Some(path) => {
            ensure_file_exists(path, "pipeline config")?;
            read_json(path)?
        }
        None => IrisPipeline::default(),
    };

    let analysis = pipeline.analyze(&img).context("analyzing the eye image")?;
    let geometry = analysis.boundary.geometry;
    let code = &analysis.encoding.code;

    let overlay = draw_circle(&img, geometry.center(), geometry.pupil_radius(), OVERLAY);
    let overlay = draw_circle(&overlay, geometry.center(), geometry.iris_radius(), OVERLAY);
    save_rgba(case_dir.join("overlay.png"), &overlay)?;
    save_rgba(
        case_dir.join("normalized.png"),
        &analysis.encoding.unwrap.normalized,
    )?;
    save_rgba(
        case_dir.join("unwrap.png"),
        &analysis.encoding.unwrap.visualization,
    )?;
    save_rgba(case_dir.join("code.png"), &code.render(CODE_SCALE))?;
    write_json(case_dir.join("code.json"), code)?;

    let deltas: Vec<f32> = analysis.boundary.profile.iter().map(|s| s.delta).collect();
    write_csv(case_dir.join("radial_delta.csv"), &deltas)?;

    let library_id = match (&args.library, &args.name) {
        (Some(path), Some(name)) => {
            let mut library = if path.exists() {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading library {}", path.display()))?;
                CodeLibrary::from_json(&json)
                    .with_context(|| format!("parsing library {}", path.display()))?
            } else {
                CodeLibrary::new()
            };
            let tags = RecordTags {
                person_id: args.person_id,
                eye: args.eye.map(EyeArg::to_core),
                image_id: args.image_id,
            };
            let id = library
                .save(name, code.clone(), tags, unix_millis()?)
                .context("saving the code")?
                .id
                .clone();
            let json = library.to_json().context("serializing library")?;
            fs::write(path, json)
                .with_context(|| format!("writing library {}", path.display()))?;
            info!("saved code '{name}' as {id} ({} records)", library.len());
            Some(id)
        }
        _ => None,
    };

    write_json(
        case_dir.join("meta.json"),
        &MetaIris {
            pupil: analysis.pupil,
            iris_radius: geometry.iris_radius(),
            pupil_jump_radius: analysis.boundary.pupil_jump.radius,
            iris_jump_radius: analysis.boundary.iris_jump.radius,
            iris_jump_index: analysis.boundary.iris_jump_index,
            code_dims: [code.rows(), code.cols()],
            code_ones: code.count_ones(),
            library_id,
        },
    )?;

    Ok(())
}

fn run_compare(args: CompareArgs) -> Result<()> {
    ensure_file_exists(&args.first, "first code")?;
    ensure_file_exists(&args.second, "second code")?;
    let case_dir = case_dir(&args.out, "compare")?;

    let first: IrisCode = read_json(&args.first)?;
    let second: IrisCode = read_json(&args.second)?;
    let cfg = ComparatorConfig {
        threshold: args.threshold,
        max_shift: args.max_shift,
    };

    let report = compare(&first, &second, &cfg).context("comparing codes")?;
    info!(
        "distance {:.4} at shift {} ({})",
        report.distance,
        report.shift,
        if report.is_match { "match" } else { "no match" }
    );
    save_rgba(case_dir.join("diff.png"), &report.diff.render(CODE_SCALE))?;

    let library_best = match &args.library {
        Some(path) => {
            ensure_file_exists(path, "library")?;
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading library {}", path.display()))?;
            let library = CodeLibrary::from_json(&json)
                .with_context(|| format!("parsing library {}", path.display()))?;
            library
                .best_match(&first, &cfg)
                .context("ranking library")?
                .map(|(record, r)| RankDto {
                    id: record.id.clone(),
                    name: record.name.clone(),
                    distance: r.distance,
                    shift: r.shift,
                    is_match: r.is_match,
                })
        }
        None => None,
    };

    write_json(
        case_dir.join("meta.json"),
        &MetaCompare {
            mismatched_bits: report.diff.mismatch_count(),
            total_bits: first.len(),
            report,
            library_best,
        },
    )?;

    Ok(())
}

fn run_skeleton(args: SkeletonArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "skeleton")?;
    let img = load_input(&args.common.input)?;

    let cfg = SkeletonConfig {
        algorithm: match args.algorithm {
            AlgorithmArg::HitAndMiss => ThinningAlgorithm::HitAndMiss,
            AlgorithmArg::Kmm => ThinningAlgorithm::Kmm,
        },
        iterations: args.iterations,
        polarity: match args.polarity {
            PolarityArg::DarkOnLight => Polarity::DarkOnLight,
            PolarityArg::LightOnDark => Polarity::LightOnDark,
        },
    };

    let before = bl_skeleton::ridge_mask(&img, cfg.polarity);
    let out = skeletonize(&img, &cfg).context("skeletonizing")?;
    let after = bl_skeleton::ridge_mask(&out, cfg.polarity);

    save_rgba(case_dir.join("skeleton.png"), &out)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaSkeleton {
            config: cfg,
            ridge_pixels_before: count_foreground(&before),
            ridge_pixels_after: count_foreground(&after),
        },
    )?;

    Ok(())
}

fn count_foreground(mask: &Image<u8>) -> usize {
    mask.data()
        .iter()
        .filter(|&&v| v == bl_morph::FOREGROUND)
        .count()
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;
    let case_dir = case_dir(&common.out, case_name)?;

    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;

    Ok(case_dir)
}

fn case_dir(out: &Path, case_name: &str) -> Result<PathBuf> {
    let case_dir = out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;
    Ok(case_dir)
}

fn load_input(path: &Path) -> Result<PixelBuffer> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let rgba = dyn_img.to_rgba8();
    let (w, h) = rgba.dimensions();

    PixelBuffer::from_rgba_bytes(w as usize, h as usize, rgba.as_raw())
        .with_context(|| format!("constructing pixel buffer from {}", path.display()))
}

fn save_rgba(path: PathBuf, buf: &PixelBuffer) -> Result<()> {
    let rgba = RgbaImage::from_raw(buf.width() as u32, buf.height() as u32, buf.to_rgba_bytes())
        .context("constructing RgbaImage from raw bytes")?;
    rgba.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn save_luma(path: PathBuf, img: &Image<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec())
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn write_csv(path: PathBuf, values: &[f32]) -> Result<()> {
    let mut file =
        fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "index,value").context("writing csv header")?;
    for (i, v) in values.iter().enumerate() {
        writeln!(file, "{i},{v}").context("writing csv row")?;
    }
    Ok(())
}

fn unix_millis() -> Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?;
    Ok(elapsed.as_millis() as u64)
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
