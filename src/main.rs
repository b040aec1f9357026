use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use zeroshot_annotate::detection::{DetectionOracle, OracleConfig, ReplayOracle};
use zeroshot_annotate::pipeline::DEFAULT_IOU_THRESHOLD;
use zeroshot_annotate::report::DEFAULT_REPORT_NAME;
use zeroshot_annotate::{AnnotateError, Annotator, Pipeline, RunConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OracleKind {
    /// Read text in the image and match it against the labels
    #[cfg(feature = "ocr")]
    Ocr,
    /// Replay recorded detections from --detections
    Replay,
}

#[derive(Parser, Debug)]
#[command(name = "zeroshot-annotate")]
#[command(about = "Annotate a folder of images with zero-shot detections")]
struct Cli {
    /// Folder with .jpg/.jpeg/.png images
    #[arg(value_name = "INPUT_DIR", default_value = "imgs")]
    input_folder: PathBuf,

    /// Object queries, in order (repeat or comma-separate)
    #[arg(short, long = "labels", value_name = "LABEL", value_delimiter = ',', required = true)]
    labels: Vec<String>,

    /// Folder for annotated images and the report (created if missing)
    #[arg(short, long = "output", value_name = "DIR", default_value = "annotated")]
    output_folder: PathBuf,

    /// Overlap at which the weaker of two detections is dropped
    #[arg(long, value_name = "IOU", default_value_t = DEFAULT_IOU_THRESHOLD)]
    iou_threshold: f32,

    /// Detector backend [default: ocr, or replay when built without OCR]
    #[arg(long, value_enum)]
    oracle: Option<OracleKind>,

    /// Recorded detections (JSON) for the replay backend
    #[arg(long, value_name = "FILE")]
    detections: Option<PathBuf>,

    /// Directory with the OCR models [default: ~/.cache/ocrs]
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Raw detections scoring below this are discarded by the detector
    #[arg(long, value_name = "SCORE", default_value_t = 0.1)]
    min_score: f32,

    /// TrueType/OpenType font for box labels [default: first system font found]
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// File name of the JSON report inside the output folder
    #[arg(long, value_name = "NAME", default_value = DEFAULT_REPORT_NAME)]
    report_name: String,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

impl Cli {
    fn oracle_kind(&self) -> OracleKind {
        #[cfg(feature = "ocr")]
        let default = OracleKind::Ocr;
        #[cfg(not(feature = "ocr"))]
        let default = OracleKind::Replay;

        self.oracle.unwrap_or(default)
    }
}

fn build_oracle(args: &Cli, config: &OracleConfig) -> anyhow::Result<Box<dyn DetectionOracle>> {
    match args.oracle_kind() {
        #[cfg(feature = "ocr")]
        OracleKind::Ocr => Ok(Box::new(zeroshot_annotate::TextQueryOracle::new(config)?)),
        OracleKind::Replay => {
            let path = args.detections.as_ref().ok_or(AnnotateError::MissingDetections)?;
            Ok(Box::new(ReplayOracle::from_file(path, config)?))
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level(args.verbose)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = RunConfig::new(args.input_folder.clone(), args.labels.clone(), args.output_folder.clone())
        .with_iou_threshold(args.iou_threshold)
        .with_report_name(&args.report_name);
    config.validate()?;

    // Resolved once here; nothing below reads the environment
    let oracle_config = OracleConfig::new(args.model_dir.clone().unwrap_or_else(OracleConfig::default_model_dir))
        .with_min_score(args.min_score);
    let oracle = build_oracle(&args, &oracle_config)?;

    let annotator = match &args.font {
        Some(path) => Annotator::with_font_file(path)?,
        None => Annotator::with_system_font(),
    };

    let mut pipeline = Pipeline::new(config, oracle)?.with_annotator(annotator);
    let summary = pipeline.run()?;

    if !summary.rejected.is_empty() {
        anyhow::bail!(
            "{} image(s) rejected: {}",
            summary.rejected.len(),
            summary
                .rejected
                .iter()
                .map(|r| format!("{} ({})", r.path.display(), r.reason))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(())
}
