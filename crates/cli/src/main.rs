use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde_json::json;

use spinepose_core::detection::domain::person_detector::PersonDetector;
use spinepose_core::detection::infrastructure::onnx_person_detector::OnnxPersonDetector;
use spinepose_core::imaging::domain::image_reader::ImageReader;
use spinepose_core::imaging::domain::image_writer::ImageWriter;
use spinepose_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use spinepose_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use spinepose_core::narrative::domain::narrative_generator::{
    narrative_or_fallback, NarrativeContext, NarrativeGenerator,
};
use spinepose_core::narrative::infrastructure::gemini_narrator::GeminiNarrator;
use spinepose_core::narrative::infrastructure::unavailable_narrator::UnavailableNarrator;
use spinepose_core::pipeline::analysis_config::AnalysisConfig;
use spinepose_core::pipeline::analyze_frame_use_case::AnalyzeFrameUseCase;
use spinepose_core::pipeline::frame_result::FrameResult;
use spinepose_core::pipeline::infrastructure::pipeline_worker::PipelineWorker;
use spinepose_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use spinepose_core::pose::domain::landmark_estimator::LandmarkEstimator;
use spinepose_core::pose::infrastructure::onnx_pose_landmarker::OnnxPoseLandmarker;
use spinepose_core::records::domain::record_store::RecordStore;
use spinepose_core::records::infrastructure::jsonl_record_store::JsonlRecordStore;
use spinepose_core::rendering::domain::overlay_renderer::OverlayRenderer;
use spinepose_core::rendering::infrastructure::skeleton_renderer::SkeletonRenderer;
use spinepose_core::shared::constants::{
    GEMINI_API_KEY_ENV, IMAGE_EXTENSIONS, PERSON_MODEL_NAME, POSE_MODEL_NAME,
};
use spinepose_core::shared::frame::Frame;
use spinepose_core::shared::model_resolver::{self, ModelSource};

/// Posture and spine-health analysis for still images.
#[derive(Parser)]
#[command(name = "spinepose")]
struct Cli {
    /// Input image files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write an annotated copy of the input here (single input only).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Feedback context for narratives and stored records: medical or sports.
    #[arg(long, default_value = "medical")]
    mode: String,

    /// Person detection confidence threshold (0.0-1.0). Overrides the config file.
    #[arg(long)]
    confidence: Option<f64>,

    /// Pixels added around each person box before pose estimation. Overrides the config file.
    #[arg(long)]
    margin: Option<u32>,

    /// JSON file with analysis parameters (scoring thresholds, weights, margins).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Person detection ONNX model path.
    #[arg(long)]
    person_model: Option<PathBuf>,

    /// Pose landmark ONNX model path.
    #[arg(long)]
    pose_model: Option<PathBuf>,

    /// Download URL for the person model when it is not cached.
    #[arg(long)]
    person_model_url: Option<String>,

    /// Download URL for the pose model when it is not cached.
    #[arg(long)]
    pose_model_url: Option<String>,

    /// Directory searched for bundled model files.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Write every view (main, sagittal, coronal, heatmap) of each input
    /// into this directory as `<name>_<view>.jpg`.
    #[arg(long)]
    views: Option<PathBuf>,

    /// Record store directory; every analyzed image is saved there.
    #[arg(long)]
    store: Option<PathBuf>,

    /// File the inputs as reference images for this condition (needs
    /// --store); no analysis is run.
    #[arg(long)]
    reference: Option<String>,

    /// Description attached to reference images.
    #[arg(long, default_value = "")]
    description: String,

    /// Activity label attached to stored records.
    #[arg(long, default_value = "unknown")]
    activity: String,

    /// Print an AI narrative per person (needs GEMINI_API_KEY).
    #[arg(long)]
    narrative: bool,

    /// Print results as JSON lines instead of a text summary.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let context = validate(&cli)?;
    if let Some(condition) = &cli.reference {
        return ingest_references(&cli, condition, context);
    }
    let config = load_config(&cli)?;

    let detector = build_detector(&cli, &config)?;
    let estimator = build_estimator(&cli, &config)?;
    let use_case = AnalyzeFrameUseCase::new(
        detector,
        estimator,
        config.analyzer(),
        config.crop_margin,
        Box::new(StdoutPipelineLogger::new()),
    );
    let worker = PipelineWorker::spawn(use_case);

    let reader = ImageFileReader::new();
    let mut store = match &cli.store {
        Some(dir) => Some(JsonlRecordStore::open(dir)?),
        None => None,
    };
    let narrator = cli.narrative.then(build_narrator);

    let mut failures = 0;
    for (index, input) in cli.inputs.iter().enumerate() {
        let frame = match reader.read(input, index) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Skipping {}: {e}", input.display());
                failures += 1;
                continue;
            }
        };
        let result = match worker.submit(frame.clone()) {
            Ok(result) => result,
            Err(e) => {
                log::error!("Analysis failed for {}: {e}", input.display());
                failures += 1;
                continue;
            }
        };

        let narratives: Vec<String> = match &narrator {
            Some(gen) => result
                .persons
                .iter()
                .map(|p| {
                    let metrics = p.metrics.clone().unwrap_or_default();
                    narrative_or_fallback(gen.as_ref(), &metrics, context)
                })
                .collect(),
            None => Vec::new(),
        };

        if cli.json {
            let line = json!({ "input": input, "result": result, "narratives": narratives });
            println!("{line}");
        } else {
            print_summary(input, &result, &narratives);
        }

        if let Some(output) = &cli.output {
            let annotated = SkeletonRenderer::default().render(&frame, &result);
            ImageFileWriter::new().write(output, &annotated, None)?;
            log::info!("Annotated image written to {}", output.display());
        }

        if let Some(dir) = &cli.views {
            write_views(dir, input, &frame, &result)?;
        }

        if let Some(store) = store.as_mut() {
            match store.save(&result, &frame, &cli.activity, context.as_str()) {
                Ok(id) if id.is_empty() => log::info!("Nothing stored for {}", input.display()),
                Ok(_) => {}
                Err(e) => log::warn!("Failed to store record for {}: {e}", input.display()),
            }
        }
    }

    if let Some(use_case) = worker.shutdown() {
        use_case.logger().summary();
    }

    if failures > 0 {
        return Err(format!("{failures} of {} inputs failed", cli.inputs.len()).into());
    }
    Ok(())
}

fn ingest_references(
    cli: &Cli,
    condition: &str,
    context: NarrativeContext,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = cli
        .store
        .as_ref()
        .ok_or("--reference needs --store to know where to file images")?;
    let mut store = JsonlRecordStore::open(dir)?;
    let reader = ImageFileReader::new();

    let mut failures = 0;
    for (index, input) in cli.inputs.iter().enumerate() {
        let saved = reader.read(input, index).and_then(|frame| {
            store
                .save_reference(&frame, condition, &cli.description, context.as_str())
                .map_err(Into::into)
        });
        match saved {
            Ok(id) => println!("{}: reference {id} ({condition})", input.display()),
            Err(e) => {
                log::warn!("Skipping {}: {e}", input.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} inputs failed", cli.inputs.len()).into());
    }
    Ok(())
}

fn write_views(
    dir: &Path,
    input: &Path,
    frame: &Frame,
    result: &FrameResult,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir)?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("frame{}", frame.index()));
    let writer = ImageFileWriter::new();
    for (kind, view) in SkeletonRenderer::default().render_views(frame, result) {
        let path = dir.join(format!("{stem}_{kind}.jpg"));
        writer.write(&path, &view, None)?;
        log::debug!("Wrote {kind} view to {}", path.display());
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(confidence) = cli.confidence {
        config.detector_confidence = confidence;
    }
    if let Some(margin) = cli.margin {
        config.crop_margin = margin;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_model(
    name: &str,
    explicit: &Option<PathBuf>,
    url: &Option<String>,
    bundled: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let source = ModelSource {
        name: name.to_string(),
        explicit_path: explicit.clone(),
        url: url.clone(),
    };
    let label = name.to_string();
    let path = model_resolver::resolve(
        &source,
        bundled,
        Some(Box::new(move |done, total| download_progress(&label, done, total))),
    )?;
    Ok(path)
}

fn build_detector(
    cli: &Cli,
    config: &AnalysisConfig,
) -> Result<Box<dyn PersonDetector>, Box<dyn std::error::Error>> {
    let path = resolve_model(
        PERSON_MODEL_NAME,
        &cli.person_model,
        &cli.person_model_url,
        cli.models_dir.as_deref(),
    )?;
    Ok(Box::new(OnnxPersonDetector::new(
        &path,
        config.detector_confidence,
    )?))
}

fn build_estimator(
    cli: &Cli,
    config: &AnalysisConfig,
) -> Result<Box<dyn LandmarkEstimator>, Box<dyn std::error::Error>> {
    let path = resolve_model(
        POSE_MODEL_NAME,
        &cli.pose_model,
        &cli.pose_model_url,
        cli.models_dir.as_deref(),
    )?;
    Ok(Box::new(OnnxPoseLandmarker::new(
        &path,
        config.presence_threshold,
    )?))
}

fn build_narrator() -> Box<dyn NarrativeGenerator> {
    match GeminiNarrator::from_env() {
        Some(Ok(narrator)) => Box::new(narrator),
        Some(Err(e)) => Box::new(UnavailableNarrator::new(e.to_string())),
        None => Box::new(UnavailableNarrator::new(format!(
            "{GEMINI_API_KEY_ENV} is not set"
        ))),
    }
}

fn print_summary(input: &Path, result: &FrameResult, narratives: &[String]) {
    println!("{}: {} person(s)", input.display(), result.persons.len());
    for (i, person) in result.persons.iter().enumerate() {
        let b = &person.bbox;
        println!(
            "  #{i} box ({}, {}) - ({}, {}) conf {:.2}",
            b.x1, b.y1, b.x2, b.y2, b.confidence
        );
        let Some(m) = &person.metrics else {
            continue;
        };
        println!("     cobb (thoracic): {}", fmt_angle(m.cobb_angle_thoracic));
        println!("     lumbar flexion:  {}", fmt_angle(m.lumbar_flexion));
        println!("     cervical flex.:  {}", fmt_angle(m.cervical_flexion));
        println!("     symmetry index:  {}", fmt_value(m.symmetry_index));
        if let Some(posture) = m.posture_type {
            println!("     posture:         {posture}");
        }
        println!("     health score:    {}", fmt_value(m.health_score));
        if let Some(text) = narratives.get(i) {
            println!("     narrative: {text}");
        }
    }
}

fn fmt_angle(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1} deg"))
}

fn fmt_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

fn validate(cli: &Cli) -> Result<NarrativeContext, Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !is_image(input) {
            return Err(format!("Unsupported input (expected an image): {}", input.display()).into());
        }
    }
    if cli.reference.is_some() && cli.store.is_none() {
        return Err("--reference requires --store".into());
    }
    if cli.output.is_some() && cli.inputs.len() > 1 {
        return Err("--output can only be used with a single input".into());
    }
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(format!("Confidence must be between 0.0 and 1.0, got {confidence}").into());
        }
    }
    if cli.activity.trim().is_empty() {
        return Err("Activity label must not be empty".into());
    }
    let context = cli.mode.parse::<NarrativeContext>()?;
    Ok(context)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
