use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use optout_core::detection::infrastructure::embedding_face_comparator::EmbeddingFaceComparator;
use optout_core::detection::infrastructure::onnx_person_detector::OnnxPersonDetector;
use optout_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloFaceDetector;
use optout_core::media::infrastructure::image_file_reader::ImageFileReader;
use optout_core::media::infrastructure::image_file_writer::ImageFileWriter;
use optout_core::pipeline::redact_image_use_case::{
    Decision, DecisionFn, ExtraOutputs, Outcome, Presentation, RedactImageUseCase,
};
use optout_core::redaction::infrastructure::redactor_factory::create_redactor;
use optout_core::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL, IMAGE_EXTENSIONS,
    PERSON_MODEL_NAME,
};
use optout_core::shared::model_resolver::{self, ModelSource};
use optout_core::shared::settings::{RedactionMode, Settings};

/// Find one person in a photo by a reference face and redact them.
#[derive(Parser)]
#[command(name = "optout")]
struct Cli {
    /// Photo to redact.
    image: PathBuf,

    /// Photo showing the face of the person to remove.
    reference: PathBuf,

    /// Where the redacted photo is written.
    output: PathBuf,

    /// Redaction operator: blur, pixelate, combined or rectangle.
    #[arg(long)]
    mode: Option<RedactionMode>,

    /// Pixels added around the person before redacting.
    #[arg(long)]
    padding: Option<u32>,

    /// Width of the soft edge, in pixels.
    #[arg(long)]
    fade: Option<u32>,

    /// Gaussian blur kernel size (rounded up to odd).
    #[arg(long)]
    blur_strength: Option<usize>,

    /// Pixelation granularity: blocks across the longer side.
    #[arg(long)]
    granularity: Option<u32>,

    /// Skip candidates whose similarity to the reference is below this.
    #[arg(long)]
    min_similarity: Option<f64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    face_confidence: Option<f64>,

    /// COCO person detection model (ONNX).
    #[arg(long)]
    person_model: Option<PathBuf>,

    /// Also write an RGBA mask of the redacted person.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Also write the smallest allowed square of the photo around the person.
    #[arg(long)]
    square: Option<PathBuf>,

    /// Save candidate thumbnails and an annotated overview here.
    #[arg(long)]
    candidates_dir: Option<PathBuf>,

    /// Redact the best-ranked candidate without asking.
    #[arg(long)]
    yes: bool,

    /// Settings file to use instead of the user's saved settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    validate(&cli)?;
    let settings = load_settings(&cli)?;

    let bundled_dir = bundled_models_dir();
    let bundled = bundled_dir.as_deref();
    let face_model = resolve_model(FACE_MODEL_NAME, Some(FACE_MODEL_URL), None, bundled)?;
    let embedding_model =
        resolve_model(EMBEDDING_MODEL_NAME, Some(EMBEDDING_MODEL_URL), None, bundled)?;
    let person_model =
        resolve_model(PERSON_MODEL_NAME, None, cli.person_model.as_deref(), bundled)?;

    let face_detector = OnnxYoloFaceDetector::new(&face_model, settings.face_confidence)?;
    let object_detector = OnnxPersonDetector::new(&person_model, settings.person_confidence)?;
    let comparator = EmbeddingFaceComparator::new(
        &embedding_model,
        Box::new(OnnxYoloFaceDetector::new(&face_model, settings.face_confidence)?),
        settings.match_threshold,
    )?;

    let decide: DecisionFn = if cli.yes {
        Box::new(confirm_first)
    } else {
        Box::new(ask)
    };

    let mut use_case = RedactImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        Box::new(face_detector),
        Box::new(object_detector),
        Box::new(comparator),
        create_redactor(&settings),
        settings.min_similarity,
        decide,
    );

    let extras = ExtraOutputs {
        mask_path: cli.mask.clone(),
        candidates_dir: cli.candidates_dir.clone(),
        square_path: cli.square.clone(),
        square_sizes: settings.square_sizes.clone(),
    };
    match use_case.execute(&cli.image, &cli.reference, &cli.output, &extras)? {
        Outcome::Redacted(rect) => {
            log::info!("Redacted {rect}");
            eprintln!("Redacted person at {rect}; wrote {}", cli.output.display());
        }
        Outcome::NoMatch => {
            eprintln!(
                "No candidate confirmed; wrote an unmodified copy to {}",
                cli.output.display()
            );
        }
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), String> {
    for (label, path) in [("Image", &cli.image), ("Reference", &cli.reference)] {
        if !path.exists() {
            return Err(format!("{label} not found: {}", path.display()));
        }
        if !is_image(path) {
            return Err(format!("{label} is not a supported image: {}", path.display()));
        }
    }
    for path in [Some(&cli.output), cli.mask.as_ref(), cli.square.as_ref()]
        .into_iter()
        .flatten()
    {
        if !is_image(path) {
            return Err(format!(
                "Output must have an image extension: {}",
                path.display()
            ));
        }
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };

    if let Some(mode) = cli.mode {
        settings.mode = mode;
    }
    if let Some(padding) = cli.padding {
        settings.blur.padding = padding;
        settings.pixelate.padding = padding;
    }
    if let Some(fade) = cli.fade {
        settings.blur.fade_size = fade;
        settings.pixelate.fade_size = fade;
    }
    if let Some(kernel) = cli.blur_strength {
        settings.blur.kernel_size = kernel;
    }
    if let Some(granularity) = cli.granularity {
        settings.pixelate.granularity = granularity;
    }
    if cli.min_similarity.is_some() {
        settings.min_similarity = cli.min_similarity;
    }
    if let Some(confidence) = cli.face_confidence {
        settings.face_confidence = confidence;
    }

    settings.validate()?;
    Ok(settings)
}

fn resolve_model(
    name: &str,
    url: Option<&str>,
    override_path: Option<&Path>,
    bundled: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let source = ModelSource {
        name,
        url,
        override_path,
    };
    let label = name.to_string();
    let path = model_resolver::resolve(
        &source,
        bundled,
        Some(Box::new(move |downloaded, total| {
            download_progress(&label, downloaded, total)
        })),
    )?;
    Ok(path)
}

/// `models/` next to the executable, for packaged installs.
fn bundled_models_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("models"))
}

fn ask(presentation: &Presentation) -> Decision {
    let candidate = presentation.candidate;
    eprintln!(
        "Candidate {}/{}: {} (similarity {:.3})",
        presentation.position, presentation.total, candidate.rect, candidate.score
    );
    if let Some(path) = presentation.thumbnail {
        eprintln!("  preview: {}", path.display());
    }

    let stdin = io::stdin();
    loop {
        eprint!("Redact this person? [y]es / [n]o / [q]uit: ");
        let _ = io::stderr().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return Decision::Stop,
            Ok(_) => {}
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Decision::Confirm,
            "n" | "no" => return Decision::Reject,
            "q" | "quit" => return Decision::Stop,
            _ => continue,
        }
    }
}

fn confirm_first(_: &Presentation) -> Decision {
    Decision::Confirm
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}
