// ============================================================================
// img-master CLI — headless host for the editing pipeline
// ============================================================================
//
// Usage examples:
//   img-master edit --base photo.jpg --prompt "Make it snowy"
//   img-master edit --mode tryon --base person.jpg --cloth shirt.png -o out.png
//   img-master edit --mode inpainting --base photo.jpg --stroke "10,10 200,40" --prompt "Blue shirt"
//   img-master edit --mode outpainting --base photo.jpg --ratio 9:16
//   img-master outpaint-preview --input photo.jpg --ratio 1:1 --output-dir out/
//   img-master paint-mask --input photo.jpg --stroke "0,0 300,300" -o mask.png
//
// Strokes are polylines in source-image pixel coordinates, replayed through the
// same press / move / release sequence a pointer would produce.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use crate::canvas::{ClientPoint, DisplayBox, MaskPainter, PointerInput, outpaint};
use crate::editor::{AspectRatio, EditMode, EditorSession};
use crate::error::AppError;
use crate::image_handler::{ImageConfig, ImagePayload, MaskImage, SourceImage};
use crate::remote::{GeminiClient, GeminiConfig, Settings};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// img-master headless photo editor.
#[derive(Parser, Debug)]
#[command(
    name = "img-master",
    version,
    about = "Generative photo editing: general edits, try-on, mask inpainting and outpainting",
    long_about = "Compose an image (plus a clothing image or a mask, depending on mode) with a\n\
                  text instruction and send it to the Gemini image model.\n\n\
                  The API key is read from GEMINI_API_KEY or API_KEY, or from the settings file."
)]
pub struct CliArgs {
    /// JSON settings file (api_key, model, endpoint, timeouts, image limits).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send an edit request and save the returned image.
    Edit(EditArgs),
    /// Write the padded canvas and its mask without calling the model.
    OutpaintPreview(OutpaintArgs),
    /// Replay strokes onto a blank mask and write it as PNG.
    PaintMask(PaintMaskArgs),
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// general, tryon, inpainting or outpainting.
    #[arg(short, long, default_value = "general")]
    pub mode: EditMode,

    /// Base image (the person image in try-on mode).
    #[arg(short, long, value_name = "FILE")]
    pub base: PathBuf,

    /// Clothing image for try-on mode.
    #[arg(long, value_name = "FILE")]
    pub cloth: Option<PathBuf>,

    /// Mask image for inpainting (white = region to edit). Must match the base resolution.
    #[arg(long, value_name = "FILE", conflicts_with = "stroke")]
    pub mask: Option<PathBuf>,

    /// Inpainting stroke as "x,y x,y ..." in base-image pixels. Repeatable.
    #[arg(long, value_name = "POINTS")]
    pub stroke: Vec<String>,

    /// Edit instruction (required for general and inpainting).
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// Outpainting target ratio: 16:9, 9:16, 4:3 or 1:1.
    #[arg(short, long, default_value = "16:9")]
    pub ratio: AspectRatio,

    /// Output file. Defaults to a generated name inside --output-dir.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct OutpaintArgs {
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    #[arg(short, long, default_value = "16:9")]
    pub ratio: AspectRatio,

    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct PaintMaskArgs {
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Stroke as "x,y x,y ..." in image pixels. Repeatable.
    #[arg(long, value_name = "POINTS", required = true)]
    pub stroke: Vec<String>,

    #[arg(short, long, value_name = "FILE", default_value = "mask.png")]
    pub output: PathBuf,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run one subcommand to completion.
pub async fn run(args: CliArgs) -> Result<(), AppError> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.image.validate()?;

    match args.command {
        Command::Edit(edit) => run_edit(edit, &settings).await,
        Command::OutpaintPreview(preview) => run_outpaint_preview(preview, &settings.image).await,
        Command::PaintMask(paint) => run_paint_mask(paint, &settings.image),
    }
}

/// Masks and strokes only mean something in inpainting mode.
fn check_mask_inputs(args: &EditArgs) -> Result<(), AppError> {
    if args.mode == EditMode::Inpainting {
        return Ok(());
    }
    if args.mask.is_some() {
        return Err(AppError::Config(format!(
            "--mask is only accepted with --mode inpainting (got {})",
            args.mode
        )));
    }
    if !args.stroke.is_empty() {
        return Err(AppError::Config(format!(
            "--stroke is only accepted with --mode inpainting (got {})",
            args.mode
        )));
    }
    Ok(())
}

async fn run_edit(args: EditArgs, settings: &Settings) -> Result<(), AppError> {
    check_mask_inputs(&args)?;

    let mut session = EditorSession::new(settings.image.clone());
    session.set_mode(args.mode);
    session.set_base_image(SourceImage::from_file(&args.base, session.image_config())?);

    if let Some(path) = &args.cloth {
        let cloth = SourceImage::from_file(path, session.image_config())?;
        session.set_cloth_image(cloth);
    }

    if let Some(path) = &args.mask {
        let mask = MaskImage::from_source(SourceImage::from_file(path, session.image_config())?);
        session.set_mask_image(mask)?;
    } else if !args.stroke.is_empty() {
        let (width, height) = session
            .base_image()
            .map(|image| image.dimensions())
            .unwrap_or_default();
        let display = DisplayBox::new(0.0, 0.0, width as f64, height as f64);
        for stroke in &args.stroke {
            let points = parse_stroke(stroke)?;
            replay_on_session(&mut session, &display, &points)?;
        }
    }

    session.set_prompt(args.prompt);
    session.set_outpaint_ratio(args.ratio);
    session.validate()?;

    let config = GeminiConfig::from_settings(settings, |name| std::env::var(name).ok())?;
    let client = GeminiClient::new(config)?;

    let start = Instant::now();
    session.generate(&client).await?;

    let Some(artifact) = session.download(Utc::now())? else {
        return Err(AppError::Config("no edited image to save".to_string()));
    };
    let path = args
        .output
        .unwrap_or_else(|| args.output_dir.join(&artifact.file_name));
    write_file(&path, &artifact.bytes)?;

    log::info!(
        "💾 已保存编辑结果 - {} ({}KB, 总耗时 {}ms)",
        path.display(),
        artifact.bytes.len() / 1024,
        start.elapsed().as_millis()
    );
    println!("{}", path.display());
    Ok(())
}

async fn run_outpaint_preview(args: OutpaintArgs, config: &ImageConfig) -> Result<(), AppError> {
    let source = SourceImage::from_file(&args.input, config)?;
    let canvas = outpaint::synthesize(&source, args.ratio, config)
        .await
        .map_err(|e| AppError::Preparation(e.to_string()))?;

    let stem = file_stem(&args.input);
    let ratio = args.ratio.as_str().replace(':', "x");
    let padded_path = args.output_dir.join(format!("{}-outpaint-{}.png", stem, ratio));
    let mask_path = args.output_dir.join(format!("{}-outpaint-{}-mask.png", stem, ratio));

    write_payload(&padded_path, &canvas.padded)?;
    write_payload(&mask_path, &canvas.mask)?;

    println!("{}", padded_path.display());
    println!("{}", mask_path.display());
    Ok(())
}

fn run_paint_mask(args: PaintMaskArgs, config: &ImageConfig) -> Result<(), AppError> {
    let source = SourceImage::from_file(&args.input, config)?;
    let (width, height) = source.dimensions();
    let display = DisplayBox::new(0.0, 0.0, width as f64, height as f64);

    let mut painter = MaskPainter::new();
    painter.attach(&source);

    let mut mask = None;
    for stroke in &args.stroke {
        let points = parse_stroke(stroke)?;
        if let Some(exported) = replay_on_painter(&mut painter, &display, &points)? {
            mask = Some(exported);
        }
    }

    let Some(mask) = mask else {
        return Err(AppError::Config("no stroke was replayed".to_string()));
    };
    write_payload(&args.output, mask.payload())?;
    println!("{}", args.output.display());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a polyline `"x,y x,y ..."` (`;` also separates points).
pub fn parse_stroke(text: &str) -> Result<Vec<ClientPoint>, AppError> {
    let invalid = |detail: &str| AppError::Config(format!("invalid stroke '{}': {}", text, detail));

    let points = text
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let (x, y) = token
                .split_once(',')
                .ok_or_else(|| invalid("expected x,y pairs"))?;
            let x: f64 = x.trim().parse().map_err(|_| invalid("x is not a number"))?;
            let y: f64 = y.trim().parse().map_err(|_| invalid("y is not a number"))?;
            Ok(ClientPoint::new(x, y))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    if points.is_empty() {
        return Err(invalid("no points"));
    }
    Ok(points)
}

fn replay_on_session(
    session: &mut EditorSession,
    display: &DisplayBox,
    points: &[ClientPoint],
) -> Result<(), AppError> {
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        session.pointer_down(Some(display), &PointerInput::Mouse(*first));
    }
    for point in iter {
        session.pointer_move(Some(display), &PointerInput::Mouse(*point));
    }
    session.pointer_up()?;
    Ok(())
}

fn replay_on_painter(
    painter: &mut MaskPainter,
    display: &DisplayBox,
    points: &[ClientPoint],
) -> Result<Option<MaskImage>, AppError> {
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        painter.press(Some(display), &PointerInput::Mouse(*first));
    }
    for point in iter {
        painter.move_to(Some(display), &PointerInput::Mouse(*point));
    }
    Ok(painter.release()?)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn write_payload(path: &Path, payload: &ImagePayload) -> Result<(), AppError> {
    write_file(path, payload.bytes())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
