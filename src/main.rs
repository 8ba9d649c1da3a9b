//! Letterhead Crop CLI
//!
//! Non-interactive driver for the crop workflow: renders page 1 of a PDF,
//! applies a selection rectangle at a chosen zoom level, and writes or
//! stores the encoded header image.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use letterhead_crop::encode::PayloadFormat;
use letterhead_crop::geometry::PixelCrop;

/// Crop a letterhead header image out of a PDF's first page
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PDF file path
    #[arg(short, long)]
    input: PathBuf,

    /// Name for the crop (defaults to "<file stem>_letterhead")
    #[arg(short, long)]
    name: Option<String>,

    /// Selection rectangle in displayed-space pixels, as "x,y,width,height"
    /// (defaults to the full-width header band)
    #[arg(short, long)]
    rect: Option<String>,

    /// Display zoom factor the rectangle is expressed at
    #[arg(short, long, default_value = "1.0")]
    zoom: f32,

    /// Write the decoded image to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append the crop to the letterhead store in this directory
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Encode as JPEG at this quality (1-100) instead of PNG
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Target raster width in pixels for page rendering
    #[arg(long, default_value = "1240")]
    render_width: u32,

    /// Rendering timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Maximum accepted document size in bytes
    #[arg(long, default_value = "10485760")]
    max_bytes: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_rect(value: &str) -> anyhow::Result<PixelCrop> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid rectangle '{value}'"))?;
    anyhow::ensure!(
        parts.len() == 4,
        "rectangle must be 'x,y,width,height', got '{value}'"
    );
    Ok(PixelCrop::new(parts[0], parts[1], parts[2], parts[3]))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if args.verbose { "debug" } else { "warn" },
    ))
    .init();

    #[cfg(feature = "pdfium")]
    return run(args).await;

    #[cfg(not(feature = "pdfium"))]
    anyhow::bail!("this binary was built without the `pdfium` feature; no PDF renderer is available");
}

#[cfg(feature = "pdfium")]
async fn run(args: Args) -> anyhow::Result<()> {
    use letterhead_crop::encode::{decode_data_uri, DataUriEncoder};
    use letterhead_crop::raster::PdfiumRenderer;
    use letterhead_crop::store::AssetStore;
    use letterhead_crop::workflow::CropWorkflow;
    use letterhead_crop::CropOptions;

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {:?}", args.input))?;
    anyhow::ensure!(
        bytes.len() as u64 <= args.max_bytes,
        "{:?} is {} bytes, over the {} byte limit",
        args.input,
        bytes.len(),
        args.max_bytes
    );

    let name = args.name.clone().unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        format!("{stem}_letterhead")
    });

    let format = match args.jpeg_quality {
        Some(quality) => PayloadFormat::Jpeg { quality },
        None => PayloadFormat::Png,
    };

    let renderer = PdfiumRenderer::new(
        args.render_width,
        std::time::Duration::from_secs(args.timeout),
    );
    let mut workflow =
        CropWorkflow::new(renderer, DataUriEncoder::new(format), CropOptions::default());

    let id = workflow.start(&bytes).await?;
    if (args.zoom - 1.0).abs() > f32::EPSILON {
        workflow.set_zoom(id, args.zoom)?;
    }
    let display = workflow.display(id)?;

    let rect = match args.rect.as_deref() {
        Some(value) => parse_rect(value)?,
        None => workflow.selection(id)?.to_pixels(&display),
    };
    workflow.complete_selection(id, rect)?;

    let artifact = workflow.commit(id, &name).await?;

    println!("Letterhead Crop");
    println!("===============");
    println!(
        "Cropped '{}' to {}x{} px",
        artifact.name, artifact.width, artifact.height
    );

    if let Some(path) = &args.output {
        std::fs::write(path, decode_data_uri(&artifact.payload)?)
            .with_context(|| format!("failed to write {path:?}"))?;
        println!("Output saved to: {path:?}");
    }

    if let Some(dir) = &args.store {
        let mut store = AssetStore::open(dir)?;
        let record = store.add_cropped(&artifact.name, artifact.payload.clone());
        store.save()?;
        println!("Stored letterhead {} for {}", record.id, store.user_id());
    }

    Ok(())
}
