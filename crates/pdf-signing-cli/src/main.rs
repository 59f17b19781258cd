mod logger;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_signing::coords::{RenderPoint, anchor_from_render, is_within_page};
use pdf_signing::{
    AssemblyInput, SignatureRaster, ViewerKind, assemble, inspect_pdf, interactive_element_count,
};
use pdf_signing_session::{DirectoryStore, DocumentId, SessionConfig, SessionState, SigningSession};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pdfsign", about = "Sign PDF documents", version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show page sizes and interactive elements of a PDF
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Draw a signature image onto a page
    Sign {
        #[arg(short, long)]
        input: PathBuf,

        /// Signature image (PNG with transparency recommended)
        #[arg(short, long)]
        signature: PathBuf,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        /// Left edge of the signature in rendered pixels
        #[arg(long)]
        x: f64,

        /// Top edge of the signature in rendered pixels
        #[arg(long)]
        y: f64,

        /// Render scale the pixel coordinates refer to
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Signature width in PDF units
        #[arg(long, default_value = "150.0")]
        width: f64,

        /// Output PDF file (defaults to signed_<input name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bake annotations and form fields into page content
    Flatten {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Add a PDF to a document store directory
    Add {
        #[arg(long)]
        store: PathBuf,

        #[arg(long)]
        id: String,

        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run a full signing session against a document store directory
    Session {
        #[arg(long)]
        store: PathBuf,

        #[arg(long)]
        id: String,

        #[arg(short, long)]
        signature: PathBuf,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long)]
        x: f64,

        #[arg(long)]
        y: f64,

        #[arg(long)]
        scale: Option<f64>,

        /// Signer name
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        remarks: String,

        #[arg(long, value_enum)]
        viewer: Option<ViewerArg>,

        /// Session configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewerArg {
    Overlay,
    Interactive,
}

impl From<ViewerArg> for ViewerKind {
    fn from(arg: ViewerArg) -> Self {
        match arg {
            ViewerArg::Overlay => Self::Overlay,
            ViewerArg::Interactive => Self::Interactive,
        }
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

fn page_index(page: usize) -> Result<usize> {
    if page == 0 {
        bail!("Page numbers start at 1");
    }
    Ok(page - 1)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::StderrLogger::new(cli.verbose)
        .init()
        .context("Failed to install logger")?;

    match cli.command {
        Commands::Inspect { input } => {
            let bytes = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let pages = inspect_pdf(&bytes)?;
            println!("{}: {} page(s)", input.display(), pages.len());
            for (i, page) in pages.iter().enumerate() {
                println!("  Page {}: {:.2} x {:.2}", i + 1, page.width, page.height);
            }
            println!(
                "  Interactive elements: {}",
                interactive_element_count(&bytes)?
            );
        }

        Commands::Sign {
            input,
            signature,
            page,
            x,
            y,
            scale,
            width,
            output,
        } => {
            if scale <= 0.0 {
                bail!("Scale must be positive");
            }
            let source = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let signature_bytes = tokio::fs::read(&signature)
                .await
                .with_context(|| format!("Failed to read {}", signature.display()))?;

            let pages = inspect_pdf(&source)?;
            let page_index = page_index(page)?;
            let Some(&dimensions) = pages.get(page_index) else {
                bail!("Page {} is out of range (document has {} pages)", page, pages.len());
            };
            let point = RenderPoint::new(x, y);
            if !is_within_page(point, dimensions, scale) {
                bail!("({x}, {y}) is outside page {page} at scale {scale}");
            }

            let raster = SignatureRaster::decode(&signature_bytes)?;
            let anchor = anchor_from_render(
                page_index,
                dimensions,
                point,
                scale,
                raster.native_height(width),
            );

            let input_name = file_name(&input)?;
            let artifact = assemble(
                AssemblyInput::RasterComposite {
                    source: source.into(),
                    signature_png: raster.to_png()?,
                    anchor,
                    signature_width: width,
                },
                &input_name,
            )
            .await?;

            let output = output.unwrap_or_else(|| input.with_file_name(artifact.filename()));
            tokio::fs::write(&output, artifact.bytes()).await?;
            println!("Signed page {} → {}", page, output.display());
        }

        Commands::Flatten { input, output } => {
            let bytes = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let before = interactive_element_count(&bytes)?;
            let artifact = assemble(
                AssemblyInput::AnnotationFlatten { annotated: bytes },
                &file_name(&input)?,
            )
            .await?;
            tokio::fs::write(&output, artifact.bytes()).await?;
            println!(
                "Flattened {} interactive element(s) → {}",
                before,
                output.display()
            );
        }

        Commands::Add { store, id, input } => {
            let bytes = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let store = DirectoryStore::new(store);
            store
                .add_document(&DocumentId::new(id.as_str()), &bytes, &file_name(&input)?)
                .await?;
            println!("Added {} as {}", input.display(), id);
        }

        Commands::Session {
            store,
            id,
            signature,
            page,
            x,
            y,
            scale,
            name,
            remarks,
            viewer,
            config,
        } => {
            let mut config = match config {
                Some(path) => SessionConfig::load(&path)
                    .await
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => SessionConfig::default(),
            };
            if let Some(viewer) = viewer {
                config.viewer = viewer.into();
            }
            let signature_bytes = tokio::fs::read(&signature)
                .await
                .with_context(|| format!("Failed to read {}", signature.display()))?;

            let mut session = SigningSession::new(config, DirectoryStore::new(store))?;
            session.open(DocumentId::new(id.as_str())).await?;

            if session.state() == &SessionState::AlreadySigned {
                match session.signed_at() {
                    Some(at) => println!("Document {} was already signed on {}", id, at),
                    None => println!("Document {} is already signed", id),
                }
                return Ok(());
            }

            session.wait_viewer_ready().await?;
            session.upload_signature(&signature_bytes)?;
            session.go_to_page(page_index(page)?)?;
            if let Some(scale) = scale {
                session.set_scale(scale);
            }
            session.place_signature(RenderPoint::new(x, y))?;
            session.set_signer_name(name)?;
            session.set_remarks(remarks)?;
            session.submit().await?;

            if let Some(artifact) = session.artifact() {
                println!(
                    "Signed document {} ({}, {} bytes)",
                    id,
                    artifact.filename(),
                    artifact.bytes().len()
                );
            }
            session.close();
        }
    }

    Ok(())
}
