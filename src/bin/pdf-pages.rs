//! PDF Pages CLI tool
//!
//! Runs the page-transformation tools on files.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pdf_pages::layout::Rect;
use pdf_pages::pdf::{CompressionLevel, OverlayEntry, RotateMode, TextEdit, WatermarkSpec};
use pdf_pages::{dispatch, Progress, ProcessingConfig, ToolContext, ToolRequest};

/// PDF Pages - Page-level PDF transformations
#[derive(Parser)]
#[command(name = "pdf-pages")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge numbered PDFs in order
    pdf-pages merge -o handout.pdf \"[0-9]*.pdf\" appendix.pdf

    # Keep pages 1 and 3 to 5
    pdf-pages split input.pdf 1,3-5

    # Stamp a watermark at half opacity
    pdf-pages watermark input.pdf --text DRAFT --opacity 0.5

    # Run a JSON tool request
    pdf-pages run request.json -o out.pdf")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to the tool's suggested filename)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// JSON processing configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reject inputs larger than this many bytes
    #[arg(long, global = true)]
    max_file_size: Option<u64>,

    /// Write compact output using object streams
    #[arg(long, global = true)]
    compact: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge multiple PDF files into one
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Extract pages by range expression, e.g. "1,3-5"
    Split {
        input: PathBuf,
        ranges: String,
    },

    /// Rebuild a document from an explicit page order
    Organize {
        input: PathBuf,

        /// 1-based page numbers, comma separated; repeats are allowed
        #[arg(long, required = true, value_delimiter = ',', allow_negative_numbers = true)]
        order: Vec<i64>,
    },

    /// Rotate every page
    Rotate {
        input: PathBuf,

        /// Multiple of 90
        #[arg(long, allow_negative_numbers = true)]
        degrees: i64,

        #[arg(long, value_enum, default_value_t = RotateMode::Absolute)]
        mode: RotateMode,
    },

    /// Stamp diagonal text across every page
    Watermark {
        input: PathBuf,

        #[arg(long)]
        text: String,

        /// 0.0 to 1.0
        #[arg(long, default_value_t = 0.3)]
        opacity: f32,
    },

    /// Number pages at the bottom right
    PageNumbers {
        input: PathBuf,
    },

    /// Set the same crop box on every page (PDF points, origin bottom left)
    Crop {
        input: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        x: f32,
        #[arg(long, allow_negative_numbers = true)]
        y: f32,
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
    },

    /// Encrypt with a password; only printing stays allowed
    Protect {
        input: PathBuf,
        #[arg(long)]
        password: String,
    },

    /// Remove password encryption
    Unlock {
        input: PathBuf,
        #[arg(long)]
        password: String,
    },

    /// Overlay text; pages beyond the document are skipped
    Edit {
        input: PathBuf,

        /// PAGE:X:Y:TEXT with a 1-based page, repeatable
        #[arg(long = "text", required = true, value_parser = parse_edit)]
        edits: Vec<TextEdit>,
    },

    /// Draw black boxes over areas (the text underneath is not removed)
    Redact {
        input: PathBuf,

        /// PAGE:X:Y:WIDTH:HEIGHT with a 1-based page, repeatable
        #[arg(long = "box", required = true, value_parser = parse_box)]
        boxes: Vec<OverlayEntry>,
    },

    /// Place a JPEG or PNG signature image
    Sign {
        input: PathBuf,

        #[arg(long)]
        signature: PathBuf,

        /// PAGE:X:Y:WIDTH:HEIGHT with a 1-based page, repeatable
        #[arg(long = "box", required = true, value_parser = parse_box)]
        boxes: Vec<OverlayEntry>,
    },

    /// Stamp archival metadata (title, creator, producer); not a PDF/A conversion
    Pdfa {
        input: PathBuf,
        #[arg(long)]
        title: Option<String>,
    },

    /// Compress streams and restructure the object graph
    Compress {
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = CompressionLevel::Medium)]
        level: CompressionLevel,
    },

    /// Build a PDF with one page per JPEG or PNG image
    Images {
        /// Image files (in order). Supports glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Delete pages by range expression
    Remove {
        input: PathBuf,
        pages: String,
    },

    /// Show information about a PDF file as JSON
    Info {
        input: PathBuf,
    },

    /// Execute a JSON tool request
    Run {
        request: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pdf_pages=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdf_pages=info"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ProcessingConfig> {
    let mut config = match &cli.config {
        Some(path) => ProcessingConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ProcessingConfig::default(),
    };
    if let Some(limit) = cli.max_file_size {
        config.max_file_size_bytes = limit;
    }
    if cli.compact {
        config.compact_object_streams = true;
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let prints_to_stdout = matches!(cli.command, Commands::Info { .. }) && cli.output.is_none();
    let request = build_request(cli.command)?;
    let tool = request.name();

    let progress = Progress::new(|percent| debug!(percent, "progress"));
    let mut context = ToolContext::new(config).with_progress(progress);
    let output = dispatch(request, &mut context).with_context(|| format!("{} failed", tool))?;

    if prints_to_stdout {
        println!("{}", String::from_utf8_lossy(&output.bytes));
        return Ok(());
    }

    let path = cli.output.unwrap_or_else(|| PathBuf::from(&output.filename));
    std::fs::write(&path, &output.bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = output.bytes.len(), "wrote output");
    Ok(())
}

/// Translate a subcommand into the request the dispatch table runs
fn build_request(command: Commands) -> anyhow::Result<ToolRequest> {
    let request = match command {
        Commands::Merge { inputs } => ToolRequest::Merge { files: read_all(&expand_globs(inputs)?)? },
        Commands::Split { input, ranges } => ToolRequest::Split { file: read(&input)?, ranges },
        Commands::Organize { input, order } => ToolRequest::Organize { file: read(&input)?, order },
        Commands::Rotate { input, degrees, mode } => ToolRequest::Rotate { file: read(&input)?, degrees, mode },
        Commands::Watermark { input, text, opacity } => ToolRequest::Watermark {
            file: read(&input)?,
            spec: WatermarkSpec { text, opacity },
        },
        Commands::PageNumbers { input } => ToolRequest::PageNumbers { file: read(&input)? },
        Commands::Crop { input, x, y, width, height } => ToolRequest::Crop {
            file: read(&input)?,
            rect: Rect::new(x, y, width, height),
        },
        Commands::Protect { input, password } => ToolRequest::Protect { file: read(&input)?, password },
        Commands::Unlock { input, password } => ToolRequest::Unlock { file: read(&input)?, password },
        Commands::Edit { input, edits } => ToolRequest::Edit { file: read(&input)?, edits },
        Commands::Redact { input, boxes } => ToolRequest::Redact { file: read(&input)?, entries: boxes },
        Commands::Sign { input, signature, boxes } => ToolRequest::Sign {
            file: read(&input)?,
            signature: read(&signature)?,
            placements: boxes,
        },
        Commands::Pdfa { input, title } => ToolRequest::Pdfa { file: read(&input)?, title },
        Commands::Compress { input, level } => ToolRequest::Compress { file: read(&input)?, level },
        Commands::Images { inputs } => ToolRequest::ImagesToPdf { images: read_all(&expand_globs(inputs)?)? },
        Commands::Remove { input, pages } => ToolRequest::RemovePages { file: read(&input)?, pages },
        Commands::Info { input } => ToolRequest::Info { file: read(&input)? },
        Commands::Run { request } => {
            let text = std::fs::read_to_string(&request)
                .with_context(|| format!("reading request {}", request.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing request {}", request.display()))?
        }
    };
    Ok(request)
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn read_all(paths: &[PathBuf]) -> anyhow::Result<Vec<Vec<u8>>> {
    paths.iter().map(|path| read(path)).collect()
}

/// Expand glob patterns in input paths
///
/// Patterns keep their command-line order; matches within one pattern are sorted.
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = glob(&pattern)
                .with_context(|| format!("invalid glob pattern {}", pattern))?
                .collect::<Result<Vec<_>, _>>()?;
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Parse `PAGE:X:Y:TEXT`; the text may itself contain colons
fn parse_edit(value: &str) -> Result<TextEdit, String> {
    let parts: Vec<&str> = value.splitn(4, ':').collect();
    let [page, x, y, text] = parts[..] else {
        return Err(format!("expected PAGE:X:Y:TEXT, got {:?}", value));
    };
    let coordinate = |name: &str, part: &str| {
        part.trim().parse::<f32>().map_err(|e| format!("bad {} {:?}: {}", name, part, e))
    };

    Ok(TextEdit {
        page: page.trim().parse().map_err(|e| format!("bad page {:?}: {}", page, e))?,
        text: text.to_string(),
        x: coordinate("x", x)?,
        y: coordinate("y", y)?,
        font_size: None,
    })
}

/// Parse `PAGE:X:Y:WIDTH:HEIGHT` with a 1-based page
fn parse_box(value: &str) -> Result<OverlayEntry, String> {
    let fields = value
        .split(':')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad box {:?}: {}", value, e))?;
    let [page, x, y, width, height] = fields[..] else {
        return Err(format!("expected PAGE:X:Y:WIDTH:HEIGHT, got {:?}", value));
    };
    if page.fract() != 0.0 || page < 1.0 {
        return Err(format!("page numbers start at 1, got {}", page));
    }
    OverlayEntry::from_page_number(page as usize, x, y, width, height)
        .ok_or_else(|| format!("page numbers start at 1, got {}", page))
}
