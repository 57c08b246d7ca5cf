//! screenspec — generate screen specifications from raw screen definitions.
//!
//! Supports two modes:
//!
//! - **stdin mode**: `screenspec < login.md`
//! - **file mode**: `screenspec -o specs/ screens/*.md`

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use screenspec::render::{self, Renderer};
use screenspec::{Config, Pipeline};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "screenspec",
    about = "Generate screen specifications from raw screen definition documents"
)]
struct Cli {
    /// Input files (glob patterns and directories supported). If omitted, reads from stdin.
    files: Vec<String>,

    /// Output directory (required when files are given)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: markdown (default), json
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// TOML configuration file (metadata and recognition patterns)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Screen code for the metadata block
    #[arg(long)]
    screen_code: Option<String>,

    /// Screen name for the metadata block
    #[arg(long)]
    screen_name: Option<String>,

    /// Short description for the metadata block
    #[arg(long)]
    description: Option<String>,

    /// Creation date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    created: Option<NaiveDate>,

    /// Last update date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    updated: Option<NaiveDate>,

    /// Document version string
    #[arg(long)]
    doc_version: Option<String>,

    /// Log pipeline stages to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = resolve_config(&cli)?;
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let renderer = render::create_renderer(&cli.format)?;

    if cli.files.is_empty() {
        return stdin_mode(&pipeline, renderer.as_ref());
    }

    file_mode(&cli, &pipeline, renderer.as_ref())
}

/// Config file first, then flags, then today's date for unset dates.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let m = &mut config.metadata;
    let overrides = [
        (&mut m.screen_code, &cli.screen_code),
        (&mut m.screen_name, &cli.screen_name),
        (&mut m.description, &cli.description),
        (&mut m.version, &cli.doc_version),
    ];
    for (slot, value) in overrides {
        if value.is_some() {
            slot.clone_from(value);
        }
    }
    if cli.created.is_some() {
        m.created = cli.created;
    }
    if cli.updated.is_some() {
        m.updated = cli.updated;
    }
    Ok(config.with_default_dates(chrono::Local::now().date_naive()))
}

/// stdin mode: read one document from stdin, write the rendered specification to stdout.
fn stdin_mode(pipeline: &Pipeline, renderer: &dyn Renderer) -> Result<()> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let doc = pipeline.run(&input)?;
    print!("{}", renderer.render(&doc)?);
    Ok(())
}

/// file mode: transform each input into the output directory. Every file is
/// attempted; the run fails afterwards if any of them failed.
fn file_mode(cli: &Cli, pipeline: &Pipeline, renderer: &dyn Renderer) -> Result<()> {
    let output_dir = cli
        .output
        .as_deref()
        .context("--output is required when files are given")?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let input_files = expand_globs(&cli.files)?;
    let mut failed = 0;
    for path in &input_files {
        if let Err(e) = process_file(path, output_dir, pipeline, renderer) {
            tracing::error!("{}: {:#}", path.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", failed, input_files.len());
    }
    Ok(())
}

fn process_file(path: &Path, output_dir: &Path, pipeline: &Pipeline, renderer: &dyn Renderer) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let doc = pipeline.run(&content)?;

    let name = derive_output_name(&path.to_string_lossy());
    let out_path = output_dir.join(format!("{}.spec.{}", name, renderer.file_extension()));
    fs::write(&out_path, renderer.render(&doc)?)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    tracing::debug!(input = %path.display(), output = %out_path.display(), "wrote specification");
    Ok(())
}

/// File extensions recognized as raw screen definitions.
const SUPPORTED_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Expand glob patterns into a list of real file paths.
/// Also handles bare directory paths by scanning for supported file types.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        // Directories are scanned non-recursively.
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() {
                    if let Some(ext) = p.extension().and_then(|e| e.to_str()) {
                        if SUPPORTED_EXTENSIONS.contains(&ext) {
                            files.push(p);
                        }
                    }
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            tracing::warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}

/// Derive the output file name (without extension) from a source path.
/// "screens/login.md" → "login"
fn derive_output_name(source: &str) -> String {
    let filename = source.rsplit(['/', '\\']).next().unwrap_or(source);
    SUPPORTED_EXTENSIONS
        .iter()
        .find_map(|ext| filename.strip_suffix(&format!(".{ext}")))
        .unwrap_or(filename)
        .to_string()
}
