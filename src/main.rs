//! luadoc: check and export the doc annotations of Lua source files.
//!
//! Two modes:
//!
//! - **stdin mode**: `luadoc < init.lua`
//! - **file mode**: `luadoc -f json -o api.json lua/`

use anyhow::{bail, Context, Result};
use clap::Parser;
use luadoc::render;
use luadoc::{parse_source, scan_paths, ScanOptions, SymbolTable};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Path used for the file read from stdin.
const STDIN_PATH: &str = "<stdin>";

#[derive(Parser)]
#[command(
    name = "luadoc",
    version,
    about = "Parse doc annotations in Lua source files"
)]
struct Cli {
    /// Input files, directories or glob patterns. If omitted, reads from stdin.
    paths: Vec<PathBuf>,

    /// Output format: report (default), json
    #[arg(short = 'f', long, default_value = "report")]
    format: String,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Exit with an error when any annotation block fails to parse
    #[arg(long)]
    strict: bool,

    /// Include @private functions in output
    #[arg(long)]
    show_private: bool,

    /// Source file extension picked up when walking directories
    #[arg(long, default_value = "lua")]
    ext: String,

    /// Skip paths matching this glob. Can be specified multiple times.
    #[arg(long)]
    exclude: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    // Fail on a bad format before doing any work
    let renderer = render::create_renderer(&cli.format, cli.show_private)?;

    let symbols = if cli.paths.is_empty() {
        stdin_mode()?
    } else {
        file_mode(&cli)?
    };

    let output = renderer.render(&symbols)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, &output)
                .with_context(|| format!("failed to write {}", path.display()))?;
            debug!(path = %path.display(), "wrote output");
        }
        None => print!("{}", output),
    }

    if cli.strict && symbols.error_count() > 0 {
        bail!("{} annotation block(s) failed to parse", symbols.error_count());
    }
    Ok(())
}

/// stdin mode: parse a single file read from stdin.
fn stdin_mode() -> Result<SymbolTable> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;

    let mut symbols = SymbolTable::new();
    symbols.add_file(STDIN_PATH, parse_source(&input));
    Ok(symbols)
}

/// file mode: walk the given paths and parse every matching file.
fn file_mode(cli: &Cli) -> Result<SymbolTable> {
    let options = ScanOptions {
        extension: cli.ext.trim_start_matches('.').to_string(),
        ..ScanOptions::default()
    }
    .with_excludes(&cli.exclude)?;
    scan_paths(&cli.paths, &options)
}
