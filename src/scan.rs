//! Directory scan: collect source files, parse them in parallel, and
//! index the results into a [`SymbolTable`].

use crate::model::LuaFile;
use crate::parser;
use crate::symbols::SymbolTable;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What to pick up while walking directories.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Source file extension, without the dot
    pub extension: String,
    /// Paths matching any of these are skipped
    pub exclude: Vec<glob::Pattern>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            extension: "lua".to_string(),
            exclude: Vec::new(),
        }
    }
}

impl ScanOptions {
    /// Compile exclude patterns given on the command line.
    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self> {
        for pattern in patterns {
            let compiled = glob::Pattern::new(pattern)
                .with_context(|| format!("invalid exclude pattern: {}", pattern))?;
            self.exclude.push(compiled);
        }
        Ok(self)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(path))
    }
}

/// Read and parse a single source file. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD.
pub fn parse_file(path: &Path) -> Result<LuaFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    if matches!(content, Cow::Owned(_)) {
        warn!(path = %path.display(), "file is not valid UTF-8, decoding lossily");
    }
    Ok(parser::parse_source(&content))
}

/// Parse every source file under `paths` and build the symbol table.
///
/// Files are parsed independently on the rayon pool; the table is filled
/// afterwards in path order so the result does not depend on scheduling.
pub fn scan_paths(paths: &[PathBuf], options: &ScanOptions) -> Result<SymbolTable> {
    let files = collect_files(paths, options)?;

    let parsed: Vec<(String, LuaFile)> = files
        .par_iter()
        .map(|path| -> Result<(String, LuaFile)> {
            Ok((path.to_string_lossy().to_string(), parse_file(path)?))
        })
        .collect::<Result<_>>()?;

    let mut symbols = SymbolTable::new();
    for (path, file) in parsed {
        debug!(
            path = %path,
            functions = file.functions.len(),
            classes = file.classes.len(),
            aliases = file.aliases.len(),
            "parsed file"
        );
        for err in &file.errors {
            warn!(path = %path, line = err.line, "{}", err.message);
        }
        symbols.add_file(path, file);
    }
    Ok(symbols)
}

/// Expand the given paths into a sorted list of source files.
///
/// Files are taken as given, directories are walked recursively for the
/// configured extension, and anything else is treated as a glob pattern.
pub fn collect_files(paths: &[PathBuf], options: &ScanOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        let pattern = if path.is_dir() {
            let root = glob::Pattern::escape(&path.to_string_lossy());
            format!("{}/**/*.{}", root.trim_end_matches('/'), options.extension)
        } else {
            path.to_string_lossy().to_string()
        };
        let matches: Vec<_> = glob::glob(&pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file() && !options.is_excluded(p))
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    // Sort for deterministic output
    files.sort();
    files.dedup();
    Ok(files)
}
