//! File scanning: walks the repository and materialises the source records
//! every extractor works from.
//!
//! Respects .gitignore, applies the configured include/exclude globs to paths
//! relative to the root, skips oversized files, and reads in parallel.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{Config, GraphqlConfig};
use crate::error::{Result, Warning};
use crate::parser::{self, ScriptLanguage};
use crate::syntax::Program;

/// How a file participates in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// JavaScript/TypeScript application code.
    Script,
    /// Standalone GraphQL operation document.
    Document,
    /// Service interface definition (`.proto`).
    InterfaceDefinition,
}

impl SourceKind {
    pub fn classify(path: &Path, document_extensions: &[String]) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if document_extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            return Some(SourceKind::Document);
        }
        if path.extension().and_then(|e| e.to_str()) == Some("proto") {
            return Some(SourceKind::InterfaceDefinition);
        }
        ScriptLanguage::from_path(path).map(|_| SourceKind::Script)
    }
}

/// One scanned file. `path` is relative to the analysis root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
    pub kind: SourceKind,
    /// Present only for script files that parsed cleanly.
    pub syntax: Option<Program>,
}

impl SourceFile {
    /// Build a record classified with the default document extensions.
    /// Unknown extensions are treated as scripts.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let kind = SourceKind::classify(&path, &GraphqlConfig::default().document_extensions)
            .unwrap_or(SourceKind::Script);
        Self {
            path,
            content: content.into(),
            kind,
            syntax: None,
        }
    }

    /// Like [`SourceFile::new`], with the syntax tree attached.
    pub fn parsed(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let mut file = Self::new(path, content);
        if file.kind == SourceKind::Script {
            file.syntax = parser::parse_script(&file.path, &file.content);
        }
        file
    }
}

/// Files found by a scan, plus what could not be read.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub files: Vec<SourceFile>,
    pub warnings: Vec<Warning>,
    pub stats: ScanStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub total_files: usize,
    pub scripts: usize,
    pub documents: usize,
    pub interface_definitions: usize,
    pub skipped_oversized: usize,
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} source files (scripts: {}, GraphQL: {}, proto: {}, oversized: {})",
            self.total_files,
            self.scripts,
            self.documents,
            self.interface_definitions,
            self.skipped_oversized
        )
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Scan `config.root_dir` and read every matching file.
pub fn scan(config: &Config) -> Result<ScanOutput> {
    let root = config.root_dir.as_path();
    let include = glob_set(&config.analysis.include_patterns)?;
    let exclude = glob_set(&config.analysis.exclude_patterns)?;
    let document_extensions = &config.analysis.graphql.document_extensions;
    let max_size = config.analysis.max_file_size;

    let mut stats = ScanStats::default();
    let mut candidates: Vec<(PathBuf, PathBuf, SourceKind)> = Vec::new();

    for entry in WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
    {
        let absolute = entry.into_path();
        let relative = absolute
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| absolute.clone());

        if !include.is_match(&relative) || exclude.is_match(&relative) {
            continue;
        }
        let Some(kind) = SourceKind::classify(&relative, document_extensions) else {
            continue;
        };
        let size = fs::metadata(&absolute).map(|m| m.len()).unwrap_or(0);
        if size >= max_size {
            debug!(path = %relative.display(), size, "skipping oversized file");
            stats.skipped_oversized += 1;
            continue;
        }
        candidates.push((absolute, relative, kind));
    }

    let read: Vec<std::result::Result<SourceFile, Warning>> = candidates
        .into_par_iter()
        .map(|(absolute, relative, kind)| match fs::read_to_string(&absolute) {
            Ok(content) => Ok(SourceFile {
                path: relative,
                content,
                kind,
                syntax: None,
            }),
            Err(e) => Err(Warning::new(format!(
                "Failed to read {}: {}",
                relative.display(),
                e
            ))),
        })
        .collect();

    let mut files = Vec::with_capacity(read.len());
    let mut warnings = Vec::new();
    for result in read {
        match result {
            Ok(file) => files.push(file),
            Err(w) => warnings.push(w),
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    for file in &files {
        match file.kind {
            SourceKind::Script => stats.scripts += 1,
            SourceKind::Document => stats.documents += 1,
            SourceKind::InterfaceDefinition => stats.interface_definitions += 1,
        }
    }
    stats.total_files = files.len();
    info!(root = %root.display(), "{}", stats);

    Ok(ScanOutput {
        files,
        warnings,
        stats,
    })
}
