//! Report rendering and output.
//!
//! A [`DocumentRenderer`] turns a [`Report`] into bytes; [`write_document`]
//! puts them on disk atomically. Everything non-deterministic (the timestamp,
//! the failed-link list) lives in [`RenderContext`], so rendering the same
//! report with the same context is byte-identical.

mod json;
mod markdown;
mod outlet;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use newsbrief_shared::{FailedFetch, NewsBriefError, Report, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

pub use json::JsonRenderer;
pub use markdown::MarkdownRenderer;
pub use outlet::outlet_name;

// ---------------------------------------------------------------------------
// Renderer contract
// ---------------------------------------------------------------------------

/// Inputs to rendering that are not part of the report itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub generated_at: DateTime<Utc>,
    /// Candidates that produced no text, listed at the end when non-empty.
    pub failed: Vec<FailedFetch>,
}

impl RenderContext {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            failed: Vec::new(),
        }
    }

    pub fn with_failed(mut self, failed: Vec<FailedFetch>) -> Self {
        self.failed = failed;
        self
    }
}

/// Serializes a report into a document format.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, report: &Report, ctx: &RenderContext) -> Result<Vec<u8>>;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Metadata about a document written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDocument {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Write `bytes` to `path` atomically (temp file, then rename).
#[instrument(skip_all, fields(path = %path.display(), size = bytes.len()))]
pub fn write_document(path: &Path, bytes: &[u8]) -> Result<WrittenDocument> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| NewsBriefError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| NewsBriefError::validation(format!("not a file path: {}", path.display())))?
        .to_string_lossy();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| NewsBriefError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| NewsBriefError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let sha256 = format!("{:x}", hasher.finalize());

    debug!(%sha256, "document written");
    info!(path = %path.display(), "report saved");

    Ok(WrittenDocument {
        path: path.to_path_buf(),
        sha256,
        size_bytes: bytes.len(),
    })
}

/// Default output file name for a report: `newsbrief-YYYYMMDD-HHMMSS.<ext>`.
pub fn default_file_name(ctx: &RenderContext, renderer: &dyn DocumentRenderer) -> String {
    format!(
        "newsbrief-{}.{}",
        ctx.generated_at.format("%Y%m%d-%H%M%S"),
        renderer.extension()
    )
}
