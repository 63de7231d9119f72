//! Shared helpers: constants, string truncation, output paths.

pub mod constants;
pub mod string_utils;

pub use constants::*;
pub use string_utils::safe_truncate_chars;

use std::path::{Path, PathBuf};

/// Compute the output path for a record's PDF.
///
/// The title has every `/` removed so it cannot escape the output
/// directory; the identifier keeps the name unique.
#[must_use]
pub fn pdf_path(dir: &Path, title: &str, id: &str) -> PathBuf {
    dir.join(format!("{}_{}.pdf", title.replace('/', ""), id))
}
