//! Source-archive handling: gzipped-tar extraction and the bibliography
//! scan over the extracted tree.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::{fs, io};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::utils::BIB_EXTENSION;

/// Errors surfaced while materialising a source archive.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The tar stream contained an entry that is neither a regular file
    /// nor a directory.
    #[error("unknown entry type {kind} for {path}")]
    UnknownEntryType { kind: String, path: PathBuf },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Extract the gzipped tar at `infile` into `outdir`.
///
/// Directory entries are created under `outdir`; regular files get
/// their parent directories created and their contents copied, with
/// each output handle closed before the next entry is read. The
/// archive's internal layout is not validated.
pub fn extract_targz(infile: &Path, outdir: &Path) -> Result<(), ExtractError> {
    let tarball = File::open(infile)?;
    let mut archive = Archive::new(GzDecoder::new(tarball));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative = entry.path()?.into_owned();
        let dest = outdir.join(&relative);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&dest)?;
            }
            EntryType::Regular => {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&dest)?;
                io::copy(&mut entry, &mut out)?;
                // `out` drops here, before the next entry is opened.
            }
            other => {
                return Err(ExtractError::UnknownEntryType {
                    kind: format!("{other:?}"),
                    path: dest,
                });
            }
        }
    }
    Ok(())
}

/// Walk `dir` and return the first file whose name carries the
/// bibliography extension, or `None` when the archive ships no
/// bibliography.
#[must_use]
pub fn find_bibliography(dir: &Path) -> Option<PathBuf> {
    let walk = jwalk::WalkDir::new(dir).sort(true).skip_hidden(false).follow_links(false);
    for entry in walk {
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == BIB_EXTENSION) {
            return Some(path);
        }
    }
    None
}
