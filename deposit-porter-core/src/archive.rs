//! Packs loose export files into a single zip archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{PorterError, PorterResult};

/// Highest deflate level.
const MAX_COMPRESSION: i32 = 9;

/// A local file and the name it is stored under inside the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    pub name: String,
}

impl ArchiveEntry {
    pub fn new(source: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
        }
    }
}

/// Reduces an entry name to its base name so it cannot escape the extraction directory.
pub fn sanitize_entry_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(str::to_string)
}

/// Writes every entry into a deflated archive at `destination`.
///
/// All inputs are opened before the archive is created, so a missing input fails
/// without touching `destination`. A failure after that point removes the partial
/// archive. Input handles and the output stream are released on every path.
pub fn create_archive(entries: &[ArchiveEntry], destination: &Path) -> PorterResult<()> {
    info!(
        archive = %destination.display(),
        entries = entries.len(),
        "Packaging archive"
    );

    let sources = open_sources(entries)?;

    match write_archive(sources, destination) {
        Ok(()) => {
            info!(archive = %destination.display(), "Archive written");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, archive = %destination.display(), "Packaging failed");
            if let Err(rm) = fs::remove_file(destination) {
                if rm.kind() != io::ErrorKind::NotFound {
                    warn!(error = ?rm, archive = %destination.display(), "Could not remove partial archive");
                }
            }
            Err(e)
        }
    }
}

fn open_sources(entries: &[ArchiveEntry]) -> PorterResult<Vec<(String, File)>> {
    let mut sources = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = sanitize_entry_name(&entry.name).ok_or_else(|| {
            PorterError::Packaging(format!("invalid archive entry name {:?}", entry.name))
        })?;
        let file = File::open(&entry.source).map_err(|e| {
            error!(error = ?e, path = %entry.source.display(), "Cannot open archive input");
            PorterError::Packaging(format!("cannot open {}: {e}", entry.source.display()))
        })?;
        sources.push((name, file));
    }
    Ok(sources)
}

fn write_archive(sources: Vec<(String, File)>, destination: &Path) -> PorterResult<()> {
    let out = File::create(destination).map_err(|e| {
        PorterError::Packaging(format!("cannot create {}: {e}", destination.display()))
    })?;
    let mut zip = ZipWriter::new(out);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(MAX_COMPRESSION))
        .unix_permissions(0o644);

    for (name, mut file) in sources {
        zip.start_file(name.as_str(), options)
            .map_err(|e| PorterError::Packaging(format!("cannot add {name}: {e}")))?;
        io::copy(&mut file, &mut zip)
            .map_err(|e| PorterError::Packaging(format!("cannot write {name}: {e}")))?;
    }

    let out = zip
        .finish()
        .map_err(|e| PorterError::Packaging(format!("cannot finalise archive: {e}")))?;
    out.sync_all()
        .map_err(|e| PorterError::Packaging(format!("cannot flush archive: {e}")))?;
    Ok(())
}

/// Deletes files whose content now lives in an archive.
pub fn remove_loose_files(paths: &[&Path]) -> PorterResult<()> {
    for path in paths {
        fs::remove_file(path).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to remove loose file");
            PorterError::file_access(*path, e)
        })?;
        info!(path = %path.display(), "Removed loose file");
    }
    Ok(())
}
