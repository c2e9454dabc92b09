//! Export pipeline: remote deposit → `<dir>/deposit_<id>.zip`.
//!
//! 1. fetch the populated deposit; failure aborts before anything is written
//! 2. rebuild the local deposit view and write `<dir>/meta.json`
//! 3. download the manuscript (redirect, then direct fetch) to `<dir>/<filename>`,
//!    replacing any file left there by an earlier run
//! 4. pack `meta.json` and the manuscript, stored under its display name
//! 5. delete the loose files
//!
//! A failed download is logged and does not stop the pipeline: step 4 then fails
//! on the missing manuscript and the loose `meta.json` stays for inspection.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::archive::{create_archive, remove_loose_files, sanitize_entry_name, ArchiveEntry};
use crate::contract::{ObjectStore, PlatformApi};
use crate::error::{PorterError, PorterResult};
use crate::metadata::write_meta;
use crate::model::{Deposit, DepositPopulated, FileMetadata, Manuscript, META_FILE_NAME};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub deposit_id: String,
    pub archive: PathBuf,
    /// Name of the manuscript entry inside the archive.
    pub manuscript: String,
}

pub fn archive_path(directory: &Path, deposit_id: &str) -> PathBuf {
    directory.join(format!("deposit_{deposit_id}.zip"))
}

/// Local view of a populated deposit.
///
/// The returned deposit names the manuscript by its display name
/// (`publicationFile.description`) reduced to a base name, which is also the
/// archive entry name; the returned file metadata keeps the stored object name
/// (`publicationFile.filename`) needed for the download.
pub fn local_view(populated: &DepositPopulated) -> PorterResult<(Deposit, FileMetadata)> {
    let file = populated.publication_file.clone().ok_or_else(|| {
        PorterError::Export(format!(
            "deposit {:?} has no publication file",
            populated.title
        ))
    })?;

    let display_name = sanitize_entry_name(file.display_name())
        .filter(|name| name != META_FILE_NAME)
        .ok_or_else(|| {
            PorterError::Export(format!(
                "invalid manuscript display name {:?}",
                file.display_name()
            ))
        })?;

    let deposit = Deposit {
        title: populated.title.clone(),
        community: populated.community_populated.name.clone(),
        abstract_text: populated.abstract_text.clone().unwrap_or_default(),
        authors: populated.authors.clone(),
        disciplines: populated.disciplines.clone(),
        keywords: populated.keywords.clone(),
        manuscript: Manuscript {
            filename: display_name,
        },
    };
    Ok((deposit, file))
}

/// Resolves the manuscript's storage location and downloads it into `directory`.
pub async fn download_manuscript<A, S>(
    api: &A,
    store: &S,
    deposit_id: &str,
    filename: &str,
    directory: &Path,
) -> PorterResult<PathBuf>
where
    A: PlatformApi + ?Sized,
    S: ObjectStore + ?Sized,
{
    let local_name = sanitize_entry_name(filename)
        .ok_or_else(|| PorterError::Download(format!("invalid manuscript filename {filename:?}")))?;

    let location = api
        .file_location(deposit_id, filename)
        .await
        .map_err(|e| match e {
            PorterError::Download(_) => e,
            other => PorterError::Download(format!("cannot resolve {filename}: {other}")),
        })?;
    info!(deposit_id, filename, "[EXPORT] Manuscript location resolved");

    let destination = directory.join(local_name);
    let bytes = store.download_to(&location, &destination).await?;
    info!(path = %destination.display(), bytes, "[EXPORT] Manuscript downloaded");
    Ok(destination)
}

pub async fn export_deposit<A, S>(
    api: &A,
    store: &S,
    deposit_id: &str,
    directory: &Path,
) -> PorterResult<ExportReport>
where
    A: PlatformApi + ?Sized,
    S: ObjectStore + ?Sized,
{
    info!(deposit_id, directory = %directory.display(), "[EXPORT] Starting deposit export");

    let populated = api.get_deposit(deposit_id).await.map_err(|e| {
        error!(error = %e, deposit_id, "[EXPORT][ERROR] Failed to fetch deposit");
        PorterError::Export(format!("populated deposit {deposit_id} is unavailable: {e}"))
    })?;
    let (deposit, file) = local_view(&populated)?;
    info!(
        title = %deposit.title,
        stored_as = %file.filename,
        display_name = %file.display_name(),
        "[EXPORT] Deposit fetched"
    );

    let manuscript_path = sanitize_entry_name(&file.filename)
        .filter(|name| name != META_FILE_NAME)
        .map(|name| directory.join(name))
        .ok_or_else(|| {
            PorterError::Export(format!("invalid publication file name {:?}", file.filename))
        })?;

    fs::create_dir_all(directory).map_err(|e| PorterError::file_access(directory, e))?;
    let meta_path = write_meta(directory, &deposit)?;

    // Only a fresh download may reach the archive.
    if let Err(e) = fs::remove_file(&manuscript_path) {
        if e.kind() != io::ErrorKind::NotFound {
            return Err(PorterError::file_access(&manuscript_path, e));
        }
    }

    if let Err(e) = download_manuscript(api, store, deposit_id, &file.filename, directory).await {
        warn!(error = %e, deposit_id, "[EXPORT] Manuscript download failed, packaging will not find it");
    }

    let archive = archive_path(directory, deposit_id);
    let entries = [
        ArchiveEntry::new(&meta_path, META_FILE_NAME),
        ArchiveEntry::new(&manuscript_path, deposit.manuscript.filename.as_str()),
    ];
    create_archive(&entries, &archive)?;
    remove_loose_files(&[meta_path.as_path(), manuscript_path.as_path()])?;

    info!(archive = %archive.display(), "[EXPORT] Deposit exported");
    Ok(ExportReport {
        deposit_id: deposit_id.to_string(),
        archive,
        manuscript: deposit.manuscript.filename,
    })
}
