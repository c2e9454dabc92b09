//! Import pipeline: local directory → remote deposit with uploaded manuscript.
//!
//! Stages run strictly in order and each waits for the previous one:
//!   1. load `meta.json` and transform its authors
//!   2. create the basic deposit (manuscript excluded)
//!   3. describe the manuscript file
//!   4. request a signed upload URL
//!   5. stream the manuscript bytes to that URL
//!   6. confirm the upload, without the signed URL
//!
//! Any failure stops the pipeline. A deposit created in step 2 is left behind if a
//! later step fails; reconciling such partial deposits is out of scope.
//!
//! [`import_deposit`] returns the outcome; [`import_deposit_logged`] is the
//! non-throwing variant that only logs a failure.

use std::path::Path;

use tracing::{error, info};

use crate::contract::{ObjectStore, PlatformApi};
use crate::error::PorterResult;
use crate::manuscript::build_manuscript_metadata;
use crate::metadata::load_meta;

/// What a successful import produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub deposit_id: String,
    pub title: String,
    pub manuscript: String,
    pub bytes_transferred: u64,
}

pub async fn import_deposit<A, S>(
    api: &A,
    store: &S,
    directory: &Path,
    community: &str,
) -> PorterResult<ImportReport>
where
    A: PlatformApi + ?Sized,
    S: ObjectStore + ?Sized,
{
    info!(directory = %directory.display(), community, "[IMPORT] Starting deposit import");

    let deposit = load_meta(directory)?.into_deposit(community);
    info!(
        title = %deposit.title,
        authors = deposit.authors.len(),
        "[IMPORT] Metadata loaded"
    );

    let deposit_id = match api.create_basic_deposit(&deposit).await {
        Ok(id) => {
            info!(deposit_id = %id, "[IMPORT] Deposit created");
            id
        }
        Err(e) => {
            error!(error = %e, "[IMPORT][ERROR] create_basic_deposit failed");
            return Err(e);
        }
    };

    let manuscript_path = directory.join(&deposit.manuscript.filename);
    let metadata = build_manuscript_metadata(&manuscript_path)?;

    let upload = match api.request_upload_url(&deposit_id, &metadata).await {
        Ok(upload) => {
            info!(
                deposit_id = %deposit_id,
                stored_as = %upload.file_metadata.filename,
                "[IMPORT] Upload URL issued"
            );
            upload
        }
        Err(e) => {
            error!(error = %e, deposit_id = %deposit_id, "[IMPORT][ERROR] request_upload_url failed");
            return Err(e);
        }
    };

    let (signed_url, confirmation) = upload.into_parts();

    if let Err(e) = store
        .put_signed(&signed_url, &manuscript_path, metadata.file.size)
        .await
    {
        error!(error = %e, deposit_id = %deposit_id, "[IMPORT][ERROR] Manuscript transfer failed");
        return Err(e);
    }
    info!(
        deposit_id = %deposit_id,
        bytes = metadata.file.size,
        "[IMPORT] Manuscript transferred"
    );

    if let Err(e) = api.confirm_upload(&deposit_id, &confirmation).await {
        error!(error = %e, deposit_id = %deposit_id, "[IMPORT][ERROR] confirm_upload failed");
        return Err(e);
    }
    info!(deposit_id = %deposit_id, title = %deposit.title, "[IMPORT] Deposit imported");

    Ok(ImportReport {
        deposit_id,
        title: deposit.title,
        manuscript: metadata.file.name,
        bytes_transferred: metadata.file.size,
    })
}

/// Runs [`import_deposit`] and logs instead of returning the error.
///
/// Callers get `None` on failure and cannot tell which stage failed.
pub async fn import_deposit_logged<A, S>(
    api: &A,
    store: &S,
    directory: &Path,
    community: &str,
) -> Option<ImportReport>
where
    A: PlatformApi + ?Sized,
    S: ObjectStore + ?Sized,
{
    match import_deposit(api, store, directory, community).await {
        Ok(report) => {
            info!(deposit_id = %report.deposit_id, title = %report.title, "Imported deposit");
            Some(report)
        }
        Err(e) => {
            error!(error = %e, directory = %directory.display(), "Import failed");
            None
        }
    }
}
