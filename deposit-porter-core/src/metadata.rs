//! Reading and writing the `meta.json` document that accompanies a manuscript.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::archive::sanitize_entry_name;
use crate::error::{PorterError, PorterResult};
use crate::model::{Author, Deposit, InputAuthor, Manuscript, META_FILE_NAME};

/// Contents of an import directory's `meta.json`. The community is supplied by
/// the caller, never read from here.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportMeta {
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<InputAuthor>,
    #[serde(default)]
    pub disciplines: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub manuscript: Manuscript,
}

impl ImportMeta {
    pub fn into_deposit(self, community: &str) -> Deposit {
        Deposit {
            title: self.title,
            community: community.to_string(),
            abstract_text: self.abstract_text,
            authors: transform_authors(self.authors),
            disciplines: self.disciplines,
            keywords: self.keywords,
            manuscript: self.manuscript,
        }
    }
}

/// Order-preserving 1:1 mapping of raw authors to platform authors.
pub fn transform_authors(authors: Vec<InputAuthor>) -> Vec<Author> {
    authors.into_iter().map(Author::from).collect()
}

/// Loads `<directory>/meta.json`.
pub fn load_meta(directory: &Path) -> PorterResult<ImportMeta> {
    let path = directory.join(META_FILE_NAME);
    info!(meta_path = ?path, "Loading deposit metadata");

    let content = fs::read_to_string(&path).map_err(|e| {
        error!(error = ?e, meta_path = ?path, "Failed to read metadata file");
        PorterError::Load {
            path: path.clone(),
            reason: e.to_string(),
        }
    })?;

    let meta: ImportMeta = serde_json::from_str(&content).map_err(|e| {
        error!(error = ?e, meta_path = ?path, "Failed to parse metadata JSON");
        PorterError::Load {
            path: path.clone(),
            reason: format!("invalid JSON: {e}"),
        }
    })?;

    let filename = meta.manuscript.filename.as_str();
    if sanitize_entry_name(filename).as_deref() != Some(filename) || filename == META_FILE_NAME {
        error!(meta_path = ?path, manuscript = filename, "Manuscript is not a file next to the metadata");
        return Err(PorterError::Load {
            path,
            reason: format!("manuscript filename {filename:?} must be a plain file name beside {META_FILE_NAME}"),
        });
    }

    debug!(
        title = %meta.title,
        authors = meta.authors.len(),
        manuscript = %meta.manuscript.filename,
        "Parsed deposit metadata"
    );
    Ok(meta)
}

/// Writes `deposit` as pretty JSON to `<directory>/meta.json`, returning the path.
pub fn write_meta(directory: &Path, deposit: &Deposit) -> PorterResult<PathBuf> {
    let path = directory.join(META_FILE_NAME);
    let json = serde_json::to_vec_pretty(deposit)
        .map_err(|e| PorterError::Export(format!("cannot serialise metadata: {e}")))?;
    fs::write(&path, json).map_err(|e| {
        error!(error = ?e, meta_path = ?path, "Failed to write metadata file");
        PorterError::file_access(&path, e)
    })?;
    info!(meta_path = %path.display(), "Wrote deposit metadata");
    Ok(path)
}
