//! Builds the manuscript descriptor sent with an upload request.

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::{error, info};

use crate::error::{PorterError, PorterResult};
use crate::model::{ManuscriptFile, ManuscriptMetadata};

const OCTET_STREAM: &str = "application/octet-stream";

/// Content type declared for a manuscript, by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("rtf") => "application/rtf",
        Some("tex") => "application/x-tex",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("epub") => "application/epub+zip",
        _ => OCTET_STREAM,
    }
}

/// Inspects the file at `path` and describes it. The `size` here is also the
/// length declared when the bytes are transferred.
pub fn build_manuscript_metadata(path: &Path) -> PorterResult<ManuscriptMetadata> {
    let attrs = fs::metadata(path).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Cannot stat manuscript");
        PorterError::file_access(path, e)
    })?;
    if !attrs.is_file() {
        error!(path = %path.display(), "Manuscript path is not a regular file");
        return Err(PorterError::file_access(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let last_modified = attrs
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let metadata = ManuscriptMetadata {
        file: ManuscriptFile {
            content_type: content_type_for(path).to_string(),
            name,
            size: attrs.len(),
            last_modified,
        },
    };
    info!(
        name = %metadata.file.name,
        size = metadata.file.size,
        content_type = %metadata.file.content_type,
        "Built manuscript metadata"
    );
    Ok(metadata)
}
