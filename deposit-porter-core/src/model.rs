//! Deposit data model: the import request shape, the populated remote shape, and
//! the file/upload descriptors exchanged with the platform.
//!
//! All values are plain data owned by the pipeline invocation that builds them.

use serde::{Deserialize, Serialize};

/// Upload intent sent with every manuscript upload request. Fixed policy.
pub const IS_MAIN_FILE: bool = true;
pub const REPLACE_PDF: bool = false;

/// Name of the metadata document inside an import directory or export archive.
pub const META_FILE_NAME: &str = "meta.json";

/// Author as the platform knows it. Identity is positional within the deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

/// Raw author record found in an import `meta.json`.
///
/// Also accepts the camelCase shape written by the exporter, so an exported
/// `meta.json` can be fed back into an import.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputAuthor {
    #[serde(default)]
    pub author_id: Option<serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub orcid: Option<String>,
    #[serde(default)]
    pub date_modified: Option<serde_json::Value>,
}

impl From<InputAuthor> for Author {
    fn from(input: InputAuthor) -> Self {
        Author {
            first_name: input.first_name,
            last_name: input.last_name,
            nickname: None,
            orcid: input.orcid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    pub filename: String,
}

/// A deposit as sent for import and as written to an exported `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub title: String,
    pub community: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<Author>,
    pub disciplines: Vec<String>,
    pub keywords: Vec<String>,
    pub manuscript: Manuscript,
}

/// Body of the create-deposit call: the deposit without its manuscript.
#[derive(Debug, Serialize)]
pub struct BasicDeposit<'a> {
    pub title: &'a str,
    pub community: &'a str,
    #[serde(rename = "abstract")]
    pub abstract_text: &'a str,
    pub authors: &'a [Author],
    pub disciplines: &'a [String],
    pub keywords: &'a [String],
}

impl Deposit {
    pub fn basic(&self) -> BasicDeposit<'_> {
        BasicDeposit {
            title: &self.title,
            community: &self.community,
            abstract_text: &self.abstract_text,
            authors: &self.authors,
            disciplines: &self.disciplines,
            keywords: &self.keywords,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPopulated {
    pub name: String,
}

/// Server-side representation of a deposit, as returned by `GET /deposits/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositPopulated {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub disciplines: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub community_populated: CommunityPopulated,
    #[serde(default)]
    pub publication_file: Option<FileMetadata>,
}

/// Platform-side metadata of a stored file.
///
/// `filename` names the stored object; `description` is the display name. They
/// may differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub filename: String,
    #[serde(default)]
    pub description: String,
    pub content_type: String,
    pub content_length: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FileMetadata {
    /// Display name of the file, falling back to the object name when the platform
    /// sent no description.
    pub fn display_name(&self) -> &str {
        if self.description.is_empty() {
            &self.filename
        } else {
            &self.description
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManuscriptFile {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManuscriptMetadata {
    pub file: ManuscriptFile,
}

fn main_file_default() -> bool {
    IS_MAIN_FILE
}

fn replace_pdf_default() -> bool {
    REPLACE_PDF
}

/// Answer to an upload request. `signed_url` is a one-time write credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignedUrlResponse {
    pub signed_url: String,
    pub file_metadata: FileMetadata,
    #[serde(default = "main_file_default")]
    pub is_main_file: bool,
    #[serde(rename = "replacePDF", default = "replace_pdf_default")]
    pub replace_pdf: bool,
}

/// Body of the confirm-upload call: the upload answer with the signed URL removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfirmation {
    pub file_metadata: FileMetadata,
    pub is_main_file: bool,
    #[serde(rename = "replacePDF")]
    pub replace_pdf: bool,
}

impl UploadSignedUrlResponse {
    /// Splits off the signed URL so the rest can be sent back as a confirmation.
    pub fn into_parts(self) -> (String, UploadConfirmation) {
        (
            self.signed_url,
            UploadConfirmation {
                file_metadata: self.file_metadata,
                is_main_file: self.is_main_file,
                replace_pdf: self.replace_pdf,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_author_maps_identity_fields_only() {
        let input: InputAuthor = serde_json::from_value(json!({
            "author_id": 17,
            "user_id": null,
            "first_name": "Ada",
            "middle_name": "King",
            "last_name": "Lovelace",
            "orcid": "0000-0002-1825-0097",
            "date_modified": "2023-07-01"
        }))
        .unwrap();

        let author = Author::from(input);
        assert_eq!(author.first_name, "Ada");
        assert_eq!(author.last_name, "Lovelace");
        assert_eq!(author.orcid.as_deref(), Some("0000-0002-1825-0097"));
        assert_eq!(author.nickname, None);
    }

    #[test]
    fn input_author_accepts_exported_shape() {
        let input: InputAuthor = serde_json::from_value(json!({
            "firstName": "Grace",
            "lastName": "Hopper"
        }))
        .unwrap();
        assert_eq!(input.first_name, "Grace");
        assert_eq!(input.orcid, None);
    }

    #[test]
    fn basic_deposit_omits_manuscript() {
        let deposit = Deposit {
            title: "On Engines".into(),
            community: "math".into(),
            abstract_text: "Notes.".into(),
            authors: vec![],
            disciplines: vec!["Mathematics".into()],
            keywords: vec!["engine".into()],
            manuscript: Manuscript {
                filename: "paper.pdf".into(),
            },
        };
        let body = serde_json::to_value(deposit.basic()).unwrap();
        assert_eq!(body["abstract"], "Notes.");
        assert_eq!(body["community"], "math");
        assert!(body.get("manuscript").is_none());
    }

    #[test]
    fn confirmation_drops_signed_url() {
        let response: UploadSignedUrlResponse = serde_json::from_value(json!({
            "signedUrl": "https://storage.example/put?sig=abc",
            "fileMetadata": {
                "filename": "64a0.pdf",
                "description": "paper.pdf",
                "contentType": "application/pdf",
                "contentLength": 11,
                "tags": ["Publication"]
            },
            "isMainFile": true,
            "replacePDF": false
        }))
        .unwrap();

        let (signed_url, confirmation) = response.into_parts();
        assert_eq!(signed_url, "https://storage.example/put?sig=abc");
        let body = serde_json::to_value(&confirmation).unwrap();
        assert!(body.get("signedUrl").is_none());
        assert_eq!(body["replacePDF"], false);
        assert_eq!(body["isMainFile"], true);
        assert_eq!(body["fileMetadata"]["description"], "paper.pdf");
    }

    #[test]
    fn display_name_prefers_description() {
        let mut file = FileMetadata {
            filename: "X.docx".into(),
            description: "Y.docx".into(),
            content_type: "application/msword".into(),
            content_length: 1,
            tags: vec![],
        };
        assert_eq!(file.display_name(), "Y.docx");
        file.description.clear();
        assert_eq!(file.display_name(), "X.docx");
    }
}
