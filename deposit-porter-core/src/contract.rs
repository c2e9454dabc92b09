//! # contract: interfaces to the publication platform and its file storage
//!
//! Two traits separate the pipelines from their transport:
//! - [`PlatformApi`]: authenticated calls against the platform (deposits, files, users).
//! - [`ObjectStore`]: unauthenticated transfers against pre-signed storage URLs.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; with the default `test-export-mocks`
//!   feature the generated `MockPlatformApi` and `MockObjectStore` are exported so
//!   integration tests can pin call order and inject failures.
//!
//! ## Implementors
//! - The CLI crate provides `reqwest` based implementations. Implementors map
//!   non-2xx platform answers to [`PorterError::Remote`], transport failures to
//!   [`PorterError::Network`], storage writes to [`PorterError::Transfer`] and
//!   storage reads to [`PorterError::Download`].

use std::path::Path;

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::PorterError;
use crate::model::{
    Deposit, DepositPopulated, ManuscriptMetadata, UploadConfirmation, UploadSignedUrlResponse,
};

/// Authenticated platform API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// `POST /deposits/importBasicDeposit`. Returns the platform-assigned deposit id.
    ///
    /// The manuscript is not part of this call.
    async fn create_basic_deposit(&self, deposit: &Deposit) -> Result<String, PorterError>;

    /// `POST /deposits/{id}/files?isMainFile=true&replacePDF=false`.
    async fn request_upload_url(
        &self,
        deposit_id: &str,
        metadata: &ManuscriptMetadata,
    ) -> Result<UploadSignedUrlResponse, PorterError>;

    /// `PATCH /deposits/{id}/files/confirm`.
    async fn confirm_upload(
        &self,
        deposit_id: &str,
        confirmation: &UploadConfirmation,
    ) -> Result<(), PorterError>;

    /// `GET /deposits/{id}`.
    async fn get_deposit(&self, deposit_id: &str) -> Result<DepositPopulated, PorterError>;

    /// `GET /deposits/{id}/files/{filename}`, expecting a redirect. Returns the
    /// redirect target without following it.
    async fn file_location(&self, deposit_id: &str, filename: &str)
        -> Result<String, PorterError>;

    /// `GET /users/profile/{orcid}/summary`. The body is returned unmodified.
    async fn user_summary(&self, orcid: &str) -> Result<serde_json::Value, PorterError>;
}

/// Direct transfers against pre-signed storage URLs.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Streams the file at `path` to `signed_url` with a PUT, declaring
    /// `content_length` bytes of `application/octet-stream`.
    async fn put_signed(
        &self,
        signed_url: &str,
        path: &Path,
        content_length: u64,
    ) -> Result<(), PorterError>;

    /// Streams the body behind `url` into `destination`. Returns the byte count.
    async fn download_to(&self, url: &str, destination: &Path) -> Result<u64, PorterError>;
}
