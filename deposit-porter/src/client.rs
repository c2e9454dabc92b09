#![doc = "HTTP implementations of the platform and storage contracts."]
//
//! # Platform client
//!
//! [`PlatformClient`] implements [`PlatformApi`] against the publication platform.
//! Every request carries the two credential headers; redirects are never followed
//! so the manuscript file location can be read off the redirect itself.
//!
//! [`SignedUrlStore`] implements [`ObjectStore`] for pre-signed storage URLs. It
//! sends no credentials: the URL is the credential.
//!
//! Both stream file bodies instead of buffering them.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use deposit_porter_core::config::PlatformConfig;
use deposit_porter_core::contract::{ObjectStore, PlatformApi};
use deposit_porter_core::model::{
    Deposit, DepositPopulated, ManuscriptMetadata, UploadConfirmation, UploadSignedUrlResponse,
    IS_MAIN_FILE, REPLACE_PDF,
};
use deposit_porter_core::PorterError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_SECRET_HEADER: &str = "x-api-secret";

const OCTET_STREAM: &str = "application/octet-stream";

fn credential_header(value: &str, name: &str) -> Result<HeaderValue, PorterError> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|e| PorterError::Config(format!("{name} is not a valid header value: {e}")))?;
    header.set_sensitive(true);
    Ok(header)
}

/// Turns a non-2xx response into [`PorterError::Remote`].
async fn ensure_success(resp: Response, call: &str) -> Result<Response, PorterError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
    tracing::error!(status = %status, call, body = %body, "Platform returned error");
    Err(PorterError::Remote {
        status: status.as_u16(),
        body,
    })
}

async fn parse_json<T: DeserializeOwned>(resp: Response, call: &str) -> Result<T, PorterError> {
    resp.json::<T>().await.map_err(|e| {
        tracing::error!(error = ?e, call, "Unexpected response body");
        PorterError::Protocol(format!("{call}: unexpected response body: {e}"))
    })
}

pub struct PlatformClient {
    http: reqwest::Client,
    base: Url,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, PorterError> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, credential_header(&config.api_key, "api key")?);
        headers.insert(
            API_SECRET_HEADER,
            credential_header(&config.api_secret, "api secret")?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(Policy::none())
            .build()
            .map_err(|e| PorterError::Config(format!("cannot build HTTP client: {e}")))?;

        let base = Url::parse(config.api_root()).map_err(|e| {
            PorterError::Config(format!("invalid base URL {:?}: {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(PorterError::Config(format!(
                "base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        tracing::info!(base_url = %base, "Initialized PlatformClient");
        Ok(Self { http, base })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, req: RequestBuilder, call: &str) -> Result<Response, PorterError> {
        let resp = req.send().await.map_err(|e| {
            tracing::error!(error = ?e, call, "Request to platform failed");
            PorterError::Network(format!("{call}: {e}"))
        })?;
        ensure_success(resp, call).await
    }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn create_basic_deposit(&self, deposit: &Deposit) -> Result<String, PorterError> {
        tracing::info!(
            title = %deposit.title,
            community = %deposit.community,
            "Creating basic deposit"
        );
        let url = self.endpoint(&["deposits", "importBasicDeposit"]);
        let resp = self
            .send(self.http.post(url).json(&deposit.basic()), "create deposit")
            .await?;
        let body: serde_json::Value = parse_json(resp, "create deposit").await?;

        match body.get("_id").and_then(|id| id.as_str()) {
            Some(id) if !id.is_empty() => {
                tracing::info!(deposit_id = id, "Successfully created deposit");
                Ok(id.to_string())
            }
            _ => {
                tracing::error!(body = %body, "Create deposit response lacks _id");
                Err(PorterError::Protocol(
                    "create deposit: response has no _id".into(),
                ))
            }
        }
    }

    async fn request_upload_url(
        &self,
        deposit_id: &str,
        metadata: &ManuscriptMetadata,
    ) -> Result<UploadSignedUrlResponse, PorterError> {
        tracing::info!(deposit_id, file = %metadata.file.name, "Requesting upload URL");
        let url = self.endpoint(&["deposits", deposit_id, "files"]);
        let req = self
            .http
            .post(url)
            .query(&[
                ("isMainFile", IS_MAIN_FILE.to_string()),
                ("replacePDF", REPLACE_PDF.to_string()),
            ])
            .json(metadata);
        let resp = self.send(req, "request upload url").await?;
        parse_json(resp, "request upload url").await
    }

    async fn confirm_upload(
        &self,
        deposit_id: &str,
        confirmation: &UploadConfirmation,
    ) -> Result<(), PorterError> {
        tracing::info!(deposit_id, "Confirming upload");
        let url = self.endpoint(&["deposits", deposit_id, "files", "confirm"]);
        self.send(self.http.patch(url).json(confirmation), "confirm upload")
            .await?;
        tracing::info!(deposit_id, "Upload confirmed");
        Ok(())
    }

    async fn get_deposit(&self, deposit_id: &str) -> Result<DepositPopulated, PorterError> {
        tracing::info!(deposit_id, "Fetching deposit");
        let url = self.endpoint(&["deposits", deposit_id]);
        let resp = self.send(self.http.get(url), "fetch deposit").await?;
        parse_json(resp, "fetch deposit").await
    }

    async fn file_location(
        &self,
        deposit_id: &str,
        filename: &str,
    ) -> Result<String, PorterError> {
        let url = self.endpoint(&["deposits", deposit_id, "files", filename]);
        tracing::info!(deposit_id, filename, "Requesting file location");
        let resp = self.http.get(url).send().await.map_err(|e| {
            tracing::error!(error = ?e, deposit_id, filename, "File location request failed");
            PorterError::Download(format!("file location request failed: {e}"))
        })?;

        let status = resp.status();
        if !status.is_redirection() {
            tracing::error!(status = %status, deposit_id, filename, "Expected a redirect");
            return Err(PorterError::Download(format!(
                "expected a redirect for {filename}, got {status}"
            )));
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                PorterError::Download(format!("redirect for {filename} has no location header"))
            })?;
        // Relative targets resolve against the request URL.
        let target = resp
            .url()
            .join(location)
            .map_err(|e| PorterError::Download(format!("invalid redirect target {location:?}: {e}")))?;
        Ok(target.to_string())
    }

    async fn user_summary(&self, orcid: &str) -> Result<serde_json::Value, PorterError> {
        tracing::info!(orcid, "Fetching user summary");
        let url = self.endpoint(&["users", "profile", orcid, "summary"]);
        let resp = self.send(self.http.get(url), "user summary").await?;
        parse_json(resp, "user summary").await
    }
}

/// Transfers against pre-signed storage URLs.
pub struct SignedUrlStore {
    http: reqwest::Client,
}

impl SignedUrlStore {
    pub fn new() -> Result<Self, PorterError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PorterError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

async fn stream_to_file(resp: Response, destination: &Path) -> Result<u64, PorterError> {
    let mut file = tokio::fs::File::create(destination)
        .await
        .map_err(|e| PorterError::file_access(destination, e))?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| PorterError::Download(format!("body read failed: {e}")))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| PorterError::file_access(destination, e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| PorterError::file_access(destination, e))?;
    Ok(written)
}

#[async_trait]
impl ObjectStore for SignedUrlStore {
    async fn put_signed(
        &self,
        signed_url: &str,
        path: &Path,
        content_length: u64,
    ) -> Result<(), PorterError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| PorterError::file_access(path, e))?;

        tracing::info!(path = %path.display(), content_length, "Uploading to signed URL");
        let resp = self
            .http
            .put(signed_url)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(CONTENT_LENGTH, content_length)
            .body(reqwest::Body::from(file))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Signed upload failed");
                PorterError::Transfer(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Storage rejected upload");
            return Err(PorterError::Transfer(format!(
                "storage returned {status}: {body}"
            )));
        }
        tracing::info!(path = %path.display(), "Signed upload accepted");
        Ok(())
    }

    async fn download_to(&self, url: &str, destination: &Path) -> Result<u64, PorterError> {
        tracing::info!(destination = %destination.display(), "Downloading from storage");
        let resp = self.http.get(url).send().await.map_err(|e| {
            tracing::error!(error = ?e, "Storage download failed");
            PorterError::Download(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::error!(status = %status, "Storage rejected download");
            return Err(PorterError::Download(format!("storage returned {status}")));
        }

        match stream_to_file(resp, destination).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                // Leave no truncated file behind.
                let _ = tokio::fs::remove_file(destination).await;
                Err(e)
            }
        }
    }
}
