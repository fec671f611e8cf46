//! # HTTP Blob-Store Client
//!
//! REST object-storage client in the hosted-storage API shape the service
//! deploys against: directory listings via a JSON POST, uploads guarded by
//! an `x-upsert` header, and signed-URL issuance endpoints.
//!
//! ## Error Handling
//!
//! Transport failures and 5xx responses classify as
//! [`BlobStoreError::Unavailable`] so the ceremony read paths can degrade;
//! a 409 on a create-if-absent upload maps to `AlreadyExists`, which is the
//! contribution-race signal; unexpected response shapes are `Protocol`
//! errors with the endpoint named.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::BlobStoreError;
use crate::traits::BlobStore;
use crate::types::{BlobEntry, SignedUrl};

/// Configuration for [`HttpBlobStore`].
#[derive(Clone)]
pub struct HttpBlobStoreConfig {
    /// Base URL of the storage API (e.g. `https://storage.zkrune.io`).
    pub base_url: String,
    /// Bucket holding ceremony and circuit artifacts.
    pub bucket: String,
    /// Bearer token for the service role.
    pub api_key: String,
    /// Per-request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl HttpBlobStoreConfig {
    /// Configuration with the default timeout.
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            bucket: bucket.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for HttpBlobStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBlobStoreConfig")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// REST blob-store client.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct ListedObject {
    name: String,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize)]
struct SignedUrlBody {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl HttpBlobStore {
    /// Build a client from configuration.
    pub fn new(config: HttpBlobStoreConfig) -> Result<Self, BlobStoreError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| {
                    BlobStoreError::Protocol("api key contains invalid header characters".into())
                })?,
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BlobStoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<reqwest::Response, BlobStoreError> {
        let resp = request
            .send()
            .await
            .map_err(|e| BlobStoreError::Unavailable(format!("{operation}: {e}")))?;

        if resp.status().is_server_error() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BlobStoreError::Unavailable(format!(
                "{operation}: HTTP {status} — {body}"
            )));
        }
        Ok(resp)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, BlobStoreError> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let body = serde_json::json!({ "prefix": prefix, "limit": 1000 });

        let resp = self.send(self.client.post(&url).json(&body), "list").await?;
        if !resp.status().is_success() {
            // A directory that was never written to lists as empty, not
            // as an error.
            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(Vec::new());
            }
            return Err(BlobStoreError::Protocol(format!(
                "list: unexpected HTTP {}",
                resp.status()
            )));
        }

        let objects: Vec<ListedObject> = resp
            .json()
            .await
            .map_err(|e| BlobStoreError::Protocol(format!("list: malformed body: {e}")))?;

        Ok(objects
            .into_iter()
            .map(|o| BlobEntry {
                name: o.name,
                created_at: o.created_at,
            })
            .collect())
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), BlobStoreError> {
        let resp = self
            .send(
                self.client
                    .post(self.object_url(path))
                    .header("x-upsert", if overwrite { "true" } else { "false" })
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(bytes),
                "upload",
            )
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::CONFLICT => Err(BlobStoreError::AlreadyExists {
                path: path.to_string(),
            }),
            s => {
                let body = resp.text().await.unwrap_or_default();
                Err(BlobStoreError::Protocol(format!(
                    "upload: HTTP {s} — {body}"
                )))
            }
        }
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, BlobStoreError> {
        let resp = self
            .send(self.client.get(self.object_url(path)), "download")
            .await?;

        match resp.status() {
            s if s.is_success() => {
                let bytes = resp.bytes().await.map_err(|e| {
                    BlobStoreError::Unavailable(format!("download: body read failed: {e}"))
                })?;
                Ok(bytes.to_vec())
            }
            reqwest::StatusCode::NOT_FOUND => Err(BlobStoreError::NotFound {
                path: path.to_string(),
            }),
            s => Err(BlobStoreError::Protocol(format!("download: HTTP {s}"))),
        }
    }

    async fn signed_download_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, path
        );
        let body = serde_json::json!({ "expiresIn": ttl.as_secs() });

        let resp = self
            .send(self.client.post(&url).json(&body), "signed_download_url")
            .await?;

        match resp.status() {
            s if s.is_success() => {
                let parsed: SignedUrlBody = resp.json().await.map_err(|e| {
                    BlobStoreError::Protocol(format!("signed_download_url: malformed body: {e}"))
                })?;
                Ok(SignedUrl {
                    url: format!("{}{}", self.base_url, parsed.signed_url),
                    expires_in_secs: ttl.as_secs(),
                })
            }
            reqwest::StatusCode::NOT_FOUND => Err(BlobStoreError::NotFound {
                path: path.to_string(),
            }),
            s => Err(BlobStoreError::Protocol(format!(
                "signed_download_url: HTTP {s}"
            ))),
        }
    }

    async fn signed_upload_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<SignedUrl, BlobStoreError> {
        let url = format!(
            "{}/storage/v1/object/upload/sign/{}/{}",
            self.base_url, self.bucket, path
        );
        let body = serde_json::json!({ "expiresIn": ttl.as_secs() });

        let resp = self
            .send(self.client.post(&url).json(&body), "signed_upload_url")
            .await?;

        if !resp.status().is_success() {
            return Err(BlobStoreError::Protocol(format!(
                "signed_upload_url: HTTP {}",
                resp.status()
            )));
        }
        let parsed: SignedUrlBody = resp.json().await.map_err(|e| {
            BlobStoreError::Protocol(format!("signed_upload_url: malformed body: {e}"))
        })?;
        Ok(SignedUrl {
            url: format!("{}{}", self.base_url, parsed.signed_url),
            expires_in_secs: ttl.as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_redacts_api_key() {
        let config = HttpBlobStoreConfig::new("https://storage.example", "zk-artifacts", "sk-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = HttpBlobStore::new(HttpBlobStoreConfig::new(
            "https://storage.example/",
            "zk-artifacts",
            "key",
        ))
        .unwrap();
        assert_eq!(
            store.object_url("circuits/age-verification.zkey"),
            "https://storage.example/storage/v1/object/zk-artifacts/circuits/age-verification.zkey"
        );
    }

    #[test]
    fn invalid_api_key_characters_rejected() {
        let result = HttpBlobStore::new(HttpBlobStoreConfig::new(
            "https://storage.example",
            "bucket",
            "bad\nkey",
        ));
        assert!(result.is_err());
    }
}
