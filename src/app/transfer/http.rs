//! HTTP transfer client with streaming writes and cooperative cancellation
//!
//! Streams the product body chunk-by-chunk into a `.part` file and renames it
//! into place on completion, so an interrupted transfer can never be mistaken
//! for a finished artifact. The cancellation token is checked before every
//! chunk write.

use std::env;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::app::transfer::{part_path, ProgressCallback, TransferClient, TransferConfig};
use crate::constants::{auth, env as env_constants, http};
use crate::errors::{TransferError, TransferResult};

/// Production transfer client backed by the CDSE OData download endpoint
pub struct HttpTransferClient {
    http: Client,
    config: TransferConfig,
    token: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl std::fmt::Debug for HttpTransferClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransferClient")
            .field("download_base_url", &self.config.download_base_url)
            .finish()
    }
}

impl HttpTransferClient {
    /// Create a new transfer client from configuration
    ///
    /// No total request timeout is set: product bodies are large and the
    /// stream is bounded by the connect timeout plus per-chunk progress.
    pub fn new(config: TransferConfig) -> TransferResult<Self> {
        let http = Client::builder()
            .user_agent(http::USER_AGENT)
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(TransferError::Http)?;

        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    fn product_url(&self, product_id: &str) -> TransferResult<Url> {
        let raw = format!(
            "{}/Products('{}')/$value",
            self.config.download_base_url.trim_end_matches('/'),
            product_id
        );
        Url::parse(&raw).map_err(|e| TransferError::InvalidUrl {
            url: raw,
            error: e.to_string(),
        })
    }

    /// Get a bearer token for the download endpoint, refreshing when expired
    async fn access_token(&self) -> TransferResult<String> {
        let mut cached = self.token.lock().await;
        if let Some((token, expires_at)) = cached.as_ref() {
            if Utc::now() < *expires_at {
                return Ok(token.clone());
            }
        }

        let client_id = env::var(env_constants::CLIENT_ID).unwrap_or_default();
        let client_secret = env::var(env_constants::CLIENT_SECRET).unwrap_or_default();

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TransferError::Server {
                status: response.status().as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let expires_in = body
            .get("expires_in")
            .and_then(|v| v.as_u64())
            .unwrap_or(3600)
            .saturating_sub(auth::TOKEN_EXPIRY_MARGIN_SECS);

        *cached = Some((
            token.clone(),
            Utc::now() + chrono::Duration::seconds(expires_in as i64),
        ));
        Ok(token)
    }

    async fn discard_part(part: &Path) {
        if let Err(e) = tokio::fs::remove_file(part).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Failed to remove partial artifact {}: {}", part.display(), e);
            }
        }
    }
}

#[async_trait]
impl TransferClient for HttpTransferClient {
    async fn fetch(
        &self,
        product_id: &str,
        destination: &Path,
        on_progress: ProgressCallback<'_>,
        cancel: &CancellationToken,
    ) -> TransferResult<()> {
        let url = self.product_url(product_id)?;
        let token = self.access_token().await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http.get(url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(TransferError::Server {
                status: response.status().as_u16(),
            });
        }

        let total = response.content_length();
        let part = part_path(destination);
        let mut file = File::create(&part).await?;
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;

        while let Some(chunk) = stream.next().await {
            // Cancellation is observed between chunks, never mid-write
            if cancel.is_cancelled() {
                drop(file);
                Self::discard_part(&part).await;
                info!("Transfer cancelled: {}", product_id);
                return Err(TransferError::Cancelled);
            }

            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    Self::discard_part(&part).await;
                    return Err(TransferError::Http(e));
                }
            };

            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                Self::discard_part(&part).await;
                return Err(TransferError::Io(e));
            }

            received += chunk.len() as u64;
            if let Some(total) = total {
                if total > 0 {
                    on_progress((received as f64 / total as f64 * 100.0) as f32);
                }
            }
        }

        file.flush().await?;
        drop(file);

        if let Some(total) = total {
            if received != total {
                Self::discard_part(&part).await;
                return Err(TransferError::Incomplete {
                    received,
                    expected: total,
                });
            }
        }

        tokio::fs::rename(&part, destination).await?;
        on_progress(100.0);
        info!(
            "Transfer complete: {} ({} bytes) -> {}",
            product_id,
            received,
            destination.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_url_format() {
        let client = HttpTransferClient::new(TransferConfig::default()).unwrap();
        let url = client.product_url("S1A_IW_GRDH_1SDV_20240601.SAFE").unwrap();
        assert_eq!(
            url.as_str(),
            "https://download.dataspace.copernicus.eu/odata/v1/Products('S1A_IW_GRDH_1SDV_20240601.SAFE')/$value"
        );
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let config = TransferConfig {
            download_base_url: "https://example.com/odata/v1/".to_string(),
            ..Default::default()
        };
        let client = HttpTransferClient::new(config).unwrap();
        let url = client.product_url("P1").unwrap();
        assert_eq!(url.as_str(), "https://example.com/odata/v1/Products('P1')/$value");
    }

    #[tokio::test]
    async fn test_discard_part_tolerates_missing_file() {
        // Must not error when the partial artifact was never created
        HttpTransferClient::discard_part(Path::new("/nonexistent/dir/file.part")).await;
    }
}
