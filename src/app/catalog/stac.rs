//! STAC catalog client for Copernicus Data Space Ecosystem
//!
//! Queries the CDSE STAC search endpoint for Sentinel-1 GRD scenes around a
//! grid center. Authentication uses the OAuth2 client-credentials flow with
//! an in-memory token cache; requests are rate limited to keep bulk sweeps
//! from overwhelming the external service.

use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::app::catalog::{sort_scenes, CatalogConfig, SceneCatalogClient, SearchOrder, TimeRange};
use crate::app::models::SceneMetadata;
use crate::constants::{auth, env as env_constants, http, limits};
use crate::errors::{AuthError, AuthResult, CatalogError, CatalogResult};

/// Cached OAuth2 access token with its refresh deadline
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// Production catalog client backed by the CDSE STAC API
pub struct StacCatalogClient {
    http: Client,
    config: CatalogConfig,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for StacCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StacCatalogClient")
            .field("search_url", &self.config.search_url)
            .field("collection", &self.config.collection)
            .finish()
    }
}

impl StacCatalogClient {
    /// Create a new catalog client from configuration
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .user_agent(http::USER_AGENT)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(http::POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(http::POOL_MAX_PER_HOST)
            .build()
            .map_err(CatalogError::Http)?;

        let quota = Quota::per_second(NonZeroU32::new(config.rate_limit_rps).ok_or(
            CatalogError::InvalidResponse {
                reason: "rate_limit_rps must be non-zero".to_string(),
            },
        )?);

        Ok(Self {
            http,
            config,
            rate_limiter: RateLimiter::direct(quota),
            token: Mutex::new(None),
        })
    }

    /// Verify that credentials are usable by acquiring a token
    pub async fn verify_credentials(&self) -> AuthResult<()> {
        self.access_token().await.map(|_| ())
    }

    /// Get a valid access token, refreshing through the token endpoint
    /// when the cached one is missing or near expiry
    async fn access_token(&self) -> AuthResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid() {
                return Ok(token.access_token.clone());
            }
        }

        let client_id = env::var(env_constants::CLIENT_ID)
            .map_err(|_| AuthError::MissingCredentials)?;
        let client_secret = env::var(env_constants::CLIENT_SECRET)
            .map_err(|_| AuthError::MissingCredentials)?;

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
            return Err(AuthError::TokenRejected {
                status: response.status().as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AuthError::MalformedToken {
                reason: "missing access_token field".to_string(),
            })?
            .to_string();
        let expires_in = body
            .get("expires_in")
            .and_then(|v| v.as_u64())
            .unwrap_or(3600);

        // Refresh a little before the server-side expiry
        let lifetime = expires_in.saturating_sub(auth::TOKEN_EXPIRY_MARGIN_SECS);
        debug!("Acquired CDSE token (expires_in={}s)", expires_in);

        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime as i64),
        });

        Ok(access_token)
    }

    /// Issue the search request with rate limiting and retry on 429/503
    async fn search_page(&self, params: &[(String, String)]) -> CatalogResult<serde_json::Value> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let token = self.access_token().await?;

        let mut retries = 0;
        loop {
            let result = self
                .http
                .get(&self.config.search_url)
                .bearer_auth(&token)
                .query(params)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if status == 429 || status == 503 {
                        if retries < limits::MAX_RETRIES {
                            retries += 1;
                            let delay = Duration::from_millis(
                                limits::RETRY_BASE_DELAY_MS * 2_u64.pow(retries),
                            );
                            warn!(
                                "Catalog busy (HTTP {}). Backing off for {}ms",
                                status,
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(if status == 429 {
                            CatalogError::RateLimitExceeded
                        } else {
                            CatalogError::Unavailable { status }
                        });
                    }

                    if !response.status().is_success() {
                        return Err(CatalogError::Unavailable { status });
                    }

                    return response.json().await.map_err(|e| {
                        CatalogError::InvalidResponse {
                            reason: format!("body was not valid JSON: {}", e),
                        }
                    });
                }
                Err(e) if e.is_timeout() => {
                    return Err(CatalogError::Timeout {
                        seconds: self.config.request_timeout_secs,
                    });
                }
                Err(e) if retries < limits::MAX_RETRIES => {
                    retries += 1;
                    let delay =
                        Duration::from_millis(limits::RETRY_BASE_DELAY_MS * 2_u64.pow(retries));
                    warn!(
                        "Catalog request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        limits::MAX_RETRIES,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(CatalogError::Http(e)),
            }
        }
    }

    fn bbox_param(&self, lat: f64, lon: f64) -> String {
        let margin = self.config.bbox_margin_deg;
        format!(
            "{},{},{},{}",
            lon - margin,
            lat - margin,
            lon + margin,
            lat + margin
        )
    }

    fn datetime_param(range: TimeRange) -> String {
        format!(
            "{}/{}",
            range.start.format("%Y-%m-%dT%H:%M:%SZ"),
            range.end.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

/// Convert a STAC feature collection into scene metadata records
///
/// Features without a usable datetime are skipped. The product identifier
/// prefers the Sentinel-1 SAFE name over the STAC item id, matching the
/// artifact the transfer client will fetch.
fn parse_features(body: &serde_json::Value) -> Vec<SceneMetadata> {
    let features = match body.get("features").and_then(|v| v.as_array()) {
        Some(features) => features,
        None => return Vec::new(),
    };

    let mut scenes = Vec::with_capacity(features.len());
    for feature in features {
        let props = feature.get("properties").cloned().unwrap_or_default();

        let dt_str = props
            .get("datetime")
            .or_else(|| props.get("start_datetime"))
            .or_else(|| props.get("end_datetime"))
            .and_then(|v| v.as_str());
        let acquisition_time = match dt_str.and_then(|s| s.parse::<DateTime<Utc>>().ok()) {
            Some(ts) => ts,
            None => {
                debug!("Skipping catalog feature without parsable datetime");
                continue;
            }
        };

        let id = props
            .get("s1:product_identifier")
            .or_else(|| props.get("s1:productIdentifier"))
            .and_then(|v| v.as_str())
            .or_else(|| feature.get("id").and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string();
        if id.is_empty() {
            continue;
        }

        let platform = props
            .get("platform")
            .or_else(|| props.get("platformSerialIdentifier"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let orbit_direction = props
            .get("sat:orbit_state")
            .or_else(|| props.get("s1:orbitDirection"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let relative_orbit = props
            .get("sat:relative_orbit")
            .or_else(|| props.get("s1:relativeOrbitNumber"))
            .and_then(|v| v.as_u64())
            .map(|n| n as u32);

        scenes.push(SceneMetadata {
            id,
            acquisition_time,
            platform,
            orbit_direction,
            relative_orbit,
        });
    }

    scenes
}

#[async_trait]
impl SceneCatalogClient for StacCatalogClient {
    async fn query(
        &self,
        lat: f64,
        lon: f64,
        range: TimeRange,
        order: SearchOrder,
    ) -> CatalogResult<Vec<SceneMetadata>> {
        let params = vec![
            ("collections".to_string(), self.config.collection.clone()),
            ("bbox".to_string(), self.bbox_param(lat, lon)),
            ("datetime".to_string(), Self::datetime_param(range)),
            ("limit".to_string(), self.config.query_limit.to_string()),
        ];

        let body = self.search_page(&params).await?;
        let mut scenes = parse_features(&body);

        // The server already filters by interval; keep the guard anyway so a
        // lax catalog cannot leak out-of-range scenes into selection.
        scenes.retain(|s| range.contains(s.acquisition_time));
        sort_scenes(&mut scenes, order);

        debug!(
            "Catalog query returned {} scenes (lat={:.3}, lon={:.3})",
            scenes.len(),
            lat,
            lon
        );
        Ok(scenes)
    }
}
