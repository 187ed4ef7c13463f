//! HTTP speed test provider
//!
//! Thin client for a speedtest.net-style provider: global configuration,
//! server discovery, latency probing and timed transfer measurement. The
//! endpoints are constructor parameters so integration tests can point the
//! provider at a local mock.

use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::models::{SpeedTestResult, TestServer};
use crate::probe::{Measurer, ServerSelector};
use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

/// Sentinel latency assigned to candidates that fail every probe; keeps them
/// selectable when no candidate responds, matching provider convention.
const LATENCY_SENTINEL_MS: f64 = 3_600_000.0;

/// Latency probes per candidate server; the best sample wins
const LATENCY_PROBES: u32 = 3;

/// Candidate pool size when auto-selecting by distance
const CANDIDATE_POOL: usize = 5;

/// Payload sizes for the download measurement (random<N>x<N>.jpg)
const DOWNLOAD_SIZES: &[u32] = &[350, 500, 750, 1000];

/// Payload sizes in bytes for the upload measurement
const UPLOAD_SIZES: &[usize] = &[131_072, 262_144, 524_288];

/// Client coordinates from the provider's global configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientLocation {
    pub lat: f64,
    pub lon: f64,
}

/// HTTP implementation of [`ServerSelector`] and [`Measurer`]
pub struct SpeedtestProvider {
    client: Client,
    config_url: String,
    servers_url: String,
    location: OnceCell<ClientLocation>,
    logger: Logger,
}

impl SpeedtestProvider {
    /// Create a provider against the default public endpoints
    pub fn new(logger: &Logger) -> Result<Self> {
        Self::with_endpoints(
            logger,
            crate::defaults::DEFAULT_PROVIDER_CONFIG_URL,
            crate::defaults::DEFAULT_PROVIDER_SERVERS_URL,
        )
    }

    /// Create a provider against explicit endpoints
    pub fn with_endpoints(logger: &Logger, config_url: &str, servers_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("speedtest-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config_url: config_url.to_string(),
            servers_url: servers_url.to_string(),
            location: OnceCell::new(),
            logger: logger.named("probe"),
        })
    }

    /// Fetch (and cache) the provider's global configuration.
    ///
    /// Failure is fatal: every future cycle would fail identically, so the
    /// error propagates out of the orchestration loop.
    pub async fn client_location(&self) -> Result<ClientLocation> {
        self.location
            .get_or_try_init(|| async {
                self.logger.debug("Fetching provider global configuration");
                let body = self
                    .client
                    .get(&self.config_url)
                    .send()
                    .await
                    .map_err(|e| AppError::provider_config(e.to_string()))?
                    .error_for_status()
                    .map_err(|e| AppError::provider_config(e.to_string()))?
                    .text()
                    .await
                    .map_err(|e| AppError::provider_config(e.to_string()))?;

                parse_client_location(&body)
            })
            .await
            .copied()
    }

    /// Fetch the provider's server list
    async fn fetch_servers(&self) -> Result<Vec<TestServer>> {
        self.logger.debug("Fetching provider server list");
        let body = self
            .client
            .get(&self.servers_url)
            .send()
            .await
            .map_err(|e| AppError::servers_unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::servers_unavailable(e.to_string()))?
            .text()
            .await
            .map_err(|e| AppError::servers_unavailable(e.to_string()))?;

        let servers = parse_server_list(&body);
        if servers.is_empty() {
            return Err(AppError::servers_unavailable(
                "provider returned an empty server list",
            ));
        }
        Ok(servers)
    }

    /// Measure HTTP latency against one candidate; best of [`LATENCY_PROBES`]
    async fn measure_latency(&self, server: &TestServer) -> f64 {
        let url = server.latency_url();
        let mut best = LATENCY_SENTINEL_MS;

        for _ in 0..LATENCY_PROBES {
            let start = Instant::now();
            let outcome = self
                .client
                .get(&url)
                .timeout(Duration::from_secs(5))
                .send()
                .await;

            match outcome {
                Ok(response) if response.status().is_success() => {
                    let elapsed = start.elapsed().as_secs_f64() * 1000.0;
                    if elapsed < best {
                        best = elapsed;
                    }
                }
                _ => {}
            }
        }

        best
    }

    /// Timed download measurement over the provider's payload objects
    async fn measure_download(&self, server: &TestServer) -> Result<f64> {
        let base = server.base_url();
        let mut total_bytes: u64 = 0;
        let start = Instant::now();

        for size in DOWNLOAD_SIZES {
            let url = format!("{}/random{}x{}.jpg", base, size, size);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| AppError::measurement(format!("download request failed: {}", e)))?
                .error_for_status()
                .map_err(|e| AppError::measurement(format!("download request failed: {}", e)))?;

            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::measurement(format!("download stream failed: {}", e)))?;
                total_bytes += chunk.len() as u64;
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return Err(AppError::measurement("download finished in zero time"));
        }

        Ok(total_bytes as f64 * 8.0 / elapsed)
    }

    /// Timed upload measurement posting generated payloads
    async fn measure_upload(&self, server: &TestServer) -> Result<f64> {
        let mut total_bytes: u64 = 0;
        let start = Instant::now();

        for size in UPLOAD_SIZES {
            let payload = upload_payload(*size);
            self.client
                .post(&server.url)
                .header("Content-Type", "application/octet-stream")
                .body(payload)
                .send()
                .await
                .map_err(|e| AppError::measurement(format!("upload request failed: {}", e)))?
                .error_for_status()
                .map_err(|e| AppError::measurement(format!("upload request failed: {}", e)))?;

            total_bytes += *size as u64;
        }

        let elapsed = start.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return Err(AppError::measurement("upload finished in zero time"));
        }

        Ok(total_bytes as f64 * 8.0 / elapsed)
    }
}

#[async_trait]
impl ServerSelector for SpeedtestProvider {
    async fn select_server(&self, server_ids: &[String]) -> Result<TestServer> {
        let location = self.client_location().await?;
        let ids = parse_server_ids(server_ids)?;
        let servers = self.fetch_servers().await?;
        let mut candidates = rank_candidates(servers, location, &ids)?;

        for candidate in &mut candidates {
            candidate.latency_ms = self.measure_latency(candidate).await;
            self.logger.debug(&format!(
                "Candidate {} ({}) latency {:.1} ms",
                candidate.id, candidate.name, candidate.latency_ms
            ));
        }

        let best = candidates
            .into_iter()
            .min_by(|a, b| a.latency_ms.total_cmp(&b.latency_ms))
            .ok_or_else(|| AppError::no_matched_servers(server_ids.join(", ")))?;

        self.logger.info(&format!(
            "Selected server {} in {} ({})",
            best.id, best.name, best.sponsor
        ));

        Ok(best)
    }
}

#[async_trait]
impl Measurer for SpeedtestProvider {
    async fn run_probe(&self, server: &TestServer) -> Result<SpeedTestResult> {
        self.logger.info("Starting download test");
        let download_bps = self.measure_download(server).await?;

        self.logger.info("Starting upload test");
        let upload_bps = self.measure_upload(server).await?;

        Ok(SpeedTestResult {
            download_bps,
            upload_bps,
            latency_ms: server.latency_ms,
            server: server.clone(),
        })
    }
}

/// Extract the client coordinates from the provider configuration document
fn parse_client_location(body: &str) -> Result<ClientLocation> {
    let client_tag = Regex::new(r"<client\s+([^>]*?)/?>")
        .expect("static regex")
        .captures(body)
        .ok_or_else(|| AppError::provider_config("configuration has no <client> element"))?;

    let attrs = parse_attributes(&client_tag[1]);
    let lat = attr_f64(&attrs, "lat")?;
    let lon = attr_f64(&attrs, "lon")?;

    Ok(ClientLocation { lat, lon })
}

/// Extract server records from the provider's server-list document.
/// Malformed entries are skipped rather than failing the whole list.
fn parse_server_list(body: &str) -> Vec<TestServer> {
    let server_tag = Regex::new(r"<server\s+([^>]*?)/?>").expect("static regex");

    server_tag
        .captures_iter(body)
        .filter_map(|captures| {
            let attrs = parse_attributes(&captures[1]);
            Some(TestServer {
                id: attrs.get("id")?.parse().ok()?,
                name: attrs.get("name")?.clone(),
                country: attrs.get("country")?.clone(),
                sponsor: attrs.get("sponsor").cloned().unwrap_or_default(),
                host: attrs.get("host").cloned().unwrap_or_default(),
                url: attrs.get("url")?.clone(),
                lat: attrs.get("lat")?.parse().ok()?,
                lon: attrs.get("lon")?.parse().ok()?,
                distance_km: None,
                latency_ms: 0.0,
            })
        })
        .collect()
}

/// Parse `key="value"` attribute pairs out of a tag body
fn parse_attributes(tag_body: &str) -> HashMap<String, String> {
    let attr = Regex::new(r#"(\w+)="([^"]*)""#).expect("static regex");
    attr.captures_iter(tag_body)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

fn attr_f64(attrs: &HashMap<String, String>, key: &str) -> Result<f64> {
    attrs
        .get(key)
        .ok_or_else(|| AppError::provider_config(format!("configuration is missing '{}'", key)))?
        .parse()
        .map_err(|e| AppError::provider_config(format!("invalid '{}' attribute: {}", key, e)))
}

/// Validate the configured ID tokens. Each must be a positive integer.
fn parse_server_ids(tokens: &[String]) -> Result<Vec<u32>> {
    let mut ids = Vec::with_capacity(tokens.len());
    for token in tokens {
        let id: u32 = token
            .trim()
            .parse()
            .map_err(|_| AppError::invalid_server_id(token.clone()))?;
        if id == 0 {
            return Err(AppError::invalid_server_id(token.clone()));
        }
        ids.push(id);
    }
    Ok(ids)
}

/// Restrict and rank the server list to the candidates worth latency-probing.
///
/// With explicit IDs the candidates are exactly the matching servers; when
/// auto-selecting, the closest [`CANDIDATE_POOL`] servers by great-circle
/// distance are kept.
fn rank_candidates(
    servers: Vec<TestServer>,
    location: ClientLocation,
    ids: &[u32],
) -> Result<Vec<TestServer>> {
    let mut candidates: Vec<TestServer> = servers
        .into_iter()
        .filter(|s| ids.is_empty() || ids.contains(&s.id))
        .map(|mut s| {
            s.distance_km = Some(haversine_km(location.lat, location.lon, s.lat, s.lon));
            s
        })
        .collect();

    if candidates.is_empty() {
        return Err(AppError::no_matched_servers(
            ids.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }

    candidates.sort_by(|a, b| {
        a.distance_km
            .unwrap_or(f64::MAX)
            .total_cmp(&b.distance_km.unwrap_or(f64::MAX))
    });
    if ids.is_empty() {
        candidates.truncate(CANDIDATE_POOL);
    }

    Ok(candidates)
}

/// Great-circle distance between two coordinates in kilometers
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Deterministic filler payload for upload measurement
fn upload_payload(size: usize) -> Vec<u8> {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..size).map(|i| ALPHABET[i % ALPHABET.len()]).collect()
}
