//! Probe result data models

use serde::{Deserialize, Serialize};

/// A speed test server as advertised by the provider's server list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestServer {
    /// Provider-assigned server identifier
    pub id: u32,

    /// Server name (usually the nearest city)
    pub name: String,

    /// Country the server is located in
    pub country: String,

    /// Organization operating the server
    pub sponsor: String,

    /// Host:port endpoint
    pub host: String,

    /// Upload endpoint URL; other probe URLs derive from this
    pub url: String,

    /// Server latitude
    pub lat: f64,

    /// Server longitude
    pub lon: f64,

    /// Great-circle distance from the client, filled in during selection
    pub distance_km: Option<f64>,

    /// Measured HTTP latency, filled in during selection
    pub latency_ms: f64,
}

impl TestServer {
    /// Base URL for probe requests, derived from the upload endpoint
    pub fn base_url(&self) -> String {
        match self.url.rsplit_once('/') {
            Some((base, _)) => base.to_string(),
            None => self.url.clone(),
        }
    }

    /// URL of the small latency probe object
    pub fn latency_url(&self) -> String {
        format!("{}/latency.txt", self.base_url())
    }
}

/// The outcome of one probe run: latency plus download and upload throughput.
///
/// Immutable once produced; consumed by the publisher and then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestResult {
    /// Download throughput in bits per second
    pub download_bps: f64,

    /// Upload throughput in bits per second
    pub upload_bps: f64,

    /// Latency in milliseconds, measured during server selection
    pub latency_ms: f64,

    /// The server the probe ran against
    pub server: TestServer,
}

impl SpeedTestResult {
    /// Download throughput in Mbps, rounded to 2 decimal places
    pub fn download_mbps(&self) -> f64 {
        round2(self.download_bps / 1_000_000.0)
    }

    /// Upload throughput in Mbps, rounded to 2 decimal places
    pub fn upload_mbps(&self) -> f64 {
        round2(self.upload_bps / 1_000_000.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
