//! Result publishing: time-series store writes and webhook notifications
//!
//! The two side effects run strictly in sequence and fail independently; a
//! store failure never suppresses the webhook attempt and vice versa. Neither
//! failure escapes the publisher — the result is simply dropped for this
//! cycle and the loop continues.

pub mod influx;
pub mod webhook;

pub use influx::InfluxWriter;
pub use webhook::WebhookNotifier;

use crate::error::Result;
use crate::logging::Logger;
use crate::models::SpeedTestResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Measurement name every result point is written under
pub const MEASUREMENT_NAME: &str = "speed_test_results";

/// A single time-series data point
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: Vec<(String, String)>,
    pub fields: Vec<(String, f64)>,
}

impl Point {
    /// Render the point in line protocol
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_measurement(&self.measurement);

        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }

        line.push(' ');
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}", escape_tag(key), value))
            .collect();
        line.push_str(&fields.join(","));

        line
    }
}

fn escape_measurement(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Writes points to the time-series store
#[async_trait]
pub trait PointWriter: Send + Sync {
    /// Write one point. Implementations may perform store-specific recovery
    /// (such as creating a missing database) but never retry more than once.
    async fn write_point(&self, point: &Point) -> Result<()>;
}

/// Sends summarized results to the notification webhook
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, result: &SpeedTestResult) -> Result<()>;
}

/// Formats probe results and drives the two publication side effects
pub struct ResultPublisher {
    writer: Arc<dyn PointWriter>,
    notifier: Option<Arc<dyn Notifier>>,
    logger: Logger,
}

impl ResultPublisher {
    /// Create a publisher. Passing `None` for the notifier disables webhook
    /// publishing (no webhook key configured).
    pub fn new(
        writer: Arc<dyn PointWriter>,
        notifier: Option<Arc<dyn Notifier>>,
        logger: &Logger,
    ) -> Self {
        Self {
            writer,
            notifier,
            logger: logger.named("publisher"),
        }
    }

    /// Build the store point for one probe result
    pub fn build_point(result: &SpeedTestResult) -> Point {
        Point {
            measurement: MEASUREMENT_NAME.to_string(),
            tags: vec![
                ("server".to_string(), result.server.id.to_string()),
                ("server_name".to_string(), result.server.name.clone()),
                ("server_country".to_string(), result.server.country.clone()),
            ],
            fields: vec![
                ("download".to_string(), result.download_bps),
                ("upload".to_string(), result.upload_bps),
                ("ping".to_string(), result.latency_ms),
            ],
        }
    }

    /// Publish one result: store write first, then webhook notification.
    /// Both failures are logged and swallowed; the result is dropped.
    pub async fn publish(&self, result: &SpeedTestResult) {
        let point = Self::build_point(result);
        self.logger
            .debug(&format!("Point: {}", point.to_line_protocol()));

        match self.writer.write_point(&point).await {
            Ok(()) => self.logger.debug("Data written to the store"),
            Err(e) => self
                .logger
                .error(&format!("Failed to write to the store: {}", e)),
        }

        if let Some(notifier) = &self.notifier {
            match notifier.notify(result).await {
                Ok(()) => self.logger.debug("Data written to the webhook"),
                Err(e) => self
                    .logger
                    .error(&format!("Failed to write to the webhook: {}", e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestServer;

    fn sample_result() -> SpeedTestResult {
        SpeedTestResult {
            download_bps: 93_457_812.5,
            upload_bps: 10_218_000.0,
            latency_ms: 18.345,
            server: TestServer {
                id: 1234,
                name: "New York, NY".to_string(),
                country: "United States".to_string(),
                sponsor: "ExampleNet".to_string(),
                host: "nyc.example.net:8080".to_string(),
                url: "http://nyc.example.net/speedtest/upload.php".to_string(),
                lat: 40.7,
                lon: -74.0,
                distance_km: Some(5.0),
                latency_ms: 18.345,
            },
        }
    }

    #[test]
    fn test_build_point_shape() {
        let point = ResultPublisher::build_point(&sample_result());

        assert_eq!(point.measurement, "speed_test_results");
        assert_eq!(
            point.tags,
            vec![
                ("server".to_string(), "1234".to_string()),
                ("server_name".to_string(), "New York, NY".to_string()),
                ("server_country".to_string(), "United States".to_string()),
            ]
        );
        assert_eq!(point.fields.len(), 3);
        assert_eq!(point.fields[0], ("download".to_string(), 93_457_812.5));
        assert_eq!(point.fields[1], ("upload".to_string(), 10_218_000.0));
        assert_eq!(point.fields[2], ("ping".to_string(), 18.345));
    }

    #[test]
    fn test_line_protocol_escaping() {
        let point = ResultPublisher::build_point(&sample_result());
        let line = point.to_line_protocol();

        assert!(line.starts_with("speed_test_results,server=1234,"));
        assert!(line.contains("server_name=New\\ York\\,\\ NY"));
        assert!(line.contains("server_country=United\\ States"));
        assert!(line.contains("download=93457812.5"));
        assert!(line.contains("ping=18.345"));
        // Exactly one unescaped space separates tags from fields
        assert_eq!(line.replace("\\ ", "").matches(' ').count(), 1);
    }

    #[test]
    fn test_tag_escaping() {
        assert_eq!(escape_tag("a b"), "a\\ b");
        assert_eq!(escape_tag("a,b"), "a\\,b");
        assert_eq!(escape_tag("a=b"), "a\\=b");
        assert_eq!(escape_tag("plain"), "plain");
    }
}
