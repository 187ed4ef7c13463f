//! InfluxDB HTTP client
//!
//! Speaks the store's HTTP API directly: `/ping` for the startup
//! connectivity check, `/write` for line-protocol points and `/query` for the
//! create-database recovery.

use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::models::Config;
use crate::publish::{Point, PointWriter};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Timeout for the connectivity check and store requests
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the time-series store
pub struct InfluxWriter {
    client: Client,
    base_url: String,
    address: String,
    database: String,
    credentials: Option<(String, String)>,
    logger: Logger,
}

impl InfluxWriter {
    /// Create a writer from the application configuration
    pub fn new(config: &Config, logger: &Logger) -> Result<Self> {
        Self::with_base_url(
            &config.store_url(),
            &config.influx_address,
            &config.influx_database,
            config.influx_user.clone().zip(config.influx_password.clone()),
            config.influx_verify_ssl,
            logger,
        )
    }

    /// Create a writer against an explicit base URL (used by tests)
    pub fn with_base_url(
        base_url: &str,
        address: &str,
        database: &str,
        credentials: Option<(String, String)>,
        verify_ssl: bool,
        logger: &Logger,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(STORE_TIMEOUT)
            .danger_accept_invalid_certs(!verify_ssl)
            .user_agent(concat!("speedtest-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            address: address.to_string(),
            database: database.to_string(),
            credentials,
            logger: logger.named("store"),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    /// Verify reachability and credentials of the store.
    ///
    /// Called once at startup, before any probe runs. Every failure here is
    /// fatal; the three causes carry distinct diagnostics.
    pub async fn connect(&self) -> Result<()> {
        self.logger
            .debug("Testing connection to the store using provided credentials");

        let response = self
            .request(self.client.get(format!("{}/ping", self.base_url)))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AppError::store_unreachable(self.address.clone())
                } else {
                    AppError::store_connect(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::store_auth_rejected(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(AppError::store_connect(format!(
                "unexpected status HTTP {}",
                status
            )));
        }

        self.logger.debug("Successful connection to the store");
        Ok(())
    }

    /// Create the configured database
    pub async fn create_database(&self) -> Result<()> {
        let response = self
            .request(self.client.post(format!("{}/query", self.base_url)))
            .form(&[("q", format!("CREATE DATABASE \"{}\"", self.database))])
            .send()
            .await
            .map_err(|e| AppError::store_write(format!("create database failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::store_write(format!(
                "create database failed: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// One raw write attempt; classifies the missing-database signal
    async fn try_write(&self, line: &str) -> std::result::Result<(), WriteFailure> {
        let response = self
            .request(
                self.client
                    .post(format!("{}/write", self.base_url))
                    .query(&[("db", self.database.as_str())]),
            )
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line.to_string())
            .send()
            .await
            .map_err(|e| WriteFailure::Other(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND || body.contains("database not found") {
            Err(WriteFailure::DatabaseMissing)
        } else {
            Err(WriteFailure::Other(format!("HTTP {}: {}", status, body.trim())))
        }
    }
}

/// Internal classification of a failed write attempt
enum WriteFailure {
    /// The store reported the target database does not exist
    DatabaseMissing,
    /// Any other transport or server failure
    Other(String),
}

#[async_trait]
impl PointWriter for InfluxWriter {
    /// Write one point. A missing database is created and the write retried
    /// exactly once; the retry's own failure is reported without further
    /// retries. Any other failure is reported immediately.
    async fn write_point(&self, point: &Point) -> Result<()> {
        let line = point.to_line_protocol();

        match self.try_write(&line).await {
            Ok(()) => Ok(()),
            Err(WriteFailure::DatabaseMissing) => {
                self.logger.error(&format!(
                    "Database {} does not exist, attempting to create",
                    self.database
                ));
                self.create_database().await?;
                self.try_write(&line).await.map_err(|failure| match failure {
                    WriteFailure::DatabaseMissing => {
                        AppError::store_write("database still missing after creation".to_string())
                    }
                    WriteFailure::Other(message) => AppError::store_write(message),
                })
            }
            Err(WriteFailure::Other(message)) => Err(AppError::store_write(message)),
        }
    }
}
