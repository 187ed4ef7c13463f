//! Main application orchestration: the probe/publish loop

use crate::{
    error::Result,
    logging::Logger,
    models::Config,
    probe::{Measurer, ServerSelector},
    publish::ResultPublisher,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Inter-cycle delay abstraction so tests can simulate elapsed cycles
/// without real waiting
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Main application struct that coordinates all components.
///
/// Two states: Idle between cycles and Running while one probe+publish cycle
/// is in progress. There is no terminal state under normal operation; only a
/// fatal error propagates out of [`App::run`].
pub struct App {
    config: Config,
    selector: Arc<dyn ServerSelector>,
    measurer: Arc<dyn Measurer>,
    publisher: ResultPublisher,
    sleeper: Box<dyn Sleeper>,
    logger: Logger,
}

impl App {
    /// Create a new application instance with all collaborators injected
    pub fn new(
        config: Config,
        selector: Arc<dyn ServerSelector>,
        measurer: Arc<dyn Measurer>,
        publisher: ResultPublisher,
        sleeper: Box<dyn Sleeper>,
        logger: &Logger,
    ) -> Self {
        Self {
            config,
            selector,
            measurer,
            publisher,
            sleeper,
            logger: logger.named("app"),
        }
    }

    /// Run the loop forever. Returns only on a fatal error.
    pub async fn run(&self) -> Result<()> {
        loop {
            self.run_cycle().await?;
            self.idle().await;
        }
    }

    /// Execute one full cycle: one probe+publish per configured server ID,
    /// or a single auto-selected run when no IDs are configured. Each run's
    /// failure is handled independently; only fatal errors propagate.
    pub async fn run_cycle(&self) -> Result<()> {
        if self.config.servers.is_empty() {
            self.run_one(&[]).await?;
        } else {
            for token in &self.config.servers {
                self.run_one(std::slice::from_ref(token)).await?;
            }
        }
        Ok(())
    }

    /// Log the wait and sleep for the configured delay
    pub async fn idle(&self) {
        self.logger.info(&format!(
            "Waiting {} seconds until next test",
            self.config.delay_seconds
        ));
        self.sleeper.sleep(self.config.delay()).await;
    }

    /// One probe+publish run against one server (or auto-selected when the
    /// token slice is empty)
    async fn run_one(&self, tokens: &[String]) -> Result<()> {
        match tokens.first() {
            Some(token) => self
                .logger
                .info(&format!("Starting speed test for server {}", token)),
            None => self
                .logger
                .info("Starting speed test with auto-selected server"),
        }

        let server = match self.selector.select_server(tokens).await {
            Ok(server) => server,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.logger.error(&format!("Server selection failed: {}", e));
                return Ok(());
            }
        };

        let result = match self.measurer.run_probe(&server).await {
            Ok(result) => result,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.logger.error(&format!("Probe failed: {}", e));
                return Ok(());
            }
        };

        self.publisher.publish(&result).await;

        self.logger.info(&format!(
            "Download: {}Mbps - Upload: {}Mbps - Latency: {}ms",
            result.download_mbps(),
            result.upload_mbps(),
            result.latency_ms
        ));

        Ok(())
    }
}
