//! Speed test probing: server selection and measurement
//!
//! The speed-test capability is an external collaborator. These traits are
//! the narrow seams the orchestrator talks through; [`SpeedtestProvider`] is
//! the HTTP implementation and tests substitute doubles.

pub mod provider;

pub use provider::SpeedtestProvider;

use crate::error::Result;
use crate::models::{SpeedTestResult, TestServer};
use async_trait::async_trait;

/// Resolves a concrete best server for one probe run
#[async_trait]
pub trait ServerSelector: Send + Sync {
    /// Select the best server for this run.
    ///
    /// An empty `server_ids` slice means "discover and pick the
    /// lowest-latency server"; otherwise the candidate list is restricted to
    /// the given IDs, each of which must be a positive integer.
    async fn select_server(&self, server_ids: &[String]) -> Result<TestServer>;
}

/// Executes the download/upload measurement against a selected server
#[async_trait]
pub trait Measurer: Send + Sync {
    /// Run the probe. Latency was already measured during selection; this
    /// performs the download measurement, then the upload measurement,
    /// sequentially. No retry is attempted on failure.
    async fn run_probe(&self, server: &TestServer) -> Result<SpeedTestResult>;
}
