//! Analysis backend abstraction.
//!
//! The controller talks to the backend only through [`AnalysisService`], so
//! any transport (or an in-memory fake in tests) can stand behind it.
//!
//! # Implementing a New Service
//!
//! 1. Implement [`AnalysisService`] for your client type
//! 2. Return the backend's raw JSON from [`AnalysisService::run`]; the
//!    [`ResultNormalizer`](crate::normalizer::ResultNormalizer) validates it
//! 3. Report transport and status failures through `anyhow::Error`

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{DatasetGroups, HttpAnalysisService};

use async_trait::async_trait;
use serde_json::Value;

use crate::types::AnalysisRequest;

/// Backend that executes analysis requests.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the controller shares one service
/// across concurrent submissions.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Run `request` and return the raw result document.
    ///
    /// Any error is reported to the user as a failed analysis.
    async fn run(&self, request: &AnalysisRequest) -> anyhow::Result<Value>;

    /// Short name used in log messages.
    fn name(&self) -> &str;
}
