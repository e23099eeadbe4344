//! Error types for the analysis pipeline.
//!
//! The taxonomy mirrors how each failure is surfaced:
//!
//! - [`AnalysisError::Validation`] - the request form is incomplete; shown inline, no network call.
//! - [`AnalysisError::RequestFailed`] - the analysis service failed; shown as a generic message.
//! - [`AnalysisError::MissingData`] - the payload lacks fields for its kind; logged only.
//! - [`AnalysisError::DegenerateInput`] - a statistic is undefined for the input; the derived
//!   value is omitted from the chart, never reported as a failure.
//!
//! Errors are serializable so a UI layer can receive them as `{code, message}`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// Message shown to the user for any service failure.
pub const REQUEST_FAILED_MESSAGE: &str = "Failed to run analysis";

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The analysis request is malformed or incomplete.
    #[error("Invalid analysis request: {0}")]
    Validation(String),

    /// The analysis service call failed (network error or non-2xx status).
    #[error("Analysis request failed: {0}")]
    RequestFailed(String),

    /// The result payload lacks the fields required for its declared kind.
    #[error("Missing data in analysis result: {0}")]
    MissingData(String),

    /// Too few points or zero variance for a statistic.
    #[error("Degenerate statistical input: {0}")]
    DegenerateInput(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// No drawing surface is mounted under the given chart id.
    #[error("No drawing surface mounted for chart '{0}'")]
    SurfaceNotFound(String),

    /// A chart could not be drawn or exported.
    #[error("Render error: {0}")]
    Render(String),

    /// Chart data could not be exported.
    #[error("Export error: {0}")]
    Export(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error (only with the "http" feature).
    #[cfg(feature = "http")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for UI handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::RequestFailed(_) => "REQUEST_FAILED",
            Self::MissingData(_) => "MISSING_DATA",
            Self::DegenerateInput(_) => "DEGENERATE_INPUT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SurfaceNotFound(_) => "SURFACE_NOT_FOUND",
            Self::Render(_) => "RENDER_ERROR",
            Self::Export(_) => "EXPORT_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "http")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The text to show the user, if this error is user-visible at all.
    ///
    /// `MissingData` and `DegenerateInput` are never shown; the chart is
    /// left cleared or the affected statistic is annotated instead.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(msg) => Some(msg.clone()),
            Self::RequestFailed(_) => Some(REQUEST_FAILED_MESSAGE.to_string()),
            #[cfg(feature = "http")]
            Self::HttpRequest(_) => Some(REQUEST_FAILED_MESSAGE.to_string()),
            Self::MissingData(_) | Self::DegenerateInput(_) => None,
            Self::WithContext { source, .. } => source.user_message(),
            _ => Some(self.to_string()),
        }
    }

    /// Check if this error is a statistical degeneracy.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::DegenerateInput(_) => true,
            Self::WithContext { source, .. } => source.is_degenerate(),
            _ => false,
        }
    }

    /// Check if recovery is possible by resubmitting the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::RequestFailed(_) | Self::MissingData(_)
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl From<std::fmt::Error> for AnalysisError {
    fn from(_: std::fmt::Error) -> Self {
        AnalysisError::Render("failed to format chart output".to_string())
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(e: csv::Error) -> Self {
        AnalysisError::Export(format!("CSV: {e}"))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_json::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Json(e).with_context(context))
    }
}
