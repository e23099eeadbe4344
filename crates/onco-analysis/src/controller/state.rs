//! Controller state machine and request-generation tokens.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Why the last analysis did not produce a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The service call failed (network or non-2xx status).
    RequestFailed,
    /// The payload lacked the fields its analysis type requires.
    MissingData,
    /// The chart could not be drawn on its surface.
    RenderFailed,
}

impl ErrorKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RequestFailed => "Request Failed",
            Self::MissingData => "Missing Data",
            Self::RenderFailed => "Render Failed",
        }
    }
}

/// Lifecycle of the analysis view.
///
/// ```text
/// Idle ──submit──▶ Loading ──▶ Rendered
///                    ▲    └──▶ Failed(kind)
///                    └── resubmit from any state
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Loading { generation: u64 },
    Rendered,
    Failed { kind: ErrorKind },
}

impl AnalysisState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind } => Some(*kind),
            _ => None,
        }
    }
}

/// Proof of one accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Monotonically increasing submission counter.
///
/// Clones share the counter. Only the most recently issued ticket is
/// current; responses carrying any older ticket are stale.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    latest: Arc<AtomicU64>,
}

static_assertions::assert_impl_all!(RequestGeneration: Send, Sync);

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, invalidating every earlier one.
    pub fn next(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Invalidate every issued ticket without issuing a new one.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// What happened to a completed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Rendered,
    Failed { kind: ErrorKind },
    /// A newer submission was made before this response arrived; the
    /// response was discarded.
    Superseded,
}
