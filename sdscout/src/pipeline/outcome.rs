//! Per-candidate outcomes and per-run results.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::crawl::Admission;
use crate::document::ProbeOutcome;
use crate::errors::{ExtractFailure, FetchFailure};
use crate::report::Report;

/// Terminal state of one candidate URL.
///
/// Every variant except [`CandidateOutcome::Promoted`] means the candidate
/// was skipped and the crawl moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// The URL has no host.
    Invalid,
    /// A skip-list term matched.
    Filtered {
        /// The matching term.
        term: String,
    },
    /// The visit ledger refused the URL or its domain.
    OverBudget(Admission),
    /// The probe did not classify the URL as a PDF.
    ProbeRejected(ProbeOutcome),
    /// The download failed.
    FetchFailed(FetchFailure),
    /// Text extraction failed; the download was deleted.
    ExtractFailed(ExtractFailure),
    /// Verification failed; the download was deleted.
    Rejected {
        /// Constraints that did not match.
        missing: Vec<String>,
    },
    /// Verified but could not be moved into verified storage; the download was deleted.
    PromotionFailed(String),
    /// Verified and moved into verified storage.
    Promoted {
        /// Location in verified storage.
        path: PathBuf,
    },
}

impl CandidateOutcome {
    /// Event type emitted for this outcome.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Invalid => "candidate.invalid",
            Self::Filtered { .. } => "candidate.filtered",
            Self::OverBudget(_) => "candidate.over_budget",
            Self::ProbeRejected(_) => "candidate.probe_rejected",
            Self::FetchFailed(_) => "candidate.fetch_failed",
            Self::ExtractFailed(_) => "document.extract_failed",
            Self::Rejected { .. } => "document.rejected",
            Self::PromotionFailed(_) => "document.promotion_failed",
            Self::Promoted { .. } => "document.promoted",
        }
    }

    /// Machine-readable failure kind, for outcomes that carry one.
    #[must_use]
    pub fn failure_kind(&self) -> Option<&'static str> {
        match self {
            Self::FetchFailed(failure) => Some(failure.kind()),
            _ => None,
        }
    }

    /// Returns true for [`CandidateOutcome::Promoted`].
    #[must_use]
    pub fn is_promoted(&self) -> bool {
        matches!(self, Self::Promoted { .. })
    }
}

impl fmt::Display for CandidateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => f.write_str("not an absolute URL with a host"),
            Self::Filtered { term } => write!(f, "matches skip term '{term}'"),
            Self::OverBudget(Admission::UrlExhausted) => f.write_str("URL visit limit reached"),
            Self::OverBudget(_) => f.write_str("domain visit limit reached"),
            Self::ProbeRejected(probe) => write!(f, "probe rejected: {probe:?}"),
            Self::FetchFailed(err) => write!(f, "{err}"),
            Self::ExtractFailed(err) => write!(f, "{err}"),
            Self::Rejected { missing } => write!(f, "missing {}", missing.join(", ")),
            Self::PromotionFailed(err) => write!(f, "promotion failed: {err}"),
            Self::Promoted { path } => write!(f, "promoted to {}", path.display()),
        }
    }
}

/// Counters for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Requests taken up.
    pub identifiers: usize,
    /// Requests skipped as empty or invalid.
    pub skipped_identifiers: usize,
    /// Requests whose search failed.
    pub search_failures: usize,
    /// Candidate URLs examined.
    pub candidates: usize,
    /// Candidates without a host.
    pub invalid: usize,
    /// Candidates removed by the skip-list.
    pub filtered: usize,
    /// Candidates refused by the visit ledger.
    pub over_budget: usize,
    /// Candidates the probe did not accept.
    pub probe_rejected: usize,
    /// Downloads that failed.
    pub fetch_failed: usize,
    /// Successful downloads.
    pub downloaded: usize,
    /// Downloads deleted after failed extraction or verification.
    pub discarded: usize,
    /// Documents promoted.
    pub promoted: usize,
}

impl RunStats {
    /// Counts one candidate outcome.
    pub fn record(&mut self, outcome: &CandidateOutcome) {
        self.candidates += 1;
        match outcome {
            CandidateOutcome::Invalid => self.invalid += 1,
            CandidateOutcome::Filtered { .. } => self.filtered += 1,
            CandidateOutcome::OverBudget(_) => self.over_budget += 1,
            CandidateOutcome::ProbeRejected(_) => self.probe_rejected += 1,
            CandidateOutcome::FetchFailed(_) => self.fetch_failed += 1,
            CandidateOutcome::ExtractFailed(_)
            | CandidateOutcome::Rejected { .. }
            | CandidateOutcome::PromotionFailed(_) => {
                self.downloaded += 1;
                self.discarded += 1;
            }
            CandidateOutcome::Promoted { .. } => {
                self.downloaded += 1;
                self.promoted += 1;
            }
        }
    }
}

/// Everything an invocation produces.
#[derive(Debug, Clone)]
pub struct ScoutOutcome {
    /// Identifier of this invocation.
    pub run_id: Uuid,
    /// Promoted documents, in promotion order.
    pub report: Report,
    /// Where the report was persisted; `None` when empty or when writing failed.
    pub log_file: Option<PathBuf>,
    /// Counters.
    pub stats: RunStats,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}
