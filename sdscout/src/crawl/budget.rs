//! Visit and download quotas.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::config::BudgetConfig;

/// Result of asking the ledger for a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Both counters were below their ceilings and have been incremented.
    Admitted,
    /// The URL has reached its ceiling.
    UrlExhausted,
    /// The domain has reached its ceiling.
    DomainExhausted,
}

impl Admission {
    /// Returns true for [`Admission::Admitted`].
    #[must_use]
    pub fn is_admitted(self) -> bool {
        matches!(self, Self::Admitted)
    }
}

#[derive(Debug, Default)]
struct VisitCounts {
    urls: HashMap<String, u32>,
    domains: HashMap<String, u32>,
}

/// Per-URL and per-domain visit counters with fixed ceilings.
///
/// Counters only grow. A ledger is either owned by one invocation or shared
/// behind an `Arc` by every invocation of a scout; the mutex keeps the
/// check-then-increment of both counters atomic in the shared case.
#[derive(Debug)]
pub struct VisitLedger {
    max_url_visits: u32,
    max_domain_visits: u32,
    counts: Mutex<VisitCounts>,
}

impl Default for VisitLedger {
    fn default() -> Self {
        Self::from_config(&BudgetConfig::default())
    }
}

impl VisitLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(max_url_visits: u32, max_domain_visits: u32) -> Self {
        Self {
            max_url_visits,
            max_domain_visits,
            counts: Mutex::new(VisitCounts::default()),
        }
    }

    /// Creates an empty ledger with the configured ceilings.
    #[must_use]
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.max_url_visits, config.max_domain_visits)
    }

    /// Admits a visit, incrementing both counters, unless either is exhausted.
    pub fn admit(&self, url: &str, domain: &str) -> Admission {
        let mut counts = self.counts.lock();
        if counts.urls.get(url).copied().unwrap_or(0) >= self.max_url_visits {
            return Admission::UrlExhausted;
        }
        if counts.domains.get(domain).copied().unwrap_or(0) >= self.max_domain_visits {
            return Admission::DomainExhausted;
        }
        *counts.urls.entry(url.to_string()).or_insert(0) += 1;
        *counts.domains.entry(domain.to_string()).or_insert(0) += 1;
        Admission::Admitted
    }

    /// Current count for a URL.
    #[must_use]
    pub fn url_visits(&self, url: &str) -> u32 {
        self.counts.lock().urls.get(url).copied().unwrap_or(0)
    }

    /// Current count for a domain.
    #[must_use]
    pub fn domain_visits(&self, domain: &str) -> u32 {
        self.counts.lock().domains.get(domain).copied().unwrap_or(0)
    }

    /// Raises a domain's count to its ceiling, excluding it from now on.
    pub fn exhaust_domain(&self, domain: &str) {
        self.counts
            .lock()
            .domains
            .insert(domain.to_string(), self.max_domain_visits);
    }
}

/// Successful downloads allowed in one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadBudget {
    limit: u32,
    used: u32,
}

impl DownloadBudget {
    /// Creates a budget with nothing used.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    /// Records one successful download.
    pub fn record_download(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    /// Returns true once the limit is reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    /// Downloads recorded so far.
    #[must_use]
    pub fn used(&self) -> u32 {
        self.used
    }
}
