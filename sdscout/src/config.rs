//! Top-level configuration for a [`Scout`](crate::pipeline::Scout).
//!
//! Every section deserializes with defaults, so a configuration file only
//! needs to name the values it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ScoutError;
use crate::websearch::{FetchConfig, SearchConfig};

/// Crawl quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// How many times a single URL may be admitted.
    #[serde(default = "default_visit_ceiling")]
    pub max_url_visits: u32,
    /// How many times a single domain may be admitted.
    #[serde(default = "default_visit_ceiling")]
    pub max_domain_visits: u32,
    /// Successful downloads allowed per invocation.
    #[serde(default = "default_download_limit")]
    pub download_limit: u32,
}

fn default_visit_ceiling() -> u32 {
    5
}

fn default_download_limit() -> u32 {
    5
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_url_visits: default_visit_ceiling(),
            max_domain_visits: default_visit_ceiling(),
            download_limit: default_download_limit(),
        }
    }
}

impl BudgetConfig {
    /// Sets the download limit.
    #[must_use]
    pub fn with_download_limit(mut self, limit: u32) -> Self {
        self.download_limit = limit;
        self
    }

    /// Sets both visit ceilings.
    #[must_use]
    pub fn with_visit_ceiling(mut self, ceiling: u32) -> Self {
        self.max_url_visits = ceiling;
        self.max_domain_visits = ceiling;
        self
    }
}

/// Skip-list tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipListConfig {
    /// Terms added on top of the built-in denylist.
    #[serde(default)]
    pub extra_terms: Vec<String>,
    /// Match terms exactly instead of ignoring ASCII case.
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Text extraction limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Number of leading pages read from each document.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_max_pages() -> usize {
    5
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}

/// Storage directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Downloads awaiting verification.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Verified documents.
    #[serde(default = "default_verified_dir")]
    pub verified_dir: PathBuf,
    /// Persisted run reports.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("unverified")
}

fn default_verified_dir() -> PathBuf {
    PathBuf::from("verified")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            verified_dir: default_verified_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

impl StorageConfig {
    /// Places all three directories under `root`.
    #[must_use]
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            temp_dir: root.join(default_temp_dir()),
            verified_dir: root.join(default_verified_dir()),
            logs_dir: root.join(default_logs_dir()),
        }
    }
}

/// How many verified documents an identifier may contribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Keep crawling until the download budget or the stream runs out.
    #[default]
    AccumulateAll,
    /// Move on to the next identifier after the first promoted document.
    FirstVerified,
}

/// Whether explicitly supplied URLs pass through the skip-list and visit ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplicitUrlPolicy {
    /// Explicit URLs are screened like search results.
    #[default]
    Screened,
    /// Explicit URLs go straight to the probe.
    Direct,
}

/// Lifetime of the per-URL and per-domain visit counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitScope {
    /// A fresh ledger for every invocation.
    #[default]
    PerInvocation,
    /// One synchronized ledger shared by every invocation of the same scout.
    Shared,
}

/// Pipeline policies left open by the crawl design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Per-identifier selection.
    #[serde(default)]
    pub selection: SelectionPolicy,
    /// Screening of explicit URLs.
    #[serde(default)]
    pub explicit_urls: ExplicitUrlPolicy,
    /// Visit ledger lifetime.
    #[serde(default)]
    pub visit_scope: VisitScope,
}

/// Combined configuration for a scout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Search collaborator settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// HTTP settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Crawl quotas.
    #[serde(default)]
    pub budget: BudgetConfig,
    /// Skip-list tuning.
    #[serde(default)]
    pub skip_list: SkipListConfig,
    /// Extraction limits.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Storage layout.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Open pipeline policies.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl ScoutConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScoutError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScoutError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.extraction.max_pages == 0 {
            return Err(ScoutError::Config("extraction.max_pages must be at least 1".into()));
        }
        self.fetch.validate()?;
        self.search.validate()
    }

    /// Sets the storage layout.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Sets the crawl quotas.
    #[must_use]
    pub fn with_budget(mut self, budget: BudgetConfig) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Sets the selection policy.
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.policy.selection = selection;
        self
    }

    /// Sets the explicit URL policy.
    #[must_use]
    pub fn with_explicit_urls(mut self, policy: ExplicitUrlPolicy) -> Self {
        self.policy.explicit_urls = policy;
        self
    }

    /// Sets the visit ledger scope.
    #[must_use]
    pub fn with_visit_scope(mut self, scope: VisitScope) -> Self {
        self.policy.visit_scope = scope;
        self
    }
}
