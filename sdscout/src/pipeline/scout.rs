//! The crawl-fetch-verify orchestrator.

use chrono::Local;
use futures::stream::{self, BoxStream, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::outcome::{CandidateOutcome, RunStats, ScoutOutcome};
use crate::config::{ExplicitUrlPolicy, ScoutConfig, SelectionPolicy, VisitScope};
use crate::crawl::{DownloadBudget, SkipList, VisitLedger};
use crate::document::{
    ContentTypeProber, DocumentFetcher, LopdfExtractor, RunDir, Storage, TextExtractor, Verifier,
};
use crate::errors::{ExtractFailure, ScoutError};
use crate::events::{EventSink, NoOpEventSink};
use crate::identifier::{Identifier, IdentifierRequest, RequestPlan};
use crate::report::{Report, ReportEntry, ReportWriter};
use crate::websearch::{
    extract_domain, EndpointSearchProvider, Fetcher, ReqwestFetcher, SearchProvider,
    StaticSearchProvider,
};

/// Mutable state of one invocation.
struct RunState {
    run_id: Uuid,
    dir: RunDir,
    ledger: Arc<VisitLedger>,
    budget: DownloadBudget,
    report: Report,
    stats: RunStats,
}

/// Locates, downloads and verifies safety data sheets.
///
/// A scout is cheap to share: every invocation of [`Scout::run`] gets its own
/// run directory, download budget and report. Only the visit ledger may be
/// shared, and only under [`VisitScope::Shared`].
pub struct Scout {
    config: ScoutConfig,
    search: Arc<dyn SearchProvider>,
    prober: ContentTypeProber,
    documents: DocumentFetcher,
    extractor: Arc<dyn TextExtractor>,
    events: Arc<dyn EventSink>,
    skip_list: SkipList,
    verifier: Verifier,
    storage: Storage,
    shared_ledger: Arc<VisitLedger>,
}

impl std::fmt::Debug for Scout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scout")
            .field("config", &self.config)
            .field("skip_terms", &self.skip_list.len())
            .finish_non_exhaustive()
    }
}

impl Scout {
    /// Creates a scout over the given search and HTTP collaborators.
    pub fn new(
        config: ScoutConfig,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, ScoutError> {
        config.validate()?;
        Ok(Self {
            prober: ContentTypeProber::new(fetcher.clone(), config.fetch.probe_timeout()),
            documents: DocumentFetcher::new(fetcher, &config.fetch),
            extractor: Arc::new(LopdfExtractor::new(config.extraction.max_pages)),
            events: Arc::new(NoOpEventSink),
            skip_list: SkipList::from_config(&config.skip_list),
            verifier: Verifier::new(),
            storage: Storage::new(config.storage.clone()),
            shared_ledger: Arc::new(VisitLedger::from_config(&config.budget)),
            search,
            config,
        })
    }

    /// Creates a scout with the HTTP client and search endpoint described by `config`.
    ///
    /// Without a search endpoint only explicit URL lists produce candidates.
    pub fn from_config(config: ScoutConfig) -> Result<Self, ScoutError> {
        let fetcher = Arc::new(ReqwestFetcher::new(&config.fetch)?);
        let search: Arc<dyn SearchProvider> = if config.search.endpoint.is_some() {
            Arc::new(EndpointSearchProvider::new(
                config.search.clone(),
                &config.fetch.user_agent,
            )?)
        } else {
            warn!("No search endpoint configured; only explicit URLs will be crawled");
            Arc::new(StaticSearchProvider::default())
        };
        Self::new(config, search, fetcher)
    }

    /// Replaces the text extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sends candidate events to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Uses `ledger` as the shared visit ledger.
    ///
    /// Only consulted under [`VisitScope::Shared`]; lets several scouts share
    /// one ledger.
    #[must_use]
    pub fn with_visit_ledger(mut self, ledger: Arc<VisitLedger>) -> Self {
        self.shared_ledger = ledger;
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Classifies a single lookup string and runs it.
    pub async fn lookup(&self, value: &str) -> Result<ScoutOutcome, ScoutError> {
        self.run(&[IdentifierRequest::from_lookup(value)]).await
    }

    /// Processes `requests` in order and returns the invocation's report.
    ///
    /// Fails only if storage cannot be prepared. Every later failure skips a
    /// candidate or a request; a report that cannot be persisted is still
    /// returned, without a log file.
    pub async fn run(&self, requests: &[IdentifierRequest]) -> Result<ScoutOutcome, ScoutError> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();

        self.storage.prepare().await?;
        let dir = self.storage.open_run(run_id).await?;

        let ledger = match self.config.policy.visit_scope {
            VisitScope::PerInvocation => Arc::new(VisitLedger::from_config(&self.config.budget)),
            VisitScope::Shared => self.shared_ledger.clone(),
        };

        let mut state = RunState {
            run_id,
            dir,
            ledger,
            budget: DownloadBudget::new(self.config.budget.download_limit),
            report: Report::new(),
            stats: RunStats::default(),
        };

        info!(%run_id, requests = requests.len(), "Starting scout run");
        self.events
            .emit(
                "run.started",
                Some(serde_json::json!({"run_id": run_id, "requests": requests.len()})),
            )
            .await;

        self.process_requests(requests, &mut state).await;

        let RunState {
            dir, report, stats, ..
        } = state;
        dir.close().await;

        let log_file = match ReportWriter::new(self.storage.logs_dir())
            .write(&report, Local::now())
            .await
        {
            Ok(path) => path,
            Err(e) => {
                warn!(%run_id, error = %e, "Failed to persist report");
                None
            }
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            %run_id,
            promoted = stats.promoted,
            downloaded = stats.downloaded,
            candidates = stats.candidates,
            duration_ms,
            "Scout run finished"
        );
        self.events
            .emit(
                "run.completed",
                Some(serde_json::json!({
                    "run_id": run_id,
                    "stats": stats,
                    "log_file": log_file.as_ref().map(|p| p.display().to_string()),
                    "duration_ms": duration_ms,
                })),
            )
            .await;

        Ok(ScoutOutcome {
            run_id,
            report,
            log_file,
            stats,
            duration_ms,
        })
    }

    async fn process_requests(&self, requests: &[IdentifierRequest], state: &mut RunState) {
        for (index, request) in requests.iter().enumerate() {
            if state.budget.is_exhausted() {
                info!(
                    run_id = %state.run_id,
                    remaining = requests.len() - index,
                    "Download budget exhausted; skipping remaining requests"
                );
                break;
            }
            state.stats.identifiers += 1;

            let plan = match request.plan() {
                Ok(plan) => plan,
                Err(e) => {
                    warn!(run_id = %state.run_id, error = %e, "Skipping request");
                    state.stats.skipped_identifiers += 1;
                    continue;
                }
            };

            match plan {
                RequestPlan::Skip => {
                    warn!(run_id = %state.run_id, index, "Skipping request without registry number, name or URLs");
                    state.stats.skipped_identifiers += 1;
                }
                RequestPlan::Search { identifier, query } => {
                    debug!(run_id = %state.run_id, %query, "Searching");
                    match self.search.search(&query, self.config.search.num_results).await {
                        Ok(candidates) => self.walk(candidates, &identifier, true, state).await,
                        Err(e) => {
                            warn!(run_id = %state.run_id, %query, error = %e, "Search failed");
                            state.stats.search_failures += 1;
                            self.events.try_emit(
                                "search.failed",
                                Some(serde_json::json!({"query": query, "error": e.to_string()})),
                            );
                        }
                    }
                }
                RequestPlan::Explicit { identifier, urls } => {
                    let screened = self.config.policy.explicit_urls == ExplicitUrlPolicy::Screened;
                    self.walk(stream::iter(urls).boxed(), &identifier, screened, state)
                        .await;
                }
            }
        }
    }

    async fn walk(
        &self,
        mut candidates: BoxStream<'static, String>,
        identifier: &Identifier,
        screened: bool,
        state: &mut RunState,
    ) {
        while let Some(url) = candidates.next().await {
            let outcome = self.process_candidate(&url, identifier, screened, state).await;
            debug!(run_id = %state.run_id, %url, outcome = %outcome, "Candidate processed");

            state.stats.record(&outcome);
            self.events.try_emit(
                outcome.event_type(),
                Some(serde_json::json!({
                    "run_id": state.run_id,
                    "identifier": identifier.label(),
                    "url": url,
                    "detail": outcome.to_string(),
                    "kind": outcome.failure_kind(),
                })),
            );

            if state.budget.is_exhausted() {
                info!(
                    run_id = %state.run_id,
                    downloads = state.budget.used(),
                    "Download budget exhausted; stopping crawl"
                );
                self.events.try_emit(
                    "crawl.budget_exhausted",
                    Some(serde_json::json!({"run_id": state.run_id, "downloads": state.budget.used()})),
                );
                break;
            }
            if outcome.is_promoted() && self.config.policy.selection == SelectionPolicy::FirstVerified {
                break;
            }
        }
    }

    async fn process_candidate(
        &self,
        url: &str,
        identifier: &Identifier,
        screened: bool,
        state: &mut RunState,
    ) -> CandidateOutcome {
        let Some(domain) = extract_domain(url) else {
            return CandidateOutcome::Invalid;
        };

        if screened {
            if let Some(term) = self.skip_list.matching_term(url, &domain) {
                return CandidateOutcome::Filtered {
                    term: term.to_string(),
                };
            }
            let admission = state.ledger.admit(url, &domain);
            if !admission.is_admitted() {
                return CandidateOutcome::OverBudget(admission);
            }
        }

        let probe = self.prober.probe(url).await;
        if !probe.looks_like_pdf() {
            return CandidateOutcome::ProbeRejected(probe);
        }

        let document = match self.documents.fetch(url, &state.dir, &mut state.budget).await {
            Ok(document) => document,
            Err(failure) => {
                warn!(run_id = %state.run_id, url, error = %failure, "Download failed");
                return CandidateOutcome::FetchFailed(failure);
            }
        };

        let text = match self.extract(&document.path).await {
            Ok(text) => text,
            Err(failure) => {
                warn!(run_id = %state.run_id, url, error = %failure, "Text extraction failed");
                self.storage.discard(&document.path).await;
                return CandidateOutcome::ExtractFailed(failure);
            }
        };

        let verification = self.verifier.verify(&text, identifier);
        if !verification.verified {
            info!(run_id = %state.run_id, url, missing = ?verification.missing, "Deleted unverified document");
            self.storage.discard(&document.path).await;
            return CandidateOutcome::Rejected {
                missing: verification.missing,
            };
        }

        match self.storage.promote(&document.path, url).await {
            Ok(path) => {
                info!(run_id = %state.run_id, url, path = %path.display(), "Verified document");
                state
                    .report
                    .push(ReportEntry::promoted(identifier, url, &path));
                CandidateOutcome::Promoted { path }
            }
            Err(e) => {
                warn!(run_id = %state.run_id, url, error = %e, "Failed to promote verified document");
                self.storage.discard(&document.path).await;
                CandidateOutcome::PromotionFailed(e.to_string())
            }
        }
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractFailure> {
        let extractor = self.extractor.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extractor.extract_text(&path))
            .await
            .unwrap_or_else(|e| Err(ExtractFailure::Unreadable(format!("extraction task failed: {e}"))))
    }
}
