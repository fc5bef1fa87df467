//! End-to-end tests for the scout orchestrator.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Arc;

    use crate::config::{
        BudgetConfig, ExplicitUrlPolicy, ScoutConfig, SelectionPolicy, StorageConfig, VisitScope,
    };
    use crate::crawl::VisitLedger;
    use crate::errors::ScoutError;
    use crate::events::CollectingEventSink;
    use crate::identifier::IdentifierRequest;
    use crate::pipeline::Scout;
    use crate::report::Report;
    use crate::testing::{sample_pdf, MockFetcher, StubExtractor};
    use crate::websearch::{SearchProvider, StaticSearchProvider};

    const FORMALDEHYDE_SDS: &str = "SAFETY DATA SHEET\nFormaldehyde solution\nCAS-No.: 50-00-0";

    struct Harness {
        scout: Scout,
        search: Arc<StaticSearchProvider>,
        fetcher: Arc<MockFetcher>,
        events: Arc<CollectingEventSink>,
    }

    fn config(root: &Path) -> ScoutConfig {
        ScoutConfig::default().with_storage(StorageConfig::rooted_at(root))
    }

    fn harness(config: ScoutConfig, search: StaticSearchProvider, fetcher: MockFetcher) -> Harness {
        let search = Arc::new(search);
        let fetcher = Arc::new(fetcher);
        let events = Arc::new(CollectingEventSink::new());
        let scout = Scout::new(config, search.clone(), fetcher.clone())
            .unwrap()
            .with_extractor(Arc::new(StubExtractor::new()))
            .with_event_sink(events.clone());
        Harness {
            scout,
            search,
            fetcher,
            events,
        }
    }

    fn dir_entries(path: &Path) -> usize {
        std::fs::read_dir(path).map(Iterator::count).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_registry_number_document_is_promoted() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://acme.test/sds/formaldehyde.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new([url]),
            MockFetcher::new().with_pdf(url, FORMALDEHYDE_SDS),
        );

        let outcome = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert_eq!(
            h.search.queries(),
            vec![("\"50-00-0\" filetype:pdf".to_string(), 50)]
        );
        assert_eq!(outcome.report.len(), 1);
        let entry = &outcome.report.entries()[0];
        assert!(entry.verified);
        assert_eq!(entry.cas.as_deref(), Some("50-00-0"));
        assert_eq!(entry.name, None);
        assert_eq!(entry.provider, url);
        assert_eq!(entry.url, url);
        assert!(Path::new(&entry.filepath).starts_with(root.path().join("verified")));
        assert!(Path::new(&entry.filepath).exists());

        assert_eq!(outcome.stats.promoted, 1);
        assert_eq!(h.events.events_of_type("document.promoted").len(), 1);
    }

    #[tokio::test]
    async fn test_document_without_registry_number_is_deleted() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://acme.test/sds/methanol.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new([url]),
            MockFetcher::new().with_pdf(url, "Safety Data Sheet\nMethanol\nCAS 67-56-1"),
        );

        let outcome = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert!(outcome.report.is_empty());
        assert!(outcome.log_file.is_none());
        assert_eq!(outcome.stats.downloaded, 1);
        assert_eq!(outcome.stats.discarded, 1);
        assert_eq!(dir_entries(&root.path().join("verified")), 0);
        assert_eq!(dir_entries(&root.path().join("unverified")), 0);
        assert_eq!(dir_entries(&root.path().join("logs")), 0);
        assert_eq!(h.events.events_of_type("document.rejected").len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_urls_bypass_search() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://example.com/sds.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new(["https://unused.test/a.pdf"]),
            MockFetcher::new().with_pdf(url, "Safety Data Sheet - Acetone"),
        );

        let request = IdentifierRequest::for_name("Acetone").with_urls([url]);
        let outcome = h.scout.run(&[request]).await.unwrap();

        assert!(h.search.queries().is_empty());
        assert_eq!(h.fetcher.get_calls(), vec![url.to_string()]);
        assert_eq!(outcome.report.len(), 1);
        assert_eq!(outcome.report.entries()[0].name.as_deref(), Some("Acetone"));
        assert_eq!(outcome.report.entries()[0].cas, None);
    }

    #[tokio::test]
    async fn test_explicit_url_still_needs_name_match() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://example.com/sds.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::default(),
            MockFetcher::new().with_pdf(url, "Safety Data Sheet - Toluene"),
        );

        let request = IdentifierRequest::for_name("Acetone").with_urls([url]);
        let outcome = h.scout.run(&[request]).await.unwrap();

        assert!(outcome.report.is_empty());
        assert_eq!(outcome.stats.discarded, 1);
    }

    #[tokio::test]
    async fn test_exhausted_domain_is_never_probed() {
        let root = tempfile::tempdir().unwrap();
        let mut urls = Vec::new();
        let mut crowded = Vec::new();
        for i in 0..50 {
            let url = if i % 5 == 0 {
                let url = format!("https://crowded.test/sheet/{i}");
                crowded.push(url.clone());
                url
            } else {
                format!("https://vendor{i}.test/sheet/{i}")
            };
            urls.push(url);
        }

        let ledger = Arc::new(VisitLedger::default());
        ledger.exhaust_domain("crowded.test");

        let h = harness(
            config(root.path()).with_visit_scope(VisitScope::Shared),
            StaticSearchProvider::new(urls),
            MockFetcher::new(),
        );
        let scout = h.scout.with_visit_ledger(ledger);

        let outcome = scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert_eq!(crowded.len(), 10);
        for url in &crowded {
            assert_eq!(h.fetcher.calls_to(url), 0, "{url} was requested");
        }
        assert_eq!(h.fetcher.head_calls().len(), 40);
        assert_eq!(outcome.stats.over_budget, 10);
        assert_eq!(outcome.stats.probe_rejected, 40);
        assert_eq!(outcome.stats.candidates, 50);
    }

    #[tokio::test]
    async fn test_visit_ceilings_within_one_run() {
        let root = tempfile::tempdir().unwrap();
        let repeated = "https://repeat.test/sheet";
        let mut urls = vec![repeated.to_string(); 7];
        urls.extend((0..7).map(|i| format!("https://busy.test/sheet/{i}")));

        let h = harness(
            config(root.path()),
            StaticSearchProvider::new(urls),
            MockFetcher::new(),
        );

        let outcome = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert_eq!(h.fetcher.calls_to(repeated), 5);
        let busy_probes = h
            .fetcher
            .head_calls()
            .iter()
            .filter(|u| u.starts_with("https://busy.test/"))
            .count();
        assert_eq!(busy_probes, 5);
        assert_eq!(outcome.stats.over_budget, 4);
    }

    #[tokio::test]
    async fn test_probe_timeout_skips_candidate() {
        let root = tempfile::tempdir().unwrap();
        let slow = "https://slow.test/download?id=1";
        let good = "https://acme.test/sds/formaldehyde.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new([slow, good]),
            MockFetcher::new()
                .with_timeout(slow)
                .with_pdf(good, FORMALDEHYDE_SDS),
        );

        let outcome = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert_eq!(outcome.stats.probe_rejected, 1);
        assert!(h.fetcher.get_calls().iter().all(|u| u != slow));
        assert_eq!(outcome.report.len(), 1);
        assert_eq!(outcome.report.entries()[0].url, good);
    }

    #[tokio::test]
    async fn test_fetch_failure_event_carries_kind() {
        let root = tempfile::tempdir().unwrap();
        let gone = "https://acme.test/sds/gone.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new([gone]),
            MockFetcher::new().with_status(gone, 404),
        );

        let outcome = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert_eq!(outcome.stats.fetch_failed, 1);
        let events = h.events.events_of_type("candidate.fetch_failed");
        assert_eq!(events.len(), 1);
        let data = events[0].1.as_ref().unwrap();
        assert_eq!(data["kind"], "status");
        assert_eq!(data["url"], gone);
        assert!(h.events.events_of_type("document.promoted").is_empty());
    }

    #[tokio::test]
    async fn test_download_limit_stops_the_crawl() {
        let root = tempfile::tempdir().unwrap();
        let urls: Vec<String> = (0..15)
            .map(|i| format!("https://vendor{i}.test/sds/sheet.pdf"))
            .collect();
        let mut fetcher = MockFetcher::new();
        for url in &urls {
            fetcher = fetcher.with_pdf(url.clone(), FORMALDEHYDE_SDS);
        }
        let h = harness(config(root.path()), StaticSearchProvider::new(urls.clone()), fetcher);

        let requests = [
            IdentifierRequest::for_cas("50-00-0"),
            IdentifierRequest::for_name("Formaldehyde solution"),
        ];
        let outcome = h.scout.run(&requests).await.unwrap();

        assert_eq!(h.fetcher.get_calls().len(), 5);
        for url in &urls[5..] {
            assert_eq!(h.fetcher.calls_to(url), 0);
        }
        assert_eq!(outcome.stats.downloaded, 5);
        assert_eq!(outcome.stats.identifiers, 1);
        assert_eq!(h.search.queries().len(), 1);
        assert_eq!(h.events.events_of_type("crawl.budget_exhausted").len(), 1);

        // Same file name on every vendor; all five promoted under distinct names.
        assert_eq!(outcome.report.len(), 5);
        assert_eq!(dir_entries(&root.path().join("verified")), 5);
    }

    #[tokio::test]
    async fn test_download_budget_resets_between_runs() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://acme.test/sds/formaldehyde.pdf";
        let h = harness(
            config(root.path()).with_budget(BudgetConfig::default().with_download_limit(1)),
            StaticSearchProvider::new([url]),
            MockFetcher::new().with_pdf(url, FORMALDEHYDE_SDS),
        );

        let first = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();
        let second = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert_eq!(first.stats.downloaded, 1);
        assert_eq!(second.stats.downloaded, 1);
        assert_ne!(first.run_id, second.run_id);
    }

    #[tokio::test]
    async fn test_filtered_candidates_are_never_requested() {
        let root = tempfile::tempdir().unwrap();
        let catalog = "https://www.chemicalbook.com/sds/50-00-0.pdf";
        let cart = "https://shop.test/Cart/50-00-0.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new([catalog, cart]),
            MockFetcher::new()
                .with_pdf(catalog, FORMALDEHYDE_SDS)
                .with_pdf(cart, FORMALDEHYDE_SDS),
        );

        let outcome = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert_eq!(h.fetcher.calls_to(catalog), 0);
        assert_eq!(h.fetcher.calls_to(cart), 0);
        assert_eq!(outcome.stats.filtered, 2);
        assert!(outcome.report.is_empty());
        assert_eq!(h.events.events_of_type("candidate.filtered").len(), 2);
    }

    #[tokio::test]
    async fn test_selection_policies() {
        let urls: Vec<String> = (0..3)
            .map(|i| format!("https://vendor{i}.test/sds/formaldehyde-{i}.pdf"))
            .collect();
        let fetcher = || {
            urls.iter()
                .fold(MockFetcher::new(), |f, u| f.with_pdf(u.clone(), FORMALDEHYDE_SDS))
        };

        let root = tempfile::tempdir().unwrap();
        let all = harness(config(root.path()), StaticSearchProvider::new(urls.clone()), fetcher());
        let outcome = all.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();
        assert_eq!(outcome.report.len(), 3);

        let root = tempfile::tempdir().unwrap();
        let first = harness(
            config(root.path()).with_selection(SelectionPolicy::FirstVerified),
            StaticSearchProvider::new(urls.clone()),
            fetcher(),
        );
        let outcome = first
            .scout
            .run(&[
                IdentifierRequest::for_cas("50-00-0"),
                IdentifierRequest::for_name("Formaldehyde solution"),
            ])
            .await
            .unwrap();
        assert_eq!(outcome.report.len(), 2);
        assert_eq!(outcome.report.entries()[0].url, urls[0]);
        assert_eq!(outcome.report.entries()[1].url, urls[0]);
        assert_eq!(first.fetcher.calls_to(&urls[2]), 0);
    }

    #[tokio::test]
    async fn test_explicit_url_policy() {
        let url = "https://www.chemicalbook.com/sds/acetone.pdf";
        let request = IdentifierRequest::for_name("Acetone").with_urls([url]);
        let fetcher = || MockFetcher::new().with_pdf(url, "Safety Data Sheet: Acetone");

        let root = tempfile::tempdir().unwrap();
        let screened = harness(config(root.path()), StaticSearchProvider::default(), fetcher());
        let outcome = screened.scout.run(std::slice::from_ref(&request)).await.unwrap();
        assert_eq!(outcome.stats.filtered, 1);
        assert!(outcome.report.is_empty());

        let root = tempfile::tempdir().unwrap();
        let direct = harness(
            config(root.path()).with_explicit_urls(ExplicitUrlPolicy::Direct),
            StaticSearchProvider::default(),
            fetcher(),
        );
        let outcome = direct.scout.run(std::slice::from_ref(&request)).await.unwrap();
        assert_eq!(outcome.stats.filtered, 0);
        assert_eq!(outcome.report.len(), 1);
    }

    #[tokio::test]
    async fn test_visit_scope() {
        let url = "https://vendor.test/sheet";
        let budget = BudgetConfig::default().with_visit_ceiling(1);

        let root = tempfile::tempdir().unwrap();
        let per_run = harness(
            config(root.path()).with_budget(budget),
            StaticSearchProvider::new([url]),
            MockFetcher::new(),
        );
        per_run.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();
        let second = per_run.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();
        assert_eq!(second.stats.over_budget, 0);
        assert_eq!(per_run.fetcher.head_calls().len(), 2);

        let root = tempfile::tempdir().unwrap();
        let shared = harness(
            config(root.path())
                .with_budget(budget)
                .with_visit_scope(VisitScope::Shared),
            StaticSearchProvider::new([url]),
            MockFetcher::new(),
        );
        shared.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();
        let second = shared.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();
        assert_eq!(second.stats.over_budget, 1);
        assert_eq!(shared.fetcher.head_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_and_empty_requests_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://acme.test/sds/formaldehyde.pdf";
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new([url]),
            MockFetcher::new().with_pdf(url, FORMALDEHYDE_SDS),
        );

        let outcome = h
            .scout
            .run(&[
                IdentifierRequest::for_cas("50-0-0"),
                IdentifierRequest::default(),
                IdentifierRequest::for_cas("50-00-0"),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.stats.identifiers, 3);
        assert_eq!(outcome.stats.skipped_identifiers, 2);
        assert_eq!(h.search.queries().len(), 1);
        assert_eq!(outcome.report.len(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_deletes_download() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://acme.test/sds/formaldehyde.pdf";
        let extractor = Arc::new(StubExtractor::failing());
        let scout = Scout::new(
            config(root.path()),
            Arc::new(StaticSearchProvider::new([url])),
            Arc::new(MockFetcher::new().with_pdf(url, FORMALDEHYDE_SDS)),
        )
        .unwrap()
        .with_extractor(extractor.clone());

        let outcome = scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        assert!(outcome.report.is_empty());
        assert_eq!(outcome.stats.discarded, 1);
        assert_eq!(extractor.calls().len(), 1);
        assert!(!extractor.calls()[0].exists());
        assert_eq!(dir_entries(&root.path().join("unverified")), 0);
    }

    struct FailingSearch;

    #[async_trait]
    impl SearchProvider for FailingSearch {
        async fn search(
            &self,
            _query: &str,
            _count: usize,
        ) -> Result<BoxStream<'static, String>, ScoutError> {
            Err(ScoutError::Search("quota exceeded".into()))
        }
    }

    #[tokio::test]
    async fn test_search_failure_is_not_fatal() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://example.com/sds.pdf";
        let events = Arc::new(CollectingEventSink::new());
        let scout = Scout::new(
            config(root.path()),
            Arc::new(FailingSearch),
            Arc::new(MockFetcher::new().with_pdf(url, "Safety Data Sheet - Acetone")),
        )
        .unwrap()
        .with_extractor(Arc::new(StubExtractor::new()))
        .with_event_sink(events.clone());

        let outcome = scout
            .run(&[
                IdentifierRequest::for_cas("50-00-0"),
                IdentifierRequest::for_name("Acetone").with_urls([url]),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.stats.search_failures, 1);
        assert_eq!(outcome.report.len(), 1);
        assert_eq!(events.events_of_type("search.failed").len(), 1);
    }

    #[tokio::test]
    async fn test_log_file_matches_returned_report() {
        let root = tempfile::tempdir().unwrap();
        let urls = ["https://a.test/sds/one.pdf", "https://b.test/sds/two.pdf"];
        let h = harness(
            config(root.path()),
            StaticSearchProvider::new(urls),
            MockFetcher::new()
                .with_pdf(urls[0], FORMALDEHYDE_SDS)
                .with_pdf(urls[1], FORMALDEHYDE_SDS),
        );

        let outcome = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap();

        let log_file = outcome.log_file.expect("report persisted");
        assert!(log_file.starts_with(root.path().join("logs")));
        let persisted = Report::from_json(&std::fs::read_to_string(&log_file).unwrap()).unwrap();
        assert_eq!(persisted, outcome.report);
        assert_eq!(dir_entries(&root.path().join("unverified")), 0);
    }

    #[tokio::test]
    async fn test_real_pdf_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let url = "https://acme.test/sds/acetone.pdf";
        let body = sample_pdf(&["Safety Data Sheet", "Acetone", "CAS number 67-64-1"]);
        let scout = Scout::new(
            config(root.path()),
            Arc::new(StaticSearchProvider::new([url])),
            Arc::new(MockFetcher::new().with_pdf(url, body)),
        )
        .unwrap();

        let request = IdentifierRequest::for_cas("67-64-1").with_name("Acetone");
        let outcome = scout.run(&[request]).await.unwrap();

        assert_eq!(outcome.report.len(), 1);
        assert_eq!(outcome.report.entries()[0].name.as_deref(), Some("Acetone"));
    }

    #[tokio::test]
    async fn test_lookup_classifies_input() {
        let root = tempfile::tempdir().unwrap();
        let h = harness(
            config(root.path()),
            StaticSearchProvider::default(),
            MockFetcher::new(),
        );

        h.scout.lookup("67-64-1").await.unwrap();
        h.scout.lookup("Acetone").await.unwrap();

        let queries: Vec<String> = h.search.queries().into_iter().map(|(q, _)| q).collect();
        assert_eq!(
            queries,
            vec![
                "\"67-64-1\" filetype:pdf".to_string(),
                "\"Acetone\" \"safety data sheet\" filetype:pdf".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unwritable_storage_aborts_before_crawling() {
        let root = tempfile::tempdir().unwrap();
        let blocked = root.path().join("blocked");
        std::fs::write(&blocked, b"a file, not a directory").unwrap();
        let h = harness(
            ScoutConfig::default().with_storage(StorageConfig::rooted_at(&blocked)),
            StaticSearchProvider::new(["https://acme.test/a.pdf"]),
            MockFetcher::new(),
        );

        let err = h.scout.run(&[IdentifierRequest::for_cas("50-00-0")]).await.unwrap_err();

        assert!(matches!(err, ScoutError::Storage { .. }));
        assert!(h.search.queries().is_empty());
    }
}
