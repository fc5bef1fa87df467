//! Downloading probed candidates into the run directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::storage::RunDir;
use crate::crawl::DownloadBudget;
use crate::errors::FetchFailure;
use crate::websearch::{file_name_from_url, FetchConfig, Fetcher};

/// A downloaded, not yet verified document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedDocument {
    /// Source URL.
    pub url: String,
    /// Temporary file holding the body.
    pub path: PathBuf,
    /// Body size in bytes.
    pub size: usize,
}

/// Downloads documents that passed the probe.
#[derive(Clone)]
pub struct DocumentFetcher {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    max_bytes: usize,
}

impl std::fmt::Debug for DocumentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFetcher")
            .field("timeout", &self.timeout)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

impl DocumentFetcher {
    /// Creates a fetcher with the configured timeout and size ceiling.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            timeout: config.fetch_timeout(),
            max_bytes: config.max_response_size,
        }
    }

    /// Downloads `url` into `run`, counting it against `budget` on success.
    ///
    /// The status and declared media type are checked again here; the probe
    /// may have been satisfied by the URL suffix alone.
    pub async fn fetch(
        &self,
        url: &str,
        run: &RunDir,
        budget: &mut DownloadBudget,
    ) -> Result<DownloadedDocument, FetchFailure> {
        let result = self.fetcher.get(url, self.timeout, self.max_bytes).await?;

        if !result.is_success() {
            return Err(FetchFailure::Status(result.status_code));
        }
        if !result.is_pdf() {
            return Err(FetchFailure::NotPdf(result.content_type));
        }

        let path = run.file_path(&file_name_from_url(url));
        tokio::fs::write(&path, &result.body)
            .await
            .map_err(|e| FetchFailure::Io(e.to_string()))?;

        budget.record_download();
        tracing::debug!(
            url,
            bytes = result.body.len(),
            duration_ms = result.duration_ms,
            "Downloaded candidate"
        );

        Ok(DownloadedDocument {
            url: url.to_string(),
            path,
            size: result.body.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::document::Storage;
    use crate::testing::MockFetcher;

    async fn run_dir(root: &std::path::Path) -> RunDir {
        let storage = Storage::new(StorageConfig::rooted_at(root));
        storage.prepare().await.unwrap();
        storage.open_run(uuid::Uuid::new_v4()).await.unwrap()
    }

    fn fetcher(mock: MockFetcher) -> DocumentFetcher {
        DocumentFetcher::new(Arc::new(mock), &FetchConfig::default())
    }

    #[tokio::test]
    async fn test_successful_download_counts() {
        let root = tempfile::tempdir().unwrap();
        let run = run_dir(root.path()).await;
        let url = "https://a.example/sds/acetone.pdf";
        let fetcher = fetcher(MockFetcher::new().with_pdf(url, b"%PDF-1.5".to_vec()));
        let mut budget = DownloadBudget::new(5);

        let doc = fetcher.fetch(url, &run, &mut budget).await.unwrap();

        assert_eq!(doc.path, run.file_path("acetone.pdf"));
        assert_eq!(doc.size, 8);
        assert_eq!(std::fs::read(&doc.path).unwrap(), b"%PDF-1.5");
        assert_eq!(budget.used(), 1);
    }

    #[tokio::test]
    async fn test_error_status_does_not_count() {
        let root = tempfile::tempdir().unwrap();
        let run = run_dir(root.path()).await;
        let url = "https://a.example/missing.pdf";
        let fetcher = fetcher(MockFetcher::new().with_status(url, 404));
        let mut budget = DownloadBudget::new(5);

        let err = fetcher.fetch(url, &run, &mut budget).await.unwrap_err();
        assert_eq!(err, FetchFailure::Status(404));
        assert_eq!(budget.used(), 0);
        assert!(!run.file_path("missing.pdf").exists());
    }

    #[tokio::test]
    async fn test_wrong_media_type_rejected() {
        let root = tempfile::tempdir().unwrap();
        let run = run_dir(root.path()).await;
        let url = "https://a.example/fake.pdf";
        let fetcher = fetcher(MockFetcher::new().with_response(url, 200, Some("text/html"), b"<html>".to_vec()));
        let mut budget = DownloadBudget::new(5);

        let err = fetcher.fetch(url, &run, &mut budget).await.unwrap_err();
        assert_eq!(err, FetchFailure::NotPdf(Some("text/html".into())));
        assert_eq!(budget.used(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_typed() {
        let root = tempfile::tempdir().unwrap();
        let run = run_dir(root.path()).await;
        let url = "https://slow.example/a.pdf";
        let fetcher = fetcher(MockFetcher::new().with_timeout(url));
        let mut budget = DownloadBudget::new(5);

        assert_eq!(
            fetcher.fetch(url, &run, &mut budget).await.unwrap_err(),
            FetchFailure::Timeout
        );
    }

    #[tokio::test]
    async fn test_size_ceiling_is_passed_through() {
        let root = tempfile::tempdir().unwrap();
        let run = run_dir(root.path()).await;
        let url = "https://a.example/big.pdf";
        let mock = MockFetcher::new().with_pdf(url, vec![0u8; 64]);
        let fetcher = DocumentFetcher::new(
            Arc::new(mock),
            &FetchConfig::default().with_max_response_size(16),
        );
        let mut budget = DownloadBudget::new(5);

        assert_eq!(
            fetcher.fetch(url, &run, &mut budget).await.unwrap_err(),
            FetchFailure::TooLarge(16)
        );
    }
}
