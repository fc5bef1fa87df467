//! URL helpers shared by the crawl stages.

use url::Url;

/// Extension every stored document carries.
pub const PDF_EXTENSION: &str = ".pdf";

const FALLBACK_FILE_STEM: &str = "document";

/// Extracts the network location (host plus explicit port) from a URL.
#[must_use]
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Returns true if the URL's path ends with the PDF extension.
#[must_use]
pub fn path_is_pdf(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase().ends_with(PDF_EXTENSION))
        .unwrap_or(false)
}

/// Derives a local file name from the URL's last path segment.
///
/// The segment is sanitized for the local filesystem; an empty segment
/// becomes `document`. The PDF extension is appended when missing.
#[must_use]
pub fn file_name_from_url(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default();

    let mut name = sanitize_filename::sanitize(segment.trim());
    if name.is_empty() || name.chars().all(|c| c == '.') {
        name = FALLBACK_FILE_STEM.to_string();
    }
    if !name.to_ascii_lowercase().ends_with(PDF_EXTENSION) {
        name.push_str(PDF_EXTENSION);
    }
    name
}
