//! Denylist matching over domains and full URLs.

use crate::config::SkipListConfig;

/// Built-in denylist: chemical catalogs that republish other vendors' sheets,
/// navigation and account pages, general-purpose and social platforms.
pub const DEFAULT_SKIP_TERMS: &[&str] = &[
    // Catalog aggregators and retail
    "guidechem", "chemicalbook", "commonchemistry", "alpha-chemistry", "lookchem",
    "pharmaffiliates", "benjaminmoore.com", "amazon", "ebay", "craigslist", "scribd",
    // Navigation and account pages
    "home", "login", "privacy", "support", "contact", "food", "register", "signup",
    "signin", "faq", "terms", "conditions", "terms-of-service", "help", "about",
    "my-account", "favourites", "bulkOrder", "cart",
    // Social platforms
    "linkedin", "twitter", "x.com", "facebook", "youtube", "pinterest", "instagram",
    "tumblr", "reddit", "snapchat", "tiktok",
    // News and media
    "imdb", "nytimes", "huffingtonpost", "forbes", "bloomberg", "bbc", "cnn", "foxnews",
    "nbcnews", "abcnews", "theguardian", "dailymail", "usatoday",
    // Q&A, reviews, health portals
    "wikipedia", "quora", "stackexchange", "stackoverflow", "tripadvisor", "yelp",
    "zomato", "opentable", "healthline", "webmd", "mayoclinic",
    // Agencies that host summaries rather than vendor sheets
    "nih.gov", "cdc.gov", "fda.gov", "epa.gov",
    // Search engines and portals
    "google", "bing", "yahoo", "ask", "aol", "baidu", "msn", "duckduckgo", "yandex",
    // Course platforms
    "coursera", "udemy", "edx", "khanacademy",
];

/// Substring denylist applied to a candidate's domain and full URL.
#[derive(Debug, Clone)]
pub struct SkipList {
    terms: Vec<String>,
    case_sensitive: bool,
}

impl Default for SkipList {
    fn default() -> Self {
        Self::from_config(&SkipListConfig::default())
    }
}

impl SkipList {
    /// Builds the built-in list plus any configured extras.
    #[must_use]
    pub fn from_config(config: &SkipListConfig) -> Self {
        Self::with_terms(
            DEFAULT_SKIP_TERMS
                .iter()
                .copied()
                .chain(config.extra_terms.iter().map(String::as_str)),
            config.case_sensitive,
        )
    }

    /// Builds a list from explicit terms only.
    #[must_use]
    pub fn with_terms<I, S>(terms: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .filter(|t| !t.as_ref().is_empty())
            .map(|t| normalize(t.as_ref(), case_sensitive))
            .collect();
        terms.sort();
        terms.dedup();
        Self {
            terms,
            case_sensitive,
        }
    }

    /// Returns the first term matching the domain or the URL.
    #[must_use]
    pub fn matching_term(&self, url: &str, domain: &str) -> Option<&str> {
        let url = normalize(url, self.case_sensitive);
        let domain = normalize(domain, self.case_sensitive);
        self.terms
            .iter()
            .find(|term| domain.contains(term.as_str()) || url.contains(term.as_str()))
            .map(String::as_str)
    }

    /// Returns true if the candidate must not be crawled.
    #[must_use]
    pub fn is_filtered(&self, url: &str, domain: &str) -> bool {
        self.matching_term(url, domain).is_some()
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if the list has no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn normalize(value: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        value.to_string()
    } else {
        value.to_ascii_lowercase()
    }
}
