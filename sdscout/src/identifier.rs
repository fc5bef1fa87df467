//! Chemical identifiers and the search queries derived from them.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::errors::InvalidIdentifierError;

#[allow(clippy::expect_used)]
static REGISTRY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2,7}-\d{2}-\d$").expect("registry number pattern compiles"));

/// Phrase every accepted document must contain, also used in name queries.
pub const REQUIRED_PHRASE: &str = "safety data sheet";

/// A CAS registry number such as `50-00-0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryNumber(String);

impl RegistryNumber {
    /// Parses a registry number, ignoring surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, InvalidIdentifierError> {
        let trimmed = value.trim();
        if REGISTRY_NUMBER.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(InvalidIdentifierError::new(value))
        }
    }

    /// Returns true if `value` has the registry number shape.
    #[must_use]
    pub fn matches(value: &str) -> bool {
        REGISTRY_NUMBER.is_match(value)
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistryNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegistryNumber {
    type Err = InvalidIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RegistryNumber {
    type Error = InvalidIdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RegistryNumber> for String {
    fn from(value: RegistryNumber) -> Self {
        value.0
    }
}

/// The substance being looked up.
///
/// Both fields act as verification constraints; the registry number, when
/// present, is the one that drives the search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifier {
    /// Registry number, if known.
    pub registry_number: Option<RegistryNumber>,
    /// Substance name, if known.
    pub name: Option<String>,
}

impl Identifier {
    /// Identifier built from a registry number only.
    #[must_use]
    pub fn from_registry_number(number: RegistryNumber) -> Self {
        Self {
            registry_number: Some(number),
            name: None,
        }
    }

    /// Identifier built from a name only.
    #[must_use]
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            registry_number: None,
            name: Some(name.into()),
        }
    }

    /// Returns true if neither field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry_number.is_none() && self.name.is_none()
    }

    /// Builds the search query for this identifier.
    ///
    /// A registry number is searched literally; a bare name is combined with
    /// the required phrase. Both are restricted to PDF results.
    #[must_use]
    pub fn search_query(&self) -> Option<String> {
        if let Some(ref number) = self.registry_number {
            Some(format!("\"{number}\" filetype:pdf"))
        } else {
            self.name
                .as_ref()
                .map(|name| format!("\"{name}\" \"{REQUIRED_PHRASE}\" filetype:pdf"))
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.registry_number, &self.name) {
            (Some(number), Some(name)) => format!("{number} ({name})"),
            (Some(number), None) => number.to_string(),
            (None, Some(name)) => name.clone(),
            (None, None) => "<empty>".to_string(),
        }
    }
}

/// One record of an invocation's input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRequest {
    /// Registry number as supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas: Option<String>,
    /// Substance name as supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Candidate URLs that replace the search step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

/// What the orchestrator does with one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPlan {
    /// Issue `query` and walk its results.
    Search {
        /// Verification constraints.
        identifier: Identifier,
        /// Query handed to the search provider.
        query: String,
    },
    /// Walk the given URLs without searching.
    Explicit {
        /// Verification constraints.
        identifier: Identifier,
        /// URLs in the order supplied.
        urls: Vec<String>,
    },
    /// Nothing to look for.
    Skip,
}

impl IdentifierRequest {
    /// Request for a registry number.
    #[must_use]
    pub fn for_cas(cas: impl Into<String>) -> Self {
        Self {
            cas: Some(cas.into()),
            ..Default::default()
        }
    }

    /// Request for a substance name.
    #[must_use]
    pub fn for_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Classifies a single lookup string as a registry number or a name.
    #[must_use]
    pub fn from_lookup(value: &str) -> Self {
        let trimmed = value.trim();
        if RegistryNumber::matches(trimmed) {
            Self::for_cas(trimmed)
        } else {
            Self::for_name(trimmed)
        }
    }

    /// Adds explicit URLs.
    #[must_use]
    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = Some(urls.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a name constraint.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validates the request and decides how it is processed.
    ///
    /// Blank fields count as absent. A non-empty URL list wins over search.
    pub fn plan(&self) -> Result<RequestPlan, InvalidIdentifierError> {
        let registry_number = non_blank(self.cas.as_deref())
            .map(RegistryNumber::parse)
            .transpose()?;
        let identifier = Identifier {
            registry_number,
            name: non_blank(self.name.as_deref()).map(str::to_string),
        };

        let urls: Vec<String> = self
            .urls
            .iter()
            .flatten()
            .filter_map(|u| non_blank(Some(u.as_str())).map(str::to_string))
            .collect();

        if !urls.is_empty() {
            return Ok(RequestPlan::Explicit { identifier, urls });
        }

        match identifier.search_query() {
            Some(query) => Ok(RequestPlan::Search { identifier, query }),
            None => Ok(RequestPlan::Skip),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
