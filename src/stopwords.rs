//! English stopword sets for phrase filtering.
//!
//! Lists are parsed once per process and shared behind an `Arc`; callers
//! inject the set into the extractor instead of reaching for a global.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};

use crate::error::{Result, WrappedError};

/// Immutable, shareable stopword set
pub type StopwordSet = Arc<HashSet<String>>;

const BUNDLED_ENGLISH: &str = include_str!("../resources/stopwords_en.txt");

static BUNDLED: OnceCell<StopwordSet> = OnceCell::new();
static ISO: OnceCell<StopwordSet> = OnceCell::new();

/// Which English list to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwordSource {
    /// Compact list shipped with the crate (function words only)
    #[default]
    Bundled,
    /// The much larger stopwords-iso list from the `stop-words` crate
    Iso,
}

impl StopwordSource {
    /// Configuration name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::Iso => "iso",
        }
    }
}

impl fmt::Display for StopwordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StopwordSource {
    type Err = WrappedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bundled" => Ok(Self::Bundled),
            "iso" => Ok(Self::Iso),
            other => Err(WrappedError::InvalidConfig(format!(
                "stopwords must be 'bundled' or 'iso', got '{other}'"
            ))),
        }
    }
}

/// Shared English stopword set for `source`, loaded on first use
#[must_use]
pub fn english(source: StopwordSource) -> StopwordSet {
    match source {
        StopwordSource::Bundled => BUNDLED
            .get_or_init(|| {
                let set = from_words(BUNDLED_ENGLISH.lines());
                tracing::debug!(count = set.len(), "Loaded bundled stopword list");
                set
            })
            .clone(),
        StopwordSource::Iso => ISO
            .get_or_init(|| {
                let set = from_words(get(LANGUAGE::English).iter().map(ToString::to_string));
                tracing::debug!(count = set.len(), "Loaded ISO stopword list");
                set
            })
            .clone(),
    }
}

/// Build a set from arbitrary words, trimming and lowercasing each entry
pub fn from_words<I, S>(words: I) -> StopwordSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Arc::new(
        words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_list_is_cached() {
        let first = english(StopwordSource::Bundled);
        let second = english(StopwordSource::Bundled);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.contains("the"));
        assert!(first.contains("my"));
        assert!(!first.contains("way"));
    }

    #[test]
    fn test_from_words_normalizes() {
        let set = from_words(["  The ", "", "AND"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("the"));
        assert!(set.contains("and"));
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!("ISO".parse::<StopwordSource>().unwrap(), StopwordSource::Iso);
        assert!("klingon".parse::<StopwordSource>().is_err());
    }
}
