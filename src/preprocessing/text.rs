//! Text normalization for job postings
//!
//! Builds the augmented description (company, title and description joined
//! by single spaces, missing parts replaced with a placeholder) and cleans it
//! for embedding: non-word characters become spaces, text is lowercased and
//! stop words are dropped.

use crate::error::{PredictorError, Result};
use crate::record::JobPosting;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Substitute for a missing text field
pub const MISSING_TEXT_PLACEHOLDER: &str = "-";

/// Set of words removed by [`TextNormalizer::clean`].
///
/// Loaded from a JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Read the stop-word list from `path`.
    ///
    /// Any failure is reported as [`PredictorError::StopWordsUnavailable`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unavailable = |reason: String| PredictorError::StopWordsUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let words: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| unavailable(e.to_string()))?;
        Ok(Self::from_words(words))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Turns postings into cleaned text ready for embedding
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    non_word: Regex,
    stop_words: Arc<StopWords>,
}

impl TextNormalizer {
    pub fn new(stop_words: Arc<StopWords>) -> Result<Self> {
        Ok(Self {
            non_word: Regex::new(r"\W")?,
            stop_words,
        })
    }

    /// `company_name + " " + title + " " + description`, title trimmed,
    /// missing fields replaced by [`MISSING_TEXT_PLACEHOLDER`]
    pub fn augmented_description(&self, posting: &JobPosting) -> String {
        let company = posting
            .company_name
            .as_deref()
            .unwrap_or(MISSING_TEXT_PLACEHOLDER);
        let title = posting
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(MISSING_TEXT_PLACEHOLDER);
        let description = posting
            .description
            .as_deref()
            .unwrap_or(MISSING_TEXT_PLACEHOLDER);
        format!("{company} {title} {description}")
    }

    /// Idempotent: `clean(clean(s)) == clean(s)`
    pub fn clean(&self, text: &str) -> String {
        let spaced = self.non_word.replace_all(text, " ").to_lowercase();
        spaced
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn normalize(&self, posting: &JobPosting) -> String {
        self.clean(&self.augmented_description(posting))
    }

    pub fn normalize_batch(&self, postings: &[JobPosting]) -> Vec<String> {
        postings.par_iter().map(|p| self.normalize(p)).collect()
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn normalizer() -> TextNormalizer {
        let stop_words = StopWords::from_words(["and", "the", "a", "of"]);
        TextNormalizer::new(Arc::new(stop_words)).unwrap()
    }

    fn posting(company: Option<&str>, title: Option<&str>, description: Option<&str>) -> JobPosting {
        JobPosting {
            remote_allowed: 0.0,
            work_type_contract: false,
            work_type_full_time: true,
            work_type_part_time: false,
            state: "CA".to_string(),
            company_name: company.map(str::to_string),
            title: title.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_augmented_description_fills_and_trims() {
        let n = normalizer();
        let p = posting(None, Some("  Data Analyst "), Some("Reports"));
        assert_eq!(n.augmented_description(&p), "- Data Analyst Reports");
    }

    #[test]
    fn test_clean_example() {
        let n = normalizer();
        let p = posting(
            Some("TechCorp"),
            Some("Data Analyst"),
            Some("Analyze data and create reports"),
        );
        assert_eq!(
            n.normalize(&p),
            "techcorp data analyst analyze data create reports"
        );
    }

    #[test]
    fn test_clean_strips_punctuation_and_placeholder() {
        let n = normalizer();
        assert_eq!(n.clean("C++/Rust - Engineer!"), "c rust engineer");
        assert_eq!(n.clean("- - -"), "");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let n = normalizer();
        let once = n.clean("The Head-of Sales, and Marketing (Remote) @ ACME");
        assert_eq!(n.clean(&once), once);
    }

    #[test]
    fn test_load_stop_words() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["the", "and", "of"]"#).unwrap();
        let words = StopWords::load(file.path()).unwrap();
        assert_eq!(words.len(), 3);
        assert!(words.contains("and"));
    }

    #[test]
    fn test_load_missing_stop_words() {
        let err = StopWords::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, PredictorError::StopWordsUnavailable { .. }));
    }
}
