//! Frequency encoding of a categorical column
//!
//! Each category is replaced by the number of times it appeared in the
//! fitting data. The table is frozen once fitted: encoding never inserts,
//! and categories absent at fit time encode to [`UNSEEN_FREQUENCY`].

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Encoding of a category that was not present during fitting
pub const UNSEEN_FREQUENCY: f64 = 1.0;

/// Frozen category -> occurrence-count table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyMap {
    counts: BTreeMap<String, u64>,
}

impl FrequencyMap {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = BTreeMap::new();
        for value in values {
            *counts.entry(value.as_ref().to_string()).or_insert(0u64) += 1;
        }
        Self { counts }
    }

    /// Two-tier lookup: fitted count, else the unseen fallback
    pub fn lookup(&self, category: &str) -> f64 {
        self.counts
            .get(category)
            .map(|&c| c as f64)
            .unwrap_or(UNSEEN_FREQUENCY)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

/// Fits a [`FrequencyMap`] on one column and encodes values with it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrequencyEncoder {
    map: Option<FrequencyMap>,
}

impl FrequencyEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit<S: AsRef<str>>(&mut self, values: &[S]) -> Result<&mut Self> {
        if values.is_empty() {
            return Err(PredictorError::DataError(
                "cannot fit frequency encoder on an empty column".to_string(),
            ));
        }
        self.map = Some(FrequencyMap::from_values(values));
        Ok(self)
    }

    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<f64>> {
        let map = self.map.as_ref().ok_or(PredictorError::ModelNotFitted)?;
        Ok(values.iter().map(|v| map.lookup(v.as_ref())).collect())
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, values: &[S]) -> Result<Vec<f64>> {
        self.fit(values)?;
        self.transform(values)
    }

    pub fn is_fitted(&self) -> bool {
        self.map.is_some()
    }

    pub fn map(&self) -> Option<&FrequencyMap> {
        self.map.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_seen_categories() {
        let mut encoder = FrequencyEncoder::new();
        let encoded = encoder.fit_transform(&["CA", "NY", "CA"]).unwrap();
        assert_eq!(encoded, vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn test_unseen_category_encodes_to_one() {
        let mut encoder = FrequencyEncoder::new();
        encoder.fit(&["CA", "CA", "TX"]).unwrap();
        assert_eq!(encoder.transform(&["ZZ"]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_transform_does_not_grow_map() {
        let mut encoder = FrequencyEncoder::new();
        encoder.fit(&["CA", "CA", "TX"]).unwrap();
        let before = encoder.map().unwrap().clone();

        let first = encoder.transform(&["ZZ", "CA"]).unwrap();
        let second = encoder.transform(&["ZZ", "CA"]).unwrap();

        assert_eq!(first, second);
        assert_eq!(encoder.map().unwrap(), &before);
        assert_eq!(before.len(), 2);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let encoder = FrequencyEncoder::new();
        assert!(matches!(
            encoder.transform(&["CA"]),
            Err(PredictorError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_fit_on_empty_column_fails() {
        let mut encoder = FrequencyEncoder::new();
        let empty: [&str; 0] = [];
        assert!(encoder.fit(&empty).is_err());
    }
}
