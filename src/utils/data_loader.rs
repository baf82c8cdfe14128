//! Data loading utilities

use crate::error::{PredictorError, Result};
use crate::preprocessing::MISSING_TEXT_PLACEHOLDER;
use crate::record::JobPosting;
use ndarray::Array1;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

const INFER_SCHEMA_ROWS: usize = 100;

/// Postings with their known salaries, row-aligned
#[derive(Debug, Clone)]
pub struct PostingsDataset {
    pub postings: Vec<JobPosting>,
    pub target: Array1<f64>,
}

impl PostingsDataset {
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Loads the postings CSV
pub struct DataLoader {
    target_column: String,
    categorical_column: String,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            target_column: "target".to_string(),
            categorical_column: "state".to_string(),
        }
    }

    pub fn with_target_column(mut self, name: impl Into<String>) -> Self {
        self.target_column = name.into();
        self
    }

    pub fn with_categorical_column(mut self, name: impl Into<String>) -> Self {
        self.categorical_column = name.into();
        self
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PredictorError::DataError(format!("cannot open {}: {}", path.display(), e))
        })?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PredictorError::DataError(e.to_string()))
    }

    pub fn load_postings(&self, path: impl AsRef<Path>) -> Result<PostingsDataset> {
        let start = Instant::now();
        let df = self.load_csv(path.as_ref())?;
        let dataset = self.postings_from_frame(&df)?;
        tracing::info!(
            path = %path.as_ref().display(),
            rows = dataset.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded postings"
        );
        Ok(dataset)
    }

    /// Convert a loaded frame into postings and targets
    pub fn postings_from_frame(&self, df: &DataFrame) -> Result<PostingsDataset> {
        let n = df.height();
        if n == 0 {
            return Err(PredictorError::DataError("dataset has no rows".to_string()));
        }

        let target = required_f64(df, &self.target_column)?;
        let n_missing = target.iter().filter(|v| v.is_none()).count();
        if n_missing > 0 {
            return Err(PredictorError::DataError(format!(
                "target column '{}' has {} missing or non-numeric values",
                self.target_column, n_missing
            )));
        }
        let target: Array1<f64> = target.into_iter().flatten().collect();

        let states = required_strings(df, &self.categorical_column)?;
        let remote = optional_f64(df, "remote_allowed", n)?;
        let contract = optional_flag(df, "work_type_CONTRACT", n)?;
        let full_time = optional_flag(df, "work_type_FULL_TIME", n)?;
        let part_time = optional_flag(df, "work_type_PART_TIME", n)?;
        let company = optional_strings(df, "company_name", n)?;
        let title = optional_strings(df, "title", n)?;
        let description = optional_strings(df, "description", n)?;

        let postings = (0..n)
            .map(|i| JobPosting {
                remote_allowed: remote[i].unwrap_or(0.0),
                work_type_contract: contract[i],
                work_type_full_time: full_time[i],
                work_type_part_time: part_time[i],
                state: states[i]
                    .clone()
                    .unwrap_or_else(|| MISSING_TEXT_PLACEHOLDER.to_string()),
                company_name: company[i].clone(),
                title: title[i].clone(),
                description: description[i].clone(),
            })
            .collect();

        Ok(PostingsDataset { postings, target })
    }
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PredictorError::FeatureNotFound(name.to_string()))
}

fn to_f64(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

fn to_strings(series: &Series) -> Result<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast.str()?.into_iter().map(|v| v.map(str::to_string)).collect())
}

fn required_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    to_f64(column(df, name)?)
}

fn required_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    to_strings(column(df, name)?)
}

fn optional_f64(df: &DataFrame, name: &str, n: usize) -> Result<Vec<Option<f64>>> {
    match column(df, name) {
        Ok(series) => to_f64(series),
        Err(_) => {
            tracing::warn!(column = name, "Column missing, using defaults");
            Ok(vec![None; n])
        }
    }
}

fn optional_flag(df: &DataFrame, name: &str, n: usize) -> Result<Vec<bool>> {
    Ok(optional_f64(df, name, n)?
        .into_iter()
        .map(|v| v.is_some_and(|x| x != 0.0))
        .collect())
}

fn optional_strings(df: &DataFrame, name: &str, n: usize) -> Result<Vec<Option<String>>> {
    match column(df, name) {
        Ok(series) => to_strings(series),
        Err(_) => {
            tracing::warn!(column = name, "Column missing, using defaults");
            Ok(vec![None; n])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_postings_from_frame_fills_defaults() {
        let df = df! {
            "target" => &[50_000.0, 80_000.0],
            "state" => &[Some("CA"), None],
            "remote_allowed" => &[Some(1.0), None],
            "work_type_FULL_TIME" => &[Some(true), None],
            "title" => &[Some(" Analyst "), None],
        }
        .unwrap();

        let dataset = DataLoader::new().postings_from_frame(&df).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.target.to_vec(), vec![50_000.0, 80_000.0]);

        let second = &dataset.postings[1];
        assert_eq!(second.state, "-");
        assert_eq!(second.remote_allowed, 0.0);
        assert!(!second.work_type_full_time);
        assert_eq!(second.title, None);
        assert!(dataset.postings[0].work_type_full_time);
        assert!(!dataset.postings[0].work_type_contract);
    }

    #[test]
    fn test_missing_target_values_rejected() {
        let df = df! {
            "target" => &[Some(1.0), None],
            "state" => &["CA", "NY"],
        }
        .unwrap();
        let err = DataLoader::new().postings_from_frame(&df).unwrap_err();
        assert!(matches!(err, PredictorError::DataError(_)));
    }

    #[test]
    fn test_missing_required_column() {
        let df = df! { "target" => &[1.0] }.unwrap();
        let err = DataLoader::new().postings_from_frame(&df).unwrap_err();
        assert!(matches!(err, PredictorError::FeatureNotFound(c) if c == "state"));
    }

    #[test]
    fn test_load_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "target,state,remote_allowed,work_type_CONTRACT,work_type_FULL_TIME,work_type_PART_TIME,company_name,title,description").unwrap();
        writeln!(file, "65000,CA,1,0,1,0,TechCorp,Data Analyst,Analyze data").unwrap();
        writeln!(file, "40000,TX,,1,0,0,,Driver,").unwrap();
        file.flush().unwrap();

        let dataset = DataLoader::new().load_postings(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.postings[0].company_name.as_deref(), Some("TechCorp"));
        assert_eq!(dataset.postings[1].company_name, None);
        assert!(dataset.postings[1].work_type_contract);
    }
}
