//! The load → filter → summarize pipeline behind every front end.

use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisResult;
use crate::filter::{FilterSpec, apply};
use crate::model::TripDataset;
use crate::parser::load_city;
use crate::stats::report::SummaryReport;

/// What a front end (prompt loop, one-shot command, export) needs from the
/// pipeline.
pub trait TripAnalysis {
    /// Loads the selected city, applies the filters and summarizes the result.
    fn submit_filter(&self, spec: &FilterSpec) -> AnalysisResult<SummaryReport>;
}

#[derive(Debug, Clone)]
pub struct TripStatsEngine {
    catalog: Catalog,
    data_dir: PathBuf,
    reference_year: i32,
}

impl TripStatsEngine {
    pub fn new(catalog: Catalog, data_dir: impl Into<PathBuf>, reference_year: i32) -> Self {
        Self {
            catalog,
            data_dir: data_dir.into(),
            reference_year,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> AnalysisResult<Self> {
        Ok(Self::new(
            config.catalog()?,
            config.data_dir.clone(),
            config.reference_year,
        ))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Ingests one city's source.
    pub fn load(&self, city: &str) -> AnalysisResult<TripDataset> {
        load_city(&self.catalog, &self.data_dir, city)
    }

    /// Filters an already loaded dataset and summarizes it.
    pub fn analyze(&self, dataset: &TripDataset, spec: &FilterSpec) -> SummaryReport {
        let view = apply(dataset, spec);
        SummaryReport::build(&view, spec, self.reference_year)
    }
}

impl TripAnalysis for TripStatsEngine {
    #[tracing::instrument(skip(self), fields(city = %spec.city()))]
    fn submit_filter(&self, spec: &FilterSpec) -> AnalysisResult<SummaryReport> {
        let dataset = self.load(spec.city())?;
        Ok(self.analyze(&dataset, spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use std::env;
    use std::fs;

    fn data_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_submit_filter_end_to_end() {
        let dir = data_dir(
            "bikeshare_stats_engine_e2e",
            &[(
                "chicago.csv",
                "Start Time,Trip Duration\n\
                 2017-01-02 08:00:00,300\n\
                 2017-01-09 08:30:00,900\n\
                 2017-01-03 17:00:00,2000\n",
            )],
        );
        let engine = TripStatsEngine::new(Catalog::builtin(), &dir, 2024);
        let spec = FilterSpec::new("Chicago", "all", "monday").unwrap();
        let report = engine.submit_filter(&spec).unwrap();

        assert_eq!(report.total_records, 3);
        assert_eq!(report.matched_records, 2);
        let time = report.time.available().unwrap();
        assert_eq!((time.peak_hour.hour, time.peak_hour.count), (8, 2));
    }

    #[test]
    fn test_submit_filter_missing_source() {
        let dir = data_dir("bikeshare_stats_engine_missing", &[]);
        let engine = TripStatsEngine::new(Catalog::builtin(), &dir, 2024);
        let spec = FilterSpec::unfiltered("washington").unwrap();
        let err = engine.submit_filter(&spec).unwrap_err();
        assert!(matches!(err, AnalysisError::DataSourceNotFound { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_submit_filter_zero_rows() {
        let dir = data_dir(
            "bikeshare_stats_engine_zero_rows",
            &[("washington.csv", "Start Time,Trip Duration,User Type\n")],
        );
        let engine = TripStatsEngine::new(Catalog::builtin(), &dir, 2024);
        let report = engine
            .submit_filter(&FilterSpec::unfiltered("washington").unwrap())
            .unwrap();
        assert!(report.empty);
        assert!(report.group_status().iter().all(|(_, s)| *s == "no_data"));
    }
}
