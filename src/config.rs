use chrono::{Datelike, Utc};
use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::error::{AnalysisError, AnalysisResult};

pub const DATA_DIR_VAR: &str = "BIKESHARE_DATA_DIR";
pub const CATALOG_VAR: &str = "BIKESHARE_CATALOG";
pub const REFERENCE_YEAR_VAR: &str = "BIKESHARE_REFERENCE_YEAR";

/// Where trip data lives and how ages are computed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub data_dir: PathBuf,
    /// JSON catalog replacing the built-in city list.
    pub catalog_path: Option<PathBuf>,
    /// Year ages are measured against.
    pub reference_year: i32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            catalog_path: None,
            reference_year: Utc::now().year(),
        }
    }
}

impl AnalyzerConfig {
    /// Reads `BIKESHARE_DATA_DIR`, `BIKESHARE_CATALOG` and
    /// `BIKESHARE_REFERENCE_YEAR`, falling back to defaults when unset.
    pub fn from_env() -> AnalysisResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AnalysisResult<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        config.catalog_path = lookup(CATALOG_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        if let Some(year) = lookup(REFERENCE_YEAR_VAR) {
            config.reference_year = parse_year(&year)?;
        }
        Ok(config)
    }

    pub fn catalog(&self) -> AnalysisResult<Catalog> {
        match &self.catalog_path {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

pub fn parse_year(value: &str) -> AnalysisResult<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1800..=9999).contains(y))
        .ok_or_else(|| AnalysisError::InvalidConfig {
            key: REFERENCE_YEAR_VAR,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AnalyzerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.reference_year, Utc::now().year());
    }

    #[test]
    fn test_values_from_environment() {
        let config = AnalyzerConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/srv/bikeshare"),
            (CATALOG_VAR, "cities.json"),
            (REFERENCE_YEAR_VAR, " 2017 "),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/bikeshare"));
        assert_eq!(config.catalog_path, Some(PathBuf::from("cities.json")));
        assert_eq!(config.reference_year, 2017);
    }

    #[test]
    fn test_bad_reference_year() {
        let result = AnalyzerConfig::from_lookup(lookup(&[(REFERENCE_YEAR_VAR, "soon")]));
        assert!(matches!(result, Err(AnalysisError::InvalidConfig { .. })));
        assert!(parse_year("99").is_err());
    }

    #[test]
    fn test_builtin_catalog_without_path() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.catalog().unwrap(), Catalog::builtin());
    }
}
