//! Catalog of per-city trip sources.
//!
//! The built-in catalog can be replaced by a JSON file:
//! ```json
//! [
//!   { "name": "chicago", "file": "chicago.csv", "center": [41.8781, -87.6298] },
//!   { "name": "washington", "file": "washington.csv.gz" }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, AnalysisResult};

/// Built-in sources: name, file name, map centre (lat, lon).
static BUILTIN: &[(&str, &str, [f64; 2])] = &[
    ("chicago", "chicago.csv", [41.8781, -87.6298]),
    ("new york city", "new_york_city.csv", [40.7589, -73.9851]),
    ("washington", "washington.csv", [38.9072, -77.0369]),
];

/// One city's data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySource {
    pub name: String,
    pub file: String,
    /// Map centre as `[latitude, longitude]`.
    #[serde(default)]
    pub center: Option<[f64; 2]>,
}

/// A located source file, possibly gzip-compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFile {
    Plain(PathBuf),
    Gzip(PathBuf),
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        match self {
            SourceFile::Plain(p) | SourceFile::Gzip(p) => p,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: Vec<CitySource>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(name, file, center)| CitySource {
                name: name.to_string(),
                file: file.to_string(),
                center: Some(*center),
            })
            .collect();
        Self { entries }
    }

    /// Loads the catalog from a JSON file at `path`. City names are normalized
    /// to trimmed lower case.
    pub fn load(path: &Path) -> AnalysisResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<CitySource> =
            serde_json::from_str(&content).map_err(|source| AnalysisError::Catalog {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<CitySource>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.name = e.name.trim().to_lowercase();
                e
            })
            .collect();
        Self { entries }
    }

    pub fn find(&self, city: &str) -> Option<&CitySource> {
        let city = city.trim().to_lowercase();
        self.entries.iter().find(|e| e.name == city)
    }

    /// City names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CitySource> {
        self.entries.iter()
    }

    /// Locates `city`'s file under `data_dir`, falling back to a `.gz` sibling
    /// when the plain file is absent.
    pub fn locate(&self, data_dir: &Path, city: &str) -> AnalysisResult<SourceFile> {
        let source = self
            .find(city)
            .ok_or_else(|| AnalysisError::invalid("city", city))?;

        let path = data_dir.join(&source.file);
        if path.is_file() {
            return Ok(if source.file.ends_with(".gz") {
                SourceFile::Gzip(path)
            } else {
                SourceFile::Plain(path)
            });
        }

        let gz = data_dir.join(format!("{}.gz", source.file));
        if gz.is_file() {
            return Ok(SourceFile::Gzip(gz));
        }

        Err(AnalysisError::DataSourceNotFound {
            city: source.name.clone(),
            path,
        })
    }

    /// Every catalog entry with whether its source exists under `data_dir`.
    pub fn availability(&self, data_dir: &Path) -> Vec<(&CitySource, bool)> {
        self.entries
            .iter()
            .map(|e| (e, self.locate(data_dir, &e.name).is_ok()))
            .collect()
    }
}

/// Resolves user input against an ordered option list. Accepts an option
/// name (case-insensitive) or its 1-based position.
pub fn resolve_choice<'a>(input: &str, options: &[&'a str]) -> Option<&'a str> {
    let input = input.trim().to_lowercase();
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| options.get(i)).copied();
    }
    options.iter().copied().find(|o| o.to_lowercase() == input)
}
