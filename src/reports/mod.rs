//! Label derivation from maintenance-due CSV reports.
//!
//! Each whitelisted report row yields a label `"{description} - {due_percent}"`
//! for its asset. The set of label bases seen across the whole run gates which
//! remote labels are eligible for deletion, so labels sourced from unrelated
//! systems are never touched.

pub mod error;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use self::error::ReportError;

/// Separator between a label's description and its due percentage. Staleness
/// comparison splits on the *last* occurrence.
const BASE_SEPARATOR: &str = " - ";

/// The description prefix of a label, before the last `" - "`. A label with
/// no separator is its own base.
pub fn label_base(label: &str) -> &str {
    match label.rfind(BASE_SEPARATOR) {
        Some(idx) => &label[..idx],
        None => label,
    }
}

pub fn format_label(description: &str, due_percent: &str) -> String {
    format!("{description}{BASE_SEPARATOR}{due_percent}")
}

/// Component-code whitelist: one code per line, compared case-insensitively.
pub struct Whitelist {
    codes: HashSet<String>,
}

impl Whitelist {
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let codes = contents
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect();
        Ok(Self { codes })
    }

    #[cfg(test)]
    pub fn from_codes(codes: &[&str]) -> Self {
        Self {
            codes: codes.iter().map(|c| c.to_lowercase()).collect(),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&code.to_lowercase())
    }
}

/// Desired state derived from all reports in one run: per-asset label sets
/// plus the Processed-Bases Set.
#[derive(Debug, Default)]
pub struct DesiredLabels {
    labels: HashMap<String, BTreeSet<String>>,
    processed_bases: HashSet<String>,
}

impl DesiredLabels {
    pub fn insert(&mut self, asset_identifier: &str, description: &str, due_percent: &str) {
        let label = format_label(description, due_percent);
        tracing::debug!(asset_identifier, %label, "Adding asset label to map");
        self.processed_bases.insert(description.to_string());
        self.labels
            .entry(asset_identifier.to_string())
            .or_default()
            .insert(label);
    }

    /// Desired labels for an asset; assets absent from every report get an
    /// empty set.
    pub fn for_asset(&self, asset_identifier: &str) -> Option<&BTreeSet<String>> {
        self.labels.get(asset_identifier)
    }

    /// Whether any report this run produced a label with this base. Base
    /// matching is global to the run, not per-asset.
    pub fn base_processed(&self, base: &str) -> bool {
        self.processed_bases.contains(base)
    }

    pub fn asset_count(&self) -> usize {
        self.labels.len()
    }
}

#[derive(Debug, Deserialize)]
struct ReportRow {
    #[serde(rename = "UNITNUMBER")]
    unit_number: String,
    #[serde(rename = "DESCRIPTION")]
    description: String,
    #[serde(rename = "DUEPERCENT")]
    due_percent: String,
    #[serde(rename = "COMPCODE")]
    component_code: String,
}

/// CSV files in the report directory, non-recursive.
pub fn find_csv_files(dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    tracing::debug!("Retrieving CSVs from {}", dir.display());
    let entries = std::fs::read_dir(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    tracing::debug!("{} CSV files found", files.len());
    Ok(files)
}

/// Fold one report file into the desired-label map. Malformed rows are
/// logged and skipped; rows with an empty asset key or a component code
/// outside the whitelist contribute nothing.
pub fn process_report(
    path: &Path,
    whitelist: &Whitelist,
    desired: &mut DesiredLabels,
) -> Result<(), ReportError> {
    tracing::debug!("Processing {}", path.display());
    let mut reader = csv::Reader::from_path(path)?;
    for record in reader.deserialize() {
        let row: ReportRow = match record {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping malformed row in {}: {}", path.display(), e);
                continue;
            }
        };
        if row.unit_number.is_empty() {
            continue;
        }
        if !whitelist.contains(&row.component_code) {
            tracing::debug!(
                component_code = %row.component_code,
                "Component code not in whitelist, skipping"
            );
            continue;
        }
        desired.insert(&row.unit_number, &row.description, &row.due_percent);
    }
    Ok(())
}
