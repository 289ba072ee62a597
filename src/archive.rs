//! Archiving and retention for processed report files.
//!
//! Each run gets a dated directory under the archive root that receives the
//! processed CSVs and the run's log file. At startup the oldest run directory
//! is force-deleted once the root holds more than the retention count.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

const RUN_DIR_SUFFIX: &str = "_csv_reports";
const RUN_DIR_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";

pub struct Archiver {
    archive_root: PathBuf,
    run_dir: PathBuf,
}

impl Archiver {
    /// Create the dated run directory for this invocation.
    pub fn create(archive_root: &Path) -> Result<Self> {
        let stamp = Local::now().format(RUN_DIR_TIMESTAMP);
        let run_dir = archive_root.join(format!("{stamp}{RUN_DIR_SUFFIX}"));
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create archive directory {}", run_dir.display()))?;
        Ok(Self {
            archive_root: archive_root.to_path_buf(),
            run_dir,
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Move processed reports into the run directory, or copy them when
    /// `copy_only` (test runs leave the input directory untouched).
    /// Failures are logged per file; archiving never aborts the run.
    pub fn archive(&self, files: &[PathBuf], copy_only: bool) {
        tracing::debug!(
            "Archiving {} CSV(s) to {}",
            files.len(),
            self.run_dir.display()
        );
        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = self.run_dir.join(name);
            let result = if copy_only {
                std::fs::copy(file, &dest).map(|_| ())
            } else {
                move_file(file, &dest)
            };
            if let Err(e) = result {
                tracing::error!("Failed to archive {}: {e}", file.display());
            }
        }
    }

    /// Force-delete the oldest run directory once the root holds more than
    /// `max_runs` of them. Directories whose names don't parse as run
    /// timestamps are left alone.
    pub fn prune(&self, max_runs: usize) {
        let entries = match std::fs::read_dir(&self.archive_root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(
                    "Failed to list archive root {}: {e}",
                    self.archive_root.display()
                );
                return;
            }
        };

        let mut runs: Vec<(NaiveDateTime, PathBuf)> = Vec::new();
        let mut dir_count = 0usize;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            dir_count += 1;
            let name = entry.file_name();
            match parse_run_timestamp(&name.to_string_lossy()) {
                Some(ts) => runs.push((ts, path)),
                None => {
                    tracing::warn!(
                        "Could not extract timestamp from '{}'",
                        name.to_string_lossy()
                    );
                }
            }
        }

        if dir_count <= max_runs {
            tracing::debug!("Archive directory count within the retention limit");
            return;
        }
        let Some((_, oldest)) = runs.into_iter().min() else {
            tracing::info!("No archive directories with parseable timestamps found");
            return;
        };
        match std::fs::remove_dir_all(&oldest) {
            Ok(()) => tracing::info!("Force-deleted oldest archive: {}", oldest.display()),
            Err(e) => tracing::error!("Error deleting {}: {e}", oldest.display()),
        }
    }
}

/// Rename, falling back to copy+remove for cross-device moves.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
    }
}

fn parse_run_timestamp(dir_name: &str) -> Option<NaiveDateTime> {
    let stamp = dir_name.strip_suffix(RUN_DIR_SUFFIX)?;
    NaiveDateTime::parse_from_str(stamp, RUN_DIR_TIMESTAMP).ok()
}
