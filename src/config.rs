use std::path::PathBuf;

use anyhow::Result;

use crate::cli::Cli;
use crate::radar::endpoints::DEFAULT_CLIENT_ID;
use crate::types::{LogLevel, TestLevel};

/// Application configuration derived from the CLI.
pub struct Config {
    pub report_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub whitelist_path: PathBuf,
    pub key_path: PathBuf,
    pub client_id: String,
    pub log_level: LogLevel,
    pub test_level: TestLevel,
    pub max_archived_runs: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("report_dir", &self.report_dir)
            .field("archive_dir", &self.archive_dir)
            .field("whitelist_path", &self.whitelist_path)
            .field("key_path", &self.key_path)
            .field("client_id", &"<redacted>")
            .field("test_level", &self.test_level)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if !cli.report_directory.is_dir() {
            anyhow::bail!(
                "{} is not a valid directory",
                cli.report_directory.display()
            );
        }

        let max_archived_runs = cli.test_level.max_archived_runs();
        Ok(Self {
            report_dir: cli.report_directory,
            archive_dir: cli.report_archive_directory,
            whitelist_path: cli.whitelist,
            key_path: cli.key,
            client_id: cli
                .client_id
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            log_level: cli.log_level,
            test_level: cli.test_level,
            max_archived_runs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(
            std::iter::once("label-adapter-rs").chain(args.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn test_from_cli_missing_report_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let cli = parse(&[
            missing.to_str().unwrap(),
            tmp.path().to_str().unwrap(),
        ]);
        assert!(Config::from_cli(cli).is_err());
    }

    #[test]
    fn test_from_cli_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = parse(&[
            tmp.path().to_str().unwrap(),
            tmp.path().to_str().unwrap(),
        ]);
        let cfg = Config::from_cli(cli).unwrap();
        assert_eq!(cfg.test_level, TestLevel::Production);
        assert_eq!(cfg.max_archived_runs, 24);
        assert_eq!(cfg.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(cfg.whitelist_path, PathBuf::from("component_code_whitelist.txt"));
    }

    #[test]
    fn test_from_cli_test_level_retention() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = parse(&[
            tmp.path().to_str().unwrap(),
            tmp.path().to_str().unwrap(),
            "--test-level",
            "full-test",
        ]);
        let cfg = Config::from_cli(cli).unwrap();
        assert_eq!(cfg.max_archived_runs, 5);
        assert!(!cfg.test_level.can_read());
    }
}
