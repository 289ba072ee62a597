use std::path::PathBuf;

use clap::Parser;

use crate::types::{LogLevel, TestLevel};

#[derive(Parser, Debug)]
#[command(
    name = "label-adapter-rs",
    about = "Sync maintenance-due labels from CSV reports to the BlackBerry Radar system"
)]
pub struct Cli {
    /// Directory to scan for CSV report files
    pub report_directory: PathBuf,

    /// Directory where processed reports are archived
    pub report_archive_directory: PathBuf,

    /// Component-code whitelist file (one code per line, case-insensitive)
    #[arg(short = 'w', long, default_value = "component_code_whitelist.txt")]
    pub whitelist: PathBuf,

    /// PEM-encoded EC private key used to sign token assertions
    #[arg(short = 'k', long, default_value = "key.pem")]
    pub key: PathBuf,

    /// OAuth client identifier used as both issuer and subject of the assertion
    #[arg(long, env = "RADAR_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Log level
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Test level: which scopes hit the real API versus canned responses
    #[arg(short = 't', long, value_enum, default_value = "production")]
    pub test_level: TestLevel,
}
