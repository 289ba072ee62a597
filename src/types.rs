use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Info,
    Debug,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Error => "error",
        }
    }
}

/// Controls which scopes the client is allowed to exercise against the real
/// API. Anything not allowed is served from canned fixture responses so a
/// test run still walks the full reconciliation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestLevel {
    /// Real reads and writes.
    Production,
    /// Real reads; writes are simulated.
    #[value(name = "read-only")]
    ReadOnly,
    /// Everything simulated; no network access at all.
    #[value(name = "full-test")]
    FullTest,
}

impl TestLevel {
    pub fn can_read(&self) -> bool {
        matches!(self, TestLevel::Production | TestLevel::ReadOnly)
    }

    pub fn can_write(&self) -> bool {
        matches!(self, TestLevel::Production)
    }

    /// Archive run directories kept before the oldest is pruned.
    /// Test runs churn faster, so they keep a shorter history.
    pub fn max_archived_runs(&self) -> usize {
        match self {
            TestLevel::Production => 24,
            TestLevel::ReadOnly | TestLevel::FullTest => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_flags_per_level() {
        assert!(TestLevel::Production.can_read());
        assert!(TestLevel::Production.can_write());
        assert!(TestLevel::ReadOnly.can_read());
        assert!(!TestLevel::ReadOnly.can_write());
        assert!(!TestLevel::FullTest.can_read());
        assert!(!TestLevel::FullTest.can_write());
    }

    #[test]
    fn test_retention_counts() {
        assert_eq!(TestLevel::Production.max_archived_runs(), 24);
        assert_eq!(TestLevel::ReadOnly.max_archived_runs(), 5);
        assert_eq!(TestLevel::FullTest.max_archived_runs(), 5);
    }
}
