pub mod calculation;
pub mod calculator;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod observers;
pub mod operations;
pub mod persistence;
pub mod repl;
pub mod utils;

pub use calculation::Calculation;
pub use calculator::Calculator;
pub use error::{AbacusError, AbacusResult, OperationError, PersistError};
pub use history::{History, HistoryOptions};
pub use observers::{AuditLogObserver, AutoPersistObserver, HistoryObserver, ObserverRegistry};
pub use operations::{create_operation, Operation};
pub use persistence::HistoryStore;
pub use repl::ReplEngine;

/// Abacus version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name
pub const CONFIG_FILE: &str = "config.toml";

/// Default history file name
pub const HISTORY_FILE: &str = "history.json";

/// Maximum calculations kept in history
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 1000;

/// Decimal places results are rounded to
pub const DEFAULT_PRECISION: u32 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
