pub mod json_backend;

use std::path::Path;

use crate::{errors::LedgerError, ledger::Ledger};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Outcome of a load: the ledger plus any non-fatal referential findings
/// (dangling ids the engine will tolerate but the user should know about).
#[derive(Debug)]
pub struct LoadReport {
    pub ledger: Ledger,
    pub warnings: Vec<String>,
}

/// Abstraction over persistence backends capable of storing ledgers and
/// their backups.
pub trait StorageBackend: Send + Sync {
    fn save(&self, ledger: &Ledger, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<LoadReport>;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> Result<()>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<LoadReport>;

    /// Optional helpers for ad-hoc file operations. Default implementations
    /// forward to plain JSON files when not overridden.
    fn save_to_path(&self, ledger: &Ledger, path: &Path) -> Result<()> {
        json_backend::save_ledger_to_path(ledger, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<LoadReport> {
        json_backend::load_ledger_from_path(path)
    }
}

pub use json_backend::{ledger_warnings, JsonStorage};
