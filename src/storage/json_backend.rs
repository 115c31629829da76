//! File-per-ledger JSON persistence. Layout under the store root:
//!
//! ```text
//! ledgers/<slug>.json          live ledger files
//! backups/<slug>/<stamp>.json  timestamped snapshots, newest kept
//! state.json                   last-opened ledger
//! ```
//!
//! Saves are staged to a sibling `.tmp` file and renamed into place, so an
//! interrupted write never clobbers the previous ledger file.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::LedgerError;
use crate::ledger::{Ledger, CURRENT_SCHEMA_VERSION};
use crate::utils::{app_data_dir, ensure_dir};

use super::{LoadReport, Result, StorageBackend};

const DEFAULT_RETENTION: usize = 5;
const BACKUP_STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// JSON storage rooted at one directory, with per-ledger backup rotation.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = root.unwrap_or_else(app_data_dir);
        let store = Self {
            root,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        };
        ensure_dir(&store.ledgers_dir())?;
        ensure_dir(&store.backups_root())?;
        Ok(store)
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    fn ledgers_dir(&self) -> PathBuf {
        self.root.join("ledgers")
    }

    fn backups_root(&self) -> PathBuf {
        self.root.join("backups")
    }

    fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn ledger_path(&self, name: &str) -> PathBuf {
        self.ledgers_dir().join(format!("{}.json", slug(name)))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_root().join(slug(name))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    /// Name of the ledger most recently recorded via
    /// [`Self::record_last_ledger`], if any.
    pub fn last_ledger(&self) -> Result<Option<String>> {
        Ok(self.read_state()?.last_ledger)
    }

    pub fn record_last_ledger(&self, name: Option<&str>) -> Result<()> {
        let state = StoreState {
            last_ledger: name.map(slug),
        };
        stage_and_swap(&self.state_path(), &serde_json::to_string_pretty(&state)?)
    }

    fn read_state(&self) -> Result<StoreState> {
        match fs::read_to_string(self.state_path()) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreState::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn load_from_path(&self, path: &Path) -> Result<LoadReport> {
        load_ledger_from_path(path)
    }

    pub fn save_to_path(&self, ledger: &Ledger, path: &Path) -> Result<()> {
        if path.starts_with(self.ledgers_dir()) {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                self.snapshot_live_file(stem)?;
            }
        }
        save_ledger_to_path(ledger, path)
    }

    /// Copies the current live file (if any) into the backup directory.
    /// Called before every overwrite, so the previous state is always one
    /// restore away.
    fn snapshot_live_file(&self, name: &str) -> Result<()> {
        let live = self.ledger_path(name);
        if !live.exists() {
            return Ok(());
        }
        let target = self.backup_dir(name).join(backup_file_name(None));
        ensure_dir(&self.backup_dir(name))?;
        fs::copy(&live, &target)?;
        self.prune(name)
    }

    fn prune(&self, name: &str) -> Result<()> {
        for stale in self.list_backups(name)?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(self.backup_path(name, &stale));
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, ledger: &Ledger, name: &str) -> Result<()> {
        self.snapshot_live_file(name)?;
        save_ledger_to_path(ledger, &self.ledger_path(name))
    }

    fn load(&self, name: &str) -> Result<LoadReport> {
        load_ledger_from_path(&self.ledger_path(name))
    }

    /// Backup file names for `name`, newest first. The timestamp prefix
    /// sorts lexicographically, so no date parsing is involved.
    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    return None;
                }
                path.file_name()
                    .and_then(|file| file.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    fn backup(&self, ledger: &Ledger, name: &str, note: Option<&str>) -> Result<()> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let path = dir.join(backup_file_name(note));
        stage_and_swap(&path, &serde_json::to_string_pretty(ledger)?)?;
        self.prune(name)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<LoadReport> {
        let source = self.backup_path(name, backup_name);
        if !source.exists() {
            return Err(LedgerError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let live = self.ledger_path(name);
        if let Some(parent) = live.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(&source, &live)?;
        load_ledger_from_path(&live)
    }
}

pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    stage_and_swap(path, &serde_json::to_string_pretty(ledger)?)
}

pub fn load_ledger_from_path(path: &Path) -> Result<LoadReport> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&data)?;
    if ledger.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(LedgerError::Storage(format!(
            "ledger `{}` was written by a newer schema (version {})",
            path.display(),
            ledger.schema_version
        )));
    }
    let warnings = ledger_warnings(&ledger);
    if !warnings.is_empty() {
        warn!(
            "ledger `{}` loaded with {} referential warning(s)",
            ledger.name,
            warnings.len()
        );
    }
    Ok(LoadReport { ledger, warnings })
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    last_ledger: Option<String>,
}

/// `<UTC stamp>[-<note slug>].json`
fn backup_file_name(note: Option<&str>) -> String {
    let stamp = Utc::now().format(BACKUP_STAMP_FORMAT);
    match note.map(|raw| slug_with(raw, '-')).filter(|s| !s.is_empty()) {
        Some(label) => format!("{}-{}.json", stamp, label),
        None => format!("{}.json", stamp),
    }
}

/// File-system-safe ledger name: lowercase alphanumerics with runs of
/// anything else collapsed to a single underscore.
fn slug(name: &str) -> String {
    let slugged = slug_with(name, '_');
    if slugged.is_empty() {
        "ledger".into()
    } else {
        slugged
    }
}

fn slug_with(raw: &str, separator: char) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with(separator) && !out.is_empty() {
            out.push(separator);
        }
    }
    out.trim_end_matches(separator).to_string()
}

/// Serializes through a sibling `.tmp` file and renames over the target, so
/// the target is either the old content or the new content, never a torn
/// write.
fn stage_and_swap(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let staged = staged_path(path);
    let mut file = fs::File::create(&staged)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    drop(file);
    fs::rename(&staged, path)?;
    Ok(())
}

fn staged_path(path: &Path) -> PathBuf {
    let mut staged = path.to_path_buf();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => staged.set_extension(format!("{}.tmp", ext)),
        None => staged.set_extension("tmp"),
    };
    staged
}

/// Non-fatal referential checks run after deserializing a ledger. A dangling
/// id is reported, never repaired.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let account_ids: HashSet<_> = ledger.accounts.iter().map(|a| a.id).collect();
    let category_ids: HashSet<_> = ledger.categories.iter().map(|c| c.id).collect();
    let schedule_ids: HashSet<_> = ledger.scheduled_payments.iter().map(|s| s.id).collect();
    let mut warnings = Vec::new();

    for txn in &ledger.transactions {
        if !account_ids.contains(&txn.account_id) {
            warnings.push(format!(
                "transaction {} references unknown account {}",
                txn.id, txn.account_id
            ));
        }
        if let Some(target) = txn.target_account_id {
            if !account_ids.contains(&target) {
                warnings.push(format!(
                    "transaction {} references unknown target account {}",
                    txn.id, target
                ));
            }
        }
        if !category_ids.contains(&txn.category_id) {
            warnings.push(format!(
                "transaction {} references missing category {}",
                txn.id, txn.category_id
            ));
        }
    }
    for budget in &ledger.budgets {
        if !category_ids.contains(&budget.category_id) {
            warnings.push(format!(
                "budget {} references missing category {}",
                budget.id, budget.category_id
            ));
        }
    }
    for rule in &ledger.scheduled_payments {
        if !account_ids.contains(&rule.account_id) {
            warnings.push(format!(
                "scheduled payment {} references unknown account {}",
                rule.id, rule.account_id
            ));
        }
        if !category_ids.contains(&rule.category_id) {
            warnings.push(format!(
                "scheduled payment {} references missing category {}",
                rule.id, rule.category_id
            ));
        }
    }
    for instance in ledger.payment_instances.values() {
        if !schedule_ids.contains(&instance.scheduled_payment_id) {
            warnings.push(format!(
                "payment instance {} references missing schedule {}",
                instance.id, instance.scheduled_payment_id
            ));
        }
    }
    warnings
}
