use std::path::{Path, PathBuf};
use std::sync::Once;
use std::{env, fs};

use crate::errors::LedgerError;

const DEFAULT_DIR_NAME: &str = ".vantt_core";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("vantt_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
    });
}

/// Returns the application-specific data directory, defaulting to
/// `~/.vantt_core`. The `VANTT_CORE_HOME` environment variable overrides it.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("VANTT_CORE_HOME") {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn ensure_dir(path: &Path) -> Result<(), LedgerError> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Rounds a monetary value to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
