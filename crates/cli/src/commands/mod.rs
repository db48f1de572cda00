pub mod ctl;
pub mod run;
pub mod status;
pub mod tail;

use anyhow::Result;
use hivelog_config::AppConfig;
use hivelog_log::LogStore;

/// The log store for the configured log directory.
pub fn open_store() -> Result<LogStore> {
    let config = AppConfig::load()?;
    Ok(LogStore::new(&config.runtime.log_dir))
}
