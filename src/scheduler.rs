//! Fixed-interval backup recurrence.
//!
//! Runs one backup immediately, then repeats every configured interval on
//! the calling thread. The loop is the sole invoker against its backup
//! root, which keeps creates from overlapping. A failed run is logged and
//! the cadence continues.

use crate::backup::BackupService;
use crate::config::Config;
use crate::utils::errors::Result;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

pub fn run(config: &Config) -> Result<()> {
    let service = BackupService::new(config);
    let interval = Duration::from_secs(config.backup_interval_hours * 3600);

    info!(
        interval_hours = config.backup_interval_hours,
        "Starting backup scheduler"
    );

    loop {
        match service.create("Scheduled automatic backup") {
            Ok(record) => info!(name = %record.name, "Scheduled backup finished"),
            Err(e) => error!(error = %e, "Scheduled backup failed"),
        }
        thread::sleep(interval);
    }
}
