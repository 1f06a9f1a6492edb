//! Utility modules for snapvault.

pub mod errors;
pub mod logger;

pub use errors::{Result, VaultError};

/// Format a byte count as a human-readable size.
pub fn format_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / MB)
    }
}
