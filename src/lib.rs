//! snapvault — versioned snapshots for a site's content tree.
//!
//! Snapshots a content directory plus auxiliary config files into archives
//! (compressed or directory copies), keeps a bounded history, and restores
//! any archive with an automatic safety snapshot of whatever it overwrites.

pub mod archive;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod filter;
pub mod restore;
pub mod retention;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::VaultError;
pub type Result<T> = std::result::Result<T, VaultError>;
