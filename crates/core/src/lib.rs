//! folderfort-core - Core library for the folderfort CLI
//!
//! This library talks to a FolderFort drive API: it looks up entries, creates
//! folders idempotently, uploads files with optional overwrite and mirrors a
//! local directory tree onto the drive.

pub mod client;
pub mod config;
pub mod entry;
pub mod error;
pub mod sync;
pub mod throttle;
pub mod transport;
pub mod upload;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use client::DriveClient;
pub use config::{
    get_config_path, load_config, load_config_from, load_config_or_default,
    save_config, save_config_to, validate_config,
};
pub use config::{ApiConfig, ConfigFile, LoggingConfig, SyncConfig, TOKEN_ENV_VAR};
pub use entry::{EntryId, EntryType, IndexEntry};
pub use error::{Error, Result};
pub use sync::{ExclusionSet, SyncOptions, SyncReport, DEFAULT_EXCLUDE_PATTERNS, DEFAULT_MAX_FILE_SIZE};
pub use throttle::{LeakyBucket, RateLimiter, DEFAULT_UPLOAD_INTERVAL};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, DEFAULT_BASE_URL};
pub use upload::{guess_mime_type, DEFAULT_MIME_TYPE};
