//! Error types for tannoy.

use crate::inventory::InventoryEntry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TannoyError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Request errors
    #[error("No audio recorded for {entry}")]
    MissingInventoryEntry { entry: InventoryEntry },

    #[error("Invalid segment '{id}': {message}")]
    InvalidSegment { id: String, message: String },

    #[error("Announcement produced no segments")]
    EmptySegmentList,

    #[error("Failed to parse announcement request: {message}")]
    RequestParse { message: String },

    #[error("Unknown preset '{name}' for {system}")]
    UnknownPreset { system: String, name: String },

    #[error("Unknown announcement button '{label}' for {system}")]
    UnknownButton { system: String, label: String },

    #[error("{system} has no {kind} announcement")]
    UnsupportedAnnouncement { system: String, kind: String },

    #[error("Unknown announcement system '{id}'")]
    UnknownSystem { id: String },

    // Assembly errors
    #[error("Failed to fetch {locator}: {message}")]
    FetchFailure { locator: String, message: String },

    #[error("Fetching clips timed out after {timeout_ms}ms")]
    FetchTimeout { timeout_ms: u64 },

    #[error("Failed to decode {locator}: {message}")]
    DecodeFailure { locator: String, message: String },

    // Output errors
    #[error("Failed to encode announcement: {message}")]
    EncodingFailure { message: String },

    #[error("Failed to write {path}: {source}")]
    ExportWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio playback failed: {message}")]
    Playback { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, TannoyError>;

impl From<InventoryEntry> for TannoyError {
    fn from(entry: InventoryEntry) -> Self {
        TannoyError::MissingInventoryEntry { entry }
    }
}
