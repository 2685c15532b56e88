//! tannoy - Railway announcements assembled from recorded clips
//!
//! Structured requests are validated against a voice pack's inventory, turned
//! into clip sequences by the pack's rules, then fetched, joined and played or
//! saved as WAV.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod request;
pub mod rules;
pub mod segments;
pub mod stations;
pub mod systems;
pub mod validate;

// Composition root - needs the CLI types
#[cfg(feature = "cli")]
pub mod app;

// Core traits (source → assemble → output)
pub use audio::playback::{PlaybackDevice, PlaybackHandle, PlaybackState};
pub use audio::source::ClipSource;

// Engine
pub use audio::assembler::Assembler;
pub use audio::buffer::AssembledAudio;
pub use engine::{Engine, Outcome, RenderMode};

// Domain
pub use inventory::{Category, InventoryEntry, InventoryIndex, Variant};
pub use request::AnnouncementRequest;
pub use segments::{SegmentRef, pluralise};
pub use systems::{AnnouncementSystem, SystemId};

// Error handling
pub use error::{Result, TannoyError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
