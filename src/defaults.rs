//! Default configuration constants for tannoy.
//!
//! Shared by the config layer, the assembler and the CLI so the values stay
//! consistent.

/// Default sample rate of assembled announcements in Hz.
///
/// Every decoded clip is brought to this rate before concatenation.
pub const SAMPLE_RATE: u32 = 44100;

/// Reference rate used to size inserted silence.
///
/// A pre-delay of `ms` becomes `ceil(ms / 1000 * 48000)` silent frames at this
/// rate, before conversion to the assembly rate.
pub const SILENCE_SAMPLE_RATE: u32 = 48000;

/// Root path segment every clip locator starts with.
pub const AUDIO_ROOT: &str = "/audio";

/// File extension of recorded clips.
pub const CLIP_EXTENSION: &str = "mp3";

/// Default identifier of the "and" clip inserted by list pluralisation.
pub const AND_ID: &str = "and";

/// File name used when exporting an announcement.
pub const EXPORT_FILE_NAME: &str = "announcement.wav";

/// Default upper bound for fetching every clip of one announcement.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Announcement system used when none is configured.
pub const DEFAULT_SYSTEM: &str = "atos-anne";

/// Sentinel the presentation layer uses for an absent via station.
pub const NONE_SENTINEL: &str = "none";

/// Sentinel the presentation layer uses for an unknown delay or reason.
pub const UNKNOWN_SENTINEL: &str = "unknown";
