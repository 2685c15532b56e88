use crate::defaults;
use crate::error::{Result, TannoyError};
use crate::systems::SystemId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub source: SourceConfig,
    pub export: ExportConfig,
    pub announcement: AnnouncementConfig,
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name; `None` uses the system default.
    pub device: Option<String>,
    /// Rate every clip is resampled to before joining.
    pub sample_rate: u32,
}

/// Where clips are fetched from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Directory holding the `/audio` tree, for `filesystem`.
    pub root: PathBuf,
    /// Server root, for `http`.
    pub base_url: Option<String>,
    pub extension: String,
    /// Zero disables the timeout.
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Filesystem,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnouncementConfig {
    pub system: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Filesystem,
            root: PathBuf::from("audio"),
            base_url: None,
            extension: defaults::CLIP_EXTENSION.to_string(),
            fetch_timeout_secs: defaults::FETCH_TIMEOUT_SECS,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: defaults::EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            system: defaults::DEFAULT_SYSTEM.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(TannoyError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TANNOY_AUDIO_ROOT → source.root (and source.kind = filesystem)
    /// - TANNOY_BASE_URL → source.base_url (and source.kind = http)
    /// - TANNOY_AUDIO_DEVICE → audio.device
    /// - TANNOY_SYSTEM → announcement.system
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(root) = std::env::var("TANNOY_AUDIO_ROOT")
            && !root.is_empty()
        {
            self.source.root = PathBuf::from(root);
            self.source.kind = SourceKind::Filesystem;
        }

        if let Ok(base_url) = std::env::var("TANNOY_BASE_URL")
            && !base_url.is_empty()
        {
            self.source.base_url = Some(base_url);
            self.source.kind = SourceKind::Http;
        }

        if let Ok(device) = std::env::var("TANNOY_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(system) = std::env::var("TANNOY_SYSTEM")
            && !system.is_empty()
        {
            self.announcement.system = system;
        }

        self
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(TannoyError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.source.extension.trim().is_empty() {
            return Err(TannoyError::ConfigInvalidValue {
                key: "source.extension".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.source.kind == SourceKind::Http && self.source.base_url.is_none() {
            return Err(TannoyError::ConfigInvalidValue {
                key: "source.base_url".to_string(),
                message: "required when source.kind = \"http\"".to_string(),
            });
        }
        if self.export.file_name.trim().is_empty() {
            return Err(TannoyError::ConfigInvalidValue {
                key: "export.file_name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        self.system_id().map(|_| ())
    }

    pub fn system_id(&self) -> Result<SystemId> {
        self.announcement.system.parse()
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/tannoy/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tannoy")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_tannoy_env() {
        remove_env("TANNOY_AUDIO_ROOT");
        remove_env("TANNOY_BASE_URL");
        remove_env("TANNOY_AUDIO_DEVICE");
        remove_env("TANNOY_SYSTEM");
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.audio.device, None);
        assert_eq!(config.audio.sample_rate, 44100);

        assert_eq!(config.source.kind, SourceKind::Filesystem);
        assert_eq!(config.source.root, PathBuf::from("audio"));
        assert_eq!(config.source.base_url, None);
        assert_eq!(config.source.extension, "mp3");
        assert_eq!(config.source.fetch_timeout_secs, 30);

        assert_eq!(config.export.file_name, "announcement.wav");
        assert_eq!(config.announcement.system, "atos-anne");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_config(
            r#"
            [audio]
            device = "pulse"
            sample_rate = 48000

            [source]
            kind = "http"
            base_url = "https://example.org"
            extension = "wav"
            fetch_timeout_secs = 5

            [export]
            file_name = "platform-1.wav"

            [announcement]
            system = "atos-anne"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.audio.device, Some("pulse".to_string()));
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.source.kind, SourceKind::Http);
        assert_eq!(config.source.base_url.as_deref(), Some("https://example.org"));
        assert_eq!(config.source.extension, "wav");
        assert_eq!(config.source.fetch_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.export.file_name, "platform-1.wav");
        assert_eq!(config.system_id().unwrap(), SystemId::AtosAnne);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_config(
            r#"
            [source]
            root = "/srv/tannoy"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.source.root, PathBuf::from("/srv/tannoy"));
        assert_eq!(config.source.extension, "mp3");
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.announcement.system, "atos-anne");
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let source = SourceConfig {
            fetch_timeout_secs: 0,
            ..SourceConfig::default()
        };
        assert_eq!(source.fetch_timeout(), None);
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/tannoy/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let temp_file = write_config("invalid = toml = syntax");
        let result = Config::load_or_default(temp_file.path());
        assert!(matches!(result, Err(TannoyError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.audio.sample_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(TannoyError::ConfigInvalidValue { key, .. }) if key == "audio.sample_rate"
        ));

        let mut config = Config::default();
        config.source.kind = SourceKind::Http;
        assert!(matches!(
            config.validate(),
            Err(TannoyError::ConfigInvalidValue { key, .. }) if key == "source.base_url"
        ));

        let mut config = Config::default();
        config.announcement.system = "unknown-voice".to_string();
        assert!(matches!(
            config.validate(),
            Err(TannoyError::UnknownSystem { .. })
        ));
    }

    #[test]
    fn test_env_override_audio_root() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_tannoy_env();

        set_env("TANNOY_AUDIO_ROOT", "/mnt/clips");
        let mut config = Config::default();
        config.source.kind = SourceKind::Http;
        let config = config.with_env_overrides();

        assert_eq!(config.source.root, PathBuf::from("/mnt/clips"));
        assert_eq!(config.source.kind, SourceKind::Filesystem);

        clear_tannoy_env();
    }

    #[test]
    fn test_env_override_base_url_switches_to_http() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_tannoy_env();

        set_env("TANNOY_BASE_URL", "https://example.org");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.source.kind, SourceKind::Http);
        assert_eq!(config.source.base_url.as_deref(), Some("https://example.org"));

        clear_tannoy_env();
    }

    #[test]
    fn test_env_override_device_and_system() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_tannoy_env();

        set_env("TANNOY_AUDIO_DEVICE", "hw:1,0");
        set_env("TANNOY_SYSTEM", "ATOS-ANNE");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.audio.device, Some("hw:1,0".to_string()));
        assert_eq!(config.system_id().unwrap(), SystemId::AtosAnne);

        clear_tannoy_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_tannoy_env();

        set_env("TANNOY_AUDIO_DEVICE", "");
        set_env("TANNOY_SYSTEM", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config, Config::default());

        clear_tannoy_env();
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }
}
