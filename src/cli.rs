//! Command-line interface for tannoy
//!
//! Provides argument parsing using clap derive macros.

use crate::request::{
    AnnouncementRequest, DisruptedTrainRequest, DisruptionType, NextTrainRequest, parse_sentinel,
};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Railway announcements assembled from recorded clips
#[derive(Parser, Debug)]
#[command(
    name = "tannoy",
    version,
    about = "Railway announcements assembled from recorded clips"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Announcement system (e.g., atos-anne)
    #[arg(long, global = true, value_name = "SYSTEM")]
    pub system: Option<String>,

    /// Directory holding the audio clip tree
    #[arg(long, global = true, value_name = "DIR")]
    pub audio_root: Option<PathBuf>,

    /// Fetch clips over HTTP from this server root instead
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Give up fetching clips after this long (e.g., 30s, 2m; 0 disables)
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_timeout_secs)]
    pub timeout: Option<u64>,
}

/// Parse a timeout string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`), and compound (`1m30s`).
fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List known announcement systems
    Systems,

    /// List the presets of the selected system
    Presets,

    /// List the announcement buttons of the selected system
    Buttons,

    /// List audio output devices
    Devices,

    /// Validate an announcement and print its clip sequence
    Segments {
        #[command(subcommand)]
        announcement: AnnouncementArgs,
    },

    /// Assemble and play an announcement
    Play {
        /// Audio output device (see `tannoy devices`)
        #[arg(long, value_name = "DEVICE")]
        device: Option<String>,

        #[command(subcommand)]
        announcement: AnnouncementArgs,
    },

    /// Assemble an announcement and save it as WAV
    Download {
        /// Output file (default: announcement.wav)
        #[arg(long, short, value_name = "PATH")]
        output: Option<PathBuf>,

        #[command(subcommand)]
        announcement: AnnouncementArgs,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Which announcement to make
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AnnouncementArgs {
    /// Next train departing from a platform
    NextTrain(NextTrainArgs),

    /// Train passing through without stopping
    ThroughTrain {
        #[arg(long, short)]
        platform: String,
    },

    /// Delayed or cancelled train
    DisruptedTrain(DisruptedTrainArgs),

    /// A saved preset of the selected system
    Preset { name: String },

    /// A fixed announcement button (e.g., "BTP 61016")
    Button { label: String },

    /// A request stored as JSON or TOML
    File { path: PathBuf },
}

/// Departure time given as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureTime {
    pub hour: String,
    pub minute: String,
}

fn parse_departure_time(s: &str) -> Result<DepartureTime, String> {
    let (hour, minute) = s
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got '{s}'"))?;
    let valid = |part: &str, max: u32| {
        part.len() == 2 && part.parse::<u32>().is_ok_and(|value| value <= max)
    };
    if !valid(hour, 23) || !valid(minute, 59) {
        return Err(format!("expected HH:MM, got '{s}'"));
    }
    Ok(DepartureTime {
        hour: hour.to_string(),
        minute: minute.to_string(),
    })
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct NextTrainArgs {
    #[arg(long, short)]
    pub platform: String,

    /// Departure time (HH:MM)
    #[arg(long, value_parser = parse_departure_time)]
    pub time: DepartureTime,

    /// Train operating company (e.g., Thameslink)
    #[arg(long)]
    pub toc: String,

    /// CRS code of the terminating station
    #[arg(long = "to", value_name = "CRS")]
    pub terminating: String,

    /// CRS code of the via station
    #[arg(long, value_name = "CRS")]
    pub via: Option<String>,

    /// Comma-separated CRS codes of calling points
    #[arg(long, value_name = "CRS,...", value_delimiter = ',')]
    pub calling_at: Vec<String>,

    /// Number of coaches
    #[arg(long)]
    pub coaches: String,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct DisruptedTrainArgs {
    /// Departure time (HH:MM)
    #[arg(long, value_parser = parse_departure_time)]
    pub time: DepartureTime,

    /// Train operating company (e.g., Thameslink)
    #[arg(long)]
    pub toc: String,

    /// CRS code of the terminating station
    #[arg(long = "to", value_name = "CRS")]
    pub terminating: String,

    /// CRS code of the via station
    #[arg(long, value_name = "CRS")]
    pub via: Option<String>,

    /// Delay in minutes (omit if unknown)
    #[arg(long, value_name = "MINUTES")]
    pub delay: Option<String>,

    /// Disruption reason (omit if unknown)
    #[arg(long)]
    pub reason: Option<String>,

    /// The train is cancelled rather than delayed
    #[arg(long)]
    pub cancelled: bool,

    /// Platform, announced for cancellations
    #[arg(long, short, default_value = "")]
    pub platform: String,
}

/// Configuration actions
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

fn optional(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(parse_sentinel)
}

impl From<NextTrainArgs> for AnnouncementRequest {
    fn from(args: NextTrainArgs) -> Self {
        AnnouncementRequest::NextTrain(NextTrainRequest {
            platform: args.platform,
            hour: args.time.hour,
            minute: args.time.minute,
            toc: args.toc,
            terminating_station_code: args.terminating,
            via: optional(args.via),
            calling_at: args.calling_at,
            coaches: args.coaches,
        })
    }
}

impl From<DisruptedTrainArgs> for AnnouncementRequest {
    fn from(args: DisruptedTrainArgs) -> Self {
        AnnouncementRequest::DisruptedTrain(DisruptedTrainRequest {
            hour: args.time.hour,
            minute: args.time.minute,
            toc: args.toc,
            terminating_station_code: args.terminating,
            via: optional(args.via),
            delay_time: optional(args.delay),
            disruption_reason: optional(args.reason),
            disruption_type: if args.cancelled {
                DisruptionType::Cancelled
            } else {
                DisruptionType::Delayed
            },
            platform: args.platform,
            alternative_services: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_systems_command() {
        let cli = Cli::try_parse_from(["tannoy", "systems"]).unwrap();
        assert!(matches!(cli.command, Commands::Systems));
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
        assert!(cli.system.is_none());
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_parse_verbose_repeated_flags() {
        let cli = Cli::try_parse_from(["tannoy", "-v", "-v", "systems"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tannoy",
            "presets",
            "--system",
            "atos-anne",
            "--audio-root",
            "/srv/tannoy",
        ])
        .unwrap();
        assert_eq!(cli.system.as_deref(), Some("atos-anne"));
        assert_eq!(cli.audio_root, Some(PathBuf::from("/srv/tannoy")));
    }

    #[test]
    fn test_parse_timeout_humantime() {
        assert_eq!(parse_timeout_secs("45"), Ok(45));
        assert_eq!(parse_timeout_secs("2m"), Ok(120));
        assert_eq!(parse_timeout_secs("1m30s"), Ok(90));
        assert!(parse_timeout_secs("soon").is_err());
    }

    #[test]
    fn test_parse_departure_time() {
        assert_eq!(
            parse_departure_time("07:11"),
            Ok(DepartureTime {
                hour: "07".to_string(),
                minute: "11".to_string(),
            })
        );
        assert!(parse_departure_time("7:11").is_err());
        assert!(parse_departure_time("24:00").is_err());
        assert!(parse_departure_time("0711").is_err());
    }

    #[test]
    fn test_parse_play_next_train() {
        let cli = Cli::try_parse_from([
            "tannoy",
            "play",
            "--device",
            "pulse",
            "next-train",
            "--platform",
            "1",
            "--time",
            "07:11",
            "--toc",
            "Thameslink",
            "--to",
            "CBG",
            "--calling-at",
            "ECR,LBG,BFR",
            "--coaches",
            "8",
        ])
        .unwrap();

        match cli.command {
            Commands::Play {
                device,
                announcement: AnnouncementArgs::NextTrain(args),
            } => {
                assert_eq!(device.as_deref(), Some("pulse"));
                assert_eq!(args.calling_at, vec!["ECR", "LBG", "BFR"]);
                assert!(args.via.is_none());

                match AnnouncementRequest::from(args) {
                    AnnouncementRequest::NextTrain(request) => {
                        assert_eq!(request.hour, "07");
                        assert_eq!(request.minute, "11");
                        assert_eq!(request.terminating_station_code, "CBG");
                    }
                    other => panic!("Expected NextTrain request, got {other:?}"),
                }
            }
            other => panic!("Expected Play next-train, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_download_disrupted_train() {
        let cli = Cli::try_parse_from([
            "tannoy",
            "download",
            "-o",
            "out.wav",
            "disrupted-train",
            "--time",
            "08:15",
            "--toc",
            "Southern",
            "--to",
            "VIC",
            "--via",
            "none",
            "--delay",
            "unknown",
            "--cancelled",
            "-p",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Download {
                output,
                announcement: AnnouncementArgs::DisruptedTrain(args),
            } => {
                assert_eq!(output, Some(PathBuf::from("out.wav")));
                match AnnouncementRequest::from(args) {
                    AnnouncementRequest::DisruptedTrain(request) => {
                        assert_eq!(request.via, None);
                        assert_eq!(request.delay_time, None);
                        assert_eq!(request.disruption_type, DisruptionType::Cancelled);
                        assert_eq!(request.platform, "4");
                    }
                    other => panic!("Expected DisruptedTrain request, got {other:?}"),
                }
            }
            other => panic!("Expected Download disrupted-train, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_segments_preset_and_button() {
        let cli = Cli::try_parse_from([
            "tannoy",
            "segments",
            "preset",
            "07:11 | Brighton to Cambridge",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Segments {
                announcement: AnnouncementArgs::Preset { .. }
            }
        ));

        let cli = Cli::try_parse_from(["tannoy", "play", "button", "BTP 61016"]).unwrap();
        match cli.command {
            Commands::Play {
                announcement: AnnouncementArgs::Button { label },
                ..
            } => assert_eq!(label, "BTP 61016"),
            other => panic!("Expected Play button, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_and_completions() {
        let cli = Cli::try_parse_from(["tannoy", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));

        let cli = Cli::try_parse_from(["tannoy", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["tannoy"]).is_err());
    }
}
