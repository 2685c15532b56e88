//! Announcement application entry points.
//!
//! Wires configuration, clip source, engine and output together:
//! request → validate → assemble → play or save

use crate::audio::assembler::Assembler;
use crate::audio::playback::{PlaybackDevice, PlaybackState};
#[cfg(feature = "http")]
use crate::audio::source::HttpClipSource;
use crate::audio::source::{ClipSource, FsClipSource};
use crate::cli::{AnnouncementArgs, Cli};
use crate::config::{Config, SourceKind};
use crate::engine::{Engine, Outcome};
use crate::error::{Result, TannoyError};
use crate::request::{AnnouncementRequest, ThroughTrainRequest};
use crate::systems::AnnouncementSystem;
use std::path::PathBuf;
use std::sync::Arc;

pub type SharedSource = Arc<dyn ClipSource>;

/// Fold global CLI flags into the loaded configuration.
///
/// CLI flags win over environment variables, which win over the file.
pub fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(system) = &cli.system {
        config.announcement.system = system.clone();
    }
    if let Some(root) = &cli.audio_root {
        config.source.root = root.clone();
        config.source.kind = SourceKind::Filesystem;
    }
    if let Some(base_url) = &cli.base_url {
        config.source.base_url = Some(base_url.clone());
        config.source.kind = SourceKind::Http;
    }
    if let Some(secs) = cli.timeout {
        config.source.fetch_timeout_secs = secs;
    }
    config
}

/// Create the clip source selected by `[source]`.
pub fn build_source(config: &Config) -> Result<SharedSource> {
    match config.source.kind {
        SourceKind::Filesystem => Ok(Arc::new(FsClipSource::new(config.source.root.clone()))),
        #[cfg(feature = "http")]
        SourceKind::Http => {
            let base_url =
                config
                    .source
                    .base_url
                    .clone()
                    .ok_or_else(|| TannoyError::ConfigInvalidValue {
                        key: "source.base_url".to_string(),
                        message: "required when source.kind = \"http\"".to_string(),
                    })?;
            Ok(Arc::new(HttpClipSource::new(base_url)))
        }
        #[cfg(not(feature = "http"))]
        SourceKind::Http => Err(TannoyError::ConfigInvalidValue {
            key: "source.kind".to_string(),
            message: "this build has no HTTP support".to_string(),
        }),
    }
}

/// Build the engine for the configured system and source.
pub fn build_engine(config: &Config) -> Result<Engine<SharedSource>> {
    config.validate()?;
    let system = config.system_id()?.system();
    let source = build_source(config)?;
    tracing::debug!(system = system.name, source = %source.describe(), "building engine");

    let assembler = Assembler::new(source, system.file_prefix)
        .with_extension(config.source.extension.clone())
        .with_sample_rate(config.audio.sample_rate)
        .with_timeout(config.source.fetch_timeout());
    Ok(Engine::with_assembler(system, assembler))
}

/// Turn parsed CLI arguments into a request for `system`.
pub fn resolve_request(
    args: AnnouncementArgs,
    system: &AnnouncementSystem,
) -> Result<AnnouncementRequest> {
    match args {
        AnnouncementArgs::NextTrain(args) => Ok(args.into()),
        AnnouncementArgs::ThroughTrain { platform } => {
            Ok(AnnouncementRequest::ThroughTrain(ThroughTrainRequest {
                platform,
            }))
        }
        AnnouncementArgs::DisruptedTrain(args) => Ok(args.into()),
        AnnouncementArgs::Preset { name } => Ok(system.preset(&name)?.request.clone()),
        AnnouncementArgs::Button { label } => {
            let button = system.button(&label)?;
            Ok(AnnouncementRequest::Button {
                label: button.label.to_string(),
            })
        }
        AnnouncementArgs::File { path } => AnnouncementRequest::load(&path),
    }
}

/// Open the output device named on the command line or in the config.
#[cfg(feature = "cpal-audio")]
pub fn open_device(config: &Config, device: Option<&str>) -> Result<Arc<dyn PlaybackDevice>> {
    let name = device.or(config.audio.device.as_deref());
    let device = crate::audio::output::CpalPlaybackDevice::new(name)?;
    Ok(Arc::new(device))
}

#[cfg(not(feature = "cpal-audio"))]
pub fn open_device(_config: &Config, _device: Option<&str>) -> Result<Arc<dyn PlaybackDevice>> {
    Err(TannoyError::Playback {
        message: "this build has no audio output; use `tannoy download`".to_string(),
    })
}

/// Play `request` until it ends or Ctrl-C cancels it.
pub async fn run_play<S: ClipSource>(
    engine: &Engine<S>,
    request: &AnnouncementRequest,
    device: &dyn PlaybackDevice,
) -> Result<Outcome> {
    let Some(handle) = engine.start(request, device).await? else {
        return Ok(Outcome::Skipped);
    };
    let canceller = handle.canceller();

    let state = tokio::select! {
        state = handle.finished() => state?,
        _ = tokio::signal::ctrl_c() => {
            canceller.cancel();
            tracing::info!("playback cancelled");
            PlaybackState::Cancelled
        }
    };
    Ok(Outcome::Played(state))
}

/// Save `request` as WAV at `output`, or the configured file name.
pub async fn run_download<S: ClipSource>(
    engine: &Engine<S>,
    request: &AnnouncementRequest,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<Outcome> {
    let path = output.unwrap_or_else(|| PathBuf::from(&config.export.file_name));
    engine.download(request, &path).await
}
