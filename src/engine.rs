//! Announcement engine: validate -> build -> assemble -> render.
//!
//! Each request runs through its own pipeline; the engine holds no
//! per-request state, so concurrent requests never see each other.

use crate::audio::assembler::Assembler;
use crate::audio::buffer::AssembledAudio;
use crate::audio::export::export_to_path;
use crate::audio::playback::{PlaybackDevice, PlaybackHandle, PlaybackState};
use crate::audio::source::ClipSource;
use crate::error::{Result, TannoyError};
use crate::request::AnnouncementRequest;
use crate::segments::SegmentRef;
use crate::systems::AnnouncementSystem;
use std::path::{Path, PathBuf};

/// What to do with the assembled audio.
pub enum RenderMode<'a> {
    Play(&'a dyn PlaybackDevice),
    Download(&'a Path),
}

/// Result of a rendered announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Played(PlaybackState),
    Downloaded(PathBuf),
    /// The request produced no clips; nothing was rendered.
    Skipped,
}

pub struct Engine<S> {
    system: AnnouncementSystem,
    assembler: Assembler<S>,
}

impl<S: ClipSource> Engine<S> {
    /// Engine for `system` with an assembler using the system's file prefix.
    pub fn new(system: AnnouncementSystem, source: S) -> Self {
        let assembler = Assembler::new(source, system.file_prefix);
        Self { system, assembler }
    }

    pub fn with_assembler(system: AnnouncementSystem, assembler: Assembler<S>) -> Self {
        Self { system, assembler }
    }

    pub fn system(&self) -> &AnnouncementSystem {
        &self.system
    }

    pub fn assembler(&self) -> &Assembler<S> {
        &self.assembler
    }

    /// Validate `request` and return its clip sequence without fetching audio.
    pub fn segments(&self, request: &AnnouncementRequest) -> Result<Vec<SegmentRef>> {
        let segments = self.system.build(request)?;
        tracing::debug!(
            system = self.system.name,
            kind = request.kind(),
            segments = segments.len(),
            "built segment list"
        );
        Ok(segments)
    }

    /// Build and assemble `request`. `None` when it produced no clips.
    pub async fn assemble(&self, request: &AnnouncementRequest) -> Result<Option<AssembledAudio>> {
        let segments = self.segments(request)?;
        match self.assembler.assemble(&segments).await {
            Ok(audio) => Ok(Some(audio)),
            Err(TannoyError::EmptySegmentList) => {
                tracing::warn!(
                    kind = request.kind(),
                    "announcement has no segments, nothing to play"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Start playing `request` and return its handle without waiting.
    pub async fn start(
        &self,
        request: &AnnouncementRequest,
        device: &dyn PlaybackDevice,
    ) -> Result<Option<PlaybackHandle>> {
        let Some(audio) = self.assemble(request).await? else {
            return Ok(None);
        };
        tracing::info!(
            device = %device.name(),
            duration_ms = audio.duration().as_millis() as u64,
            "playing announcement"
        );
        device.play(audio).map(Some)
    }

    /// Play `request` and wait for it to end.
    pub async fn play(
        &self,
        request: &AnnouncementRequest,
        device: &dyn PlaybackDevice,
    ) -> Result<Outcome> {
        match self.start(request, device).await? {
            Some(handle) => Ok(Outcome::Played(handle.finished().await?)),
            None => Ok(Outcome::Skipped),
        }
    }

    /// Assemble `request` and write it as a WAV file at `path`.
    pub async fn download(&self, request: &AnnouncementRequest, path: &Path) -> Result<Outcome> {
        let Some(audio) = self.assemble(request).await? else {
            return Ok(Outcome::Skipped);
        };
        export_to_path(&audio, path)?;
        Ok(Outcome::Downloaded(path.to_path_buf()))
    }

    pub async fn announce(
        &self,
        request: &AnnouncementRequest,
        mode: RenderMode<'_>,
    ) -> Result<Outcome> {
        match mode {
            RenderMode::Play(device) => self.play(request, device).await,
            RenderMode::Download(path) => self.download(request, path).await,
        }
    }
}
