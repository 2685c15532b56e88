//! Turns a segment list into one mono announcement.
//!
//! All clips are fetched concurrently; results are re-ordered to match the
//! segment list before concatenation, so completion order never matters.

use crate::audio::buffer::{AssembledAudio, AudioBuffer};
use crate::audio::decode::decode_clip;
use crate::audio::source::ClipSource;
use crate::defaults;
use crate::error::{Result, TannoyError};
use crate::segments::SegmentRef;
use futures_util::future::try_join_all;
use std::time::Duration;

/// Locator of a clip: `/audio/<prefix>/<id with '.' as '/'>.<extension>`.
pub fn clip_locator(prefix: &str, id: &str, extension: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        defaults::AUDIO_ROOT,
        prefix.trim_matches('/'),
        id.replace('.', "/"),
        extension
    )
}

/// Fetches, decodes and joins clips for one announcement system.
pub struct Assembler<S> {
    source: S,
    file_prefix: String,
    extension: String,
    sample_rate: u32,
    timeout: Option<Duration>,
}

impl<S: ClipSource> Assembler<S> {
    pub fn new(source: S, file_prefix: impl Into<String>) -> Self {
        Self {
            source,
            file_prefix: file_prefix.into(),
            extension: defaults::CLIP_EXTENSION.to_string(),
            sample_rate: defaults::SAMPLE_RATE,
            timeout: Some(Duration::from_secs(defaults::FETCH_TIMEOUT_SECS)),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Bound the time spent fetching. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn locator(&self, segment: &SegmentRef) -> String {
        let prefix = segment.prefix().unwrap_or(self.file_prefix.as_str());
        clip_locator(prefix, segment.id(), &self.extension)
    }

    async fn load(&self, segment: &SegmentRef) -> Result<AudioBuffer> {
        let locator = self.locator(segment);
        let bytes = self.source.fetch(&locator).await?;
        let clip = decode_clip(&locator, bytes)?;
        tracing::debug!(
            %locator,
            rate = clip.sample_rate(),
            channels = clip.channel_count(),
            "loaded clip"
        );
        Ok(clip.resampled(self.sample_rate))
    }

    /// Assemble `segments` into mono audio at the configured rate.
    ///
    /// Each segment contributes its pre-delay as silence followed by its clip.
    /// The first failing fetch or decode aborts the whole assembly.
    ///
    /// # Errors
    /// `EmptySegmentList`, `FetchFailure`, `FetchTimeout` or `DecodeFailure`.
    pub async fn assemble(&self, segments: &[SegmentRef]) -> Result<AssembledAudio> {
        if segments.is_empty() {
            return Err(TannoyError::EmptySegmentList);
        }

        tracing::debug!(
            segments = segments.len(),
            source = %self.source.describe(),
            "fetching clips"
        );

        let fetches = try_join_all(segments.iter().map(|segment| self.load(segment)));
        let clips = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetches)
                .await
                .map_err(|_| TannoyError::FetchTimeout {
                    timeout_ms: limit.as_millis() as u64,
                })??,
            None => fetches.await?,
        };

        let mut parts = Vec::with_capacity(segments.len() * 2);
        for (segment, clip) in segments.iter().zip(clips) {
            if segment.delay_ms() > 0 {
                parts.push(AudioBuffer::pre_delay(segment.delay_ms(), self.sample_rate));
            }
            parts.push(clip);
        }

        let audio = AudioBuffer::concat(&parts, self.sample_rate).into_mono();
        tracing::info!(
            segments = segments.len(),
            duration_ms = audio.duration().as_millis() as u64,
            "assembled announcement"
        );
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decode::tests::make_wav_data;
    use crate::audio::source::MemoryClipSource;
    use std::sync::Arc;

    const PREFIX: &str = "station/atos/anne";

    fn locator(id: &str) -> String {
        clip_locator(PREFIX, id, "wav")
    }

    fn assembler(source: MemoryClipSource, rate: u32) -> Assembler<MemoryClipSource> {
        Assembler::new(source, PREFIX)
            .with_extension("wav")
            .with_sample_rate(rate)
    }

    #[test]
    fn locator_replaces_dots_with_slashes() {
        assert_eq!(
            clip_locator(PREFIX, "stations.high.CBG", "mp3"),
            "/audio/station/atos/anne/stations/high/CBG.mp3"
        );
        assert_eq!(
            clip_locator(PREFIX, "platforms.high.platform 1", "mp3"),
            "/audio/station/atos/anne/platforms/high/platform 1.mp3"
        );
    }

    #[test]
    fn segment_prefix_overrides_system_prefix() {
        let assembler = assembler(MemoryClipSource::new(), 48000);
        let segment = SegmentRef::new("chime").with_prefix("shared");
        assert_eq!(assembler.locator(&segment), "/audio/shared/chime.wav");
    }

    #[tokio::test]
    async fn empty_segment_list_is_an_error() {
        let assembler = assembler(MemoryClipSource::new(), 48000);
        let result = assembler.assemble(&[]).await;
        assert!(matches!(result, Err(TannoyError::EmptySegmentList)));
    }

    #[tokio::test]
    async fn silence_then_clip() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("a"), make_wav_data(48000, 1, &[8192; 100]));
        let assembler = assembler(source, 48000);

        let audio = assembler
            .assemble(&[SegmentRef::new("a").with_delay(400)])
            .await
            .unwrap();

        assert_eq!(audio.frames(), 19200 + 100);
        assert!(audio.samples()[..19200].iter().all(|&s| s == 0.0));
        assert!(audio.samples()[19200..].iter().all(|&s| s > 0.0));
    }

    #[tokio::test]
    async fn pre_delay_keeps_reference_length_at_default_rate() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("a"), make_wav_data(44100, 1, &[8192; 100]));
        let assembler = Assembler::new(source, PREFIX).with_extension("wav");
        assert_eq!(assembler.sample_rate(), defaults::SAMPLE_RATE);

        let audio = assembler
            .assemble(&[SegmentRef::new("a").with_delay(400)])
            .await
            .unwrap();

        let silent = audio.samples().iter().take_while(|&&s| s == 0.0).count();
        assert_eq!(silent, 19200);
        assert_eq!(audio.frames(), 19200 + 100);
    }

    #[tokio::test]
    async fn pre_delay_is_not_resampled_at_low_rates() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("a"), make_wav_data(22050, 1, &[8192; 50]))
            .with_clip(&locator("b"), make_wav_data(22050, 1, &[8192; 50]));
        let assembler = assembler(source, 22050);

        let audio = assembler
            .assemble(&[
                SegmentRef::new("a").with_delay(75),
                SegmentRef::new("b").with_delay(400),
            ])
            .await
            .unwrap();

        let samples = audio.samples();
        assert_eq!(audio.frames(), 3600 + 50 + 19200 + 50);
        assert!(samples[..3600].iter().all(|&s| s == 0.0));
        assert!(samples[3650..3650 + 19200].iter().all(|&s| s == 0.0));
        assert!(samples[3650 + 19200..].iter().all(|&s| s > 0.0));
    }

    #[tokio::test]
    async fn clips_are_joined_in_segment_order_regardless_of_completion() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("first"), make_wav_data(8000, 1, &[16384; 10]))
            .with_clip(&locator("second"), make_wav_data(8000, 1, &[-16384; 10]))
            .with_delay(&locator("first"), Duration::from_millis(50));
        let assembler = assembler(source, 8000);

        let audio = assembler
            .assemble(&[SegmentRef::new("first"), SegmentRef::new("second")])
            .await
            .unwrap();

        assert_eq!(audio.frames(), 20);
        assert!(audio.samples()[..10].iter().all(|&s| s > 0.0));
        assert!(audio.samples()[10..].iter().all(|&s| s < 0.0));
    }

    #[tokio::test]
    async fn clips_are_resampled_to_assembly_rate() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("low"), make_wav_data(22050, 1, &[0; 22050]));
        let assembler = assembler(source, 44100);

        let audio = assembler.assemble(&[SegmentRef::new("low")]).await.unwrap();

        assert_eq!(audio.sample_rate(), 44100);
        assert_eq!(audio.frames(), 44100);
    }

    #[tokio::test]
    async fn stereo_clip_reduces_to_first_channel() {
        let source = MemoryClipSource::new().with_clip(
            &locator("stereo"),
            make_wav_data(8000, 2, &[1000, -1000, 1000, -1000]),
        );
        let assembler = assembler(source, 8000);

        let audio = assembler
            .assemble(&[SegmentRef::new("stereo")])
            .await
            .unwrap();

        assert_eq!(audio.frames(), 2);
        assert!(audio.samples().iter().all(|&s| s > 0.0));
    }

    #[tokio::test]
    async fn duration_is_sum_of_clips_and_delays() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("a"), make_wav_data(48000, 1, &[0; 4800]))
            .with_clip(&locator("b"), make_wav_data(48000, 1, &[0; 9600]));
        let assembler = assembler(source, 48000);

        let audio = assembler
            .assemble(&[
                SegmentRef::new("a").with_delay(75),
                SegmentRef::new("b").with_delay(250),
            ])
            .await
            .unwrap();

        // 75ms + 100ms + 250ms + 200ms
        assert_eq!(audio.duration(), Duration::from_millis(625));
    }

    #[tokio::test]
    async fn one_failed_fetch_fails_the_whole_assembly() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("a"), make_wav_data(8000, 1, &[0; 10]))
            .with_clip(&locator("b"), make_wav_data(8000, 1, &[0; 10]))
            .with_failure(&locator("b"));
        let assembler = assembler(source, 8000);

        let result = assembler
            .assemble(&[SegmentRef::new("a"), SegmentRef::new("b")])
            .await;

        match result {
            Err(TannoyError::FetchFailure { locator: failed, .. }) => {
                assert_eq!(failed, locator("b"));
            }
            other => panic!("Expected FetchFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_clip_is_a_decode_failure() {
        let source = MemoryClipSource::new().with_clip(&locator("bad"), b"garbage".to_vec());
        let assembler = assembler(source, 8000);

        let result = assembler.assemble(&[SegmentRef::new("bad")]).await;
        assert!(matches!(result, Err(TannoyError::DecodeFailure { .. })));
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("slow"), make_wav_data(8000, 1, &[0; 10]))
            .with_delay(&locator("slow"), Duration::from_secs(5));
        let assembler = assembler(source, 8000).with_timeout(Some(Duration::from_millis(20)));

        let result = assembler.assemble(&[SegmentRef::new("slow")]).await;
        match result {
            Err(TannoyError::FetchTimeout { timeout_ms }) => assert_eq!(timeout_ms, 20),
            other => panic!("Expected FetchTimeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_assemblies_do_not_interfere() {
        let source = MemoryClipSource::new()
            .with_clip(&locator("a"), make_wav_data(8000, 1, &[16384; 8]))
            .with_clip(&locator("b"), make_wav_data(8000, 1, &[-16384; 4]))
            .with_delay(&locator("a"), Duration::from_millis(20));
        let assembler = Arc::new(assembler(source, 8000));

        let first = {
            let assembler = Arc::clone(&assembler);
            tokio::spawn(async move { assembler.assemble(&[SegmentRef::new("a")]).await })
        };
        let second = {
            let assembler = Arc::clone(&assembler);
            tokio::spawn(async move { assembler.assemble(&[SegmentRef::new("b")]).await })
        };

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(first.frames(), 8);
        assert_eq!(second.frames(), 4);
        assert_eq!(assembler.source().fetch_count(), 2);
    }
}
