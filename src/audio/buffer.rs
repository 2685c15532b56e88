//! Planar audio buffers and the numeric work done on them during assembly.

use crate::defaults;
use std::time::Duration;

/// Multi-channel PCM buffer, one `Vec<f32>` per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Build from planar channel data. Shorter channels are padded with silence.
    pub fn new(mut channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let frames = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(frames, 0.0);
        }
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(vec![samples], sample_rate)
    }

    /// Split interleaved samples into channels. A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        let channel_count = channel_count.max(1);
        let mut channels = vec![Vec::with_capacity(samples.len() / channel_count); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    /// Mono pre-delay silence tagged with `sample_rate`.
    ///
    /// The frame count is always sized at the 48 kHz reference rate, whatever
    /// rate the announcement is assembled at.
    pub fn pre_delay(ms: u32, sample_rate: u32) -> Self {
        let frames = silence_frames(ms, defaults::SILENCE_SAMPLE_RATE);
        Self::mono(vec![0.0; frames], sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames(), self.sample_rate)
    }

    /// Linear-interpolation resample of every channel.
    pub fn resampled(self, to_rate: u32) -> Self {
        if self.sample_rate == to_rate {
            return self;
        }
        let channels = self
            .channels
            .iter()
            .map(|channel| resample(channel, self.sample_rate, to_rate))
            .collect();
        Self::new(channels, to_rate)
    }

    /// Join buffers end to end.
    ///
    /// The result has as many channels as the widest input; a narrower buffer
    /// leaves the extra channels silent over its span. Inputs are expected to
    /// already be at `sample_rate`.
    pub fn concat(buffers: &[AudioBuffer], sample_rate: u32) -> Self {
        let channel_count = buffers
            .iter()
            .map(AudioBuffer::channel_count)
            .max()
            .unwrap_or(1);
        let total: usize = buffers.iter().map(AudioBuffer::frames).sum();

        let mut channels = vec![vec![0.0f32; total]; channel_count];
        let mut offset = 0;
        for buffer in buffers {
            let frames = buffer.frames();
            for (out, input) in channels.iter_mut().zip(&buffer.channels) {
                out[offset..offset + frames].copy_from_slice(input);
            }
            offset += frames;
        }

        Self {
            channels,
            sample_rate,
        }
    }

    /// Copy channel 0 over every other channel.
    ///
    /// This duplicates the first channel rather than averaging, so existing
    /// announcements render bit-for-bit the same as they always have.
    pub fn downmix_first_channel(&mut self) {
        if let Some((first, rest)) = self.channels.split_first_mut() {
            for channel in rest {
                channel.copy_from_slice(first);
            }
        }
    }

    /// Reduce to one channel: down-mix if needed, then keep channel 0.
    pub fn into_mono(mut self) -> AssembledAudio {
        if self.channel_count() > 1 {
            self.downmix_first_channel();
        }
        let samples = self.channels.into_iter().next().unwrap_or_default();
        AssembledAudio::new(samples, self.sample_rate)
    }
}

/// Finished single-channel announcement, owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AssembledAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.samples.len(), self.sample_rate)
    }
}

/// Frames of silence for a pre-delay: `ceil(ms / 1000 * sample_rate)`.
pub fn silence_frames(ms: u32, sample_rate: u32) -> usize {
    (u64::from(ms) * u64::from(sample_rate)).div_ceil(1000) as usize
}

fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / f64::from(sample_rate))
}

/// Simple linear interpolation resampling.
pub(crate) fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let output_len = (samples.len() as u64 * u64::from(to_rate)).div_ceil(u64::from(from_rate));
    let ratio = f64::from(from_rate) / f64::from(to_rate);

    (0..output_len as usize)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}
