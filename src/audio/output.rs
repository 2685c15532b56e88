//! Speaker output using CPAL (Cross-Platform Audio Library).

use crate::audio::buffer::{AssembledAudio, resample};
use crate::audio::playback::{CompletionSignal, PlaybackDevice, PlaybackHandle, playback};
use crate::error::{Result, TannoyError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// CPAL prints ALSA/JACK noise while probing backends.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Names of all output devices on the default host.
///
/// # Errors
/// `Playback` if device enumeration fails.
pub fn list_output_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.output_devices();
        (host, devices)
    });
    let default_name = host.default_output_device().and_then(|d| d.name().ok());
    let devices = devices.map_err(|e| TannoyError::Playback {
        message: format!("Failed to enumerate output devices: {e}"),
    })?;

    Ok(devices
        .filter_map(|device| device.name().ok())
        .map(|name| {
            if default_name.as_deref() == Some(name.as_str()) {
                format!("{name} [default]")
            } else {
                name
            }
        })
        .collect())
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only ever dropped through its owning
/// [`PlaybackHandle`]; no method is called on it after `play()`.
struct SendableStream(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for SendableStream {}

/// Plays announcements on a CPAL output device.
///
/// Mono audio is resampled to the device's native rate and written to every
/// output channel.
pub struct CpalPlaybackDevice {
    device: cpal::Device,
    name: String,
}

impl CpalPlaybackDevice {
    /// Open the named output device, or the system default.
    ///
    /// # Errors
    /// `AudioDeviceNotFound` if no matching device exists.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            match device_name {
                Some(name) => host
                    .output_devices()
                    .map_err(|e| TannoyError::Playback {
                        message: format!("Failed to enumerate devices: {e}"),
                    })?
                    .find(|dev| dev.name().is_ok_and(|n| n == name))
                    .ok_or_else(|| TannoyError::AudioDeviceNotFound {
                        device: name.to_string(),
                    }),
                None => host
                    .default_output_device()
                    .ok_or_else(|| TannoyError::AudioDeviceNotFound {
                        device: "default".to_string(),
                    }),
            }
        })?;

        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        Ok(Self { device, name })
    }

    fn build_stream(
        &self,
        samples: Vec<f32>,
        config: &cpal::SupportedStreamConfig,
        signal: CompletionSignal,
    ) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let channels = usize::from(config.channels());
        let stream_config: cpal::StreamConfig = config.clone().into();
        let err_callback = |err| {
            tracing::error!("Audio output error: {err}");
        };
        let mut position = 0usize;

        match config.sample_format() {
            SampleFormat::F32 => self
                .device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        fill_frames(data, channels, &samples, &mut position, &signal, |s| s, 0.0);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| TannoyError::Playback {
                    message: format!("Failed to build f32 output stream: {e}"),
                }),
            SampleFormat::I16 => self
                .device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        fill_frames(
                            data,
                            channels,
                            &samples,
                            &mut position,
                            &signal,
                            |s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16,
                            0,
                        );
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| TannoyError::Playback {
                    message: format!("Failed to build i16 output stream: {e}"),
                }),
            fmt => Err(TannoyError::Playback {
                message: format!(
                    "Unsupported output sample format: {fmt:?}. \
                     Try another device with --device."
                ),
            }),
        }
    }
}

impl PlaybackDevice for CpalPlaybackDevice {
    fn play(&self, audio: AssembledAudio) -> Result<PlaybackHandle> {
        let config = self
            .device
            .default_output_config()
            .map_err(|e| TannoyError::Playback {
                message: format!("Failed to query default output config: {e}"),
            })?;
        let device_rate = config.sample_rate().0;

        tracing::debug!(
            device = %self.name,
            channels = config.channels(),
            rate = device_rate,
            format = ?config.sample_format(),
            "opening output stream"
        );

        let samples = resample(audio.samples(), audio.sample_rate(), device_rate);
        let (handle, signal) = playback();
        let stream = self.build_stream(samples, &config, signal)?;
        stream.play().map_err(|e| TannoyError::Playback {
            message: format!("Failed to start output stream: {e}"),
        })?;

        Ok(handle.with_output(SendableStream(stream)))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Write the next mono samples to every channel of each frame in `data`.
///
/// Once the source is exhausted the rest is filled with `silence`. Playback
/// is marked finished on the first callback that starts exhausted, so the
/// buffer holding the final samples has already gone to the device.
fn fill_frames<T: Copy>(
    data: &mut [T],
    channels: usize,
    samples: &[f32],
    position: &mut usize,
    signal: &CompletionSignal,
    convert: impl Fn(f32) -> T,
    silence: T,
) {
    let drained = *position >= samples.len();

    for frame in data.chunks_mut(channels.max(1)) {
        let value = match samples.get(*position) {
            Some(&sample) => {
                *position += 1;
                convert(sample)
            }
            None => silence,
        };
        frame.fill(value);
    }

    if drained && !signal.is_settled() {
        signal.finish();
    }
}
