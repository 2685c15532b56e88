//! Clip decoding with symphonia.

use crate::audio::buffer::AudioBuffer;
use crate::error::{Result, TannoyError};
use std::io::{Cursor, ErrorKind};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Trim encoder delay and padding (LAME/Xing headers) so clips butt together.
fn format_options() -> FormatOptions {
    FormatOptions {
        enable_gapless: true,
        ..Default::default()
    }
}

/// Decode an encoded clip (MP3, WAV, ...) into planar PCM.
///
/// `locator` is used for the format hint and for error messages.
///
/// # Errors
/// `DecodeFailure` if the bytes are not a recognisable audio stream.
pub fn decode_clip(locator: &str, bytes: Vec<u8>) -> Result<AudioBuffer> {
    let failure = |message: String| TannoyError::DecodeFailure {
        locator: locator.to_string(),
        message,
    };

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(locator).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &format_options(),
            &MetadataOptions::default(),
        )
        .map_err(|e| failure(format!("unrecognised format: {e}")))?;
    let mut format = probed.format;

    let (track_id, params) = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| failure("no audio track".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| failure(format!("unsupported codec: {e}")))?;

    let mut sample_rate = params.sample_rate;
    let mut channel_count = params.channels.map(|c| c.count());
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(failure(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channel_count.get_or_insert(spec.channels.count());

                let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                samples.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(samples.samples());
            }
            // A corrupt frame is skipped; the rest of the clip is still usable.
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(locator, "skipping undecodable frame: {e}");
            }
            Err(e) => return Err(failure(e.to_string())),
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| failure("unknown sample rate".to_string()))?;
    let channel_count = channel_count.unwrap_or(1);

    tracing::trace!(
        locator,
        sample_rate,
        channel_count,
        frames = interleaved.len() / channel_count.max(1),
        "decoded clip"
    );

    Ok(AudioBuffer::from_interleaved(
        &interleaved,
        channel_count,
        sample_rate,
    ))
}
