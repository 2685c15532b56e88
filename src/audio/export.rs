//! WAV export of assembled announcements.

use crate::audio::buffer::AssembledAudio;
use crate::error::{Result, TannoyError};
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

fn wav_spec(audio: &AssembledAudio) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn encoding_failure(e: hound::Error) -> TannoyError {
    TannoyError::EncodingFailure {
        message: e.to_string(),
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Write `audio` as 16-bit mono PCM WAV.
///
/// # Errors
/// `EncodingFailure` if the writer rejects the data.
pub fn export_wav<W: Write + Seek>(audio: &AssembledAudio, writer: W) -> Result<()> {
    let mut wav = hound::WavWriter::new(writer, wav_spec(audio)).map_err(encoding_failure)?;
    for &sample in audio.samples() {
        wav.write_sample(to_i16(sample)).map_err(encoding_failure)?;
    }
    wav.finalize().map_err(encoding_failure)
}

/// Encode `audio` into an in-memory WAV file.
pub fn encode_wav(audio: &AssembledAudio) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    export_wav(audio, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Write `audio` as a WAV file at `path`.
///
/// # Errors
/// `ExportWrite` if the file cannot be created, `EncodingFailure` if writing
/// the WAV data fails.
pub fn export_to_path(audio: &AssembledAudio, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| TannoyError::ExportWrite {
        path: path.display().to_string(),
        source,
    })?;
    export_wav(audio, BufWriter::new(file))?;
    tracing::info!(path = %path.display(), "exported announcement");
    Ok(())
}
