use crate::fetch::VoiceNote;
use std::path::{Path, PathBuf};
use std::process::Command;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use voxnote_core::{AudioBuffer, DecodeError, TargetSpec};

const RESAMPLE_CHUNK: usize = 1024;

/// Planar PCM as it came out of the decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }
}

/// Converts a transient voice artifact into the backend's sample format.
///
/// Containers symphonia can decode are handled in-process; anything it
/// reports as unsupported (Telegram's OGG/Opus in particular) goes through
/// the external `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    ffmpeg_path: PathBuf,
}

impl AudioNormalizer {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    pub fn normalize(
        &self,
        note: &VoiceNote,
        target: &TargetSpec,
    ) -> Result<AudioBuffer, DecodeError> {
        let decoded = match decode_with_symphonia(note.path(), note.format()) {
            Ok(decoded) => decoded,
            Err(DecodeError::Unsupported(reason)) => {
                tracing::debug!(
                    file_ref = %note.file_ref(),
                    reason = %reason,
                    "falling back to ffmpeg"
                );
                self.transcode(note.path(), target)?
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(
            file_ref = %note.file_ref(),
            source_rate = decoded.sample_rate,
            source_channels = decoded.channels.len(),
            frames = decoded.frames(),
            "decoded voice note"
        );

        conform(decoded, target)
    }

    /// Let ffmpeg decode `path` straight to raw s16le at the target rate/channels.
    fn transcode(&self, path: &Path, target: &TargetSpec) -> Result<DecodedAudio, DecodeError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-nostdin", "-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args(["-f", "s16le", "-acodec", "pcm_s16le", "-ar"])
            .arg(target.sample_rate_hz.to_string())
            .arg("-ac")
            .arg(target.channels.to_string())
            .arg("pipe:1")
            .output()
            .map_err(|e| {
                DecodeError::Transcode(format!(
                    "failed to run {}: {e}",
                    self.ffmpeg_path.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecodeError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let channels = target.channels as usize;
        let mut planar = vec![Vec::new(); channels];
        for (i, pair) in output.stdout.chunks_exact(2).enumerate() {
            let sample = i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0;
            planar[i % channels].push(sample);
        }
        // drop a dangling partial frame
        let frames = planar.iter().map(Vec::len).min().unwrap_or(0);
        for ch in &mut planar {
            ch.truncate(frames);
        }

        if frames == 0 {
            return Err(DecodeError::Empty);
        }

        Ok(DecodedAudio {
            channels: planar,
            sample_rate: target.sample_rate_hz,
        })
    }
}

impl Default for AudioNormalizer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Returns [`DecodeError::Unsupported`] when symphonia cannot recognise the
/// container or has no decoder for the codec.
pub fn decode_with_symphonia(
    path: &Path,
    format_tag: Option<&str>,
) -> Result<DecodedAudio, DecodeError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = format_tag {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Unsupported(format!("probe: {e}")))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DecodeError::Unsupported("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(format!("codec: {e}")))?;

    let mut sample_rate = codec_params.sample_rate;
    let mut planar: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Malformed(format!("packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(error = %e, "skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(DecodeError::Malformed(format!("decode: {e}"))),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }
        sample_rate.get_or_insert(spec.rate);

        let channel_count = spec.channels.count().max(1);
        if planar.is_empty() {
            planar = vec![Vec::new(); channel_count];
        }

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        for frame in sample_buf.samples().chunks(channel_count) {
            for (ch, &s) in planar.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| DecodeError::Malformed("unknown sample rate".to_string()))?;

    if planar.iter().all(Vec::is_empty) {
        return Err(DecodeError::Empty);
    }

    Ok(DecodedAudio {
        channels: planar,
        sample_rate,
    })
}

/// Map decoded audio onto `target`: channel count, sample rate, then the
/// optional leading duration window. Shorter input is never padded.
pub fn conform(decoded: DecodedAudio, target: &TargetSpec) -> Result<AudioBuffer, DecodeError> {
    if decoded.frames() == 0 || decoded.sample_rate == 0 {
        return Err(DecodeError::Empty);
    }

    let source_rate = decoded.sample_rate;
    let mut channels = remix(decoded.channels, target.channels as usize);

    if let Some(ms) = target.max_duration_ms {
        let source_window = TargetSpec::frames_for_duration(source_rate, ms);
        for ch in &mut channels {
            ch.truncate(source_window);
        }
    }

    if source_rate != target.sample_rate_hz {
        channels = resample(&channels, source_rate, target.sample_rate_hz)?;
    }

    if let Some(max_frames) = target.max_frames() {
        for ch in &mut channels {
            ch.truncate(max_frames);
        }
    }

    Ok(AudioBuffer {
        samples: interleave(&channels),
        sample_rate: target.sample_rate_hz,
        channels: target.channels,
    })
}

fn remix(channels: Vec<Vec<f32>>, target: usize) -> Vec<Vec<f32>> {
    if channels.len() == target {
        return channels;
    }
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let count = channels.len() as f32;
    let mono: Vec<f32> = (0..frames)
        .map(|i| channels.iter().map(|ch| ch[i]).sum::<f32>() / count)
        .collect();
    vec![mono; target]
}

fn resample(
    channels: &[Vec<f32>],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<Vec<f32>>, DecodeError> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let frames = channels.first().map(Vec::len).unwrap_or(0);

    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK, channels.len())
            .map_err(|e| DecodeError::Resample(format!("resampler init: {e}")))?;

    let capacity = (frames as f64 * ratio) as usize + RESAMPLE_CHUNK;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(capacity); channels.len()];

    let mut start = 0;
    while start < frames {
        let end = (start + RESAMPLE_CHUNK).min(frames);
        let input: Vec<Vec<f32>> = channels
            .iter()
            .map(|ch| {
                let mut chunk = ch[start..end].to_vec();
                chunk.resize(RESAMPLE_CHUNK, 0.0);
                chunk
            })
            .collect();

        let result = resampler
            .process(&input, None)
            .map_err(|e| DecodeError::Resample(format!("resample: {e}")))?;

        for (out, chunk) in output.iter_mut().zip(result) {
            out.extend_from_slice(&chunk);
        }
        start = end;
    }

    let expected_len = (frames as f64 * ratio).round() as usize;
    for ch in &mut output {
        ch.truncate(expected_len);
    }

    Ok(output)
}

fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    if channels.len() == 1 {
        return channels[0].clone();
    }
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        for ch in channels {
            out.push(ch[i]);
        }
    }
    out
}
