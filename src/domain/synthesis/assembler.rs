use super::audio::{Artifact, AudioFormat, AudioSegment};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("no valid audio segments")]
    NoValidSegments,
}

/// Reasons stitching can fail; the assembler recovers from all of them
#[derive(Debug, thiserror::Error)]
enum StitchError {
    #[error("decode failed: {0}")]
    Decode(#[from] SymphoniaError),
    #[error("segment has no audio track")]
    NoAudioTrack,
    #[error("segment decoded to no samples")]
    Empty,
    #[error("sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },
    #[error("wav encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

/// Mono PCM decoded from one segment
struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAudio {
    fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Build the job artifact from per-chunk results.
///
/// Results are ordered by chunk index and chunks without audio are skipped.
/// A single surviving segment is returned byte for byte. Several segments are
/// decoded, joined and re-encoded once as WAV; if that fails for any reason the
/// first surviving segment is used on its own.
pub fn assemble(mut results: Vec<(usize, Option<AudioSegment>)>) -> Result<Artifact, AssemblyError> {
    results.sort_by_key(|(index, _)| *index);

    let total = results.len();
    let valid: Vec<AudioSegment> = results
        .into_iter()
        .filter_map(|(_, segment)| segment)
        .filter(|segment| !segment.is_empty())
        .collect();

    tracing::debug!(
        chunk_count = total,
        valid_segments = valid.len(),
        "Assembling audio segments"
    );

    if valid.len() > 1 {
        match stitch(&valid) {
            Ok(artifact) => return Ok(artifact),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    valid_segments = valid.len(),
                    "Stitching failed, falling back to the first segment"
                );
            }
        }
    }

    valid
        .into_iter()
        .next()
        .map(Artifact::from_segment)
        .ok_or(AssemblyError::NoValidSegments)
}

fn stitch(segments: &[AudioSegment]) -> Result<Artifact, StitchError> {
    let decoded = segments
        .iter()
        .map(decode)
        .collect::<Result<Vec<_>, _>>()?;

    let sample_rate = decoded.first().map(|d| d.sample_rate).ok_or(StitchError::Empty)?;
    if let Some(other) = decoded.iter().find(|d| d.sample_rate != sample_rate) {
        return Err(StitchError::SampleRateMismatch {
            expected: sample_rate,
            found: other.sample_rate,
        });
    }

    let duration = decoded.iter().map(DecodedAudio::duration).sum();
    let samples: Vec<f32> = decoded.into_iter().flat_map(|d| d.samples).collect();
    let data = encode_wav(&samples, sample_rate)?;

    Ok(Artifact {
        data,
        format: AudioFormat::Wav,
        segment_count: segments.len(),
        duration: Some(duration),
    })
}

fn decode(segment: &AudioSegment) -> Result<DecodedAudio, StitchError> {
    let source = Cursor::new(segment.data.clone());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(segment.format.extension());

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(StitchError::NoAudioTrack)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count().max(1);
                sample_rate.get_or_insert(spec.rate);

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);

                // Downmix to mono
                samples.extend(
                    buffer
                        .samples()
                        .chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                );
            }
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(error = e, "Skipping undecodable packet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    match sample_rate {
        Some(sample_rate) if !samples.is_empty() => Ok(DecodedAudio {
            samples,
            sample_rate,
        }),
        _ => Err(StitchError::Empty),
    }
}

fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, StitchError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in samples {
            let value = (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32);
            writer.write_sample(value as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
