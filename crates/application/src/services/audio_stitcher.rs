//! Joins per-chunk audio into one file
//!
//! MP3 streams are joined frame-wise: the first chunk keeps its ID3v2 tag,
//! later chunks lose theirs, ID3v1 trailers are dropped everywhere but the
//! last chunk, and Xing/Info/VBRI header frames are dropped from every chunk
//! since each only describes its own chunk. WAV chunks must share one PCM
//! format; their samples are rewritten under a single fresh header.

use std::io::Cursor;
use std::time::Duration;

use domain::AudioFormat;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;

/// Errors while joining audio
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StitchError {
    #[error("Audio format {0} cannot be concatenated")]
    UnsupportedFormat(AudioFormat),

    #[error("Chunk is {found}, expected {expected}")]
    FormatMismatch {
        expected: AudioFormat,
        found: AudioFormat,
    },

    #[error("Malformed WAV data: {0}")]
    MalformedWav(String),

    #[error("WAV chunks use different sample formats")]
    WavSpecMismatch,

    #[error("No audio to stitch")]
    Empty,
}

impl From<hound::Error> for StitchError {
    fn from(err: hound::Error) -> Self {
        Self::MalformedWav(err.to_string())
    }
}

/// Playback time of an encoded chunk, when it can be measured
#[must_use]
pub fn audio_duration(format: AudioFormat, bytes: &[u8]) -> Option<Duration> {
    match format {
        AudioFormat::Wav => wav_duration(bytes).ok(),
        AudioFormat::Mp3 => mp3_duration(bytes),
        _ => None,
    }
}

/// Exact playback time of a WAV file from its header
pub fn wav_duration(bytes: &[u8]) -> Result<Duration, StitchError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return Err(StitchError::MalformedWav("sample rate is zero".into()));
    }
    Ok(Duration::from_secs_f64(
        f64::from(reader.duration()) / f64::from(rate),
    ))
}

/// Playback time of an MP3 stream, summed over its audio frames
#[must_use]
pub fn mp3_duration(bytes: &[u8]) -> Option<Duration> {
    use symphonia::core::{
        errors::Error as SymphoniaError,
        formats::FormatOptions,
        io::{MediaSourceStream, MediaSourceStreamOptions},
        meta::MetadataOptions,
        probe::Hint,
        units::TimeBase,
    };

    let source = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        MediaSourceStreamOptions::default(),
    );
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let format_opts = FormatOptions {
        enable_gapless: false,
        ..Default::default()
    };
    let probed = symphonia::default::get_probe()
        .format(&hint, source, &format_opts, &MetadataOptions::default())
        .ok()?;
    let mut format = probed.format;

    let track = format.default_track()?;
    let track_id = track.id;
    let time_base = track
        .codec_params
        .time_base
        .or_else(|| track.codec_params.sample_rate.map(|rate| TimeBase::new(1, rate)))?;

    let mut frames = 0u64;
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => frames += packet.dur,
            Ok(_) => {},
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            },
            Err(_) => return None,
        }
    }
    if frames == 0 {
        return None;
    }

    let time = time_base.calc_time(frames);
    Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
}

/// Length of a leading ID3v2 tag, if present
fn id3v2_len(bytes: &[u8]) -> usize {
    if bytes.len() < 10 || &bytes[0..3] != b"ID3" {
        return 0;
    }
    let size = bytes[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7F));
    let footer = if bytes[5] & 0x10 != 0 { 10 } else { 0 };
    (10 + size + footer).min(bytes.len())
}

/// Whether the last 128 bytes are an ID3v1 tag
fn has_id3v1(bytes: &[u8]) -> bool {
    bytes.len() >= 128 && &bytes[bytes.len() - 128..bytes.len() - 125] == b"TAG"
}

const MPEG1_LAYER3_KBPS: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const MPEG2_LAYER3_KBPS: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// Layer III frame header fields needed to find an info tag
#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    mpeg1: bool,
    mono: bool,
    len: usize,
}

impl FrameHeader {
    fn parse(bytes: &[u8]) -> Option<Self> {
        let [b0, b1, b2, b3, ..] = *bytes else {
            return None;
        };
        if b0 != 0xFF || b1 & 0xE0 != 0xE0 {
            return None;
        }
        let version = (b1 >> 3) & 0b11;
        let layer = (b1 >> 1) & 0b11;
        if version == 0b01 || layer != 0b01 {
            return None;
        }
        let mpeg1 = version == 0b11;

        let bitrate_index = usize::from(b2 >> 4);
        let rate_index = usize::from((b2 >> 2) & 0b11);
        if bitrate_index == 0 || bitrate_index == 15 || rate_index == 3 {
            return None;
        }
        let kbps = if mpeg1 {
            MPEG1_LAYER3_KBPS[bitrate_index]
        } else {
            MPEG2_LAYER3_KBPS[bitrate_index]
        };
        let sample_rate = match version {
            0b11 => [44_100, 48_000, 32_000][rate_index],
            0b10 => [22_050, 24_000, 16_000][rate_index],
            _ => [11_025, 12_000, 8_000][rate_index],
        };
        let slots = if mpeg1 { 144 } else { 72 };
        let padding = u32::from((b2 >> 1) & 1);
        let len = usize::try_from(slots * kbps * 1000 / sample_rate + padding).ok()?;

        Some(Self {
            mpeg1,
            mono: b3 >> 6 == 0b11,
            len,
        })
    }

    /// Offset of the Xing/Info tag, right after the side information
    const fn tag_offset(self) -> usize {
        4 + match (self.mpeg1, self.mono) {
            (true, false) => 32,
            (true, true) | (false, false) => 17,
            (false, true) => 9,
        }
    }
}

/// Length of a leading Xing, Info or VBRI header frame, if present
fn info_frame_len(bytes: &[u8]) -> usize {
    let Some(header) = FrameHeader::parse(bytes) else {
        return 0;
    };
    if header.len > bytes.len() {
        return 0;
    }
    let xing_at = header.tag_offset();
    let is_xing = bytes
        .get(xing_at..xing_at + 4)
        .is_some_and(|tag| tag == b"Xing" || tag == b"Info");
    // VBRI always sits 32 bytes after the header.
    let is_vbri = bytes.get(36..40).is_some_and(|tag| tag == b"VBRI");
    if is_xing || is_vbri { header.len } else { 0 }
}

/// PCM samples collected from WAV chunks
#[derive(Debug)]
enum Samples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

/// Incremental joiner; push chunks in reading order, then finish
#[derive(Debug)]
pub struct AudioStitcher {
    format: AudioFormat,
    buffer: Vec<u8>,
    pending_id3v1: Option<Vec<u8>>,
    wav: Option<(WavSpec, Samples)>,
    chunks: usize,
}

impl AudioStitcher {
    pub fn new(format: AudioFormat) -> Result<Self, StitchError> {
        if !format.is_concatenable() {
            return Err(StitchError::UnsupportedFormat(format));
        }
        Ok(Self {
            format,
            buffer: Vec::new(),
            pending_id3v1: None,
            wav: None,
            chunks: 0,
        })
    }

    /// Append the next chunk
    pub fn push(&mut self, format: AudioFormat, bytes: &[u8]) -> Result<(), StitchError> {
        if format != self.format {
            return Err(StitchError::FormatMismatch {
                expected: self.format,
                found: format,
            });
        }

        match self.format {
            AudioFormat::Wav => self.push_wav(bytes)?,
            _ => self.push_mp3(bytes),
        }
        self.chunks += 1;
        Ok(())
    }

    fn push_mp3(&mut self, bytes: &[u8]) {
        let tag_len = id3v2_len(bytes);
        let (head, rest) = bytes.split_at(tag_len);
        if self.chunks == 0 {
            self.buffer.extend_from_slice(head);
        }
        let mut body = &rest[info_frame_len(rest)..];

        // Only the final chunk's ID3v1 trailer survives.
        self.pending_id3v1 = None;
        if has_id3v1(body) {
            let split = body.len() - 128;
            self.pending_id3v1 = Some(body[split..].to_vec());
            body = &body[..split];
        }
        self.buffer.extend_from_slice(body);
    }

    fn push_wav(&mut self, bytes: &[u8]) -> Result<(), StitchError> {
        let mut reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let (expected, samples) = self.wav.get_or_insert_with(|| {
            let samples = match spec.sample_format {
                SampleFormat::Int => Samples::Int(Vec::new()),
                SampleFormat::Float => Samples::Float(Vec::new()),
            };
            (spec, samples)
        });
        if *expected != spec {
            return Err(StitchError::WavSpecMismatch);
        }

        match samples {
            Samples::Int(out) => {
                for sample in reader.samples::<i32>() {
                    out.push(sample?);
                }
            },
            Samples::Float(out) => {
                for sample in reader.samples::<f32>() {
                    out.push(sample?);
                }
            },
        }
        Ok(())
    }

    /// Number of chunks pushed so far
    pub const fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Produce the joined file
    pub fn finish(mut self) -> Result<Vec<u8>, StitchError> {
        if self.chunks == 0 {
            return Err(StitchError::Empty);
        }
        match (self.format, self.wav.take()) {
            (AudioFormat::Wav, Some((spec, samples))) => encode_wav(spec, &samples),
            (AudioFormat::Wav, None) => Err(StitchError::Empty),
            _ => {
                if let Some(tag) = self.pending_id3v1.take() {
                    self.buffer.extend_from_slice(&tag);
                }
                Ok(self.buffer)
            },
        }
    }
}

fn encode_wav(spec: WavSpec, samples: &Samples) -> Result<Vec<u8>, StitchError> {
    let mut out = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut out, spec)?;
    match samples {
        Samples::Int(samples) => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        },
        Samples::Float(samples) => {
            for &sample in samples {
                writer.write_sample(sample)?;
            }
        },
    }
    writer.finalize()?;
    Ok(out.into_inner())
}
