use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Encoded audio container produced by engines or by the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 2] = [AudioFormat::Mp3, AudioFormat::Wav];

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Audio returned by the speech engine for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    pub data: Vec<u8>,
    pub format: AudioFormat,
    /// The read was cut short by the chunk deadline
    pub partial: bool,
}

impl AudioSegment {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self {
            data,
            format,
            partial: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The stitched audio for a whole job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub data: Vec<u8>,
    pub format: AudioFormat,
    pub segment_count: usize,
    pub duration: Option<Duration>,
}

impl Artifact {
    pub fn from_segment(segment: AudioSegment) -> Self {
        Self {
            data: segment.data,
            format: segment.format,
            segment_count: 1,
            duration: None,
        }
    }
}

/// A stored artifact read back for download
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}
