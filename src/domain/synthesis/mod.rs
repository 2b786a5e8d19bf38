pub mod assembler;
pub mod audio;
pub mod chunker;
pub mod client;
pub mod error;
pub mod job;
pub mod service;
pub mod text;
pub mod voice;

pub use assembler::{assemble, AssemblyError};
pub use audio::{Artifact, AudioFile, AudioFormat, AudioSegment};
pub use chunker::{TextChunk, CHUNK_LIMIT_NOTICE};
pub use client::{ChunkFailure, SynthesisClient};
pub use error::SynthesisServiceError;
pub use job::{ArtifactHandle, JobId, JobRecord, JobStatus, JobStatusView};
pub use service::{PipelineConfig, SynthesisService, SynthesisServiceApi};
pub use text::TEXT_TRUNCATED_NOTICE;
pub use voice::{resolve_voice, DEFAULT_VOICE, VOICE_MAPPING};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request for POST /generate-audio
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateAudioRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Response for POST /generate-audio
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateAudioResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Response for GET /voices
#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub default_voice: String,
    pub voices: BTreeMap<String, String>,
}
