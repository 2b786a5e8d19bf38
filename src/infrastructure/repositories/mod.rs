pub mod artifact_repository;
pub mod fallback_speech_engine;
pub mod http_speech_engine;
pub mod job_status_repository;
pub mod openai_speech_engine;
pub mod polly_speech_engine;
pub mod speech_engine;

pub use artifact_repository::ArtifactRepository;
pub use fallback_speech_engine::FallbackSpeechEngine;
pub use http_speech_engine::HttpSpeechEngine;
pub use job_status_repository::JobStatusRepository;
pub use openai_speech_engine::OpenAiSpeechEngine;
pub use polly_speech_engine::PollySpeechEngine;
pub use speech_engine::{AudioFrameStream, SpeechEngine, SpeechEngineError};
