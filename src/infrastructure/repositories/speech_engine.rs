use crate::domain::synthesis::AudioFormat;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Binary audio frames as they arrive from the provider
pub type AudioFrameStream = BoxStream<'static, Result<Vec<u8>, SpeechEngineError>>;

#[derive(Debug, thiserror::Error)]
pub enum SpeechEngineError {
    #[error("speech request failed: {0}")]
    Request(String),
    #[error("audio stream interrupted: {0}")]
    Stream(String),
}

/// External text-to-speech provider (AWS Polly, OpenAI, any OpenAI-compatible server, ...)
///
/// Implementations are responsible for:
/// - Translating the voice identifier into a provider voice
/// - Opening exactly one synthesis call per invocation
/// - Yielding audio frames in the order the provider sends them
///
/// Implementations must not retry or reconnect; deadlines and retries are
/// applied by the caller.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Provider name used in logs and health checks
    fn name(&self) -> &'static str;

    /// Container of the bytes yielded by `open_stream`
    fn output_format(&self) -> AudioFormat;

    /// Start synthesizing `text` with `voice` and return the audio frame stream
    ///
    /// # Errors
    /// Returns error if the provider rejects the request or is unreachable
    async fn open_stream(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<AudioFrameStream, SpeechEngineError>;
}
