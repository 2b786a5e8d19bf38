use super::speech_engine::{AudioFrameStream, SpeechEngine, SpeechEngineError};
use crate::domain::synthesis::AudioFormat;
use async_trait::async_trait;
use std::sync::Arc;

/// Speech engine that hands a chunk to a second provider when the first one
/// refuses to start it.
///
/// Only a failed `open_stream` switches over. A stream that breaks after
/// opening is reported as is, since frames may already have been consumed.
/// Both providers must produce the same container.
pub struct FallbackSpeechEngine {
    primary: Arc<dyn SpeechEngine>,
    secondary: Arc<dyn SpeechEngine>,
}

impl FallbackSpeechEngine {
    pub fn new(
        primary: Arc<dyn SpeechEngine>,
        secondary: Arc<dyn SpeechEngine>,
    ) -> anyhow::Result<Self> {
        if primary.output_format() != secondary.output_format() {
            anyhow::bail!(
                "fallback engine {} produces {} but {} produces {}",
                secondary.name(),
                secondary.output_format(),
                primary.name(),
                primary.output_format()
            );
        }

        Ok(Self { primary, secondary })
    }
}

#[async_trait]
impl SpeechEngine for FallbackSpeechEngine {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn output_format(&self) -> AudioFormat {
        self.primary.output_format()
    }

    async fn open_stream(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<AudioFrameStream, SpeechEngineError> {
        match self.primary.open_stream(text, voice).await {
            Ok(stream) => Ok(stream),
            Err(primary_error) => {
                tracing::warn!(
                    provider = self.primary.name(),
                    fallback_provider = self.secondary.name(),
                    error = %primary_error,
                    text_length = text.chars().count(),
                    "Primary speech engine failed, trying fallback"
                );

                self.secondary.open_stream(text, voice).await.map_err(|e| {
                    SpeechEngineError::Request(format!(
                        "{} failed ({}), fallback {} failed: {}",
                        self.primary.name(),
                        primary_error,
                        self.secondary.name(),
                        e
                    ))
                })
            }
        }
    }
}
