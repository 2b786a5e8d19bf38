use super::speech_engine::{AudioFrameStream, SpeechEngine, SpeechEngineError};
use crate::domain::synthesis::voice::language_of;
use crate::domain::synthesis::AudioFormat;
use async_trait::async_trait;
use aws_sdk_polly::{
    error::DisplayErrorContext,
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use futures::{stream, StreamExt};
use std::sync::Arc;

/// AWS Polly speech engine. Audio is read from the response body as it arrives.
pub struct PollySpeechEngine {
    polly_client: Arc<PollyClient>,
}

impl PollySpeechEngine {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    /// Neural Polly voice for a voice identifier.
    ///
    /// Names without a language prefix (`Joanna`) are taken as Polly voice ids.
    fn polly_voice(voice: &str) -> &str {
        if !voice.contains('-') && !voice.is_empty() {
            return voice;
        }

        match language_of(voice) {
            "sv" => "Elin",
            "fr" => "Lea",
            "es" => "Lucia",
            "de" => "Vicki",
            "it" => "Bianca",
            "pt" => "Camila",
            "ja" => "Takumi",
            "ko" => "Seoyeon",
            "zh" => "Zhiyu",
            _ => "Joanna",
        }
    }
}

#[async_trait]
impl SpeechEngine for PollySpeechEngine {
    fn name(&self) -> &'static str {
        "polly"
    }

    fn output_format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    async fn open_stream(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<AudioFrameStream, SpeechEngineError> {
        let voice_name = Self::polly_voice(voice);

        tracing::debug!(
            voice = voice,
            polly_voice = voice_name,
            text_length = text.chars().count(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(VoiceId::from(voice_name))
            .output_format(OutputFormat::Mp3)
            .engine(Engine::Neural)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    polly_voice = voice_name,
                    text_length = text.chars().count(),
                    "AWS Polly synthesize_speech failed"
                );
                SpeechEngineError::Request(format!("AWS Polly error: {}", DisplayErrorContext(&e)))
            })?;

        let frames = stream::unfold(result.audio_stream, |mut body| async move {
            let frame = body.next().await?;
            let frame = frame
                .map(|bytes| bytes.to_vec())
                .map_err(|e| SpeechEngineError::Stream(e.to_string()));
            Some((frame, body))
        });

        Ok(frames.boxed())
    }
}
