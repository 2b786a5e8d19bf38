use super::speech_engine::{AudioFrameStream, SpeechEngine, SpeechEngineError};
use crate::domain::synthesis::voice::language_of;
use crate::domain::synthesis::AudioFormat;
use async_openai::{
    config::OpenAIConfig,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::Arc;

/// OpenAI TTS speech engine.
///
/// The API answers with the whole file, so the stream holds a single frame.
pub struct OpenAiSpeechEngine {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiSpeechEngine {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    /// OpenAI voice for a voice identifier, chosen by language
    fn openai_voice(voice: &str) -> Voice {
        match voice.to_lowercase().as_str() {
            "alloy" => return Voice::Alloy,
            "echo" => return Voice::Echo,
            "fable" => return Voice::Fable,
            "onyx" => return Voice::Onyx,
            "nova" => return Voice::Nova,
            "shimmer" => return Voice::Shimmer,
            _ => {}
        }

        match language_of(voice) {
            "es" => Voice::Echo,
            "fr" => Voice::Nova,
            "de" | "sv" => Voice::Onyx,
            "it" => Voice::Fable,
            "pt" => Voice::Shimmer,
            _ => Voice::Alloy,
        }
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }
}

#[async_trait]
impl SpeechEngine for OpenAiSpeechEngine {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn output_format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    async fn open_stream(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<AudioFrameStream, SpeechEngineError> {
        let openai_voice = Self::openai_voice(voice);

        tracing::debug!(
            model = %self.model,
            voice = voice,
            openai_voice = ?openai_voice,
            text_length = text.chars().count(),
            "Calling OpenAI TTS API"
        );

        let request = CreateSpeechRequest {
            model: self.speech_model(),
            input: text.to_string(),
            voice: openai_voice,
            response_format: Some(SpeechResponseFormat::Mp3),
            speed: None,
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                text_length = text.chars().count(),
                "OpenAI TTS API call failed"
            );
            SpeechEngineError::Request(format!("OpenAI TTS error: {}", e))
        })?;

        let audio = response.bytes.to_vec();
        Ok(stream::iter(vec![Ok(audio)]).boxed())
    }
}
