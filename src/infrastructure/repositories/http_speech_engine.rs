use super::speech_engine::{AudioFrameStream, SpeechEngine, SpeechEngineError};
use crate::domain::synthesis::AudioFormat;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;

/// Body of an OpenAI-style `/v1/audio/speech` request
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Speech engine for any server exposing an OpenAI-compatible speech endpoint
/// (edge-tts proxies, local TTS servers). Neural voice names are sent as-is
/// and the response body is streamed frame by frame.
pub struct HttpSpeechEngine {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpSpeechEngine {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl SpeechEngine for HttpSpeechEngine {
    fn name(&self) -> &'static str {
        "http"
    }

    fn output_format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    async fn open_stream(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<AudioFrameStream, SpeechEngineError> {
        tracing::debug!(
            url = %self.url,
            model = %self.model,
            voice = voice,
            text_length = text.chars().count(),
            "Calling speech endpoint"
        );

        let mut request = self.client.post(&self.url).json(&SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            response_format: AudioFormat::Mp3.extension(),
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SpeechEngineError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = status.as_u16(), body = %body, "Speech endpoint returned an error");
            return Err(SpeechEngineError::Request(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let frames = response.bytes_stream().map(|frame| {
            frame
                .map(|bytes| bytes.to_vec())
                .map_err(|e| SpeechEngineError::Stream(e.to_string()))
        });

        Ok(frames.boxed())
    }
}
