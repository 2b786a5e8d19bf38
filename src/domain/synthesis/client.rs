use super::audio::AudioSegment;
use crate::infrastructure::repositories::SpeechEngine;
use futures::StreamExt;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Why a single chunk produced no audio. Never fatal to the job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkFailure {
    #[error("no audio received within {0:?}")]
    Timeout(Duration),
    #[error("speech engine error: {0}")]
    Engine(String),
}

/// Runs one streaming engine call per chunk under a deadline
pub struct SynthesisClient {
    engine: Arc<dyn SpeechEngine>,
    cache: Option<Cache<String, AudioSegment>>,
}

impl SynthesisClient {
    pub fn new(engine: Arc<dyn SpeechEngine>, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(256)
                    .time_to_idle(Duration::from_secs(30 * 60))
                    .build(),
            )
        } else {
            None
        };

        Self { engine, cache }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Synthesize one chunk.
    ///
    /// The deadline covers opening the stream and reading it. When it elapses
    /// the bytes read so far are returned as a partial segment, or `Timeout` if
    /// nothing arrived. Any engine error, including one mid-stream, is `Engine`.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        timeout: Duration,
    ) -> Result<AudioSegment, ChunkFailure> {
        let cache_key = format!("{}\n{}", voice, text);
        if let Some(cache) = &self.cache {
            if let Some(segment) = cache.get(&cache_key).await {
                tracing::debug!(
                    voice = voice,
                    audio_size_bytes = segment.data.len(),
                    "Segment cache hit"
                );
                return Ok(segment);
            }
        }

        let start_time = std::time::Instant::now();
        let deadline = Instant::now() + timeout;

        let mut stream = match timeout_at(deadline, self.engine.open_stream(text, voice)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ChunkFailure::Engine(e.to_string())),
            Err(_) => return Err(ChunkFailure::Timeout(timeout)),
        };

        let mut data = Vec::new();
        let mut timed_out = false;

        loop {
            match timeout_at(deadline, stream.next()).await {
                Ok(Some(Ok(frame))) => data.extend_from_slice(&frame),
                Ok(Some(Err(e))) => {
                    tracing::warn!(
                        error = %e,
                        received_bytes = data.len(),
                        "Audio stream failed, discarding partial audio"
                    );
                    return Err(ChunkFailure::Engine(e.to_string()));
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    break;
                }
            }
        }

        if data.is_empty() {
            return Err(if timed_out {
                ChunkFailure::Timeout(timeout)
            } else {
                ChunkFailure::Engine("stream completed without audio".to_string())
            });
        }

        let mut segment = AudioSegment::new(data, self.engine.output_format());
        segment.partial = timed_out;

        if timed_out {
            tracing::warn!(
                provider = self.engine.name(),
                received_bytes = segment.data.len(),
                timeout_ms = timeout.as_millis(),
                "Chunk deadline elapsed, keeping partial audio"
            );
        } else {
            tracing::debug!(
                provider = self.engine.name(),
                latency_ms = start_time.elapsed().as_millis(),
                audio_size_bytes = segment.data.len(),
                "Chunk synthesized"
            );

            if let Some(cache) = &self.cache {
                cache.insert(cache_key, segment.clone()).await;
            }
        }

        Ok(segment)
    }
}
