use super::assembler::{assemble, AssemblyError};
use super::audio::{AudioFile, AudioSegment};
use super::chunker::{self, TextChunk};
use super::client::SynthesisClient;
use super::error::SynthesisServiceError;
use super::job::{ArtifactHandle, JobId, JobRecord, JobStatus, JobStatusView};
use super::text::{clean_text, truncate_to_limit};
use crate::infrastructure::repositories::{ArtifactRepository, JobStatusRepository};
use async_trait::async_trait;
use futures::{stream, FutureExt, StreamExt};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Limits applied by the synthesis pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longer text is cut down before chunking
    pub max_text_chars: usize,
    pub max_chunk_chars: usize,
    /// Includes the truncation notice chunk
    pub max_chunks: usize,
    pub chunk_timeout: Duration,
    /// Engine calls in flight at once per job; 1 means sequential
    pub chunk_concurrency: usize,
    /// Whole-pipeline reruns after every chunk failed
    pub job_max_retries: u32,
    pub job_retry_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 100_000,
            max_chunk_chars: 3000,
            max_chunks: 50,
            chunk_timeout: Duration::from_secs(50),
            chunk_concurrency: 4,
            job_max_retries: 2,
            job_retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Owns the synthesis jobs: accepts text, runs the pipeline in the background
/// and answers status and download queries.
#[derive(Clone)]
pub struct SynthesisService {
    client: Arc<SynthesisClient>,
    jobs: Arc<JobStatusRepository>,
    artifacts: Arc<ArtifactRepository>,
    config: PipelineConfig,
}

impl SynthesisService {
    pub fn new(
        client: Arc<SynthesisClient>,
        jobs: Arc<JobStatusRepository>,
        artifacts: Arc<ArtifactRepository>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            client,
            jobs,
            artifacts,
            config,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.client.engine_name()
    }

    pub fn artifacts(&self) -> &ArtifactRepository {
        &self.artifacts
    }
}

#[async_trait]
pub trait SynthesisServiceApi: Send + Sync {
    /// Accept text for synthesis and start the job in the background
    ///
    /// Returns as soon as the job is recorded as processing. Failures after
    /// that point are only visible through `poll_status`.
    async fn submit(&self, text: String, voice: String) -> Result<JobId, SynthesisServiceError>;

    /// Current status of a job, `not_found` for unknown ids
    async fn poll_status(&self, job_id: &JobId) -> JobStatusView;

    /// Audio of a completed job
    async fn fetch_artifact(&self, job_id: &JobId) -> Result<AudioFile, SynthesisServiceError>;
}

#[async_trait]
impl SynthesisServiceApi for SynthesisService {
    async fn submit(&self, text: String, voice: String) -> Result<JobId, SynthesisServiceError> {
        let (job_id, _handle) = self.spawn_job(text, voice)?;
        Ok(job_id)
    }

    async fn poll_status(&self, job_id: &JobId) -> JobStatusView {
        if let Some(record) = self.jobs.get(job_id) {
            return JobStatusView::from(&record);
        }

        // Unknown to this process: look at what is on disk
        let status = if self.artifacts.find(job_id).await.is_some() {
            JobStatus::Completed
        } else if self.artifacts.is_in_flight(job_id).await {
            JobStatus::Processing
        } else {
            JobStatus::NotFound
        };

        JobStatusView::new(job_id, status, None)
    }

    async fn fetch_artifact(&self, job_id: &JobId) -> Result<AudioFile, SynthesisServiceError> {
        let handle = match self.jobs.get(job_id) {
            Some(record) => match record.status {
                JobStatus::Processing => return Err(SynthesisServiceError::NotReady),
                JobStatus::Failed => {
                    return Err(SynthesisServiceError::NotFound(format!(
                        "job {} failed: {}",
                        job_id,
                        record.error.unwrap_or_default()
                    )))
                }
                JobStatus::NotFound => {
                    return Err(SynthesisServiceError::NotFound(job_id.to_string()))
                }
                JobStatus::Completed => record.artifact.ok_or_else(|| {
                    SynthesisServiceError::Internal(format!(
                        "job {} completed without audio",
                        job_id
                    ))
                })?,
            },
            None => match self.artifacts.find(job_id).await {
                Some(handle) => handle,
                None if self.artifacts.is_in_flight(job_id).await => {
                    return Err(SynthesisServiceError::NotReady)
                }
                None => return Err(SynthesisServiceError::NotFound(job_id.to_string())),
            },
        };

        let data = self.artifacts.read(&handle).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SynthesisServiceError::NotFound(job_id.to_string()),
            _ => SynthesisServiceError::Internal(format!("failed to read audio file: {}", e)),
        })?;

        Ok(AudioFile {
            data,
            format: handle.format,
        })
    }
}

impl SynthesisService {
    /// Validate, record and start a job. The returned handle resolves when
    /// the job reaches a final state; it does not cancel the job when dropped.
    pub fn spawn_job(
        &self,
        text: String,
        voice: String,
    ) -> Result<(JobId, JoinHandle<()>), SynthesisServiceError> {
        if text.trim().is_empty() {
            return Err(SynthesisServiceError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let text = clean_text(&text);
        let job_id = JobId::new();
        self.jobs
            .insert(JobRecord::processing(job_id, &voice, text.chars().count()));

        if let Err(e) = self.artifacts.mark_in_flight(&job_id) {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to write in-flight marker");
        }

        tracing::info!(
            job_id = %job_id,
            voice = %voice,
            text_length = text.chars().count(),
            "Synthesis job submitted"
        );

        let service = self.clone();
        let handle = tokio::spawn(async move { service.run_job(job_id, text, voice).await });

        Ok((job_id, handle))
    }

    /// Run a job to a final state. Nothing escapes: errors and panics from the
    /// pipeline become a failed status.
    async fn run_job(&self, job_id: JobId, text: String, voice: String) {
        let start_time = std::time::Instant::now();

        let outcome = AssertUnwindSafe(self.execute(&job_id, &text, &voice))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(SynthesisServiceError::Internal(panic_message(panic.as_ref())))
            });

        match outcome {
            Ok(handle) => {
                tracing::info!(
                    job_id = %job_id,
                    path = %handle.path.display(),
                    format = %handle.format,
                    latency_ms = start_time.elapsed().as_millis(),
                    "Synthesis job completed"
                );
                self.jobs.mark_completed(&job_id, handle);
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job_id,
                    error = %e,
                    latency_ms = start_time.elapsed().as_millis(),
                    "Synthesis job failed"
                );
                self.jobs.mark_failed(&job_id, e.to_string());
            }
        }

        if let Err(e) = self.artifacts.clear_in_flight(&job_id).await {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to remove in-flight marker");
        }
    }

    async fn execute(
        &self,
        job_id: &JobId,
        text: &str,
        voice: &str,
    ) -> Result<ArtifactHandle, SynthesisServiceError> {
        let prepared = truncate_to_limit(text, self.config.max_text_chars);
        let chunks = chunker::split(
            &prepared.text,
            self.config.max_chunk_chars,
            self.config.max_chunks,
        );

        if chunks.is_empty() {
            return Err(SynthesisServiceError::InvalidInput(
                "Text contains nothing to read aloud".to_string(),
            ));
        }

        tracing::info!(
            job_id = %job_id,
            chunk_count = chunks.len(),
            text_truncated = prepared.truncated,
            chunk_limit_reached = chunks.iter().any(|c| c.is_truncation_notice),
            "Text split into chunks"
        );

        let max_attempts = self.config.job_max_retries + 1;

        for attempt in 1..=max_attempts {
            let results = self.synthesize_chunks(job_id, &chunks, voice, attempt).await;

            let assembled = tokio::task::spawn_blocking(move || assemble(results))
                .await
                .map_err(|e| anyhow::anyhow!("audio assembly task failed: {}", e))?;

            match assembled {
                Ok(artifact) => {
                    tracing::info!(
                        job_id = %job_id,
                        attempt,
                        segment_count = artifact.segment_count,
                        audio_size_bytes = artifact.data.len(),
                        format = %artifact.format,
                        duration_secs = artifact.duration.map(|d| d.as_secs_f64()),
                        "Audio assembled"
                    );

                    return self
                        .artifacts
                        .write(job_id, &artifact)
                        .await
                        .map_err(|e| SynthesisServiceError::ArtifactWrite(e.to_string()));
                }
                Err(AssemblyError::NoValidSegments) => {
                    tracing::warn!(
                        job_id = %job_id,
                        attempt,
                        max_attempts,
                        "No chunk produced audio"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.job_retry_backoff).await;
                    }
                }
            }
        }

        Err(SynthesisServiceError::NoValidSegments {
            attempts: max_attempts,
        })
    }

    /// Synthesize every chunk, at most `chunk_concurrency` at a time. Results
    /// come back in completion order keyed by chunk index.
    async fn synthesize_chunks(
        &self,
        job_id: &JobId,
        chunks: &[TextChunk],
        voice: &str,
        attempt: u32,
    ) -> Vec<(usize, Option<AudioSegment>)> {
        let timeout = self.config.chunk_timeout;

        let futures: Vec<_> = chunks
            .iter()
            .map(|chunk| async move {
                match self.client.synthesize(&chunk.text, voice, timeout).await {
                    Ok(segment) => (chunk.index, Some(segment)),
                    Err(failure) => {
                        tracing::warn!(
                            job_id = %job_id,
                            chunk_index = chunk.index,
                            chunk_chars = chunk.char_count(),
                            attempt,
                            error = %failure,
                            "Chunk synthesis failed, skipping"
                        );
                        (chunk.index, None)
                    }
                }
            })
            .collect();

        stream::iter(futures)
            .buffer_unordered(self.config.chunk_concurrency.max(1))
            .collect()
            .await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("pipeline panicked: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("pipeline panicked: {}", msg)
    } else {
        "pipeline panicked".to_string()
    }
}
