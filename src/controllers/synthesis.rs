use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::{
    domain::synthesis::{
        resolve_voice, GenerateAudioRequest, GenerateAudioResponse, JobId, JobStatus,
        JobStatusView, SynthesisService, SynthesisServiceApi, VoicesResponse, VOICE_MAPPING,
    },
    error::{AppError, AppResult},
};

pub struct SynthesisController {
    synthesis_service: Arc<SynthesisService>,
    default_voice: String,
    max_request_chars: usize,
}

impl SynthesisController {
    pub fn new(
        synthesis_service: Arc<SynthesisService>,
        default_voice: String,
        max_request_chars: usize,
    ) -> Self {
        Self {
            synthesis_service,
            default_voice,
            max_request_chars,
        }
    }

    /// POST /generate-audio - Start a synthesis job
    pub async fn generate_audio(
        State(controller): State<Arc<SynthesisController>>,
        Json(request): Json<GenerateAudioRequest>,
    ) -> AppResult<(StatusCode, Json<GenerateAudioResponse>)> {
        if request.text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }

        let char_count = request.text.chars().count();
        if char_count > controller.max_request_chars {
            return Err(AppError::PayloadTooLarge(format!(
                "Text must be {} characters or less",
                controller.max_request_chars
            )));
        }

        let voice = resolve_voice(request.voice.as_deref(), &controller.default_voice);
        let job_id = controller
            .synthesis_service
            .submit(request.text, voice)
            .await?;

        Ok((
            StatusCode::ACCEPTED,
            Json(GenerateAudioResponse {
                job_id: job_id.to_string(),
                status: JobStatus::Processing,
            }),
        ))
    }

    /// GET /status/:job_id - Poll a job
    pub async fn get_status(
        State(controller): State<Arc<SynthesisController>>,
        Path(job_id): Path<String>,
    ) -> (StatusCode, Json<JobStatusView>) {
        let view = match job_id.parse::<JobId>() {
            Ok(id) => controller.synthesis_service.poll_status(&id).await,
            Err(_) => JobStatusView::not_found(&job_id),
        };

        let status = match view.status {
            JobStatus::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::OK,
        };

        (status, Json(view))
    }

    /// GET /audio/:job_id - Download the audio of a completed job
    pub async fn get_audio(
        State(controller): State<Arc<SynthesisController>>,
        Path(job_id): Path<String>,
    ) -> AppResult<Response> {
        let id: JobId = job_id
            .parse()
            .map_err(|_| AppError::NotFound(format!("job {}", job_id)))?;

        let audio = controller.synthesis_service.fetch_artifact(&id).await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(audio.format.content_type()),
        );
        let disposition = format!(
            "attachment; filename=\"pdf_audio_{}.{}\"",
            id,
            audio.format.extension()
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .map_err(|e| AppError::Internal(e.to_string()))?,
        );

        tracing::info!(
            job_id = %id,
            format = %audio.format,
            audio_size_bytes = audio.data.len(),
            "Serving audio"
        );

        Ok((StatusCode::OK, headers, Body::from(audio.data)).into_response())
    }

    /// GET /voices - Language codes accepted in the `voice` field
    pub async fn list_voices(
        State(controller): State<Arc<SynthesisController>>,
    ) -> Json<VoicesResponse> {
        Json(VoicesResponse {
            default_voice: controller.default_voice.clone(),
            voices: VOICE_MAPPING
                .iter()
                .map(|(lang, voice)| (lang.to_string(), voice.to_string()))
                .collect(),
        })
    }
}
