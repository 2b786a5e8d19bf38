use anyhow::Result;
use axum::Router;
use hyper::StatusCode;
use readaloud_backend::{
    controllers::synthesis::SynthesisController,
    domain::synthesis::{PipelineConfig, SynthesisClient, SynthesisService, DEFAULT_VOICE},
    infrastructure::{
        http::build_router,
        repositories::{ArtifactRepository, JobStatusRepository},
    },
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;
pub mod mock_engine;

use api_client::TestClient;
use mock_engine::{MockBehavior, MockSpeechEngine};

pub const MAX_REQUEST_CHARS: usize = 2_000;

pub struct TestContext {
    pub client: TestClient,
    pub engine: Arc<MockSpeechEngine>,
    #[allow(dead_code)]
    pub audio_dir: TempDir,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            Self::with_engine(MockBehavior::Succeed, test_pipeline())
                .await
                .expect("Failed to start test server")
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // The audio directory is removed when `audio_dir` drops
        }
    }
}

/// Short timeouts and backoff so failing jobs settle quickly
pub fn test_pipeline() -> PipelineConfig {
    PipelineConfig {
        max_text_chars: 1_000,
        max_chunk_chars: 200,
        max_chunks: 10,
        chunk_timeout: Duration::from_millis(100),
        chunk_concurrency: 4,
        job_max_retries: 2,
        job_retry_backoff: Duration::from_millis(10),
    }
}

impl TestContext {
    pub async fn with_engine(behavior: MockBehavior, pipeline: PipelineConfig) -> Result<Self> {
        let audio_dir = tempfile::tempdir()?;
        let engine = Arc::new(MockSpeechEngine::new(behavior));

        let app = create_app(engine.clone(), &audio_dir, pipeline).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self {
            client: TestClient::new(&base_url),
            engine,
            audio_dir,
        })
    }

    /// Submit text and return the job id from the 202 response
    pub async fn submit(&self, text: &str) -> String {
        let response = self
            .client
            .post("/generate-audio", &serde_json::json!({ "text": text }))
            .await
            .unwrap();
        response.assert_status(StatusCode::ACCEPTED);

        response.body.as_ref().unwrap()["job_id"]
            .as_str()
            .expect("Missing job_id")
            .to_string()
    }

    /// Poll the status endpoint until the job leaves `processing`
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);

        loop {
            let response = self.client.get(&format!("/status/{}", job_id)).await.unwrap();
            let body = response.body.clone().expect("Missing status body");

            if body["status"] != "processing" {
                return body;
            }

            assert!(
                tokio::time::Instant::now() < deadline,
                "job {} still processing after 10s",
                job_id
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

async fn create_app(
    engine: Arc<MockSpeechEngine>,
    audio_dir: &TempDir,
    pipeline: PipelineConfig,
) -> Result<Router> {
    let artifact_repo = Arc::new(ArtifactRepository::new(audio_dir.path()));
    artifact_repo.ensure_dir().await?;

    let synthesis_service = Arc::new(SynthesisService::new(
        Arc::new(SynthesisClient::new(engine, false)),
        Arc::new(JobStatusRepository::new()),
        artifact_repo,
        pipeline,
    ));

    let synthesis_controller = Arc::new(SynthesisController::new(
        synthesis_service.clone(),
        DEFAULT_VOICE.to_string(),
        MAX_REQUEST_CHARS,
    ));

    Ok(build_router(
        synthesis_service,
        synthesis_controller,
        MAX_REQUEST_CHARS,
    ))
}
