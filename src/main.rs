use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use readaloud_backend::controllers::synthesis::SynthesisController;
use readaloud_backend::domain::synthesis::{SynthesisClient, SynthesisService};
use readaloud_backend::infrastructure::config::{Config, LogFormat, TtsProvider};
use readaloud_backend::infrastructure::http::{build_router, start_http_server};
use readaloud_backend::infrastructure::repositories::{
    ArtifactRepository, FallbackSpeechEngine, HttpSpeechEngine, JobStatusRepository,
    OpenAiSpeechEngine, PollySpeechEngine, SpeechEngine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting ReadAloud Backend on {}:{}",
        config.host,
        config.port
    );

    // Prepare audio storage
    let artifact_repo = Arc::new(ArtifactRepository::new(config.audio_dir.clone()));
    artifact_repo.ensure_dir().await?;
    match artifact_repo.check_writable().await {
        Ok(_) => tracing::info!(audio_dir = %config.audio_dir.display(), "Audio directory is writable"),
        Err(e) => tracing::warn!(
            error = %e,
            audio_dir = %config.audio_dir.display(),
            "Audio directory is not writable, jobs will fail to store audio"
        ),
    }

    // Create speech engine
    let engine = create_speech_engine(&config).await?;
    tracing::info!(provider = engine.name(), "Speech engine initialized");

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    let job_repo = Arc::new(JobStatusRepository::new());
    let client = Arc::new(SynthesisClient::new(engine, config.tts_cache_enabled));

    let synthesis_service = Arc::new(SynthesisService::new(
        client,
        job_repo,
        artifact_repo,
        config.pipeline(),
    ));

    let synthesis_controller = Arc::new(SynthesisController::new(
        synthesis_service.clone(),
        config.default_voice.clone(),
        config.max_request_chars,
    ));

    let app = build_router(synthesis_service, synthesis_controller, config.max_request_chars);

    start_http_server(config, app).await?;

    Ok(())
}

async fn create_speech_engine(
    config: &Config,
) -> Result<Arc<dyn SpeechEngine>, Box<dyn std::error::Error>> {
    let primary = build_speech_engine(config.tts_provider, config).await?;

    let fallback = match config.tts_fallback_provider {
        Some(provider) if provider == config.tts_provider => {
            tracing::warn!(provider = ?provider, "Fallback provider is the primary provider, ignoring");
            None
        }
        Some(provider) => Some(build_speech_engine(provider, config).await?),
        None => None,
    };

    match fallback {
        Some(secondary) => {
            tracing::info!(
                provider = primary.name(),
                fallback_provider = secondary.name(),
                "Speech engine fallback enabled"
            );
            Ok(Arc::new(FallbackSpeechEngine::new(primary, secondary)?))
        }
        None => Ok(primary),
    }
}

async fn build_speech_engine(
    provider: TtsProvider,
    config: &Config,
) -> Result<Arc<dyn SpeechEngine>, Box<dyn std::error::Error>> {
    let engine: Arc<dyn SpeechEngine> = match provider {
        TtsProvider::Http => {
            tracing::info!(url = %config.tts_http_url, model = %config.tts_http_model, "Using HTTP speech endpoint");
            Arc::new(HttpSpeechEngine::new(
                config.tts_http_url.clone(),
                config.tts_http_model.clone(),
                config.tts_http_api_key.clone(),
            ))
        }
        TtsProvider::Polly => {
            tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);

            let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
            let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
            if !has_access_key || !has_secret_key {
                tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
            }

            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            tracing::info!(region = ?aws_config.region(), "AWS configuration loaded");

            let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
            Arc::new(PollySpeechEngine::new(polly_client))
        }
        TtsProvider::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or("OPENAI_API_KEY is required for the openai provider")?;
            let openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
            let client = Arc::new(async_openai::Client::with_config(openai_config));
            Arc::new(OpenAiSpeechEngine::new(client, config.openai_tts_model.clone()))
        }
    };

    Ok(engine)
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "readaloud_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "readaloud_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
