use crate::domain::synthesis::{PipelineConfig, DEFAULT_VOICE};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    /// Directory holding finished audio files and in-flight markers
    pub audio_dir: PathBuf,
    // Speech engine
    pub tts_provider: TtsProvider,
    /// Used for a chunk when the primary provider rejects it
    pub tts_fallback_provider: Option<TtsProvider>,
    pub tts_http_url: String,
    pub tts_http_model: String,
    pub tts_http_api_key: Option<String>,
    pub aws_region: String,
    pub openai_api_key: Option<String>,
    pub openai_tts_model: String,
    pub tts_cache_enabled: bool,
    pub default_voice: String,
    // Limits
    pub max_request_chars: usize,
    pub max_text_chars: usize,
    pub max_chunk_chars: usize,
    pub max_chunks: usize,
    pub chunk_timeout_secs: u64,
    pub chunk_concurrency: usize,
    pub job_max_retries: u32,
    pub job_retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Log format used when `LOG_FORMAT` is not set
    pub fn default_log_format(&self) -> LogFormat {
        match self {
            Environment::Development => LogFormat::Pretty,
            Environment::Production => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// OpenAI-compatible speech endpoint at `TTS_HTTP_URL`
    Http,
    Polly,
    OpenAi,
}

impl std::str::FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(TtsProvider::Http),
            "polly" => Ok(TtsProvider::Polly),
            "openai" => Ok(TtsProvider::OpenAi),
            other => Err(format!("unknown TTS_PROVIDER '{}'", other)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "production" => Environment::Production,
            _ => Environment::Development,
        };

        let log_format = match env::var("LOG_FORMAT") {
            Ok(s) if s == "json" => LogFormat::Json,
            Ok(s) if s == "pretty" => LogFormat::Pretty,
            _ => environment.default_log_format(),
        };

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse()?,
            environment,
            log_format,
            audio_dir: env::var("AUDIO_DIR")
                .unwrap_or_else(|_| "/tmp/audio".to_string())
                .into(),
            tts_provider: env::var("TTS_PROVIDER")
                .unwrap_or_else(|_| "http".to_string())
                .parse()?,
            tts_fallback_provider: env::var("TTS_FALLBACK_PROVIDER")
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<TtsProvider>())
                .transpose()?,
            tts_http_url: env::var("TTS_HTTP_URL")
                .unwrap_or_else(|_| "http://localhost:8080/v1/audio/speech".to_string()),
            tts_http_model: env::var("TTS_HTTP_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            tts_http_api_key: env::var("TTS_HTTP_API_KEY").ok().filter(|k| !k.is_empty()),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_tts_model: env::var("OPENAI_TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            tts_cache_enabled: env::var("TTS_CACHE_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse::<String>()
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
            default_voice: env::var("DEFAULT_VOICE").unwrap_or_else(|_| DEFAULT_VOICE.to_string()),
            max_request_chars: env::var("MAX_REQUEST_CHARS")
                .unwrap_or_else(|_| "500000".to_string())
                .parse()?,
            max_text_chars: env::var("MAX_TEXT_CHARS")
                .unwrap_or_else(|_| "100000".to_string())
                .parse()?,
            max_chunk_chars: env::var("MAX_CHUNK_CHARS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            max_chunks: env::var("MAX_CHUNKS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,
            chunk_timeout_secs: env::var("CHUNK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,
            chunk_concurrency: env::var("CHUNK_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()?,
            job_max_retries: env::var("JOB_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            job_retry_backoff_ms: env::var("JOB_RETRY_BACKOFF_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
        };

        Ok(config)
    }

    /// Pipeline limits, with chunk count and concurrency clamped to usable minimums
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_text_chars: self.max_text_chars,
            max_chunk_chars: self.max_chunk_chars.max(1),
            max_chunks: self.max_chunks.max(2),
            chunk_timeout: Duration::from_secs(self.chunk_timeout_secs),
            chunk_concurrency: self.chunk_concurrency.max(1),
            job_max_retries: self.job_max_retries,
            job_retry_backoff: Duration::from_millis(self.job_retry_backoff_ms),
        }
    }
}
