use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default sliding TTL for conversation sessions (one hour).
const DEFAULT_SESSION_TTL_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub redis: RedisConfig,
    pub groq: GroqConfig,
    pub ocr: OcrConfig,
    pub session: SessionConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroqConfig {
    pub api_key: String,
    /// Chat completion model (e.g., llama-3.3-70b-versatile)
    pub model: String,
    /// OpenAI-compatible API base URL
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Base URL of the OCR extraction sidecar
    pub service_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sliding expiry applied on every session write
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Root directory for stored user images
    pub dir: String,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(ChatConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("chat_db"), is_prod)?,
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://localhost:6379"), is_prod)?,
            },
            groq: GroqConfig {
                api_key: get_env("GROQ_API_KEY", None, is_prod)?,
                model: get_env("GROQ_MODEL", Some("llama-3.3-70b-versatile"), is_prod)?,
                api_base: get_env(
                    "GROQ_API_BASE",
                    Some("https://api.groq.com/openai/v1"),
                    is_prod,
                )?,
            },
            ocr: OcrConfig {
                service_url: get_env("OCR_SERVICE_URL", Some("http://localhost:8090"), is_prod)?,
            },
            session: SessionConfig {
                ttl_seconds: get_env(
                    "SESSION_TTL_SECONDS",
                    Some(&DEFAULT_SESSION_TTL_SECONDS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_SESSION_TTL_SECONDS),
            },
            uploads: UploadConfig {
                dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
