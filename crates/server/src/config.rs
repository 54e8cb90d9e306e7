//! Server configuration

use std::time::Duration;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub chroma_url: String,
    pub chroma_collection: String,
    /// Guideline chunks retrieved per report
    pub guideline_k: usize,
    pub upstream_timeout_secs: u64,
    /// Idle time after which a session is dropped; 0 keeps sessions forever
    pub session_ttl_secs: u64,
    /// Site line printed in the report header
    pub report_location: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("BIND_ADDRESS", "0.0.0.0:8080"),
            api_key: env_opt("API_KEY"),
            cors_origins: env_or("CORS_ORIGINS", "*")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS", 10),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            chat_model: env_or("CHAT_MODEL", "gpt-4o"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-ada-002"),
            chroma_url: env_or("CHROMA_URL", "http://localhost:8000"),
            chroma_collection: env_or("CHROMA_COLLECTION", "langchain"),
            guideline_k: env_parse("GUIDELINE_K", 2),
            upstream_timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 60),
            session_ttl_secs: env_parse("SESSION_TTL_SECS", 3600),
            report_location: env_or("REPORT_LOCATION", "Remagen, Germany"),
        }
    }

    /// Bound applied to every gateway, embedding and vector-store call
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_secs > 0).then(|| Duration::from_secs(self.session_ttl_secs))
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_opt(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = key, value = %raw, "Unparseable setting, using default");
            default
        }),
        None => default,
    }
}
