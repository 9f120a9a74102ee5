use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: String,
    /// Root of an OpenAI-compatible API; `/chat/completions` is appended.
    pub llm_base_url: String,
    pub llm_model: String,
    /// 0 keeps the fail-fast behavior: one attempt, then fallback.
    pub llm_max_retries: u32,
    pub llm_retry_budget_ms: u64,
    /// No timeout when unset.
    pub llm_timeout_secs: Option<u64>,
    pub image_origin: String,
    pub image_width: u32,
    pub image_height: u32,
    pub port: u16,
    pub rust_log: String,
}

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LLM_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_IMAGE_ORIGIN: &str = "https://image.pollinations.ai/prompt/";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 0)?,
            llm_retry_budget_ms: parse_env("LLM_RETRY_BUDGET_MS", 10_000)?,
            llm_timeout_secs: match std::env::var("LLM_TIMEOUT_SECS") {
                Ok(v) => Some(
                    v.parse()
                        .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                Err(_) => None,
            },
            image_origin: env_or("IMAGE_ORIGIN", DEFAULT_IMAGE_ORIGIN),
            image_width: parse_env("IMAGE_WIDTH", 1024)?,
            image_height: parse_env("IMAGE_HEIGHT", 1024)?,
            port: parse_env("PORT", 8000)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Defaults without touching the process environment.
    pub fn for_tests() -> Self {
        Config {
            openrouter_api_key: "test-key".to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_max_retries: 0,
            llm_retry_budget_ms: 10_000,
            llm_timeout_secs: None,
            image_origin: DEFAULT_IMAGE_ORIGIN.to_string(),
            image_width: 1024,
            image_height: 1024,
            port: 8000,
            rust_log: "info".to_string(),
        }
    }
}
