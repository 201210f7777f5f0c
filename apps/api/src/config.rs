use anyhow::{Context, Result};

/// Placeholder shipped in `.env.example`; never a real key.
const PLACEHOLDER_KEY: &str = "your-gemini-api-key";
const MIN_KEY_LEN: usize = 10;

/// Which advisor answers chat turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvisorMode {
    /// Gemini-backed advisor, falling back to rules when a call fails.
    Llm,
    /// Local keyword rules only. No requests leave the process.
    RuleBased,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn advisor_mode(&self) -> AdvisorMode {
        match self.gemini_api_key.as_deref() {
            Some(key) if is_usable_key(key) => AdvisorMode::Llm,
            _ => AdvisorMode::RuleBased,
        }
    }
}

fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    key.len() >= MIN_KEY_LEN && !key.contains(PLACEHOLDER_KEY)
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> Config {
        Config {
            database_url: "postgres://localhost/counsellor".to_string(),
            gemini_api_key: key.map(String::from),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_missing_key_selects_rule_based() {
        assert_eq!(config_with_key(None).advisor_mode(), AdvisorMode::RuleBased);
    }

    #[test]
    fn test_placeholder_key_selects_rule_based() {
        let config = config_with_key(Some("your-gemini-api-key-here"));
        assert_eq!(config.advisor_mode(), AdvisorMode::RuleBased);
    }

    #[test]
    fn test_short_key_selects_rule_based() {
        assert_eq!(
            config_with_key(Some("abc123")).advisor_mode(),
            AdvisorMode::RuleBased
        );
    }

    #[test]
    fn test_real_looking_key_selects_llm() {
        let config = config_with_key(Some("AIzaSyD-example-key-0123456789"));
        assert_eq!(config.advisor_mode(), AdvisorMode::Llm);
    }
}
