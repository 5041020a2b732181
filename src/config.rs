use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub base_url: String,
    pub host: String,
    pub port: u16,

    /// Platform cut of marketplace sales, in basis points.
    pub platform_fee_bps: i64,

    /// Jobs stuck in `running` longer than this are eligible for a queue
    /// restart.
    pub stuck_job_minutes: i64,

    // Security
    pub session_secret: Secret<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: config.get("database_url")?,
            base_url: config.get("base_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            platform_fee_bps: config.get("platform_fee_bps").unwrap_or(500),
            stuck_job_minutes: config.get("stuck_job_minutes").unwrap_or(15),

            session_secret: Secret::new(config.get("session_secret")?),
        })
    }
}
