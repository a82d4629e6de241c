/// Environment-driven configuration, with development defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub blockfrost_api_url: String,
    pub blockfrost_project_id: String,
    pub worker_interval_ms: u64,
    pub query_timeout_secs: u64,
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:5001".to_string()),
            blockfrost_api_url: std::env::var("BLOCKFROST_API_URL")
                .unwrap_or_else(|_| "https://cardano-preprod.blockfrost.io/api/v0".to_string()),
            blockfrost_project_id: std::env::var("BLOCKFROST_PROJECT_ID").unwrap_or_default(),
            worker_interval_ms: env_u64("WORKER_INTERVAL_MS", 20_000),
            query_timeout_secs: env_u64("QUERY_TIMEOUT_SECS", 10),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
