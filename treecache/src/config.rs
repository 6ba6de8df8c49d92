use std::env;

/// Process-level startup parameters for the demonstration binary. The core's
/// own knobs (worker pool size, queue capacity, feature flags) are loaded
/// separately by `treecache_core::CoreConfig::from_env` — this struct only
/// covers what the HTTP surface and the seed store need to come up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub write_log_to_file: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8721".to_string());

        let write_log_to_file = env::var("WRITE_LOG_TO_FILE")
            .unwrap_or_else(|_| "0".to_string())
            .to_lowercase();
        let write_log_to_file = matches!(write_log_to_file.as_str(), "1" | "true" | "yes");

        Self {
            database_url,
            bind_addr,
            write_log_to_file,
        }
    }
}
