use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API and open live-update channels.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Job and result snapshots live here, one JSON file per record.
    pub data_dir: String,
    /// Rendered report artifacts live here.
    pub reports_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    pub worker_timeout_secs: u64,
    pub max_results: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let mut allowed_origins: Vec<String> = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in ["http://localhost:5173", "http://localhost:3000"] {
            if !allowed_origins.iter().any(|o| o == origin) {
                allowed_origins.push(origin.to_string());
            }
        }

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                allowed_origins,
            },
            storage: StorageConfig {
                data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data/jobs".to_string()),
                reports_dir: env::var("REPORTS_DIR")
                    .unwrap_or_else(|_| "data/reports".to_string()),
            },
            orchestrator: OrchestratorConfig {
                worker_timeout_secs: env::var("WORKER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
                max_results: env::var("MAX_RESULTS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        // No env manipulation: the defaults must hold when nothing is set.
        let config = Config::from_env().unwrap();
        assert!(!config.server.host.is_empty());
        assert!(config.orchestrator.worker_timeout_secs > 0);
        assert!(config.orchestrator.max_results > 0);
        assert!(config
            .server
            .allowed_origins
            .iter()
            .any(|o| o == "http://localhost:5173"));
    }
}
