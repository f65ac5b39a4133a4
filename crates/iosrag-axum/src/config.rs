//! Process configuration for the server binary.
//!
//! Every option can come from the command line or the environment; a `.env`
//! file is loaded before parsing.

use std::path::PathBuf;

use clap::Parser;
use iosrag_core::Pacing;

/// Default tracing filter when neither `RUST_LOG` nor `--log-filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,iosrag=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_PACING_MS: u64 = 500;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "iosrag-server")]
#[command(about = "Cisco IOS documentation discovery and RAG backend")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "IOSRAG_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "IOSRAG_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory for the configuration file and downloads
    #[arg(long, env = "IOSRAG_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Configuration file [default: <data-dir>/config.json]
    #[arg(long, env = "IOSRAG_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Base delay between operation steps in milliseconds, 0 disables pacing
    #[arg(long, env = "IOSRAG_PACING_MS", default_value_t = DEFAULT_PACING_MS)]
    pub pacing_ms: u64,

    /// Allowed CORS origins, comma-separated; empty allows all
    #[arg(long, env = "IOSRAG_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Tracing filter used when RUST_LOG is unset
    #[arg(long, env = "IOSRAG_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

impl ServerConfig {
    /// Defaults rooted at `data_dir`, ignoring the environment.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: data_dir.into(),
            config_file: None,
            pacing_ms: DEFAULT_PACING_MS,
            cors_origins: Vec::new(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    #[must_use]
    pub const fn with_pacing_ms(mut self, pacing_ms: u64) -> Self {
        self.pacing_ms = pacing_ms;
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("config.json"))
    }

    pub fn download_dir(&self) -> PathBuf {
        self.data_dir.join("downloads")
    }

    pub const fn pacing(&self) -> Pacing {
        Pacing::from_millis(self.pacing_ms)
    }

    pub fn cors(&self) -> CorsConfig {
        let origins: Vec<String> = self
            .cors_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() {
            CorsConfig::AllowAll
        } else {
            CorsConfig::AllowOrigins(origins)
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parser_builds() {
        ServerConfig::command().debug_assert();
    }

    #[test]
    fn test_explicit_arguments() {
        let config = ServerConfig::parse_from([
            "iosrag-server",
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--data-dir",
            "/srv/iosrag",
            "--pacing-ms",
            "0",
            "--cors-origins",
            "http://localhost:3000, http://localhost:5173",
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(config.config_path(), PathBuf::from("/srv/iosrag/config.json"));
        assert_eq!(config.download_dir(), PathBuf::from("/srv/iosrag/downloads"));
        assert!(config.pacing().is_none());
        assert_eq!(
            config.cors(),
            CorsConfig::AllowOrigins(vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ])
        );
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::with_data_dir("data");
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.cors(), CorsConfig::AllowAll);
        assert!(!config.pacing().is_none());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_explicit_config_file_wins() {
        let mut config = ServerConfig::with_data_dir("data");
        config.config_file = Some(PathBuf::from("/etc/iosrag.json"));
        assert_eq!(config.config_path(), PathBuf::from("/etc/iosrag.json"));
    }
}
