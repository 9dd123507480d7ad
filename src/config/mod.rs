// Configuration module entry point
// Loads server configuration and owns the shared application state

mod persist;
mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use persist::{FileConfigStore, PersistentMappings};
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, MappingsConfig, PerformanceConfig, ServerConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.api_host", "127.0.0.1")?
            .set_default("server.api_port", 8000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "fakerest/0.1")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("mappings.file", "mappings.toml")?
            .set_default("mappings.persist", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn get_api_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.api_host, self.server.api_port)
            .parse()
            .map_err(|e| format!("Invalid API address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("definitely/not/here/config").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.api_port, 8000);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.access_log);
        assert_eq!(config.logging.access_log_format, "combined");
        assert_eq!(config.http.max_body_size, 10_485_760);
        assert_eq!(config.mappings.file, "mappings.toml");
        assert!(config.mappings.persist);
        assert!(config.server.workers.is_none());
        assert_eq!(
            config.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse().unwrap()
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\nworkers = 2\n\n[mappings]\nfile = \"m.toml\"\npersist = false\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let base = dir.path().join("custom");
        let config = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.workers, Some(2));
        assert_eq!(config.mappings.file, "m.toml");
        assert!(!config.mappings.persist);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_address() {
        let mut config = Config::load_from("definitely/not/here/config").unwrap();
        config.server.api_host = "not an ip".to_string();
        assert!(config.get_api_socket_addr().is_err());
    }
}
