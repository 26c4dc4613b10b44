use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON snapshot holding every user record.
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { users_file: default_users_file() }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8081 }
fn default_users_file() -> PathBuf { PathBuf::from("data/users.json") }

/// `CONFIG_PATH`, or `config.toml` in the working directory.
pub fn config_path() -> PathBuf {
    std::env::var("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"))
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(&config_path())
    }

    /// The config file at `path` if it exists, otherwise `SERVER_HOST`,
    /// `SERVER_PORT`, `USERS_FILE` and `TOKIO_WORKER_THREADS` over the
    /// defaults. A file that exists but cannot be read, parsed or validated
    /// is an error.
    pub fn load_or_env_from(path: &Path) -> Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(content) => load_from_str(&content)
                .with_context(|| format!("cannot parse {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env(),
            Err(e) => return Err(anyhow!("cannot read {}: {e}", path.display())),
        };
        cfg.normalize_and_validate()
            .with_context(|| format!("invalid configuration from {}", path.display()))?;
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        let port = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok());
        if let Some(port) = port {
            cfg.server.port = port;
        }
        let workers = std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok());
        if let Some(w) = workers {
            cfg.server.worker_threads = Some(w);
        }
        if let Ok(file) = std::env::var("USERS_FILE") {
            cfg.storage.users_file = PathBuf::from(file);
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.users_file.as_os_str().is_empty() {
            return Err(anyhow!("storage.users_file is empty; set it in config.toml or USERS_FILE"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() -> Result<()> {
        let mut cfg = load_from_str("")?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.storage.users_file, PathBuf::from("data/users.json"));
        Ok(())
    }

    #[test]
    fn parses_server_and_storage_sections() -> Result<()> {
        let mut cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            worker_threads = 0

            [storage]
            users_file = "/var/lib/users/users.json"
            "#,
        )?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.storage.users_file, PathBuf::from("/var/lib/users/users.json"));
        Ok(())
    }

    #[test]
    fn rejects_port_zero_and_blank_users_file() {
        let mut cfg = load_from_str("[server]\nport = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = load_from_str("[storage]\nusers_file = \"\"\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    fn tmp_config(tag: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("configs_{tag}_{}.toml", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_falls_back_to_env_and_defaults() -> Result<()> {
        let path = std::env::temp_dir().join("configs_definitely_missing_dir/config.toml");
        let cfg = AppConfig::load_or_env_from(&path)?;
        assert!(!cfg.storage.users_file.as_os_str().is_empty());
        assert_eq!(cfg.server.worker_threads.map(|w| w > 0), Some(true));
        Ok(())
    }

    #[test]
    fn existing_file_is_used() -> Result<()> {
        let path = tmp_config(
            "used",
            "[server]\nport = 9100\n[storage]\nusers_file = \"/srv/users.json\"\n",
        );
        let cfg = AppConfig::load_or_env_from(&path)?;
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.storage.users_file, PathBuf::from("/srv/users.json"));
        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn invalid_file_is_an_error_not_a_fallback() {
        let path = tmp_config(
            "port0",
            "[server]\nport = 0\n[storage]\nusers_file = \"/srv/users.json\"\n",
        );
        assert!(AppConfig::load_or_env_from(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unparsable_file_is_an_error_not_a_fallback() {
        let path = tmp_config("syntax", "[server\nport = = 9000\n");
        let err = AppConfig::load_or_env_from(&path).unwrap_err();
        assert!(err.to_string().contains("cannot parse"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn blank_host_falls_back() -> Result<()> {
        let mut cfg = load_from_str("[server]\nhost = \"  \"\n")?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        Ok(())
    }
}
