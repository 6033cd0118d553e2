use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub soap: SoapConfig,
  #[serde(default)]
  pub oracle: OracleConfig,
  /// External Postgres collaborator; only reported at startup
  #[serde(default)]
  pub database: DatabaseConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_port")]
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
    }
  }
}

fn default_port() -> u16 {
  DEFAULT_PORT
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoapConfig {
  /// WSINT endpoint receiving the envelopes
  pub url: String,
  /// Static `UserInfo` header value
  pub user_info: String,
  /// Used when a request carries no `X-Session-Context` header
  #[serde(default)]
  pub session_context: String,
}

impl Default for SoapConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:8080/wsint".to_string(),
      user_info: "branch=\"0101\"".to_string(),
      session_context: String::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
  /// Base URL of the listing API, e.g. `http://oracle-api:3001/api/oracle`
  pub base_url: String,
  /// Page size used when pulling the full result set for the page cache
  #[serde(default = "default_fetch_page_size")]
  pub fetch_page_size: u32,
}

impl Default for OracleConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:3001/api/oracle".to_string(),
      fetch_page_size: default_fetch_page_size(),
    }
  }
}

fn default_fetch_page_size() -> u32 {
  500
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
  pub host: Option<String>,
  pub user: Option<String>,
  pub password: Option<String>,
  pub name: Option<String>,
  pub port: Option<u16>,
}

impl DatabaseConfig {
  /// Connection description with the password masked.
  pub fn redacted(&self) -> String {
    format!(
      "postgres://{}:{}@{}:{}/{}",
      self.user.as_deref().unwrap_or("-"),
      if self.password.is_some() { "***" } else { "-" },
      self.host.as_deref().unwrap_or("-"),
      self.port.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
      self.name.as_deref().unwrap_or("-"),
    )
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Directory for daily rolling log files; stderr only when unset
  pub dir: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./contract-gateway.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/contract-gateway/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("contract-gateway.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("contract-gateway").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// Override fields from environment variables.
  ///
  /// `lookup` is `std::env::var` in production and a map in tests.
  pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
  where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(port) = lookup("PORT") {
      self.server.port = port
        .parse()
        .map_err(|e| eyre!("Invalid PORT value '{}': {}", port, e))?;
    }
    if let Some(url) = lookup("SOAP_URL") {
      self.soap.url = url;
    }
    if let Some(user_info) = lookup("SOAP_USER_INFO") {
      self.soap.user_info = user_info;
    }
    if let Some(session) = lookup("SOAP_SESSION_CONTEXT") {
      self.soap.session_context = session;
    }
    if let Some(url) = lookup("ORACLE_API_URL") {
      self.oracle.base_url = url;
    }

    if let Some(host) = lookup("DB_HOST") {
      self.database.host = Some(host);
    }
    if let Some(user) = lookup("DB_USER") {
      self.database.user = Some(user);
    }
    if let Some(password) = lookup("DB_PASSWORD") {
      self.database.password = Some(password);
    }
    if let Some(name) = lookup("DB_NAME") {
      self.database.name = Some(name);
    }
    if let Some(port) = lookup("DB_PORT") {
      self.database.port = Some(
        port
          .parse()
          .map_err(|e| eyre!("Invalid DB_PORT value '{}': {}", port, e))?,
      );
    }

    Ok(())
  }
}
