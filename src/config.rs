use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Course generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Append `user_id` as a query parameter on every call (the backend routes require it)
    #[serde(default = "default_send_user_id")]
    pub send_user_id: bool,
    /// Whole-request timeout. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_send_user_id() -> bool {
    true
}

/// Identity provider (Supabase-compatible auth REST API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Environment variable holding the anon API key
    #[serde(default = "default_anon_key_env")]
    pub anon_key_env: String,
}

fn default_anon_key_env() -> String {
    "ELEVAN_IDENTITY_ANON_KEY".to_string()
}

impl IdentityConfig {
    /// Read the anon key from the configured environment variable
    pub fn anon_key(&self) -> Option<String> {
        std::env::var(&self.anon_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

/// Where subscription status comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    /// Fixed status from `billing.default_status`
    #[default]
    Static,
    /// `GET /users/user-subscription-status` on the backend
    Backend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default)]
    pub mode: BillingMode,
    /// Status reported in static mode
    #[serde(default = "default_billing_status")]
    pub default_status: String,
    /// Customer id reported in static mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_customer_id: Option<String>,
}

fn default_billing_status() -> String {
    "active".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            mode: BillingMode::default(),
            default_status: default_billing_status(),
            default_customer_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds a cached session is trusted before revalidating (default: 300 = 5 min)
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

fn default_cooldown() -> u64 {
    300 // 5 minutes
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown(),
        }
    }
}

impl SessionConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.cooldown_secs).unwrap_or(i64::MAX))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    /// Delay between the last keystroke and re-filtering lists
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,
    /// Seconds a notification stays on screen
    #[serde(default = "default_toast_secs")]
    pub toast_secs: u64,
}

fn default_search_debounce() -> u64 {
    300
}

fn default_toast_secs() -> u64 {
    4
}

impl UiConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Session store and logs
    pub state: String,
    /// Where downloaded lesson decks land
    pub downloads: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

impl Config {
    /// Project-local config file, relative to the working directory
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("elevan.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Embedded defaults so elevan runs without any config file
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let project_config = Self::project_config_path();
        if project_config.exists() {
            builder = builder.add_source(config::File::from(project_config));
        }

        // User config in ~/.config/elevan/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("elevan").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(PathBuf::from(path)));
        }

        // ELEVAN__BACKEND__BASE_URL and friends
        builder = builder.add_source(
            config::Environment::with_prefix("ELEVAN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to ./elevan.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::project_config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        absolutize(&self.paths.state)
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Get absolute path to the downloads directory
    pub fn downloads_path(&self) -> PathBuf {
        absolutize(&self.paths.downloads)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.backend.request_timeout_secs.map(Duration::from_secs)
    }
}

fn absolutize(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

impl Default for Config {
    fn default() -> Self {
        let state = dirs::data_local_dir()
            .map(|dir| dir.join("elevan").to_string_lossy().to_string())
            .unwrap_or_else(|| ".elevan".to_string());

        Self {
            backend: BackendConfig {
                base_url: "http://localhost:8000".to_string(),
                send_user_id: default_send_user_id(),
                request_timeout_secs: None,
            },
            identity: IdentityConfig {
                url: "http://localhost:54321".to_string(),
                anon_key_env: default_anon_key_env(),
            },
            billing: BillingConfig::default(),
            session: SessionConfig::default(),
            ui: UiConfig {
                refresh_rate_ms: 250,
                search_debounce_ms: default_search_debounce(),
                toast_secs: default_toast_secs(),
            },
            paths: PathsConfig {
                state,
                downloads: ".".to_string(), // cwd
            },
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.session.cooldown_secs, 300);
        assert_eq!(config.ui.search_debounce_ms, 300);
        assert!(config.backend.send_user_id);
        assert_eq!(config.billing.mode, BillingMode::Static);
        assert_eq!(config.billing.default_status, "active");
        assert!(config.backend.request_timeout_secs.is_none());
    }

    #[test]
    fn test_cooldown_duration() {
        let session = SessionConfig { cooldown_secs: 90 };
        assert_eq!(session.cooldown(), chrono::Duration::seconds(90));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[backend]
base_url = "https://api.example.test"
send_user_id = false

[billing]
mode = "backend"
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.backend.base_url, "https://api.example.test");
        assert!(!config.backend.send_user_id);
        assert_eq!(config.billing.mode, BillingMode::Backend);
        // Untouched sections keep their defaults
        assert_eq!(config.session.cooldown_secs, 300);
    }

    #[test]
    fn test_save_writes_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("elevan.toml");

        let mut config = Config::default();
        config.ui.search_debounce_ms = 500;
        config.save_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("search_debounce_ms = 500"));
        let parsed: Config = toml::from_str(&written).unwrap();
        assert_eq!(parsed.ui.search_debounce_ms, 500);
    }

    #[test]
    fn test_logs_path_under_state() {
        let mut config = Config::default();
        config.paths.state = "/tmp/elevan-state".to_string();
        assert_eq!(config.logs_path(), PathBuf::from("/tmp/elevan-state/logs"));
    }
}
