use crate::core::server_validity::{ValiditySettings, VOCASCAN_IDENTIFIER};
use crate::core::version::Version;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env pattern compiles"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub form: FormConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: Option<String>,
    #[serde(default = "default_identifier")]
    pub expected_identifier: String,
    #[serde(default = "default_min_version")]
    pub min_version: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_delay_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_delay_ms")]
    pub loading_hold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_true")]
    pub clear_on_submit: bool,
    #[serde(default = "default_true")]
    pub can_save: bool,
}

fn default_identifier() -> String {
    VOCASCAN_IDENTIFIER.to_string()
}

fn default_min_version() -> String {
    "1.0.0".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: None,
            expected_identifier: default_identifier(),
            min_version: default_min_version(),
            request_timeout_seconds: default_request_timeout(),
            auth_token: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_delay_ms(),
            loading_hold_ms: default_delay_ms(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            clear_on_submit: true,
            can_save: true,
        }
    }
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VOCASCAN_TOKEN})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    pub fn validity_settings(&self) -> ValiditySettings {
        ValiditySettings {
            expected_identifier: self.server.expected_identifier.clone(),
            min_version: self.server.min_version.clone(),
            debounce: Duration::from_millis(self.timing.debounce_ms),
            loading_hold: Duration::from_millis(self.timing.loading_hold_ms),
        }
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        if let Some(address) = &self.server.address {
            validation::validate_url("server.address", address)?;
        }
        validation::validate_non_empty_string(
            "server.expected_identifier",
            &self.server.expected_identifier,
        )?;
        Version::parse(&self.server.min_version).map_err(|_| {
            SyncError::InvalidConfigValueError {
                field: "server.min_version".to_string(),
                value: self.server.min_version.clone(),
                reason: "Not a semantic version (major.minor.patch)".to_string(),
            }
        })?;
        validation::validate_positive_number(
            "server.request_timeout_seconds",
            self.server.request_timeout_seconds,
            1,
        )?;
        Ok(())
    }
}
