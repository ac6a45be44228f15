use crate::config::toml_config::SyncConfig;
use crate::utils::error::Result;
use crate::utils::validation::{normalize_server_address, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "vocab-sync")]
#[command(about = "Check a vocascan server and inspect its packages")]
pub struct CliConfig {
    #[arg(long, help = "Server address to validate")]
    pub server_address: Option<String>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Bearer token for package requests")]
    pub token: Option<String>,

    #[arg(long, help = "Minimum supported server version")]
    pub min_version: Option<String>,

    #[arg(long, help = "List packages and their groups after a successful check")]
    pub list_packages: bool,

    #[arg(long, help = "Read addresses from stdin, one per line, and report each change")]
    pub watch: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 合併設定檔與命令列參數（命令列優先）
    pub fn resolve(&self) -> Result<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::from_file(path)?,
            None => SyncConfig::default(),
        };

        if let Some(address) = &self.server_address {
            config.server.address =
                Some(normalize_server_address(address).unwrap_or_else(|| address.clone()));
        }
        if let Some(token) = &self.token {
            config.server.auth_token = Some(token.clone());
        }
        if let Some(min_version) = &self.min_version {
            config.server.min_version = min_version.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
