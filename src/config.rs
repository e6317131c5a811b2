use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub transmission: TransmissionConfig,
    #[serde(default)]
    pub vpn: VpnConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub allowed_user_ids: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransmissionConfig {
    #[serde(default = "default_transmission_program")]
    pub program: String,
    /// Daemon address passed as the first argument, e.g. "localhost:9091".
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub download_path: PathBuf,
    pub default_folder: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VpnConfig {
    #[serde(default = "default_vpn_program")]
    pub program: String,
}

impl Default for VpnConfig {
    fn default() -> Self {
        Self {
            program: default_vpn_program(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExecutorConfig {
    /// Upper bound for a single external command, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_transmission_program() -> String {
    "transmission-remote".to_string()
}

fn default_vpn_program() -> String {
    "ipsec".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.executor.timeout_secs)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // TOML first; fall back to the old one-value-per-line layout.
        let config = match Self::parse(&content) {
            Ok(c) => c,
            Err(primary_err) => Self::parse_legacy(&content).with_context(|| {
                format!(
                    "Failed to parse config file (toml format error: {:#}; legacy format also failed)",
                    primary_err
                )
            })?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML configuration")
    }

    /// Parses the legacy plain-text layout, one value per line:
    ///
    /// ```text
    /// TOKEN
    /// TRANSMISSION_USER
    /// TRANSMISSION_PASSWORD
    /// AUTHORIZED_USERS (comma separated)
    /// DEFAULT_DOWNLOAD_PATH
    /// DEFAULT_DOWNLOAD_FOLDER
    /// ```
    pub fn parse_legacy(content: &str) -> Result<Self> {
        let lines: Vec<&str> = content.lines().collect();
        let &[token, user, password, users, download_path, default_folder] = lines.as_slice() else {
            anyhow::bail!("Expected 6 lines in legacy config, found {}", lines.len());
        };

        let allowed_user_ids = users
            .split(',')
            .map(|id| {
                id.trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid user id in legacy config: '{}'", id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Config {
            telegram: TelegramConfig {
                bot_token: token.to_string(),
                allowed_user_ids,
            },
            transmission: TransmissionConfig {
                program: default_transmission_program(),
                host: None,
                username: user.to_string(),
                password: password.to_string(),
                download_path: PathBuf::from(download_path),
                default_folder: default_folder.to_string(),
            },
            vpn: VpnConfig::default(),
            executor: ExecutorConfig::default(),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token must not be empty");
        }
        if self.telegram.allowed_user_ids.is_empty() {
            anyhow::bail!("telegram.allowed_user_ids must list at least one user");
        }
        if self.executor.timeout_secs == 0 {
            anyhow::bail!("executor.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
