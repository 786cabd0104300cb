use eyre::{Context, eyre};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::io::AsyncWriteExt;

const BASE_CONFIG_PATH: &str = "config/app_config.toml";
const ENV_PREFIX: &str = "CHATRELAY_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Minimum spacing between outbound chat messages.
    pub message_send_interval_ms: u64,
    /// Put a message whose send failed back at the head of the queue.
    pub retry_failed_sends: bool,
    /// Added to the logging span name so several clients can share a log.
    pub prefix: Option<String>,
    /// Only log warnings and errors.
    pub silent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            message_send_interval_ms: 1000,
            retry_failed_sends: true,
            prefix: None,
            silent: false,
        }
    }
}

impl Config {
    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.message_send_interval_ms)
    }

    /// Name used for the logging span, e.g. `LOBBY-CHATRELAY`.
    pub fn log_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}-CHATRELAY", prefix),
            None => "CHATRELAY".to_string(),
        }
    }

    fn validate(self) -> Result<Self, eyre::Report> {
        if self.message_send_interval_ms == 0 {
            return Err(eyre!("message_send_interval_ms must be greater than zero"));
        }
        Ok(self)
    }
}

/// Per-user config file in the platform config directory.
pub fn user_config_path() -> Result<PathBuf, eyre::Report> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| eyre!("Could not find a config directory"))?
        .join(env!("CARGO_PKG_NAME"));

    Ok(config_dir.join("app_config.toml"))
}

/// Merges the base file, the user file and `CHATRELAY_*` environment
/// variables, later sources winning.
pub fn figment(base: impl AsRef<Path>, user: impl AsRef<Path>) -> Figment {
    Figment::new()
        .merge(Toml::file(base.as_ref()))
        .merge(Toml::file(user.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX))
}

pub fn extract(figment: &Figment) -> Result<Config, eyre::Report> {
    let config: Config = figment.extract().context("Could not load config")?;
    config.validate()
}

/// Loads the merged config. Nothing is logged here since logging is set up
/// from the result.
pub fn load(user_config_path: &Path) -> Result<Config, eyre::Report> {
    extract(&figment(BASE_CONFIG_PATH, user_config_path))
}

/// Writes `config` to `path` unless a file is already there. Returns whether
/// it wrote.
pub async fn save_if_missing(config: &Config, path: &Path) -> Result<bool, eyre::Report> {
    if path.exists() {
        return Ok(false);
    }
    save_to(config, path).await?;
    Ok(true)
}

async fn save_to(config: &Config, path: &Path) -> Result<(), eyre::Report> {
    tracing::info!("Saving config to {:?}", path);

    let bytes = toml::to_string_pretty(config).context("Failed to serialize config")?;

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
    }

    let mut file = tokio::fs::File::create(path)
        .await
        .context("Failed to create config file")?;

    file.write_all(bytes.as_bytes())
        .await
        .context("Failed to write config to file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_apply_without_files() {
        Jail::expect_with(|_jail| {
            let config = extract(&figment("missing.toml", "also_missing.toml")).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.send_interval(), Duration::from_millis(1000));
            Ok(())
        });
    }

    #[test]
    fn user_file_and_env_override_base() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "base.toml",
                "message_send_interval_ms = 1500\nprefix = \"LOBBY\"\n",
            )?;
            jail.create_file("user.toml", "message_send_interval_ms = 1200\n")?;
            jail.set_env("CHATRELAY_SILENT", "true");

            let config = extract(&figment("base.toml", "user.toml")).unwrap();
            assert_eq!(config.message_send_interval_ms, 1200);
            assert_eq!(config.prefix.as_deref(), Some("LOBBY"));
            assert!(config.silent);
            assert!(config.retry_failed_sends);
            assert_eq!(config.log_name(), "LOBBY-CHATRELAY");
            Ok(())
        });
    }

    #[test]
    fn zero_interval_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("CHATRELAY_MESSAGE_SEND_INTERVAL_MS", "0");
            assert!(extract(&figment("base.toml", "user.toml")).is_err());
            Ok(())
        });
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let dir = std::env::temp_dir().join(format!("chatrelay-config-{}", std::process::id()));
        let path = dir.join("nested").join("app_config.toml");
        let config = Config {
            message_send_interval_ms: 750,
            prefix: Some("HUB".to_string()),
            ..Config::default()
        };

        save_to(&config, &path).await.unwrap();
        let loaded = extract(&Figment::new().merge(Toml::file(&path))).unwrap();
        assert_eq!(loaded, config);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn initial_config_is_written_once() {
        let dir = std::env::temp_dir().join(format!("chatrelay-initial-{}", std::process::id()));
        let path = dir.join("app_config.toml");
        let first = Config {
            message_send_interval_ms: 1250,
            ..Config::default()
        };

        assert!(save_if_missing(&first, &path).await.unwrap());
        assert!(!save_if_missing(&Config::default(), &path).await.unwrap());

        let loaded = extract(&Figment::new().merge(Toml::file(&path))).unwrap();
        assert_eq!(loaded, first);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
