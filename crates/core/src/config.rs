use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub discord: DiscordConfig,
    pub report: ReportConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
    pub application_id: String,
    pub guild_id: String,
    pub announcements_channel_id: String,
    pub updates_channel_id: String,
}

#[derive(Clone, Debug)]
pub struct ReportConfig {
    /// Probability that the weekly report leads with the joke line instead
    /// of the usual opener.
    pub joke_chance: f64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub bot_token: Option<String>,
    pub application_id: Option<String>,
    pub guild_id: Option<String>,
    pub announcements_channel_id: Option<String>,
    pub updates_channel_id: Option<String>,
    pub joke_chance: Option<f64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://raboneko.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            discord: DiscordConfig {
                bot_token: String::new().into(),
                application_id: String::new(),
                guild_id: String::new(),
                announcements_channel_id: String::new(),
                updates_channel_id: String::new(),
            },
            report: ReportConfig { joke_chance: 0.05 },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    discord: Option<DiscordPatch>,
    report: Option<ReportPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    bot_token: Option<String>,
    application_id: Option<String>,
    guild_id: Option<String>,
    announcements_channel_id: Option<String>,
    updates_channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportPatch {
    joke_chance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("raboneko.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(discord) = patch.discord {
            if let Some(bot_token) = discord.bot_token {
                self.discord.bot_token = bot_token.into();
            }
            if let Some(application_id) = discord.application_id {
                self.discord.application_id = application_id;
            }
            if let Some(guild_id) = discord.guild_id {
                self.discord.guild_id = guild_id;
            }
            if let Some(announcements_channel_id) = discord.announcements_channel_id {
                self.discord.announcements_channel_id = announcements_channel_id;
            }
            if let Some(updates_channel_id) = discord.updates_channel_id {
                self.discord.updates_channel_id = updates_channel_id;
            }
        }

        if let Some(report) = patch.report {
            if let Some(joke_chance) = report.joke_chance {
                self.report.joke_chance = joke_chance;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RABONEKO_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("RABONEKO_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("RABONEKO_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("RABONEKO_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("RABONEKO_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RABONEKO_DISCORD_BOT_TOKEN") {
            self.discord.bot_token = value.into();
        }
        if let Some(value) = read_env("RABONEKO_DISCORD_APPLICATION_ID") {
            self.discord.application_id = value;
        }
        if let Some(value) = read_env("RABONEKO_DISCORD_GUILD_ID") {
            self.discord.guild_id = value;
        }
        if let Some(value) = read_env("RABONEKO_DISCORD_ANNOUNCEMENTS_CHANNEL_ID") {
            self.discord.announcements_channel_id = value;
        }
        if let Some(value) = read_env("RABONEKO_DISCORD_UPDATES_CHANNEL_ID") {
            self.discord.updates_channel_id = value;
        }

        if let Some(value) = read_env("RABONEKO_REPORT_JOKE_CHANCE") {
            self.report.joke_chance = parse_f64("RABONEKO_REPORT_JOKE_CHANCE", &value)?;
        }

        if let Some(value) = read_env("RABONEKO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("RABONEKO_SERVER_PORT") {
            self.server.port = parse_u16("RABONEKO_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("RABONEKO_LOGGING_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("RABONEKO_LOGGING_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(bot_token) = overrides.bot_token {
            self.discord.bot_token = bot_token.into();
        }
        if let Some(application_id) = overrides.application_id {
            self.discord.application_id = application_id;
        }
        if let Some(guild_id) = overrides.guild_id {
            self.discord.guild_id = guild_id;
        }
        if let Some(announcements_channel_id) = overrides.announcements_channel_id {
            self.discord.announcements_channel_id = announcements_channel_id;
        }
        if let Some(updates_channel_id) = overrides.updates_channel_id {
            self.discord.updates_channel_id = updates_channel_id;
        }
        if let Some(joke_chance) = overrides.joke_chance {
            self.report.joke_chance = joke_chance;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.discord.bot_token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation("discord.bot_token must be set".to_string()));
        }

        for (key, value) in [
            ("discord.application_id", &self.discord.application_id),
            ("discord.guild_id", &self.discord.guild_id),
            ("discord.announcements_channel_id", &self.discord.announcements_channel_id),
            ("discord.updates_channel_id", &self.discord.updates_channel_id),
        ] {
            if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a numeric snowflake, got `{value}`"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.report.joke_chance) {
            return Err(ConfigError::Validation(format!(
                "report.joke_chance must be within [0, 1], got {}",
                self.report.joke_chance
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(_) => None,
        None => {
            let default = PathBuf::from("raboneko.toml");
            default.exists().then_some(default)
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            database_url: Some("sqlite::memory:".to_string()),
            bot_token: Some("bot-token".to_string()),
            application_id: Some("1111".to_string()),
            guild_id: Some("2222".to_string()),
            announcements_channel_id: Some("3333".to_string()),
            updates_channel_id: Some("4444".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn defaults_fill_everything_but_discord_identity() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "sqlite://raboneko.db");
        assert_eq!(config.report.joke_chance, 0.05);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn load_rejects_missing_discord_identity() {
        let result = AppConfig::load(LoadOptions::default());
        let error = result.err().expect("load must fail without a bot token");
        assert!(error.to_string().contains("discord.bot_token"));
    }

    #[test]
    fn load_accepts_programmatic_overrides() {
        let config = AppConfig::load(LoadOptions {
            overrides: valid_overrides(),
            ..LoadOptions::default()
        })
        .expect("valid overrides should load");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.discord.guild_id, "2222");
    }

    #[test]
    fn load_rejects_non_numeric_snowflakes() {
        let mut overrides = valid_overrides();
        overrides.guild_id = Some("not-a-snowflake".to_string());

        let error = AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() })
            .err()
            .expect("load must fail");
        assert!(error.to_string().contains("discord.guild_id"));
    }

    #[test]
    fn load_rejects_out_of_range_joke_chance() {
        let mut overrides = valid_overrides();
        overrides.joke_chance = Some(1.5);

        let error = AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() })
            .err()
            .expect("load must fail");
        assert!(error.to_string().contains("joke_chance"));
    }

    #[test]
    fn toml_patch_overlays_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[database]\nurl = \"sqlite://from-file.db\"\n\n[report]\njoke_chance = 0.25\n\n[logging]\nformat = \"json\""
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            overrides: valid_overrides(),
            ..LoadOptions::default()
        })
        .expect("config with file should load");

        // Overrides outrank the file for the database url.
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.report.joke_chance, 0.25);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn required_missing_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/raboneko.toml")),
            require_file: true,
            overrides: valid_overrides(),
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn log_format_parses_known_names_only() {
        assert_eq!("pretty".parse::<LogFormat>().expect("pretty"), LogFormat::Pretty);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
