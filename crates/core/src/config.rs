use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ScopeId;
use crate::formatter::PLATFORM_MAX_LENGTH;

pub const ENV_DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const ENV_ALLOWED_SERVER_ID: &str = "ALLOWED_SERVER_ID";
pub const ENV_PORT: &str = "PORT";

/// Scope value that matches no real server, leaving the bot usable in direct messages only.
pub const DM_ONLY_SCOPE: ScopeId = ScopeId(0);
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SEARCH_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SIGNATURE: &str = "\n\n> *Bot by M. Farhan Hamim* 🇧🇩";
pub const DEFAULT_DENIAL_MESSAGE: &str =
    "🚫 **Access Denied:** I am only authorized to work in Farhan's server.";
pub const MAX_SIGNATURE_CHARS: usize = 500;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
    pub reply: ReplyConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub token: SecretString,
    pub allowed_server_id: ScopeId,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct ReplyConfig {
    pub signature: String,
    pub denial_message: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub discord_token: Option<String>,
    pub allowed_server_id: Option<ScopeId>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub search_model: Option<String>,
    pub search_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

/// A loaded configuration plus the non-fatal problems found while reading it.
///
/// Warnings are returned rather than logged because configuration is read
/// before the logging subscriber exists.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub warnings: Vec<ConfigWarning>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("DISCORD_TOKEN is missing")]
    MissingToken,
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigWarning {
    #[error("`{source_key}` is not a valid server id (`{value}`); serving direct messages only")]
    InvalidAllowedServerId { source_key: String, value: String },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig {
                token: String::new().into(),
                allowed_server_id: DM_ONLY_SCOPE,
            },
            search: SearchConfig {
                base_url: "https://duckduckgo.com".to_string(),
                model: DEFAULT_SEARCH_MODEL.to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: DEFAULT_PORT },
            reply: ReplyConfig {
                signature: DEFAULT_SIGNATURE.to_string(),
                denial_message: DEFAULT_DENIAL_MESSAGE.to_string(),
            },
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<LoadedConfig, ConfigError> {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch, &mut warnings);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("animebot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides(&mut warnings)?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(LoadedConfig { config, warnings })
    }

    fn apply_patch(&mut self, patch: ConfigPatch, warnings: &mut Vec<ConfigWarning>) {
        if let Some(discord) = patch.discord {
            if let Some(token) = discord.token {
                self.discord.token = token.into();
            }
            if let Some(raw) = discord.allowed_server_id {
                self.discord.allowed_server_id =
                    raw.resolve("discord.allowed_server_id", warnings);
            }
        }

        if let Some(search) = patch.search {
            if let Some(base_url) = search.base_url {
                self.search.base_url = base_url;
            }
            if let Some(model) = search.model {
                self.search.model = model;
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
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

        if let Some(reply) = patch.reply {
            if let Some(signature) = reply.signature {
                self.reply.signature = signature;
            }
            if let Some(denial_message) = reply.denial_message {
                self.reply.denial_message = denial_message;
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

    fn apply_env_overrides(
        &mut self,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = read_env(ENV_DISCORD_TOKEN) {
            self.discord.token = value.into();
        }
        // Set-but-blank is an invalid id, not an absent one.
        if let Ok(value) = env::var(ENV_ALLOWED_SERVER_ID) {
            self.discord.allowed_server_id =
                parse_scope_id(ENV_ALLOWED_SERVER_ID, &value, warnings);
        }
        if let Some(value) = read_env(ENV_PORT) {
            self.server.port = parse_u16(ENV_PORT, &value)?;
        }
        if let Some(value) = read_env("ANIMEBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }

        if let Some(value) = read_env("ANIMEBOT_SEARCH_BASE_URL") {
            self.search.base_url = value;
        }
        if let Some(value) = read_env("ANIMEBOT_SEARCH_MODEL") {
            self.search.model = value;
        }
        if let Some(value) = read_env("ANIMEBOT_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("ANIMEBOT_SEARCH_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("ANIMEBOT_LOGGING_LEVEL").or_else(|| read_env("ANIMEBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ANIMEBOT_LOGGING_FORMAT").or_else(|| read_env("ANIMEBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(token) = overrides.discord_token {
            self.discord.token = token.into();
        }
        if let Some(allowed_server_id) = overrides.allowed_server_id {
            self.discord.allowed_server_id = allowed_server_id;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(search_model) = overrides.search_model {
            self.search.model = search_model;
        }
        if let Some(search_base_url) = overrides.search_base_url {
            self.search.base_url = search_base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_discord(&self.discord)?;
        validate_search(&self.search)?;
        validate_server(&self.server)?;
        validate_reply(&self.reply)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// Direct messages only when no server id was configured (or it failed to parse).
    pub fn is_dm_only(&self) -> bool {
        self.discord.allowed_server_id == DM_ONLY_SCOPE
    }
}

/// Lenient server id parsing: anything that is not an unsigned integer falls
/// back to [`DM_ONLY_SCOPE`] and records a warning instead of failing startup.
pub fn parse_scope_id(key: &str, value: &str, warnings: &mut Vec<ConfigWarning>) -> ScopeId {
    match value.trim().parse::<u64>() {
        Ok(raw) => ScopeId(raw),
        Err(_) => {
            warnings.push(ConfigWarning::InvalidAllowedServerId {
                source_key: key.to_string(),
                value: value.to_string(),
            });
            DM_ONLY_SCOPE
        }
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("animebot.toml"), PathBuf::from("config/animebot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_discord(discord: &DiscordConfig) -> Result<(), ConfigError> {
    if discord.token.expose_secret().trim().is_empty() {
        return Err(ConfigError::MissingToken);
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    let base_url = search.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "search.base_url must start with http:// or https://".to_string(),
        ));
    }

    if search.model.trim().is_empty() {
        return Err(ConfigError::Validation("search.model must not be empty".to_string()));
    }

    if search.timeout_secs == 0 || search.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "search.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.bind_address must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_reply(reply: &ReplyConfig) -> Result<(), ConfigError> {
    if reply.signature.chars().count() > MAX_SIGNATURE_CHARS {
        return Err(ConfigError::Validation(format!(
            "reply.signature must be at most {MAX_SIGNATURE_CHARS} characters"
        )));
    }

    let denial_chars = reply.denial_message.chars().count();
    if reply.denial_message.trim().is_empty() || denial_chars > PLATFORM_MAX_LENGTH {
        return Err(ConfigError::Validation(format!(
            "reply.denial_message must be non-empty and at most {PLATFORM_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    search: Option<SearchPatch>,
    server: Option<ServerPatch>,
    reply: Option<ReplyPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    token: Option<String>,
    allowed_server_id: Option<RawServerId>,
}

/// Server ids show up both as TOML integers and as quoted strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawServerId {
    Integer(i64),
    Text(String),
}

impl RawServerId {
    fn resolve(self, key: &str, warnings: &mut Vec<ConfigWarning>) -> ScopeId {
        match self {
            Self::Integer(value) => match u64::try_from(value) {
                Ok(raw) => ScopeId(raw),
                Err(_) => parse_scope_id(key, &value.to_string(), warnings),
            },
            Self::Text(value) => parse_scope_id(key, &value, warnings),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyPatch {
    signature: Option<String>,
    denial_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        parse_scope_id, AppConfig, ConfigError, ConfigOverrides, ConfigWarning, LoadOptions,
        LogFormat, DM_ONLY_SCOPE,
    };
    use crate::domain::ScopeId;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ALL_VARS: &[&str] = &[
        "DISCORD_TOKEN",
        "ALLOWED_SERVER_ID",
        "PORT",
        "ANIMEBOT_SERVER_BIND_ADDRESS",
        "ANIMEBOT_SEARCH_BASE_URL",
        "ANIMEBOT_SEARCH_MODEL",
        "ANIMEBOT_SEARCH_TIMEOUT_SECS",
        "ANIMEBOT_LOGGING_LEVEL",
        "ANIMEBOT_LOG_LEVEL",
        "ANIMEBOT_LOGGING_FORMAT",
        "ANIMEBOT_LOG_FORMAT",
        "TEST_ANIMEBOT_TOKEN",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn with_env(
        vars: &[(&str, &str)],
        body: impl FnOnce() -> Result<(), String>,
    ) -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = body();
        clear_vars();
        result
    }

    #[test]
    fn missing_token_is_fatal() -> Result<(), String> {
        with_env(&[], || {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected missing token failure".to_string()),
                Err(error) => error,
            };
            ensure(matches!(error, ConfigError::MissingToken), "error should be MissingToken")
        })
    }

    #[test]
    fn blank_token_counts_as_missing() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "   ")], || {
            let result = AppConfig::load(LoadOptions::default());
            ensure(
                matches!(result, Err(ConfigError::MissingToken)),
                "whitespace token should be treated as missing",
            )
        })
    }

    #[test]
    fn defaults_serve_direct_messages_on_port_8080() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "token-value")], || {
            let loaded = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(loaded.config.discord.allowed_server_id == DM_ONLY_SCOPE, "default is 0")?;
            ensure(loaded.config.is_dm_only(), "default config is dm only")?;
            ensure(loaded.config.server.port == 8080, "default port is 8080")?;
            ensure(loaded.config.search.model == "gpt-4o-mini", "default model")?;
            ensure(loaded.warnings.is_empty(), "no warnings expected")
        })
    }

    #[test]
    fn environment_values_are_applied() -> Result<(), String> {
        with_env(
            &[("DISCORD_TOKEN", "token-value"), ("ALLOWED_SERVER_ID", "111"), ("PORT", "10000")],
            || {
                let loaded = AppConfig::load(LoadOptions::default())
                    .map_err(|err| format!("config load failed: {err}"))?;

                ensure(
                    loaded.config.discord.allowed_server_id == ScopeId(111),
                    "server id from env",
                )?;
                ensure(loaded.config.server.port == 10000, "port from env")?;
                ensure(
                    loaded.config.discord.token.expose_secret() == "token-value",
                    "token from env",
                )
            },
        )
    }

    #[test]
    fn non_numeric_server_id_falls_back_to_dm_only_with_warning() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "token-value"), ("ALLOWED_SERVER_ID", "abc")], || {
            let loaded = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                loaded.config.discord.allowed_server_id == ScopeId(0),
                "invalid id resolves to 0",
            )?;
            ensure(
                loaded.warnings
                    == vec![ConfigWarning::InvalidAllowedServerId {
                        source_key: "ALLOWED_SERVER_ID".to_string(),
                        value: "abc".to_string(),
                    }],
                "a single warning should name the offending variable",
            )
        })
    }

    #[test]
    fn blank_server_id_warns_like_any_other_invalid_value() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "token-value"), ("ALLOWED_SERVER_ID", "")], || {
            let loaded = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(loaded.config.discord.allowed_server_id == DM_ONLY_SCOPE, "blank id is 0")?;
            ensure(
                loaded.warnings
                    == vec![ConfigWarning::InvalidAllowedServerId {
                        source_key: "ALLOWED_SERVER_ID".to_string(),
                        value: String::new(),
                    }],
                "a blank id should be reported",
            )
        })
    }

    #[test]
    fn negative_server_id_is_not_a_valid_scope() {
        let mut warnings = Vec::new();
        assert_eq!(parse_scope_id("ALLOWED_SERVER_ID", "-42", &mut warnings), DM_ONLY_SCOPE);
        assert_eq!(warnings.len(), 1);

        let mut warnings = Vec::new();
        assert_eq!(
            parse_scope_id("ALLOWED_SERVER_ID", " 1234567890123456789 ", &mut warnings),
            ScopeId(1_234_567_890_123_456_789)
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn invalid_port_is_rejected() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "token-value"), ("PORT", "eighty")], || {
            let result = AppConfig::load(LoadOptions::default());
            ensure(
                matches!(
                    result,
                    Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "PORT"
                ),
                "invalid PORT should be a configuration error",
            )
        })
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        with_env(
            &[
                ("DISCORD_TOKEN", "token-value"),
                ("ANIMEBOT_LOG_LEVEL", "warn"),
                ("ANIMEBOT_LOG_FORMAT", "pretty"),
            ],
            || {
                let loaded = AppConfig::load(LoadOptions::default())
                    .map_err(|err| format!("config load failed: {err}"))?;

                ensure(loaded.config.logging.level == "warn", "log level from env alias")?;
                ensure(
                    matches!(loaded.config.logging.format, LogFormat::Pretty),
                    "pretty logging format should be set from env var",
                )
            },
        )
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "token-from-env")], || {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("animebot.toml");
            fs::write(
                &path,
                r#"
[discord]
token = "token-from-file"
allowed_server_id = "222"

[server]
port = 9000

[search]
model = "claude-3-haiku"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let loaded = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    port: Some(9100),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;
            let config = loaded.config;

            ensure(
                config.discord.token.expose_secret() == "token-from-env",
                "env token should win over file",
            )?;
            ensure(
                config.discord.allowed_server_id == ScopeId(222),
                "file server id should apply",
            )?;
            ensure(config.search.model == "claude-3-haiku", "file model should apply")?;
            ensure(config.server.port == 9100, "override port should win")?;
            ensure(config.logging.level == "debug", "override log level should win")
        })
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        with_env(&[("TEST_ANIMEBOT_TOKEN", "token-from-interpolation")], || {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("animebot.toml");
            fs::write(
                &path,
                r#"
[discord]
token = "${TEST_ANIMEBOT_TOKEN}"
allowed_server_id = 111
"#,
            )
            .map_err(|err| err.to_string())?;

            let loaded =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                loaded.config.discord.token.expose_secret() == "token-from-interpolation",
                "token should be interpolated from the environment",
            )?;
            ensure(loaded.config.discord.allowed_server_id == ScopeId(111), "integer id from file")
        })
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "token-value")], || {
            let result = AppConfig::load(LoadOptions {
                config_path: Some("does-not-exist/animebot.toml".into()),
                require_file: true,
                ..LoadOptions::default()
            });
            ensure(
                matches!(result, Err(ConfigError::MissingConfigFile(_))),
                "missing required file should fail",
            )
        })
    }

    #[test]
    fn oversized_signature_fails_validation() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "token-value")], || {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("animebot.toml");
            let signature = "x".repeat(600);
            fs::write(&path, format!("[reply]\nsignature = \"{signature}\"\n"))
                .map_err(|err| err.to_string())?;

            let result =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
            ensure(
                matches!(
                    result,
                    Err(ConfigError::Validation(ref message)) if message.contains("reply.signature")
                ),
                "validation failure should mention reply.signature",
            )
        })
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        with_env(&[("DISCORD_TOKEN", "super-secret-token-value")], || {
            let loaded = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{:?}", loaded.config);

            ensure(
                !debug.contains("super-secret-token-value"),
                "debug output should not contain the bot token",
            )?;
            ensure(
                matches!(loaded.config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })
    }
}
