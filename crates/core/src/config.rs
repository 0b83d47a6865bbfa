use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub openai: OpenAiConfig,
    pub pinecone: PineconeConfig,
    pub observability: ObservabilityConfig,
    pub prompt: PromptConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub poll_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
pub struct PineconeConfig {
    pub api_key: Option<SecretString>,
    pub index_name: String,
    pub controller_url: String,
    pub top_k: usize,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub api_key: Option<SecretString>,
    pub agent_name: String,
}

#[derive(Clone, Debug)]
pub struct PromptConfig {
    pub version: String,
    pub instructions_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
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
    pub telegram_bot_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub pinecone_index_name: Option<String>,
    pub observability_enabled: Option<bool>,
    pub prompt_version: Option<String>,
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
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig { bot_token: String::new().into(), poll_timeout_secs: 30 },
            openai: OpenAiConfig {
                api_key: String::new().into(),
                base_url: "https://api.openai.com/v1".to_string(),
                chat_model: "gpt-3.5-turbo".to_string(),
                embedding_model: "text-embedding-3-small".to_string(),
                embedding_dimensions: 1536,
                timeout_secs: 30,
                max_tokens: 500,
                temperature: 0.9,
            },
            pinecone: PineconeConfig {
                api_key: None,
                index_name: "coffee-shop-inventory".to_string(),
                controller_url: "https://api.pinecone.io".to_string(),
                top_k: 3,
                timeout_secs: 30,
            },
            observability: ObservabilityConfig {
                enabled: false,
                endpoint: None,
                api_key: None,
                agent_name: "Coffee Shop Bot".to_string(),
            },
            prompt: PromptConfig { version: "sales-v1".to_string(), instructions_path: None },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("brewbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(telegram) = patch.telegram {
            if let Some(bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token_value);
            }
            if let Some(poll_timeout_secs) = telegram.poll_timeout_secs {
                self.telegram.poll_timeout_secs = poll_timeout_secs;
            }
        }

        if let Some(openai) = patch.openai {
            if let Some(api_key_value) = openai.api_key {
                self.openai.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = openai.base_url {
                self.openai.base_url = base_url;
            }
            if let Some(chat_model) = openai.chat_model {
                self.openai.chat_model = chat_model;
            }
            if let Some(embedding_model) = openai.embedding_model {
                self.openai.embedding_model = embedding_model;
            }
            if let Some(embedding_dimensions) = openai.embedding_dimensions {
                self.openai.embedding_dimensions = embedding_dimensions;
            }
            if let Some(timeout_secs) = openai.timeout_secs {
                self.openai.timeout_secs = timeout_secs;
            }
            if let Some(max_tokens) = openai.max_tokens {
                self.openai.max_tokens = max_tokens;
            }
            if let Some(temperature) = openai.temperature {
                self.openai.temperature = temperature;
            }
        }

        if let Some(pinecone) = patch.pinecone {
            if let Some(api_key_value) = pinecone.api_key {
                self.pinecone.api_key = Some(secret_value(api_key_value));
            }
            if let Some(index_name) = pinecone.index_name {
                self.pinecone.index_name = index_name;
            }
            if let Some(controller_url) = pinecone.controller_url {
                self.pinecone.controller_url = controller_url;
            }
            if let Some(top_k) = pinecone.top_k {
                self.pinecone.top_k = top_k;
            }
            if let Some(timeout_secs) = pinecone.timeout_secs {
                self.pinecone.timeout_secs = timeout_secs;
            }
        }

        if let Some(observability) = patch.observability {
            if let Some(enabled) = observability.enabled {
                self.observability.enabled = enabled;
            }
            if let Some(endpoint) = observability.endpoint {
                self.observability.endpoint = Some(endpoint);
            }
            if let Some(api_key_value) = observability.api_key {
                self.observability.api_key = Some(secret_value(api_key_value));
            }
            if let Some(agent_name) = observability.agent_name {
                self.observability.agent_name = agent_name;
            }
        }

        if let Some(prompt) = patch.prompt {
            if let Some(version) = prompt.version {
                self.prompt.version = version;
            }
            if let Some(instructions_path) = prompt.instructions_path {
                self.prompt.instructions_path = Some(instructions_path);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
        if let Some(value) = read_env("BREWBOT_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("BREWBOT_TELEGRAM_POLL_TIMEOUT_SECS") {
            self.telegram.poll_timeout_secs =
                parse_u64("BREWBOT_TELEGRAM_POLL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BREWBOT_OPENAI_API_KEY") {
            self.openai.api_key = secret_value(value);
        }
        if let Some(value) = read_env("BREWBOT_OPENAI_BASE_URL") {
            self.openai.base_url = value;
        }
        if let Some(value) = read_env("BREWBOT_OPENAI_CHAT_MODEL") {
            self.openai.chat_model = value;
        }
        if let Some(value) = read_env("BREWBOT_OPENAI_EMBEDDING_MODEL") {
            self.openai.embedding_model = value;
        }
        if let Some(value) = read_env("BREWBOT_OPENAI_EMBEDDING_DIMENSIONS") {
            self.openai.embedding_dimensions =
                parse_usize("BREWBOT_OPENAI_EMBEDDING_DIMENSIONS", &value)?;
        }
        if let Some(value) = read_env("BREWBOT_OPENAI_TIMEOUT_SECS") {
            self.openai.timeout_secs = parse_u64("BREWBOT_OPENAI_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("BREWBOT_OPENAI_MAX_TOKENS") {
            self.openai.max_tokens = parse_u32("BREWBOT_OPENAI_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("BREWBOT_OPENAI_TEMPERATURE") {
            self.openai.temperature = parse_f32("BREWBOT_OPENAI_TEMPERATURE", &value)?;
        }

        if let Some(value) = read_env("BREWBOT_PINECONE_API_KEY") {
            self.pinecone.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("BREWBOT_PINECONE_INDEX_NAME") {
            self.pinecone.index_name = value;
        }
        if let Some(value) = read_env("BREWBOT_PINECONE_CONTROLLER_URL") {
            self.pinecone.controller_url = value;
        }
        if let Some(value) = read_env("BREWBOT_PINECONE_TOP_K") {
            self.pinecone.top_k = parse_usize("BREWBOT_PINECONE_TOP_K", &value)?;
        }
        if let Some(value) = read_env("BREWBOT_PINECONE_TIMEOUT_SECS") {
            self.pinecone.timeout_secs = parse_u64("BREWBOT_PINECONE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BREWBOT_OBSERVABILITY_ENABLED") {
            self.observability.enabled = parse_bool("BREWBOT_OBSERVABILITY_ENABLED", &value)?;
        }
        if let Some(value) = read_env("BREWBOT_OBSERVABILITY_ENDPOINT") {
            self.observability.endpoint = Some(value);
        }
        if let Some(value) = read_env("BREWBOT_OBSERVABILITY_API_KEY") {
            self.observability.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("BREWBOT_OBSERVABILITY_AGENT_NAME") {
            self.observability.agent_name = value;
        }

        if let Some(value) = read_env("BREWBOT_PROMPT_VERSION") {
            self.prompt.version = value;
        }
        if let Some(value) = read_env("BREWBOT_PROMPT_INSTRUCTIONS_PATH") {
            self.prompt.instructions_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("BREWBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BREWBOT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("BREWBOT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("BREWBOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("BREWBOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("BREWBOT_LOGGING_LEVEL").or_else(|| read_env("BREWBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BREWBOT_LOGGING_FORMAT").or_else(|| read_env("BREWBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(telegram_bot_token) = overrides.telegram_bot_token {
            self.telegram.bot_token = secret_value(telegram_bot_token);
        }
        if let Some(openai_api_key) = overrides.openai_api_key {
            self.openai.api_key = secret_value(openai_api_key);
        }
        if let Some(openai_base_url) = overrides.openai_base_url {
            self.openai.base_url = openai_base_url;
        }
        if let Some(pinecone_api_key) = overrides.pinecone_api_key {
            self.pinecone.api_key = Some(secret_value(pinecone_api_key));
        }
        if let Some(pinecone_index_name) = overrides.pinecone_index_name {
            self.pinecone.index_name = pinecone_index_name;
        }
        if let Some(observability_enabled) = overrides.observability_enabled {
            self.observability.enabled = observability_enabled;
        }
        if let Some(prompt_version) = overrides.prompt_version {
            self.prompt.version = prompt_version;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_telegram(&self.telegram)?;
        validate_openai(&self.openai)?;
        validate_pinecone(&self.pinecone)?;
        validate_observability(&self.observability)?;
        validate_prompt(&self.prompt)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("brewbot.toml"), PathBuf::from("config/brewbot.toml")]
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

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required. Create a bot with @BotFather and copy its token"
                .to_string(),
        ));
    }

    let well_formed = bot_token
        .split_once(':')
        .map(|(bot_id, secret)| {
            !bot_id.is_empty() && bot_id.bytes().all(|b| b.is_ascii_digit()) && !secret.is_empty()
        })
        .unwrap_or(false);
    if !well_formed {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<numeric id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    if telegram.poll_timeout_secs == 0 || telegram.poll_timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "telegram.poll_timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_openai(openai: &OpenAiConfig) -> Result<(), ConfigError> {
    if openai.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("openai.api_key is required".to_string()));
    }

    if !openai.base_url.starts_with("http://") && !openai.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "openai.base_url must start with http:// or https://".to_string(),
        ));
    }

    if openai.chat_model.trim().is_empty() || openai.embedding_model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "openai.chat_model and openai.embedding_model must be non-empty".to_string(),
        ));
    }

    if openai.embedding_dimensions == 0 {
        return Err(ConfigError::Validation(
            "openai.embedding_dimensions must be greater than zero".to_string(),
        ));
    }

    if openai.timeout_secs == 0 || openai.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "openai.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if openai.max_tokens == 0 || openai.max_tokens > 4096 {
        return Err(ConfigError::Validation(
            "openai.max_tokens must be in range 1..=4096".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&openai.temperature) {
        return Err(ConfigError::Validation(
            "openai.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_pinecone(pinecone: &PineconeConfig) -> Result<(), ConfigError> {
    // api_key stays optional: without it the bot serves the demo catalog.
    if pinecone.index_name.trim().is_empty() {
        return Err(ConfigError::Validation("pinecone.index_name must be non-empty".to_string()));
    }

    if !pinecone.controller_url.starts_with("http://")
        && !pinecone.controller_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "pinecone.controller_url must start with http:// or https://".to_string(),
        ));
    }

    if pinecone.top_k == 0 || pinecone.top_k > 100 {
        return Err(ConfigError::Validation("pinecone.top_k must be in range 1..=100".to_string()));
    }

    if pinecone.timeout_secs == 0 || pinecone.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "pinecone.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_observability(observability: &ObservabilityConfig) -> Result<(), ConfigError> {
    if !observability.enabled {
        return Ok(());
    }

    let endpoint_ok = observability
        .endpoint
        .as_ref()
        .map(|endpoint| endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        .unwrap_or(false);
    if !endpoint_ok {
        return Err(ConfigError::Validation(
            "observability.endpoint is required (http:// or https://) when observability.enabled is true"
                .to_string(),
        ));
    }

    let key_missing = observability
        .api_key
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if key_missing {
        return Err(ConfigError::Validation(
            "observability.api_key is required when observability.enabled is true".to_string(),
        ));
    }

    if observability.agent_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "observability.agent_name must be non-empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_prompt(prompt: &PromptConfig) -> Result<(), ConfigError> {
    if prompt.version.trim().is_empty() {
        return Err(ConfigError::Validation("prompt.version must be non-empty".to_string()));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
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
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    telegram: Option<TelegramPatch>,
    openai: Option<OpenAiPatch>,
    pinecone: Option<PineconePatch>,
    observability: Option<ObservabilityPatch>,
    prompt: Option<PromptPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    poll_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    chat_model: Option<String>,
    embedding_model: Option<String>,
    embedding_dimensions: Option<usize>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct PineconePatch {
    api_key: Option<String>,
    index_name: Option<String>,
    controller_url: Option<String>,
    top_k: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ObservabilityPatch {
    enabled: Option<bool>,
    endpoint: Option<String>,
    api_key: Option<String>,
    agent_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PromptPatch {
    version: Option<String>,
    instructions_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
