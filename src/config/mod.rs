//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::IpAddr, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "chiaro";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOCS_PATH: &str = "apiary.apib";

/// Command-line arguments for the chiaro binary.
#[derive(Debug, Parser)]
#[command(name = "chiaro", version, about = "chiaro documentation server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CHIARO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the chiaro HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the GitHub API base URL.
    #[arg(long = "github-api-base-url", value_name = "URL")]
    pub github_api_base_url: Option<String>,

    /// Override the GitHub API token.
    #[arg(long = "github-token", env = "CHIARO_GITHUB_TOKEN", value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// Override the default repository owner suggested on the index page.
    #[arg(long = "docs-default-owner", value_name = "OWNER")]
    pub docs_default_owner: Option<String>,

    /// Override the default blueprint path inside repositories.
    #[arg(long = "docs-default-path", value_name = "PATH")]
    pub docs_default_path: Option<String>,

    /// Toggle the render cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub github: GithubSettings,
    pub docs: DocsSettings,
    pub auth: AuthSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub api_base_url: Url,
    pub token: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DocsSettings {
    pub default_owner: Option<String>,
    pub default_path: String,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub viewer_tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Parse the CLI and load settings with the configured precedence.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("CHIARO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    github: RawGithubSettings,
    docs: RawDocsSettings,
    auth: RawAuthSettings,
    cache: RawCacheSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGithubSettings {
    api_base_url: Option<String>,
    token: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDocsSettings {
    default_owner: Option<String>,
    default_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    viewer_tokens: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.github_api_base_url.as_ref() {
            self.github.api_base_url = Some(url.clone());
        }
        if let Some(token) = overrides.github_token.as_ref() {
            self.github.token = Some(token.clone());
        }
        if let Some(owner) = overrides.docs_default_owner.as_ref() {
            self.docs.default_owner = Some(owner.clone());
        }
        if let Some(path) = overrides.docs_default_path.as_ref() {
            self.docs.default_path = Some(path.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            github,
            docs,
            auth,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            github: build_github_settings(github)?,
            docs: build_docs_settings(docs)?,
            auth: build_auth_settings(auth),
            cache: build_cache_settings(cache),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let ip: IpAddr = host
        .parse()
        .map_err(|err| LoadError::invalid("server.host", format!("failed to parse: {err}")))?;

    Ok(ServerSettings {
        addr: SocketAddr::new(ip, port),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_github_settings(github: RawGithubSettings) -> Result<GithubSettings, LoadError> {
    let api_base_url = github
        .api_base_url
        .unwrap_or_else(|| DEFAULT_GITHUB_API_BASE_URL.to_string());
    let api_base_url = Url::parse(&api_base_url).map_err(|err| {
        LoadError::invalid("github.api_base_url", format!("failed to parse: {err}"))
    })?;

    let token = github.token.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let timeout_secs = github
        .request_timeout_seconds
        .unwrap_or(DEFAULT_GITHUB_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "github.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(GithubSettings {
        api_base_url,
        token,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_docs_settings(docs: RawDocsSettings) -> Result<DocsSettings, LoadError> {
    let default_owner = docs.default_owner.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let default_path = docs
        .default_path
        .unwrap_or_else(|| DEFAULT_DOCS_PATH.to_string());
    if default_path.trim().is_empty() {
        return Err(LoadError::invalid(
            "docs.default_path",
            "must not be empty",
        ));
    }

    Ok(DocsSettings {
        default_owner,
        default_path,
    })
}

fn build_auth_settings(auth: RawAuthSettings) -> AuthSettings {
    AuthSettings {
        viewer_tokens: auth.viewer_tokens.unwrap_or_default(),
    }
}

fn build_cache_settings(cache: RawCacheSettings) -> CacheSettings {
    CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
    }
}
