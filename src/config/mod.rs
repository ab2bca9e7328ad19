use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const ENV_PREFIX: &str = "PROJECT_TRACKER_";
const DEFAULT_API_URL: &str = "https://project-management-wobh.onrender.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid API url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Command line flags. Anything given here wins over the environment.
#[derive(Debug, Default, Parser)]
#[command(name = "project-tracker", version, about = "Track automation projects against the project API")]
pub struct Cli {
    /// Base URL of the project API
    #[arg(long)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Rows per table page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// File that receives the application log
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Values read from `PROJECT_TRACKER_*` environment variables.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    #[serde(default = "default_api_url")]
    api_url: String,
    #[serde(default = "default_timeout")]
    request_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    page_size: usize,
    #[serde(default = "default_fetch_limit")]
    fetch_limit: u32,
    #[serde(default = "default_log_file")]
    log_file: PathBuf,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    10
}

// Large enough that the whole collection arrives in one page.
fn default_fetch_limit() -> u32 {
    1_000_000
}

fn default_log_file() -> PathBuf {
    PathBuf::from("project-tracker.log")
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every request is resolved against
    pub api_url: Url,
    pub request_timeout: Duration,
    /// Rows shown per page of the projects table
    pub page_size: usize,
    /// `itemsPage` sent when listing; the table paginates locally
    pub fetch_limit: u32,
    pub log_file: PathBuf,
}

impl Config {
    /// Load configuration from the environment, then apply CLI overrides
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize prefixed environment variables
    /// 3. Let any flag passed on the command line take precedence
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        dotenv().ok();

        let env = envy::prefixed(ENV_PREFIX).from_env::<EnvConfig>()?;
        Self::from_parts(env, cli)
    }

    fn from_parts(env: EnvConfig, cli: &Cli) -> Result<Self, ConfigError> {
        let raw_url = cli.api_url.clone().unwrap_or(env.api_url);
        let api_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            url: raw_url.clone(),
            source,
        })?;

        let timeout = cli.timeout.unwrap_or(env.request_timeout_secs);
        if timeout == 0 {
            return Err(ConfigError::Zero("request timeout"));
        }

        let page_size = cli.page_size.unwrap_or(env.page_size);
        if page_size == 0 {
            return Err(ConfigError::Zero("page size"));
        }

        if env.fetch_limit == 0 {
            return Err(ConfigError::Zero("fetch limit"));
        }

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout),
            page_size,
            fetch_limit: env.fetch_limit,
            log_file: cli.log_file.clone().unwrap_or(env.log_file),
        })
    }
}

/// Parse the command line and load configuration
pub fn init() -> anyhow::Result<Config> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    Ok(config)
}
