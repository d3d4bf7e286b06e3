use contracts::enums::ActiveFilter;
use serde::Deserialize;

/// Bump when a config field changes meaning; a file written for an
/// older schema is ignored rather than half-applied.
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub schema_version: u32,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    /// GET endpoint returning the active order feed
    pub orders_url: String,
    /// POST endpoint accepting status updates
    pub update_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// How long to wait after a committed status update before the
    /// reconciling re-fetch
    #[serde(default = "default_refresh_after_update_ms")]
    pub refresh_after_update_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            refresh_after_update_ms: default_refresh_after_update_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Which statuses the deployment considers no longer active
    #[serde(default = "default_active_filter")]
    pub active_filter: ActiveFilter,
    /// Value sent as `updated_by` on status updates
    #[serde(default = "default_actor")]
    pub actor: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            active_filter: default_active_filter(),
            actor: default_actor(),
        }
    }
}

fn default_interval_seconds() -> u64 {
    30
}
fn default_max_retry_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_refresh_after_update_ms() -> u64 {
    1000
}
fn default_active_filter() -> ActiveFilter {
    ActiveFilter::Terminal
}
fn default_actor() -> String {
    "dashboard".to_string()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
schema_version = 2

[webhook]
orders_url = "https://cafe-feed.example.com/webhook/get-orders"
update_url = "https://cafe-feed.example.com/webhook/update-order"

[polling]
interval_seconds = 30
max_retry_attempts = 3
retry_delay_ms = 2000
refresh_after_update_ms = 1000

[feed]
active_filter = "terminal"
actor = "dashboard"
"#;

/// Parse a config document, falling back to the embedded default when
/// the file was written for a different schema version.
fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.schema_version != SCHEMA_VERSION {
        tracing::warn!(
            found = config.schema_version,
            expected = SCHEMA_VERSION,
            "config schema version mismatch, using embedded defaults"
        );
        return Ok(toml::from_str(DEFAULT_CONFIG)?);
    }
    Ok(config)
}

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}
