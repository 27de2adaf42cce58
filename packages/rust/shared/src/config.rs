//! Application configuration for Sanstha.
//!
//! User config lives at `~/.sanstha/sanstha.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file; each section names the env var
//! that holds its key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SansthaError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sanstha.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sanstha";

// ---------------------------------------------------------------------------
// Config structs (matching sanstha.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Feed-to-JSON gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Text-generation endpoint settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Image-search settings.
    #[serde(default)]
    pub images: ImagesConfig,

    /// Default feeds and aggregation policy.
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// Persistent store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Periodic generation settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// `[gateway]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the feed-to-JSON service.
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Per-request timeout shared by every HTTP client.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_gateway_url() -> String {
    "https://api.rss2json.com/v1/api.json".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Hosted text-generation model endpoint.
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_generation_endpoint(),
            api_key_env: default_generation_key_env(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

fn default_generation_endpoint() -> String {
    "https://api-inference.huggingface.co/models/tiiuae/falcon-7b-instruct".into()
}
fn default_generation_key_env() -> String {
    "HUGGINGFACE_API_KEY".into()
}
fn default_max_new_tokens() -> u32 {
    800
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}

/// `[images]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Image-search API base URL.
    #[serde(default = "default_images_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the access key.
    #[serde(default = "default_images_key_env")]
    pub access_key_env: String,

    /// Image used whenever the search fails.
    #[serde(default = "default_generated_image")]
    pub default_image: String,

    /// Pool of keywords mixed into each search query.
    #[serde(default = "default_image_keywords")]
    pub keywords: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            endpoint: default_images_endpoint(),
            access_key_env: default_images_key_env(),
            default_image: default_generated_image(),
            keywords: default_image_keywords(),
        }
    }
}

fn default_images_endpoint() -> String {
    "https://api.unsplash.com".into()
}
fn default_images_key_env() -> String {
    "UNSPLASH_ACCESS_KEY".into()
}
fn default_generated_image() -> String {
    "https://images.unsplash.com/photo-1432888622747-4eb9a8efeb07?ixlib=rb-4.0.3&q=85&fm=jpg&crop=entropy&cs=srgb&w=1000".into()
}
fn default_image_keywords() -> Vec<String> {
    [
        "digital marketing",
        "social media",
        "business",
        "technology",
        "office",
        "success",
        "innovation",
        "startup",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// `[feeds]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Feeds returned by the registry until it is first written.
    #[serde(default = "default_feed_urls")]
    pub defaults: Vec<String>,

    /// Placeholder path for items without a usable image.
    #[serde(default = "default_fallback_image")]
    pub fallback_image: String,

    /// Maximum number of aggregated posts returned.
    #[serde(default = "default_aggregation_limit")]
    pub limit: usize,

    /// Relevance vocabulary (substring match, case-insensitive).
    #[serde(default = "default_vocabulary")]
    pub vocabulary: Vec<String>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            defaults: default_feed_urls(),
            fallback_image: default_fallback_image(),
            limit: default_aggregation_limit(),
            vocabulary: default_vocabulary(),
        }
    }
}

fn default_feed_urls() -> Vec<String> {
    [
        "https://www.socialmediaexaminer.com/feed/",
        "https://www.searchenginejournal.com/category/digital-marketing/feed/",
        "https://neilpatel.com/blog/feed/",
        "https://www.digitalmarketer.com/blog/feed/",
        "https://www.wordstream.com/feed",
        "https://www.convinceandconvert.com/feed/",
        "https://www.marketingprofs.com/rss/all",
        "https://blog.hubspot.com/marketing/rss.xml",
        "https://moz.com/blog/feed",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_fallback_image() -> String {
    "/default-blog-image.jpg".into()
}
fn default_aggregation_limit() -> usize {
    30
}
fn default_vocabulary() -> Vec<String> {
    [
        "digital marketing",
        "seo",
        "social media marketing",
        "content marketing",
        "email marketing",
        "ppc",
        "paid advertising",
        "google ads",
        "facebook ads",
        "instagram marketing",
        "marketing strategy",
        "lead generation",
        "conversion optimization",
        "analytics",
        "marketing automation",
        "branding",
        "digital advertising",
        "marketing trends",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// libSQL database file. `~` expands to the home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Maximum number of persisted posts.
    #[serde(default = "default_post_cap")]
    pub post_cap: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            post_cap: default_post_cap(),
        }
    }
}

fn default_db_path() -> String {
    "~/.sanstha/sanstha.db".into()
}
fn default_post_cap() -> usize {
    50
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_period_hours")]
    pub period_hours: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_hours: default_period_hours(),
        }
    }
}

fn default_period_hours() -> u64 {
    24
}

impl StoreConfig {
    /// Resolve `db_path`, expanding a leading `~/`.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match self.db_path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir()
                    .ok_or_else(|| SansthaError::config("could not determine home directory"))?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.db_path)),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sanstha/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SansthaError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sanstha/sanstha.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SansthaError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SansthaError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SansthaError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = render_config(&AppConfig::default())?;

    std::fs::write(&path, content).map_err(|e| SansthaError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Render a config as pretty TOML.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| SansthaError::config(e.to_string()))
}

/// Read the text-generation token from the env var named in config.
pub fn generation_api_key(config: &AppConfig) -> Result<String> {
    read_key(&config.generation.api_key_env).ok_or_else(|| {
        SansthaError::config(format!(
            "generation API key not found. Set the {} environment variable.",
            config.generation.api_key_env
        ))
    })
}

/// Read the image-search access key, if configured.
///
/// A missing key is not an error: image search then degrades to the default image.
pub fn images_access_key(config: &AppConfig) -> Option<String> {
    read_key(&config.images.access_key_env)
}

fn read_key(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}
