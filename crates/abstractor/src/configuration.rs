//! Runtime configuration.
//!
//! Every field has a default, so an empty (or absent) file is a valid configuration:
//!
//! ```toml
//! model = "gemini-1.5-flash"
//! api_base = "https://generativelanguage.googleapis.com/"
//! api_key_env = "AISTUDIO_GOOGLE_API_KEY"
//! wait_between_calls_secs = 120
//! retry_delay_secs = 120
//! max_retries = 3
//! log_dir = "logs"
//! arxiv_base = "http://export.arxiv.org/api/query"
//! ```

use super::*;
use crate::{
  llm::{GeminiClient, DEFAULT_API_BASE, DEFAULT_MODEL},
  pacing::{Pacer, WAIT_BETWEEN_CALLS},
  retriever::{ArxivClient, ARXIV_API},
  retry::{RetryPolicy, MAX_RETRIES, RETRY_DELAY},
};

/// Environment variable read for the generative API key unless configured otherwise.
pub const DEFAULT_API_KEY_ENV: &str = "AISTUDIO_GOOGLE_API_KEY";

/// Name of the configuration file inside the user configuration directory.
const CONFIG_FILE: &str = "config.toml";

/// Settings for a summarization or search run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Generative model name
  pub model:                   String,
  /// Base URL of the generative API
  pub api_base:                String,
  /// Environment variable holding the API key
  pub api_key_env:             String,
  /// Minimum seconds between two generative calls
  pub wait_between_calls_secs: u64,
  /// Base of the linear retry backoff, in seconds
  pub retry_delay_secs:        u64,
  /// Attempts per record
  pub max_retries:             u32,
  /// Directory that receives one log file per run
  pub log_dir:                 PathBuf,
  /// arXiv query endpoint
  pub arxiv_base:              String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      model:                   DEFAULT_MODEL.to_string(),
      api_base:                DEFAULT_API_BASE.to_string(),
      api_key_env:             DEFAULT_API_KEY_ENV.to_string(),
      wait_between_calls_secs: WAIT_BETWEEN_CALLS.as_secs(),
      retry_delay_secs:        RETRY_DELAY.as_secs(),
      max_retries:             MAX_RETRIES,
      log_dir:                 PathBuf::from("logs"),
      arxiv_base:              ARXIV_API.to_string(),
    }
  }
}

impl Config {
  /// Reads a configuration file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
      AbstractorError::Config(format!("Failed to read configuration {}: {e}", path.display()))
    })?;
    let config = toml::from_str(&content)?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
  }

  /// Reads `path` if given, else the user configuration file if it exists, else the defaults.
  pub fn resolve(path: Option<&Path>) -> Result<Self> {
    if let Some(path) = path {
      return Self::load(path);
    }
    match Self::default_path() {
      Some(path) if path.exists() => Self::load(path),
      _ => {
        trace!("No configuration file found, using defaults");
        Ok(Self::default())
      },
    }
  }

  /// `<config dir>/abstractor/config.toml`, when the platform has a configuration directory.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("abstractor").join(CONFIG_FILE))
  }

  /// Reads the API key from [`Config::api_key_env`].
  pub fn api_key(&self) -> Result<String> {
    match std::env::var(&self.api_key_env) {
      Ok(key) if !key.trim().is_empty() => Ok(key),
      _ => Err(AbstractorError::MissingApiKey(self.api_key_env.clone())),
    }
  }

  /// Minimum gap between generative calls.
  pub fn wait_between_calls(&self) -> Duration { Duration::from_secs(self.wait_between_calls_secs) }

  /// Base of the retry backoff.
  pub fn retry_delay(&self) -> Duration { Duration::from_secs(self.retry_delay_secs) }

  /// Pacer with the configured interval.
  pub fn pacer(&self) -> Pacer { Pacer::new(self.wait_between_calls()) }

  /// Retry policy with the configured budget and backoff.
  pub fn retry_policy(&self) -> RetryPolicy { RetryPolicy::new(self.max_retries, self.retry_delay()) }

  /// Gemini client for the configured host and model, keyed from the environment.
  pub fn gemini_client(&self) -> Result<GeminiClient> {
    Ok(GeminiClient::new(self.api_key()?).with_host(&self.api_base).with_model(&self.model))
  }

  /// arXiv client for the configured endpoint.
  pub fn arxiv_client(&self) -> Result<ArxivClient> { ArxivClient::new().with_base(&self.arxiv_base) }
}
