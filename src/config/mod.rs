//! Client configuration.

mod loader;

use serde::Deserialize;

pub use loader::{get_default_config, load_configuration, write_config_to};

pub const DEFAULT_BASE_URL: &str = "https://ob.nordigen.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub secret_id: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Send requests and responses to the `audit` log target.
    #[serde(default = "default_audit")]
    pub audit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            secret_id: None,
            secret_key: None,
            audit: default_audit(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_audit() -> bool {
    true
}
