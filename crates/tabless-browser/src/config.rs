use std::path::PathBuf;

use tabless_engine::input::Key;
use url::Url;

/// Behaviour switches of the [`EventBridge`](crate::EventBridge).
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Wrap every animation-frame tick in a GPU validation error scope and
    /// terminate on the first captured error.
    pub validation_scopes: bool,

    /// Keys that quit cleanly (exit code 0).
    pub quit_keys: Vec<Key>,

    /// Keys that force an exit with code 1.
    pub force_exit_keys: Vec<Key>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            validation_scopes: true,
            quit_keys: vec![Key::Escape],
            force_exit_keys: vec![Key::Character('q')],
        }
    }
}

impl BridgeOptions {
    /// Defaults, with `TABLESS_VALIDATION=0` turning error scopes off.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(flag) = env_flag("TABLESS_VALIDATION") {
            options.validation_scopes = flag;
        }
        options
    }
}

/// Where the resource loader looks for and stores assets.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Relative paths are tried here before going to the network.
    pub asset_dir: PathBuf,

    /// Root of the on-disk download cache.
    pub cache_dir: PathBuf,

    /// Remote root relative paths resolve against when not found locally.
    pub base_url: Option<Url>,

    /// `(prefix, replacement)` pairs applied to request URLs before resolution.
    /// The first matching prefix wins.
    pub prefix_rewrites: Vec<(String, String)>,

    /// Always hit the network, refreshing the cache file.
    pub bypass_cache: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("."),
            cache_dir: PathBuf::from(".cache/tabless"),
            base_url: None,
            prefix_rewrites: Vec::new(),
            bypass_cache: false,
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by `TABLESS_ASSET_DIR`, `TABLESS_CACHE_DIR`,
    /// `TABLESS_BASE_URL` and `TABLESS_NO_CACHE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("TABLESS_ASSET_DIR") {
            config.asset_dir = dir.into();
        }
        if let Ok(dir) = std::env::var("TABLESS_CACHE_DIR") {
            config.cache_dir = dir.into();
        }
        if let Ok(base) = std::env::var("TABLESS_BASE_URL") {
            match Url::parse(&base) {
                Ok(url) => config.base_url = Some(url),
                Err(e) => log::warn!("ignoring TABLESS_BASE_URL={base:?}: {e}"),
            }
        }
        if let Some(flag) = env_flag("TABLESS_NO_CACHE") {
            config.bypass_cache = flag;
        }

        config
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.prefix_rewrites.push((prefix.into(), replacement.into()));
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    parse_flag(&value)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
