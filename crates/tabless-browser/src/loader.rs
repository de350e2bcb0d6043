//! Resource loading: `data:` URLs, local assets and cached remote fetches.

use std::cell::OnceCell;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as _;
use url::Url;

use crate::config::LoaderConfig;

const USER_AGENT: &str = concat!("tabless/", env!("CARGO_PKG_VERSION"));

/// Errors produced while fetching a resource.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0:?} is not a local asset and no base url is configured")]
    NoBaseUrl(String),

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported url {0:?}")]
    UnsupportedUrl(String),

    #[error("malformed data url: {0}")]
    DataUrl(String),
}

/// Byte source used by image loads.
///
/// Implemented by [`ResourceLoader`] and by any `Fn(&str) -> Result<Vec<u8>, LoadError>`.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<Vec<u8>, LoadError>,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        self(url)
    }
}

/// Where a request URL ends up after rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Data(String),
    Local(PathBuf),
    Remote(Url),
}

/// [`Fetch`] implementation backed by the asset directory, a disk cache and
/// a blocking HTTP client.
#[derive(Debug)]
pub struct ResourceLoader {
    config: LoaderConfig,
    client: OnceCell<reqwest::blocking::Client>,
}

impl ResourceLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Applies prefix rewrites, then classifies the URL.
    ///
    /// Relative references are looked up under the asset directory first and
    /// fall back to the base URL.
    pub fn resolve(&self, url: &str) -> Result<Resolved, LoadError> {
        let url = self.rewrite(url);

        if url.starts_with("data:") {
            return Ok(Resolved::Data(url));
        }

        if let Ok(parsed) = Url::parse(&url) {
            match parsed.scheme() {
                "http" | "https" => return Ok(Resolved::Remote(parsed)),
                "file" => {
                    let path = parsed
                        .to_file_path()
                        .map_err(|()| LoadError::UnsupportedUrl(url.clone()))?;
                    return Ok(Resolved::Local(path));
                }
                _ => {}
            }
        }

        let relative = url.trim_start_matches("./");
        let local = self.config.asset_dir.join(relative.trim_start_matches('/'));
        if local.is_file() {
            return Ok(Resolved::Local(local));
        }

        let base = self
            .config
            .base_url
            .as_ref()
            .ok_or_else(|| LoadError::NoBaseUrl(url.clone()))?;
        let remote = base.join(relative).map_err(|source| LoadError::InvalidUrl {
            url: url.clone(),
            source,
        })?;
        Ok(Resolved::Remote(remote))
    }

    /// `<cache_dir>/<host>/<path>` for a remote URL. `..` segments are
    /// dropped and a query string is folded into the file name.
    pub fn cache_path(&self, url: &Url) -> PathBuf {
        let mut path = self.config.cache_dir.join(url.host_str().unwrap_or("_"));
        if let Some(port) = url.port() {
            path.as_mut_os_string().push(format!("_{port}"));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..").collect())
            .unwrap_or_default();
        if segments.is_empty() || url.path().ends_with('/') {
            path.extend(&segments);
            path.push("index");
        } else {
            path.extend(&segments);
        }

        if let Some(query) = url.query() {
            let sanitized: String = query
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            path.as_mut_os_string().push(format!("_{sanitized}"));
        }
        path
    }

    fn rewrite(&self, url: &str) -> String {
        for (prefix, replacement) in &self.config.prefix_rewrites {
            if let Some(rest) = url.strip_prefix(prefix.as_str()) {
                log::debug!("rewriting {url} via prefix {prefix}");
                return format!("{replacement}{rest}");
            }
        }
        url.to_string()
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, LoadError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| LoadError::Http {
                url: "<client setup>".into(),
                source,
            })?;
        Ok(self.client.get_or_init(|| client))
    }

    fn fetch_remote(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
        let cached = self.cache_path(url);
        if !self.config.bypass_cache && cached.is_file() {
            log::debug!("cache hit for {url}");
            return read_file(&cached);
        }

        log::info!("fetching {url}");
        let http = |source: reqwest::Error| LoadError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client()?.get(url.clone()).send().map_err(http)?;
        if !response.status().is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().map_err(http)?.to_vec();

        if let Err(e) = write_cache(&cached, &bytes) {
            log::warn!("could not cache {url}: {e}");
        }
        Ok(bytes)
    }
}

impl Fetch for ResourceLoader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        match self.resolve(url)? {
            Resolved::Data(data) => decode_data_url(&data),
            Resolved::Local(path) => read_file(&path),
            Resolved::Remote(remote) => self.fetch_remote(&remote),
        }
    }
}

/// Decodes `data:[<mediatype>][;base64],<payload>`.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, LoadError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| LoadError::DataUrl("missing data: scheme".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::DataUrl("missing ','".into()))?;

    if meta.ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| LoadError::DataUrl(e.to_string()))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes next to `path` and renames into place, so an interrupted write
/// never leaves a truncated cache hit behind.
fn write_cache(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
