//! Reading key sources into memory

use pkgsig_config::constants::HKP_PORT;
use pkgsig_errors::{Error, NetworkError};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Reads a key source fully into memory
pub trait SourceFetcher {
    /// Fetch `source`: a path, `-` for stdin, or a URL
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or read.
    fn fetch(&self, source: &str) -> Result<Vec<u8>, Error>;
}

/// HTTP settings for [`DefaultFetcher`]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("pkgsig/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Fetches from the filesystem, stdin and `http`, `https`, `hkp` and
/// `hkps` URLs
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    client: reqwest::blocking::Client,
}

impl DefaultFetcher {
    /// Create a fetcher with its own HTTP client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!(url, "fetching key source");
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    url: url.to_string(),
                }
            } else {
                NetworkError::DownloadFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(NetworkError::HttpError {
                status: response.status().as_u16(),
                message: response.status().to_string(),
            }
            .into());
        }

        let body = response
            .bytes()
            .map_err(|e| NetworkError::DownloadFailed(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl SourceFetcher for DefaultFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, Error> {
        if source == "-" {
            let mut buf = Vec::new();
            std::io::stdin().lock().read_to_end(&mut buf)?;
            return Ok(buf);
        }
        if let Some(url) = http_url(source) {
            return self.get(&url);
        }
        let path = Path::new(source);
        std::fs::read(path).map_err(|e| Error::io_with_path(&e, path))
    }
}

/// The HTTP URL for a URL-like source, mapping keyserver schemes
///
/// `hkp://` becomes `http://` on the keyserver port unless a port is
/// given; `hkps://` becomes `https://`. Anything without a known scheme
/// yields `None`.
#[must_use]
pub fn http_url(source: &str) -> Option<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Some(source.to_string());
    }
    if let Some(rest) = source.strip_prefix("hkps://") {
        return Some(format!("https://{rest}"));
    }
    let rest = source.strip_prefix("hkp://")?;
    let (authority, path) = rest.find('/').map_or((rest, ""), |i| rest.split_at(i));
    if authority.contains(':') {
        Some(format!("http://{rest}"))
    } else {
        Some(format!("http://{authority}:{HKP_PORT}{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url_mapping() {
        assert_eq!(
            http_url("hkp://keys.example.org/pks/lookup?op=get&search=0x1234ABCD").as_deref(),
            Some("http://keys.example.org:11371/pks/lookup?op=get&search=0x1234ABCD")
        );
        assert_eq!(
            http_url("hkp://keys.example.org:8080/x").as_deref(),
            Some("http://keys.example.org:8080/x")
        );
        assert_eq!(
            http_url("hkp://keys.example.org").as_deref(),
            Some("http://keys.example.org:11371")
        );
        assert_eq!(
            http_url("hkps://keys.example.org/k").as_deref(),
            Some("https://keys.example.org/k")
        );
        assert_eq!(
            http_url("https://example.org/key.asc").as_deref(),
            Some("https://example.org/key.asc")
        );
        assert_eq!(http_url("/etc/pki/key.asc"), None);
        assert_eq!(http_url("0x1234ABCD"), None);
    }

    #[test]
    fn test_fetch_missing_file() {
        let fetcher = DefaultFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch("/nonexistent/pkgsig/key.asc").unwrap_err();
        assert!(matches!(err, Error::Io { path: Some(_), .. }));
    }
}
