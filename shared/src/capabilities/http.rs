use thiserror::Error;
use url::Url;

use crux_http::Http;

use crate::event::Event;

pub type AppHttp = Http<Event>;

/// What a response callback receives. Bodies stay raw bytes and are decoded
/// by the caller.
pub type HttpResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid URL '{url}': {reason}")]
pub struct UrlError {
    pub url: String,
    pub reason: String,
}

impl UrlError {
    fn new(url: &str, reason: impl Into<String>) -> Self {
        Self {
            url: truncate(url),
            reason: reason.into(),
        }
    }
}

fn truncate(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &url[..cut])
    }
}

/// An absolute `http`/`https` URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedUrl(Url);

impl ValidatedUrl {
    pub fn new(url: &str) -> Result<Self, UrlError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(UrlError::new(url, "URL cannot be empty"));
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(UrlError::new(
                url,
                format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            ));
        }

        let parsed = Url::parse(url).map_err(|e| UrlError::new(url, e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(UrlError::new(
                    url,
                    format!("invalid scheme '{other}', only 'http' and 'https' are allowed"),
                ))
            }
        }
        if parsed.host_str().is_none() {
            return Err(UrlError::new(url, "URL must have a host"));
        }
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(UrlError::new(url, "credentials in URL are not allowed"));
        }

        Ok(Self(parsed))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Appends percent-encoded path segments. A trailing slash on the base is
    /// dropped first.
    pub fn join_segments<I, S>(&self, segments: I) -> Result<Self, UrlError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = self.0.clone();
        joined
            .path_segments_mut()
            .map_err(|()| UrlError::new(self.as_str(), "URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);

        if joined.as_str().len() > MAX_URL_LENGTH {
            return Err(UrlError::new(
                joined.as_str(),
                format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            ));
        }
        Ok(Self(joined))
    }
}

impl std::fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
