//! Content identification
//!
//! Resolves the identifier peers use to tell whether they watch the same
//! content. The codec only ever sees the resulting string.

use url::Url;

/// Shown when a page has no shareable canonical URL
pub const UNSUPPORTED_FALLBACK: &str = "(Unsupported Prime Video URL. Playback still syncs; share the URL manually from the share button.)";

/// Marker found in Prime Video title ids that can be linked to
const PRIME_TITLE_MARKER: &str = "dv.gti";

/// Resolves the content identifier of the current page
pub trait ContentResolver: Send + Sync {
    /// Canonical shareable URL, or a human-readable fallback
    fn resolve(&self) -> String;
}

/// Resolver returning a fixed identifier
#[derive(Debug, Clone)]
pub struct StaticResolver(pub String);

impl ContentResolver for StaticResolver {
    fn resolve(&self) -> String {
        self.0.clone()
    }
}

/// Resolver working from the page location
///
/// Prime Video pages do not carry a shareable URL, so their title id is
/// turned into a detail-page link instead.
#[derive(Debug, Clone)]
pub struct PageResolver {
    /// Full page URL
    pub href: String,
    /// Host part of the page URL
    pub host: String,
    /// Title id read from the player, if any
    pub title_id: Option<String>,
}

impl PageResolver {
    pub fn new(href: &str) -> Self {
        Self {
            href: href.to_string(),
            host: host_of(href),
            title_id: None,
        }
    }

    pub fn with_title_id(mut self, title_id: &str) -> Self {
        self.title_id = Some(title_id.to_string());
        self
    }
}

impl ContentResolver for PageResolver {
    fn resolve(&self) -> String {
        if !self.host.contains("amazon") {
            return self.href.clone();
        }

        match self.title_id.as_deref() {
            Some(id) if id.contains(PRIME_TITLE_MARKER) => format!(
                "https://{}/gp/video/detail?gti={}&autoplay=1",
                self.host, id
            ),
            _ => UNSUPPORTED_FALLBACK.to_string(),
        }
    }
}

/// Host and port of a URL, like a browser's `location.host`
///
/// Input that does not parse as a URL is returned unchanged.
fn host_of(href: &str) -> String {
    let Ok(parsed) = Url::parse(href) else {
        return href.to_string();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => href.to_string(),
    }
}
