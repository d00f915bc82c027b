//! Size-normalizing image proxy rewrite.
//!
//! Remote photos are requested through `images.weserv.nl` so every image in
//! the book arrives at a predictable width and JPEG quality. The rewrite is
//! idempotent: inline `data:`/`blob:` references, non-web schemes, private
//! hosts and URLs that already point at the proxy come back unchanged.

use crate::config::ImageQuality;
use reqwest::Url;

pub const PROXY_HOST: &str = "images.weserv.nl";
const PROXY_BASE: &str = "https://images.weserv.nl/";
pub const DEFAULT_SITE_ORIGIN: &str = "https://metravel.by";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProxy {
    width: u32,
    quality: u8,
    origin: String,
}

impl Default for ImageProxy {
    fn default() -> Self {
        Self::new(ImageQuality::default())
    }
}

impl ImageProxy {
    pub fn new(tier: ImageQuality) -> Self {
        let (width, quality) = tier.proxy_params();
        Self {
            width,
            quality,
            origin: DEFAULT_SITE_ORIGIN.to_string(),
        }
    }

    /// Origin used to resolve site-relative paths such as `/uploads/a.jpg`.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    /// Rewrite `raw` for embedding. `None` for blank input.
    pub fn rewrite(&self, raw: &str) -> Option<String> {
        let url = raw.trim();
        if url.is_empty() {
            return None;
        }
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("data:") || lower.starts_with("blob:") {
            return Some(url.to_string());
        }

        let absolute = self.absolutize(url);
        let Ok(parsed) = Url::parse(&absolute) else {
            return Some(absolute);
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return Some(absolute);
        }
        match parsed.host_str() {
            Some(host) if is_proxy_host(host) || is_private_host(host) => {
                return Some(absolute);
            }
            None => return Some(absolute),
            _ => {}
        }

        let target = absolute
            .strip_prefix("https://")
            .or_else(|| absolute.strip_prefix("http://"))
            .unwrap_or(&absolute);
        let mut proxied = Url::parse(PROXY_BASE).ok()?;
        proxied
            .query_pairs_mut()
            .append_pair("url", target)
            .append_pair("w", &self.width.to_string())
            .append_pair("q", &self.quality.to_string())
            .append_key_only("il")
            .append_pair("fit", "inside");
        Some(proxied.into())
    }

    fn absolutize(&self, url: &str) -> String {
        if let Some(rest) = url.strip_prefix("//") {
            format!("https://{rest}")
        } else if url.starts_with('/') {
            format!("{}{url}", self.origin)
        } else if has_scheme(url) {
            url.to_string()
        } else {
            format!("{}/{url}", self.origin)
        }
    }
}

fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && url[scheme.len()..].starts_with(":/")
}

fn is_proxy_host(host: &str) -> bool {
    host == PROXY_HOST || host.ends_with(".weserv.nl")
}

/// Hosts the public proxy cannot reach.
fn is_private_host(host: &str) -> bool {
    if host == "localhost" || host.ends_with(".local") {
        return true;
    }
    match host.parse::<std::net::Ipv4Addr>() {
        Ok(ip) => ip.is_loopback() || ip.is_private() || ip.is_link_local(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy() -> ImageProxy {
        ImageProxy::new(ImageQuality::High)
    }

    #[test]
    fn remote_url_is_proxied() {
        let out = proxy().rewrite("https://cdn.test/photos/a b.jpg").unwrap();
        assert!(out.starts_with("https://images.weserv.nl/?url=cdn.test%2Fphotos%2Fa"));
        assert!(out.contains("&w=2400&q=90&il&fit=inside"));
    }

    #[test]
    fn quality_tier_changes_parameters() {
        let out = ImageProxy::new(ImageQuality::Low)
            .rewrite("https://cdn.test/a.jpg")
            .unwrap();
        assert!(out.contains("w=1000&q=70"));
    }

    #[test]
    fn inline_references_pass_through() {
        let p = proxy();
        assert_eq!(
            p.rewrite("data:image/png;base64,AAAA").as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(
            p.rewrite("blob:https://app.test/123").as_deref(),
            Some("blob:https://app.test/123")
        );
        assert_eq!(
            p.rewrite("file:///tmp/a.jpg").as_deref(),
            Some("file:///tmp/a.jpg")
        );
    }

    #[test]
    fn rewrite_is_idempotent() {
        let p = proxy();
        for input in [
            "https://cdn.test/a.jpg",
            "//cdn.test/b.jpg",
            "/uploads/c.jpg",
            "uploads/d.jpg",
            "data:image/gif;base64,R0lGOD",
        ] {
            let once = p.rewrite(input).unwrap();
            let twice = p.rewrite(&once).unwrap();
            assert_eq!(once, twice, "input: {input}");
        }
    }

    #[test]
    fn relative_urls_are_resolved_first() {
        let p = proxy().with_origin("https://example.test/");
        let protocol_relative = p.rewrite("//cdn.test/b.jpg").unwrap();
        assert!(protocol_relative.contains("url=cdn.test%2Fb.jpg"));
        let site_relative = p.rewrite("/uploads/c.jpg").unwrap();
        assert!(site_relative.contains("url=example.test%2Fuploads%2Fc.jpg"));
    }

    #[test]
    fn private_hosts_are_not_proxied() {
        let p = proxy();
        assert_eq!(
            p.rewrite("http://localhost:8080/a.jpg").as_deref(),
            Some("http://localhost:8080/a.jpg")
        );
        assert_eq!(
            p.rewrite("http://192.168.1.5/a.jpg").as_deref(),
            Some("http://192.168.1.5/a.jpg")
        );
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(proxy().rewrite("  "), None);
    }
}
