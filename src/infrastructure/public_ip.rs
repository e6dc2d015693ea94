//! Public IP lookup for binding new API keys to this machine

use async_trait::async_trait;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;

pub const IPIFY_URL: &str = "https://api.ipify.org";

#[async_trait]
pub trait PublicIpResolver: Send + Sync {
    /// `None` when the address cannot be determined
    async fn public_ip(&self) -> Option<String>;
}

pub struct IpifyResolver {
    client: Client,
    url: String,
}

impl IpifyResolver {
    pub fn new(url: &str, timeout: Duration) -> Option<Self> {
        let client = Client::builder().timeout(timeout).build().ok()?;
        Some(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl PublicIpResolver for IpifyResolver {
    async fn public_ip(&self) -> Option<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| tracing::warn!("Public IP lookup failed: {}", e))
            .ok()?;
        let text = response.text().await.ok()?;
        parse_ip(&text)
    }
}

/// Accept only a well-formed address; anything else means "unknown"
pub fn parse_ip(text: &str) -> Option<String> {
    text.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// Resolver with a fixed answer
pub struct FixedIpResolver(pub Option<String>);

#[async_trait]
impl PublicIpResolver for FixedIpResolver {
    async fn public_ip(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip() {
        assert_eq!(parse_ip("203.0.113.7\n"), Some("203.0.113.7".to_string()));
        assert_eq!(parse_ip("2001:db8::1"), Some("2001:db8::1".to_string()));
        assert_eq!(parse_ip("<html>error</html>"), None);
        assert_eq!(parse_ip(""), None);
    }

    #[tokio::test]
    async fn test_fixed_resolver() {
        let resolver = FixedIpResolver(Some("198.51.100.2".to_string()));
        assert_eq!(resolver.public_ip().await.as_deref(), Some("198.51.100.2"));
        assert_eq!(FixedIpResolver(None).public_ip().await, None);
    }
}
