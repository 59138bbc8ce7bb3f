//! The request tuple the interception layer hands to the matcher.

use super::protocol::Protocol;
use super::rule::strip_query;
use crate::error::{MockError, Result};
use url::Url;

/// Protocol, host, port and path+query of an intercepted request.
///
/// The caller supplies the host in its ASCII form; no IDNA or case
/// normalization happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    protocol: Protocol,
    host: String,
    port: Option<u16>,
    path_and_query: String,
}

impl RequestTarget {
    pub fn new(
        protocol: Protocol,
        host: impl Into<String>,
        port: Option<u16>,
        path_and_query: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
            path_and_query: path_and_query.into(),
        }
    }

    /// Describe a request by its absolute URL.
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| MockError::InvalidRule(format!("Cannot parse URL {raw:?}: {e}")))?;
        let protocol = Protocol::from_scheme(url.scheme()).map_err(MockError::InvalidRule)?;
        let host = url
            .host_str()
            .ok_or_else(|| MockError::InvalidRule(format!("URL has no host: {url}")))?;
        let path_and_query = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        Ok(Self::new(protocol, host, url.port(), path_and_query))
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Explicit port, or the protocol default when the request omitted one
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Path with the query removed
    pub fn path(&self) -> &str {
        strip_query(&self.path_and_query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_splits_components() {
        let target = RequestTarget::from_url("https://shop.example.com:8443/cart?item=7").unwrap();
        assert_eq!(target.protocol(), Protocol::Https);
        assert_eq!(target.host(), "shop.example.com");
        assert_eq!(target.port(), Some(8443));
        assert_eq!(target.path_and_query(), "/cart?item=7");
        assert_eq!(target.path(), "/cart");
    }

    #[test]
    fn test_effective_port_defaults_by_protocol() {
        let target = RequestTarget::new(Protocol::Https, "example.com", None, "/");
        assert_eq!(target.effective_port(), 443);
        let target = RequestTarget::new(Protocol::Http, "example.com", None, "/");
        assert_eq!(target.effective_port(), 80);
    }
}
