//! Mock rules: the protocol/host/port/path matcher attached to every entry.

use super::protocol::Protocol;
use super::target::RequestTarget;
use crate::error::{MockError, Result};
use std::fmt;
use tracing::warn;
use url::Url;

/// Immutable matcher over protocol, host, port and path.
///
/// A rule built from a full URL compares the request path and query
/// verbatim. A rule built without the query compares only the part before
/// the first `?` on both sides. Matching is exact string comparison; there
/// are no wildcards or prefixes.
#[derive(Debug, Clone)]
pub struct MockRule {
    protocol: Protocol,
    host: String,
    port: Option<u16>,
    path: String,
    path_includes_query: bool,
}

impl MockRule {
    /// Build a rule from already-validated parts. The path is compared verbatim.
    /// A port of `Some(0)` is treated as unset.
    pub fn new(
        protocol: Protocol,
        host: impl Into<String>,
        port: Option<u16>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            host: host.into(),
            port: port.filter(|p| *p != 0),
            path: path.into(),
            path_includes_query: true,
        }
    }

    /// Build a rule from operator-entered text, degrading a bad port to "unset".
    pub fn from_fields(protocol: Protocol, host: &str, port: &str, path: &str) -> Self {
        let port = match parse_port(port) {
            Ok(port) => port,
            Err(e) => {
                warn!("{}; using the {} default port", e, protocol);
                None
            }
        };
        Self::new(protocol, host.trim(), port, path)
    }

    /// Strict variant of [`MockRule::from_fields`]: a bad port is an error.
    pub fn try_from_fields(protocol: Protocol, host: &str, port: &str, path: &str) -> Result<Self> {
        let port = parse_port(port)?;
        Ok(Self::new(protocol, host.trim(), port, path))
    }

    /// Rule matching the URL's path and query exactly.
    pub fn from_full_url(raw: &str) -> Result<Self> {
        let url = parse_url(raw)?;
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        Self::from_parsed(&url, path, true)
    }

    /// Rule matching the URL's path, whatever query the request carries.
    pub fn from_url_without_query(raw: &str) -> Result<Self> {
        let url = parse_url(raw)?;
        let path = url.path().to_string();
        Self::from_parsed(&url, path, false)
    }

    fn from_parsed(url: &Url, path: String, path_includes_query: bool) -> Result<Self> {
        let protocol = Protocol::from_scheme(url.scheme()).map_err(MockError::InvalidRule)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MockError::InvalidRule(format!("URL has no host: {url}")))?;
        Ok(Self {
            protocol,
            host: host.to_string(),
            port: url.port(),
            path,
            path_includes_query,
        })
    }

    /// Same rule, comparing paths with the query stripped.
    pub fn ignoring_query(mut self) -> Self {
        self.path = strip_query(&self.path).to_string();
        self.path_includes_query = false;
        self
    }

    /// Rebuild a rule from its persisted fields.
    pub(crate) fn from_parts(
        protocol: Protocol,
        host: String,
        port: Option<u16>,
        path: String,
        path_includes_query: bool,
    ) -> Self {
        Self {
            protocol,
            host,
            port: port.filter(|p| *p != 0),
            path,
            path_includes_query,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, `None` when the protocol default applies
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_includes_query(&self) -> bool {
        self.path_includes_query
    }

    /// Check whether a request is answered by this rule.
    pub fn matches(&self, request: &RequestTarget) -> bool {
        if request.protocol() != self.protocol
            || !request.host().eq_ignore_ascii_case(&self.host)
            || request.effective_port() != self.effective_port()
        {
            return false;
        }

        if self.path_includes_query {
            request.path_and_query() == self.path
        } else {
            request.path() == strip_query(&self.path)
        }
    }
}

impl PartialEq for MockRule {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol
            && self.host.eq_ignore_ascii_case(&other.host)
            && self.effective_port() == other.effective_port()
            && self.path == other.path
    }
}

impl Eq for MockRule {}

impl fmt::Display for MockRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.path)?;
        if !self.path_includes_query {
            f.write_str(" (query ignored)")?;
        }
        Ok(())
    }
}

/// Path part of a path-and-query string
pub(crate) fn strip_query(path_and_query: &str) -> &str {
    match path_and_query.find('?') {
        Some(idx) => &path_and_query[..idx],
        None => path_and_query,
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).map_err(|e| MockError::InvalidRule(format!("Cannot parse URL {raw:?}: {e}")))
}

/// Parse operator-entered port text. Empty text means "use the protocol default".
fn parse_port(text: &str) -> Result<Option<u16>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<u16>() {
        Ok(0) | Err(_) => Err(MockError::InvalidRule(format!(
            "Port {text:?} is not a number in 1-65535"
        ))),
        Ok(port) => Ok(Some(port)),
    }
}
