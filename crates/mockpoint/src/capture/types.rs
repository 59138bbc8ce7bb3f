//! Types for turning captured traffic into mock entries.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A request/response pair taken from proxy history or the site map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedExchange {
    /// Absolute request URL; `None` when the request was not captured
    pub url: Option<String>,
    /// Raw HTTP response bytes; `None` when no response was captured
    pub response: Option<Bytes>,
}

impl CapturedExchange {
    pub fn new(url: impl Into<String>, response: impl Into<Bytes>) -> Self {
        Self {
            url: Some(url.into()),
            response: Some(response.into()),
        }
    }

    /// Whether both halves of the exchange were captured
    pub fn is_complete(&self) -> bool {
        self.url.is_some() && self.response.is_some()
    }
}

/// How a captured URL becomes a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RuleStrategy {
    /// Protocol, host, port, path and query
    #[default]
    FullUrl,
    /// Protocol, host, port and path; any query matches
    WithoutQuery,
}
