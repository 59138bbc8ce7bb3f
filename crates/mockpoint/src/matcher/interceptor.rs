//! What the interception layer does with a matcher decision.

use super::decision::{Matcher, MockDecision};
use crate::rule::RequestTarget;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Handling of a matched entry that has no response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyResponsePolicy {
    /// Log the match and forward the request unmodified
    #[default]
    Forward,
    /// Answer with an empty response
    ServeEmpty,
}

/// Outcome for one intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Send these bytes back as the complete HTTP response
    Mock(Bytes),
    /// Send the request on to the real origin
    Forward,
}

/// Applies the empty-body policy on top of [`Matcher::decide`].
#[derive(Debug, Clone)]
pub struct Interceptor {
    matcher: Matcher,
    empty_response: EmptyResponsePolicy,
}

impl Interceptor {
    pub fn new(matcher: Matcher, empty_response: EmptyResponsePolicy) -> Self {
        Self {
            matcher,
            empty_response,
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn intercept(&self, request: &RequestTarget) -> Interception {
        match self.matcher.decide(request) {
            Some(decision) => self.resolve(&decision),
            None => Interception::Forward,
        }
    }

    fn resolve(&self, decision: &MockDecision) -> Interception {
        if let Some(response) = decision.response() {
            debug!(
                "Serving mock entry {} ({} bytes)",
                decision.entry_id(),
                response.len()
            );
            return Interception::Mock(response.clone());
        }

        match self.empty_response {
            EmptyResponsePolicy::Forward => {
                warn!(
                    "Mock entry {} matched but has no response; forwarding",
                    decision.entry_id()
                );
                Interception::Forward
            }
            EmptyResponsePolicy::ServeEmpty => {
                warn!(
                    "Mock entry {} matched but has no response; serving empty body",
                    decision.entry_id()
                );
                Interception::Mock(Bytes::new())
            }
        }
    }
}
