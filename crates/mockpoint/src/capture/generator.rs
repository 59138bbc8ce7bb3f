//! Mock entry generation from captured requests/responses.

use super::types::{CapturedExchange, RuleStrategy};
use crate::error::{MockError, Result};
use crate::repository::MockEntry;
use crate::rule::MockRule;
use tracing::{debug, warn};

/// Build a rule from a captured URL
pub fn rule_for(url: &str, strategy: RuleStrategy) -> Result<MockRule> {
    match strategy {
        RuleStrategy::FullUrl => MockRule::from_full_url(url),
        RuleStrategy::WithoutQuery => MockRule::from_url_without_query(url),
    }
}

/// Build an enabled entry serving the captured response
pub fn entry_from_capture(exchange: &CapturedExchange, strategy: RuleStrategy) -> Result<MockEntry> {
    let url = exchange
        .url
        .as_deref()
        .ok_or_else(|| MockError::InvalidRule("captured exchange has no request".to_string()))?;
    let rule = rule_for(url, strategy)?;
    debug!("Mock generated for {}", rule);
    Ok(MockEntry::new(rule, exchange.response.clone()))
}

/// One entry per selected exchange, in order. Exchanges whose URL cannot be
/// turned into a rule are logged and skipped.
pub fn mock_exchanges<'a>(
    exchanges: impl IntoIterator<Item = &'a CapturedExchange>,
    strategy: RuleStrategy,
) -> Vec<MockEntry> {
    exchanges
        .into_iter()
        .filter_map(|exchange| match entry_from_capture(exchange, strategy) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cannot mock captured exchange: {}", e);
                None
            }
        })
        .collect()
}

/// One entry per complete exchange under `prefix`.
///
/// Exchanges missing their request or response are skipped, as are URLs
/// that do not start with `prefix`.
pub fn mock_branch<'a>(
    prefix: &str,
    exchanges: impl IntoIterator<Item = &'a CapturedExchange>,
    strategy: RuleStrategy,
) -> Vec<MockEntry> {
    let in_branch = exchanges.into_iter().filter(|exchange| {
        exchange.is_complete()
            && exchange
                .url
                .as_deref()
                .is_some_and(|url| url.starts_with(prefix))
    });
    mock_exchanges(in_branch, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Protocol, RequestTarget};
    use bytes::Bytes;

    fn site_map() -> Vec<CapturedExchange> {
        vec![
            CapturedExchange::new("https://shop.example.com/api/items?page=1", &b"items-1"[..]),
            CapturedExchange::new("https://shop.example.com/api/items/7", &b"item-7"[..]),
            CapturedExchange {
                url: Some("https://shop.example.com/api/pending".to_string()),
                response: None,
            },
            CapturedExchange {
                url: None,
                response: Some(Bytes::from_static(b"orphan")),
            },
            CapturedExchange::new("https://shop.example.com/static/app.js", &b"js"[..]),
        ]
    }

    #[test]
    fn test_full_url_strategy_keeps_query() {
        let exchange = &site_map()[0];
        let entry = entry_from_capture(exchange, RuleStrategy::FullUrl).unwrap();
        assert!(entry.is_enabled());
        assert_eq!(entry.rule().path(), "/api/items?page=1");
        assert_eq!(entry.response().unwrap().as_ref(), b"items-1");
    }

    #[test]
    fn test_without_query_strategy_matches_other_pages() {
        let exchange = &site_map()[0];
        let entry = entry_from_capture(exchange, RuleStrategy::WithoutQuery).unwrap();
        assert_eq!(entry.rule().path(), "/api/items");
        let request = RequestTarget::new(Protocol::Https, "shop.example.com", None, "/api/items?page=9");
        assert!(entry.rule().matches(&request));
    }

    #[test]
    fn test_missing_request_is_invalid() {
        let exchange = &site_map()[3];
        assert!(matches!(
            entry_from_capture(exchange, RuleStrategy::FullUrl),
            Err(MockError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_branch_takes_complete_exchanges_under_prefix() {
        let entries = mock_branch(
            "https://shop.example.com/api/",
            &site_map(),
            RuleStrategy::WithoutQuery,
        );
        let paths: Vec<&str> = entries.iter().map(|e| e.rule().path()).collect();
        assert_eq!(paths, vec!["/api/items", "/api/items/7"]);
        assert!(entries.iter().all(|e| e.is_enabled() && e.has_response()));
    }

    #[test]
    fn test_mock_exchanges_skips_unusable() {
        let mut exchanges = site_map();
        exchanges.push(CapturedExchange::new("not a url", &b"x"[..]));
        let entries = mock_exchanges(&exchanges, RuleStrategy::FullUrl);
        // pending (no response) is still mocked; orphan and bad URL are skipped
        assert_eq!(entries.len(), 4);
        assert!(entries[2].response().is_none());
    }
}
