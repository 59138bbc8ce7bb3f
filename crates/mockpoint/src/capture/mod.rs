//! Turning captured traffic into mock entries.
//!
//! Supports two rule strategies:
//! - `FullUrl`: match protocol, host, port, path and query
//! - `WithoutQuery`: match protocol, host, port and path only
//!
//! plus "mock this branch", which applies a strategy to every captured
//! exchange under a URL prefix.

mod generator;
mod types;

pub use generator::{entry_from_capture, mock_branch, mock_exchanges, rule_for};
pub use types::{CapturedExchange, RuleStrategy};
