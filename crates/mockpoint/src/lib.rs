//! Mockpoint: ordered HTTP/HTTPS mock rules.
//!
//! Producers build [`MockRule`]s and [`MockEntry`]s and hand them to a
//! [`MockRepository`]. For every intercepted request the wire layer asks a
//! [`Matcher`] (or an [`Interceptor`], which also applies the empty-body
//! policy) whether a mock answers it; the first enabled matching entry in
//! repository order wins.
//!
//! ```no_run
//! use mockpoint::{Interception, Interceptor, Matcher, MockEntry, MockRepository, MockRule, RequestTarget};
//! use std::sync::Arc;
//!
//! let repo = Arc::new(MockRepository::new());
//! let rule = MockRule::from_url_without_query("https://api.example.com/v1/users?page=1")?;
//! repo.add(MockEntry::new(rule, Some(b"HTTP/1.1 200 OK\r\n\r\n[]".to_vec().into())));
//!
//! let interceptor = Interceptor::new(Matcher::new(repo), Default::default());
//! let request = RequestTarget::from_url("https://api.example.com/v1/users?page=2")?;
//! assert!(matches!(interceptor.intercept(&request), Interception::Mock(_)));
//! # Ok::<(), mockpoint::MockError>(())
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod matcher;
pub mod repository;
pub mod rule;

pub use error::{Lookup, MockError, Result};
pub use matcher::{EmptyResponsePolicy, Interception, Interceptor, Matcher, MockDecision};
pub use repository::{
    DroppedRecord, EntryId, LoadReport, MockEntry, MockRepository, RepositoryEvent, Snapshot,
};
pub use rule::{MockRule, Protocol, RequestTarget};
