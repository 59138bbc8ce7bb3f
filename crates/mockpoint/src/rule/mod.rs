//! Mock rules and the request descriptor they are matched against.
//!
//! - `protocol`: HTTP/HTTPS and their default ports
//! - `rule`: `MockRule`, built from explicit fields or from a URL
//! - `target`: `RequestTarget`, the tuple the interception layer supplies

mod protocol;
#[allow(clippy::module_inception)]
mod rule;
mod target;

pub use protocol::Protocol;
pub use rule::MockRule;
pub use target::RequestTarget;
