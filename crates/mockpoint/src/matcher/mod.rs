//! Request matching against the mock repository.
//!
//! - `decision`: `Matcher`, the per-request first-match lookup
//! - `interceptor`: `Interceptor`, turning a decision into "mock" or "forward"

mod decision;
mod interceptor;

pub use decision::{Matcher, MockDecision};
pub use interceptor::{EmptyResponsePolicy, Interception, Interceptor};
