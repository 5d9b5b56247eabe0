//! Azure DevOps service hook payloads.
//!
//! Plain data contracts for the `resource` object of pull request and push
//! events. Missing fields decode to their empty value, mirroring how Azure
//! DevOps omits unset properties.

mod time;
mod types;

pub use time::{CustomTime, ZERO_TIME_LITERAL};
pub use types::*;
