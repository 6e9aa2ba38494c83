//! Core bridge functionality
//!
//! - [`firewall`]: Data model (rules, operations, responses)
//! - [`invocation`]: Operation to primitive argv mapping
//! - [`executor`]: Out-of-process primitive execution
//! - [`interpret`]: Primitive output decoding
//! - [`projection`]: Managed-rule filtering for listings
//! - [`bridge`]: Orchestration of the stages above
//! - [`error`]: Error types for bridge operations

pub mod bridge;
pub mod error;
pub mod executor;
pub mod firewall;
pub mod interpret;
pub mod invocation;
pub mod projection;

#[cfg(test)]
pub mod test_helpers;
