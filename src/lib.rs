//! fwbridge - Firewall Control Bridge
//!
//! Exposes firewall policy (on/off state, allow/block rules on ports) as
//! structured operations instead of direct use of OS firewall tooling.
//!
//! # Architecture
//!
//! - [`core`] - Bridge pipeline: validation, invocation building, execution,
//!   interpretation and projection
//! - [`validators`] - Input sanitization for rule names and ports
//! - [`elevation`] - Privilege elevation for the primitive process
//! - [`audit`] - Audit logging for firewall mutations
//! - [`config`] - Configuration persistence
//! - [`utils`] - Utility functions (XDG directories, etc.)
//!
//! # Safety Features
//!
//! - Caller input is sanitized and validated before any process is spawned
//! - Closed enums for protocol, action and toggle state
//! - Arguments are passed as argv, never through a shell
//! - Every primitive outcome is folded into a well-formed [`BridgeResponse`]
//!
//! # Example
//!
//! ```no_run
//! use fwbridge::{Bridge, BridgeConfig};
//!
//! # async fn example() {
//! let bridge = Bridge::from_config(&BridgeConfig::default());
//! let response = bridge.toggle(Some("on")).await;
//! println!("{}", serde_json::to_string(&response).unwrap());
//! # }
//! ```

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod audit;
pub mod config;
pub mod core;
pub mod elevation;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use config::BridgeConfig;
pub use crate::core::bridge::Bridge;
pub use crate::core::error::{Error, Result};
pub use crate::core::firewall::{Action, BridgeResponse, Operation, Protocol, Rule, RuleRequest};
