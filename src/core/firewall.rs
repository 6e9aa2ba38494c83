//! Firewall data model shared by every bridge stage
//!
//! The bridge owns no durable state. Every type here is either caller input
//! on its way to the primitive ([`RuleRequest`], [`Operation`]) or a value
//! derived from one primitive invocation ([`FirewallState`], [`BridgeResponse`]).
//!
//! # Closed enums
//!
//! [`Protocol`], [`Action`] and [`ToggleState`] parse caller input with exact
//! spelling via `FromStr`. Anything else is a validation error, never a
//! coercion. Values reported back by the primitive go through the lenient
//! `from_reported` constructors instead.
//!
//! # Example
//!
//! ```
//! use fwbridge::core::firewall::{RuleRequest, Protocol, Action};
//! use fwbridge::validators::SanitizePolicy;
//!
//! let request = RuleRequest {
//!     name: Some("My;Web App".into()),
//!     port: Some("80,443".into()),
//!     protocol: Some("TCP".into()),
//!     action: Some("Block".into()),
//! };
//! let rule = request.validate(SanitizePolicy::Strip).unwrap();
//! assert_eq!(rule.name(), "MyWeb App");
//! assert_eq!(rule.protocol(), Protocol::Tcp);
//! assert_eq!(rule.action(), Action::Block);
//! ```

use crate::core::error::{Error, Result};
use crate::validators::{self, SanitizePolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message for an `AddRule` request with a missing or empty field
pub const MISSING_RULE_PARAMS: &str = "Missing required rule parameters.";

/// Message for a toggle request outside `{on, off}`
pub const INVALID_STATE: &str = "Invalid state provided.";

/// Profile name used when the primitive does not report one
pub const DEFAULT_PROFILE: &str = "All Profiles";

/// Transport protocol of a managed rule
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum Protocol {
    #[strum(serialize = "TCP")]
    #[serde(rename = "TCP")]
    Tcp,
    #[strum(serialize = "UDP")]
    #[serde(rename = "UDP")]
    Udp,
}

impl Protocol {
    /// Parses a protocol as reported by the primitive (`tcp`, `TCP`, ` Tcp `)
    pub fn from_reported(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TCP" => Some(Protocol::Tcp),
            "UDP" => Some(Protocol::Udp),
            _ => None,
        }
    }
}

/// What the firewall does with matching traffic
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum Action {
    Allow,
    Block,
}

impl Action {
    /// Parses an action as reported by the primitive (`allow`, `Block`, ...)
    pub fn from_reported(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(Action::Allow),
            "block" => Some(Action::Block),
            _ => None,
        }
    }
}

/// Requested firewall on/off state
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    #[strum(serialize = "on")]
    On,
    #[strum(serialize = "off")]
    Off,
}

impl ToggleState {
    /// Parses caller input, rejecting anything outside `{on, off}`.
    ///
    /// A missing value is rejected the same way as an unknown one.
    pub fn parse_request(value: Option<&str>) -> Result<Self> {
        value
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::validation("state", INVALID_STATE))
    }

    /// Whether the firewall is active once this state is applied
    pub const fn is_active(self) -> bool {
        matches!(self, ToggleState::On)
    }
}

/// Observed firewall state, computed fresh by every status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallState {
    pub profile: String,
    pub active: bool,
}

impl FirewallState {
    pub const fn status_label(&self) -> &'static str {
        if self.active { "Active" } else { "Inactive" }
    }
}

/// A managed firewall rule.
///
/// Only constructed by [`RuleRequest::validate`] (name and port sanitized)
/// or by projection of a primitive listing. Read-only outside the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    name: String,
    port: String,
    protocol: Protocol,
    action: Action,
}

impl Rule {
    pub(crate) fn new(
        name: impl Into<String>,
        port: impl Into<String>,
        protocol: Protocol,
        action: Action,
    ) -> Self {
        Self {
            name: name.into(),
            port: port.into(),
            protocol,
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}/{})",
            self.name, self.action, self.port, self.protocol
        )
    }
}

/// Untrusted rule input as received from a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

impl RuleRequest {
    /// Validates and sanitizes the request into a [`Rule`].
    ///
    /// Order of checks: presence of all four fields, closed-enum protocol
    /// and action, then name and port sanitization under `policy`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when any check fails. No rule is built.
    pub fn validate(&self, policy: SanitizePolicy) -> Result<Rule> {
        let (Some(name), Some(port), Some(protocol), Some(action)) = (
            present(self.name.as_deref()),
            present(self.port.as_deref()),
            present(self.protocol.as_deref()),
            present(self.action.as_deref()),
        ) else {
            return Err(Error::validation("rule", MISSING_RULE_PARAMS));
        };

        let protocol = Protocol::from_str(protocol)
            .map_err(|_| Error::validation("protocol", "Invalid protocol provided."))?;
        let action = Action::from_str(action)
            .map_err(|_| Error::validation("action", "Invalid action provided."))?;

        let name = validators::validate_name(name, policy)
            .map_err(|message| Error::validation("name", message))?;
        let port = validators::validate_port_spec(port, policy)
            .map_err(|message| Error::validation("port", message))?;

        Ok(Rule::new(name, port, protocol, action))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Discriminant of an [`Operation`], used for logging, audit and decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    StatusQuery,
    Toggle,
    AddRule,
    ListRules,
}

impl OperationKind {
    /// Mutating operations are never retried and are audited
    pub const fn is_mutating(self) -> bool {
        matches!(self, OperationKind::Toggle | OperationKind::AddRule)
    }
}

/// A validated logical operation. Each maps to exactly one primitive invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    StatusQuery,
    Toggle(ToggleState),
    AddRule(Rule),
    ListRules,
}

impl Operation {
    pub const fn kind(&self) -> OperationKind {
        match self {
            Operation::StatusQuery => OperationKind::StatusQuery,
            Operation::Toggle(_) => OperationKind::Toggle,
            Operation::AddRule(_) => OperationKind::AddRule,
            Operation::ListRules => OperationKind::ListRules,
        }
    }
}

/// Operation-specific success payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Status {
        profile: String,
        status: String,
    },
    Toggle {
        state: ToggleState,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    RuleAdded {
        rule: Rule,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Rules {
        rules: Vec<Rule>,
    },
}

impl From<FirewallState> for ResponsePayload {
    fn from(state: FirewallState) -> Self {
        ResponsePayload::Status {
            status: state.status_label().to_string(),
            profile: state.profile,
        }
    }
}

/// Uniform response returned for every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeResponse {
    pub success: bool,
    pub data: Option<ResponsePayload>,
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn success(data: ResponsePayload) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Reported status label (`Active`/`Inactive`) of a status response
    pub fn status(&self) -> Option<&str> {
        match &self.data {
            Some(ResponsePayload::Status { status, .. }) => Some(status),
            _ => None,
        }
    }

    /// Projected rules of a listing response
    pub fn rules(&self) -> Option<&[Rule]> {
        match &self.data {
            Some(ResponsePayload::Rules { rules }) => Some(rules),
            _ => None,
        }
    }
}
