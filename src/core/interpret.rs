//! Turns raw primitive output into a [`BridgeResponse`](crate::core::firewall::BridgeResponse)
//!
//! # Algorithm
//!
//! 1. Failure signalled (exit code ≠ 0 or non-empty stderr): try to decode
//!    stdout (or stderr when stdout is empty) as a structured error reply and
//!    pass its `error` through verbatim. Otherwise report stderr, or
//!    "Unknown script error" when stderr is blank.
//! 2. Clean exit: decode stdout against the schema for the operation. A reply
//!    that says `success: false` is still a primitive error. Anything that
//!    does not decode becomes "Failed to parse server response.".
//!
//! Every path yields a well-formed response: `success` is always set and a
//! failure always carries a non-empty `error`.

use crate::core::error::{Error, Result, UNKNOWN_PRIMITIVE_ERROR};
use crate::core::executor::InvocationResult;
use crate::core::firewall::{
    DEFAULT_PROFILE, FirewallState, Operation, ResponsePayload, Rule, ToggleState,
};
use crate::core::projection::project;
use crate::utils::truncate_string;
use serde::Deserialize;
use tracing::warn;

/// The primitive's stdout reply, shared by every sub-operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrimitiveReply {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub rules: Option<Vec<ReportedRule>>,
}

/// A rule as listed by the primitive, before projection
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportedRule {
    pub name: String,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    /// Built-in rule group; set on system default rules
    #[serde(default, alias = "group")]
    pub grouping: Option<String>,
    #[serde(default)]
    pub builtin: bool,
}

/// Decoded success payload, before projection
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Status(FirewallState),
    Toggled {
        state: ToggleState,
        message: Option<String>,
    },
    RuleAdded {
        rule: Rule,
        message: Option<String>,
    },
    Rules(Vec<ReportedRule>),
}

impl Decoded {
    /// Builds the caller-facing payload, projecting rule listings down to
    /// managed rules (at most `max_rules` when set).
    pub fn into_payload(self, max_rules: Option<usize>) -> ResponsePayload {
        match self {
            Decoded::Status(state) => state.into(),
            Decoded::Toggled { state, message } => ResponsePayload::Toggle { state, message },
            Decoded::RuleAdded { rule, message } => ResponsePayload::RuleAdded { rule, message },
            Decoded::Rules(reported) => ResponsePayload::Rules {
                rules: project(&reported, max_rules),
            },
        }
    }
}

/// Interprets one invocation result for `op`.
///
/// Rule listings are returned unprojected; see [`Decoded::into_payload`].
///
/// # Errors
///
/// - `Error::Primitive` when the primitive signalled failure
/// - `Error::ContractViolation` when a clean exit produced unusable output
pub fn interpret(op: &Operation, result: &InvocationResult) -> Result<Decoded> {
    if result.signals_failure() {
        return Err(primitive_failure(result));
    }

    let reply: PrimitiveReply = serde_json::from_slice(&result.stdout).map_err(|e| {
        warn!(
            "Failed to parse primitive output: {}",
            truncate_string(&result.stdout_text(), 200)
        );
        Error::ContractViolation(e.to_string())
    })?;

    if !reply.success {
        let message = non_blank(reply.error).unwrap_or_else(|| UNKNOWN_PRIMITIVE_ERROR.into());
        return Err(Error::Primitive {
            message,
            stderr: None,
            exit_code: result.exit_code,
        });
    }

    decode_success(op, reply)
}

fn primitive_failure(result: &InvocationResult) -> Error {
    let stderr = result.stderr_text();
    let structured_source = if result.stdout.is_empty() {
        &result.stderr
    } else {
        &result.stdout
    };

    let structured = serde_json::from_slice::<serde_json::Value>(structured_source)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from));

    let message = non_blank(structured)
        .or_else(|| non_blank(Some(stderr.trim().to_string())))
        .unwrap_or_else(|| UNKNOWN_PRIMITIVE_ERROR.into());

    warn!(exit_code = ?result.exit_code, "Firewall primitive failed: {message}");

    Error::Primitive {
        message,
        stderr: (!stderr.is_empty()).then_some(stderr),
        exit_code: result.exit_code,
    }
}

fn decode_success(op: &Operation, reply: PrimitiveReply) -> Result<Decoded> {
    match op {
        Operation::StatusQuery => {
            let status = reply
                .status
                .ok_or_else(|| Error::ContractViolation("missing `status`".into()))?;
            let active = match status.trim().to_ascii_lowercase().as_str() {
                "active" => true,
                "inactive" => false,
                other => {
                    return Err(Error::ContractViolation(format!(
                        "unexpected status `{other}`"
                    )));
                }
            };
            Ok(Decoded::Status(FirewallState {
                profile: non_blank(reply.profile).unwrap_or_else(|| DEFAULT_PROFILE.into()),
                active,
            }))
        }
        Operation::Toggle(state) => Ok(Decoded::Toggled {
            state: *state,
            message: non_blank(reply.output),
        }),
        Operation::AddRule(rule) => Ok(Decoded::RuleAdded {
            rule: rule.clone(),
            message: non_blank(reply.output),
        }),
        Operation::ListRules => reply
            .rules
            .map(Decoded::Rules)
            .ok_or_else(|| Error::ContractViolation("missing `rules`".into())),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}


#[cfg(test)]
mod proptest_tests {
    use super::tests::interpret_response;
    use super::*;
    use proptest::prelude::*;

    fn any_operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            Just(Operation::StatusQuery),
            Just(Operation::ListRules),
            Just(Operation::Toggle(ToggleState::On)),
            Just(Operation::Toggle(ToggleState::Off)),
        ]
    }

    proptest! {
        #[test]
        fn test_response_always_well_formed(
            op in any_operation(),
            exit_code in proptest::option::of(-2i32..3),
            stdout in proptest::collection::vec(any::<u8>(), 0..64),
            stderr in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            let result = InvocationResult { exit_code, stdout, stderr };
            let response = interpret_response(&op, &result);
            if !response.success {
                let error = response.error.unwrap_or_default();
                prop_assert!(!error.trim().is_empty());
            }
        }

        #[test]
        fn test_json_shaped_garbage_well_formed(
            op in any_operation(),
            body in r#"\{"success": (true|false)(, "(error|status|rules|output)": ("[a-z ]*"|null|\[\]|1))?\}"#,
        ) {
            let result = InvocationResult { exit_code: Some(0), stdout: body.into_bytes(), stderr: Vec::new() };
            let response = interpret_response(&op, &result);
            prop_assert!(response.success || response.error.is_some_and(|e| !e.trim().is_empty()));
        }
    }
}
