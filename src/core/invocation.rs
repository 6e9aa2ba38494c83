//! Maps logical operations to primitive invocation descriptors
//!
//! The primitive is invoked with a sub-operation tag followed by positional
//! arguments in a fixed order:
//!
//! | Operation   | argv                                         |
//! |-------------|----------------------------------------------|
//! | StatusQuery | `status`                                     |
//! | Toggle      | `toggle <on\|off>`                           |
//! | AddRule     | `add_rule <name> <port> <TCP\|UDP> <Allow\|Block>` |
//! | ListRules   | `get_rules`                                  |
//!
//! Only validated [`Operation`]s reach the builder, so argv never carries
//! unsanitized caller data.

use crate::core::firewall::Operation;
use crate::validators::{sanitize_name, sanitize_port};
use std::fmt;

pub const STATUS_TAG: &str = "status";
pub const TOGGLE_TAG: &str = "toggle";
pub const ADD_RULE_TAG: &str = "add_rule";
pub const LIST_RULES_TAG: &str = "get_rules";

/// One spawn-and-wait execution of the primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub argv: Vec<String>,
}

impl Invocation {
    /// Sub-operation tag (first positional argument)
    pub fn tag(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.argv {
            write!(f, " {arg:?}")?;
        }
        Ok(())
    }
}

/// Builds invocations for a fixed primitive program
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    program: String,
}

impl InvocationBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Deterministic and total over every [`Operation`].
    ///
    /// Rule name and port are passed through the sanitizers again, so argv
    /// stays clean even for a rule taken from a listing.
    pub fn build(&self, op: &Operation) -> Invocation {
        let argv = match op {
            Operation::StatusQuery => vec![STATUS_TAG.to_string()],
            Operation::Toggle(state) => vec![TOGGLE_TAG.to_string(), state.to_string()],
            Operation::AddRule(rule) => vec![
                ADD_RULE_TAG.to_string(),
                sanitize_name(rule.name()),
                sanitize_port(rule.port()),
                rule.protocol().to_string(),
                rule.action().to_string(),
            ],
            Operation::ListRules => vec![LIST_RULES_TAG.to_string()],
        };

        Invocation {
            program: self.program.clone(),
            argv,
        }
    }
}
