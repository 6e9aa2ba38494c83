//! Narrows a primitive rule listing to managed rules
//!
//! A reported rule is managed when it:
//! - is not a system default (no built-in flag, no rule group)
//! - is bound to a concrete port (not absent, empty, or `Any`)
//! - uses a protocol and action the bridge can represent (TCP/UDP, Allow/Block)
//!
//! Everything else exists on the host but is outside what the bridge reasons
//! about. Listing order is preserved.

use crate::core::firewall::{Action, Protocol, Rule};
use crate::core::interpret::ReportedRule;
use tracing::debug;

/// Returns the concrete port binding of a reported rule, if any
fn port_binding(rule: &ReportedRule) -> Option<&str> {
    rule.port
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("any"))
}

/// System default rules carry a group or an explicit built-in flag
pub fn is_builtin(rule: &ReportedRule) -> bool {
    rule.builtin
        || rule
            .grouping
            .as_deref()
            .is_some_and(|g| !g.trim().is_empty())
}

/// Projects one reported rule, or `None` when it is not managed
pub fn project_rule(rule: &ReportedRule) -> Option<Rule> {
    let name = rule.name.trim();
    if name.is_empty() || is_builtin(rule) {
        return None;
    }

    let port = port_binding(rule)?;
    let protocol = rule.protocol.as_deref().and_then(Protocol::from_reported)?;
    let action = rule.action.as_deref().and_then(Action::from_reported)?;

    Some(Rule::new(name, port, protocol, action))
}

/// Projects a full listing, keeping at most `limit` managed rules when set
pub fn project(reported: &[ReportedRule], limit: Option<usize>) -> Vec<Rule> {
    let managed = reported.iter().filter_map(|rule| {
        let projected = project_rule(rule);
        if projected.is_none() {
            debug!(name = %rule.name, "Excluding unmanaged rule from listing");
        }
        projected
    });

    match limit {
        Some(n) => managed.take(n).collect(),
        None => managed.collect(),
    }
}
