//! Shared test utilities for core module tests
//!
//! Provides executor doubles so bridge tests never spawn a real primitive.
//! This module is only compiled in test mode.

use crate::core::error::{Error, Result};
use crate::core::executor::{Executor, InvocationResult};
use crate::core::firewall::RuleRequest;
use crate::core::invocation::{ADD_RULE_TAG, Invocation, LIST_RULES_TAG, STATUS_TAG, TOGGLE_TAG};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mutex for tests that need exclusive access to environment variables.
///
/// # Example
///
/// ```ignore
/// let _guard = ENV_VAR_MUTEX.lock().unwrap();
/// unsafe {
///     std::env::set_var("FWBRIDGE_ELEVATION_METHOD", "sudo");
/// }
/// // ... test with custom env state ...
/// unsafe {
///     std::env::remove_var("FWBRIDGE_ELEVATION_METHOD");
/// }
/// ```
pub static ENV_VAR_MUTEX: Mutex<()> = Mutex::new(());

/// Builds a rule request with every field present
pub fn rule_request(name: &str, port: &str, protocol: &str, action: &str) -> RuleRequest {
    RuleRequest {
        name: Some(name.to_string()),
        port: Some(port.to_string()),
        protocol: Some(protocol.to_string()),
        action: Some(action.to_string()),
    }
}

#[derive(Debug)]
enum Behavior {
    /// Pop results in order; the last one repeats
    Sequence(Mutex<VecDeque<InvocationResult>>),
    FailToSpawn,
    Hang,
}

/// Spy executor: records every invocation and returns canned results
#[derive(Debug)]
pub struct FakeExecutor {
    behavior: Behavior,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeExecutor {
    pub fn result(exit_code: Option<i32>, stdout: &str, stderr: &str) -> InvocationResult {
        InvocationResult {
            exit_code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always exits 0 with `stdout` and empty stderr
    pub fn replying(stdout: &str) -> Self {
        Self::sequence(vec![Self::result(Some(0), stdout, "")])
    }

    pub fn sequence(results: Vec<InvocationResult>) -> Self {
        Self::with(Behavior::Sequence(Mutex::new(results.into())))
    }

    /// Behaves like a missing primitive binary
    pub fn failing_to_spawn() -> Self {
        Self::with(Behavior::FailToSpawn)
    }

    /// Never completes
    pub fn hanging() -> Self {
        Self::with(Behavior::Hang)
    }

    /// Invocations seen so far
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn next_result(&self) -> Option<Result<InvocationResult>> {
        match &self.behavior {
            Behavior::Sequence(queue) => {
                let mut queue = queue.lock().unwrap();
                let next = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                Some(Ok(next.unwrap_or_default()))
            }
            Behavior::FailToSpawn => Some(Err(Error::Execution(
                "No such file or directory (os error 2)".into(),
            ))),
            Behavior::Hang => None,
        }
    }
}

impl Executor for FakeExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<InvocationResult> {
        self.calls.lock().unwrap().push(invocation.clone());
        match self.next_result() {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

#[derive(Debug, Default)]
struct FirewallModel {
    active: bool,
    rules: Vec<serde_json::Value>,
}

/// Deterministic in-memory primitive speaking the wire protocol
#[derive(Debug, Default)]
pub struct FakeFirewall {
    model: Mutex<FirewallModel>,
}

impl FakeFirewall {
    pub fn new(active: bool) -> Self {
        Self {
            model: Mutex::new(FirewallModel {
                active,
                rules: Vec::new(),
            }),
        }
    }

    fn respond(&self, argv: &[String]) -> serde_json::Value {
        let mut model = self.model.lock().unwrap();
        let tag = argv.first().map_or("", String::as_str);

        match (tag, &argv[1.min(argv.len())..]) {
            (STATUS_TAG, []) => {
                let status = if model.active { "Active" } else { "Inactive" };
                serde_json::json!({
                    "success": true,
                    "status": status,
                    "profile": "All Profiles",
                })
            }
            (TOGGLE_TAG, [state]) => {
                model.active = state == "on";
                serde_json::json!({ "success": true, "output": "Ok." })
            }
            (ADD_RULE_TAG, [name, port, protocol, action]) => {
                model.rules.push(serde_json::json!({
                    "name": name,
                    "port": port,
                    "protocol": protocol,
                    "action": action,
                }));
                serde_json::json!({ "success": true, "output": "Ok." })
            }
            (LIST_RULES_TAG, []) => serde_json::json!({
                "success": true,
                "rules": model.rules,
            }),
            _ => serde_json::json!({
                "success": false,
                "error": format!("Unknown action: {tag}"),
            }),
        }
    }
}

impl Executor for FakeFirewall {
    async fn execute(&self, invocation: &Invocation) -> Result<InvocationResult> {
        let reply = self.respond(&invocation.argv);
        Ok(InvocationResult {
            exit_code: Some(0),
            stdout: reply.to_string().into_bytes(),
            stderr: Vec::new(),
        })
    }
}
