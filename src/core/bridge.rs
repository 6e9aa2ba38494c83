//! The firewall control bridge
//!
//! Ties the stages together for one operation:
//!
//! ```text
//! caller input ─▶ validate/sanitize ─▶ build invocation ─▶ execute
//!                                                            │
//!      BridgeResponse ◀─ project (listings) ◀─ interpret ◀───┘
//! ```
//!
//! The bridge holds no firewall state. Every status or listing is
//! re-derived from the primitive, and every operation costs exactly one
//! invocation. Validation failures never reach the executor.
//!
//! Operations are independent: the bridge adds no locking around the OS
//! firewall. Concurrent mutations race at the OS layer, so callers that need
//! ordering must serialize their own Toggle/AddRule calls. Mutations are never
//! retried; read-only operations may be retried freely by callers.

use crate::audit::{AuditEvent, AuditLog};
use crate::config::BridgeConfig;
use crate::core::error::{Error, Result};
use crate::core::executor::{Executor, ProcessExecutor};
use crate::core::firewall::{BridgeResponse, Operation, RuleRequest, ToggleState};
use crate::core::interpret::interpret;
use crate::core::invocation::InvocationBuilder;
use crate::validators::SanitizePolicy;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Translates logical firewall operations into primitive invocations
#[derive(Debug)]
pub struct Bridge<E> {
    executor: E,
    builder: InvocationBuilder,
    sanitize_policy: SanitizePolicy,
    max_listed_rules: Option<usize>,
    audit: Option<AuditLog>,
}

impl Bridge<ProcessExecutor> {
    /// Creates a bridge running the configured primitive as a child process
    pub fn from_config(config: &BridgeConfig) -> Self {
        let executor = ProcessExecutor::new(
            config.primitive_args.clone(),
            config.elevate,
            config.max_concurrent_invocations,
        );

        let audit = if config.enable_audit_log {
            match AuditLog::new() {
                Ok(audit) => {
                    debug!("Auditing mutations to {}", audit.path().display());
                    Some(audit)
                }
                Err(e) => {
                    warn!("Audit log unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self::new(executor, &config.primitive_program)
            .with_sanitize_policy(config.sanitize_policy)
            .with_max_listed_rules(config.max_listed_rules)
            .with_audit_log(audit)
    }
}

impl<E: Executor> Bridge<E> {
    pub fn new(executor: E, program: impl Into<String>) -> Self {
        Self {
            executor,
            builder: InvocationBuilder::new(program),
            sanitize_policy: SanitizePolicy::default(),
            max_listed_rules: None,
            audit: None,
        }
    }

    pub fn with_sanitize_policy(mut self, policy: SanitizePolicy) -> Self {
        self.sanitize_policy = policy;
        self
    }

    pub fn with_max_listed_rules(mut self, limit: Option<usize>) -> Self {
        self.max_listed_rules = limit;
        self
    }

    pub fn with_audit_log(mut self, audit: Option<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Queries the current firewall state
    pub async fn status(&self) -> BridgeResponse {
        self.run(Operation::StatusQuery).await
    }

    /// Turns the firewall on or off.
    ///
    /// `state` must be exactly `on` or `off`; anything else (including a
    /// missing value) fails with "Invalid state provided." and no invocation.
    pub async fn toggle(&self, state: Option<&str>) -> BridgeResponse {
        match ToggleState::parse_request(state) {
            Ok(state) => self.run(Operation::Toggle(state)).await,
            Err(e) => rejected(e),
        }
    }

    /// Adds a rule after validating and sanitizing the request
    pub async fn add_rule(&self, request: &RuleRequest) -> BridgeResponse {
        match request.validate(self.sanitize_policy) {
            Ok(rule) => self.run(Operation::AddRule(rule)).await,
            Err(e) => rejected(e),
        }
    }

    /// Lists the managed rules currently known to the OS firewall
    pub async fn list_rules(&self) -> BridgeResponse {
        self.run(Operation::ListRules).await
    }

    /// Runs a validated operation through exactly one primitive invocation
    pub async fn run(&self, op: Operation) -> BridgeResponse {
        self.run_as(Uuid::new_v4(), &op).await
    }

    /// Like [`Bridge::run`], bounded by `timeout`.
    ///
    /// On expiry the in-flight invocation is dropped, which terminates the
    /// primitive. A mutation it already applied is not rolled back, so a
    /// timed-out Toggle or AddRule is audited as failed.
    pub async fn run_with_timeout(&self, op: Operation, timeout: Duration) -> BridgeResponse {
        let request_id = Uuid::new_v4();
        match tokio::time::timeout(timeout, self.run_as(request_id, &op)).await {
            Ok(response) => response,
            Err(_) => {
                let kind = op.kind();
                warn!(%kind, %request_id, "Operation timed out after {timeout:?}");
                let error = Error::Timeout(timeout);
                if kind.is_mutating() {
                    self.audit(request_id, &op, Some(error.to_string())).await;
                }
                error.into_response()
            }
        }
    }

    async fn run_as(&self, request_id: Uuid, op: &Operation) -> BridgeResponse {
        let span = info_span!("operation", kind = %op.kind(), %request_id);

        async {
            let outcome = self.execute(op).await;
            let error = outcome.as_ref().err().map(ToString::to_string);
            self.audit(request_id, op, error).await;

            match outcome {
                Ok(response) => {
                    info!("Operation succeeded");
                    response
                }
                Err(e) => {
                    warn!("Operation failed: {e}");
                    e.into_response()
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, op: &Operation) -> Result<BridgeResponse> {
        let invocation = self.builder.build(op);
        info!(tag = invocation.tag(), "Invoking firewall primitive");

        let result = self.executor.execute(&invocation).await?;
        let decoded = interpret(op, &result)?;

        Ok(BridgeResponse::success(
            decoded.into_payload(self.max_listed_rules),
        ))
    }

    async fn audit(&self, request_id: Uuid, op: &Operation, error: Option<String>) {
        let Some(audit) = &self.audit else {
            return;
        };

        let event = match op {
            Operation::Toggle(state) => AuditEvent::toggle(request_id, *state, error),
            Operation::AddRule(rule) => AuditEvent::add_rule(request_id, rule, error),
            Operation::StatusQuery | Operation::ListRules => return,
        };
        audit.record(event).await;
    }
}

/// Response for input rejected before any invocation
fn rejected(e: Error) -> BridgeResponse {
    info!("Rejected request: {e}");
    e.into_response()
}
