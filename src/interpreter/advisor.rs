//! External rule advisor boundary.
//!
//! A [`RuleAdvisor`] is an injected collaborator (typically backed by an
//! inference service) that can classify rule text and suggest corrections
//! for validation findings. It may be slow, rate limited, or missing.
//! [`AdvisedInterpreter`] guarantees the engines behave the same in every
//! case: any failure or late answer falls back to the keyword vocabulary
//! for classification, and to no suggestion for corrections.
//!
//! Calls are synchronous, so a timeout can only discard an answer after it
//! arrives. Two limits keep a run bounded anyway: advisors are required to
//! honor the `budget` they are handed, and an [`AdvisorSession`] stops
//! calling the advisor once the run budget is spent.

use std::time::{Duration, Instant};

use super::{interpret, RuleEffect};
use crate::error::AdvisorError;
use crate::validation::ValidationError;

/// Default answer budget for a single advisor call.
pub const DEFAULT_ADVISOR_TIMEOUT: Duration = Duration::from_secs(2);

/// Default total advisor time for one validation or allocation run.
pub const DEFAULT_ADVISOR_RUN_BUDGET: Duration = Duration::from_secs(10);

/// Injected rule-classification and correction collaborator.
///
/// Implementations must return within the `budget` they receive (for
/// example by passing it on as a request timeout). The caller cannot
/// interrupt a call; it can only discard a late answer.
pub trait RuleAdvisor: Send + Sync {
    /// Classifies a rule description.
    ///
    /// `budget` is the time the caller will wait; answers arriving later
    /// are discarded.
    fn classify(&self, description: &str, budget: Duration) -> Result<RuleEffect, AdvisorError>;

    /// Suggests a correction for a finding. `Ok(None)` means no suggestion.
    fn suggest_correction(
        &self,
        _finding: &ValidationError,
        _budget: Duration,
    ) -> Result<Option<String>, AdvisorError> {
        Ok(None)
    }
}

/// Keyword interpreter with an optional advisor in front of it.
#[derive(Clone, Copy)]
pub struct AdvisedInterpreter<'a> {
    advisor: Option<&'a dyn RuleAdvisor>,
    timeout: Duration,
    run_budget: Duration,
}

impl<'a> AdvisedInterpreter<'a> {
    /// Creates an interpreter with no advisor.
    pub fn new() -> Self {
        Self {
            advisor: None,
            timeout: DEFAULT_ADVISOR_TIMEOUT,
            run_budget: DEFAULT_ADVISOR_RUN_BUDGET,
        }
    }

    /// Routes classification through `advisor` first.
    pub fn with_advisor(mut self, advisor: &'a dyn RuleAdvisor) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Sets the per-call answer budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the total advisor time allowed per session.
    pub fn with_run_budget(mut self, run_budget: Duration) -> Self {
        self.run_budget = run_budget;
        self
    }

    /// Whether an advisor is attached.
    pub fn has_advisor(&self) -> bool {
        self.advisor.is_some()
    }

    /// Starts a session that shares one run budget across calls.
    pub fn session(&self) -> AdvisorSession<'a> {
        AdvisorSession {
            interpreter: *self,
            spent: Duration::ZERO,
        }
    }

    /// Classifies a single description in its own session.
    pub fn interpret(&self, description: &str) -> RuleEffect {
        self.session().interpret(description)
    }

    /// Asks for a single correction in its own session.
    pub fn suggest(&self, finding: &ValidationError) -> Option<String> {
        self.session().suggest(finding)
    }
}

/// A run's worth of advisor calls.
///
/// Each call gets the smaller of the per-call timeout and the remaining run
/// budget. Once the run budget is spent the advisor is no longer called and
/// every answer comes from the fallback.
#[derive(Debug, Clone, Copy)]
pub struct AdvisorSession<'a> {
    interpreter: AdvisedInterpreter<'a>,
    spent: Duration,
}

impl AdvisorSession<'_> {
    /// Advisor time used so far.
    pub fn spent(&self) -> Duration {
        self.spent
    }

    /// Whether the advisor may still be called.
    pub fn has_budget(&self) -> bool {
        self.interpreter.advisor.is_some() && self.remaining() > Duration::ZERO
    }

    /// Classifies a description.
    ///
    /// Uses the advisor's answer when it succeeds within the budget,
    /// otherwise the keyword vocabulary.
    pub fn interpret(&mut self, description: &str) -> RuleEffect {
        let Some(advisor) = self.interpreter.advisor else {
            return interpret(description);
        };
        match self.call(|budget| advisor.classify(description, budget)) {
            Ok(effect) => effect,
            Err(err) => {
                tracing::warn!(error = %err, "rule advisor failed, using keyword interpretation");
                interpret(description)
            }
        }
    }

    /// Asks the advisor for a correction. Any failure yields `None`.
    pub fn suggest(&mut self, finding: &ValidationError) -> Option<String> {
        let advisor = self.interpreter.advisor?;
        match self.call(|budget| advisor.suggest_correction(finding, budget)) {
            Ok(suggestion) => suggestion,
            Err(err) => {
                tracing::debug!(error = %err, column = %finding.column, "no advisor suggestion");
                None
            }
        }
    }

    fn remaining(&self) -> Duration {
        self.interpreter.run_budget.saturating_sub(self.spent)
    }

    fn call<T>(
        &mut self,
        f: impl FnOnce(Duration) -> Result<T, AdvisorError>,
    ) -> Result<T, AdvisorError> {
        let budget = self.interpreter.timeout.min(self.remaining());
        if budget.is_zero() {
            return Err(AdvisorError::Unavailable("run budget spent".into()));
        }
        let started = Instant::now();
        let answer = f(budget);
        let elapsed = started.elapsed();
        self.spent += elapsed;
        if self.remaining().is_zero() {
            tracing::warn!(
                spent_ms = self.spent.as_millis() as u64,
                "advisor run budget spent, remaining calls use the fallback"
            );
        }
        let answer = answer?;
        if elapsed > budget {
            return Err(AdvisorError::Timeout(elapsed.as_millis()));
        }
        Ok(answer)
    }
}

impl Default for AdvisedInterpreter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AdvisedInterpreter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisedInterpreter")
            .field("advisor", &self.advisor.is_some())
            .field("timeout", &self.timeout)
            .field("run_budget", &self.run_budget)
            .finish()
    }
}
