//! # Mutation Outcomes
//!
//! What the orchestrator reports back to its caller: one [`MutationResult`] per `apply` or
//! `clear` call, carrying the outcome of every strategy that was attempted.

use crate::error::MutationError;
use crate::schemas::dialect::Dialect;
use serde::Serialize;
use std::path::PathBuf;

/// How a single strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum AttemptOutcome {
    /// Settings written and validated.
    Applied,
    /// The managed block already held exactly these settings; nothing was written.
    Unchanged,
    /// Precondition not met (file missing or not writable); nothing was touched.
    Skipped(String),
    /// Failed before anything was written (snapshot, marker guard, I/O).
    Failed(String),
    /// Written, then rejected by validation or liveness, and restored from the snapshot.
    RolledBack(String),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Applied | AttemptOutcome::Unchanged)
    }
}

/// One strategy attempt: which dialect, which file, and what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: Dialect,
    pub path: PathBuf,
    pub outcome: AttemptOutcome,
}

/// The single success/failure answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    pub success: bool,
    /// The strategy that succeeded, when one did.
    pub strategy: Option<Dialect>,
    pub target: Option<PathBuf>,
    pub message: String,
    /// Set only on a failed result: some attempt had to be rolled back from its snapshot.
    /// The per-attempt history stays in `attempts` either way.
    pub restored: bool,
    pub attempts: Vec<StrategyAttempt>,
}

impl MutationResult {
    /// Builds the final result from the attempt log.
    pub fn from_attempts(attempts: Vec<StrategyAttempt>) -> Self {
        let restored = attempts
            .iter()
            .any(|attempt| matches!(attempt.outcome, AttemptOutcome::RolledBack(_)));

        match attempts.iter().find(|attempt| attempt.outcome.is_success()) {
            Some(winner) => {
                let message = match winner.outcome {
                    AttemptOutcome::Unchanged => format!(
                        "settings already applied via {} in {}",
                        winner.strategy,
                        winner.path.display()
                    ),
                    _ => format!(
                        "settings applied via {} in {}",
                        winner.strategy,
                        winner.path.display()
                    ),
                };
                MutationResult {
                    success: true,
                    strategy: Some(winner.strategy),
                    target: Some(winner.path.clone()),
                    message,
                    restored: false,
                    attempts,
                }
            },
            None => MutationResult {
                success: false,
                strategy: None,
                target: None,
                message: summarize(&attempts),
                restored,
                attempts,
            },
        }
    }

    /// Builds the result of a `clear` pass, which must touch every target rather than stop
    /// at the first success. Targets that were skipped (absent or read-only) do not count
    /// as failures.
    pub fn from_clear_attempts(attempts: Vec<StrategyAttempt>) -> Self {
        let restored = attempts
            .iter()
            .any(|attempt| matches!(attempt.outcome, AttemptOutcome::RolledBack(_)));
        let success = attempts.iter().all(|attempt| {
            attempt.outcome.is_success() || matches!(attempt.outcome, AttemptOutcome::Skipped(_))
        });
        let restored = restored && !success;
        let cleared = attempts
            .iter()
            .filter(|attempt| attempt.outcome == AttemptOutcome::Applied)
            .count();
        let message = if success {
            format!("managed blocks removed from {cleared} file(s)")
        } else {
            summarize(&attempts)
        };
        MutationResult { success, strategy: None, target: None, message, restored, attempts }
    }

    /// Converts a failed result into [`MutationError::ExhaustedStrategies`].
    pub fn into_result(self) -> Result<MutationResult, MutationError> {
        if self.success {
            Ok(self)
        } else {
            Err(MutationError::ExhaustedStrategies { summary: self.message })
        }
    }
}

fn summarize(attempts: &[StrategyAttempt]) -> String {
    if attempts.is_empty() {
        return "no configuration targets are configured".to_string();
    }
    attempts
        .iter()
        .map(|attempt| {
            let detail = match &attempt.outcome {
                AttemptOutcome::Skipped(reason) => format!("skipped ({reason})"),
                AttemptOutcome::Failed(reason) => format!("failed ({reason})"),
                AttemptOutcome::RolledBack(reason) => format!("rolled back ({reason})"),
                AttemptOutcome::Applied => "applied".to_string(),
                AttemptOutcome::Unchanged => "unchanged".to_string(),
            };
            format!("{}: {}", attempt.strategy, detail)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(strategy: Dialect, outcome: AttemptOutcome) -> StrategyAttempt {
        StrategyAttempt { strategy, path: PathBuf::from("/site/file"), outcome }
    }

    #[test]
    fn first_successful_attempt_wins() {
        let result = MutationResult::from_attempts(vec![
            attempt(Dialect::ConstantDefine, AttemptOutcome::RolledBack("syntax".into())),
            attempt(Dialect::IniLines, AttemptOutcome::Applied),
        ]);
        assert!(result.success);
        assert_eq!(result.strategy, Some(Dialect::IniLines));
        assert!(!result.restored);
        assert!(matches!(result.attempts[0].outcome, AttemptOutcome::RolledBack(_)));
    }

    #[test]
    fn exhausted_result_reports_rollback() {
        let result = MutationResult::from_attempts(vec![
            attempt(Dialect::ConstantDefine, AttemptOutcome::RolledBack("liveness".into())),
            attempt(Dialect::IniLines, AttemptOutcome::Skipped("missing".into())),
        ]);
        assert!(!result.success);
        assert!(result.restored);
    }

    #[test]
    fn exhausted_attempts_convert_to_error() {
        let result = MutationResult::from_attempts(vec![
            attempt(Dialect::ConstantDefine, AttemptOutcome::Skipped("missing".into())),
            attempt(Dialect::DirectiveBlock, AttemptOutcome::Failed("io".into())),
        ]);
        assert!(!result.success);
        assert!(result.message.contains("constant_define: skipped (missing)"));
        match result.into_result() {
            Err(MutationError::ExhaustedStrategies { summary }) => {
                assert!(summary.contains("directive_block: failed (io)"))
            },
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn clear_requires_every_present_target() {
        let cleared = MutationResult::from_clear_attempts(vec![
            attempt(Dialect::ConstantDefine, AttemptOutcome::Applied),
            attempt(Dialect::IniLines, AttemptOutcome::Skipped("missing".into())),
            attempt(Dialect::DirectiveBlock, AttemptOutcome::Unchanged),
        ]);
        assert!(cleared.success);
        assert_eq!(cleared.message, "managed blocks removed from 1 file(s)");

        let partial = MutationResult::from_clear_attempts(vec![
            attempt(Dialect::ConstantDefine, AttemptOutcome::Applied),
            attempt(Dialect::DirectiveBlock, AttemptOutcome::RolledBack("syntax".into())),
        ]);
        assert!(!partial.success);
        assert!(partial.restored);
    }
}
