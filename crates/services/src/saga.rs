//! # Saga
//!
//! The document store offers no multi-document transactions, so workflows
//! that touch several documents run as ordered sagas: one pivot write whose
//! failure aborts the request, followed by best-effort tail steps. A failed
//! tail step is logged and recorded, never rolled back and never retried.

use serde::Serialize;

/// Tracks tail-step outcomes of one saga run.
pub struct Saga {
    name: &'static str,
    completed: Vec<&'static str>,
    failed: Vec<FailedStep>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedStep {
    pub step: &'static str,
    pub error: String,
}

/// Outcome summary, logged when the saga finishes.
#[derive(Debug, Clone, Serialize)]
pub struct SagaReport {
    pub name: &'static str,
    pub completed: Vec<&'static str>,
    pub failed: Vec<FailedStep>,
}

impl SagaReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Saga {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Records one best-effort step. An `Err` outcome is logged at `warn` and
    /// kept in the report; the saga keeps going.
    pub fn step<T, E: std::fmt::Display>(
        &mut self,
        label: &'static str,
        outcome: Result<T, E>,
    ) -> Option<T> {
        match outcome {
            Ok(value) => {
                self.completed.push(label);
                Some(value)
            }
            Err(e) => {
                tracing::warn!(saga = self.name, step = label, error = %e, "saga step failed");
                self.failed.push(FailedStep {
                    step: label,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Closes the saga, logging a partial-completion warning when any tail
    /// step failed.
    pub fn finish(self) -> SagaReport {
        let report = SagaReport {
            name: self.name,
            completed: self.completed,
            failed: self.failed,
        };
        if !report.is_complete() {
            tracing::warn!(
                saga = report.name,
                completed = report.completed.len(),
                failed = report.failed.len(),
                "saga finished partially"
            );
        }
        report
    }
}
