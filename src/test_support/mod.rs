//! Test utilities and mocks for unit tests.
//!
//! Provides a [`RecordingRunner`] that stands in for the real subprocess
//! runner, and descriptor fixtures for common service shapes.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::{fixtures, RecordingRunner};
//!
//! let mut runner = RecordingRunner::new(BuildOutcome::exited(101));
//! let mut service = Service::from_yaml("/srv/app", fixtures::SINGLE_RUST_SERVICE)?;
//! let err = build(&mut service, &ctx, &BuildOptions::default(), &mut runner);
//! assert_eq!(runner.plans().len(), 1);
//! ```

pub mod fixtures;

use crate::builder::{BuildOutcome, BuildPlan, BuildRunner};

/// Build runner that records every plan and returns a canned outcome.
#[derive(Debug)]
pub struct RecordingRunner {
    outcome: BuildOutcome,
    plans: Vec<BuildPlan>,
}

impl RecordingRunner {
    /// Create a runner that always returns `outcome`.
    pub fn new(outcome: BuildOutcome) -> Self {
        RecordingRunner {
            outcome,
            plans: Vec::new(),
        }
    }

    /// All plans run so far.
    pub fn plans(&self) -> &[BuildPlan] {
        &self.plans
    }

    /// The only plan run so far. Panics unless exactly one ran.
    pub fn single_plan(&self) -> &BuildPlan {
        assert_eq!(self.plans.len(), 1, "expected exactly one build");
        &self.plans[0]
    }
}

impl BuildRunner for RecordingRunner {
    fn run(&mut self, plan: &BuildPlan) -> BuildOutcome {
        self.plans.push(plan.clone());
        self.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BuildInvocation, WorkingPaths};
    use std::path::PathBuf;

    fn plan() -> BuildPlan {
        BuildPlan::Docker(BuildInvocation::new(
            "docker",
            vec!["run".to_string()],
            WorkingPaths {
                source_path: PathBuf::from("/srv"),
                cargo_registry: PathBuf::from("/r"),
                cargo_downloads: PathBuf::from("/g"),
            },
        ))
    }

    #[test]
    fn test_recording_runner_records_plans() {
        let mut runner = RecordingRunner::new(BuildOutcome::exited(2));

        assert_eq!(runner.run(&plan()), BuildOutcome::exited(2));
        assert_eq!(runner.run(&plan()), BuildOutcome::exited(2));
        assert_eq!(runner.plans().len(), 2);
    }
}
