use crate::app::assert::Assertable;
use crate::app::context::Context;
use crate::app::hooks::{Executable, ExecutionResult};
use crate::app::operation::Performable;
use crate::configuration::manifest::{Step, StepEntry};
use std::convert::TryFrom;

/// Body built from manifest steps, run top to bottom. The first interrupt
/// ends the script.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Converts raw entries, reporting the 1-based position of the first bad one.
    pub fn parse(entries: Vec<StepEntry>) -> Result<Self, String> {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| Step::try_from(entry).map_err(|e| format!("step {}: {}", i + 1, e)))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Executable for Script {
    fn execute(&self, ctx: &mut Context<'_>) -> ExecutionResult {
        for step in &self.steps {
            match step {
                Step::Check(check) => {
                    check.assert(ctx);
                }
                Step::Operation(operation) => operation.perform(ctx)?,
            }
        }
        Ok(())
    }
}
