use crate::app::class::Helpers;
use crate::app::hooks::{ExecutionResult, Interrupt, Phase};
use crate::app::report::Assertion;
use crate::configuration::constants::common::MAX_CALL_DEPTH;
use derivative::*;
use regex::Regex;
use std::fmt::Debug;

/// State handed to every body while it runs: where it runs, which helpers it
/// may call, and the assertions it has made so far.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Context<'a> {
    class: &'a str,
    method: Option<&'a str>,
    phase: Phase,
    #[derivative(Debug = "ignore")]
    helpers: &'a Helpers,
    assertions: Vec<Assertion>,
    notes: Vec<String>,
    depth: usize,
}

impl<'a> Context<'a> {
    pub fn new(
        class: &'a str,
        method: Option<&'a str>,
        phase: Phase,
        helpers: &'a Helpers,
    ) -> Self {
        Self {
            class,
            method,
            phase,
            helpers,
            assertions: Vec::new(),
            notes: Vec::new(),
            depth: 0,
        }
    }

    pub fn class(&self) -> &str {
        self.class
    }

    pub fn method(&self) -> Option<&str> {
        self.method
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves on to the next phase of the same unit, keeping the assertions.
    pub fn enter(&mut self, phase: Phase) {
        trace!("{} enters {}", self.class, phase);
        self.phase = phase;
    }

    /// Records one assertion and returns whether it passed.
    pub fn record(
        &mut self,
        passed: bool,
        name: impl Into<String>,
        diagnostic: Option<String>,
    ) -> bool {
        let name = name.into();
        if passed {
            trace!("ok - {}", name);
        } else {
            debug!(
                "not ok - {} ({}::{})",
                name,
                self.class,
                self.method.unwrap_or_else(|| self.phase.as_str())
            );
        }
        self.assertions.push(Assertion {
            name,
            passed,
            phase: self.phase,
            diagnostic: if passed { None } else { diagnostic },
        });
        passed
    }

    pub fn ok(&mut self, value: bool, name: impl Into<String>) -> bool {
        self.record(value, name, None)
    }

    pub fn is<T>(&mut self, got: T, expected: T, name: impl Into<String>) -> bool
    where
        T: PartialEq + Debug,
    {
        let diagnostic = format!("     got: {:?}\nexpected: {:?}", got, expected);
        self.record(got == expected, name, Some(diagnostic))
    }

    pub fn isnt<T>(&mut self, got: T, unexpected: T, name: impl Into<String>) -> bool
    where
        T: PartialEq + Debug,
    {
        let diagnostic = format!("     got: {:?}\nexpected: anything else", got);
        self.record(got != unexpected, name, Some(diagnostic))
    }

    pub fn like(&mut self, got: &str, pattern: &Regex, name: impl Into<String>) -> bool {
        let diagnostic = format!("{:?}\ndoesn't match '{}'", got, pattern);
        self.record(pattern.is_match(got), name, Some(diagnostic))
    }

    pub fn pass(&mut self, name: impl Into<String>) -> bool {
        self.record(true, name, None)
    }

    pub fn fail(&mut self, name: impl Into<String>) -> bool {
        self.record(false, name, None)
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.notes.push(text.into());
    }

    /// The skip signal. Whether it is honoured depends on the phase it is
    /// returned from.
    pub fn skip(&self, reason: impl Into<String>) -> ExecutionResult {
        Err(Interrupt::Skip(reason.into()))
    }

    /// Runs an effective helper of the current class.
    pub fn call(&mut self, helper: &str) -> ExecutionResult {
        let body = match self.helpers.get(helper) {
            Some(body) => body.clone(),
            None => {
                return Err(Interrupt::Died(format!(
                    "no helper named '{}' in {}",
                    helper, self.class
                )))
            }
        };
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Interrupt::Died(format!(
                "helper calls nested deeper than {} (at '{}')",
                MAX_CALL_DEPTH, helper
            )));
        }
        self.depth += 1;
        let result = body.execute(self);
        self.depth -= 1;
        result
    }

    pub fn assertions_run(&self) -> usize {
        self.assertions.len()
    }

    pub fn failed_count(&self) -> usize {
        self.assertions.iter().filter(|a| !a.passed).count()
    }

    /// Failed assertions recorded while in `phase`.
    pub fn failed_in(&self, phase: Phase) -> usize {
        self.assertions
            .iter()
            .filter(|a| !a.passed && a.phase == phase)
            .count()
    }

    pub fn finish(self) -> (Vec<Assertion>, Vec<String>) {
        (self.assertions, self.notes)
    }
}
