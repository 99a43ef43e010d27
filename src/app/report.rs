use crate::app::class::{TestMethod, Tags};
use crate::app::hooks::Phase;
use crate::reporter::serialize::duration_millis;
use serde_derive::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Skipped => "skipped",
        })
    }
}

/// One recorded `ok`/`is`/`like`/... outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assertion {
    pub name: String,
    pub passed: bool,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Why a method or class did not pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    Assertion {
        phase: Phase,
        failed: usize,
    },
    IncompletePlan {
        planned: u32,
        actual: usize,
        shortfall: usize,
    },
    PlanOverrun {
        planned: u32,
        actual: usize,
    },
    NoAssertions,
    /// The test body raised.
    Died {
        message: String,
    },
    /// A hook raised.
    Hook {
        phase: Phase,
        message: String,
    },
    /// Skip requested where skipping is not allowed.
    Misuse {
        phase: Phase,
        reason: String,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Assertion { phase, failed } => {
                write!(f, "{} failed assertion(s) in {}", failed, phase)
            }
            Failure::IncompletePlan {
                planned,
                actual,
                shortfall,
            } => write!(
                f,
                "incomplete plan: planned {} assertions but ran {} ({} missing)",
                planned, actual, shortfall
            ),
            Failure::PlanOverrun { planned, actual } => write!(
                f,
                "plan overrun: planned {} assertions but ran {}",
                planned, actual
            ),
            Failure::NoAssertions => f.write_str("no assertions run"),
            Failure::Died { message } => write!(f, "died: {}", message),
            Failure::Hook { phase, message } => write!(f, "{} died: {}", phase, message),
            Failure::Misuse { phase, reason } => write!(
                f,
                "skip is not allowed in {} (reason given: {})",
                phase, reason
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodResult {
    pub name: String,
    pub origin: String,
    pub tags: Tags,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned: Option<u32>,
    pub executed: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub failures: Vec<Failure>,
    pub assertions: Vec<Assertion>,
    pub notes: Vec<String>,
    #[serde(serialize_with = "duration_millis")]
    pub duration: Duration,
}

impl MethodResult {
    pub fn new(method: &TestMethod) -> Self {
        Self {
            name: method.name.clone(),
            origin: method.origin.clone(),
            tags: method.tags.clone(),
            status: Status::Passed,
            planned: method.plan,
            executed: 0,
            failed: 0,
            skip_reason: None,
            failures: Vec::new(),
            assertions: Vec::new(),
            notes: Vec::new(),
            duration: Duration::default(),
        }
    }

    /// Recomputes counts and status. A failure outranks a skip.
    pub fn settle(&mut self) {
        self.executed = self.assertions.len();
        self.failed = self.assertions.iter().filter(|a| !a.passed).count();
        self.status = if !self.failures.is_empty() {
            Status::Failed
        } else if self.skip_reason.is_some() {
            Status::Skipped
        } else {
            Status::Passed
        };
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassResult {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub methods: Vec<MethodResult>,
    /// Failures raised by startup or shutdown.
    pub failures: Vec<Failure>,
    /// Assertions made by startup or shutdown.
    pub assertions: Vec<Assertion>,
    pub notes: Vec<String>,
    #[serde(serialize_with = "duration_millis")]
    pub duration: Duration,
}

impl ClassResult {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            status: Status::Passed,
            skip_reason: None,
            methods: Vec::new(),
            failures: Vec::new(),
            assertions: Vec::new(),
            notes: Vec::new(),
            duration: Duration::default(),
        }
    }

    fn count(&self, status: Status) -> usize {
        self.methods.iter().filter(|m| m.status == status).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Status::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Status::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(Status::Skipped)
    }

    pub fn method(&self, name: &str) -> Option<&MethodResult> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Assertions of hooks plus those of every method.
    pub fn total_assertions(&self) -> usize {
        self.assertions.len() + self.methods.iter().map(|m| m.executed).sum::<usize>()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub id: uuid::Uuid,
    pub start: u128,
    pub stop: u128,
    pub classes: Vec<ClassResult>,
}

impl ExecutionReport {
    pub fn class(&self, name: &str) -> Option<&ClassResult> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn total_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn total_methods(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    /// Failed methods plus class-level hook failures.
    pub fn total_failures(&self) -> usize {
        self.classes
            .iter()
            .map(|c| c.failed() + c.failures.len())
            .sum()
    }

    pub fn total_assertions(&self) -> usize {
        self.classes.iter().map(ClassResult::total_assertions).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.classes.iter().map(ClassResult::skipped).sum()
    }

    pub fn is_success(&self) -> bool {
        self.classes.iter().all(|c| c.status != Status::Failed)
    }
}

/// Builds an [`ExecutionReport`] class by class. Consumed by [`Aggregator::finish`],
/// after which the report can no longer change.
#[derive(Debug)]
pub struct Aggregator {
    id: uuid::Uuid,
    start: u128,
    classes: Vec<ClassResult>,
    current: Option<ClassResult>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            start: crate::now!(),
            classes: Vec::new(),
            current: None,
        }
    }

    pub fn open_class(&mut self, name: &str) {
        self.close_class(Duration::default());
        self.current = Some(ClassResult::new(name));
    }

    pub fn record_method(&mut self, mut result: MethodResult) {
        result.settle();
        if let Some(class) = self.current.as_mut() {
            class.methods.push(result);
        }
    }

    pub fn record_class_assertions(&mut self, assertions: Vec<Assertion>, notes: Vec<String>) {
        if let Some(class) = self.current.as_mut() {
            class.assertions.extend(assertions);
            class.notes.extend(notes);
        }
    }

    pub fn record_class_failure(&mut self, failure: Failure) {
        if let Some(class) = self.current.as_mut() {
            class.failures.push(failure);
        }
    }

    pub fn skip_class(&mut self, reason: impl Into<String>) {
        if let Some(class) = self.current.as_mut() {
            class.skip_reason = Some(reason.into());
        }
    }

    /// Settles the open class, if any. A failure outranks a skip.
    pub fn close_class(&mut self, duration: Duration) {
        if let Some(mut class) = self.current.take() {
            class.duration = duration;
            class.status = if !class.failures.is_empty() || class.failed() > 0 {
                Status::Failed
            } else if class.skip_reason.is_some() {
                Status::Skipped
            } else {
                Status::Passed
            };
            debug!("Class {} finished as {}", class.name, class.status);
            self.classes.push(class);
        }
    }

    pub fn finish(mut self) -> ExecutionReport {
        self.close_class(Duration::default());
        ExecutionReport {
            id: self.id,
            start: self.start,
            stop: crate::now!(),
            classes: self.classes,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::context::Context;

    fn method(name: &str) -> MethodResult {
        MethodResult::new(&TestMethod::new(name, |_ctx: &mut Context<'_>| Ok(())))
    }

    fn assertion(passed: bool) -> Assertion {
        Assertion {
            name: "check".to_owned(),
            passed,
            phase: Phase::Test,
            diagnostic: None,
        }
    }

    #[test]
    fn test_method_status_follows_failures_and_skip() {
        let mut passed = method("test_a");
        passed.assertions.push(assertion(true));
        passed.settle();

        let mut failed = method("test_b");
        failed.assertions.push(assertion(false));
        failed.failures.push(Failure::Assertion {
            phase: Phase::Test,
            failed: 1,
        });
        failed.settle();

        let mut skipped = method("test_c");
        skipped.skip_reason = Some("offline".to_owned());
        skipped.settle();

        assert_eq!(passed.status, Status::Passed);
        assert_eq!(passed.executed, 1);
        assert_eq!(failed.status, Status::Failed);
        assert_eq!(failed.failed, 1);
        assert_eq!(skipped.status, Status::Skipped);
    }

    #[test]
    fn test_aggregates_totals_across_classes() {
        let mut aggregator = Aggregator::new();
        aggregator.open_class("A");
        let mut ok = method("test_ok");
        ok.assertions.push(assertion(true));
        aggregator.record_method(ok);
        let mut broken = method("test_broken");
        broken.failures.push(Failure::NoAssertions);
        aggregator.record_method(broken);
        aggregator.open_class("B");
        aggregator.skip_class("no test methods selected");
        aggregator.close_class(Duration::from_millis(1));

        let report = aggregator.finish();

        assert_eq!(report.total_classes(), 2);
        assert_eq!(report.total_methods(), 2);
        assert_eq!(report.total_failures(), 1);
        assert_eq!(report.total_assertions(), 1);
        assert!(!report.is_success());
        assert_eq!(report.class("A").unwrap().status, Status::Failed);
        let b = report.class("B").unwrap();
        assert_eq!(b.status, Status::Skipped);
        assert_eq!(b.skip_reason.as_deref(), Some("no test methods selected"));
    }

    #[test]
    fn test_hook_failure_fails_class_even_when_methods_pass() {
        let mut aggregator = Aggregator::new();
        aggregator.open_class("A");
        let mut ok = method("test_ok");
        ok.assertions.push(assertion(true));
        aggregator.record_method(ok);
        aggregator.record_class_failure(Failure::Hook {
            phase: Phase::Shutdown,
            message: "disconnect failed".to_owned(),
        });

        let report = aggregator.finish();
        let class = report.class("A").unwrap();

        assert_eq!(class.status, Status::Failed);
        assert_eq!(class.passed(), 1);
        assert_eq!(report.total_failures(), 1);
    }

    #[test]
    fn test_failure_serializes_with_kind() {
        let failure = Failure::IncompletePlan {
            planned: 3,
            actual: 1,
            shortfall: 2,
        };

        let json = serde_json::to_value(&failure).unwrap();

        assert_eq!(json["kind"], "incomplete_plan");
        assert_eq!(json["shortfall"], 2);
        assert_eq!(
            failure.to_string(),
            "incomplete plan: planned 3 assertions but ran 1 (2 missing)"
        );
    }
}
