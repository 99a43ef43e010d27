use crate::app::class::TestMethod;
use crate::app::composition::ResolvedClass;
use crate::app::context::Context;
use crate::app::hooks::{Interrupt, Phase};
use crate::app::report::{Aggregator, ExecutionReport, Failure, MethodResult};
use crate::app::selection::{PlannedClass, RunSpec};
use crate::configuration::constants::lifecycle::NO_METHODS_SELECTED;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassState {
    NotStarted,
    Starting,
    Running,
    Finishing,
    Done,
    SkippedClass,
}

#[derive(Debug, PartialEq)]
enum HookOutcome {
    Completed,
    Skipped(String),
    Failed,
}

/// Runs a [`RunSpec`] class by class, strictly in order.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    pub fn run(&self, spec: &RunSpec) -> ExecutionReport {
        info!(
            "Running {} methods in {} classes",
            spec.method_count(),
            spec.classes.len()
        );
        let mut aggregator = Aggregator::new();
        for planned in &spec.classes {
            self.run_class(planned, &mut aggregator);
        }
        let report = aggregator.finish();
        info!(
            "Finished: {} methods, {} assertions, {} failures",
            report.total_methods(),
            report.total_assertions(),
            report.total_failures()
        );
        report
    }

    fn run_class(&self, planned: &PlannedClass, aggregator: &mut Aggregator) {
        let class = &planned.class;
        let now = Instant::now();
        aggregator.open_class(&class.name);

        if planned.is_empty() {
            info!("Skipping {}: {}", class.name, NO_METHODS_SELECTED);
            aggregator.skip_class(NO_METHODS_SELECTED);
            aggregator.close_class(now.elapsed());
            return;
        }

        let mut state = ClassState::NotStarted;
        loop {
            let next = match state {
                ClassState::NotStarted => ClassState::Starting,
                ClassState::Starting => match self.run_class_hook(class, Phase::Startup, aggregator) {
                    HookOutcome::Completed => ClassState::Running,
                    HookOutcome::Skipped(reason) => {
                        info!("Skipping {}: {}", class.name, reason);
                        aggregator.skip_class(reason);
                        ClassState::SkippedClass
                    }
                    HookOutcome::Failed => ClassState::Done,
                },
                ClassState::Running => {
                    for method in &class.methods {
                        aggregator.record_method(self.run_method(class, method));
                    }
                    ClassState::Finishing
                }
                ClassState::Finishing => {
                    self.run_class_hook(class, Phase::Shutdown, aggregator);
                    ClassState::Done
                }
                ClassState::SkippedClass => ClassState::Done,
                ClassState::Done => break,
            };
            debug!("{}: {:?} -> {:?}", class.name, state, next);
            state = next;
        }

        aggregator.close_class(now.elapsed());
    }

    /// Runs startup or shutdown. Its assertions belong to the class.
    fn run_class_hook(
        &self,
        class: &ResolvedClass,
        phase: Phase,
        aggregator: &mut Aggregator,
    ) -> HookOutcome {
        let hook = match class.hooks.get(phase) {
            Some(hook) => hook,
            None => return HookOutcome::Completed,
        };
        let mut ctx = Context::new(&class.name, None, phase, &class.helpers);
        let result = hook.execute(&mut ctx);
        let failed = ctx.failed_count();
        let (assertions, notes) = ctx.finish();
        aggregator.record_class_assertions(assertions, notes);
        if failed > 0 {
            aggregator.record_class_failure(Failure::Assertion { phase, failed });
        }

        match result {
            Ok(()) => HookOutcome::Completed,
            Err(Interrupt::Skip(reason)) if phase.allows_skip() => HookOutcome::Skipped(reason),
            Err(Interrupt::Skip(reason)) => {
                warn!("{}: skip called from {}", class.name, phase);
                aggregator.record_class_failure(Failure::Misuse { phase, reason });
                HookOutcome::Failed
            }
            Err(Interrupt::Died(message)) => {
                error!("{}: {} died: {}", class.name, phase, message);
                aggregator.record_class_failure(Failure::Hook { phase, message });
                HookOutcome::Failed
            }
        }
    }

    /// One unit: setup, body, teardown, then the plan check.
    fn run_method(&self, class: &ResolvedClass, method: &TestMethod) -> MethodResult {
        let now = Instant::now();
        let mut result = MethodResult::new(method);
        let mut ctx = Context::new(
            &class.name,
            Some(method.name.as_str()),
            Phase::Setup,
            &class.helpers,
        );

        let mut run_body = true;
        if let Some(setup) = class.hooks.get(Phase::Setup) {
            match setup.execute(&mut ctx) {
                Ok(()) => {}
                Err(Interrupt::Skip(reason)) => {
                    info!("Skipping {}::{}: {}", class.name, method.name, reason);
                    result.skip_reason = Some(reason);
                    run_body = false;
                }
                Err(Interrupt::Died(message)) => {
                    error!("{}::{} setup died: {}", class.name, method.name, message);
                    result.failures.push(Failure::Hook {
                        phase: Phase::Setup,
                        message,
                    });
                    run_body = false;
                }
            }
        }

        if run_body {
            ctx.enter(Phase::Test);
            match method.body.execute(&mut ctx) {
                Ok(()) => {}
                Err(Interrupt::Skip(reason)) => result.failures.push(Failure::Misuse {
                    phase: Phase::Test,
                    reason,
                }),
                Err(Interrupt::Died(message)) => {
                    error!("{}::{} died: {}", class.name, method.name, message);
                    result.failures.push(Failure::Died { message });
                }
            }

            if let Some(teardown) = class.hooks.get(Phase::Teardown) {
                ctx.enter(Phase::Teardown);
                match teardown.execute(&mut ctx) {
                    Ok(()) => {}
                    Err(Interrupt::Skip(reason)) => result.failures.push(Failure::Misuse {
                        phase: Phase::Teardown,
                        reason,
                    }),
                    Err(Interrupt::Died(message)) => {
                        error!("{}::{} teardown died: {}", class.name, method.name, message);
                        result.failures.push(Failure::Hook {
                            phase: Phase::Teardown,
                            message,
                        });
                    }
                }
            }
        }

        for phase in &[Phase::Setup, Phase::Test, Phase::Teardown] {
            let failed = ctx.failed_in(*phase);
            if failed > 0 {
                result.failures.push(Failure::Assertion {
                    phase: *phase,
                    failed,
                });
            }
        }

        if run_body {
            if let Some(failure) = check_plan(method.plan, ctx.assertions_run()) {
                result.failures.push(failure);
            }
        }

        let (assertions, notes) = ctx.finish();
        result.assertions = assertions;
        result.notes = notes;
        result.duration = now.elapsed();
        result
    }
}

fn check_plan(plan: Option<u32>, actual: usize) -> Option<Failure> {
    match plan {
        Some(planned) if actual < planned as usize => Some(Failure::IncompletePlan {
            planned,
            actual,
            shortfall: planned as usize - actual,
        }),
        Some(planned) if actual > planned as usize => {
            Some(Failure::PlanOverrun { planned, actual })
        }
        None if actual == 0 => Some(Failure::NoAssertions),
        _ => None,
    }
}
