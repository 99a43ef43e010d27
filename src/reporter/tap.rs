use crate::app::hooks::Phase;
use crate::app::report::{Assertion, ClassResult, ExecutionReport, Failure, MethodResult, Status};
use crate::reporter::summary::write_statistics;
use crate::reporter::Reporter;
use std::io::{self, Write};
use std::time::Duration;

const INDENT: &str = "    ";

/// TAP version 13 with one subtest per class and one per method inside it.
#[derive(Debug, Default)]
pub struct TapReporter {
    show_timing: bool,
    statistics: bool,
}

impl TapReporter {
    pub fn new(show_timing: bool, statistics: bool) -> Self {
        Self {
            show_timing,
            statistics,
        }
    }

    fn class(&self, class: &ClassResult, number: usize, out: &mut dyn Write) -> io::Result<()> {
        if class.status == Status::Skipped {
            let reason = class.skip_reason.as_deref().unwrap_or_default();
            return line(out, 0, &format!("ok {} # SKIP {}", number, flatten(reason)));
        }

        line(out, 1, &format!("# Subtest: {}", flatten(&class.name)))?;
        let mut count = 0;
        for assertion in class.assertions.iter().filter(|a| a.phase == Phase::Startup) {
            count += 1;
            self.assertion(assertion, count, 1, out)?;
        }
        for method in &class.methods {
            count += 1;
            self.method(method, count, out)?;
        }
        for assertion in class.assertions.iter().filter(|a| a.phase == Phase::Shutdown) {
            count += 1;
            self.assertion(assertion, count, 1, out)?;
        }
        for note in &class.notes {
            line(out, 1, &format!("# {}", flatten(note)))?;
        }
        diagnostics(&class.failures, 1, out)?;
        line(out, 1, &format!("1..{}", count))?;

        let mark = verdict(class.status);
        line(out, 0, &format!("{} {} - {}", mark, number, escape(&class.name)))?;
        self.timing(class.duration, 0, out)
    }

    fn method(&self, method: &MethodResult, number: usize, out: &mut dyn Write) -> io::Result<()> {
        if method.status == Status::Skipped {
            let reason = method.skip_reason.as_deref().unwrap_or_default();
            return line(out, 1, &format!("ok {} # SKIP {}", number, flatten(reason)));
        }

        line(out, 2, &format!("# Subtest: {}", flatten(&method.name)))?;
        for (i, assertion) in method.assertions.iter().enumerate() {
            self.assertion(assertion, i + 1, 2, out)?;
        }
        for note in &method.notes {
            line(out, 2, &format!("# {}", flatten(note)))?;
        }
        diagnostics(&method.failures, 2, out)?;
        let plan = method
            .planned
            .map_or(method.executed, |planned| planned as usize);
        line(out, 2, &format!("1..{}", plan))?;

        let mark = verdict(method.status);
        line(out, 1, &format!("{} {} - {}", mark, number, escape(&method.name)))?;
        self.timing(method.duration, 1, out)
    }

    fn assertion(
        &self,
        assertion: &Assertion,
        number: usize,
        depth: usize,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let name = escape(&assertion.name);
        if assertion.passed {
            return line(out, depth, &format!("ok {} - {}", number, name));
        }
        line(out, depth, &format!("not ok {} - {}", number, name))?;
        line(out, depth, &format!("#   Failed test '{}'", flatten(&assertion.name)))?;
        if let Some(diagnostic) = &assertion.diagnostic {
            for text in diagnostic.lines() {
                line(out, depth, &format!("#   {}", text))?;
            }
        }
        Ok(())
    }

    fn timing(&self, duration: Duration, depth: usize, out: &mut dyn Write) -> io::Result<()> {
        if self.show_timing {
            line(
                out,
                depth,
                &format!("# time: {:.3} ms", duration.as_secs_f64() * 1000.0),
            )?;
        }
        Ok(())
    }
}

impl Reporter for TapReporter {
    fn render(&self, report: &ExecutionReport, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "TAP version 13")?;
        for (i, class) in report.classes.iter().enumerate() {
            self.class(class, i + 1, out)?;
        }
        writeln!(out, "1..{}", report.classes.len())?;
        if self.statistics {
            write_statistics(report, "# ", out)?;
        }
        Ok(())
    }
}

fn verdict(status: Status) -> &'static str {
    match status {
        Status::Failed => "not ok",
        Status::Passed | Status::Skipped => "ok",
    }
}

/// Everything but failed assertions, which are already shown in place.
fn diagnostics(failures: &[Failure], depth: usize, out: &mut dyn Write) -> io::Result<()> {
    for failure in failures {
        if let Failure::Assertion { .. } = failure {
            continue;
        }
        line(out, depth, &format!("# {}", failure))?;
    }
    Ok(())
}

/// Test point descriptions: `#` would start a directive.
fn escape(name: &str) -> String {
    flatten(name).replace('#', "\\#")
}

/// Keeps text on the one line it is written to.
fn flatten(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

fn line(out: &mut dyn Write, depth: usize, text: &str) -> io::Result<()> {
    writeln!(out, "{}{}", INDENT.repeat(depth), text)
}
