use crate::app::report::{ExecutionReport, Status};
use crate::reporter::Reporter;
use std::io::{self, Write};

/// Plain statistics, one class per line.
#[derive(Debug, Default)]
pub struct SummaryReporter {
    show_timing: bool,
}

impl SummaryReporter {
    pub fn new(show_timing: bool) -> Self {
        Self { show_timing }
    }
}

impl Reporter for SummaryReporter {
    fn render(&self, report: &ExecutionReport, out: &mut dyn Write) -> io::Result<()> {
        for class in &report.classes {
            write!(
                out,
                "{:<7} {} ({} passed, {} failed, {} skipped)",
                class.status.to_string().to_uppercase(),
                class.name,
                class.passed(),
                class.failed(),
                class.skipped()
            )?;
            if let Some(reason) = &class.skip_reason {
                write!(out, ": {}", reason)?;
            }
            if self.show_timing {
                write!(out, " in {:.3} ms", class.duration.as_secs_f64() * 1000.0)?;
            }
            writeln!(out)?;
        }
        write_statistics(report, "", out)
    }
}

/// Run totals, each line prefixed with `prefix`.
pub fn write_statistics(report: &ExecutionReport, prefix: &str, out: &mut dyn Write) -> io::Result<()> {
    let classes = |status: Status| report.classes.iter().filter(|c| c.status == status).count();
    let methods_passed: usize = report.classes.iter().map(|c| c.passed()).sum();
    let methods_failed: usize = report.classes.iter().map(|c| c.failed()).sum();

    writeln!(
        out,
        "{}Classes: {} (passed {}, failed {}, skipped {})",
        prefix,
        report.total_classes(),
        classes(Status::Passed),
        classes(Status::Failed),
        classes(Status::Skipped)
    )?;
    writeln!(
        out,
        "{}Methods: {} (passed {}, failed {}, skipped {})",
        prefix,
        report.total_methods(),
        methods_passed,
        methods_failed,
        report.total_skipped()
    )?;
    writeln!(out, "{}Assertions: {}", prefix, report.total_assertions())?;
    writeln!(out, "{}Failures: {}", prefix, report.total_failures())?;
    writeln!(
        out,
        "{}Result: {}",
        prefix,
        if report.is_success() { "PASS" } else { "FAIL" }
    )
}
