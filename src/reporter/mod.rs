//! Renderers for a finished [`ExecutionReport`].

pub mod json;
pub mod listing;
pub mod serialize;
pub mod summary;
pub mod tap;

use crate::app::report::ExecutionReport;
use crate::configuration::command_line::OutputFormat;
use crate::configuration::settings::Settings;
use std::io::{self, Write};

pub use self::json::JsonReporter;
pub use self::summary::SummaryReporter;
pub use self::tap::TapReporter;

pub trait Reporter {
    fn render(&self, report: &ExecutionReport, out: &mut dyn Write) -> io::Result<()>;
}

pub fn for_format(format: OutputFormat, settings: &Settings) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Tap => Box::new(TapReporter::new(settings.show_timing, settings.statistics)),
        OutputFormat::Json => Box::new(JsonReporter),
        OutputFormat::Summary => Box::new(SummaryReporter::new(settings.show_timing)),
    }
}
