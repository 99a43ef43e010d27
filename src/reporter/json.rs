use crate::app::report::ExecutionReport;
use crate::reporter::Reporter;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// The report as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn render(&self, report: &ExecutionReport, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)
    }
}

/// Writes the JSON report to `path`, creating missing parent directories.
pub fn save_into_file(report: &ExecutionReport, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    JsonReporter.render(report, &mut writer)?;
    writer.flush()?;
    info!("Report {} written to {}", report.id, path.display());
    Ok(())
}
