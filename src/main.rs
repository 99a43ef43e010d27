#[macro_use]
extern crate log;

use classtest::app::App;
use classtest::configuration::command_line::{LogLevel, Opt, OutputFormat};
use classtest::configuration::constants::exit_code;
use classtest::configuration::settings::Settings;
use classtest::reporter::{self, json::save_into_file, listing::render_listing};
use log::LevelFilter;
use signal_hook::{iterator::Signals, SIGINT};
use std::io::{self, Write};
use std::{path::PathBuf, process::exit, thread};
use structopt::StructOpt;

fn main() {
    let options = Opt::from_args();

    if let Err(e) = init_logging(
        options.logging.unwrap_or(LogLevel::Info).into(),
        &options.log_output_file,
    ) {
        eprintln!("Cannot initialise logging: {}", e);
        exit(exit_code::STRUCTURAL_ERROR);
    }

    match Signals::new(&[SIGINT]) {
        Ok(signals) => {
            thread::spawn(move || {
                for sig in signals.forever() {
                    warn!("Received signal {:?}, stopping", sig);
                    exit(exit_code::INTERRUPTED);
                }
            });
        }
        Err(e) => warn!("Cannot install SIGINT handler: {}", e),
    }

    let code = match execute(&options) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            exit_code::STRUCTURAL_ERROR
        }
    };
    exit(code);
}

fn execute(options: &Opt) -> classtest::Result<i32> {
    let mut settings = Settings::load(options.config.as_deref())?;
    options.apply_to(&mut settings);
    debug!("Effective settings {:#?}", settings);

    let reporter = reporter::for_format(options.format.unwrap_or(OutputFormat::Tap), &settings);
    let report_file = settings.report_file.clone();
    let app = App::new(settings)?;
    let spec = app.plan()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if options.list {
        render_listing(&spec, &mut out)?;
        return Ok(exit_code::SUCCESS);
    }

    let report = app.execute(&spec);
    reporter.render(&report, &mut out)?;
    out.flush()?;
    if let Some(path) = report_file {
        save_into_file(&report, &path)?;
    }

    Ok(if report.is_success() {
        exit_code::SUCCESS
    } else {
        exit_code::TEST_FAILURE
    })
}

fn init_logging(level: LevelFilter, output: &Option<PathBuf>) -> Result<(), fern::InitError> {
    let mut dispatcher = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr());

    if let Some(log_file) = output {
        dispatcher = dispatcher.chain(fern::log_file(log_file)?);
    }
    dispatcher.apply()?;
    debug!("Logging level {} enabled", level);
    Ok(())
}
