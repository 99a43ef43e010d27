use crate::configuration::constants::cargo_env::CARGO_PKG_NAME;
use crate::configuration::settings::Settings;
use clap::arg_enum;
use log::LevelFilter;
use regex::Regex;
use std::path::PathBuf;
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug, Clone, Copy)]
    pub enum LogLevel {
        Off, Error, Warn, Info, Debug, Trace,
    }
}

arg_enum! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum OutputFormat {
        Tap, Json, Summary,
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = CARGO_PKG_NAME)]
pub struct Opt {
    /// Directory to discover test classes in [default: t/lib]
    #[structopt(parse(from_os_str))]
    pub root: Option<PathBuf>,

    /// Settings file. Supported: YAML, JSON, TOML, HJSON
    #[structopt(long, short = "c", parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Run only the named test classes
    #[structopt(long = "class", short = "C", number_of_values = 1)]
    pub classes: Vec<String>,

    /// Run only methods carrying at least one of these tags
    #[structopt(long = "include-tag", short = "i", number_of_values = 1)]
    pub include_tags: Vec<String>,

    /// Never run methods carrying any of these tags
    #[structopt(long = "exclude-tag", short = "x", number_of_values = 1)]
    pub exclude_tags: Vec<String>,

    /// Run only methods whose name matches this regular expression
    #[structopt(long)]
    pub include: Option<Regex>,

    /// Skip methods whose name matches this regular expression
    #[structopt(long)]
    pub exclude: Option<Regex>,

    /// Output format
    #[structopt(case_insensitive = true, long, short = "f", possible_values = &OutputFormat::variants())]
    pub format: Option<OutputFormat>,

    /// Also write the JSON report to this file
    #[structopt(long, parse(from_os_str))]
    pub report_file: Option<PathBuf>,

    /// Print how long each class and method took
    #[structopt(long)]
    pub show_timing: bool,

    /// Print run statistics after the report
    #[structopt(long)]
    pub statistics: bool,

    /// List the selected classes and methods without running them
    #[structopt(long, short = "l")]
    pub list: bool,

    /// Sets a logging level
    #[structopt(case_insensitive = true, long, short = "L", possible_values = &LogLevel::variants(), env = "LOG_LEVEL")]
    pub logging: Option<LogLevel>,

    /// File to which application will write logs
    #[structopt(long, short = "O", env = "LOG_OUTPUT_FILE")]
    pub log_output_file: Option<PathBuf>,
}

impl Opt {
    /// Command line flags win over every other settings source.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(root) = &self.root {
            settings.root = root.clone();
        }
        if !self.classes.is_empty() {
            settings.classes = self.classes.clone();
        }
        if !self.include_tags.is_empty() {
            settings.include_tags = self.include_tags.clone();
        }
        if !self.exclude_tags.is_empty() {
            settings.exclude_tags = self.exclude_tags.clone();
        }
        if self.include.is_some() {
            settings.include = self.include.clone();
        }
        if self.exclude.is_some() {
            settings.exclude = self.exclude.clone();
        }
        if self.report_file.is_some() {
            settings.report_file = self.report_file.clone();
        }
        settings.show_timing |= self.show_timing;
        settings.statistics |= self.statistics;
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_repeated_flags_collect() {
        let opt = Opt::from_iter(&[
            "classtest", "t/lib", "-C", "TestsFor::A", "-C", "TestsFor::B", "-x", "online",
        ]);

        assert_eq!(opt.root, Some(PathBuf::from("t/lib")));
        assert_eq!(opt.classes, vec!["TestsFor::A", "TestsFor::B"]);
        assert_eq!(opt.exclude_tags, vec!["online"]);
    }

    #[test]
    fn test_format_is_case_insensitive() {
        let opt = Opt::from_iter(&["classtest", "--format", "JSON"]);

        assert_eq!(opt.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_flags_override_settings() {
        let opt = Opt::from_iter(&[
            "classtest",
            "spec/classes",
            "-i",
            "database",
            "--include",
            "^test_db",
            "--statistics",
        ]);
        let mut settings = Settings {
            include_tags: vec!["online".to_owned()],
            exclude_tags: vec!["slow".to_owned()],
            ..Settings::default()
        };

        opt.apply_to(&mut settings);

        assert_eq!(settings.root, PathBuf::from("spec/classes"));
        assert_eq!(settings.include_tags, vec!["database".to_owned()]);
        assert_eq!(settings.exclude_tags, vec!["slow".to_owned()]);
        assert!(settings.include.unwrap().is_match("test_db_roundtrip"));
        assert!(settings.statistics);
        assert!(!settings.show_timing);
    }
}
