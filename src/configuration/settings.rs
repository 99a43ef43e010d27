use crate::app::class::Tag;
use crate::app::selection::{Criteria, CriteriaBuilder};
use crate::configuration::constants::common::{
    DEFAULT_EXTENSIONS, DEFAULT_METHOD_PREFIX, DEFAULT_ROOT, ENV_PREFIX, SETTINGS_FILE_NAME,
};
use crate::configuration::deserialize::string_list;
use crate::error::{Error, Result};
use config::{Config, ConfigError, Environment, File};
use regex::Regex;
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};

/// What to do when two roles bring the same method with different tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    Fail,
    Union,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::Fail
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub root: PathBuf,
    pub method_prefix: String,
    #[serde(deserialize_with = "string_list::deserialize")]
    pub extensions: Vec<String>,
    #[serde(deserialize_with = "string_list::deserialize")]
    pub classes: Vec<String>,
    #[serde(deserialize_with = "string_list::deserialize")]
    pub include_tags: Vec<String>,
    #[serde(deserialize_with = "string_list::deserialize")]
    pub exclude_tags: Vec<String>,
    #[serde(with = "serde_regex")]
    pub include: Option<Regex>,
    #[serde(with = "serde_regex")]
    pub exclude: Option<Regex>,
    pub role_conflicts: ConflictPolicy,
    pub show_timing: bool,
    pub statistics: bool,
    pub report_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            method_prefix: DEFAULT_METHOD_PREFIX.to_owned(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            classes: Vec::new(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            include: None,
            exclude: None,
            role_conflicts: ConflictPolicy::default(),
            show_timing: false,
            statistics: false,
            report_file: None,
        }
    }
}

impl Settings {
    /// Layers an explicit settings file (or `classtest.*` in the working
    /// directory when none is given) and `CLASSTEST_*` environment variables
    /// over the defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = Config::new();
        match file {
            Some(path) => config.merge(File::from(path))?,
            None => config.merge(File::with_name(SETTINGS_FILE_NAME).required(false))?,
        };
        config.merge(Environment::with_prefix(ENV_PREFIX))?;

        let settings: Settings = config.try_into()?;
        debug!("Loaded settings {:#?}", settings);
        Ok(settings)
    }

    pub fn criteria(&self) -> Result<Criteria> {
        CriteriaBuilder::default()
            .classes(self.classes.clone())
            .include_tags(tags(&self.include_tags))
            .exclude_tags(tags(&self.exclude_tags))
            .include(self.include.clone())
            .exclude(self.exclude.clone())
            .build()
            .map_err(|e| Error::Settings(ConfigError::Message(e)))
    }
}

fn tags(labels: &[String]) -> crate::app::class::Tags {
    labels.iter().map(|label| Tag::from(label.as_str())).collect()
}
