use config::{Config, ConfigError, File};
use regex::Regex;
use serde_derive::Deserialize;
use serde_json::Value;
use std::convert::TryFrom;
use std::path::Path;
use std::time::Duration;

/// One class (or role) as written in a manifest file.
///
/// ```yaml
/// class: TestsFor::Customer
/// extends: TestsFor::Person
/// with: [Role::Database]
/// setup:
///   - skip: no database configured
///     unless_env: DATABASE_URL
/// methods:
///   - name: test_balance
///     tags: [database]
///     plan: 2
///     steps:
///       - ok: true
///       - is: [100, 100]
///         name: balance is untouched
/// ```
#[derive(Debug, Deserialize)]
pub struct ClassManifest {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub with: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub startup: Vec<StepEntry>,
    #[serde(default)]
    pub setup: Vec<StepEntry>,
    #[serde(default)]
    pub teardown: Vec<StepEntry>,
    #[serde(default)]
    pub shutdown: Vec<StepEntry>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub plan: Option<u32>,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
}

/// Raw step: exactly one action field plus optional modifiers.
#[derive(Debug, Default, Deserialize)]
pub struct StepEntry {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub is: Option<Vec<Value>>,
    #[serde(default)]
    pub isnt: Option<Vec<Value>>,
    #[serde(default)]
    pub like: Option<LikeEntry>,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub fail: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub skip: Option<String>,
    #[serde(default)]
    pub die: Option<String>,
    #[serde(default)]
    pub exec: Option<String>,
    #[serde(default, with = "crate::configuration::deserialize::optional_duration")]
    pub sleep: Option<Duration>,
    #[serde(default)]
    pub call: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub unless_env: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LikeEntry {
    pub got: String,
    #[serde(with = "serde_regex")]
    pub pattern: Regex,
}

/// A step that produces exactly one assertion.
#[derive(Debug, Clone)]
pub enum Check {
    Ok {
        value: bool,
        name: Option<String>,
    },
    Is {
        got: Value,
        expected: Value,
        name: Option<String>,
    },
    Isnt {
        got: Value,
        unexpected: Value,
        name: Option<String>,
    },
    Like {
        got: String,
        pattern: Regex,
        name: Option<String>,
    },
    Pass(String),
    Fail(String),
    Exec {
        command: String,
        status: i32,
        name: Option<String>,
    },
}

/// A step that changes control flow or has a side effect, but asserts nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Note(String),
    Skip {
        reason: String,
        unless_env: Option<String>,
    },
    Die(String),
    Sleep(Duration),
    Call(String),
}

#[derive(Debug, Clone)]
pub enum Step {
    Check(Check),
    Operation(Operation),
}

impl ClassManifest {
    pub fn from(file: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::new();
        config.merge(File::from(file))?;

        config.try_into()
    }
}

impl TryFrom<StepEntry> for Step {
    type Error = String;

    fn try_from(entry: StepEntry) -> Result<Self, Self::Error> {
        let StepEntry {
            ok,
            is,
            isnt,
            like,
            pass,
            fail,
            note,
            skip,
            die,
            exec,
            sleep,
            call,
            name,
            status,
            unless_env,
        } = entry;

        let mut actions = Vec::new();
        if let Some(value) = ok {
            actions.push(Step::Check(Check::Ok {
                value,
                name: name.clone(),
            }));
        }
        if let Some(values) = is {
            let (got, expected) = pair("is", values)?;
            actions.push(Step::Check(Check::Is {
                got,
                expected,
                name: name.clone(),
            }));
        }
        if let Some(values) = isnt {
            let (got, unexpected) = pair("isnt", values)?;
            actions.push(Step::Check(Check::Isnt {
                got,
                unexpected,
                name: name.clone(),
            }));
        }
        if let Some(LikeEntry { got, pattern }) = like {
            actions.push(Step::Check(Check::Like {
                got,
                pattern,
                name: name.clone(),
            }));
        }
        if let Some(name) = pass {
            actions.push(Step::Check(Check::Pass(name)));
        }
        if let Some(name) = fail {
            actions.push(Step::Check(Check::Fail(name)));
        }
        if let Some(command) = exec {
            actions.push(Step::Check(Check::Exec {
                command,
                status: status.unwrap_or(0),
                name: name.clone(),
            }));
        }
        if let Some(text) = note {
            actions.push(Step::Operation(Operation::Note(text)));
        }
        if let Some(reason) = skip {
            actions.push(Step::Operation(Operation::Skip {
                reason,
                unless_env: unless_env.clone(),
            }));
        }
        if let Some(message) = die {
            actions.push(Step::Operation(Operation::Die(message)));
        }
        if let Some(duration) = sleep {
            actions.push(Step::Operation(Operation::Sleep(duration)));
        }
        if let Some(helper) = call {
            actions.push(Step::Operation(Operation::Call(helper)));
        }

        match actions.len() {
            1 => Ok(actions.remove(0)),
            0 => Err("step names no action (expected one of ok, is, isnt, like, pass, fail, \
                      exec, note, skip, die, sleep, call)"
                .to_owned()),
            n => Err(format!("step names {} actions, expected exactly one", n)),
        }
    }
}

fn pair(action: &str, values: Vec<Value>) -> Result<(Value, Value), String> {
    let found = values.len();
    let mut values = values.into_iter();
    match (values.next(), values.next(), values.next()) {
        (Some(first), Some(second), None) => Ok((first, second)),
        _ => Err(format!(
            "`{}` takes exactly two values, found {}",
            action, found
        )),
    }
}
