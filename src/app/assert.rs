use crate::app::context::Context;
use crate::configuration::manifest::Check;
use std::process::Command;

pub trait Assertable {
    /// Records exactly one assertion on `ctx` and returns whether it passed.
    fn assert(&self, ctx: &mut Context<'_>) -> bool;
}

impl Assertable for Check {
    fn assert(&self, ctx: &mut Context<'_>) -> bool {
        trace!("Assertion {:?}", self);
        match self {
            Check::Ok { value, name } => ctx.ok(*value, label(name, || "ok".to_owned())),
            Check::Is {
                got,
                expected,
                name,
            } => ctx.record(
                got == expected,
                label(name, || format!("{} is {}", got, expected)),
                Some(format!("     got: {}\nexpected: {}", got, expected)),
            ),
            Check::Isnt {
                got,
                unexpected,
                name,
            } => ctx.record(
                got != unexpected,
                label(name, || format!("{} isn't {}", got, unexpected)),
                Some(format!("     got: {}\nexpected: anything else", got)),
            ),
            Check::Like { got, pattern, name } => ctx.like(
                got,
                pattern,
                label(name, || format!("{:?} matches '{}'", got, pattern)),
            ),
            Check::Pass(name) => ctx.pass(name.as_str()),
            Check::Fail(name) => ctx.fail(name.as_str()),
            Check::Exec {
                command,
                status,
                name,
            } => {
                let name = label(name, || format!("`{}` exits with {}", command, status));
                debug!("Running `{}`", command);
                match Command::new("sh").arg("-c").arg(command).output() {
                    Ok(output) => {
                        let code = output.status.code();
                        let diagnostic = format!(
                            "expected status {}, got {}\nstdout: {}\nstderr: {}",
                            status,
                            code.map_or_else(|| "a signal".to_owned(), |c| c.to_string()),
                            String::from_utf8_lossy(&output.stdout).trim_end(),
                            String::from_utf8_lossy(&output.stderr).trim_end(),
                        );
                        ctx.record(code == Some(*status), name, Some(diagnostic))
                    }
                    Err(e) => {
                        error!("Cannot run `{}`: {}", command, e);
                        ctx.record(false, name, Some(format!("cannot run command: {}", e)))
                    }
                }
            }
        }
    }
}

fn label(name: &Option<String>, default: impl FnOnce() -> String) -> String {
    name.clone().unwrap_or_else(default)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::class::Helpers;
    use crate::app::hooks::Phase;
    use regex::Regex;
    use serde_json::json;

    fn assert_with(check: Check) -> (bool, Option<String>, String) {
        let helpers = Helpers::new();
        let mut ctx = Context::new("A", Some("test_a"), Phase::Test, &helpers);
        let passed = check.assert(&mut ctx);
        let (mut assertions, _) = ctx.finish();
        let assertion = assertions.remove(0);
        (passed, assertion.diagnostic, assertion.name)
    }

    #[test]
    fn test_is_compares_json_values() {
        let (passed, _, name) = assert_with(Check::Is {
            got: json!({"a": [1, 2]}),
            expected: json!({"a": [1, 2]}),
            name: None,
        });

        assert!(passed);
        assert_eq!(name, r#"{"a":[1,2]} is {"a":[1,2]}"#);
    }

    #[test]
    fn test_is_mismatch_has_diagnostic() {
        let (passed, diagnostic, name) = assert_with(Check::Is {
            got: json!(1),
            expected: json!("1"),
            name: Some("types differ".to_owned()),
        });

        assert!(!passed);
        assert_eq!(name, "types differ");
        assert_eq!(diagnostic.unwrap(), "     got: 1\nexpected: \"1\"");
    }

    #[test]
    fn test_isnt_passes_on_different_values() {
        let (passed, _, _) = assert_with(Check::Isnt {
            got: json!(1),
            unexpected: json!(2),
            name: None,
        });

        assert!(passed);
    }

    #[test]
    fn test_like_uses_regex() {
        let (passed, _, _) = assert_with(Check::Like {
            got: "release-1.2".to_owned(),
            pattern: Regex::new(r"^release-\d").unwrap(),
            name: None,
        });

        assert!(passed);
    }

    #[test]
    fn test_exec_checks_exit_status() {
        let (passed, _, _) = assert_with(Check::Exec {
            command: "exit 3".to_owned(),
            status: 3,
            name: None,
        });
        let (failed, diagnostic, _) = assert_with(Check::Exec {
            command: "echo hello; exit 1".to_owned(),
            status: 0,
            name: Some("clean exit".to_owned()),
        });

        assert!(passed);
        assert!(!failed);
        assert!(diagnostic.unwrap().contains("stdout: hello"));
    }
}
