use crate::app::context::Context;
use serde_derive::Serialize;
use std::fmt;

/// Where in the class lifecycle a body is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Startup,
    Setup,
    Test,
    Teardown,
    Shutdown,
}

impl Phase {
    /// Skipping is only meaningful before the work it would skip has begun.
    pub fn allows_skip(self) -> bool {
        matches!(self, Phase::Startup | Phase::Setup)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Startup => "startup",
            Phase::Setup => "setup",
            Phase::Test => "test",
            Phase::Teardown => "teardown",
            Phase::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Early exit from a hook or method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// Voluntary, reason-carrying skip.
    Skip(String),
    /// The body raised; the rest of the phase does not run.
    Died(String),
}

pub type ExecutionResult = Result<(), Interrupt>;

/// Anything that can serve as a hook, helper or test method body.
pub trait Executable {
    fn execute(&self, ctx: &mut Context<'_>) -> ExecutionResult;
}

impl<F> Executable for F
where
    F: Fn(&mut Context<'_>) -> ExecutionResult,
{
    fn execute(&self, ctx: &mut Context<'_>) -> ExecutionResult {
        self(ctx)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_only_startup_and_setup_allow_skip() {
        assert!(Phase::Startup.allows_skip());
        assert!(Phase::Setup.allows_skip());
        assert!(!Phase::Test.allows_skip());
        assert!(!Phase::Teardown.allows_skip());
        assert!(!Phase::Shutdown.allows_skip());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Teardown.to_string(), "teardown");
    }
}
