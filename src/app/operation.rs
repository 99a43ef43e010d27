use crate::app::context::Context;
use crate::app::hooks::{ExecutionResult, Interrupt};
use crate::configuration::manifest::Operation;
use std::env;
use std::thread::sleep;

pub trait Performable {
    fn perform(&self, ctx: &mut Context<'_>) -> ExecutionResult;
}

impl Performable for Operation {
    fn perform(&self, ctx: &mut Context<'_>) -> ExecutionResult {
        match self {
            Operation::Note(text) => {
                info!("{}", text);
                ctx.note(text.as_str());
                Ok(())
            }
            Operation::Skip { reason, unless_env } => match unless_env {
                Some(var) if env::var_os(var).is_some() => {
                    debug!("Not skipping, {} is set", var);
                    Ok(())
                }
                _ => ctx.skip(reason.as_str()),
            },
            Operation::Die(message) => Err(Interrupt::Died(message.clone())),
            Operation::Sleep(duration) => {
                trace!("Sleeping {:?}", duration);
                sleep(*duration);
                Ok(())
            }
            Operation::Call(helper) => ctx.call(helper),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::class::Helpers;
    use crate::app::hooks::Phase;
    use std::time::Duration;

    fn perform(operation: Operation) -> (ExecutionResult, Vec<String>) {
        let helpers = Helpers::new();
        let mut ctx = Context::new("A", None, Phase::Setup, &helpers);
        let result = operation.perform(&mut ctx);
        (result, ctx.finish().1)
    }

    #[test]
    fn test_note_is_kept() {
        let (result, notes) = perform(Operation::Note("warming up".to_owned()));

        assert_eq!(result, Ok(()));
        assert_eq!(notes, vec!["warming up".to_owned()]);
    }

    #[test]
    fn test_skip_without_guard() {
        let (result, _) = perform(Operation::Skip {
            reason: "offline".to_owned(),
            unless_env: None,
        });

        assert_eq!(result, Err(Interrupt::Skip("offline".to_owned())));
    }

    #[test]
    fn test_skip_guard_set_continues() {
        env::set_var("OPERATION_TEST_SKIP_GUARD", "1");

        let (result, _) = perform(Operation::Skip {
            reason: "offline".to_owned(),
            unless_env: Some("OPERATION_TEST_SKIP_GUARD".to_owned()),
        });
        env::remove_var("OPERATION_TEST_SKIP_GUARD");

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_skip_guard_unset_skips() {
        let (result, _) = perform(Operation::Skip {
            reason: "offline".to_owned(),
            unless_env: Some("OPERATION_TEST_UNSET_GUARD".to_owned()),
        });

        assert_eq!(result, Err(Interrupt::Skip("offline".to_owned())));
    }

    #[test]
    fn test_die_and_sleep() {
        assert_eq!(
            perform(Operation::Die("boom".to_owned())).0,
            Err(Interrupt::Died("boom".to_owned()))
        );
        assert_eq!(perform(Operation::Sleep(Duration::from_millis(1))).0, Ok(()));
    }
}
