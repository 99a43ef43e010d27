use crate::app::selection::RunSpec;
use crate::configuration::constants::lifecycle::NO_METHODS_SELECTED;
use std::io::{self, Write};

/// Prints what a run would execute, one class per line and its methods indented.
pub fn render_listing(spec: &RunSpec, out: &mut dyn Write) -> io::Result<()> {
    for planned in &spec.classes {
        let class = &planned.class;
        if planned.is_empty() {
            writeln!(out, "{} ({})", class.name, NO_METHODS_SELECTED)?;
            continue;
        }
        writeln!(out, "{}", class.name)?;
        for method in &class.methods {
            write!(out, "    {}", method.name)?;
            if !method.tags.is_empty() {
                let tags: Vec<&str> = method.tags.iter().map(|t| t.as_str()).collect();
                write!(out, " [{}]", tags.join(", "))?;
            }
            if let Some(plan) = method.plan {
                write!(out, " (plan {})", plan)?;
            }
            if method.origin != class.name {
                write!(out, " from {}", method.origin)?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::class::{TestClass, TestMethod};
    use crate::app::composition::Resolver;
    use crate::app::context::Context;
    use crate::app::registry::Registry;
    use crate::app::selection::{select, Criteria};
    use crate::configuration::settings::ConflictPolicy;

    #[test]
    fn test_lists_methods_with_tags_and_origin() {
        let mut registry = Registry::new("test_");
        registry
            .register(
                TestClass::new("Base").method(
                    TestMethod::new("test_base", |_ctx: &mut Context<'_>| Ok(()))
                        .tagged(vec!["slow", "db"])
                        .planned(2),
                ),
            )
            .unwrap();
        registry
            .register(
                TestClass::new("Child")
                    .extends("Base")
                    .method(TestMethod::new("test_child", |_ctx: &mut Context<'_>| Ok(()))),
            )
            .unwrap();
        let spec = select(
            &registry,
            &Resolver::new(&registry, ConflictPolicy::Fail),
            Criteria::default(),
        )
        .unwrap();
        let mut out = Vec::new();

        render_listing(&spec, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Base
    test_base [db, slow] (plan 2)
Child
    test_base [db, slow] (plan 2) from Base
    test_child
"
        );
    }
}
