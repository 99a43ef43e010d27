use crate::app::context::Context;
use crate::app::hooks::{Executable, ExecutionResult, Phase};
use derivative::*;
use serde_derive::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Label attached to test methods, used only for selection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Tag(String);

pub type Tags = BTreeSet<Tag>;

/// Shared, immutable body of a hook, helper or test method.
pub type Body = Rc<dyn Executable>;

pub type Helpers = HashMap<String, Body>;

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(label: &str) -> Self {
        Tag(label.to_owned())
    }
}

impl From<String> for Tag {
    fn from(label: String) -> Self {
        Tag(label)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wraps a closure as a [`Body`].
pub fn body<F>(f: F) -> Body
where
    F: Fn(&mut Context<'_>) -> ExecutionResult + 'static,
{
    Rc::new(f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Role,
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct TestMethod {
    pub name: String,
    /// Class or role whose body is used.
    pub origin: String,
    pub tags: Tags,
    pub plan: Option<u32>,
    #[derivative(Debug = "ignore")]
    pub body: Body,
}

impl TestMethod {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> ExecutionResult + 'static,
    {
        Self::from_body(name, body(f))
    }

    pub fn from_body(name: impl Into<String>, body: Body) -> Self {
        Self {
            name: name.into(),
            origin: String::new(),
            tags: Tags::new(),
            plan: None,
            body,
        }
    }

    pub fn tagged<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn planned(mut self, plan: u32) -> Self {
        self.plan = Some(plan);
        self
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Helper {
    pub name: String,
    #[derivative(Debug = "ignore")]
    pub body: Body,
}

#[derive(Derivative, Clone, Default)]
#[derivative(Debug)]
pub struct Hooks {
    #[derivative(Debug(format_with = "fmt_hook"))]
    pub startup: Option<Body>,
    #[derivative(Debug(format_with = "fmt_hook"))]
    pub setup: Option<Body>,
    #[derivative(Debug(format_with = "fmt_hook"))]
    pub teardown: Option<Body>,
    #[derivative(Debug(format_with = "fmt_hook"))]
    pub shutdown: Option<Body>,
}

fn fmt_hook(hook: &Option<Body>, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(if hook.is_some() { "defined" } else { "-" })
}

pub(crate) fn fmt_helpers(helpers: &Helpers, f: &mut fmt::Formatter) -> fmt::Result {
    let mut names: Vec<&String> = helpers.keys().collect();
    names.sort();
    f.debug_list().entries(names).finish()
}

impl Hooks {
    pub fn get(&self, phase: Phase) -> Option<&Body> {
        match phase {
            Phase::Startup => self.startup.as_ref(),
            Phase::Setup => self.setup.as_ref(),
            Phase::Teardown => self.teardown.as_ref(),
            Phase::Shutdown => self.shutdown.as_ref(),
            Phase::Test => None,
        }
    }

    /// Bodies for [`Phase::Test`] belong to methods, so setting one here is ignored.
    pub fn set(&mut self, phase: Phase, body: Body) {
        let slot = match phase {
            Phase::Startup => &mut self.startup,
            Phase::Setup => &mut self.setup,
            Phase::Teardown => &mut self.teardown,
            Phase::Shutdown => &mut self.shutdown,
            Phase::Test => return,
        };
        *slot = Some(body);
    }

    /// Hooks defined in `other` replace ours.
    pub fn overlay(&mut self, other: &Hooks) {
        for phase in &[Phase::Startup, Phase::Setup, Phase::Teardown, Phase::Shutdown] {
            if let Some(body) = other.get(*phase) {
                self.set(*phase, body.clone());
            }
        }
    }
}

/// A class or role as registered, before composition.
#[derive(Debug, Clone)]
pub struct TestClass {
    pub name: String,
    pub kind: ClassKind,
    pub parent: Option<String>,
    pub roles: Vec<String>,
    pub is_abstract: bool,
    pub methods: Vec<TestMethod>,
    pub helpers: Vec<Helper>,
    pub hooks: Hooks,
    pub source: Option<PathBuf>,
}

impl TestClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), ClassKind::Class)
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::with_kind(name.into(), ClassKind::Role)
    }

    fn with_kind(name: String, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            parent: None,
            roles: Vec::new(),
            is_abstract: false,
            methods: Vec::new(),
            helpers: Vec::new(),
            hooks: Hooks::default(),
            source: None,
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn method(mut self, mut method: TestMethod) -> Self {
        method.origin = self.name.clone();
        self.methods.push(method);
        self
    }

    pub fn helper<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> ExecutionResult + 'static,
    {
        self.helpers.push(Helper {
            name: name.into(),
            body: body(f),
        });
        self
    }

    pub fn hook<F>(mut self, phase: Phase, f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> ExecutionResult + 'static,
    {
        self.hooks.set(phase, body(f));
        self
    }

    pub fn is_role(&self) -> bool {
        self.kind == ClassKind::Role
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_method_collects_tags_and_plan() {
        let method = TestMethod::new("test_fetch", |_ctx: &mut Context<'_>| Ok(()))
            .tagged(vec!["online", "slow"])
            .planned(3);

        assert_eq!(method.plan, Some(3));
        assert!(method.tags.contains(&Tag::from("online")));
        assert_eq!(method.tags.len(), 2);
    }

    #[test]
    fn test_class_method_records_origin() {
        let class = TestClass::new("TestsFor::Basic")
            .method(TestMethod::new("test_me", |_ctx: &mut Context<'_>| Ok(())));

        assert_eq!(class.methods[0].origin, "TestsFor::Basic");
    }

    #[test]
    fn test_overlay_replaces_only_defined_hooks() {
        let mut base = Hooks::default();
        base.set(Phase::Setup, body(|_ctx: &mut Context<'_>| Ok(())));
        base.set(Phase::Startup, body(|_ctx: &mut Context<'_>| Ok(())));
        let base_setup = base.setup.clone().unwrap();
        let mut derived = Hooks::default();
        derived.set(Phase::Startup, body(|_ctx: &mut Context<'_>| Ok(())));
        let derived_startup = derived.startup.clone().unwrap();

        base.overlay(&derived);

        assert!(Rc::ptr_eq(base.setup.as_ref().unwrap(), &base_setup));
        assert!(Rc::ptr_eq(base.startup.as_ref().unwrap(), &derived_startup));
        assert!(base.teardown.is_none());
    }

    #[test]
    fn test_test_phase_is_not_a_hook() {
        let mut hooks = Hooks::default();
        hooks.set(Phase::Test, body(|_ctx: &mut Context<'_>| Ok(())));

        assert!(hooks.get(Phase::Test).is_none());
    }
}
