pub(crate) mod assert;
pub mod class;
pub mod composition;
pub mod context;
pub mod executor;
pub mod hooks;
pub(crate) mod operation;
pub mod registry;
pub mod report;
pub mod script;
pub mod selection;

use crate::app::composition::Resolver;
use crate::app::executor::Executor;
use crate::app::registry::{Registry, WalkDirSource};
use crate::app::report::ExecutionReport;
use crate::app::selection::{select, RunSpec};
use crate::configuration::settings::Settings;
use crate::error::Result;

pub use self::class::{TestClass, TestMethod};
pub use self::context::Context;
pub use self::hooks::{Executable, ExecutionResult, Interrupt, Phase};

/// Discovery, selection and execution wired together for one invocation.
#[derive(Debug)]
pub struct App {
    settings: Settings,
    registry: Registry,
}

impl App {
    /// Discovers every class under `settings.root`.
    pub fn new(settings: Settings) -> Result<Self> {
        let source = WalkDirSource::new(settings.extensions.iter().cloned());
        let registry = Registry::discover(&settings.root, &source, &settings.method_prefix)?;
        Ok(Self { settings, registry })
    }

    /// Uses classes registered from code instead of discovering them.
    pub fn with_registry(settings: Settings, registry: Registry) -> Self {
        Self { settings, registry }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolves and filters, without running anything.
    pub fn plan(&self) -> Result<RunSpec> {
        let resolver = Resolver::new(&self.registry, self.settings.role_conflicts);
        select(&self.registry, &resolver, self.settings.criteria()?)
    }

    pub fn execute(&self, spec: &RunSpec) -> ExecutionReport {
        Executor::default().run(spec)
    }

    pub fn run(&self) -> Result<ExecutionReport> {
        let spec = self.plan()?;
        Ok(self.execute(&spec))
    }
}
