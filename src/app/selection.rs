use crate::app::class::{Tags, TestClass, TestMethod};
use crate::app::composition::{ResolvedClass, Resolver};
use crate::app::registry::Registry;
use crate::error::{Error, Result};
use regex::Regex;

/// What the caller asked to run.
#[derive(Debug, Clone, Default, Builder)]
#[builder(default)]
pub struct Criteria {
    /// Explicit class list; empty means every runnable class.
    #[builder(setter(into))]
    pub classes: Vec<String>,
    pub include_tags: Tags,
    pub exclude_tags: Tags,
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
}

impl Criteria {
    pub fn admits(&self, method: &TestMethod) -> bool {
        method.tags.is_disjoint(&self.exclude_tags)
            && (self.include_tags.is_empty() || !method.tags.is_disjoint(&self.include_tags))
            && self
                .include
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(&method.name))
            && self
                .exclude
                .as_ref()
                .map_or(true, |pattern| !pattern.is_match(&method.name))
    }
}

/// One class of a [`RunSpec`] with only its selected methods left.
#[derive(Debug, Clone)]
pub struct PlannedClass {
    pub class: ResolvedClass,
    /// Effective methods dropped by the criteria.
    pub filtered_out: usize,
}

impl PlannedClass {
    pub fn is_empty(&self) -> bool {
        self.class.methods.is_empty()
    }
}

/// The resolved request: which classes run, in order, with which methods.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub classes: Vec<PlannedClass>,
    pub criteria: Criteria,
}

impl RunSpec {
    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.class.methods.len()).sum()
    }

    pub fn class(&self, name: &str) -> Option<&PlannedClass> {
        self.classes.iter().find(|c| c.class.name == name)
    }
}

pub fn select(registry: &Registry, resolver: &Resolver<'_>, criteria: Criteria) -> Result<RunSpec> {
    let candidates: Vec<&TestClass> = if criteria.classes.is_empty() {
        registry.runnable().collect()
    } else {
        let unknown: Vec<String> = criteria
            .classes
            .iter()
            .filter(|name| registry.get(name).map_or(true, TestClass::is_role))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(Error::UnknownClass(unknown));
        }
        registry
            .classes()
            .filter(|class| criteria.classes.contains(&class.name))
            .collect()
    };

    let mut classes = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut class = resolver.resolve(&candidate.name)?;
        let before = class.methods.len();
        class.methods.retain(|method| criteria.admits(method));
        let filtered_out = before - class.methods.len();
        if class.methods.is_empty() {
            debug!("No methods of {} selected", class.name);
        }
        classes.push(PlannedClass {
            class,
            filtered_out,
        });
    }

    let spec = RunSpec { classes, criteria };
    info!(
        "Selected {} methods in {} classes",
        spec.method_count(),
        spec.classes.len()
    );
    Ok(spec)
}
