use crate::app::class::{fmt_helpers, Helpers, Hooks, Tags, TestClass, TestMethod};
use crate::app::registry::Registry;
use crate::configuration::settings::ConflictPolicy;
use crate::error::{Error, Result};
use derivative::*;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// A class after its roles and ancestors were merged in.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ResolvedClass {
    pub name: String,
    pub methods: Vec<TestMethod>,
    #[derivative(Debug(format_with = "fmt_helpers"))]
    pub helpers: Helpers,
    pub hooks: Hooks,
    pub source: Option<PathBuf>,
}

impl ResolvedClass {
    pub fn method(&self, name: &str) -> Option<&TestMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

pub struct Resolver<'r> {
    registry: &'r Registry,
    policy: ConflictPolicy,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry, policy: ConflictPolicy) -> Self {
        Self { registry, policy }
    }

    /// Effective methods, hooks and helpers of `name`.
    ///
    /// Layers are applied roles first (those of the furthest ancestor first,
    /// each role preceded by its own roles), then ancestors from the furthest,
    /// then the class itself.
    pub fn resolve(&self, name: &str) -> Result<ResolvedClass> {
        let class = self
            .registry
            .get(name)
            .ok_or_else(|| Error::UnknownClass(vec![name.to_owned()]))?;
        let lineage = self.lineage(class)?;

        let mut roles = Vec::new();
        let mut consumed = HashMap::new();
        for layer in &lineage {
            for role in &layer.roles {
                let stack = &mut Vec::new();
                self.collect_roles(&layer.name, role, stack, &mut consumed, &mut roles)?;
            }
        }

        let none = HashSet::new();
        let mut merge = Merge::default();
        for layer in roles.iter().chain(lineage.iter()) {
            merge.apply(layer, consumed.get(&layer.name).unwrap_or(&none));
        }
        let resolved = merge.finish(class, self.policy)?;
        debug!(
            "Resolved {} with {} methods from {} roles and {} classes",
            resolved.name,
            resolved.methods.len(),
            roles.len(),
            lineage.len()
        );
        Ok(resolved)
    }

    /// `class` and its ancestors, furthest ancestor first.
    fn lineage(&self, class: &'r TestClass) -> Result<Vec<&'r TestClass>> {
        let mut chain = vec![class];
        let mut current = class;
        while let Some(parent) = &current.parent {
            if chain.iter().any(|c| &c.name == parent) {
                return Err(Error::InheritanceCycle(parent.clone()));
            }
            current = match self.registry.get(parent) {
                Some(next) if !next.is_role() => next,
                _ => {
                    return Err(Error::UnresolvedReference {
                        class: current.name.clone(),
                        kind: "parent class",
                        name: parent.clone(),
                    })
                }
            };
            chain.push(current);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Flattens `name` into `out` after its own roles. `consumed` maps every
    /// collected role to the roles it pulls in, directly or transitively.
    fn collect_roles(
        &self,
        owner: &str,
        name: &str,
        stack: &mut Vec<String>,
        consumed: &mut HashMap<String, HashSet<String>>,
        out: &mut Vec<&'r TestClass>,
    ) -> Result<()> {
        if stack.iter().any(|n| n == name) {
            return Err(Error::InheritanceCycle(name.to_owned()));
        }
        if consumed.contains_key(name) {
            return Ok(());
        }
        let role = match self.registry.get(name) {
            Some(role) if role.is_role() => role,
            _ => {
                return Err(Error::UnresolvedReference {
                    class: owner.to_owned(),
                    kind: "role",
                    name: name.to_owned(),
                })
            }
        };

        stack.push(name.to_owned());
        let mut pulled = HashSet::new();
        for inner in &role.roles {
            self.collect_roles(&role.name, inner, stack, consumed, out)?;
            pulled.insert(inner.clone());
            if let Some(nested) = consumed.get(inner) {
                pulled.extend(nested.iter().cloned());
            }
        }
        stack.pop();

        consumed.insert(name.to_owned(), pulled);
        out.push(role);
        Ok(())
    }
}

struct Slot {
    method: TestMethod,
    /// Tag sets contributed by each role defining this name.
    from_roles: Vec<(String, Tags)>,
    /// Defined by an ancestor or the class itself.
    overridden: bool,
}

#[derive(Default)]
struct Merge {
    order: Vec<String>,
    slots: HashMap<String, Slot>,
    helpers: Helpers,
    hooks: Hooks,
}

impl Merge {
    /// `consumes` holds the roles `layer` pulls in; its own methods replace theirs.
    fn apply(&mut self, layer: &TestClass, consumes: &HashSet<String>) {
        let from_role = layer.is_role();
        for method in &layer.methods {
            match self.slots.get_mut(&method.name) {
                Some(slot) => {
                    let mut tags = slot.method.tags.clone();
                    tags.extend(method.tags.iter().cloned());
                    slot.method = TestMethod {
                        tags,
                        ..method.clone()
                    };
                    if from_role {
                        slot.from_roles.retain(|(role, _)| !consumes.contains(role));
                        slot.from_roles.push((layer.name.clone(), method.tags.clone()));
                    } else {
                        slot.overridden = true;
                    }
                }
                None => {
                    self.order.push(method.name.clone());
                    self.slots.insert(
                        method.name.clone(),
                        Slot {
                            method: method.clone(),
                            from_roles: if from_role {
                                vec![(layer.name.clone(), method.tags.clone())]
                            } else {
                                Vec::new()
                            },
                            overridden: !from_role,
                        },
                    );
                }
            }
        }
        for helper in &layer.helpers {
            self.helpers.insert(helper.name.clone(), helper.body.clone());
        }
        self.hooks.overlay(&layer.hooks);
    }

    fn finish(mut self, class: &TestClass, policy: ConflictPolicy) -> Result<ResolvedClass> {
        let mut methods = Vec::with_capacity(self.order.len());
        for name in &self.order {
            let slot = match self.slots.remove(name) {
                Some(slot) => slot,
                None => continue,
            };
            if !slot.overridden && slot.from_roles.len() > 1 {
                let first = &slot.from_roles[0].1;
                if slot.from_roles.iter().any(|(_, tags)| tags != first) {
                    let roles: Vec<String> =
                        slot.from_roles.iter().map(|(role, _)| role.clone()).collect();
                    match policy {
                        ConflictPolicy::Fail => {
                            return Err(Error::CompositionConflict {
                                class: class.name.clone(),
                                method: name.clone(),
                                roles,
                            })
                        }
                        ConflictPolicy::Union => warn!(
                            "{}: merging '{}' from roles {:?} with unioned tags",
                            class.name, name, roles
                        ),
                    }
                }
            }
            methods.push(slot.method);
        }
        Ok(ResolvedClass {
            name: class.name.clone(),
            methods,
            helpers: self.helpers,
            hooks: self.hooks,
            source: class.source.clone(),
        })
    }
}
