use crate::app::class::{ClassKind, Helper, TestClass, TestMethod};
use crate::app::hooks::Phase;
use crate::app::script::Script;
use crate::configuration::constants::common::SETTINGS_FILE_NAME;
use crate::configuration::constants::lifecycle::RESERVED_METHOD_NAMES;
use crate::configuration::manifest::{ClassManifest, MethodEntry};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use walkdir::WalkDir;

/// Enumerates candidate class files below a root directory.
pub trait FileSource {
    fn files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Walks the directory tree, following links, in file name order. Settings
/// files (`classtest.*`) share the manifest extensions and are left out.
#[derive(Debug, Clone)]
pub struct WalkDirSource {
    extensions: Vec<String>,
}

impl WalkDirSource {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    fn accepts(&self, extension: Option<&OsStr>) -> bool {
        extension
            .and_then(OsStr::to_str)
            .map_or(false, |ext| self.extensions.iter().any(|e| e == ext))
    }
}

impl FileSource for WalkDirSource {
    fn files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file()
                && self.accepts(path.extension())
                && path.file_stem() != Some(OsStr::new(SETTINGS_FILE_NAME))
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Every class and role known to a run, keyed (and therefore ordered) by name.
#[derive(Debug)]
pub struct Registry {
    classes: BTreeMap<String, TestClass>,
    method_prefix: String,
}

impl Registry {
    pub fn new(method_prefix: impl Into<String>) -> Self {
        Self {
            classes: BTreeMap::new(),
            method_prefix: method_prefix.into(),
        }
    }

    /// Loads every candidate file under `root`. Nothing is executed.
    pub fn discover(root: &Path, source: &dyn FileSource, method_prefix: &str) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::discovery(root.display(), "not a directory"));
        }
        let mut registry = Self::new(method_prefix);
        let files = source.files(root)?;
        info!(
            "Found {} candidate class files under {}",
            files.len(),
            root.display()
        );
        for path in files {
            let class = registry.load_file(&path)?;
            registry.register(class)?;
        }
        info!("Registered {} classes and roles", registry.len());
        Ok(registry)
    }

    /// Parses one manifest into a class definition without registering it.
    pub fn load_file(&self, path: &Path) -> Result<TestClass> {
        debug!("Loading {}", path.display());
        let origin = path.display();
        let manifest = ClassManifest::from(path).map_err(|e| Error::discovery(&origin, e))?;

        let mut class = match (manifest.class, manifest.role) {
            (Some(name), None) => TestClass::new(name),
            (None, Some(name)) => TestClass::role(name),
            (Some(_), Some(_)) => {
                return Err(Error::discovery(&origin, "declares both `class` and `role`"))
            }
            (None, None) => {
                return Err(Error::discovery(&origin, "declares neither `class` nor `role`"))
            }
        };
        class.parent = manifest.extends;
        class.roles = manifest.with;
        class.is_abstract = manifest.is_abstract;
        class.source = Some(path.to_path_buf());

        let hooks = vec![
            (Phase::Startup, manifest.startup),
            (Phase::Setup, manifest.setup),
            (Phase::Teardown, manifest.teardown),
            (Phase::Shutdown, manifest.shutdown),
        ];
        for (phase, entries) in hooks {
            if entries.is_empty() {
                continue;
            }
            let script = Script::parse(entries)
                .map_err(|e| Error::discovery(&origin, format!("{} hook, {}", phase, e)))?;
            class.hooks.set(phase, Rc::new(script));
        }

        for MethodEntry {
            name,
            tags,
            plan,
            steps,
        } in manifest.methods
        {
            let script = Script::parse(steps)
                .map_err(|e| Error::discovery(&origin, format!("method '{}', {}", name, e)))?;
            if name.starts_with(&self.method_prefix) {
                let mut method = TestMethod::from_body(name, Rc::new(script)).tagged(tags);
                method.plan = plan;
                class = class.method(method);
            } else if !tags.is_empty() || plan.is_some() {
                return Err(Error::discovery(
                    &origin,
                    format!("helper '{}' cannot carry tags or a plan", name),
                ));
            } else {
                class.helpers.push(Helper {
                    name,
                    body: Rc::new(script),
                });
            }
        }
        Ok(class)
    }

    pub fn register(&mut self, mut class: TestClass) -> Result<()> {
        let origin = class
            .source
            .as_ref()
            .map_or_else(|| class.name.clone(), |path| path.display().to_string());
        self.validate(&class)
            .map_err(|reason| Error::discovery(&origin, reason))?;

        if let Some(existing) = self.classes.get(&class.name) {
            let previous = existing
                .source
                .as_ref()
                .map_or_else(|| "code".to_owned(), |path| path.display().to_string());
            return Err(Error::discovery(
                origin,
                format!("'{}' is already declared in {}", class.name, previous),
            ));
        }

        for method in class.methods.iter_mut().filter(|m| m.origin.is_empty()) {
            method.origin = class.name.clone();
        }
        trace!("Registered {:?}", class);
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    fn validate(&self, class: &TestClass) -> std::result::Result<(), String> {
        if class.name.trim().is_empty() {
            return Err("class name is empty".to_owned());
        }
        if class.kind == ClassKind::Role {
            if class.parent.is_some() {
                return Err(format!("role '{}' cannot extend a class", class.name));
            }
            if class.is_abstract {
                return Err(format!("role '{}' cannot be abstract", class.name));
            }
        }

        let mut names = HashSet::new();
        for method in &class.methods {
            if !method.name.starts_with(&self.method_prefix) {
                return Err(format!(
                    "test method '{}' does not start with '{}'",
                    method.name, self.method_prefix
                ));
            }
            if RESERVED_METHOD_NAMES.contains(&method.name.as_str()) {
                return Err(format!(
                    "'{}' is reserved for a lifecycle hook",
                    method.name
                ));
            }
            if !names.insert(method.name.as_str()) {
                return Err(format!("method '{}' is declared twice", method.name));
            }
        }
        for helper in &class.helpers {
            if helper.name.trim().is_empty() {
                return Err("method name is empty".to_owned());
            }
            if helper.name.starts_with(&self.method_prefix) {
                return Err(format!(
                    "helper '{}' uses the test method prefix '{}'",
                    helper.name, self.method_prefix
                ));
            }
            if !names.insert(helper.name.as_str()) {
                return Err(format!("method '{}' is declared twice", helper.name));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TestClass> {
        self.classes.get(name)
    }

    /// Classes and roles in name order.
    pub fn classes(&self) -> impl Iterator<Item = &TestClass> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn method_prefix(&self) -> &str {
        &self.method_prefix
    }

    /// A class with no test methods of its own that others extend.
    pub fn is_base(&self, name: &str) -> bool {
        self.get(name).map_or(false, |class| class.methods.is_empty())
            && self
                .classes
                .values()
                .any(|class| class.parent.as_deref() == Some(name))
    }

    /// Classes that run when no explicit class list is given.
    pub fn runnable(&self) -> impl Iterator<Item = &TestClass> {
        self.classes
            .values()
            .filter(move |class| {
                !class.is_role() && !class.is_abstract && !self.is_base(&class.name)
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::context::Context;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn discover(dir: &Path) -> Result<Registry> {
        Registry::discover(dir, &WalkDirSource::new(vec!["yaml", "toml"]), "test_")
    }

    fn noop(name: &str) -> TestMethod {
        TestMethod::new(name, |_ctx: &mut Context<'_>| Ok(()))
    }

    #[test]
    fn test_walk_filters_extensions_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.yaml", "");
        write(dir.path(), "a/c.toml", "");
        write(dir.path(), "notes.txt", "");
        write(dir.path(), "classtest.toml", "statistics = true\n");

        let files = WalkDirSource::new(vec!["yaml", "toml"])
            .files(dir.path())
            .unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a/c.toml"), dir.path().join("b.yaml")]
        );
    }

    #[test]
    fn test_discovers_classes_and_helpers() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Basic.yaml",
            r#"
class: TestsFor::Basic
methods:
  - name: test_me
    tags: [online]
    steps:
      - call: connect
  - name: connect
    steps:
      - pass: connected
"#,
        );

        let registry = discover(dir.path()).unwrap();
        let class = registry.get("TestsFor::Basic").unwrap();

        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].origin, "TestsFor::Basic");
        assert_eq!(class.helpers[0].name, "connect");
        assert_eq!(class.source, Some(dir.path().join("Basic.yaml")));
    }

    #[test]
    fn test_malformed_file_is_a_discovery_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Broken.yaml", "class: [oops");

        match discover(dir.path()) {
            Err(Error::Discovery { origin, .. }) => assert!(origin.ends_with("Broken.yaml")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_class_and_role_together_are_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Both.yaml", "class: A\nrole: B\n");

        match discover(dir.path()) {
            Err(Error::Discovery { reason, .. }) => assert!(reason.contains("both")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_helper_with_tags_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "A.yaml",
            "class: A\nmethods:\n  - name: connect\n    tags: [db]\n",
        );

        assert!(matches!(discover(dir.path()), Err(Error::Discovery { .. })));
    }

    #[test]
    fn test_duplicate_class_across_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "one.yaml", "class: A\n");
        write(dir.path(), "two.yaml", "class: A\n");

        match discover(dir.path()) {
            Err(Error::Discovery { reason, .. }) => assert!(reason.contains("already declared")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            discover(&dir.path().join("absent")),
            Err(Error::Discovery { .. })
        ));
    }

    #[test]
    fn test_register_rejects_reserved_and_duplicate_names() {
        let mut registry = Registry::new("test_");

        let reserved = registry.register(TestClass::new("A").method(noop("test_setup")));
        let twice = registry.register(
            TestClass::new("B")
                .method(noop("test_x"))
                .method(noop("test_x")),
        );
        let prefix = registry.register(TestClass::new("C").method(noop("check_x")));

        assert!(matches!(reserved, Err(Error::Discovery { .. })));
        assert!(matches!(twice, Err(Error::Discovery { .. })));
        assert!(matches!(prefix, Err(Error::Discovery { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_role_cannot_extend() {
        let mut registry = Registry::new("test_");

        let result = registry.register(TestClass::role("Role::A").extends("Base"));

        assert!(matches!(result, Err(Error::Discovery { .. })));
    }

    #[test]
    fn test_runnable_excludes_bases_roles_and_abstract() {
        let mut registry = Registry::new("test_");
        registry.register(TestClass::new("Base")).unwrap();
        registry
            .register(TestClass::new("Derived").extends("Base").method(noop("test_a")))
            .unwrap();
        registry
            .register(TestClass::new("Template").abstract_class().method(noop("test_b")))
            .unwrap();
        registry
            .register(TestClass::role("Role::R").method(noop("test_c")))
            .unwrap();
        registry.register(TestClass::new("Empty")).unwrap();

        let runnable: Vec<&str> = registry.runnable().map(|c| c.name.as_str()).collect();

        assert!(registry.is_base("Base"));
        assert_eq!(runnable, vec!["Derived", "Empty"]);
    }
}
