//! Analysis sessions: one arena, one resolver, one cache of parsed files.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use oxc_allocator::Allocator;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Result;
use crate::orchestrator::ExpressionOrchestrator;
use crate::resolver::{ImportResolver, ImportSource};
use crate::source::{ImportBinding, SourceFile};

/// Recognized "definition" wrapper calls and the package they must come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperConfig {
    /// Callee names such as `defineProxyService`.
    pub names: Vec<String>,
    /// Required import source identity, e.g. `@webext-core/proxy-service`.
    pub package: String,
}

impl WrapperConfig {
    pub fn new<I, S>(names: I, package: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            package: package.into(),
        }
    }

    /// Whether `specifier` is the required package or one of its subpaths.
    pub fn accepts(&self, specifier: &str) -> bool {
        specifier == self.package
            || specifier
                .strip_prefix(self.package.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Options for one synthesis call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesizeOptions {
    /// Extract only this member's type instead of the whole interface.
    pub property: Option<String>,
    /// Wrapper calls to look through.
    pub wrappers: Option<WrapperConfig>,
}

impl SynthesizeOptions {
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_wrappers(mut self, wrappers: WrapperConfig) -> Self {
        self.wrappers = Some(wrappers);
        self
    }
}

/// State shared by every file reached from one top-level synthesis call.
///
/// Files are parsed at most once per session, keyed by path. Declarations
/// currently being resolved are tracked so circular references end instead of
/// recursing.
pub struct Session<'a> {
    allocator: &'a Allocator,
    resolver: &'a dyn ImportResolver,
    options: SynthesizeOptions,
    files: RefCell<FxHashMap<PathBuf, Rc<SourceFile<'a>>>>,
    active: RefCell<FxHashSet<(PathBuf, String)>>,
}

impl<'a> Session<'a> {
    pub fn new(
        allocator: &'a Allocator,
        resolver: &'a dyn ImportResolver,
        options: SynthesizeOptions,
    ) -> Self {
        Self {
            allocator,
            resolver,
            options,
            files: RefCell::new(FxHashMap::default()),
            active: RefCell::new(FxHashSet::default()),
        }
    }

    pub fn options(&self) -> &SynthesizeOptions {
        &self.options
    }

    pub fn resolver(&self) -> &'a dyn ImportResolver {
        self.resolver
    }

    /// Synthesize the contract of the file at `path`.
    pub fn synthesize(&self, path: impl AsRef<Path>) -> Result<Option<String>> {
        let file = self.load(path.as_ref())?;
        Ok(ExpressionOrchestrator::new(FileContext::new(self, &file)).synthesize())
    }

    /// Synthesize the contract of an in-memory source that lives at `path`.
    pub fn synthesize_source(&self, path: impl AsRef<Path>, source: &str) -> Result<Option<String>> {
        let file = self.insert_source(path.as_ref(), source)?;
        Ok(ExpressionOrchestrator::new(FileContext::new(self, &file)).synthesize())
    }

    /// Load (or fetch from the cache) the file at `path`.
    pub fn load(&self, path: &Path) -> Result<Rc<SourceFile<'a>>> {
        let path = absolute(path);
        if let Some(file) = self.files.borrow().get(&path) {
            return Ok(Rc::clone(file));
        }
        let file = Rc::new(SourceFile::read(self.allocator, &path)?);
        self.files.borrow_mut().insert(path, Rc::clone(&file));
        Ok(file)
    }

    /// Register an in-memory source, replacing any cached file at `path`.
    pub fn insert_source(&self, path: &Path, source: &str) -> Result<Rc<SourceFile<'a>>> {
        let path = absolute(path);
        let file = Rc::new(SourceFile::parse(self.allocator, path.clone(), source)?);
        self.files.borrow_mut().insert(path, Rc::clone(&file));
        Ok(file)
    }

    /// Load a file reached through an import. Failures are logged and yield `None`.
    pub(crate) fn load_import(&self, path: &Path) -> Option<Rc<SourceFile<'a>>> {
        match self.load(path) {
            Ok(file) => Some(file),
            Err(error) => {
                tracing::warn!("skipping imported module: {error}");
                None
            }
        }
    }

    /// Mark `(path, name)` as being resolved.
    ///
    /// Returns `None` when the pair is already on the active chain.
    pub(crate) fn enter(&self, path: &Path, name: &str) -> Option<ResolutionGuard<'_>> {
        let key = (path.to_path_buf(), name.to_string());
        if !self.active.borrow_mut().insert(key.clone()) {
            tracing::debug!(
                file = %path.display(),
                name = name,
                "circular reference, falling back to the written name"
            );
            return None;
        }
        Some(ResolutionGuard {
            active: &self.active,
            key,
        })
    }

    /// Number of distinct files parsed so far.
    pub fn parsed_files(&self) -> usize {
        self.files.borrow().len()
    }
}

/// Removes its `(path, name)` pair from the active set when dropped.
pub(crate) struct ResolutionGuard<'s> {
    active: &'s RefCell<FxHashSet<(PathBuf, String)>>,
    key: (PathBuf, String),
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        self.active.borrow_mut().remove(&self.key);
    }
}

/// The file an analyzer is working in, plus the session it belongs to.
#[derive(Clone, Copy)]
pub struct FileContext<'c, 'a> {
    pub session: &'c Session<'a>,
    pub file: &'c SourceFile<'a>,
}

impl<'c, 'a> FileContext<'c, 'a> {
    pub fn new(session: &'c Session<'a>, file: &'c SourceFile<'a>) -> Self {
        Self { session, file }
    }

    /// Import binding for a local name.
    pub fn import(&self, name: &str) -> Option<&'c ImportBinding> {
        self.file.imports(self.session.resolver()).get(name)
    }

    /// Load the file behind an import binding, if it points at one.
    pub(crate) fn import_target(&self, binding: &ImportBinding) -> Option<Rc<SourceFile<'a>>> {
        match &binding.source {
            ImportSource::File(path) => self.session.load_import(path),
            ImportSource::Package(_) | ImportSource::Unresolved(_) => None,
        }
    }

    pub(crate) fn enter(&self, name: &str) -> Option<ResolutionGuard<'c>> {
        self.session.enter(self.file.path(), name)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_resolve(specifier: &str, _: &Path) -> ImportSource {
        ImportSource::Unresolved(specifier.to_string())
    }

    #[test]
    fn wrapper_config_accepts_package_and_subpaths() {
        let config = WrapperConfig::new(["defineProxyService"], "@webext-core/proxy-service");
        assert!(config.accepts("@webext-core/proxy-service"));
        assert!(config.accepts("@webext-core/proxy-service/define"));
        assert!(!config.accepts("@webext-core/proxy-service-fake"));
        assert!(!config.accepts("./local"));
    }

    #[test]
    fn guard_rejects_reentry_until_dropped() {
        let allocator = Allocator::default();
        let session = Session::new(&allocator, &no_resolve, SynthesizeOptions::default());
        let path = Path::new("/virtual/a.ts");

        let guard = session.enter(path, "A").expect("first entry succeeds");
        assert!(session.enter(path, "A").is_none());
        assert!(session.enter(path, "B").is_some());
        drop(guard);
        assert!(session.enter(path, "A").is_some());
    }

    #[test]
    fn in_memory_sources_are_cached() {
        let allocator = Allocator::default();
        let session = Session::new(&allocator, &no_resolve, SynthesizeOptions::default());
        let path = Path::new("/virtual/entry.ts");
        session.insert_source(path, "export default {};").unwrap();

        assert_eq!(session.parsed_files(), 1);
        let again = session.load(path).unwrap();
        assert_eq!(again.path(), path);
        assert_eq!(session.parsed_files(), 1);
    }
}
