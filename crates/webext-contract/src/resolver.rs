//! Import specifier resolution.
//!
//! The synthesizer never touches module resolution rules itself. It asks an
//! [`ImportResolver`] where a specifier points and treats the answer as final.

use std::path::{Path, PathBuf};

use oxc_resolver::{ResolveOptions, Resolver};

/// Where an import specifier leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// A source file that can be loaded and analyzed.
    File(PathBuf),
    /// A package that stays opaque, identified by its specifier.
    Package(String),
    /// Resolution failed; carries the specifier as written.
    Unresolved(String),
}

/// Maps a module specifier, relative to the importing file, to an [`ImportSource`].
pub trait ImportResolver {
    fn resolve(&self, specifier: &str, importer: &Path) -> ImportSource;
}

impl<F> ImportResolver for F
where
    F: Fn(&str, &Path) -> ImportSource,
{
    fn resolve(&self, specifier: &str, importer: &Path) -> ImportSource {
        self(specifier, importer)
    }
}

/// Extensions tried, in order, for extensionless specifiers.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".mts", ".cts", ".d.ts", ".js", ".jsx", ".mjs", ".cjs",
];

/// Filesystem resolver built on `oxc_resolver`.
///
/// Relative and absolute specifiers, plus anything matching a configured alias
/// prefix, resolve to files. Bare specifiers are packages and are never
/// followed.
pub struct FsImportResolver {
    resolver: Resolver,
    aliases: Vec<(String, PathBuf)>,
}

impl FsImportResolver {
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()))
    }

    /// Create a resolver trying the given extensions in order.
    pub fn with_extensions(extensions: impl IntoIterator<Item = String>) -> Self {
        let options = ResolveOptions {
            extensions: extensions.into_iter().collect(),
            extension_alias: vec![
                (
                    ".js".to_string(),
                    vec![".ts".to_string(), ".tsx".to_string(), ".js".to_string()],
                ),
                (
                    ".mjs".to_string(),
                    vec![".mts".to_string(), ".mjs".to_string()],
                ),
            ],
            ..ResolveOptions::default()
        };
        Self {
            resolver: Resolver::new(options),
            aliases: Vec::new(),
        }
    }

    /// Add path aliases such as `@/` -> `/project/src/`.
    ///
    /// Longer prefixes are tried first.
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        self.aliases.extend(aliases);
        self.aliases
            .sort_by(|(left, _), (right, _)| right.len().cmp(&left.len()));
        self
    }

    fn expand_alias(&self, specifier: &str) -> Option<String> {
        self.aliases.iter().find_map(|(prefix, target)| {
            let rest = specifier.strip_prefix(prefix.as_str())?;
            let rest = rest.trim_start_matches('/');
            let expanded = if rest.is_empty() {
                target.clone()
            } else {
                target.join(rest)
            };
            Some(expanded.to_string_lossy().into_owned())
        })
    }
}

impl Default for FsImportResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportResolver for FsImportResolver {
    fn resolve(&self, specifier: &str, importer: &Path) -> ImportSource {
        let expanded = self.expand_alias(specifier);
        let request = expanded.as_deref().unwrap_or(specifier);

        if expanded.is_none() && is_bare_specifier(request) {
            return ImportSource::Package(specifier.to_string());
        }

        let directory = importer.parent().unwrap_or_else(|| Path::new("."));
        match self.resolver.resolve(directory, request) {
            Ok(resolution) => ImportSource::File(resolution.path().to_path_buf()),
            Err(error) => {
                tracing::debug!(
                    specifier = specifier,
                    importer = %importer.display(),
                    "import did not resolve: {error}"
                );
                ImportSource::Unresolved(specifier.to_string())
            }
        }
    }
}

/// A specifier that names a package rather than a path.
pub fn is_bare_specifier(specifier: &str) -> bool {
    !(specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || specifier.starts_with('/')
        || Path::new(specifier).is_absolute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn bare_specifiers_are_packages() {
        let resolver = FsImportResolver::new();
        let source = resolver.resolve("@webext-core/proxy-service", Path::new("/tmp/a.ts"));
        assert_eq!(
            source,
            ImportSource::Package("@webext-core/proxy-service".to_string())
        );
    }

    #[test]
    fn resolves_relative_typescript_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("types.ts"), "export type A = string;").unwrap();
        let importer = dir.path().join("index.ts");
        fs::write(&importer, "").unwrap();

        let resolver = FsImportResolver::new();
        match resolver.resolve("./types", &importer) {
            ImportSource::File(path) => assert!(path.ends_with("types.ts")),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn missing_relative_file_is_unresolved() {
        let dir = TempDir::new().unwrap();
        let resolver = FsImportResolver::new();
        let source = resolver.resolve("./missing", &dir.path().join("index.ts"));
        assert_eq!(source, ImportSource::Unresolved("./missing".to_string()));
    }

    #[test]
    fn aliases_resolve_through_the_filesystem() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/utils")).unwrap();
        fs::write(dir.path().join("src/utils/types.ts"), "export type A = 1;").unwrap();

        let resolver = FsImportResolver::new()
            .with_aliases([("@/".to_string(), dir.path().join("src"))]);
        match resolver.resolve("@/utils/types", &dir.path().join("entry.ts")) {
            ImportSource::File(path) => assert!(path.ends_with("src/utils/types.ts")),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |specifier: &str, _: &Path| ImportSource::Package(specifier.to_uppercase());
        assert_eq!(
            resolver.resolve("abc", Path::new("x.ts")),
            ImportSource::Package("ABC".to_string())
        );
    }
}
