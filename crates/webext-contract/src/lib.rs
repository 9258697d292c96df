#![deny(clippy::all)]

//! Static interface synthesis for browser-extension entrypoint modules.
//!
//! Given a source file whose default export is a factory function, an object
//! literal or a class, this crate determines the shape of the exported value
//! without running any code and renders it as a TypeScript-like contract:
//!
//! ```text
//! { bar: string; getBar(): string; setBar(bar: any): void; }
//! ```
//!
//! Parsing is done with OXC. Imports are followed through an
//! [`ImportResolver`], with every file parsed at most once per [`Session`].
//! Anything the analysis does not understand degrades to "no type determined"
//! (`Ok(None)`); only an unreadable or unparsable entry file is an error.

mod class;
pub mod error;
mod factory;
mod finder;
mod infer;
pub mod jsdoc;
pub mod model;
mod object;
mod orchestrator;
pub mod resolver;
mod session;
mod shape;
mod signature;
pub mod source;
mod types;

use std::path::Path;

use oxc_allocator::Allocator;

pub use error::{ContractError, Result};
pub use model::{render_members, MemberMap, MemberSignature, MethodSignature, Parameter, PropertySignature};
pub use orchestrator::ExpressionOrchestrator;
pub use resolver::{FsImportResolver, ImportResolver, ImportSource, DEFAULT_EXTENSIONS};
pub use session::{FileContext, Session, SynthesizeOptions, WrapperConfig};
pub use source::SourceFile;

/// Synthesize the contract of the file at `path`.
///
/// Returns `Ok(None)` when no type can be determined.
pub fn synthesize(
    path: impl AsRef<Path>,
    options: &SynthesizeOptions,
    resolver: &dyn ImportResolver,
) -> Result<Option<String>> {
    let allocator = Allocator::default();
    let session = Session::new(&allocator, resolver, options.clone());
    session.synthesize(path)
}

/// Like [`synthesize`], for source text that is not (or not yet) on disk.
///
/// Relative imports are resolved against `path`.
pub fn synthesize_source(
    path: impl AsRef<Path>,
    source: &str,
    options: &SynthesizeOptions,
    resolver: &dyn ImportResolver,
) -> Result<Option<String>> {
    let allocator = Allocator::default();
    let session = Session::new(&allocator, resolver, options.clone());
    session.synthesize_source(path, source)
}

/// Structured members of the default export of the file at `path`.
pub fn synthesize_members(
    path: impl AsRef<Path>,
    options: &SynthesizeOptions,
    resolver: &dyn ImportResolver,
) -> Result<Option<MemberMap>> {
    let allocator = Allocator::default();
    let session = Session::new(&allocator, resolver, options.clone());
    let file = session.load(path.as_ref())?;
    Ok(ExpressionOrchestrator::new(FileContext::new(&session, &file)).members())
}
