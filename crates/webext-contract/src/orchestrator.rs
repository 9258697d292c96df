//! Entry point of the analysis: the default export of one file.

use oxc_ast::ast::{ExportDefaultDeclarationKind, Expression, Statement};

use crate::class::ClassAnalyzer;
use crate::factory::FactoryUnwrapper;
use crate::finder::{exported_local_name, DeclarationFinder, DeclarationKind, FoundDeclaration};
use crate::infer::{ExpressionTyper, ThisScope};
use crate::model::{render_members, MemberMap};
use crate::object::ObjectAnalyzer;
use crate::session::FileContext;
use crate::shape::{normalize, FunctionLike, Normalized, Shape};
use crate::signature::SignatureBuilder;
use crate::source::ImportedName;
use crate::types::TypeRenderer;

/// Synthesizes the contract of a file's default export.
///
/// With a property configured in the session options only that member's type
/// is produced; otherwise the whole member block is.
#[derive(Clone, Copy)]
pub struct ExpressionOrchestrator<'c, 'a> {
    ctx: FileContext<'c, 'a>,
}

impl<'c, 'a> ExpressionOrchestrator<'c, 'a> {
    pub fn new(ctx: FileContext<'c, 'a>) -> Self {
        Self { ctx }
    }

    /// The contract text, or `None` when no type can be determined.
    pub fn synthesize(&self) -> Option<String> {
        match &self.ctx.session.options().property {
            Some(property) => self.property_type(property),
            None => self.members().map(|members| render_members(&members)),
        }
    }

    /// Member map of the default export.
    pub fn members(&self) -> Option<MemberMap> {
        let Some(export) = self.default_export() else {
            tracing::debug!(
                file = %self.ctx.file.path().display(),
                "no analyzable default export"
            );
            return None;
        };
        self.members_of_shape(export)
    }

    /// Type of the member called `name`.
    ///
    /// A top-level declaration of that name takes priority over a member of
    /// the default export.
    pub fn property_type(&self, name: &str) -> Option<String> {
        let finder = DeclarationFinder::program(self.ctx.file.program());
        if let Some(found) = finder.find_top_level(|d| {
            d.name == name
                && matches!(
                    d.kind,
                    DeclarationKind::Variable(_)
                        | DeclarationKind::Function(_)
                        | DeclarationKind::Class(_)
                )
        }) {
            return self.declaration_type(found);
        }

        let members = self.members()?;
        members.get(name).map(|member| member.value_type())
    }

    fn declaration_type(&self, found: FoundDeclaration<'c, 'a>) -> Option<String> {
        let docs = self.ctx.file.jsdoc_at(found.anchor);
        if let Some(type_text) = docs.as_ref().and_then(|docs| docs.type_text.clone()) {
            return Some(type_text);
        }
        let empty = ThisScope::default();

        match found.kind {
            DeclarationKind::Function(function) => Some(
                SignatureBuilder::new(self.ctx)
                    .build(FunctionLike::Function(function), docs.as_ref(), &empty)
                    .function_type_text(),
            ),
            DeclarationKind::Class(class) => {
                Some(render_members(&ClassAnalyzer::new(self.ctx).analyze(class)))
            }
            DeclarationKind::Variable(declarator) => {
                if let Some(annotation) = &declarator.id.type_annotation {
                    return Some(TypeRenderer::new(self.ctx).render_annotation(annotation));
                }
                let init = declarator.init.as_ref()?;
                let normalized = normalize(self.ctx, init);
                match normalized.shape {
                    Shape::Function(function) if normalized.unwrapped => {
                        FactoryUnwrapper::new(self.ctx)
                            .analyze(function)
                            .map(|members| render_members(&members))
                    }
                    Shape::Function(function) => Some(
                        SignatureBuilder::new(self.ctx)
                            .build(function, docs.as_ref(), &empty)
                            .function_type_text(),
                    ),
                    Shape::Literal(expression) | Shape::Other(expression) => {
                        ExpressionTyper::new(self.ctx).type_of(expression, &empty)
                    }
                    _ => self
                        .members_of_shape(normalized)
                        .map(|members| render_members(&members)),
                }
            }
            _ => None,
        }
    }

    /// The default export (or `export =` value), normalized.
    fn default_export(&self) -> Option<Normalized<'c, 'a>> {
        self.ctx
            .file
            .program()
            .body
            .iter()
            .find_map(|statement| match statement {
                Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(function) => Some(
                        Normalized::plain(Shape::Function(FunctionLike::Function(function))),
                    ),
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        Some(Normalized::plain(Shape::Class(class)))
                    }
                    ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => None,
                    kind => kind
                        .as_expression()
                        .map(|expression| normalize(self.ctx, expression)),
                },
                Statement::TSExportAssignment(assignment) => {
                    Some(normalize(self.ctx, &assignment.expression))
                }
                _ => None,
            })
    }

    fn members_of_shape(&self, normalized: Normalized<'c, 'a>) -> Option<MemberMap> {
        match normalized.shape {
            Shape::Function(function) => FactoryUnwrapper::new(self.ctx).analyze(function),
            Shape::ObjectLiteral(object) => Some(ObjectAnalyzer::new(self.ctx).analyze(object)),
            Shape::Class(class) => Some(ClassAnalyzer::new(self.ctx).analyze(class)),
            Shape::New(new) => ClassAnalyzer::new(self.ctx).new_members(new, None),
            Shape::Identifier(name) => self.members_of_identifier(name),
            Shape::Literal(expression) | Shape::Other(expression) => {
                tracing::trace!(
                    file = %self.ctx.file.path().display(),
                    kind = expression_kind(expression),
                    "export is not a factory, object or class"
                );
                None
            }
        }
    }

    /// Members of the value bound to `name`, locally or through an import.
    fn members_of_identifier(&self, name: &str) -> Option<MemberMap> {
        let _guard = self.ctx.enter(name)?;
        if let Some(found) = DeclarationFinder::program(self.ctx.file.program()).value(name) {
            return match found.kind {
                DeclarationKind::Variable(declarator) => {
                    self.members_of_shape(normalize(self.ctx, declarator.init.as_ref()?))
                }
                DeclarationKind::Function(function) => {
                    FactoryUnwrapper::new(self.ctx).analyze(FunctionLike::Function(function))
                }
                DeclarationKind::Class(class) => Some(ClassAnalyzer::new(self.ctx).analyze(class)),
                _ => None,
            };
        }

        let binding = self.ctx.import(name)?;
        let target = self.ctx.import_target(binding)?;
        let other = FileContext::new(self.ctx.session, &target);
        ExpressionOrchestrator::new(other).members_of_export(&binding.imported)
    }

    fn members_of_export(&self, imported: &ImportedName) -> Option<MemberMap> {
        match imported {
            ImportedName::Named(name) => {
                self.members_of_identifier(exported_local_name(self.ctx.file.program(), name))
            }
            ImportedName::Default => self.members(),
            ImportedName::Namespace => None,
        }
    }
}

fn expression_kind(expression: &Expression<'_>) -> &'static str {
    match expression {
        Expression::CallExpression(_) => "call",
        Expression::StaticMemberExpression(_) | Expression::ComputedMemberExpression(_) => {
            "member access"
        }
        Expression::StringLiteral(_) | Expression::TemplateLiteral(_) => "string",
        Expression::NumericLiteral(_) => "number",
        _ => "expression",
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use oxc_allocator::Allocator;

    use super::*;
    use crate::resolver::{ImportResolver, ImportSource};
    use crate::session::{Session, SynthesizeOptions, WrapperConfig};

    fn packages(specifier: &str, _: &Path) -> ImportSource {
        ImportSource::Package(specifier.to_string())
    }

    fn unresolved(specifier: &str, _: &Path) -> ImportSource {
        ImportSource::Unresolved(specifier.to_string())
    }

    fn synthesize(source: &str, options: SynthesizeOptions) -> Option<String> {
        synthesize_with(&packages, source, options)
    }

    fn synthesize_with(
        resolver: &dyn ImportResolver,
        source: &str,
        options: SynthesizeOptions,
    ) -> Option<String> {
        let allocator = Allocator::default();
        let session = Session::new(&allocator, resolver, options);
        session
            .synthesize_source(Path::new("/virtual/entry.ts"), source)
            .unwrap()
    }

    fn wrappers() -> WrapperConfig {
        WrapperConfig::new(["defineService"], "@webext/core")
    }

    #[test]
    fn default_exported_factory_object() {
        let rendered = synthesize(
            r#"
                export default () => ({
                    bar: "x",
                    getBar() { return this.bar; },
                    setBar(bar) { this.bar = bar; },
                });
            "#,
            SynthesizeOptions::default(),
        );
        assert_eq!(
            rendered.as_deref(),
            Some("{ bar: string; getBar(): string; setBar(bar: any): void; }")
        );
    }

    #[test]
    fn export_assignment_and_identifier_exports() {
        let rendered = synthesize(
            "const api = { ping(): boolean { return true; } };\nexport = api;",
            SynthesizeOptions::default(),
        );
        assert_eq!(rendered.as_deref(), Some("{ ping(): boolean; }"));

        let rendered = synthesize(
            "class Api { version = 1; }\nexport default new Api();",
            SynthesizeOptions::default(),
        );
        assert_eq!(rendered.as_deref(), Some("{ version: number; }"));
    }

    #[test]
    fn property_mode_reads_wrapped_object_members() {
        let source = r#"
            import { defineService } from "@webext/core";
            export default defineService({
                foo: "x",
                getFoo(): string { return this.foo; },
            });
        "#;
        let options = SynthesizeOptions::default()
            .with_wrappers(wrappers())
            .with_property("getFoo");
        assert_eq!(synthesize(source, options).as_deref(), Some("() => string"));
    }

    #[test]
    fn unresolvable_wrapper_imports_are_not_wrappers() {
        let source = r#"
            import { defineService } from "@webext/core";
            export default defineService({ ping(): boolean { return true; } });
        "#;
        let options = SynthesizeOptions::default().with_wrappers(wrappers());
        assert_eq!(
            synthesize(source, options.clone()).as_deref(),
            Some("{ ping(): boolean; }")
        );
        assert_eq!(synthesize_with(&unresolved, source, options), None);
    }

    #[test]
    fn self_referencing_default_factory_terminates() {
        let rendered = synthesize(
            "export default function make() { return { again: make }; }",
            SynthesizeOptions::default(),
        );
        assert_eq!(rendered.as_deref(), Some("{ again(): { again: any; }; }"));
    }

    #[test]
    fn property_mode_prefers_top_level_declarations() {
        let source = r#"
            import { defineService } from "@webext/core";
            export const limit = 3;
            export const service = defineService(() => ({ run(): void {} }));
            export default { limit: "not this one" };
        "#;
        let options = SynthesizeOptions::default().with_wrappers(wrappers());
        assert_eq!(
            synthesize(source, options.clone().with_property("limit")).as_deref(),
            Some("number")
        );
        assert_eq!(
            synthesize(source, options.clone().with_property("service")).as_deref(),
            Some("{ run(): void; }")
        );
        assert_eq!(synthesize(source, options.with_property("missing")), None);
    }

    #[test]
    fn unrecognized_exports_yield_nothing() {
        assert_eq!(synthesize("export default 42;", SynthesizeOptions::default()), None);
        assert_eq!(
            synthesize("export default compute();", SynthesizeOptions::default()),
            None
        );
        assert_eq!(
            synthesize("export const x = 1;", SynthesizeOptions::default()),
            None
        );
    }
}
