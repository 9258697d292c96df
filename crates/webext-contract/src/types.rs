//! Rendering TypeScript type annotations to canonical text.
//!
//! Named references are inlined when they point at a local or imported alias
//! or interface. Alias intersections are flattened into one object type with
//! first-occurrence-wins member merging. Anything that cannot be inlined keeps
//! its written form, or the `import("pkg").Name` form for package types.

use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Expression, FormalParameters, TSInterfaceDeclaration,
    TSMethodSignatureKind, TSModuleReference, TSSignature, TSType, TSTypeAnnotation, TSTypeName,
    TSTypeParameterDeclaration, TSTypeReference,
};
use oxc_span::GetSpan;

use crate::finder::{default_export_name, exported_local_name, DeclarationFinder};
use crate::jsdoc::ParsedJsDoc;
use crate::model::{
    MemberMap, MemberSignature, MethodSignature, Parameter, PropertySignature,
};
use crate::resolver::ImportSource;
use crate::session::FileContext;
use crate::source::{ImportBinding, ImportedName};

#[derive(Clone, Copy)]
pub(crate) struct TypeRenderer<'c, 'a> {
    ctx: FileContext<'c, 'a>,
}

impl<'c, 'a> TypeRenderer<'c, 'a> {
    pub fn new(ctx: FileContext<'c, 'a>) -> Self {
        Self { ctx }
    }

    fn finder(&self) -> DeclarationFinder<'c, 'a> {
        DeclarationFinder::program(self.ctx.file.program())
    }

    pub fn render_annotation(&self, annotation: &TSTypeAnnotation<'a>) -> String {
        self.render(&annotation.type_annotation)
    }

    pub fn render(&self, ty: &TSType<'a>) -> String {
        match ty {
            TSType::TSUnionType(union) => union
                .types
                .iter()
                .map(|member| self.render(member))
                .collect::<Vec<_>>()
                .join(" | "),
            TSType::TSArrayType(array) => {
                let element = self.render(&array.element_type);
                if needs_parentheses(&array.element_type) {
                    format!("({element})[]")
                } else {
                    format!("{element}[]")
                }
            }
            TSType::TSParenthesizedType(inner) => {
                format!("({})", self.render(&inner.type_annotation))
            }
            TSType::TSTypeReference(reference) => self.render_reference(reference),
            TSType::TSTypeLiteral(literal) => render_compact(&self.signature_members(&literal.members)),
            TSType::TSIntersectionType(intersection) => match self.members_of_type(ty) {
                Some(members) => render_compact(&members),
                None => intersection
                    .types
                    .iter()
                    .map(|member| self.render(member))
                    .collect::<Vec<_>>()
                    .join(" & "),
            },
            TSType::TSFunctionType(function) => MethodSignature {
                type_parameters: type_parameter_names(function.type_parameters.as_deref()),
                parameters: self.parameters(&function.params, None),
                return_type: self.render_annotation(&function.return_type),
            }
            .function_type_text(),
            _ => self.ctx.file.text(ty.span()).to_string(),
        }
    }

    fn render_reference(&self, reference: &TSTypeReference<'a>) -> String {
        let arguments: Option<Vec<String>> = reference.type_arguments.as_ref().map(|arguments| {
            arguments
                .params
                .iter()
                .map(|argument| self.render(argument))
                .collect()
        });
        let with_arguments = |base: String| match &arguments {
            Some(arguments) => format!("{base}<{}>", arguments.join(", ")),
            None => base,
        };

        match &reference.type_name {
            TSTypeName::IdentifierReference(ident) => {
                let name = ident.name.as_str();
                if arguments.is_none() {
                    if let Some(inlined) = self.inline_alias_type(name) {
                        return inlined;
                    }
                }
                if let Some(external) = self.external_form(name) {
                    return with_arguments(external);
                }
                if arguments.is_some() {
                    return with_arguments(name.to_string());
                }
                self.ctx.file.text(reference.span).to_string()
            }
            TSTypeName::QualifiedName(qualified) => {
                if let TSTypeName::IdentifierReference(namespace) = &qualified.left {
                    if let Some(binding) = self.ctx.import(namespace.name.as_str()) {
                        if binding.imported == ImportedName::Namespace {
                            return with_arguments(format!(
                                "import(\"{}\").{}",
                                module_identity(binding),
                                qualified.right.name
                            ));
                        }
                    }
                }
                match &arguments {
                    Some(_) => with_arguments(self.ctx.file.text(qualified.span).to_string()),
                    None => self.ctx.file.text(reference.span).to_string(),
                }
            }
            _ => self.ctx.file.text(reference.span).to_string(),
        }
    }

    /// External reference form for an imported name, `import("pkg").Name`.
    fn external_form(&self, name: &str) -> Option<String> {
        let binding = self.ctx.import(name)?;
        let imported = match &binding.imported {
            ImportedName::Named(imported) => imported.as_str(),
            ImportedName::Default => "default",
            ImportedName::Namespace => return None,
        };
        Some(format!("import(\"{}\").{imported}", module_identity(binding)))
    }

    /// Expand a named type to the text of its definition.
    ///
    /// Tries, in order: a local type alias, an `import X = A.B` alias, a local
    /// interface, then the same lookups in the file the name is imported from.
    pub fn inline_alias_type(&self, name: &str) -> Option<String> {
        let finder = self.finder();

        if let Some(alias) = finder.type_alias(name) {
            let _guard = self.ctx.enter(name)?;
            if let TSType::TSIntersectionType(_) = &alias.type_annotation {
                if let Some(members) = self.members_of_type(&alias.type_annotation) {
                    return Some(render_compact(&members));
                }
            }
            return Some(self.render(&alias.type_annotation));
        }

        if let Some(import) = finder.import_equals(name) {
            if !matches!(import.module_reference, TSModuleReference::ExternalModuleReference(_)) {
                return Some(self.ctx.file.text(import.module_reference.span()).to_string());
            }
        }

        if let Some(interface) = finder.interface(name) {
            let _guard = self.ctx.enter(name)?;
            return Some(render_compact(&self.interface_members(interface)));
        }

        let binding = self.ctx.import(name)?;
        let _guard = self.ctx.enter(name)?;
        let target = self.ctx.import_target(binding)?;
        let other = FileContext::new(self.ctx.session, &target);
        let local = imported_local_name(&other, &binding.imported)?;
        TypeRenderer::new(other).inline_alias_type(&local)
    }

    /// Members of an object-like type, `None` when the type is not object-like.
    pub fn members_of_type(&self, ty: &TSType<'a>) -> Option<MemberMap> {
        match ty {
            TSType::TSTypeLiteral(literal) => Some(self.signature_members(&literal.members)),
            TSType::TSParenthesizedType(inner) => self.members_of_type(&inner.type_annotation),
            TSType::TSIntersectionType(intersection) => {
                let mut merged = MemberMap::new();
                for member in intersection.types.iter() {
                    for (name, signature) in self.members_of_type(member)? {
                        merged.entry(name).or_insert(signature);
                    }
                }
                Some(merged)
            }
            TSType::TSTypeReference(reference) if reference.type_arguments.is_none() => {
                match &reference.type_name {
                    TSTypeName::IdentifierReference(ident) => {
                        self.members_of_name(ident.name.as_str())
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Members of a named alias or interface, local or imported.
    pub fn members_of_name(&self, name: &str) -> Option<MemberMap> {
        let finder = self.finder();
        if let Some(alias) = finder.type_alias(name) {
            let _guard = self.ctx.enter(name)?;
            return self.members_of_type(&alias.type_annotation);
        }
        if let Some(interface) = finder.interface(name) {
            let _guard = self.ctx.enter(name)?;
            return Some(self.interface_members(interface));
        }

        let binding = self.ctx.import(name)?;
        let _guard = self.ctx.enter(name)?;
        let target = self.ctx.import_target(binding)?;
        let other = FileContext::new(self.ctx.session, &target);
        let local = imported_local_name(&other, &binding.imported)?;
        TypeRenderer::new(other).members_of_name(&local)
    }

    /// Own members plus everything inherited through `extends`.
    fn interface_members(&self, interface: &TSInterfaceDeclaration<'a>) -> MemberMap {
        let mut members = MemberMap::new();
        for heritage in interface.extends.iter() {
            if let Expression::Identifier(base) = &heritage.expression {
                if let Some(inherited) = self.members_of_name(base.name.as_str()) {
                    members.extend(inherited);
                }
            }
        }
        members.extend(self.signature_members(&interface.body.body));
        members
    }

    fn signature_members(&self, signatures: &[TSSignature<'a>]) -> MemberMap {
        let mut members = MemberMap::new();
        for signature in signatures {
            match signature {
                TSSignature::TSPropertySignature(property) => {
                    let Some(name) = property.key.static_name() else {
                        continue;
                    };
                    let type_text = property
                        .type_annotation
                        .as_ref()
                        .map_or_else(|| "any".to_string(), |ty| self.render_annotation(ty));
                    members.insert(
                        name.to_string(),
                        MemberSignature::Property(PropertySignature {
                            type_text,
                            optional: property.optional,
                        }),
                    );
                }
                TSSignature::TSMethodSignature(method) => {
                    let Some(name) = method.key.static_name() else {
                        continue;
                    };
                    let return_type = method
                        .return_type
                        .as_ref()
                        .map_or_else(|| "any".to_string(), |ty| self.render_annotation(ty));
                    let member = match method.kind {
                        TSMethodSignatureKind::Get => MemberSignature::property(return_type),
                        TSMethodSignatureKind::Set => continue,
                        _ => MemberSignature::Method(MethodSignature {
                            type_parameters: type_parameter_names(method.type_parameters.as_deref()),
                            parameters: self.parameters(&method.params, None),
                            return_type,
                        }),
                    };
                    members.insert(name.to_string(), member);
                }
                _ => {}
            }
        }
        members
    }

    /// Parameters of a function-like node. JSDoc types win over annotations.
    pub fn parameters(
        &self,
        params: &FormalParameters<'a>,
        docs: Option<&ParsedJsDoc>,
    ) -> Vec<Parameter> {
        let mut parameters: Vec<Parameter> = params
            .items
            .iter()
            .map(|param| self.parameter(&param.pattern, docs))
            .collect();

        if let Some(rest) = &params.rest {
            let name = self.pattern_name(&rest.argument);
            let type_text = docs
                .and_then(|docs| docs.parameter(&name))
                .map(|doc| doc.type_text.clone())
                .or_else(|| {
                    rest.argument
                        .type_annotation
                        .as_ref()
                        .map(|annotation| self.render_annotation(annotation))
                })
                .unwrap_or_else(|| "any[]".to_string());
            parameters.push(Parameter::new(format!("...{name}"), type_text, false));
        }
        parameters
    }

    fn parameter(&self, pattern: &BindingPattern<'a>, docs: Option<&ParsedJsDoc>) -> Parameter {
        let (target, has_default) = match &pattern.kind {
            BindingPatternKind::AssignmentPattern(assignment) => (&assignment.left, true),
            _ => (pattern, false),
        };
        let name = self.pattern_name(target);
        let doc = docs.and_then(|docs| docs.parameter(&name));
        let annotation = pattern
            .type_annotation
            .as_ref()
            .or(target.type_annotation.as_ref());

        let type_text = match (doc, annotation) {
            (Some(doc), _) => doc.type_text.clone(),
            (None, Some(annotation)) => self.render_annotation(annotation),
            (None, None) => "any".to_string(),
        };
        let optional =
            pattern.optional || target.optional || has_default || doc.is_some_and(|doc| doc.optional);
        Parameter::new(name, type_text, optional)
    }

    fn pattern_name(&self, pattern: &BindingPattern<'a>) -> String {
        match &pattern.kind {
            BindingPatternKind::BindingIdentifier(ident) => ident.name.to_string(),
            BindingPatternKind::AssignmentPattern(assignment) => self.pattern_name(&assignment.left),
            kind => self.ctx.file.text(kind.span()).to_string(),
        }
    }
}

/// Local declaration name behind an import binding, in the imported file.
pub(crate) fn imported_local_name(ctx: &FileContext<'_, '_>, imported: &ImportedName) -> Option<String> {
    let program = ctx.file.program();
    match imported {
        ImportedName::Named(name) => Some(exported_local_name(program, name).to_string()),
        ImportedName::Default => default_export_name(program).map(str::to_string),
        ImportedName::Namespace => None,
    }
}

/// Package id for package imports, the written specifier otherwise.
fn module_identity(binding: &ImportBinding) -> &str {
    match &binding.source {
        ImportSource::Package(package) => package,
        ImportSource::File(_) | ImportSource::Unresolved(_) => &binding.specifier,
    }
}

/// Generic parameter names declared on a function-like node.
pub(crate) fn type_parameter_names(
    declaration: Option<&TSTypeParameterDeclaration<'_>>,
) -> Vec<String> {
    declaration
        .map(|declaration| {
            declaration
                .params
                .iter()
                .map(|param| param.name.name.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Renders a member map without padding inside the braces, `{a: A; b: B;}`.
pub(crate) fn render_compact(members: &MemberMap) -> String {
    let body = members
        .iter()
        .map(|(name, member)| member.member_text(name))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{{{body}}}")
}

fn needs_parentheses(ty: &TSType<'_>) -> bool {
    matches!(
        ty,
        TSType::TSUnionType(_)
            | TSType::TSIntersectionType(_)
            | TSType::TSFunctionType(_)
            | TSType::TSConstructorType(_)
            | TSType::TSConditionalType(_)
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use oxc_allocator::Allocator;
    use oxc_ast::ast::{Statement, TSType};

    use super::*;
    use crate::resolver::ImportSource;
    use crate::session::{Session, SynthesizeOptions};

    fn packages(specifier: &str, _: &Path) -> ImportSource {
        ImportSource::Package(specifier.to_string())
    }

    /// Renders the type of the last `type Probe = ...` alias in `source`.
    fn render_probe(source: &str) -> String {
        let allocator = Allocator::default();
        let session = Session::new(&allocator, &packages, SynthesizeOptions::default());
        let file = session
            .insert_source(Path::new("/virtual/types.ts"), source)
            .unwrap();
        let ctx = FileContext::new(&session, &file);
        let probe: &TSType<'_> = file
            .program()
            .body
            .iter()
            .find_map(|statement| match statement {
                Statement::TSTypeAliasDeclaration(alias) if alias.id.name.as_str() == "Probe" => {
                    Some(&alias.type_annotation)
                }
                _ => None,
            })
            .expect("Probe alias");
        TypeRenderer::new(ctx).render(probe)
    }

    #[test]
    fn renders_unions_and_arrays() {
        assert_eq!(render_probe("type Probe = string | number;"), "string | number");
        assert_eq!(render_probe("type Probe = string[];"), "string[]");
        assert_eq!(render_probe("type Probe = (string | null)[];"), "(string | null)[]");
    }

    #[test]
    fn flattens_alias_intersections_first_wins() {
        let rendered = render_probe(
            r#"
                type T = { x: string; a: number } & { x: boolean; b: string };
                type Probe = T;
            "#,
        );
        assert_eq!(rendered, "{x: string; a: number; b: string;}");
    }

    #[test]
    fn inlines_interfaces_with_inherited_members() {
        let rendered = render_probe(
            r#"
                interface Base { id: string }
                interface Item extends Base { count?: number; touch(at: Date): void }
                type Probe = Item;
            "#,
        );
        assert_eq!(rendered, "{id: string; count?: number; touch(at: Date): void;}");
    }

    #[test]
    fn interfaces_and_aliases_render_alike() {
        let rendered = render_probe(
            r#"
                interface Tab { id: number }
                type Alias = { id: number };
                type Probe = { a(): Tab; b(): Alias };
            "#,
        );
        assert_eq!(rendered, "{a(): {id: number;}; b(): {id: number;};}");
    }

    #[test]
    fn package_types_use_the_external_form() {
        let rendered = render_probe(
            r#"
                import { Tabs } from "webextension-polyfill";
                import * as browser from "webextension-polyfill";
                type Probe = [Tabs, browser.Runtime.Port, Promise<Tabs>];
            "#,
        );
        // Tuples keep their written text.
        assert_eq!(rendered, "[Tabs, browser.Runtime.Port, Promise<Tabs>]");

        assert_eq!(
            render_probe(
                "import { Tabs } from \"webextension-polyfill\";\ntype Probe = Promise<Tabs>;"
            ),
            "Promise<import(\"webextension-polyfill\").Tabs>"
        );
        assert_eq!(
            render_probe("import * as b from \"webextension-polyfill\";\ntype Probe = b.Tabs;"),
            "import(\"webextension-polyfill\").Tabs"
        );
    }

    #[test]
    fn self_referencing_alias_falls_back_to_its_name() {
        let rendered = render_probe(
            r#"
                type Tree = { children: Tree[] };
                type Probe = Tree;
            "#,
        );
        assert_eq!(rendered, "{children: Tree[];}");
    }

    #[test]
    fn renders_function_types() {
        assert_eq!(
            render_probe("type Probe = <T>(value: T, label?: string) => Promise<T>;"),
            "<T>(value: T, label?: string) => Promise<T>"
        );
    }
}
