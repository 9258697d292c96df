//! Class instance-surface analysis.

use oxc_ast::ast::{
    Class, ClassElement, Expression, MethodDefinition, MethodDefinitionKind, NewExpression,
    PropertyDefinition, PropertyKey, Statement, TSAccessibility,
};

use crate::finder::{exported_local_name, DeclarationFinder};
use crate::infer::{ExpressionTyper, ThisScope};
use crate::model::{MemberMap, MemberSignature, PropertySignature};
use crate::session::FileContext;
use crate::shape::{strip, FunctionLike};
use crate::signature::SignatureBuilder;
use crate::source::ImportedName;
use crate::types::TypeRenderer;
use oxc_ast::ast::ExportDefaultDeclarationKind;

/// Maps the public instance members of a class to signatures.
///
/// Members of the extended base class come first and are overwritten by the
/// class's own members of the same name. Static, private, protected and
/// `#private` members never appear.
#[derive(Clone, Copy)]
pub(crate) struct ClassAnalyzer<'c, 'a> {
    ctx: FileContext<'c, 'a>,
}

impl<'c, 'a> ClassAnalyzer<'c, 'a> {
    pub fn new(ctx: FileContext<'c, 'a>) -> Self {
        Self { ctx }
    }

    pub fn analyze(&self, class: &'c Class<'a>) -> MemberMap {
        let mut members = self.base_members(class).unwrap_or_default();
        let this_scope = self.this_scope(class, &members);
        let builder = SignatureBuilder::new(self.ctx);

        for element in class.body.body.iter() {
            match element {
                ClassElement::PropertyDefinition(property) => {
                    if !is_public(&property.key, property.accessibility, property.r#static) {
                        continue;
                    }
                    let Some(name) = property.key.static_name() else {
                        continue;
                    };
                    let member = self.property_member(property, &this_scope);
                    members.insert(name.into_owned(), member);
                }
                ClassElement::MethodDefinition(method) => {
                    if matches!(method.kind, MethodDefinitionKind::Constructor) {
                        self.parameter_properties(method, &mut members);
                        continue;
                    }
                    if !is_public(&method.key, method.accessibility, method.r#static) {
                        continue;
                    }
                    let Some(name) = method.key.static_name() else {
                        continue;
                    };
                    let docs = self.ctx.file.jsdoc_at(method.span.start);
                    let signature =
                        builder.build(FunctionLike::Function(&method.value), docs.as_ref(), &this_scope);
                    let member = match method.kind {
                        MethodDefinitionKind::Get => MemberSignature::property(signature.return_type),
                        MethodDefinitionKind::Set => {
                            // The getter, or an earlier declaration, already fixed the type.
                            if members.contains_key(name.as_ref()) {
                                continue;
                            }
                            let type_text = signature
                                .parameters
                                .into_iter()
                                .next()
                                .map_or_else(|| "any".to_string(), |parameter| parameter.type_text);
                            MemberSignature::property(type_text)
                        }
                        _ => MemberSignature::Method(signature),
                    };
                    members.insert(name.into_owned(), member);
                }
                _ => {}
            }
        }
        members
    }

    /// Members of `new X()`, with `X` looked up in `scope` first when given.
    pub fn new_members(
        &self,
        new: &'c NewExpression<'a>,
        scope: Option<&'c [Statement<'a>]>,
    ) -> Option<MemberMap> {
        match strip(&new.callee) {
            Expression::ClassExpression(class) => Some(self.analyze(class)),
            Expression::Identifier(ident) => self.analyze_reference(ident.name.as_str(), scope),
            _ => None,
        }
    }

    /// Members of the class bound to `name`: in `scope`, then in the file,
    /// then in the module it is imported from.
    pub fn analyze_reference(
        &self,
        name: &str,
        scope: Option<&'c [Statement<'a>]>,
    ) -> Option<MemberMap> {
        let _guard = self.ctx.enter(name)?;
        if let Some((class, _)) = scope.and_then(|scope| DeclarationFinder::new(scope).class(name)) {
            return Some(self.analyze(class));
        }
        if let Some((class, _)) = DeclarationFinder::program(self.ctx.file.program()).class(name) {
            return Some(self.analyze(class));
        }

        let binding = self.ctx.import(name)?;
        let target = self.ctx.import_target(binding)?;
        let other = FileContext::new(self.ctx.session, &target);
        ClassAnalyzer::new(other).analyze_export(&binding.imported)
    }

    /// Members of the class a module exports under `imported`.
    pub fn analyze_export(&self, imported: &ImportedName) -> Option<MemberMap> {
        let program = self.ctx.file.program();
        match imported {
            ImportedName::Named(name) => {
                self.analyze_reference(exported_local_name(program, name), None)
            }
            ImportedName::Default => program.body.iter().find_map(|statement| {
                let Statement::ExportDefaultDeclaration(export) = statement else {
                    return None;
                };
                match &export.declaration {
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => Some(self.analyze(class)),
                    kind => match strip(kind.as_expression()?) {
                        Expression::ClassExpression(class) => Some(self.analyze(class)),
                        Expression::Identifier(ident) => {
                            self.analyze_reference(ident.name.as_str(), None)
                        }
                        _ => None,
                    },
                }
            }),
            ImportedName::Namespace => None,
        }
    }

    fn base_members(&self, class: &'c Class<'a>) -> Option<MemberMap> {
        match strip(class.super_class.as_ref()?) {
            Expression::Identifier(base) => self.analyze_reference(base.name.as_str(), None),
            Expression::ClassExpression(base) => Some(self.analyze(base)),
            _ => None,
        }
    }

    /// Property types visible through `this`, inherited ones included.
    fn this_scope(&self, class: &'c Class<'a>, inherited: &MemberMap) -> ThisScope {
        let mut scope: ThisScope = inherited
            .iter()
            .filter_map(|(name, member)| match member {
                MemberSignature::Property(property) => Some((name.clone(), property.type_text.clone())),
                MemberSignature::Method(_) => None,
            })
            .collect();
        let empty = ThisScope::default();
        for element in class.body.body.iter() {
            match element {
                ClassElement::PropertyDefinition(property) if !property.r#static => {
                    let Some(name) = property.key.static_name() else {
                        continue;
                    };
                    if let MemberSignature::Property(signature) = self.property_member(property, &empty) {
                        scope.insert(name.into_owned(), signature.type_text);
                    }
                }
                ClassElement::MethodDefinition(method)
                    if matches!(method.kind, MethodDefinitionKind::Constructor) =>
                {
                    let renderer = TypeRenderer::new(self.ctx);
                    let docs = self.ctx.file.jsdoc_at(method.span.start);
                    for parameter in renderer.parameters(&method.value.params, docs.as_ref()) {
                        scope.entry(parameter.name).or_insert(parameter.type_text);
                    }
                }
                _ => {}
            }
        }
        scope
    }

    fn property_member(&self, property: &'c PropertyDefinition<'a>, this_scope: &ThisScope) -> MemberSignature {
        let docs = self.ctx.file.jsdoc_at(property.span.start);
        if let Some(type_text) = docs.as_ref().and_then(|docs| docs.type_text.clone()) {
            return MemberSignature::Property(PropertySignature {
                type_text,
                optional: property.optional,
            });
        }
        if let Some(annotation) = &property.type_annotation {
            return MemberSignature::Property(PropertySignature {
                type_text: TypeRenderer::new(self.ctx).render_annotation(annotation),
                optional: property.optional,
            });
        }

        let Some(value) = &property.value else {
            return MemberSignature::Property(PropertySignature {
                type_text: "any".to_string(),
                optional: property.optional,
            });
        };
        let function = match strip(value) {
            Expression::ArrowFunctionExpression(arrow) => Some(FunctionLike::Arrow(arrow)),
            Expression::FunctionExpression(function) => Some(FunctionLike::Function(function)),
            _ => None,
        };
        match function {
            Some(function) => MemberSignature::Method(SignatureBuilder::new(self.ctx).build(
                function,
                docs.as_ref(),
                this_scope,
            )),
            None => MemberSignature::Property(PropertySignature {
                type_text: ExpressionTyper::new(self.ctx)
                    .type_of(value, this_scope)
                    .unwrap_or_else(|| "any".to_string()),
                optional: property.optional,
            }),
        }
    }

    /// `constructor(public a: A, readonly b: B)` declares properties `a` and `b`.
    fn parameter_properties(&self, constructor: &'c MethodDefinition<'a>, members: &mut MemberMap) {
        let params = &constructor.value.params;
        let docs = self.ctx.file.jsdoc_at(constructor.span.start);
        let rendered = TypeRenderer::new(self.ctx).parameters(params, docs.as_ref());
        for (param, parameter) in params.items.iter().zip(rendered) {
            let declared = match param.accessibility {
                Some(TSAccessibility::Public) => true,
                None => param.readonly,
                Some(_) => false,
            };
            if declared {
                members.insert(
                    parameter.name,
                    MemberSignature::Property(PropertySignature {
                        type_text: parameter.type_text,
                        optional: parameter.optional,
                    }),
                );
            }
        }
    }
}

fn is_public(key: &PropertyKey<'_>, accessibility: Option<TSAccessibility>, is_static: bool) -> bool {
    if is_static || matches!(key, PropertyKey::PrivateIdentifier(_)) {
        return false;
    }
    !matches!(
        accessibility,
        Some(TSAccessibility::Private | TSAccessibility::Protected)
    )
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use oxc_allocator::Allocator;

    use super::*;
    use crate::model::render_members;
    use crate::resolver::ImportSource;
    use crate::session::{Session, SynthesizeOptions};

    fn packages(specifier: &str, _: &Path) -> ImportSource {
        ImportSource::Package(specifier.to_string())
    }

    fn render_class(source: &str, name: &str) -> String {
        let allocator = Allocator::default();
        let session = Session::new(&allocator, &packages, SynthesizeOptions::default());
        let file = session
            .insert_source(Path::new("/virtual/class.ts"), source)
            .unwrap();
        let ctx = FileContext::new(&session, &file);
        let members = ClassAnalyzer::new(ctx)
            .analyze_reference(name, None)
            .expect("class should resolve");
        render_members(&members)
    }

    #[test]
    fn filters_non_public_members() {
        let rendered = render_class(
            r#"
                class Service {
                    private secret = "s";
                    protected internal = 1;
                    static count = 0;
                    #hidden = true;
                    visibleParam: string = "v";
                    constructor(public id: number, readonly tag: string, private token: string, plain: boolean) {}
                    publicMethod() {}
                    private helper() {}
                    static create() { return new Service(1, "", "", true); }
                }
            "#,
            "Service",
        );
        assert_eq!(
            rendered,
            "{ visibleParam: string; id: number; tag: string; publicMethod(): void; }"
        );
    }

    #[test]
    fn subclass_members_override_base_members() {
        let rendered = render_class(
            r#"
                class Base {
                    name = "base";
                    greet(): string { return this.name; }
                    shared(): number { return 1; }
                }
                class Child extends Base {
                    shared(): string { return "child"; }
                    extra = 2;
                }
            "#,
            "Child",
        );
        assert_eq!(
            rendered,
            "{ name: string; greet(): string; shared(): string; extra: number; }"
        );
    }

    #[test]
    fn accessors_become_properties() {
        let rendered = render_class(
            r#"
                class Store {
                    count = 0;
                    get doubled() { return this.count * 2; }
                    set label(value: string) {}
                    /** @returns {Promise<void>} */
                    async save() {}
                }
            "#,
            "Store",
        );
        assert_eq!(
            rendered,
            "{ count: number; doubled: number; label: string; save(): Promise<void>; }"
        );
    }
}
