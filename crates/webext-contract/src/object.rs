//! Object literal analysis.

use oxc_ast::ast::{Expression, ObjectExpression, ObjectProperty, ObjectPropertyKind, PropertyKind};

use crate::finder::{DeclarationFinder, DeclarationKind};
use crate::infer::{ExpressionTyper, ThisScope};
use crate::jsdoc::ParsedJsDoc;
use crate::model::{MemberMap, MemberSignature};
use crate::session::{FileContext, ResolutionGuard};
use crate::shape::{strip, FunctionLike};
use crate::signature::SignatureBuilder;

/// A function held by a property, with the JSDoc of its declaration.
///
/// When the function was reached through a reference, the reference stays on
/// the active resolution chain until this is dropped.
struct FunctionValue<'c, 'a> {
    function: FunctionLike<'c, 'a>,
    docs: Option<ParsedJsDoc>,
    _guard: Option<ResolutionGuard<'c>>,
}

impl<'c, 'a> FunctionValue<'c, 'a> {
    fn inline(function: FunctionLike<'c, 'a>) -> Self {
        Self {
            function,
            docs: None,
            _guard: None,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct ObjectAnalyzer<'c, 'a> {
    ctx: FileContext<'c, 'a>,
}

impl<'c, 'a> ObjectAnalyzer<'c, 'a> {
    pub fn new(ctx: FileContext<'c, 'a>) -> Self {
        Self { ctx }
    }

    /// One member per statically named property, in source order.
    ///
    /// Spreads of local object literals contribute their members in place.
    pub fn analyze(&self, object: &'c ObjectExpression<'a>) -> MemberMap {
        let this_scope = self.this_scope(object);
        let mut members = MemberMap::new();
        for property in object.properties.iter() {
            match property {
                ObjectPropertyKind::ObjectProperty(property) => {
                    let Some(name) = property.key.static_name() else {
                        continue;
                    };
                    let existing = members.contains_key(name.as_ref());
                    if let Some(member) = self.member(property, &this_scope, existing) {
                        members.insert(name.into_owned(), member);
                    }
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    if let Some(spread_members) = self.spread_members(&spread.argument) {
                        members.extend(spread_members);
                    }
                }
            }
        }
        members
    }

    /// Value types of the plain data properties, for `this.x` lookups.
    fn this_scope(&self, object: &'c ObjectExpression<'a>) -> ThisScope {
        let empty = ThisScope::default();
        let mut scope = ThisScope::default();
        for property in object.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(property) = property else {
                continue;
            };
            if !matches!(property.kind, PropertyKind::Init) || self.function_value(property).is_some() {
                continue;
            }
            let Some(name) = property.key.static_name() else {
                continue;
            };
            let docs = self.ctx.file.jsdoc_at(property.span.start);
            let type_text = docs
                .and_then(|docs| docs.type_text)
                .unwrap_or_else(|| self.value_type(property, &empty));
            scope.insert(name.into_owned(), type_text);
        }
        scope
    }

    fn member(
        &self,
        property: &'c ObjectProperty<'a>,
        this_scope: &ThisScope,
        existing: bool,
    ) -> Option<MemberSignature> {
        let docs = self.ctx.file.jsdoc_at(property.span.start);
        if let Some(type_text) = docs.as_ref().and_then(|docs| docs.type_text.clone()) {
            return Some(MemberSignature::property(type_text));
        }

        let builder = SignatureBuilder::new(self.ctx);
        match property.kind {
            PropertyKind::Get => {
                let getter = self.function_value(property)?;
                let signature = builder.build(getter.function, docs.as_ref(), this_scope);
                Some(MemberSignature::property(signature.return_type))
            }
            // A getter with the same name already decided the type.
            PropertyKind::Set if existing => None,
            PropertyKind::Set => {
                let setter = self.function_value(property)?;
                let signature = builder.build(setter.function, docs.as_ref(), this_scope);
                let type_text = signature
                    .parameters
                    .into_iter()
                    .next()
                    .map_or_else(|| "any".to_string(), |parameter| parameter.type_text);
                Some(MemberSignature::property(type_text))
            }
            PropertyKind::Init => match self.function_value(property) {
                Some(FunctionValue {
                    function,
                    docs: declared_docs,
                    _guard,
                }) => {
                    let docs = docs.or(declared_docs);
                    Some(MemberSignature::Method(builder.build(
                        function,
                        docs.as_ref(),
                        this_scope,
                    )))
                }
                None => Some(MemberSignature::property(self.value_type(property, this_scope))),
            },
        }
    }

    /// The function a property holds, directly or through a local reference.
    ///
    /// For references the JSDoc of the referenced declaration is returned too.
    /// A reference already being resolved, such as a function whose result
    /// holds the function itself, is not followed again.
    fn function_value(&self, property: &'c ObjectProperty<'a>) -> Option<FunctionValue<'c, 'a>> {
        match strip(&property.value) {
            Expression::ArrowFunctionExpression(arrow) => {
                Some(FunctionValue::inline(FunctionLike::Arrow(arrow)))
            }
            Expression::FunctionExpression(function) => {
                Some(FunctionValue::inline(FunctionLike::Function(function)))
            }
            Expression::Identifier(ident) => {
                let guard = self.ctx.enter(ident.name.as_str())?;
                let found = DeclarationFinder::program(self.ctx.file.program())
                    .find_top_level(|d| d.name == ident.name.as_str())?;
                let function = match found.kind {
                    DeclarationKind::Function(function) => FunctionLike::Function(function),
                    DeclarationKind::Variable(declarator) => {
                        match strip(declarator.init.as_ref()?) {
                            Expression::ArrowFunctionExpression(arrow) => FunctionLike::Arrow(arrow),
                            Expression::FunctionExpression(function) => {
                                FunctionLike::Function(function)
                            }
                            _ => return None,
                        }
                    }
                    _ => return None,
                };
                Some(FunctionValue {
                    function,
                    docs: self.ctx.file.jsdoc_at(found.anchor),
                    _guard: Some(guard),
                })
            }
            _ => None,
        }
    }

    /// Coarse type of a data property's value, `any` when unknown.
    fn value_type(&self, property: &'c ObjectProperty<'a>, this_scope: &ThisScope) -> String {
        if property.shorthand {
            if let Expression::Identifier(ident) = &property.value {
                if let Some(record) = self.ctx.file.variables().get(ident.name.as_str()) {
                    if let Some(type_text) = record.value.coarse_type() {
                        return type_text;
                    }
                }
            }
        }
        ExpressionTyper::new(self.ctx)
            .type_of(&property.value, this_scope)
            .unwrap_or_else(|| "any".to_string())
    }

    fn spread_members(&self, argument: &'c Expression<'a>) -> Option<MemberMap> {
        let name = match strip(argument) {
            Expression::ObjectExpression(object) => return Some(self.analyze(object)),
            Expression::Identifier(ident) => ident.name.as_str(),
            _ => return None,
        };
        let _guard = self.ctx.enter(name)?;
        let found = DeclarationFinder::program(self.ctx.file.program()).find(|d| {
            d.name == name && matches!(d.kind, DeclarationKind::Variable(_))
        })?;
        let DeclarationKind::Variable(declarator) = found.kind else {
            return None;
        };
        match strip(declarator.init.as_ref()?) {
            Expression::ObjectExpression(object) => Some(self.analyze(object)),
            _ => None,
        }
    }
}
