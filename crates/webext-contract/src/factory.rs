//! Factory functions: analyze the value a function returns.

use oxc_ast::ast::{Expression, Statement};

use crate::class::ClassAnalyzer;
use crate::finder::{DeclarationFinder, DeclarationKind, FoundDeclaration};
use crate::infer::collect_returns;
use crate::model::MemberMap;
use crate::object::ObjectAnalyzer;
use crate::session::FileContext;
use crate::shape::{normalize, FunctionLike, Shape};

#[derive(Clone, Copy)]
pub(crate) struct FactoryUnwrapper<'c, 'a> {
    ctx: FileContext<'c, 'a>,
}

impl<'c, 'a> FactoryUnwrapper<'c, 'a> {
    pub fn new(ctx: FileContext<'c, 'a>) -> Self {
        Self { ctx }
    }

    /// Members of the value `function` returns.
    ///
    /// The returned expression is the concise arrow body or the last valued
    /// `return`. Object literals and `new` expressions are analyzed directly;
    /// an identifier is followed to its declaration, inside the function
    /// body first.
    pub fn analyze(&self, function: FunctionLike<'c, 'a>) -> Option<MemberMap> {
        let returned = self.returned_expression(function)?;
        let statements = function.statements();
        match normalize(self.ctx, returned).shape {
            Shape::ObjectLiteral(object) => Some(ObjectAnalyzer::new(self.ctx).analyze(object)),
            Shape::New(new) => ClassAnalyzer::new(self.ctx).new_members(new, Some(statements)),
            Shape::Identifier(name) => self.analyze_identifier(name, statements),
            _ => {
                tracing::trace!(
                    file = %self.ctx.file.path().display(),
                    "factory returns an unsupported shape"
                );
                None
            }
        }
    }

    fn returned_expression(&self, function: FunctionLike<'c, 'a>) -> Option<&'c Expression<'a>> {
        if let Some(body) = function.concise_body() {
            return Some(body);
        }
        let mut returns = Vec::new();
        collect_returns(function.statements(), &mut returns);
        returns.into_iter().flatten().last()
    }

    fn analyze_identifier(
        &self,
        name: &str,
        statements: &'c [Statement<'a>],
    ) -> Option<MemberMap> {
        let _guard = self.ctx.enter(name)?;
        let is_variable = |d: &FoundDeclaration<'c, 'a>| {
            d.name == name && matches!(d.kind, DeclarationKind::Variable(_))
        };
        let found = DeclarationFinder::new(statements)
            .find(is_variable)
            .or_else(|| DeclarationFinder::program(self.ctx.file.program()).find(is_variable))?;
        let DeclarationKind::Variable(declarator) = found.kind else {
            return None;
        };
        match normalize(self.ctx, declarator.init.as_ref()?).shape {
            Shape::ObjectLiteral(object) => Some(ObjectAnalyzer::new(self.ctx).analyze(object)),
            Shape::New(new) => ClassAnalyzer::new(self.ctx).new_members(new, Some(statements)),
            _ => None,
        }
    }
}
