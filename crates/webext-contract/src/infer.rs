//! Coarse expression typing and return-type inference.

use oxc_ast::ast::{BinaryExpression, BinaryOperator, Expression, Statement, UnaryOperator};
use rustc_hash::FxHashMap;

use crate::jsdoc::split_top_level;
use crate::model::render_members;
use crate::object::ObjectAnalyzer;
use crate::session::FileContext;
use crate::shape::{strip, FunctionLike};
use crate::signature::SignatureBuilder;
use crate::source::array_type_text;
use crate::types::TypeRenderer;

/// Types of the sibling members `this.<name>` can refer to.
pub(crate) type ThisScope = FxHashMap<String, String>;

#[derive(Clone, Copy)]
pub(crate) struct ExpressionTyper<'c, 'a> {
    ctx: FileContext<'c, 'a>,
}

impl<'c, 'a> ExpressionTyper<'c, 'a> {
    pub fn new(ctx: FileContext<'c, 'a>) -> Self {
        Self { ctx }
    }

    /// Coarse type of `expression`, `None` when it cannot be told.
    pub fn type_of(&self, expression: &'c Expression<'a>, this_scope: &ThisScope) -> Option<String> {
        match expression {
            Expression::ParenthesizedExpression(inner) => self.type_of(&inner.expression, this_scope),
            Expression::TSNonNullExpression(inner) => self.type_of(&inner.expression, this_scope),
            Expression::TSSatisfiesExpression(inner) => {
                self.type_of(&inner.expression, this_scope)
            }
            Expression::TSAsExpression(inner) => {
                Some(TypeRenderer::new(self.ctx).render(&inner.type_annotation))
            }
            Expression::TSTypeAssertion(inner) => {
                Some(TypeRenderer::new(self.ctx).render(&inner.type_annotation))
            }
            Expression::StaticMemberExpression(member)
                if matches!(member.object, Expression::ThisExpression(_)) =>
            {
                this_scope.get(member.property.name.as_str()).cloned()
            }
            Expression::TemplateLiteral(_) => Some("string".to_string()),
            Expression::UnaryExpression(unary) => Some(
                match unary.operator {
                    UnaryOperator::LogicalNot | UnaryOperator::Delete => "boolean",
                    UnaryOperator::Typeof => "string",
                    UnaryOperator::Void => "undefined",
                    _ => "number",
                }
                .to_string(),
            ),
            Expression::BinaryExpression(binary) => self.binary_type(binary, this_scope),
            Expression::ConditionalExpression(conditional) => {
                let consequent = self.type_of(&conditional.consequent, this_scope)?;
                let alternate = self.type_of(&conditional.alternate, this_scope)?;
                Some(union_of(vec![consequent, alternate]))
            }
            Expression::LogicalExpression(logical) => {
                let left = self.type_of(&logical.left, this_scope)?;
                let right = self.type_of(&logical.right, this_scope)?;
                Some(union_of(vec![left, right]))
            }
            Expression::AwaitExpression(inner) => {
                let awaited = self.type_of(&inner.argument, this_scope)?;
                Some(awaited_type(&awaited))
            }
            Expression::NewExpression(new) => match strip(&new.callee) {
                Expression::Identifier(callee) => Some(callee.name.to_string()),
                _ => None,
            },
            Expression::ArrowFunctionExpression(arrow) => Some(
                SignatureBuilder::new(self.ctx)
                    .build(FunctionLike::Arrow(arrow), None, this_scope)
                    .function_type_text(),
            ),
            Expression::FunctionExpression(function) => Some(
                SignatureBuilder::new(self.ctx)
                    .build(FunctionLike::Function(function), None, this_scope)
                    .function_type_text(),
            ),
            Expression::ObjectExpression(object) => {
                Some(render_members(&ObjectAnalyzer::new(self.ctx).analyze(object)))
            }
            Expression::ArrayExpression(array) => {
                let element_types: Vec<String> = array
                    .elements
                    .iter()
                    .map(|element| {
                        element
                            .as_expression()
                            .and_then(|element| self.type_of(element, this_scope))
                            .unwrap_or_else(|| "any".to_string())
                    })
                    .collect();
                Some(array_type_text(&element_types))
            }
            _ => self.ctx.file.fold(expression).coarse_type(),
        }
    }

    fn binary_type(&self, binary: &'c BinaryExpression<'a>, this_scope: &ThisScope) -> Option<String> {
        let operator = binary.operator;
        if operator.is_equality() || operator.is_compare() || operator.is_relational() {
            return Some("boolean".to_string());
        }
        if operator == BinaryOperator::Addition {
            let left = self.type_of(&binary.left, this_scope);
            let right = self.type_of(&binary.right, this_scope);
            return match (left.as_deref(), right.as_deref()) {
                (Some("string"), _) | (_, Some("string")) => Some("string".to_string()),
                (Some("number"), Some("number")) => Some("number".to_string()),
                _ => None,
            };
        }
        (operator.is_arithmetic() || operator.is_bitwise()).then(|| "number".to_string())
    }

    /// Return type inferred from a function body.
    ///
    /// No valued `return` gives `void`; several distinct types form a union;
    /// `async` functions wrap the result in `Promise`.
    pub fn infer_return_type(&self, function: FunctionLike<'c, 'a>, this_scope: &ThisScope) -> String {
        let returned: Vec<&'c Expression<'a>> = match function.concise_body() {
            Some(body) => vec![body],
            None => {
                let mut returns = Vec::new();
                collect_returns(function.statements(), &mut returns);
                returns.into_iter().flatten().collect()
            }
        };

        let inner = if returned.is_empty() {
            "void".to_string()
        } else {
            union_of(
                returned
                    .into_iter()
                    .map(|expression| {
                        self.type_of(expression, this_scope)
                            .unwrap_or_else(|| "any".to_string())
                    })
                    .collect(),
            )
        };

        if function.is_async() {
            format!("Promise<{}>", awaited_type(&inner))
        } else {
            inner
        }
    }
}

/// Every `return` in a body, without descending into nested functions.
///
/// Bare `return;` statements are collected as `None`.
pub(crate) fn collect_returns<'n, 'a>(
    statements: &'n [Statement<'a>],
    returns: &mut Vec<Option<&'n Expression<'a>>>,
) {
    for statement in statements {
        collect_statement_returns(statement, returns);
    }
}

fn collect_statement_returns<'n, 'a>(
    statement: &'n Statement<'a>,
    returns: &mut Vec<Option<&'n Expression<'a>>>,
) {
    match statement {
        Statement::ReturnStatement(statement) => returns.push(statement.argument.as_ref()),
        Statement::BlockStatement(block) => collect_returns(&block.body[..], returns),
        Statement::IfStatement(statement) => {
            collect_statement_returns(&statement.consequent, returns);
            if let Some(alternate) = &statement.alternate {
                collect_statement_returns(alternate, returns);
            }
        }
        Statement::TryStatement(statement) => {
            collect_returns(&statement.block.body[..], returns);
            if let Some(handler) = &statement.handler {
                collect_returns(&handler.body.body[..], returns);
            }
            if let Some(finalizer) = &statement.finalizer {
                collect_returns(&finalizer.body[..], returns);
            }
        }
        Statement::SwitchStatement(statement) => {
            for case in statement.cases.iter() {
                collect_returns(&case.consequent[..], returns);
            }
        }
        Statement::ForStatement(statement) => collect_statement_returns(&statement.body, returns),
        Statement::ForInStatement(statement) => collect_statement_returns(&statement.body, returns),
        Statement::ForOfStatement(statement) => collect_statement_returns(&statement.body, returns),
        Statement::WhileStatement(statement) => collect_statement_returns(&statement.body, returns),
        Statement::DoWhileStatement(statement) => {
            collect_statement_returns(&statement.body, returns);
        }
        Statement::LabeledStatement(statement) => {
            collect_statement_returns(&statement.body, returns);
        }
        _ => {}
    }
}

/// Distinct types joined with ` | `; `any` absorbs everything else.
fn union_of(types: Vec<String>) -> String {
    let mut distinct: Vec<String> = Vec::new();
    for ty in types {
        if ty == "any" {
            return ty;
        }
        if !distinct.contains(&ty) {
            distinct.push(ty);
        }
    }
    distinct.join(" | ")
}

/// The value a promise of `ty` settles to, applied to each union member.
fn awaited_type(ty: &str) -> String {
    union_of(
        split_top_level(ty, '|')
            .into_iter()
            .map(|member| strip_promise(member.trim()).to_string())
            .collect(),
    )
}

fn strip_promise(ty: &str) -> &str {
    let single = split_top_level(ty, '|').len() == 1 && split_top_level(ty, '&').len() == 1;
    match ty.strip_prefix("Promise<").and_then(|rest| rest.strip_suffix('>')) {
        Some(inner) if single => inner,
        _ => ty,
    }
}
