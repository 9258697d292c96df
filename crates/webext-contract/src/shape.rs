//! Expression normalization.
//!
//! Every analyzed expression is stripped of type assertions, `satisfies`,
//! non-null assertions and parentheses, optionally looked through one
//! recognized wrapper call, and classified into a [`Shape`] exactly once.

use oxc_ast::ast::{
    ArrowFunctionExpression, Class, Expression, FormalParameters, Function, NewExpression,
    ObjectExpression, Statement, TSTypeAnnotation, TSTypeParameterDeclaration,
};

use crate::resolver::ImportSource;
use crate::session::FileContext;

/// A function declaration, function expression or arrow function.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FunctionLike<'n, 'a> {
    Function(&'n Function<'a>),
    Arrow(&'n ArrowFunctionExpression<'a>),
}

impl<'n, 'a> FunctionLike<'n, 'a> {
    pub fn params(&self) -> &'n FormalParameters<'a> {
        match *self {
            Self::Function(function) => &function.params,
            Self::Arrow(arrow) => &arrow.params,
        }
    }

    pub fn type_parameters(&self) -> Option<&'n TSTypeParameterDeclaration<'a>> {
        match *self {
            Self::Function(function) => function.type_parameters.as_deref(),
            Self::Arrow(arrow) => arrow.type_parameters.as_deref(),
        }
    }

    pub fn return_type(&self) -> Option<&'n TSTypeAnnotation<'a>> {
        match *self {
            Self::Function(function) => function.return_type.as_deref(),
            Self::Arrow(arrow) => arrow.return_type.as_deref(),
        }
    }

    pub fn is_async(&self) -> bool {
        match *self {
            Self::Function(function) => function.r#async,
            Self::Arrow(arrow) => arrow.r#async,
        }
    }

    /// Body statements; empty for bodiless declarations.
    pub fn statements(&self) -> &'n [Statement<'a>] {
        match *self {
            Self::Function(function) => match &function.body {
                Some(body) => &body.statements[..],
                None => &[],
            },
            Self::Arrow(arrow) => &arrow.body.statements[..],
        }
    }

    /// The expression of a concise arrow body, `() => expr`.
    pub fn concise_body(&self) -> Option<&'n Expression<'a>> {
        let Self::Arrow(arrow) = *self else {
            return None;
        };
        if !arrow.expression {
            return None;
        }
        match arrow.body.statements.first() {
            Some(Statement::ExpressionStatement(statement)) => Some(&statement.expression),
            _ => None,
        }
    }
}

/// Closed set of expression shapes the analyzers understand.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape<'n, 'a> {
    Function(FunctionLike<'n, 'a>),
    ObjectLiteral(&'n ObjectExpression<'a>),
    Class(&'n Class<'a>),
    New(&'n NewExpression<'a>),
    Identifier(&'n str),
    Literal(&'n Expression<'a>),
    Other(&'n Expression<'a>),
}

impl<'n, 'a> Shape<'n, 'a> {
    /// Classify an already stripped expression.
    pub fn classify(expression: &'n Expression<'a>) -> Self {
        match expression {
            Expression::ArrowFunctionExpression(arrow) => Self::Function(FunctionLike::Arrow(arrow)),
            Expression::FunctionExpression(function) => {
                Self::Function(FunctionLike::Function(function))
            }
            Expression::ObjectExpression(object) => Self::ObjectLiteral(object),
            Expression::ClassExpression(class) => Self::Class(class),
            Expression::NewExpression(new) => Self::New(new),
            Expression::Identifier(ident) if ident.name.as_str() == "undefined" => {
                Self::Literal(expression)
            }
            Expression::Identifier(ident) => Self::Identifier(ident.name.as_str()),
            Expression::StringLiteral(_)
            | Expression::NumericLiteral(_)
            | Expression::BooleanLiteral(_)
            | Expression::NullLiteral(_)
            | Expression::BigIntLiteral(_)
            | Expression::TemplateLiteral(_)
            | Expression::ArrayExpression(_)
            | Expression::UnaryExpression(_) => Self::Literal(expression),
            _ => Self::Other(expression),
        }
    }
}

/// A classified expression and whether a wrapper call was looked through.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Normalized<'n, 'a> {
    pub shape: Shape<'n, 'a>,
    pub unwrapped: bool,
}

impl<'n, 'a> Normalized<'n, 'a> {
    pub fn plain(shape: Shape<'n, 'a>) -> Self {
        Self {
            shape,
            unwrapped: false,
        }
    }
}

/// Remove parentheses and TypeScript-only expression wrappers.
pub(crate) fn strip<'n, 'a>(mut expression: &'n Expression<'a>) -> &'n Expression<'a> {
    loop {
        expression = match expression {
            Expression::ParenthesizedExpression(inner) => &inner.expression,
            Expression::TSAsExpression(inner) => &inner.expression,
            Expression::TSSatisfiesExpression(inner) => &inner.expression,
            Expression::TSNonNullExpression(inner) => &inner.expression,
            Expression::TSTypeAssertion(inner) => &inner.expression,
            Expression::TSInstantiationExpression(inner) => &inner.expression,
            _ => return expression,
        };
    }
}

/// Strip, unwrap at most one wrapper call, and classify.
pub(crate) fn normalize<'c, 'a>(
    ctx: FileContext<'c, 'a>,
    expression: &'c Expression<'a>,
) -> Normalized<'c, 'a> {
    let stripped = strip(expression);
    match unwrap_wrapper(ctx, stripped) {
        Some(inner) => Normalized {
            shape: Shape::classify(strip(inner)),
            unwrapped: true,
        },
        None => Normalized::plain(Shape::classify(stripped)),
    }
}

/// First argument of a recognized wrapper call.
///
/// A call counts as a wrapper only when its callee is one of the configured
/// names and is imported. A callee imported from anything other than the
/// configured package is reported and left alone.
pub(crate) fn unwrap_wrapper<'c, 'a>(
    ctx: FileContext<'c, 'a>,
    expression: &'c Expression<'a>,
) -> Option<&'c Expression<'a>> {
    let wrappers = ctx.session.options().wrappers.as_ref()?;
    let Expression::CallExpression(call) = expression else {
        return None;
    };
    let Expression::Identifier(callee) = strip(&call.callee) else {
        return None;
    };
    let name = callee.name.as_str();
    if !wrappers.names.iter().any(|wrapper| wrapper == name) {
        return None;
    }

    let Some(binding) = ctx.import(name) else {
        tracing::trace!(function = name, "wrapper name is not imported, treating as a plain call");
        return None;
    };
    if let ImportSource::Unresolved(specifier) = &binding.source {
        tracing::debug!(
            function = name,
            specifier = %specifier,
            "wrapper import does not resolve, treating as a plain call"
        );
        return None;
    }
    if !wrappers.accepts(&binding.specifier) {
        tracing::warn!(
            function = name,
            file = %ctx.file.path().display(),
            source = %binding.specifier,
            expected = %wrappers.package,
            "`{name}` is not imported from `{}`, leaving the call unwrapped",
            wrappers.package
        );
        return None;
    }

    call.arguments.first()?.as_expression()
}
