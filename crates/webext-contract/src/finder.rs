//! By-name declaration lookup.
//!
//! Lookup runs in two phases. The statements handed to the finder are checked
//! first, in source order, with `export` and `export default` wrappers seen
//! through. Only when nothing matches there does a pre-order walk descend into
//! nested scopes (function bodies, class bodies, call arguments). The first
//! match wins in both phases; a second top-level match is reported at `debug`.

use oxc_ast::ast::{
    self, BindingPatternKind, Class, ClassElement, ExportDefaultDeclarationKind, Expression,
    Function, Program, Statement, TSImportEqualsDeclaration, TSInterfaceDeclaration,
    TSTypeAliasDeclaration, VariableDeclarator,
};
use oxc_span::GetSpan;

/// What kind of declaration a name was bound by.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DeclarationKind<'n, 'a> {
    Class(&'n Class<'a>),
    Interface(&'n TSInterfaceDeclaration<'a>),
    TypeAlias(&'n TSTypeAliasDeclaration<'a>),
    Variable(&'n VariableDeclarator<'a>),
    Function(&'n Function<'a>),
    ImportEquals(&'n TSImportEqualsDeclaration<'a>),
}

/// A declaration located by the finder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FoundDeclaration<'n, 'a> {
    pub name: &'n str,
    /// Start of the outermost statement, where leading JSDoc attaches.
    pub anchor: u32,
    pub kind: DeclarationKind<'n, 'a>,
}

#[derive(Clone, Copy)]
pub(crate) struct DeclarationFinder<'n, 'a> {
    statements: &'n [Statement<'a>],
}

impl<'n, 'a> DeclarationFinder<'n, 'a> {
    pub fn new(statements: &'n [Statement<'a>]) -> Self {
        Self { statements }
    }

    pub fn program(program: &'n Program<'a>) -> Self {
        Self::new(&program.body[..])
    }

    /// First declaration matching `predicate`, top-level statements first.
    pub fn find(
        &self,
        predicate: impl Fn(&FoundDeclaration<'n, 'a>) -> bool,
    ) -> Option<FoundDeclaration<'n, 'a>> {
        if let Some(found) = self.find_top_level(&predicate) {
            return Some(found);
        }
        self.statements
            .iter()
            .find_map(|statement| self.walk_statement(statement, &predicate, false))
    }

    /// First matching declaration among the finder's own statements only.
    pub fn find_top_level(
        &self,
        predicate: impl Fn(&FoundDeclaration<'n, 'a>) -> bool,
    ) -> Option<FoundDeclaration<'n, 'a>> {
        let mut first: Option<FoundDeclaration<'n, 'a>> = None;
        for statement in self.statements.iter() {
            for declaration in declarations_of(statement) {
                if !predicate(&declaration) {
                    continue;
                }
                match &first {
                    None => first = Some(declaration),
                    Some(existing) => tracing::debug!(
                        name = declaration.name,
                        first = existing.anchor,
                        duplicate = declaration.anchor,
                        "duplicate declaration, keeping the first"
                    ),
                }
            }
        }
        first
    }

    pub fn class(&self, name: &str) -> Option<(&'n Class<'a>, u32)> {
        let found = self.find(|d| {
            d.name == name
                && match d.kind {
                    DeclarationKind::Class(_) => true,
                    DeclarationKind::Variable(declarator) => {
                        declarator.init.as_ref().and_then(class_expression).is_some()
                    }
                    _ => false,
                }
        })?;
        match found.kind {
            DeclarationKind::Class(class) => Some((class, found.anchor)),
            DeclarationKind::Variable(declarator) => declarator
                .init
                .as_ref()
                .and_then(class_expression)
                .map(|class| (class, found.anchor)),
            _ => None,
        }
    }

    pub fn interface(&self, name: &str) -> Option<&'n TSInterfaceDeclaration<'a>> {
        self.find(|d| d.name == name && matches!(d.kind, DeclarationKind::Interface(_)))
            .and_then(|found| match found.kind {
                DeclarationKind::Interface(interface) => Some(interface),
                _ => None,
            })
    }

    pub fn type_alias(&self, name: &str) -> Option<&'n TSTypeAliasDeclaration<'a>> {
        self.find(|d| d.name == name && matches!(d.kind, DeclarationKind::TypeAlias(_)))
            .and_then(|found| match found.kind {
                DeclarationKind::TypeAlias(alias) => Some(alias),
                _ => None,
            })
    }

    pub fn import_equals(&self, name: &str) -> Option<&'n TSImportEqualsDeclaration<'a>> {
        self.find(|d| d.name == name && matches!(d.kind, DeclarationKind::ImportEquals(_)))
            .and_then(|found| match found.kind {
                DeclarationKind::ImportEquals(import) => Some(import),
                _ => None,
            })
    }

    /// A variable or function bound to `name`, the kinds a value reference can hit.
    pub fn value(&self, name: &str) -> Option<FoundDeclaration<'n, 'a>> {
        self.find(|d| {
            d.name == name
                && matches!(
                    d.kind,
                    DeclarationKind::Variable(_)
                        | DeclarationKind::Function(_)
                        | DeclarationKind::Class(_)
                )
        })
    }

    fn walk_statements(
        &self,
        statements: &'n [Statement<'a>],
        predicate: &dyn Fn(&FoundDeclaration<'n, 'a>) -> bool,
    ) -> Option<FoundDeclaration<'n, 'a>> {
        statements
            .iter()
            .find_map(|statement| self.walk_statement(statement, predicate, true))
    }

    fn walk_statement(
        &self,
        statement: &'n Statement<'a>,
        predicate: &dyn Fn(&FoundDeclaration<'n, 'a>) -> bool,
        check_self: bool,
    ) -> Option<FoundDeclaration<'n, 'a>> {
        if check_self {
            if let Some(found) = declarations_of(statement).into_iter().find(|d| predicate(d)) {
                return Some(found);
            }
        }
        match statement {
            Statement::FunctionDeclaration(function) => self.walk_function(function, predicate),
            Statement::ClassDeclaration(class) => self.walk_class(class, predicate),
            Statement::VariableDeclaration(declaration) => declaration
                .declarations
                .iter()
                .filter_map(|declarator| declarator.init.as_ref())
                .find_map(|init| self.walk_expression(init, predicate)),
            Statement::ExpressionStatement(statement) => {
                self.walk_expression(&statement.expression, predicate)
            }
            Statement::ReturnStatement(statement) => statement
                .argument
                .as_ref()
                .and_then(|argument| self.walk_expression(argument, predicate)),
            Statement::BlockStatement(block) => self.walk_statements(&block.body[..], predicate),
            Statement::IfStatement(statement) => self
                .walk_statement(&statement.consequent, predicate, true)
                .or_else(|| {
                    statement
                        .alternate
                        .as_ref()
                        .and_then(|alternate| self.walk_statement(alternate, predicate, true))
                }),
            Statement::TryStatement(statement) => self
                .walk_statements(&statement.block.body[..], predicate)
                .or_else(|| {
                    statement
                        .handler
                        .as_ref()
                        .and_then(|handler| self.walk_statements(&handler.body.body[..], predicate))
                })
                .or_else(|| {
                    statement
                        .finalizer
                        .as_ref()
                        .and_then(|finalizer| self.walk_statements(&finalizer.body[..], predicate))
                }),
            Statement::ForStatement(statement) => {
                self.walk_statement(&statement.body, predicate, true)
            }
            Statement::ForInStatement(statement) => {
                self.walk_statement(&statement.body, predicate, true)
            }
            Statement::ForOfStatement(statement) => {
                self.walk_statement(&statement.body, predicate, true)
            }
            Statement::WhileStatement(statement) => {
                self.walk_statement(&statement.body, predicate, true)
            }
            Statement::DoWhileStatement(statement) => {
                self.walk_statement(&statement.body, predicate, true)
            }
            Statement::LabeledStatement(statement) => {
                self.walk_statement(&statement.body, predicate, true)
            }
            Statement::SwitchStatement(statement) => statement
                .cases
                .iter()
                .find_map(|case| self.walk_statements(&case.consequent[..], predicate)),
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(ast::Declaration::FunctionDeclaration(function)) => {
                    self.walk_function(function, predicate)
                }
                Some(ast::Declaration::ClassDeclaration(class)) => {
                    self.walk_class(class, predicate)
                }
                Some(ast::Declaration::VariableDeclaration(declaration)) => declaration
                    .declarations
                    .iter()
                    .filter_map(|declarator| declarator.init.as_ref())
                    .find_map(|init| self.walk_expression(init, predicate)),
                _ => None,
            },
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                    self.walk_function(function, predicate)
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                    self.walk_class(class, predicate)
                }
                kind => kind
                    .as_expression()
                    .and_then(|expression| self.walk_expression(expression, predicate)),
            },
            Statement::TSExportAssignment(assignment) => {
                self.walk_expression(&assignment.expression, predicate)
            }
            _ => None,
        }
    }

    fn walk_function(
        &self,
        function: &'n Function<'a>,
        predicate: &dyn Fn(&FoundDeclaration<'n, 'a>) -> bool,
    ) -> Option<FoundDeclaration<'n, 'a>> {
        let body = function.body.as_ref()?;
        self.walk_statements(&body.statements[..], predicate)
    }

    fn walk_class(
        &self,
        class: &'n Class<'a>,
        predicate: &dyn Fn(&FoundDeclaration<'n, 'a>) -> bool,
    ) -> Option<FoundDeclaration<'n, 'a>> {
        class.body.body.iter().find_map(|element| match element {
            ClassElement::MethodDefinition(method) => self.walk_function(&method.value, predicate),
            ClassElement::PropertyDefinition(property) => property
                .value
                .as_ref()
                .and_then(|value| self.walk_expression(value, predicate)),
            ClassElement::StaticBlock(block) => self.walk_statements(&block.body[..], predicate),
            _ => None,
        })
    }

    fn walk_expression(
        &self,
        expression: &'n Expression<'a>,
        predicate: &dyn Fn(&FoundDeclaration<'n, 'a>) -> bool,
    ) -> Option<FoundDeclaration<'n, 'a>> {
        match expression {
            Expression::FunctionExpression(function) => self.walk_function(function, predicate),
            Expression::ArrowFunctionExpression(arrow) => {
                self.walk_statements(&arrow.body.statements[..], predicate)
            }
            Expression::ClassExpression(class) => self.walk_class(class, predicate),
            Expression::CallExpression(call) => self
                .walk_expression(&call.callee, predicate)
                .or_else(|| {
                    call.arguments
                        .iter()
                        .filter_map(|argument| argument.as_expression())
                        .find_map(|argument| self.walk_expression(argument, predicate))
                }),
            Expression::NewExpression(new) => new
                .arguments
                .iter()
                .filter_map(|argument| argument.as_expression())
                .find_map(|argument| self.walk_expression(argument, predicate)),
            Expression::ObjectExpression(object) => {
                object.properties.iter().find_map(|property| match property {
                    ast::ObjectPropertyKind::ObjectProperty(property) => {
                        self.walk_expression(&property.value, predicate)
                    }
                    ast::ObjectPropertyKind::SpreadProperty(spread) => {
                        self.walk_expression(&spread.argument, predicate)
                    }
                })
            }
            Expression::ArrayExpression(array) => array
                .elements
                .iter()
                .filter_map(|element| element.as_expression())
                .find_map(|element| self.walk_expression(element, predicate)),
            Expression::ConditionalExpression(conditional) => self
                .walk_expression(&conditional.consequent, predicate)
                .or_else(|| self.walk_expression(&conditional.alternate, predicate)),
            Expression::LogicalExpression(logical) => self
                .walk_expression(&logical.left, predicate)
                .or_else(|| self.walk_expression(&logical.right, predicate)),
            Expression::SequenceExpression(sequence) => sequence
                .expressions
                .iter()
                .find_map(|expression| self.walk_expression(expression, predicate)),
            Expression::AssignmentExpression(assignment) => {
                self.walk_expression(&assignment.right, predicate)
            }
            Expression::AwaitExpression(inner) => self.walk_expression(&inner.argument, predicate),
            Expression::ParenthesizedExpression(inner) => {
                self.walk_expression(&inner.expression, predicate)
            }
            Expression::TSAsExpression(inner) => self.walk_expression(&inner.expression, predicate),
            Expression::TSSatisfiesExpression(inner) => {
                self.walk_expression(&inner.expression, predicate)
            }
            Expression::TSNonNullExpression(inner) => {
                self.walk_expression(&inner.expression, predicate)
            }
            _ => None,
        }
    }
}

/// Declarations a single statement introduces, seeing through `export`.
fn declarations_of<'n, 'a>(statement: &'n Statement<'a>) -> Vec<FoundDeclaration<'n, 'a>> {
    let anchor = statement.span().start;
    match statement {
        Statement::ExportNamedDeclaration(export) => export
            .declaration
            .as_ref()
            .map(|declaration| declarations_in(declaration, anchor))
            .unwrap_or_default(),
        Statement::ExportDefaultDeclaration(export) => {
            let found = match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(function) => function
                    .id
                    .as_ref()
                    .map(|id| (id.name.as_str(), DeclarationKind::Function(function))),
                ExportDefaultDeclarationKind::ClassDeclaration(class) => class
                    .id
                    .as_ref()
                    .map(|id| (id.name.as_str(), DeclarationKind::Class(class))),
                ExportDefaultDeclarationKind::TSInterfaceDeclaration(interface) => Some((
                    interface.id.name.as_str(),
                    DeclarationKind::Interface(interface),
                )),
                _ => None,
            };
            found
                .map(|(name, kind)| FoundDeclaration { name, anchor, kind })
                .into_iter()
                .collect()
        }
        _ => statement
            .as_declaration()
            .map(|declaration| declarations_in(declaration, anchor))
            .unwrap_or_default(),
    }
}

fn declarations_in<'n, 'a>(
    declaration: &'n ast::Declaration<'a>,
    anchor: u32,
) -> Vec<FoundDeclaration<'n, 'a>> {
    let single = |name: &'n str, kind| vec![FoundDeclaration { name, anchor, kind }];
    match declaration {
        ast::Declaration::VariableDeclaration(declaration) => declaration
            .declarations
            .iter()
            .filter_map(|declarator| match &declarator.id.kind {
                BindingPatternKind::BindingIdentifier(id) => Some(FoundDeclaration {
                    name: id.name.as_str(),
                    anchor,
                    kind: DeclarationKind::Variable(declarator),
                }),
                _ => None,
            })
            .collect(),
        ast::Declaration::FunctionDeclaration(function) => match &function.id {
            Some(id) => single(id.name.as_str(), DeclarationKind::Function(function)),
            None => Vec::new(),
        },
        ast::Declaration::ClassDeclaration(class) => match &class.id {
            Some(id) => single(id.name.as_str(), DeclarationKind::Class(class)),
            None => Vec::new(),
        },
        ast::Declaration::TSInterfaceDeclaration(interface) => {
            single(interface.id.name.as_str(), DeclarationKind::Interface(interface))
        }
        ast::Declaration::TSTypeAliasDeclaration(alias) => {
            single(alias.id.name.as_str(), DeclarationKind::TypeAlias(alias))
        }
        ast::Declaration::TSImportEqualsDeclaration(import) => {
            single(import.id.name.as_str(), DeclarationKind::ImportEquals(import))
        }
        _ => Vec::new(),
    }
}

/// The class behind `class {}` / `class X {}` in expression position.
pub(crate) fn class_expression<'n, 'a>(expression: &'n Expression<'a>) -> Option<&'n Class<'a>> {
    match expression.without_parentheses() {
        Expression::ClassExpression(class) => Some(class),
        _ => None,
    }
}

/// Local name a module exports as `exported`.
///
/// Follows `export { local as exported }` clauses and falls back to the name
/// itself.
pub(crate) fn exported_local_name<'n>(program: &'n Program<'_>, exported: &'n str) -> &'n str {
    for statement in program.body.iter() {
        let Statement::ExportNamedDeclaration(export) = statement else {
            continue;
        };
        if export.source.is_some() {
            continue;
        }
        for specifier in export.specifiers.iter() {
            if specifier.exported.name().as_str() == exported {
                if let ast::ModuleExportName::IdentifierReference(local) = &specifier.local {
                    return local.name.as_str();
                }
            }
        }
    }
    exported
}

/// Name bound to the default export, when the export names one.
pub(crate) fn default_export_name<'n>(program: &'n Program<'_>) -> Option<&'n str> {
    program.body.iter().find_map(|statement| {
        let Statement::ExportDefaultDeclaration(export) = statement else {
            return None;
        };
        match &export.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                function.id.as_ref().map(|id| id.name.as_str())
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                class.id.as_ref().map(|id| id.name.as_str())
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(interface) => {
                Some(interface.id.name.as_str())
            }
            ExportDefaultDeclarationKind::Identifier(id) => Some(id.name.as_str()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn with_program(source: &str, check: impl FnOnce(&Program<'_>)) {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, SourceType::ts()).parse();
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        check(&parsed.program);
    }

    #[test]
    fn finds_exported_declarations_at_top_level() {
        with_program(
            r#"
                export interface Options { a: string }
                export type Id = string;
                export default class Service {}
                import Alias = Foo.Bar;
            "#,
            |program| {
                let finder = DeclarationFinder::program(program);
                assert!(finder.interface("Options").is_some());
                assert!(finder.type_alias("Id").is_some());
                assert!(finder.class("Service").is_some());
                assert!(finder.import_equals("Alias").is_some());
                assert!(finder.interface("Missing").is_none());
            },
        );
    }

    #[test]
    fn top_level_wins_over_nested_scopes() {
        with_program(
            r#"
                function factory() {
                    class Store { nested = true }
                    return new Store();
                }
                class Store { outer = true }
            "#,
            |program| {
                let finder = DeclarationFinder::program(program);
                let (class, anchor) = finder.class("Store").unwrap();
                assert!(anchor > 0);
                let first_member = &class.body.body[0];
                let ClassElement::PropertyDefinition(property) = first_member else {
                    panic!("expected a property");
                };
                assert_eq!(property.key.static_name().unwrap(), "outer");
            },
        );
    }

    #[test]
    fn descends_into_function_bodies_and_call_arguments() {
        with_program(
            r#"
                export default wrap(() => {
                    const Hidden = class { value = 1 };
                    return new Hidden();
                });
            "#,
            |program| {
                let finder = DeclarationFinder::program(program);
                assert!(finder.class("Hidden").is_some());
            },
        );
    }

    #[test]
    fn resolves_export_aliases_and_default_names() {
        with_program(
            r#"
                class Impl {}
                export { Impl as Public };
                export default Impl;
            "#,
            |program| {
                assert_eq!(exported_local_name(program, "Public"), "Impl");
                assert_eq!(exported_local_name(program, "Other"), "Other");
                assert_eq!(default_export_name(program), Some("Impl"));
            },
        );
    }
}
