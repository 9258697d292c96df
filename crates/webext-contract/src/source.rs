//! Parsed source files and their lazily built top-level indices.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, Declaration, Expression, ImportDeclarationSpecifier, ObjectPropertyKind,
    Program, Statement, TSEnumDeclaration, TSEnumMemberName, UnaryOperator, VariableDeclaration,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use rustc_hash::FxHashMap;

use crate::error::{ContractError, Result};
use crate::jsdoc::{collect_typedefs, parse_jsdoc, ParsedJsDoc};
use crate::resolver::{ImportResolver, ImportSource};

/// Folding stops following identifier chains after this many hops.
const MAX_FOLD_DEPTH: usize = 32;

/// What a local import binding refers to in its source module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

/// One locally bound import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Specifier as written in the import declaration.
    pub specifier: String,
    /// Where the specifier resolved to.
    pub source: ImportSource,
    /// The binding's name inside the source module.
    pub imported: ImportedName,
}

/// Local name to import binding.
pub type ImportMap = IndexMap<String, ImportBinding>;

/// A statically folded literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticValue {
    /// The initializer is not a literal.
    Unknown,
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<StaticValue>),
    Object(IndexMap<String, StaticValue>),
    /// Non-literal enum initializer, kept as source text.
    Text(String),
}

impl StaticValue {
    /// Coarse type of the value, `None` when it cannot be told.
    pub fn coarse_type(&self) -> Option<String> {
        match self {
            Self::Unknown | Self::Text(_) => None,
            Self::Undefined => Some("undefined".to_string()),
            Self::Null => Some("null".to_string()),
            Self::Bool(_) => Some("boolean".to_string()),
            Self::Number(_) => Some("number".to_string()),
            Self::String(_) => Some("string".to_string()),
            Self::Array(items) => {
                let types: Vec<String> = items
                    .iter()
                    .map(|item| item.coarse_type().unwrap_or_else(|| "any".to_string()))
                    .collect();
                Some(array_type_text(&types))
            }
            Self::Object(entries) => {
                if entries.is_empty() {
                    return Some("{}".to_string());
                }
                let body = entries
                    .iter()
                    .map(|(key, value)| {
                        let ty = value.coarse_type().unwrap_or_else(|| "any".to_string());
                        format!("{key}: {ty};")
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(format!("{{ {body} }}"))
            }
        }
    }
}

/// Array type over the distinct element types, `any[]` when empty.
pub(crate) fn array_type_text(element_types: &[String]) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for ty in element_types {
        if !distinct.contains(&ty.as_str()) {
            distinct.push(ty);
        }
    }
    match distinct.as_slice() {
        [] => "any[]".to_string(),
        [single] if single.contains(' ') => format!("({single})[]"),
        [single] => format!("{single}[]"),
        many => format!("({})[]", many.join(" | ")),
    }
}

/// One top-level variable binding.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub name: String,
    pub value: StaticValue,
    pub exported: bool,
}

/// Variable name to record, in declaration order.
pub type VariableMap = IndexMap<String, VariableRecord>;

/// Enum name to its `member -> value text` pairs.
pub type EnumMap = IndexMap<String, IndexMap<String, String>>;

/// A parsed source file.
///
/// Owns one syntax tree. The import, variable, enum and comment indices are
/// built on first access and never change afterwards.
pub struct SourceFile<'a> {
    path: PathBuf,
    source_text: &'a str,
    program: Program<'a>,
    imports: OnceCell<ImportMap>,
    variables: OnceCell<VariableMap>,
    enums: OnceCell<EnumMap>,
    doc_comments: OnceCell<FxHashMap<u32, Span>>,
    typedefs: OnceCell<FxHashMap<String, String>>,
}

impl<'a> SourceFile<'a> {
    /// Parse `source` into a new file handle.
    ///
    /// The text is copied into the allocator so the tree and its source share
    /// one lifetime.
    pub fn parse(allocator: &'a Allocator, path: impl Into<PathBuf>, source: &str) -> Result<Self> {
        let path = path.into();
        let source_text: &'a str = allocator.alloc_str(source);
        let source_type = SourceType::from_path(&path).unwrap_or_else(|_| SourceType::ts());

        let parsed = Parser::new(allocator, source_text, source_type).parse();
        if parsed.panicked || !parsed.errors.is_empty() {
            let diagnostics: Vec<String> =
                parsed.errors.iter().map(|error| error.to_string()).collect();
            return Err(ContractError::parse_error(path, &diagnostics));
        }

        Ok(Self {
            path,
            source_text,
            program: parsed.program,
            imports: OnceCell::new(),
            variables: OnceCell::new(),
            enums: OnceCell::new(),
            doc_comments: OnceCell::new(),
            typedefs: OnceCell::new(),
        })
    }

    /// Read and parse a file from disk.
    pub fn read(allocator: &'a Allocator, path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|error| ContractError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        Self::parse(allocator, path, &source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_text(&self) -> &'a str {
        self.source_text
    }

    /// The syntax tree.
    pub fn program(&self) -> &Program<'a> {
        &self.program
    }

    /// Source text covered by `span`.
    pub fn text(&self, span: Span) -> &'a str {
        let start = span.start as usize;
        let end = span.end as usize;
        &self.source_text[start..end]
    }

    /// Named, default and namespace imports, resolved through `resolver`.
    ///
    /// Resolution happens once; later calls return the cached map whatever
    /// resolver they pass.
    pub fn imports(&self, resolver: &dyn ImportResolver) -> &ImportMap {
        self.imports.get_or_init(|| self.collect_imports(resolver))
    }

    fn collect_imports(&self, resolver: &dyn ImportResolver) -> ImportMap {
        let mut imports = ImportMap::new();
        for statement in self.program.body.iter() {
            let Statement::ImportDeclaration(import) = statement else {
                continue;
            };
            let Some(specifiers) = &import.specifiers else {
                continue;
            };
            let specifier = import.source.value.to_string();
            let source = resolver.resolve(&specifier, &self.path);
            for item in specifiers.iter() {
                let (local, imported) = match item {
                    ImportDeclarationSpecifier::ImportSpecifier(named) => (
                        named.local.name.to_string(),
                        ImportedName::Named(named.imported.name().to_string()),
                    ),
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                        (default.local.name.to_string(), ImportedName::Default)
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
                        (namespace.local.name.to_string(), ImportedName::Namespace)
                    }
                };
                imports.insert(
                    local,
                    ImportBinding {
                        specifier: specifier.clone(),
                        source: source.clone(),
                        imported,
                    },
                );
            }
        }
        imports
    }

    /// Top-level variables with their folded values.
    ///
    /// Names exported through `export { a as b }` and `export default a` are
    /// aliased into the same map under `b` and `default`.
    pub fn variables(&self) -> &VariableMap {
        self.variables.get_or_init(|| self.collect_variables())
    }

    fn collect_variables(&self) -> VariableMap {
        let declarations = self.top_level_variable_declarations();
        let initializers = self.initializers();
        let folder = Folder {
            initializers: &initializers,
            enums: self.enums(),
        };
        let mut variables = VariableMap::new();
        for (declaration, exported) in declarations {
            for declarator in declaration.declarations.iter() {
                let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind else {
                    continue;
                };
                let value = declarator
                    .init
                    .as_ref()
                    .map_or(StaticValue::Undefined, |init| folder.fold(init, 0));
                variables.insert(
                    id.name.to_string(),
                    VariableRecord {
                        name: id.name.to_string(),
                        value,
                        exported,
                    },
                );
            }
        }

        // Export clauses alias existing bindings.
        for statement in self.program.body.iter() {
            match statement {
                Statement::ExportNamedDeclaration(export) if export.source.is_none() => {
                    for specifier in export.specifiers.iter() {
                        let local = specifier.local.name();
                        let exported = specifier.exported.name();
                        if let Some(record) = variables.get_mut(local.as_str()) {
                            record.exported = true;
                            let alias = VariableRecord {
                                name: exported.to_string(),
                                ..record.clone()
                            };
                            if exported != local {
                                variables.insert(exported.to_string(), alias);
                            }
                        }
                    }
                }
                Statement::ExportDefaultDeclaration(export) => {
                    if let Some(Expression::Identifier(id)) = export.declaration.as_expression() {
                        if let Some(record) = variables.get(id.name.as_str()) {
                            let alias = VariableRecord {
                                name: "default".to_string(),
                                exported: true,
                                ..record.clone()
                            };
                            variables.insert("default".to_string(), alias);
                        }
                    }
                }
                _ => {}
            }
        }

        variables
    }

    /// Top-level enums, member values as initializer text or the member name.
    pub fn enums(&self) -> &EnumMap {
        self.enums.get_or_init(|| {
            let mut enums = EnumMap::new();
            for statement in self.program.body.iter() {
                let declaration = match statement {
                    Statement::TSEnumDeclaration(declaration) => declaration,
                    Statement::ExportNamedDeclaration(export) => match &export.declaration {
                        Some(Declaration::TSEnumDeclaration(declaration)) => declaration,
                        _ => continue,
                    },
                    _ => continue,
                };
                enums.insert(declaration.id.name.to_string(), self.enum_members(declaration));
            }
            enums
        })
    }

    fn enum_members(&self, declaration: &TSEnumDeclaration<'a>) -> IndexMap<String, String> {
        let mut members = IndexMap::new();
        for member in declaration.body.members.iter() {
            let name = match &member.id {
                TSEnumMemberName::Identifier(ident) => ident.name.to_string(),
                TSEnumMemberName::String(lit) => lit.value.to_string(),
                _ => continue,
            };
            let value = member
                .initializer
                .as_ref()
                .map_or_else(|| name.clone(), |init| self.text(init.span()).to_string());
            members.insert(name, value);
        }
        members
    }

    /// JSDoc comment attached to the token starting at `offset`, if any.
    pub fn jsdoc_at(&self, offset: u32) -> Option<ParsedJsDoc> {
        let comments = self.doc_comments.get_or_init(|| {
            let mut map = FxHashMap::default();
            for comment in self.program.comments.iter() {
                if comment.is_jsdoc() {
                    map.insert(comment.attached_to, comment.content_span());
                }
            }
            map
        });
        let span = comments.get(&offset)?;
        let parsed = parse_jsdoc(self.text(*span), self.typedefs());
        (!parsed.is_empty()).then_some(parsed)
    }

    /// First JSDoc found among several candidate anchors.
    pub fn jsdoc_for(&self, offsets: &[u32]) -> Option<ParsedJsDoc> {
        offsets.iter().find_map(|offset| self.jsdoc_at(*offset))
    }

    /// `@typedef` definitions declared anywhere in the file.
    pub fn typedefs(&self) -> &FxHashMap<String, String> {
        self.typedefs.get_or_init(|| {
            collect_typedefs(
                self.program
                    .comments
                    .iter()
                    .filter(|comment| comment.is_jsdoc())
                    .map(|comment| self.text(comment.content_span())),
            )
        })
    }

    /// Fold an arbitrary expression of this file against its top-level bindings.
    pub fn fold(&self, expression: &Expression<'a>) -> StaticValue {
        let initializers = self.initializers();
        Folder {
            initializers: &initializers,
            enums: self.enums(),
        }
        .fold(expression, 0)
    }

    fn top_level_variable_declarations(&self) -> Vec<(&VariableDeclaration<'a>, bool)> {
        let mut declarations = Vec::new();
        for statement in self.program.body.iter() {
            match statement {
                Statement::VariableDeclaration(declaration) => {
                    declarations.push((&**declaration, false));
                }
                Statement::ExportNamedDeclaration(export) => {
                    if let Some(Declaration::VariableDeclaration(declaration)) = &export.declaration
                    {
                        declarations.push((&**declaration, true));
                    }
                }
                _ => {}
            }
        }
        declarations
    }

    fn initializers(&self) -> FxHashMap<&str, &Expression<'a>> {
        let mut initializers = FxHashMap::default();
        for (declaration, _) in self.top_level_variable_declarations() {
            for declarator in declaration.declarations.iter() {
                if let (BindingPatternKind::BindingIdentifier(id), Some(init)) =
                    (&declarator.id.kind, &declarator.init)
                {
                    initializers.insert(id.name.as_str(), init);
                }
            }
        }
        initializers
    }
}

/// Partial constant folding over literal expressions.
struct Folder<'f, 'a> {
    initializers: &'f FxHashMap<&'f str, &'f Expression<'a>>,
    enums: &'f EnumMap,
}

impl<'f, 'a> Folder<'f, 'a> {
    fn fold(&self, expression: &Expression<'a>, depth: usize) -> StaticValue {
        if depth > MAX_FOLD_DEPTH {
            return StaticValue::Unknown;
        }
        match expression {
            Expression::StringLiteral(lit) => StaticValue::String(lit.value.to_string()),
            Expression::NumericLiteral(lit) => StaticValue::Number(lit.value),
            Expression::BooleanLiteral(lit) => StaticValue::Bool(lit.value),
            Expression::NullLiteral(_) => StaticValue::Null,
            Expression::TemplateLiteral(template) => {
                let mut text = String::new();
                for (idx, quasi) in template.quasis.iter().enumerate() {
                    text.push_str(quasi.value.raw.as_str());
                    if let Some(expression) = template.expressions.get(idx) {
                        match self.fold(expression, depth + 1) {
                            StaticValue::String(value) => text.push_str(&value),
                            StaticValue::Number(value) => text.push_str(&value.to_string()),
                            StaticValue::Bool(value) => text.push_str(&value.to_string()),
                            _ => text.push_str("${}"),
                        }
                    }
                }
                StaticValue::String(text)
            }
            Expression::Identifier(ident) if ident.name.as_str() == "undefined" => StaticValue::Undefined,
            Expression::Identifier(ident) => match self.initializers.get(ident.name.as_str()) {
                Some(init) => self.fold(init, depth + 1),
                None => StaticValue::Unknown,
            },
            Expression::UnaryExpression(unary) => {
                match (unary.operator, self.fold(&unary.argument, depth + 1)) {
                    (UnaryOperator::UnaryNegation, StaticValue::Number(value)) => {
                        StaticValue::Number(-value)
                    }
                    (UnaryOperator::UnaryPlus, StaticValue::Number(value)) => {
                        StaticValue::Number(value)
                    }
                    (UnaryOperator::LogicalNot, StaticValue::Bool(value)) => {
                        StaticValue::Bool(!value)
                    }
                    (UnaryOperator::Void, _) => StaticValue::Undefined,
                    _ => StaticValue::Unknown,
                }
            }
            Expression::ArrayExpression(array) => StaticValue::Array(
                array
                    .elements
                    .iter()
                    .filter_map(|element| element.as_expression())
                    .map(|element| self.fold(element, depth + 1))
                    .collect(),
            ),
            Expression::ObjectExpression(object) => {
                let mut entries = IndexMap::new();
                for property in object.properties.iter() {
                    let ObjectPropertyKind::ObjectProperty(property) = property else {
                        continue;
                    };
                    if let Some(key) = property.key.static_name() {
                        let value = if property.method {
                            StaticValue::Unknown
                        } else {
                            self.fold(&property.value, depth + 1)
                        };
                        entries.insert(key.to_string(), value);
                    }
                }
                StaticValue::Object(entries)
            }
            Expression::StaticMemberExpression(member) => {
                self.member(&member.object, member.property.name.as_str(), depth)
            }
            Expression::ComputedMemberExpression(member) => {
                match self.fold(&member.expression, depth + 1) {
                    StaticValue::String(key) => self.member(&member.object, &key, depth),
                    StaticValue::Number(index) => match self.fold(&member.object, depth + 1) {
                        StaticValue::Array(items) => items
                            .get(index as usize)
                            .cloned()
                            .unwrap_or(StaticValue::Undefined),
                        _ => StaticValue::Unknown,
                    },
                    _ => StaticValue::Unknown,
                }
            }
            Expression::ParenthesizedExpression(inner) => self.fold(&inner.expression, depth + 1),
            Expression::TSAsExpression(inner) => self.fold(&inner.expression, depth + 1),
            Expression::TSSatisfiesExpression(inner) => self.fold(&inner.expression, depth + 1),
            Expression::TSNonNullExpression(inner) => self.fold(&inner.expression, depth + 1),
            _ => StaticValue::Unknown,
        }
    }

    fn member(&self, object: &Expression<'a>, key: &str, depth: usize) -> StaticValue {
        if let Expression::Identifier(ident) = object {
            if let Some(members) = self.enums.get(ident.name.as_str()) {
                return members
                    .get(key)
                    .map_or(StaticValue::Unknown, |text| enum_value(text));
            }
        }
        match self.fold(object, depth + 1) {
            StaticValue::Object(entries) => {
                entries.get(key).cloned().unwrap_or(StaticValue::Undefined)
            }
            StaticValue::Array(items) if key == "length" => {
                StaticValue::Number(items.len() as f64)
            }
            StaticValue::String(text) if key == "length" => {
                StaticValue::Number(text.chars().count() as f64)
            }
            _ => StaticValue::Unknown,
        }
    }
}

fn enum_value(text: &str) -> StaticValue {
    let trimmed = text.trim();
    if let Ok(number) = trimmed.parse::<f64>() {
        return StaticValue::Number(number);
    }
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return StaticValue::String(inner.to_string());
        }
    }
    StaticValue::Text(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse<'a>(allocator: &'a Allocator, source: &str) -> SourceFile<'a> {
        SourceFile::parse(allocator, "/virtual/entry.ts", source).expect("source should parse")
    }

    fn no_resolve(specifier: &str, _: &Path) -> ImportSource {
        ImportSource::Package(specifier.to_string())
    }

    #[test]
    fn folds_literal_variables() {
        let allocator = Allocator::default();
        let file = parse(
            &allocator,
            r#"
                enum Mode { Fast = 1, Slow = "slow", Auto }
                const name = "x";
                export const count = -3;
                const flags = [true, false];
                const config = { nested: { depth: 2 }, mode: Mode.Slow };
                const depth = config.nested.depth;
                const label = `hi ${name}`;
                let computed = Math.random();
                export { name as title };
            "#,
        );
        let variables = file.variables();

        assert_eq!(variables["name"].value, StaticValue::String("x".into()));
        assert!(variables["name"].exported);
        assert_eq!(variables["title"].value, StaticValue::String("x".into()));
        assert_eq!(variables["count"].value, StaticValue::Number(-3.0));
        assert!(variables["count"].exported);
        assert_eq!(
            variables["flags"].value,
            StaticValue::Array(vec![StaticValue::Bool(true), StaticValue::Bool(false)])
        );
        assert_eq!(variables["depth"].value, StaticValue::Number(2.0));
        assert_eq!(variables["label"].value, StaticValue::String("hi x".into()));
        assert_eq!(variables["computed"].value, StaticValue::Unknown);
        assert_eq!(
            variables["config"].value.coarse_type().as_deref(),
            Some("{ nested: { depth: number; }; mode: string; }")
        );

        let mode = &file.enums()["Mode"];
        assert_eq!(mode["Fast"], "1");
        assert_eq!(mode["Slow"], "\"slow\"");
        assert_eq!(mode["Auto"], "Auto");
    }

    #[test]
    fn default_export_identifier_is_aliased() {
        let allocator = Allocator::default();
        let file = parse(&allocator, "const service = { a: 1 };\nexport default service;");
        let record = &file.variables()["default"];
        assert!(record.exported);
        assert_eq!(record.name, "default");
    }

    #[test]
    fn collects_import_bindings() {
        let allocator = Allocator::default();
        let file = parse(
            &allocator,
            r#"
                import Default, { named as renamed, other } from "pkg";
                import * as ns from "./local";
                import "side-effect";
            "#,
        );
        let imports = file.imports(&no_resolve);

        assert_eq!(imports.len(), 4);
        assert_eq!(imports["Default"].imported, ImportedName::Default);
        assert_eq!(
            imports["renamed"].imported,
            ImportedName::Named("named".to_string())
        );
        assert_eq!(imports["ns"].imported, ImportedName::Namespace);
        assert_eq!(imports["ns"].specifier, "./local");
        assert_eq!(imports["other"].source, ImportSource::Package("pkg".into()));
    }

    #[test]
    fn finds_attached_jsdoc() {
        let allocator = Allocator::default();
        let source = "/** @type {Record<string, number>} */\nexport const table = {};";
        let file = parse(&allocator, source);
        let doc = file.jsdoc_at(source.find("export").unwrap() as u32).unwrap();
        assert_eq!(doc.type_text.as_deref(), Some("Record<string, number>"));
        assert!(file.jsdoc_at(0).is_none());
    }

    #[test]
    fn reports_parse_errors() {
        let allocator = Allocator::default();
        let error = SourceFile::parse(&allocator, "/virtual/bad.ts", "const = ;")
            .err()
            .expect("parse should fail");
        assert!(matches!(error, ContractError::Parse { .. }));
    }

    #[test]
    fn array_types_collapse_duplicates() {
        assert_eq!(array_type_text(&[]), "any[]");
        assert_eq!(
            array_type_text(&["string".into(), "string".into()]),
            "string[]"
        );
        assert_eq!(
            array_type_text(&["string".into(), "number".into()]),
            "(string | number)[]"
        );
    }
}
