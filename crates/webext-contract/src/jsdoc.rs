//! JSDoc type extraction.
//!
//! Only the type-bearing tags matter here: `@type`, `@param`, `@returns`,
//! `@template` and `@typedef` with its `@property` lines. Type text coming out
//! of this module is already normalized and always wins over structural
//! annotations on the same element.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Type information parsed from one JSDoc block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedJsDoc {
    /// Value type from `@type {T}`.
    pub type_text: Option<String>,
    /// Parameter types keyed by parameter name. Dotted names are folded into
    /// an inline object type on their root parameter.
    pub parameters: IndexMap<String, JsDocParam>,
    /// Return type from `@returns {T}` / `@return {T}`.
    pub returns: Option<String>,
    /// Generic parameter names from `@template`.
    pub templates: Vec<String>,
    /// Local type definitions from `@typedef`.
    pub typedefs: IndexMap<String, String>,
}

impl ParsedJsDoc {
    /// Returns `true` if the comment carries no type information.
    pub fn is_empty(&self) -> bool {
        self.type_text.is_none()
            && self.parameters.is_empty()
            && self.returns.is_none()
            && self.templates.is_empty()
            && self.typedefs.is_empty()
    }

    /// Type documented for the given parameter name.
    pub fn parameter(&self, name: &str) -> Option<&JsDocParam> {
        self.parameters.get(name)
    }
}

/// A documented parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocParam {
    pub type_text: String,
    pub optional: bool,
}

/// Parse a JSDoc block (without comment delimiters).
///
/// `typedefs` holds type definitions visible in the surrounding file; names
/// found there are substituted into the extracted type text.
pub fn parse_jsdoc(raw: &str, typedefs: &FxHashMap<String, String>) -> ParsedJsDoc {
    let mut parsed = ParsedJsDoc::default();
    let mut params: Vec<RawParam> = Vec::new();
    let mut current_typedef: Option<TypedefBuilder> = None;

    for line in normalize_lines(raw) {
        let Some(rest) = line.strip_prefix('@') else {
            continue;
        };
        let (tag, payload) = split_tag_payload(rest);
        match tag {
            "type" => {
                let (type_hint, _) = parse_type_and_rest(payload);
                if let Some(ty) = type_hint {
                    parsed.type_text = Some(normalize_type(&ty, typedefs));
                }
            }
            "param" | "arg" | "argument" => {
                if let Some(param) = parse_param(payload, typedefs) {
                    params.push(param);
                }
            }
            "returns" | "return" => {
                if let (Some(ty), _) = parse_type_and_rest(payload) {
                    parsed.returns = Some(normalize_type(&ty, typedefs));
                }
            }
            "template" => {
                // `@template {Constraint} T, U` or `@template T`
                let (_, rest) = parse_type_and_rest(payload);
                let names = rest.unwrap_or_default();
                parsed.templates.extend(
                    names
                        .split(',')
                        .filter_map(|part| part.split_whitespace().next())
                        .map(str::to_string),
                );
            }
            "typedef" => {
                if let Some(builder) = current_typedef.take() {
                    builder.finish(&mut parsed.typedefs);
                }
                let (type_hint, rest) = parse_type_and_rest(payload);
                let name = rest
                    .as_deref()
                    .and_then(|rest| rest.split_whitespace().next())
                    .map(str::to_string);
                if let Some(name) = name {
                    current_typedef = Some(TypedefBuilder {
                        name,
                        base: type_hint.map(|ty| normalize_type(&ty, typedefs)),
                        properties: Vec::new(),
                    });
                }
            }
            "property" | "prop" => {
                if let (Some(builder), Some(param)) =
                    (current_typedef.as_mut(), parse_param(payload, typedefs))
                {
                    builder.properties.push(param);
                }
            }
            _ => {}
        }
    }

    if let Some(builder) = current_typedef.take() {
        builder.finish(&mut parsed.typedefs);
    }
    parsed.parameters = group_parameters(params);
    parsed
}

#[derive(Debug, Clone)]
struct RawParam {
    path: Vec<String>,
    type_text: String,
    optional: bool,
}

struct TypedefBuilder {
    name: String,
    base: Option<String>,
    properties: Vec<RawParam>,
}

impl TypedefBuilder {
    fn finish(self, typedefs: &mut IndexMap<String, String>) {
        let rendered = if self.properties.is_empty() {
            self.base.unwrap_or_else(|| "any".to_string())
        } else {
            let grouped = group_parameters(self.properties);
            object_type_text(grouped.iter().map(|(name, param)| (name.as_str(), param)))
        };
        typedefs.insert(self.name, rendered);
    }
}

/// Fold `opts`, `opts.a`, `opts.b.c` into one entry per root parameter.
fn group_parameters(params: Vec<RawParam>) -> IndexMap<String, JsDocParam> {
    let mut roots: IndexMap<String, ParamNode> = IndexMap::new();
    for param in params {
        let mut path = param.path.into_iter();
        let Some(root) = path.next() else { continue };
        let mut node = roots.entry(root).or_default();
        for segment in path {
            node = node.children.entry(segment).or_default();
        }
        node.type_text = Some(param.type_text);
        node.optional = param.optional;
    }
    roots
        .into_iter()
        .map(|(name, node)| {
            let optional = node.optional;
            (
                name,
                JsDocParam {
                    type_text: node.render(),
                    optional,
                },
            )
        })
        .collect()
}

#[derive(Debug, Default)]
struct ParamNode {
    type_text: Option<String>,
    optional: bool,
    children: IndexMap<String, ParamNode>,
}

impl ParamNode {
    fn render(self) -> String {
        if self.children.is_empty() {
            return self.type_text.unwrap_or_else(|| "any".to_string());
        }
        let children: Vec<(String, JsDocParam)> = self
            .children
            .into_iter()
            .map(|(name, child)| {
                let optional = child.optional;
                (
                    name,
                    JsDocParam {
                        type_text: child.render(),
                        optional,
                    },
                )
            })
            .collect();
        object_type_text(children.iter().map(|(name, param)| (name.as_str(), param)))
    }
}

fn object_type_text<'p>(members: impl Iterator<Item = (&'p str, &'p JsDocParam)>) -> String {
    let body = members
        .map(|(name, param)| {
            let marker = if param.optional { "?" } else { "" };
            format!("{name}{marker}: {};", param.type_text)
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{{ {body} }}")
}

/// Collect every `@typedef` declared anywhere in the given comment bodies.
pub fn collect_typedefs<'s>(comments: impl IntoIterator<Item = &'s str>) -> FxHashMap<String, String> {
    let mut typedefs = FxHashMap::default();
    for raw in comments {
        if !raw.contains("@typedef") {
            continue;
        }
        let parsed = parse_jsdoc(raw, &typedefs);
        typedefs.extend(parsed.typedefs);
    }
    typedefs
}

fn normalize_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

fn split_tag_payload(input: &str) -> (&str, &str) {
    let mut parts = input.splitn(2, char::is_whitespace);
    let tag = parts.next().unwrap_or("");
    let payload = parts.next().unwrap_or("").trim();
    (tag, payload)
}

fn parse_param(payload: &str, typedefs: &FxHashMap<String, String>) -> Option<RawParam> {
    let (type_hint, rest) = parse_type_and_rest(payload);
    let rest = rest.unwrap_or_default();
    let token = rest.split_whitespace().next()?;

    let (name, bracketed) = match token.strip_prefix('[') {
        Some(inner) => {
            // `[name]` or `[name=default]`
            let inner = inner.trim_end_matches(']');
            let name = inner.split('=').next().unwrap_or(inner);
            (name, true)
        }
        None => (token, false),
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let (type_text, type_optional) = match type_hint {
        Some(ty) => match ty.strip_suffix('=') {
            Some(stripped) => (normalize_type(stripped, typedefs), true),
            None => (normalize_type(&ty, typedefs), false),
        },
        None => ("any".to_string(), false),
    };

    Some(RawParam {
        path: name.split('.').map(str::to_string).collect(),
        type_text,
        optional: bracketed || type_optional,
    })
}

/// Split `{type} rest` into its parts, honouring nested braces in the type.
fn parse_type_and_rest(payload: &str) -> (Option<String>, Option<String>) {
    let trimmed = payload.trim();
    if let Some(stripped) = trimmed.strip_prefix('{') {
        let mut depth = 1usize;
        for (idx, ch) in stripped.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let ty = stripped[..idx].trim();
                        let rest = stripped[idx + 1..].trim();
                        let ty = (!ty.is_empty()).then(|| ty.to_string());
                        let rest = (!rest.is_empty()).then(|| rest.to_string());
                        return (ty, rest);
                    }
                }
                _ => {}
            }
        }
    }
    let rest = (!trimmed.is_empty()).then(|| trimmed.to_string());
    (None, rest)
}

/// Normalize JSDoc type text into TypeScript-compatible text.
pub fn normalize_type(text: &str, typedefs: &FxHashMap<String, String>) -> String {
    let text = text.trim();
    match text {
        "" | "*" | "?" => return "any".to_string(),
        _ => {}
    }

    // Unions and function types are kept as written.
    if is_function_text(text) || split_top_level(text, '|').len() > 1 {
        return text.to_string();
    }

    if let Some(inner) = text.strip_prefix('!') {
        return normalize_type(inner, typedefs);
    }
    if let Some(inner) = text.strip_prefix('?') {
        return format!("{} | null", normalize_type(inner, typedefs));
    }

    if let Some(element) = text.strip_suffix("[]") {
        return format!("{}[]", normalize_type(element, typedefs));
    }

    if text.starts_with('{') && text.ends_with('}') {
        return normalize_object_text(text, typedefs);
    }

    if let Some((name, args)) = split_generic(text) {
        let args = split_top_level(args, ',')
            .into_iter()
            .map(|arg| normalize_type(arg, typedefs))
            .collect::<Vec<_>>()
            .join(", ");
        return format!("{name}<{args}>");
    }

    if let Some(definition) = typedefs.get(text) {
        return definition.clone();
    }

    text.to_string()
}

fn is_function_text(text: &str) -> bool {
    text.starts_with("function(") || text.starts_with("function (") || text.contains("=>")
}

/// `Name<args>` or JSDoc's `Name.<args>`.
fn split_generic(text: &str) -> Option<(&str, &str)> {
    let open = text.find('<')?;
    let args = text.strip_suffix('>')?.get(open + 1..)?;
    let name = text[..open].trim_end_matches('.');
    if name.is_empty() {
        return None;
    }
    Some((name, args))
}

fn normalize_object_text(text: &str, typedefs: &FxHashMap<String, String>) -> String {
    let inner = text[1..text.len() - 1].trim();
    if inner.is_empty() {
        return "{}".to_string();
    }
    let members = split_top_level(inner, ',')
        .into_iter()
        .flat_map(|part| split_top_level(part, ';'))
        .filter(|part| !part.trim().is_empty())
        .map(|member| match split_top_level(member, ':').as_slice() {
            [key, ty] => format!("{}: {};", key.trim(), normalize_type(ty, typedefs)),
            [key, rest @ ..] => format!("{}: {};", key.trim(), rest.join(":").trim()),
            [] => String::new(),
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{{ {members} }}")
}

/// Split on `separator` outside of any bracket pair.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut previous = '\0';
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' | '(' | '[' | '<' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            // `=>` is not a closing angle bracket.
            '>' if previous != '=' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
        previous = ch;
    }
    parts.push(&text[start..]);
    parts
}
