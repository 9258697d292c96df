//! Member signatures and their text rendering.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered member name to signature mapping.
///
/// Insertion order is the render order.
pub type MemberMap = IndexMap<String, MemberSignature>;

/// Inferred signature of one member of a synthesized interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberSignature {
    Property(PropertySignature),
    Method(MethodSignature),
}

impl MemberSignature {
    /// Creates a required property with the given rendered type.
    pub fn property(type_text: impl Into<String>) -> Self {
        Self::Property(PropertySignature {
            type_text: type_text.into(),
            optional: false,
        })
    }

    /// Returns the type a consumer sees when reading this member as a value.
    ///
    /// Methods collapse to their function type.
    pub fn value_type(&self) -> String {
        match self {
            Self::Property(property) => property.type_text.clone(),
            Self::Method(method) => method.function_type_text(),
        }
    }

    /// Renders the member as one line of an interface body.
    pub fn member_text(&self, name: &str) -> String {
        match self {
            Self::Property(property) => {
                let marker = if property.optional { "?" } else { "" };
                format!("{name}{marker}: {};", property.type_text)
            }
            Self::Method(method) => format!(
                "{name}{}({}): {};",
                method.type_parameters_text(),
                method.parameters_text(),
                method.return_type
            ),
        }
    }
}

/// A value-typed member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySignature {
    /// Rendered type text.
    #[serde(rename = "type")]
    pub type_text: String,
    /// Whether the member may be absent.
    #[serde(default)]
    pub optional: bool,
}

/// A callable member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Generic parameter names, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
    /// Ordered parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Rendered return type.
    pub return_type: String,
}

impl MethodSignature {
    /// Renders `<T>(a: A, b?: B) => R`.
    pub fn function_type_text(&self) -> String {
        format!(
            "{}({}) => {}",
            self.type_parameters_text(),
            self.parameters_text(),
            self.return_type
        )
    }

    fn type_parameters_text(&self) -> String {
        if self.type_parameters.is_empty() {
            String::new()
        } else {
            format!("<{}>", self.type_parameters.join(", "))
        }
    }

    fn parameters_text(&self) -> String {
        self.parameters
            .iter()
            .map(Parameter::text)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One parameter of a [`MethodSignature`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_text: String,
    #[serde(default)]
    pub optional: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_text: impl Into<String>, optional: bool) -> Self {
        Self {
            name: name.into(),
            type_text: type_text.into(),
            optional,
        }
    }

    fn text(&self) -> String {
        // Rest parameters cannot carry an optional marker.
        let marker = if self.optional && !self.name.starts_with("...") {
            "?"
        } else {
            ""
        };
        format!("{}{marker}: {}", self.name, self.type_text)
    }
}

/// Renders a member map as `{ a: A; b(): B; }`.
pub fn render_members(members: &MemberMap) -> String {
    if members.is_empty() {
        return "{}".to_string();
    }
    let body = members
        .iter()
        .map(|(name, member)| member.member_text(name))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{{ {body} }}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(parameters: Vec<Parameter>, return_type: &str) -> MemberSignature {
        MemberSignature::Method(MethodSignature {
            type_parameters: Vec::new(),
            parameters,
            return_type: return_type.to_string(),
        })
    }

    #[test]
    fn renders_members_in_insertion_order() {
        let mut members = MemberMap::new();
        members.insert("bar".to_string(), MemberSignature::property("string"));
        members.insert("getBar".to_string(), method(Vec::new(), "string"));
        members.insert(
            "setBar".to_string(),
            method(vec![Parameter::new("bar", "any", false)], "void"),
        );

        assert_eq!(
            render_members(&members),
            "{ bar: string; getBar(): string; setBar(bar: any): void; }"
        );
    }

    #[test]
    fn renders_optional_and_generic_members() {
        let signature = MethodSignature {
            type_parameters: vec!["T".to_string()],
            parameters: vec![
                Parameter::new("value", "T", false),
                Parameter::new("fallback", "T", true),
                Parameter::new("...rest", "any[]", true),
            ],
            return_type: "T".to_string(),
        };

        assert_eq!(
            signature.function_type_text(),
            "<T>(value: T, fallback?: T, ...rest: any[]) => T"
        );
        assert_eq!(
            MemberSignature::Method(signature).member_text("pick"),
            "pick<T>(value: T, fallback?: T, ...rest: any[]): T;"
        );

        let optional = MemberSignature::Property(PropertySignature {
            type_text: "number".to_string(),
            optional: true,
        });
        assert_eq!(optional.member_text("count"), "count?: number;");
    }

    #[test]
    fn empty_member_map_renders_empty_block() {
        assert_eq!(render_members(&MemberMap::new()), "{}");
    }
}
