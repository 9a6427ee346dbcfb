use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Declared type of a schema field or function argument.
///
/// The set is closed. Parsing a type name is total: anything outside the
/// known names (including an empty name) becomes [`FieldType::Any`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Int,
    DateTime,
    Object,
    #[default]
    Any,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Int,
        FieldType::DateTime,
        FieldType::Object,
        FieldType::Any,
    ];

    /// Parse a declared type name, falling back to `Any` for unknown names.
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "int" => FieldType::Int,
            "datetime" => FieldType::DateTime,
            "object" => FieldType::Object,
            "any" => FieldType::Any,
            other => {
                tracing::debug!(declared = other, "Unsupported field type, using fallback");
                FieldType::Any
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Int => "int",
            FieldType::DateTime => "datetime",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::parse(&name)
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::parse(name)
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared record field. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "fieldName")]
    pub name: String,
    #[serde(rename = "fieldType", default)]
    pub field_type: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    pub fn required(&self) -> bool {
        true
    }

    /// Exported identifier of the field in generated records.
    pub fn ident(&self) -> String {
        exported_ident(&self.name)
    }
}

/// A positional function argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    #[serde(rename = "argName")]
    pub name: String,
    #[serde(rename = "argType", default)]
    pub arg_type: FieldType,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, arg_type: FieldType) -> Self {
        Self {
            name: name.into(),
            arg_type,
        }
    }
}

impl From<ArgumentSpec> for FieldSpec {
    fn from(arg: ArgumentSpec) -> Self {
        FieldSpec::new(arg.name, arg.arg_type)
    }
}

/// Ordered field declarations with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Names must be unique, and so must the identifiers generated from them.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        let mut idents: HashMap<String, &str> = HashMap::new();
        for (index, field) in fields.iter().enumerate() {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                    index,
                });
            }
            let ident = field.ident();
            if let Some(other) = idents.get(&ident) {
                return Err(SchemaError::IdentifierCollision {
                    name: field.name.clone(),
                    other: other.to_string(),
                    ident,
                });
            }
            idents.insert(ident, &field.name);
        }
        Ok(Self { fields })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Vec<FieldSpec>> for Schema {
    type Error = SchemaError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        Schema::new(fields)
    }
}

impl From<Schema> for Vec<FieldSpec> {
    fn from(schema: Schema) -> Self {
        schema.fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Activity,
    Function,
    Trigger,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Activity => write!(f, "activity"),
            ArtifactKind::Function => write!(f, "function"),
            ArtifactKind::Trigger => write!(f, "trigger"),
        }
    }
}

/// Upper-case the first character, then make the result a valid identifier
/// with [`rust_ident`].
pub fn exported_ident(name: &str) -> String {
    let mut chars = name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    rust_ident(&capitalized)
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const NOT_RAW: &[&str] = &["crate", "self", "Self", "super", "_"];

/// Turn a declared name into a Rust identifier.
///
/// Characters outside `[A-Za-z0-9_]` become `_` and a leading digit gets a
/// `_` prefix. Keywords are emitted raw (`r#type`), except the few that have
/// no raw form, which get a trailing `_`. An empty name becomes `_unnamed`.
pub fn rust_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() {
        return "_unnamed".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if NOT_RAW.contains(&ident.as_str()) {
        ident.push('_');
    } else if KEYWORDS.contains(&ident.as_str()) {
        ident.insert_str(0, "r#");
    }
    ident
}
