use anyhow::{Context, Result, bail};
use argentry::{ArgValue, Args, EntryBuilder, Parsed};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// JSON description of the entries a command line is parsed against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    #[default]
    Positional,
    Keyword,
    Flag,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positional => "positional",
            Self::Keyword => "keyword",
            Self::Flag => "flag",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDecl {
    /// Key used in the JSON report (defaults to the canonical key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub kind: DeclKind,

    /// Comma-separated aliases, e.g. `"o,output"`. Ignored for positionals.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keys: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default)]
    pub multi: bool,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

impl EntryDecl {
    pub fn effective_type(&self) -> ValueType {
        self.value_type.unwrap_or(match self.kind {
            DeclKind::Flag => ValueType::single(Scalar::Bool),
            DeclKind::Positional | DeclKind::Keyword => ValueType::single(Scalar::String),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Single,
    List,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scalar {
    #[default]
    String,
    Bool,
    Int,
    Uint,
    Float,
    Char,
    Path,
}

impl Scalar {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Char => "char",
            Self::Path => "path",
        }
    }
}

/// Declared value type: a scalar, optionally wrapped as `list<…>` or
/// `optional<…>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValueType {
    pub shape: Shape,
    pub scalar: Scalar,
}

impl ValueType {
    pub fn single(scalar: Scalar) -> Self {
        Self {
            shape: Shape::Single,
            scalar,
        }
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let wrapped = |prefix: &str| s.strip_prefix(prefix).and_then(|r| r.strip_suffix('>'));
        let (shape, inner) = if let Some(inner) = wrapped("list<") {
            (Shape::List, inner)
        } else if let Some(inner) = wrapped("optional<") {
            (Shape::Optional, inner)
        } else {
            (Shape::Single, s)
        };
        let scalar = match inner.trim() {
            "string" | "str" => Scalar::String,
            "bool" => Scalar::Bool,
            "int" | "i64" => Scalar::Int,
            "uint" | "u64" => Scalar::Uint,
            "float" | "f64" => Scalar::Float,
            "char" => Scalar::Char,
            "path" => Scalar::Path,
            other => return Err(format!("unknown value type: {other}")),
        };
        Ok(Self { shape, scalar })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            Shape::Single => f.write_str(self.scalar.as_str()),
            Shape::List => write!(f, "list<{}>", self.scalar.as_str()),
            Shape::Optional => write!(f, "optional<{}>", self.scalar.as_str()),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ValueType> for String {
    fn from(t: ValueType) -> Self {
        t.to_string()
    }
}

trait ToJson {
    fn to_json(&self) -> Value;
}

impl ToJson for String {
    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToJson for bool {
    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToJson for i64 {
    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl ToJson for u64 {
    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl ToJson for f64 {
    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl ToJson for char {
    fn to_json(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToJson for PathBuf {
    fn to_json(&self) -> Value {
        Value::String(self.display().to_string())
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(ToJson::to_json).collect())
    }
}

impl<T: ToJson> ToJson for Option<T> {
    fn to_json(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToJson::to_json)
    }
}

type Extract = Box<dyn Fn(&Parsed) -> Option<Value>>;

/// A registered entry and how to read its typed value back as JSON.
pub struct BoundEntry {
    pub name: String,
    extract: Extract,
}

impl BoundEntry {
    pub fn value(&self, parsed: &Parsed) -> Option<Value> {
        (self.extract)(parsed)
    }
}

impl fmt::Debug for BoundEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn bind_as<T: ArgValue + ToJson>(builder: EntryBuilder<'_>) -> Extract {
    let handle = builder.bind::<T>();
    Box::new(move |parsed: &Parsed| parsed.get(handle).map(ToJson::to_json))
}

type Single<T> = T;
type List<T> = Vec<T>;
type Optional<T> = Option<T>;

macro_rules! bind_scalar {
    ($builder:expr, $scalar:expr, $wrap:ident) => {
        match $scalar {
            Scalar::String => bind_as::<$wrap<String>>($builder),
            Scalar::Bool => bind_as::<$wrap<bool>>($builder),
            Scalar::Int => bind_as::<$wrap<i64>>($builder),
            Scalar::Uint => bind_as::<$wrap<u64>>($builder),
            Scalar::Float => bind_as::<$wrap<f64>>($builder),
            Scalar::Char => bind_as::<$wrap<char>>($builder),
            Scalar::Path => bind_as::<$wrap<PathBuf>>($builder),
        }
    };
}

fn bind(builder: EntryBuilder<'_>, value_type: ValueType) -> Extract {
    match value_type.shape {
        Shape::Single => bind_scalar!(builder, value_type.scalar, Single),
        Shape::List => bind_scalar!(builder, value_type.scalar, List),
        Shape::Optional => bind_scalar!(builder, value_type.scalar, Optional),
    }
}

impl Declaration {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read declaration: {}", path.display()))?;
        let decl: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse declaration: {}", path.display()))?;
        decl.validate()?;
        Ok(decl)
    }

    fn validate(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.kind != DeclKind::Positional && entry.keys.trim().is_empty() {
                bail!("entry #{i}: {} entries need at least one key", entry.kind);
            }
        }
        let mut names: HashSet<String> = HashSet::new();
        for (i, name) in self.report_names().into_iter().enumerate() {
            if names.contains(&name) {
                bail!("entry #{i}: duplicate name '{name}' (set a distinct \"name\")");
            }
            names.insert(name);
        }
        Ok(())
    }

    /// Name each entry is reported under: its `name`, else its canonical
    /// key, else the positional's `arg_<n>`.
    fn report_names(&self) -> Vec<String> {
        let mut positional = 0usize;
        self.entries
            .iter()
            .map(|entry| {
                let ordinal = positional;
                if entry.kind == DeclKind::Positional {
                    positional += 1;
                }
                if let Some(name) = &entry.name {
                    return name.clone();
                }
                match entry.kind {
                    DeclKind::Positional => format!("arg_{ordinal}"),
                    DeclKind::Keyword | DeclKind::Flag => entry
                        .keys
                        .split(',')
                        .map(str::trim)
                        .find(|k| !k.is_empty())
                        .unwrap_or_default()
                        .to_string(),
                }
            })
            .collect()
    }

    /// Register every declared entry on `args`, in declaration order.
    pub fn register(&self, args: &mut Args) -> Vec<BoundEntry> {
        let mut bound = Vec::with_capacity(self.entries.len());
        for (decl, name) in self.entries.iter().zip(self.report_names()) {
            let builder = match decl.kind {
                DeclKind::Positional => args.add_positional(decl.help.as_str()),
                DeclKind::Keyword => {
                    args.add_keyword(&decl.keys, decl.help.as_str(), decl.implicit.as_deref())
                }
                DeclKind::Flag => args.add_flag(&decl.keys, decl.help.as_str()),
            };
            let builder = match &decl.default {
                Some(text) => builder.set_default_str(text.as_str()),
                None => builder,
            };
            let builder = if decl.multi {
                builder.multi_argument()
            } else {
                builder
            };
            let extract = bind(builder, decl.effective_type());
            bound.push(BoundEntry { name, extract });
        }
        bound
    }
}
