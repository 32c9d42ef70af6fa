//! Accessor and property model used when folding `__property` accessor
//! declarations into C++/CLI `property` blocks.

use once_cell::sync::Lazy;
use regex::Regex;

pub mod block;
pub mod reconstruct;

pub use reconstruct::reconstruct_properties;

static STATIC_QUALIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bstatic\b\s*").expect("static qualifier pattern is valid"));

/// Words that can end a parameter's type, so they are never taken as its name
const TYPE_KEYWORDS: &[&str] = &[
    "bool", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "wchar_t",
    "void", "const",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Get,
    Set,
}

impl AccessorKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "get" => Some(AccessorKind::Get),
            "set" => Some(AccessorKind::Set),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessorKind::Get => "get",
            AccessorKind::Set => "set",
        }
    }
}

/// One parameter of an accessor's argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: String,
    pub name: Option<String>,
}

/// A `get_X`/`set_X` accessor method lifted out of a `__property` declaration
#[derive(Debug, Clone)]
pub struct Accessor {
    pub name: String,
    pub kind: AccessorKind,
    pub return_type: String,
    pub arguments: String,
    pub comment: Option<String>,
    pub metadata: Option<String>,
    /// `;`, `[];` or a `{ ... }` block; `None` when the header had no body
    pub body: Option<String>,
    /// Line comment that followed the body on the same line
    pub trailing_comment: Option<String>,
    /// 1-based line of the `__property` header
    pub line: usize,
}

impl Accessor {
    pub fn parameters(&self) -> Vec<Parameter> {
        let params: Vec<Parameter> = split_top_level(&self.arguments)
            .into_iter()
            .map(|arg| split_parameter(&arg))
            .collect();
        match params.as_slice() {
            [only] if only.ty == "void" && only.name.is_none() => Vec::new(),
            _ => params,
        }
    }

    /// Return type for a getter, type of the last parameter for a setter
    pub fn data_type(&self) -> String {
        match self.kind {
            AccessorKind::Get => self.plain_return_type(),
            AccessorKind::Set => self
                .parameters()
                .last()
                .map(|p| p.ty.clone())
                .unwrap_or_default(),
        }
    }

    /// Type of the first parameter when the accessor is indexed
    pub fn index_type(&self) -> Option<String> {
        let params = self.parameters();
        let minimal = match self.kind {
            AccessorKind::Get => 0,
            AccessorKind::Set => 1,
        };
        if params.len() <= minimal {
            return None;
        }
        params.first().map(|p| p.ty.clone())
    }

    pub fn key(&self) -> PropertyKey {
        PropertyKey {
            name: self.name.clone(),
            index_type: self.index_type(),
        }
    }

    pub fn is_static(&self) -> bool {
        STATIC_QUALIFIER.is_match(&self.return_type)
    }

    /// Return type with any `static` qualifier removed
    pub fn plain_return_type(&self) -> String {
        STATIC_QUALIFIER
            .replace_all(&self.return_type, "")
            .trim()
            .to_string()
    }
}

/// Two accessors belong to the same property when name and index type agree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub name: String,
    pub index_type: Option<String>,
}

/// A merged property: at most one getter and one setter, never neither
#[derive(Debug, Clone)]
pub struct Property {
    getter: Option<Accessor>,
    setter: Option<Accessor>,
}

impl Property {
    pub fn new(accessor: Accessor) -> Self {
        let mut property = Self {
            getter: None,
            setter: None,
        };
        property.attach(accessor);
        property
    }

    /// Attach an accessor, returning the one of the same kind it replaced
    pub fn attach(&mut self, accessor: Accessor) -> Option<Accessor> {
        match accessor.kind {
            AccessorKind::Get => self.getter.replace(accessor),
            AccessorKind::Set => self.setter.replace(accessor),
        }
    }

    pub fn getter(&self) -> Option<&Accessor> {
        self.getter.as_ref()
    }

    pub fn setter(&self) -> Option<&Accessor> {
        self.setter.as_ref()
    }

    /// Getter then setter, skipping absent ones
    pub fn accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.getter.iter().chain(self.setter.iter())
    }

    fn primary(&self) -> &Accessor {
        self.getter
            .as_ref()
            .or(self.setter.as_ref())
            .expect("a property always holds at least one accessor")
    }

    pub fn name(&self) -> &str {
        &self.primary().name
    }

    pub fn data_type(&self) -> String {
        self.primary().data_type()
    }

    pub fn index_type(&self) -> Option<String> {
        self.primary().index_type()
    }

    pub fn metadata(&self) -> Option<&str> {
        self.accessors().find_map(|a| a.metadata.as_deref())
    }

    pub fn is_static(&self) -> bool {
        self.accessors().any(Accessor::is_static)
    }
}

/// Split an argument list on commas that are not nested in `<>`, `()` or `[]`
fn split_top_level(arguments: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in arguments.chars() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn split_parameter(arg: &str) -> Parameter {
    let arg = arg.trim();
    let ident_start = arg
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i);

    if let Some(start) = ident_start {
        let (ty, name) = arg.split_at(start);
        let boundary = ty.chars().last();
        let starts_like_ident = name.chars().next().is_some_and(|c| !c.is_ascii_digit());
        if matches!(boundary, Some(' ' | '\t' | '*' | '^' | '&'))
            && starts_like_ident
            && !ty.trim().is_empty()
            && !TYPE_KEYWORDS.contains(&name)
        {
            return Parameter {
                ty: ty.trim().to_string(),
                name: Some(name.to_string()),
            };
        }
    }

    Parameter {
        ty: arg.to_string(),
        name: None,
    }
}
