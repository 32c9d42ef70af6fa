use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use regex::Regex;
use tracing::{debug, info};

use crate::constants::{RESERVED_TYPE_NAMES, SYSTEM_NAMESPACE_PATTERN};
use crate::error::{ConvertError, Result};
use crate::rules::syntax::DECLARATION_RULES;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeEntry {
    /// Raw regex fragment, spliced into the alternation as-is
    Pattern(String),
    /// Literal type name, escaped when compiled
    Name(String),
}

impl TypeEntry {
    fn as_str(&self) -> &str {
        match self {
            TypeEntry::Pattern(p) => p,
            TypeEntry::Name(n) => n,
        }
    }

    fn to_fragment(&self) -> String {
        match self {
            TypeEntry::Pattern(p) => p.clone(),
            TypeEntry::Name(n) => regex::escape(n),
        }
    }
}

/// Growable set of managed type names, filled during the scan phase.
///
/// Entries are only ever added. Call [`TypeRegistry::freeze`] once every
/// input has been scanned to get the read-only value the type-aware rules
/// are built from.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: IndexSet<TypeEntry>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut entries = IndexSet::new();
        entries.insert(TypeEntry::Pattern(SYSTEM_NAMESPACE_PATTERN.to_string()));
        Self { entries }
    }

    /// Add a literal type name. Returns false for blank, reserved or already known names.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || RESERVED_TYPE_NAMES.contains(&name) {
            return false;
        }
        self.entries.insert(TypeEntry::Name(name.to_string()))
    }

    /// Add every name yielded by `names`, returning how many were new
    pub fn extend<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().filter(|name| self.add(name.as_ref())).count()
    }

    /// Register every type declared in `text`. The text itself is not modified.
    pub fn scan(&mut self, text: &str) -> usize {
        let discovered = DECLARATION_RULES.scan(text);
        let added = self.extend(&discovered);
        debug!(discovered = discovered.len(), added, "scanned declarations");
        added
    }

    /// Load a user type list: one name per line, blank lines and `#` comments ignored
    pub fn load_type_list(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!(
                "Failed to read managed types file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let added = self.extend(parse_type_list(&content));
        info!(path = %path.display(), added, "loaded user managed types");
        Ok(added)
    }

    /// Exact literal membership (patterns are not evaluated)
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(&TypeEntry::Name(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn registered_types(&self) -> Vec<&str> {
        self.entries.iter().map(TypeEntry::as_str).collect()
    }

    /// Close the registry and compile its alternation
    pub fn freeze(self) -> Result<FrozenRegistry> {
        let alternation = self
            .entries
            .iter()
            .map(TypeEntry::to_fragment)
            .collect::<Vec<_>>()
            .join("|");
        let membership = Regex::new(&format!(r"^(?:[\w:]*::)?(?:{})$", alternation))?;
        info!(types = self.entries.len(), "type registry frozen");

        Ok(FrozenRegistry {
            entries: self.entries.into_iter().collect(),
            alternation,
            membership,
        })
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only snapshot of the registry taken at the freeze point
#[derive(Debug, Clone)]
pub struct FrozenRegistry {
    entries: Vec<TypeEntry>,
    alternation: String,
    membership: Regex,
}

impl FrozenRegistry {
    /// `A|B|System::\b[\w:]+|...`, ready to be wrapped in a group
    pub fn alternation(&self) -> &str {
        &self.alternation
    }

    /// Whether `name` (optionally namespace-qualified) denotes a managed type
    pub fn is_managed(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && self.membership.is_match(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn registered_types(&self) -> Vec<&str> {
        self.entries.iter().map(TypeEntry::as_str).collect()
    }
}

/// Parse the line-oriented user type list format
pub fn parse_type_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
