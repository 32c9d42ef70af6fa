/// Pattern fragments shared by the rewrite rules.
/// These mirror the token shapes of the legacy dialect and are spliced into larger patterns.

// Identifiers and literals
pub const ID: &str = r"\b[A-Za-z_]\w*\b";
pub const NUM: &str = r"\b\d+\b";
pub const FUNC_ID: &str = r"\b[A-Za-z_]\w*(?:::\w*)*\b";
pub const VAR: &str = r"(?:\b[A-Za-z_]\w*->)*[A-Za-z_]\w*";
pub const ACCESS_LEVEL: &str = "public|private|protected";

/// Seed registry entry: any name qualified under the `System` namespace
pub const SYSTEM_NAMESPACE_PATTERN: &str = r"System::\b[\w:]+";

/// Names that can never denote a managed type
pub const RESERVED_TYPE_NAMES: &[&str] = &["void"];

// File selection defaults
pub const DEFAULT_EXTENSIONS: &[&str] = &["h", "cpp", "C"];
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Marker that starts a comment-only line; such lines are never rewritten
pub const LINE_COMMENT: &str = "//";

/// Returns `VAR|NUM` as a single alternation usable inside a group
pub fn var_or_num() -> String {
    format!("{}|{}", VAR, NUM)
}

/// Returns `ID|NUM` as a single alternation usable inside a group
pub fn id_or_num() -> String {
    format!("{}|{}", ID, NUM)
}
