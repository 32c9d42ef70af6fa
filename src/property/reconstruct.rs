use indexmap::map::Entry;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::block::match_balanced;
use super::{Accessor, AccessorKind, Property, PropertyKey};
use crate::error::{ConvertError, Result};

/// Optional comment line, optional metadata line, then the accessor header
static UNIT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\A(?P<comment>[ \t]*//[^\r\n]*\r?\n)?",
        r"(?P<metadata>[ \t]*\[[^\r\n]*\][ \t]*\r?\n)?",
        r"(?P<indent>[ \t]*)__property[ \t]+",
        r"(?P<return_type>[^()\r\n;{}]*[*^ \t])",
        r"(?P<method>[gs]et)_(?P<name>[A-Za-z]\w*)\s*",
        r"\((?P<args>[^()]*)\)",
    ))
    .expect("property header pattern is valid")
});

static EMPTY_BRACKET_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\[\s*\]\s*;").expect("bracket body pattern is valid"));

/// A parsed run of consecutive accessor declarations
struct Run {
    end: usize,
    indent: String,
    newline: &'static str,
    accessors: Vec<Accessor>,
}

/// Fold runs of `__property` accessor declarations into `property` blocks.
///
/// Text outside the runs is copied unchanged. A brace body that never closes
/// is reported as [`ConvertError::UnterminatedBlock`].
pub fn reconstruct_properties(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    let mut line = 1;

    while pos < text.len() {
        if let Some(run) = parse_run(text, pos, line)? {
            let properties = merge(run.accessors);
            debug!(
                line,
                properties = properties.len(),
                "reconstructed property run"
            );
            out.push_str(&render(&properties, &run.indent, run.newline));
            line += count_newlines(&text[pos..run.end]);
            pos = run.end;
            continue;
        }

        let next = line_end(text, pos);
        out.push_str(&text[pos..next]);
        line += 1;
        pos = next;
    }

    Ok(out)
}

fn parse_run(text: &str, start: usize, start_line: usize) -> Result<Option<Run>> {
    let mut cursor = start;
    let mut line = start_line;
    let mut accessors = Vec::new();
    let mut indent = String::new();

    while let Some((accessor, unit_indent, end)) = parse_unit(text, cursor, line)? {
        if accessors.is_empty() {
            indent = unit_indent;
        }
        accessors.push(accessor);
        let after_blanks = skip_blank_lines(text, end);
        line += count_newlines(&text[cursor..after_blanks]);
        cursor = after_blanks;
    }

    if accessors.is_empty() {
        return Ok(None);
    }

    let newline = if text[start..cursor].contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    };
    Ok(Some(Run {
        end: cursor,
        indent,
        newline,
        accessors,
    }))
}

/// Parse one declaration unit starting at a line start. Returns the accessor,
/// the header's indentation and the offset past the unit's last line.
fn parse_unit(
    text: &str,
    start: usize,
    start_line: usize,
) -> Result<Option<(Accessor, String, usize)>> {
    let Some(caps) = UNIT_HEADER.captures(&text[start..]) else {
        return Ok(None);
    };
    let (Some(whole), Some(name), Some(method)) =
        (caps.get(0), caps.name("name"), caps.name("method"))
    else {
        return Ok(None);
    };
    let Some(kind) = AccessorKind::parse(method.as_str()) else {
        return Ok(None);
    };

    let header_offset = caps.name("indent").map_or(0, |m| m.start());
    let line = start_line + count_newlines(&text[start..start + header_offset]);
    let header_end = start + whole.end();

    let (body, body_end) =
        parse_body(text, header_end).ok_or_else(|| ConvertError::UnterminatedBlock {
            property: name.as_str().to_string(),
            line,
        })?;

    let Some((trailing_comment, end)) = parse_line_tail(text, body_end) else {
        return Ok(None);
    };

    let trimmed = |group: &str| caps.name(group).map(|m| m.as_str().trim().to_string());
    let accessor = Accessor {
        name: name.as_str().to_string(),
        kind,
        return_type: trimmed("return_type").unwrap_or_default(),
        arguments: trimmed("args").unwrap_or_default(),
        comment: trimmed("comment"),
        metadata: trimmed("metadata"),
        body,
        trailing_comment,
        line,
    };
    let indent = caps
        .name("indent")
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    Ok(Some((accessor, indent, end)))
}

/// Returns `None` only for an unterminated brace block
fn parse_body(text: &str, header_end: usize) -> Option<(Option<String>, usize)> {
    let rest = &text[header_end..];
    let start = header_end + (rest.len() - rest.trim_start().len());
    let candidate = &text[start..];

    if candidate.starts_with(';') {
        return Some((Some(";".to_string()), start + 1));
    }
    if let Some(m) = EMPTY_BRACKET_BODY.find(candidate) {
        return Some((Some(m.as_str().to_string()), start + m.end()));
    }
    if candidate.starts_with('{') {
        let close = match_balanced(text, start)?;
        let after = &text[close..];
        let semicolon = after.len() - after.trim_start().len();
        let end = if after[semicolon..].starts_with(';') {
            close + semicolon + 1
        } else {
            close
        };
        return Some((Some(text[start..end].to_string()), end));
    }

    Some((None, header_end))
}

/// After a body only whitespace or a line comment may remain on the line.
/// Returns the trailing comment (if any) and the offset past the line end.
fn parse_line_tail(text: &str, from: usize) -> Option<(Option<String>, usize)> {
    let end = line_end(text, from);
    let tail = text[from..end].trim();
    if tail.is_empty() {
        Some((None, end))
    } else if tail.starts_with("//") {
        Some((Some(tail.to_string()), end))
    } else {
        None
    }
}

fn merge(accessors: Vec<Accessor>) -> IndexMap<PropertyKey, Property> {
    let mut properties: IndexMap<PropertyKey, Property> = IndexMap::new();
    for accessor in accessors {
        match properties.entry(accessor.key()) {
            Entry::Occupied(mut entry) => {
                let line = accessor.line;
                let kind = accessor.kind.as_str();
                if let Some(replaced) = entry.get_mut().attach(accessor) {
                    warn!(
                        property = %entry.key().name,
                        kind,
                        first_line = replaced.line,
                        line,
                        "duplicate property accessor, keeping the later declaration"
                    );
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Property::new(accessor));
            }
        }
    }
    properties
}

fn render(properties: &IndexMap<PropertyKey, Property>, indent: &str, nl: &str) -> String {
    let mut out = String::new();

    for property in properties.values() {
        out.push_str(nl);
        if let Some(metadata) = property.metadata() {
            out.push_str(&format!("{indent}{metadata}{nl}"));
        }

        let qualifier = if property.is_static() { "static " } else { "" };
        let index = property
            .index_type()
            .map(|ty| format!("[{ty}]"))
            .unwrap_or_default();
        out.push_str(&format!(
            "{indent}{qualifier}property {} {}{index} {{{nl}",
            property.data_type(),
            property.name()
        ));

        for (i, accessor) in property.accessors().enumerate() {
            if i > 0 {
                out.push_str(nl);
            }
            if let Some(comment) = &accessor.comment {
                out.push_str(&format!("{indent}  {comment}{nl}"));
            }
            out.push_str(&format!(
                "{indent}  {} {}({}){}",
                accessor.plain_return_type(),
                accessor.kind.as_str(),
                accessor.arguments,
                render_body(accessor.body.as_deref())
            ));
            if let Some(comment) = &accessor.trailing_comment {
                out.push(' ');
                out.push_str(comment);
            }
            out.push_str(nl);
        }

        out.push_str(&format!("{indent}}}{nl}{nl}"));
    }

    out
}

fn render_body(body: Option<&str>) -> String {
    match body {
        None | Some(";") => ";".to_string(),
        Some(body) => format!(" {body}"),
    }
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i + 1)
}

fn skip_blank_lines(text: &str, mut pos: usize) -> usize {
    while pos < text.len() {
        let end = line_end(text, pos);
        if !text[pos..end].trim().is_empty() {
            break;
        }
        pos = end;
    }
    pos
}

fn count_newlines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}
