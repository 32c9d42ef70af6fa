use std::borrow::Cow;

use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::constants::LINE_COMMENT;
use crate::error::Result;

pub mod syntax;
pub mod typed;

/// How a match is turned into output text
pub enum Replacement {
    /// `${group}` template; groups that did not participate expand to ""
    Template(String),
    /// Formatting function for replacements with optional, space-separated parts
    Format(fn(&Captures) -> String),
}

/// A named pattern -> replacement step
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
    /// Capture group whose text is a discovered managed type name
    registers: Option<&'static str>,
    /// Must match the text right after a match for the replacement to apply
    guard: Option<Regex>,
}

impl Rule {
    pub fn new(name: &'static str, pattern: &str, template: &str) -> Result<Self> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            replacement: Replacement::Template(template.to_string()),
            registers: None,
            guard: None,
        })
    }

    pub fn with_format(
        name: &'static str,
        pattern: &str,
        format: fn(&Captures) -> String,
    ) -> Result<Self> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            replacement: Replacement::Format(format),
            registers: None,
            guard: None,
        })
    }

    /// Mark `group` as the capture holding a type name to register while scanning
    pub fn registering(mut self, group: &'static str) -> Self {
        self.registers = Some(group);
        self
    }

    /// Only rewrite matches whose trailing text matches `pattern` (anchored at the match end)
    pub fn guarded_by(mut self, pattern: &str) -> Result<Self> {
        self.guard = Some(Regex::new(&format!("^(?:{})", pattern))?);
        Ok(self)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Rewrite every accepted match in `line`. Returns `Cow::Borrowed` when nothing matched.
    pub fn apply<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if let (None, Replacement::Template(template)) = (&self.guard, &self.replacement) {
            return self.pattern.replace_all(line, template.as_str());
        }

        let mut out = String::new();
        let mut last = 0;
        let mut changed = false;
        for caps in self.accepted_matches(line) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&line[last..whole.start()]);
            match &self.replacement {
                Replacement::Template(template) => caps.expand(template, &mut out),
                Replacement::Format(format) => out.push_str(&format(&caps)),
            }
            last = whole.end();
            changed = true;
        }

        if !changed {
            return Cow::Borrowed(line);
        }
        out.push_str(&line[last..]);
        Cow::Owned(out)
    }

    /// Names captured by the registering group, without touching the text
    pub fn discover(&self, line: &str) -> Vec<String> {
        let Some(group) = self.registers else {
            return Vec::new();
        };
        self.accepted_matches(line)
            .filter_map(|caps| caps.name(group).map(|m| m.as_str().trim().to_string()))
            .collect()
    }

    fn accepted_matches<'r, 'h>(&'r self, line: &'h str) -> impl Iterator<Item = Captures<'h>> + 'r
    where
        'h: 'r,
    {
        self.pattern.captures_iter(line).filter(move |caps| match (&self.guard, caps.get(0)) {
            (Some(guard), Some(whole)) => guard.is_match(&line[whole.end()..]),
            _ => true,
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// An ordered pipeline of rules. Later rules see earlier rules' output on the same line.
#[derive(Debug)]
pub struct RuleSet {
    name: &'static str,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: &'static str, rules: Vec<Rule>) -> Self {
        Self { name, rules }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite `text` line by line, keeping each line's terminator
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut hits = 0usize;

        for (index, raw) in text.split_inclusive('\n').enumerate() {
            let (body, ending) = split_line_ending(raw);
            if is_comment_line(body) {
                out.push_str(raw);
                continue;
            }

            let mut line = Cow::Borrowed(body);
            for rule in &self.rules {
                let rewritten = match rule.apply(&line) {
                    Cow::Owned(s) => Some(s),
                    Cow::Borrowed(_) => None,
                };
                if let Some(s) = rewritten {
                    trace!(rule = rule.name(), line = index + 1, "rule matched");
                    hits += 1;
                    line = Cow::Owned(s);
                }
            }
            out.push_str(&line);
            out.push_str(ending);
        }

        debug!(phase = self.name, hits, "phase applied");
        out
    }

    /// Collect the names registered by matching rules, in source order
    pub fn scan(&self, text: &str) -> Vec<String> {
        let mut found = Vec::new();
        for raw in text.split_inclusive('\n') {
            let (body, _) = split_line_ending(raw);
            if is_comment_line(body) {
                continue;
            }
            for rule in &self.rules {
                found.extend(rule.discover(body));
            }
        }
        found
    }
}

/// True when the trimmed line starts with `//`
pub fn is_comment_line(line: &str) -> bool {
    // a byte order mark may precede the first line
    line.trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with(LINE_COMMENT)
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}
