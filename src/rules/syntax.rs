//! Rules that need no knowledge of the managed type set.
//!
//! The declaration rules double as the scan rules: each one names the capture
//! group holding the type it declares, so a scan pass can grow the registry
//! before any type-aware rule is built.

use once_cell::sync::Lazy;
use regex::Captures;

use super::{Rule, RuleSet};
use crate::constants::{id_or_num, ACCESS_LEVEL, ID};
use crate::error::Result;

/// Declaration rules, used both for scanning and as the head of the syntax phase
pub static DECLARATION_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "declarations",
        declaration_rules().expect("built-in declaration patterns are valid"),
    )
});

/// Phase 1: declarations followed by the stateless token rewrites
pub static SYNTAX_RULES: Lazy<RuleSet> = Lazy::new(|| {
    let mut rules = declaration_rules().expect("built-in declaration patterns are valid");
    rules.extend(stateless_rules().expect("built-in syntax patterns are valid"));
    RuleSet::new("syntax", rules)
});

fn class_modifiers() -> (String, String) {
    let head = format!(
        r"(?:__(?P<seal1>sealed)\s+)?(?:(?P<access>{})\s+)?(?:__(?P<abs1>abstract)\s+)?__gc\s+",
        ACCESS_LEVEL
    );
    let tail = r"(?:__(?P<seal2>sealed)\s+)?(?:__(?P<abs2>abstract)\s+)?(?P<class>class|struct)\s+(?P<name>\w+)"
        .to_string();
    (head, tail)
}

fn format_class_declaration(caps: &Captures) -> String {
    let mut out = String::new();
    if let Some(access) = caps.name("access") {
        out.push_str(access.as_str());
        out.push(' ');
    }
    out.push_str("ref ");
    out.push_str(caps.name("class").map_or("class", |m| m.as_str()));
    out.push(' ');
    out.push_str(caps.name("name").map_or("", |m| m.as_str()));
    if caps.name("seal1").is_some() || caps.name("seal2").is_some() {
        out.push_str(" sealed");
    }
    if caps.name("abs1").is_some() || caps.name("abs2").is_some() {
        out.push_str(" abstract");
    }
    out
}

pub fn declaration_rules() -> Result<Vec<Rule>> {
    let (head, tail) = class_modifiers();
    let access = format!(r"(?P<access>(?:{})\s+)?", ACCESS_LEVEL);

    Ok(vec![
        Rule::new(
            "Class/Struct Forward",
            &format!(r"{}{}\s*;", head, tail),
            "ref ${class} ${name};",
        )?
        .registering("name"),
        Rule::with_format(
            "Class/Struct Declaration",
            &format!("{}{}", head, tail),
            format_class_declaration,
        )?
        .registering("name"),
        Rule::new(
            "Interface Forward",
            &format!(r"\b{}__gc\s+(?:__)?interface\s+(?P<id>{})\s*;", access, ID),
            "interface class ${id};",
        )?
        .registering("id"),
        Rule::new(
            "Interface Declaration",
            &format!(r"\b{}__gc\s+(?:__)?interface\s+(?P<id>{})", access, ID),
            "${access}interface class ${id}",
        )?
        .registering("id"),
        Rule::new(
            "Delegate Declaration",
            &format!(
                r"\b{}__delegate\s+(?P<return_type>.*)\s+(?P<id>{})\s*\((?P<args>[^()]*)\)",
                access, ID
            ),
            "${access}delegate ${return_type} ${id}(${args})",
        )?
        .registering("id"),
    ])
}

pub fn stateless_rules() -> Result<Vec<Rule>> {
    let access = format!(r"(?P<access>(?:{})\s+)?", ACCESS_LEVEL);
    let primitive = r"(?P<type>(?:unsigned\s+)?(?:char|short|int|long))";

    Ok(vec![
        Rule::new(
            "Value Class/Struct Declaration",
            r"\b__value\s+(?P<class>class|struct)\b",
            "value ${class}",
        )?,
        Rule::new(
            "Enum Declaration",
            &format!(r"\b{}__value\s+enum\s+(?P<name>{})", access, ID),
            "${access}enum class ${name}",
        )?,
        Rule::new(
            "Event Declaration",
            &format!(r"\b__event\s+(?P<type>[\w:]+)\s*[*^]\s*(?P<name>{})", ID),
            "event ${type} ^ ${name}",
        )?,
        Rule::new("Managed String", r#"\bS("[^"]*")"#, "${1}")?,
        Rule::new("Boxing", r"\b__box\b", "")?,
        Rule::new("__typeof", r"\b__typeof\b", "typeid")?,
        Rule::new("__try_cast", r"\b__try_cast\b", "safe_cast")?,
        Rule::new("__pin", r"\b__pin\b", "pin_ptr")?,
        Rule::new("NULL", r"\bNULL\b", "nullptr")?,
        Rule::new(
            "Managed primitive array",
            &format!(r"\b{}\s+(?P<varname>[A-Za-z_]\w*)\s+__gc\s*\[\s*\]", primitive),
            "cli::array<${type}>^ ${varname}",
        )?,
        Rule::new(
            "Managed primitive array new",
            &format!(
                r"\bnew\s+{}\s+__gc\s*\[\s*(?P<number>{})\s*\]",
                primitive,
                id_or_num()
            ),
            "gcnew cli::array<${type}>(${number})",
        )?,
        Rule::new("Remove __gc/__nogc", r"\b(?:__gc|__nogc)\b\s*", "")?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(line: &str) -> String {
        SYNTAX_RULES.apply(line)
    }

    #[test]
    fn test_class_declaration_with_modifiers() {
        assert_eq!(
            convert("public __gc __sealed class Widget : public Control"),
            "public ref class Widget sealed : public Control"
        );
        assert_eq!(convert("__abstract __gc struct Shape"), "ref struct Shape abstract");
    }

    #[test]
    fn test_forward_declarations() {
        assert_eq!(convert("__gc class Widget;"), "ref class Widget;");
        assert_eq!(convert("public __gc __interface IShape;"), "interface class IShape;");
    }

    #[test]
    fn test_interface_and_delegate() {
        assert_eq!(
            convert("public __gc __interface IShape"),
            "public interface class IShape"
        );
        assert_eq!(
            convert("public __delegate void Changed(Object* sender, EventArgs* e);"),
            "public delegate void Changed(Object* sender, EventArgs* e);"
        );
    }

    #[test]
    fn test_value_types_and_enums() {
        assert_eq!(convert("public __value struct Point"), "public value struct Point");
        assert_eq!(convert("public __value enum Color"), "public enum class Color");
    }

    #[test]
    fn test_operator_tokens() {
        assert_eq!(convert(r#"String* s = S"hello";"#), r#"String* s = "hello";"#);
        assert_eq!(convert("Object* o = __box(42);"), "Object* o = (42);");
        assert_eq!(convert("Type* t = __typeof(Widget);"), "Type* t = typeid(Widget);");
        assert_eq!(
            convert("Widget* w = __try_cast<Widget*>(o);"),
            "Widget* w = safe_cast<Widget*>(o);"
        );
        assert_eq!(convert("int __pin* p = &x;"), "int pin_ptr* p = &x;");
        assert_eq!(convert("if (p == NULL)"), "if (p == nullptr)");
    }

    #[test]
    fn test_event_declaration() {
        assert_eq!(
            convert("__event EventHandler* Click;"),
            "event EventHandler ^ Click;"
        );
    }

    #[test]
    fn test_primitive_arrays() {
        assert_eq!(
            convert("unsigned char buffer __gc[];"),
            "cli::array<unsigned char>^ buffer;"
        );
        assert_eq!(
            convert("buffer = new unsigned char __gc[size];"),
            "buffer = gcnew cli::array<unsigned char>(size);"
        );
        assert_eq!(convert("int x __gc [ ] ;"), "cli::array<int>^ x ;");
    }

    #[test]
    fn test_gc_markers_removed() {
        assert_eq!(convert("String __gc* name;"), "String * name;");
        assert_eq!(convert("Native __nogc* p;"), "Native * p;");
    }

    #[test]
    fn test_stateless_rules_are_idempotent() {
        let legacy = "public __gc class Widget\n{\n    String* s = S\"x\";\n    if (s == NULL) return;\n};\n";
        let once = convert(legacy);
        assert_eq!(convert(&once), once);
    }

    #[test]
    fn test_declarations_register_names() {
        let names = DECLARATION_RULES.scan(
            "__gc class Widget;\npublic __gc class Widget : public Base\n__gc __interface IShape\npublic __delegate void Changed(int x);\n",
        );
        // the forward declaration is seen by both class rules
        assert_eq!(names, vec!["Widget", "Widget", "Widget", "IShape", "Changed"]);
    }
}
