//! Rules whose patterns depend on the set of managed types.
//!
//! `Type * id` is a handle for a managed type and a plain pointer for a
//! native one; only registry membership tells them apart, so these rules can
//! only be built from a [`FrozenRegistry`].

use once_cell::sync::Lazy;

use super::{Rule, RuleSet};
use crate::constants::{var_or_num, FUNC_ID, ID};
use crate::error::Result;
use crate::registry::FrozenRegistry;

/// Phase 3: out-of-class accessor definitions, `T C::get_X()` -> `T C::X::get()`
pub static PROPERTY_IMPL_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new(
        "property definitions",
        property_impl_rules().expect("built-in property definition pattern is valid"),
    )
});

/// `(?P<type>...)` group matching any registered type, optionally namespace-qualified
pub fn type_group(registry: &FrozenRegistry) -> String {
    format!(
        r"(?P<type>\b(?:[\w:]*::)?(?:{})\b)",
        registry.alternation()
    )
}

/// Phase 2: build the type-aware rules from the frozen registry
pub fn type_aware_rules(registry: &FrozenRegistry) -> Result<RuleSet> {
    let ty = type_group(registry);
    let n = format!("(?P<n>{})", var_or_num());

    let rules = vec![
        Rule::new(
            "Array Function",
            &format!(
                r"{ty}\s*\*\s*(?P<id>{FUNC_ID})\s*(?P<args>\(.*\))\s*\[\s*\](?P<rest>.*)"
            ),
            "cli::array<${type} ^>^ ${id}${args}${rest}",
        )?,
        Rule::new(
            "Array Decl (ref)",
            &format!(r"{ty}\s*\*\s*(?P<id>{ID})\s*\[\s*\]"),
            "cli::array<${type} ^>^ ${id}",
        )?,
        Rule::new(
            "Array Decl (val)",
            &format!(r"{ty}\s*(?P<id>{ID})\s*\[\s*\]"),
            "cli::array<${type}>^ ${id}",
        )?,
        Rule::new(
            "Var Decl",
            &format!(r"{ty}(?:\s+__gc)?\s*\*\s*(?P<id>{ID})"),
            "${type} ^ ${id}",
        )?,
        Rule::new(
            "Array New (ref)",
            &format!(r"\bnew\s+{ty}\s*\*\s*\[\s*{n}\s*\]"),
            "gcnew cli::array<${type} ^>(${n})",
        )?,
        Rule::new(
            "Array New (val)",
            &format!(r"\bnew\s+{ty}\s*\[\s*{n}\s*\]"),
            "gcnew cli::array<${type}>(${n})",
        )?,
        Rule::new("Var New", &format!(r"\bnew\s+{ty}"), "gcnew ${type}")?
            .guarded_by(r"\s*(?:$|\(.*\))")?,
        Rule::new(
            "Argument in template",
            &format!(r"<\s*{ty}\s*\*\s*>"),
            "<${type} ^>",
        )?,
        Rule::new(
            "Argument in cast",
            &format!(r"\(\s*{ty}\s*\*\s*\)"),
            "(${type} ^)",
        )?,
    ];

    Ok(RuleSet::new("type-aware", rules))
}

pub fn property_impl_rules() -> Result<Vec<Rule>> {
    Ok(vec![Rule::new(
        "Property Impl",
        r"(?P<return_type>[\w<>:\s\^]+[\s\^])(?P<classname>[\w:]+)::(?P<method>[gs]et)_(?P<property>[A-Z]\w*)\s*(?P<args>\([\w\s\^:]*\))",
        "${return_type}${classname}::${property}::${method}${args}",
    )?])
}
