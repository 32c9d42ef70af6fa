use tracing::{debug, instrument};

use crate::error::Result;
use crate::property::reconstruct_properties;
use crate::registry::FrozenRegistry;
use crate::rules::syntax::SYNTAX_RULES;
use crate::rules::typed::{type_aware_rules, PROPERTY_IMPL_RULES};
use crate::rules::RuleSet;

/// Runs the rewrite phases over a file's text.
///
/// Built from a [`FrozenRegistry`], so every type declared anywhere in the
/// input set is already known when the type-aware rules are compiled. After
/// construction the converter is immutable and can be shared between files.
pub struct Converter {
    registry: FrozenRegistry,
    type_rules: RuleSet,
}

impl Converter {
    pub fn new(registry: FrozenRegistry) -> Result<Self> {
        let type_rules = type_aware_rules(&registry)?;
        debug!(
            types = registry.len(),
            rules = type_rules.len(),
            "built type-aware rules"
        );
        Ok(Self {
            registry,
            type_rules,
        })
    }

    pub fn registry(&self) -> &FrozenRegistry {
        &self.registry
    }

    pub fn registered_types(&self) -> Vec<&str> {
        self.registry.registered_types()
    }

    /// Syntax rules, type-aware rules, accessor definitions, then property blocks
    #[instrument(skip_all, fields(bytes = text.len()))]
    pub fn convert(&self, text: &str) -> Result<String> {
        let text = SYNTAX_RULES.apply(text);
        let text = self.type_rules.apply(&text);
        let text = PROPERTY_IMPL_RULES.apply(&text);
        reconstruct_properties(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SYSTEM_NAMESPACE_PATTERN;
    use crate::registry::TypeRegistry;

    #[test]
    fn test_type_declared_in_another_file_is_recognized() {
        let mut registry = TypeRegistry::new();
        registry.scan("public __gc class Widget\n{\n};\n");
        let converter = Converter::new(registry.freeze().unwrap()).unwrap();

        let other_file = "void Paint(Widget* w)\n{\n    Widget* copy = new Widget();\n}\n";
        assert_eq!(
            converter.convert(other_file).unwrap(),
            "void Paint(Widget ^ w)\n{\n    Widget ^ copy = gcnew Widget();\n}\n"
        );
    }

    #[test]
    fn test_gc_marker_is_stripped_before_type_rules() {
        let mut registry = TypeRegistry::new();
        registry.add("Widget");
        let converter = Converter::new(registry.freeze().unwrap()).unwrap();
        assert_eq!(
            converter.convert("Widget __gc* w;\n").unwrap(),
            "Widget ^ w;\n"
        );
    }

    #[test]
    fn test_registered_types_are_listed_in_order() {
        let mut registry = TypeRegistry::new();
        registry.scan("__gc class B;\n__gc class A;\n");
        let converter = Converter::new(registry.freeze().unwrap()).unwrap();
        assert_eq!(
            converter.registered_types(),
            vec![SYSTEM_NAMESPACE_PATTERN, "B", "A"]
        );
    }
}
