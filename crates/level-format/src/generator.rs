//! Generator name lookup.
//!
//! The level only stores a generator's name; this registry supplies the
//! default used when `level.dat` omits one and canonicalises user input.

/// Read-only lookup of known world generators.
pub trait GeneratorRegistry: Send + Sync {
    /// Identifier written when a level has no generator recorded.
    fn default_generator(&self) -> &str;

    /// Canonical identifier for `name`, or `None` if unknown.
    fn resolve(&self, name: &str) -> Option<&str>;
}

/// Identifier of the default generator in [`BuiltinGenerators`].
pub const DEFAULT_GENERATOR: &str = "default";

/// The generators every level understands.
///
/// Lookups are case-insensitive; `normal` is accepted as an alias of
/// `default`.
#[derive(Debug, Clone)]
pub struct BuiltinGenerators {
    /// (alias, canonical)
    names: Vec<(String, String)>,
}

impl BuiltinGenerators {
    #[must_use]
    pub fn new() -> Self {
        let names = [
            ("default", DEFAULT_GENERATOR),
            ("normal", DEFAULT_GENERATOR),
            ("flat", "flat"),
            ("largebiomes", "largeBiomes"),
            ("amplified", "amplified"),
        ];
        Self {
            names: names
                .into_iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Register an extra generator under its canonical name.
    pub fn register(&mut self, name: &str) {
        let alias = name.to_ascii_lowercase();
        self.names.retain(|(a, _)| *a != alias);
        self.names.push((alias, name.to_string()));
    }
}

impl Default for BuiltinGenerators {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorRegistry for BuiltinGenerators {
    fn default_generator(&self) -> &str {
        DEFAULT_GENERATOR
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        let alias = name.to_ascii_lowercase();
        self.names
            .iter()
            .find(|(a, _)| *a == alias)
            .map(|(_, canonical)| canonical.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = BuiltinGenerators::new();
        assert_eq!(registry.resolve("FLAT"), Some("flat"));
        assert_eq!(registry.resolve("LargeBiomes"), Some("largeBiomes"));
        assert_eq!(registry.resolve("normal"), Some(DEFAULT_GENERATOR));
        assert_eq!(registry.resolve("void"), None);
    }

    #[test]
    fn test_register_custom_generator() {
        let mut registry = BuiltinGenerators::new();
        registry.register("Skyblock");
        assert_eq!(registry.resolve("skyblock"), Some("Skyblock"));
        assert_eq!(registry.default_generator(), DEFAULT_GENERATOR);
    }
}
