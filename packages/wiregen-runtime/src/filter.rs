//! Record admission filter
//!
//! The registrar consults an injected `TypeFilter` for records it cannot
//! place by itself, the unresolved-lifetime ones. Hosts can also use it to
//! carve a module's records into separate container registrations.

use crate::records::TypeRecord;

/// Admission rules over a record. Every configured dimension must match;
/// within one dimension any listed value matches. An empty filter admits
/// everything.
#[derive(Debug, Clone, Default)]
pub struct TypeFilter {
    modules: Vec<String>,
    tags: Vec<String>,
    name_suffixes: Vec<String>,
}

impl TypeFilter {
    pub fn admit_all() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.modules.push(module.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Match on type-name suffix (`Repository`, `Handler`).
    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.name_suffixes.push(suffix.into());
        self
    }

    pub fn admits(&self, record: &TypeRecord) -> bool {
        let module_ok = self.modules.is_empty() || self.modules.iter().any(|m| m == record.module);
        let tag_ok = self.tags.is_empty() || self.tags.iter().any(|t| record.has_tag(t));
        let name_ok = self.name_suffixes.is_empty()
            || self
                .name_suffixes
                .iter()
                .any(|s| record.type_name.ends_with(s.as_str()));
        module_ok && tag_ok && name_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TypeRecord {
        TypeRecord::new("billing", "billing.OrderRepository").with_tag("storage")
    }

    #[test]
    fn test_empty_filter_admits_everything() {
        assert!(TypeFilter::admit_all().admits(&record()));
    }

    #[test]
    fn test_dimensions_combine_as_conjunction() {
        let filter = TypeFilter::admit_all()
            .with_module("billing")
            .with_name_suffix("Repository");
        assert!(filter.admits(&record()));

        let wrong_suffix = TypeFilter::admit_all()
            .with_module("billing")
            .with_name_suffix("Handler");
        assert!(!wrong_suffix.admits(&record()));
    }

    #[test]
    fn test_values_within_a_dimension_are_alternatives() {
        let filter = TypeFilter::admit_all()
            .with_tag("messaging")
            .with_tag("storage");
        assert!(filter.admits(&record()));
    }
}
