//! Name-to-implementation table for filters.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::definition::FilterDefinition;
use crate::error::{FilterError, Result};
use crate::filters::{
    AllowAll, AllowNone, AtLeastOneHasValue, DoesNotMatch, FilterByCounty,
    FilterOutNegativeAntigenTestType, HasAtLeastOneOf, HasValidDataFor, InDateInterval,
    IsValidClia, Matches, OrEquals,
};

/// Registry of filter definitions indexed by call name.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<&'static str, Arc<dyn FilterDefinition>>,
}

impl FilterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Registry holding every built-in filter.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.insert(AllowAll);
        registry.insert(AllowNone);
        registry.insert(Matches);
        registry.insert(DoesNotMatch);
        registry.insert(OrEquals);
        registry.insert(HasValidDataFor);
        registry.insert(HasAtLeastOneOf);
        registry.insert(AtLeastOneHasValue);
        registry.insert(IsValidClia);
        registry.insert(InDateInterval);
        registry.insert(FilterByCounty);
        registry.insert(FilterOutNegativeAntigenTestType);
        registry
    }

    /// Insert a filter, replacing any filter of the same name.
    pub fn insert(&mut self, filter: impl FilterDefinition + 'static) {
        self.filters.insert(filter.name(), Arc::new(filter));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FilterDefinition>> {
        self.filters.get(name)
    }

    /// Like [`get`](Self::get) but unknown names are an error.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn FilterDefinition>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.filters.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

/// Shared instance of [`FilterRegistry::standard`].
pub fn standard_registry() -> &'static FilterRegistry {
    static REGISTRY: OnceLock<FilterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FilterRegistry::standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names() {
        let registry = standard_registry();
        assert_eq!(registry.len(), 12);
        assert!(registry.get("matches").is_some());
        assert!(registry.get("Matches").is_none());
        assert!(matches!(
            registry.resolve("isValidClia"),
            Err(FilterError::UnknownFilter(name)) if name == "isValidClia"
        ));
    }
}
