//! Name-to-implementation table for mappers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::definition::Mapper;
use crate::error::{MapperError, Result};
use crate::mappers::{
    CoalesceMapper, ConcatenateMapper, CountryMapper, DateTimeOffsetMapper, HashMapper,
    IfNotPresentMapper, IfNpiMapper, IfPresentMapper, IfThenElseMapper, LivdLookupMapper,
    LookupMapper, MiddleInitialMapper, NullMapper, Obx8Mapper, PatientAgeMapper,
    SplitByCommaMapper, SplitMapper, StripNonNumericMapper, StripNumericMapper,
    StripPhoneFormattingMapper, TimestampMapper, TrimBlanksMapper, UseMapper,
    ZipCodeToCountyMapper, ZipCodeToStateMapper,
};

/// Registry of mappers indexed by call name.
#[derive(Clone, Default)]
pub struct MapperRegistry {
    mappers: HashMap<&'static str, Arc<dyn Mapper>>,
}

impl MapperRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// Registry holding every built-in mapper.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.insert(MiddleInitialMapper);
        registry.insert(IfThenElseMapper);
        registry.insert(UseMapper);
        registry.insert(ConcatenateMapper);
        registry.insert(CoalesceMapper);
        registry.insert(TrimBlanksMapper);
        registry.insert(NullMapper);
        registry.insert(IfPresentMapper);
        registry.insert(IfNotPresentMapper);
        registry.insert(IfNpiMapper);
        registry.insert(LookupMapper);
        registry.insert(ZipCodeToCountyMapper);
        registry.insert(ZipCodeToStateMapper);
        registry.insert(CountryMapper);
        registry.insert(HashMapper);
        registry.insert(TimestampMapper);
        registry.insert(DateTimeOffsetMapper);
        registry.insert(StripPhoneFormattingMapper);
        registry.insert(StripNonNumericMapper);
        registry.insert(StripNumericMapper);
        registry.insert(SplitMapper);
        registry.insert(SplitByCommaMapper);
        registry.insert(PatientAgeMapper);
        registry.insert(Obx8Mapper);
        registry.insert(LivdLookupMapper);
        registry
    }

    /// Insert a mapper, replacing any mapper of the same name.
    pub fn insert(&mut self, mapper: impl Mapper + 'static) {
        self.mappers.insert(mapper.name(), Arc::new(mapper));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Mapper>> {
        self.mappers.get(name)
    }

    /// Like [`get`](Self::get) but unknown names are an error.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Mapper>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| MapperError::UnknownMapper(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.mappers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("mappers", &self.names())
            .finish()
    }
}

/// Shared instance of [`MapperRegistry::standard`].
pub fn standard_registry() -> &'static MapperRegistry {
    static REGISTRY: OnceLock<MapperRegistry> = OnceLock::new();
    REGISTRY.get_or_init(MapperRegistry::standard)
}
