//! Named, topic-scoped, ordered element sets.

use std::collections::HashMap;

use crate::element::Element;
use crate::error::{ModelError, Result};
use crate::ids::Topic;

/// An ordered set of uniquely named elements belonging to one topic.
///
/// The topic and element list are fixed at construction; inheritance
/// produces a new schema rather than editing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    topic: Topic,
    elements: Vec<Element>,
    index: HashMap<String, usize>,
    extends: Option<String>,
    based_on: Option<String>,
    tracking_element: Option<String>,
    description: Option<String>,
}

impl Schema {
    pub fn new(name: impl Into<String>, topic: Topic, elements: Vec<Element>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::invalid_name("schema name", name));
        }
        let mut index = HashMap::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            if element.name.trim().is_empty() {
                return Err(ModelError::invalid_name("element name", element.name.clone()));
            }
            if index.insert(element.name.clone(), position).is_some() {
                return Err(ModelError::DuplicateElement {
                    schema: name,
                    element: element.name.clone(),
                });
            }
        }
        Ok(Self {
            name,
            topic,
            elements,
            index,
            extends: None,
            based_on: None,
            tracking_element: None,
            description: None,
        })
    }

    pub fn with_extends(mut self, extends: impl Into<String>) -> Self {
        self.extends = Some(extends.into());
        self
    }

    pub fn with_based_on(mut self, based_on: impl Into<String>) -> Self {
        self.based_on = Some(based_on.into());
        self
    }

    pub fn with_tracking_element(mut self, element: impl Into<String>) -> Self {
        self.tracking_element = Some(element.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn based_on(&self) -> Option<&str> {
        self.based_on.as_deref()
    }

    pub fn tracking_element(&self) -> Option<&str> {
        self.tracking_element.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn find_element(&self, name: &str) -> Option<&Element> {
        self.index.get(name).map(|&position| &self.elements[position])
    }

    pub fn contains_element(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|element| element.name.as_str())
    }

    /// Resolves inheritance against already-resolved parents.
    ///
    /// Local elements inherit unset attributes from the same-named element
    /// of `extends` (or, failing that, `based_on`). An `extends` parent also
    /// contributes, after the local ones, every element the local schema
    /// does not declare. A `based_on` parent contributes attributes only.
    pub fn inherit(&self, extends: Option<&Schema>, based_on: Option<&Schema>) -> Result<Schema> {
        let base = extends.or(based_on);
        let mut elements: Vec<Element> = self
            .elements
            .iter()
            .map(|element| match base.and_then(|base| base.find_element(&element.name)) {
                Some(parent) => element.inherit_from(parent),
                None => element.clone(),
            })
            .collect();
        if let Some(parent) = extends {
            elements.extend(
                parent
                    .elements
                    .iter()
                    .filter(|element| !self.contains_element(&element.name))
                    .cloned(),
            );
        }
        let mut resolved = Schema::new(self.name.clone(), self.topic.clone(), elements)?;
        resolved.extends = self.extends.clone();
        resolved.based_on = self.based_on.clone();
        resolved.tracking_element = self.tracking_element.clone();
        resolved.description = self.description.clone();
        Ok(resolved)
    }

    /// Same schema with each element replaced by `f(element)`.
    ///
    /// Names must be preserved; used by the catalog to attach resolved
    /// references.
    pub fn map_elements(&self, mut f: impl FnMut(&Element) -> Result<Element>) -> Result<Schema> {
        let elements = self.elements.iter().map(&mut f).collect::<Result<Vec<_>>>()?;
        let mut mapped = Schema::new(self.name.clone(), self.topic.clone(), elements)?;
        mapped.extends = self.extends.clone();
        mapped.based_on = self.based_on.clone();
        mapped.tracking_element = self.tracking_element.clone();
        mapped.description = self.description.clone();
        Ok(mapped)
    }
}
