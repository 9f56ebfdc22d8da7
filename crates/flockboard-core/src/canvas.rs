//! The ordered collection of committed elements.

use crate::elements::{Element, ElementId};
use serde::{Deserialize, Serialize};

/// Committed elements in append order (which is also paint order).
///
/// Elements can be added or the whole collection swapped out, but an
/// element is never handed out mutably once it is in here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementCollection {
    elements: Vec<Element>,
}

impl ElementCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element on top of everything else.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Replace the whole collection (initial state from the server).
    pub fn replace_all(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Elements back to front.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn last(&self) -> Option<&Element> {
        self.elements.last()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<Element>> for ElementCollection {
    fn from(elements: Vec<Element>) -> Self {
        Self { elements }
    }
}

impl<'a> IntoIterator for &'a ElementCollection {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
