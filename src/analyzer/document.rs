// src/analyzer/document.rs
// =============================================================================
// A small query layer over the `scraper` crate.
//
// The page analyzer only needs a handful of operations: find elements by CSS
// selector, read their text, read an attribute, count them. This file gives
// those operations names and turns selector failures into AnalyzeError
// instead of panics.
//
// scraper (html5ever underneath) recovers from broken markup the way a
// browser does, so parsing itself never fails.
// =============================================================================

use scraper::{ElementRef, Html, Selector};

use crate::error::AnalyzeError;

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses raw page bytes. Invalid UTF-8 is replaced, not rejected.
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        Self {
            html: Html::parse_document(&text),
        }
    }

    /// Every element matching `selector`, in document order.
    pub fn find(&self, selector: &str) -> Result<ElementSet<'_>, AnalyzeError> {
        let selector = compile_selector(selector)?;
        Ok(ElementSet {
            elements: self.html.select(&selector).collect(),
        })
    }
}

/// Compiles a CSS selector, mapping failures to [`AnalyzeError::Parse`].
pub fn compile_selector(selector: &str) -> Result<Selector, AnalyzeError> {
    Selector::parse(selector)
        .map_err(|e| AnalyzeError::Parse(format!("invalid selector '{}': {}", selector, e)))
}

/// The result of a [`Document::find`] query.
pub struct ElementSet<'a> {
    elements: Vec<ElementRef<'a>>,
}

impl<'a> ElementSet<'a> {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Only the first match, or an empty set.
    pub fn first(&self) -> ElementSet<'a> {
        ElementSet {
            elements: self.elements.iter().take(1).copied().collect(),
        }
    }

    /// Combined text content of every element in the set.
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .flat_map(|element| element.text())
            .collect()
    }

    /// The attribute on every element that has it, in order.
    pub fn attrs(&self, name: &str) -> Vec<&'a str> {
        self.elements
            .iter()
            .filter_map(|element| element.value().attr(name))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = ElementRef<'a>> + '_ {
        self.elements.iter().copied()
    }
}
