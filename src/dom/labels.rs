//! Cell lookup primitives over a parsed HTML document
//!
//! Lookups mirror how a person reads the legacy tables: find the text node
//! carrying a label, take its innermost enclosing `<td>`, then read the
//! next cell in the row (or the next row). Exact-match lookups compare the
//! trimmed text node against the whole label, which keeps `國文` from
//! matching inside `國語文` or `國文檢定標準`.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// A department page parsed for label-anchored lookups
pub struct LabelDoc {
    html: Html,
}

impl LabelDoc {
    /// Parses raw HTML text into a queryable document
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Finds the innermost `<td>` enclosing the first text node whose
    /// trimmed content equals `label` exactly
    pub fn find_cell_exact(&self, label: &str) -> Option<ElementRef<'_>> {
        self.find_cell(|text| text.trim() == label)
    }

    /// Finds the innermost `<td>` enclosing the first text node matching
    /// `pattern`
    pub fn find_cell_matching(&self, pattern: &Regex) -> Option<ElementRef<'_>> {
        self.find_cell(|text| pattern.is_match(text))
    }

    /// Returns the cleaned text of the first element matching a CSS
    /// selector, if any
    pub fn select_text(&self, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| cell_text(el))
            .filter(|text| !text.is_empty())
    }

    /// Walks text nodes in document order and returns the innermost `<td>`
    /// around the first match
    fn find_cell<F>(&self, pred: F) -> Option<ElementRef<'_>>
    where
        F: Fn(&str) -> bool,
    {
        for node in self.html.tree.root().descendants() {
            if let Some(text) = node.value().as_text() {
                if pred(&text.text) {
                    let cell = node
                        .ancestors()
                        .filter_map(ElementRef::wrap)
                        .find(|el| el.value().name() == "td");
                    if let Some(cell) = cell {
                        return Some(cell);
                    }
                }
            }
        }
        None
    }
}

/// Returns the next `<td>` sibling of a cell, which holds the value of a
/// label cell in the same row
pub fn value_cell_of<'a>(cell: ElementRef<'a>) -> Option<ElementRef<'a>> {
    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")
}

/// Returns the `<tr>` following the row that contains a cell
pub fn next_row_of<'a>(cell: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let row = cell
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")?;
    row.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
}

/// Finds the innermost `<td>` within a row enclosing a text node matching
/// `pattern`
pub fn find_cell_in_row<'a>(row: ElementRef<'a>, pattern: &Regex) -> Option<ElementRef<'a>> {
    for node in row.descendants() {
        if let Some(text) = node.value().as_text() {
            if pattern.is_match(&text.text) {
                let cell = node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "td");
                if let Some(cell) = cell {
                    return Some(cell);
                }
            }
        }
    }
    None
}

/// Returns true if the cell contains a text node whose trimmed content
/// equals `label` exactly
pub fn cell_has_exact(cell: ElementRef<'_>, label: &str) -> bool {
    cell.text().any(|t| t.trim() == label)
}

/// Collects a cell's text nodes as trimmed, non-empty tokens in document
/// order
pub fn cell_tokens(cell: ElementRef<'_>) -> Vec<String> {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Concatenates and cleans a cell's text content
pub fn cell_text(cell: ElementRef<'_>) -> String {
    clean_text(&cell.text().collect::<String>())
}

/// Strips non-breaking spaces and line breaks, then trims
///
/// The source pages pad layout cells with `&nbsp;` and hard line breaks.
pub fn clean_text(text: &str) -> String {
    text.replace('\u{a0}', "")
        .replace(['\r', '\n'], "")
        .trim()
        .to_string()
}
