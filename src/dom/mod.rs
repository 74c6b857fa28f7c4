//! Label-anchored access to parsed department pages
//!
//! The source site renders semantically identical data in visually
//! different table shapes, so extraction never addresses cells by position.
//! This module is the one place that knows how to walk the HTML tree:
//! find the cell enclosing a label text node, step to its sibling value
//! cell, or step to the next table row. The condensed-layout positional
//! pairing in the extractor is the only consumer of cell *order*.

mod labels;

pub use labels::{
    cell_has_exact, cell_text, cell_tokens, clean_text, find_cell_in_row, next_row_of,
    value_cell_of, LabelDoc,
};
