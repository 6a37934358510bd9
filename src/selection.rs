//! Row selection and bulk copy.
//!
//! The selection set lives entirely in the view session. Select-all always
//! recomputes against the *current* visible list: identifiers hidden by
//! the active filter keep whatever flag they had, but a hidden flag has no
//! effect until the row is visible again.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::orders::Order;

/// Map of order id to its selected flag, plus the select-all toggle state.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    selected: HashMap<String, bool>,
    select_all: bool,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the id is currently marked selected; absent entries are
    /// `false`.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.get(id).copied().unwrap_or(false)
    }

    /// Flip the flag for a single id.
    pub fn toggle(&mut self, id: &str) {
        let flag = self.selected.entry(id.to_string()).or_insert(false);
        *flag = !*flag;
    }

    /// Flip the select-all toggle and apply the new value to every
    /// currently-visible id. Ids outside the visible set are untouched.
    pub fn toggle_all<'a, I>(&mut self, visible_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let next = !self.select_all;
        for id in visible_ids {
            self.selected.insert(id.to_string(), next);
        }
        self.select_all = next;
    }

    pub fn select_all_active(&self) -> bool {
        self.select_all
    }

    /// Drop an id entirely (used when its document is deleted).
    pub fn remove(&mut self, id: &str) {
        self.selected.remove(id);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.select_all = false;
    }
}

/// Serialize the selected subset of the visible rows into the copy-ready
/// text block: one `colores,marca,talla,genero` line per row, in the
/// current sort/filter order, newline-joined. Commas inside values are not
/// escaped; this is a paste format, not CSV.
pub fn export_selected(visible: &[Order], selection: &SelectionSet) -> Result<String> {
    let lines: Vec<String> = visible
        .iter()
        .filter(|o| selection.is_selected(&o.id))
        .map(|o| {
            format!(
                "{},{},{},{}",
                o.colors,
                o.brand.as_str(),
                o.size.as_str(),
                o.gender.as_str()
            )
        })
        .collect();

    if lines.is_empty() {
        return Err(Error::EmptySelection);
    }
    Ok(lines.join("\n"))
}
