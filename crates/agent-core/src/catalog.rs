//! Tool Catalog
//!
//! Ordered `name -> description` listing rendered into the system prompt.

use serde::{Deserialize, Serialize};

/// One catalog line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
}

/// Tool catalog in registration (or advertisement) order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing the description in place if the name exists
    pub fn insert(&mut self, name: impl Into<String>, description: impl Into<String>) {
        let name = name.into();
        let description = description.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.description = description,
            None => self.entries.push(CatalogEntry { name, description }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.description.as_str())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as newline-joined `name: "description"` lines, no trailing newline
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: \"{}\"", e.name, e.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl<N: Into<String>, D: Into<String>> FromIterator<(N, D)> for ToolCatalog {
    fn from_iter<I: IntoIterator<Item = (N, D)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (name, description) in iter {
            catalog.insert(name, description);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_entry() {
        let catalog: ToolCatalog = [("add", "adds two numbers")].into_iter().collect();
        assert_eq!(catalog.render(), "add: \"adds two numbers\"");
    }

    #[test]
    fn test_render_keeps_order_and_no_trailing_newline() {
        let catalog: ToolCatalog = [("zeta", "last letter"), ("alpha", ""), ("mid", "m")]
            .into_iter()
            .collect();
        assert_eq!(
            catalog.render(),
            "zeta: \"last letter\"\nalpha: \"\"\nmid: \"m\""
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut catalog = ToolCatalog::new();
        catalog.insert("a", "first");
        catalog.insert("b", "second");
        catalog.insert("a", "replaced");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].name, "a");
        assert_eq!(catalog.description("a"), Some("replaced"));
    }
}
