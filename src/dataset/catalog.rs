//! Working label space for the pipeline.

use std::collections::HashMap;

use crate::utils::error::{CytoprepError, Result};

/// Ordered set of class names defining the working label space.
///
/// The position of a name in the catalog is its canonical integer label.
/// Every label produced downstream (filtered index, splits, weights) is an
/// index into this order, so the order must be fixed before the pipeline
/// is built and never change afterwards.
#[derive(Debug, Clone)]
pub struct ClassCatalog {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ClassCatalog {
    /// Create a catalog from an ordered list of class names.
    ///
    /// Fails with a configuration error if the list is empty or contains
    /// duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(CytoprepError::Config("class catalog is empty".to_string()));
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(CytoprepError::Config(format!(
                    "duplicate class name '{}' in catalog",
                    name
                )));
            }
        }

        Ok(Self { names, index })
    }

    /// Canonical integer label for a class name, if it is in the catalog
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Class name for a label index
    pub fn name(&self, label: usize) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    /// All class names in catalog order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of classes in the working set
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty (never true for a constructed catalog)
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ClassCatalog {
    /// Catalog of the eight peripheral blood cell classes, in the order
    /// used throughout this crate.
    fn default() -> Self {
        let names: Vec<String> = super::CLASS_NAMES.iter().map(|s| s.to_string()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_defines_labels() {
        let catalog = ClassCatalog::new(["neutrophil", "basophil"]).unwrap();
        assert_eq!(catalog.index_of("neutrophil"), Some(0));
        assert_eq!(catalog.index_of("basophil"), Some(1));
        assert_eq!(catalog.index_of("platelet"), None);
        assert_eq!(catalog.name(1), Some("basophil"));
        assert_eq!(catalog.name(2), None);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let result = ClassCatalog::new(Vec::<String>::new());
        assert!(matches!(result, Err(CytoprepError::Config(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ClassCatalog::new(["ig", "monocyte", "ig"]);
        assert!(matches!(result, Err(CytoprepError::Config(_))));
    }

    #[test]
    fn test_default_catalog() {
        let catalog = ClassCatalog::default();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.index_of("basophil"), Some(0));
        assert_eq!(catalog.index_of("platelet"), Some(7));
    }
}
