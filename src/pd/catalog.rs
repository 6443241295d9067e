//! Document catalog (`/Root`).

use crate::document::CosDocument;
use crate::error::{Error, Result};
use crate::object::{Dictionary, ObjectKey};
use crate::pd::page::{PdPage, PdPageNode};

/// View over the catalog dictionary, the entry point to the page tree.
#[derive(Debug, Clone)]
pub struct PdDocumentCatalog {
    dict: Dictionary,
}

impl PdDocumentCatalog {
    /// Wrap an existing catalog dictionary.
    pub fn from_dictionary(dict: Dictionary) -> Self {
        Self { dict }
    }

    /// The backing dictionary.
    pub fn dictionary(&self) -> Dictionary {
        self.dict.clone()
    }

    /// `/Version`, the catalog-level format version override, if any.
    pub fn version(&self) -> Option<String> {
        self.dict.get_name("Version")
    }

    /// The pool key of the root page tree node, when `/Pages` is the
    /// indirect reference it normally is.
    pub fn pages_key(&self) -> Option<ObjectKey> {
        self.dict.get("Pages").and_then(|o| o.as_reference())
    }

    /// The root page tree node.
    ///
    /// # Errors
    ///
    /// Returns `Err` when the catalog has no resolvable `/Pages`.
    pub fn pages(&self, document: &CosDocument) -> Result<PdPageNode> {
        document
            .resolved_entry(&self.dict, "Pages")
            .and_then(|o| o.as_dict())
            .map(PdPageNode::from_dictionary)
            .ok_or_else(|| Error::InvalidPdf("catalog has no /Pages tree".to_string()))
    }

    /// Every leaf page reachable from the catalog, in tree order.
    pub fn all_pages(&self, document: &CosDocument) -> Result<Vec<PdPage>> {
        Ok(self.pages(document)?.all_pages(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn test_pages_resolution() {
        let mut document = CosDocument::new().unwrap();
        let pages = PdPageNode::new();
        let pages_key = document.add_object(Object::Dictionary(pages.dictionary()));

        let catalog_dict = Dictionary::new();
        catalog_dict.set_name("Type", "Catalog");
        catalog_dict.set("Pages", Object::Reference(pages_key));

        let catalog = PdDocumentCatalog::from_dictionary(catalog_dict);
        assert_eq!(catalog.pages_key(), Some(pages_key));
        assert_eq!(catalog.pages(&document).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_pages_is_an_error() {
        let document = CosDocument::new().unwrap();
        let catalog = PdDocumentCatalog::from_dictionary(Dictionary::new());
        assert!(catalog.pages(&document).is_err());
    }
}
