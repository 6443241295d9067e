//! The in-memory PDF document.
//!
//! [`PdDocument`] wraps a [`CosDocument`] and exposes the high-level
//! surface: catalog, information dictionary, page operations, and the
//! encryption parameters. Call [`close`](PdDocument::close) when done so
//! the scratch file backing stream payloads is released.

use crate::document::CosDocument;
use crate::error::{Error, Result};
use crate::file_parser::FileParser;
use crate::object::{Array, CosStream, Dictionary, Object};
use crate::pd::catalog::PdDocumentCatalog;
use crate::pd::encryption::PdEncryptionDictionary;
use crate::pd::info::PdDocumentInformation;
use crate::pd::page::{PdPage, PdPageNode};
use crate::source::ByteSource;

/// The high-level document.
///
/// # Example
///
/// ```no_run
/// use pdf_carousel::pd::PdDocument;
///
/// let data = std::fs::read("sample.pdf")?;
/// let mut doc = PdDocument::load(data)?;
/// println!("{} pages", doc.number_of_pages()?);
/// doc.close();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PdDocument {
    document: CosDocument,
    information: Option<PdDocumentInformation>,
    catalog: Option<PdDocumentCatalog>,
    encryption: Option<PdEncryptionDictionary>,
}

impl PdDocument {
    /// Create a new document with an empty page tree. Add at least one
    /// page to make it a valid PDF.
    pub fn new() -> Result<Self> {
        let mut document = CosDocument::new()?;
        document.set_version(1.4);

        let pages = PdPageNode::new();
        let pages_key = document.add_object(Object::Dictionary(pages.dictionary()));

        let catalog = Dictionary::new();
        catalog.set_name("Type", "Catalog");
        catalog.set_name("Version", "1.4");
        catalog.set("Pages", Object::Reference(pages_key));
        let catalog_key = document.add_object(Object::Dictionary(catalog));

        let trailer = Dictionary::new();
        trailer.set("Root", Object::Reference(catalog_key));
        document.set_trailer(trailer);

        Ok(Self::from_cos(document))
    }

    /// Parse a document from bytes.
    pub fn load(data: Vec<u8>) -> Result<Self> {
        let document = FileParser::new(ByteSource::new(data)).parse()?;
        Ok(Self::from_cos(document))
    }

    /// Parse a document from a reader (read to its end first).
    pub fn load_from(reader: impl std::io::Read) -> Result<Self> {
        let document = FileParser::new(ByteSource::from_reader(reader)?).parse()?;
        Ok(Self::from_cos(document))
    }

    /// Wrap an already parsed low-level document.
    pub fn from_cos(document: CosDocument) -> Self {
        Self {
            document,
            information: None,
            catalog: None,
            encryption: None,
        }
    }

    /// The low-level document this layer sits on.
    pub fn cos_document(&self) -> &CosDocument {
        &self.document
    }

    /// Mutable access to the low-level document.
    pub fn cos_document_mut(&mut self) -> &mut CosDocument {
        &mut self.document
    }

    /// File format version from the header.
    pub fn version(&self) -> f32 {
        self.document.version()
    }

    fn ensure_trailer(&mut self) -> Dictionary {
        match self.document.trailer() {
            Some(trailer) => trailer,
            None => {
                let trailer = Dictionary::new();
                self.document.set_trailer(trailer.clone());
                trailer
            }
        }
    }

    /// The document information dictionary, created on demand so it is
    /// always available for writing.
    pub fn document_information(&mut self) -> PdDocumentInformation {
        if self.information.is_none() {
            let trailer = self.ensure_trailer();
            let dict = self
                .document
                .resolved_entry(&trailer, "Info")
                .and_then(|o| o.as_dict())
                .unwrap_or_else(|| {
                    let dict = Dictionary::new();
                    trailer.set("Info", Object::Dictionary(dict.clone()));
                    dict
                });
            self.information = Some(PdDocumentInformation::from_dictionary(dict));
        }
        self.information.clone().expect("information just cached")
    }

    /// Replace the document information dictionary.
    pub fn set_document_information(&mut self, information: PdDocumentInformation) {
        let trailer = self.ensure_trailer();
        trailer.set("Info", Object::Dictionary(information.dictionary()));
        self.information = Some(information);
    }

    /// The document catalog, created on demand so it is always
    /// available.
    pub fn document_catalog(&mut self) -> PdDocumentCatalog {
        if self.catalog.is_none() {
            let trailer = self.ensure_trailer();
            let dict = self
                .document
                .resolved_entry(&trailer, "Root")
                .and_then(|o| o.as_dict())
                .unwrap_or_else(|| {
                    // Damaged files still get a usable (empty) catalog
                    let pages = PdPageNode::new();
                    let pages_key = self
                        .document
                        .add_object(Object::Dictionary(pages.dictionary()));
                    let dict = Dictionary::new();
                    dict.set_name("Type", "Catalog");
                    dict.set("Pages", Object::Reference(pages_key));
                    let catalog_key = self.document.add_object(Object::Dictionary(dict.clone()));
                    trailer.set("Root", Object::Reference(catalog_key));
                    dict
                });
            self.catalog = Some(PdDocumentCatalog::from_dictionary(dict));
        }
        self.catalog.clone().expect("catalog just cached")
    }

    /// Total number of leaf pages, from the page tree's `/Count`.
    pub fn number_of_pages(&mut self) -> Result<i64> {
        let catalog = self.document_catalog();
        Ok(catalog.pages(&self.document)?.count())
    }

    /// Append a page to the root of the page tree, pointing its
    /// `/Parent` back at the root node and updating the tree counts.
    pub fn add_page(&mut self, page: &PdPage) -> Result<()> {
        let catalog = self.document_catalog();
        let root = catalog.pages(&self.document)?;
        let root_key = match catalog.pages_key() {
            Some(key) => key,
            None => {
                // /Pages was written as a direct dictionary; move it into
                // the pool so children can refer back to it
                let key = self
                    .document
                    .add_object(Object::Dictionary(root.dictionary()));
                catalog.dictionary().set("Pages", Object::Reference(key));
                key
            }
        };

        let page_key = match self.document.key_of_dictionary(&page.dictionary()) {
            Some(key) => key,
            None => self
                .document
                .add_object(Object::Dictionary(page.dictionary())),
        };

        root.kids(&self.document).push(Object::Reference(page_key));
        page.set_parent(root_key);
        root.update_count(&self.document);
        Ok(())
    }

    /// Remove a page from its parent's `/Kids`.
    ///
    /// Returns whether the page was found. On removal the counts are
    /// recomputed from the root of the tree.
    pub fn remove_page(&mut self, page: &PdPage) -> Result<bool> {
        let parent = match page.parent(&self.document) {
            Some(parent) => parent,
            None => return Ok(false),
        };
        let kids = parent.kids(&self.document);

        let index = self
            .document
            .key_of_dictionary(&page.dictionary())
            .and_then(|key| kids.position(&Object::Reference(key)))
            .or_else(|| kids.position(&Object::Dictionary(page.dictionary())));

        let removed = match index {
            Some(index) => kids.remove(index).is_some(),
            None => false,
        };
        if removed {
            let catalog = self.document_catalog();
            catalog.pages(&self.document)?.update_count(&self.document);
        }
        Ok(removed)
    }

    /// Remove the page at a zero-based index into the flattened page
    /// list.
    pub fn remove_page_at(&mut self, index: usize) -> Result<bool> {
        let catalog = self.document_catalog();
        let pages = catalog.all_pages(&self.document)?;
        match pages.get(index) {
            Some(page) => self.remove_page(&page.clone()),
            None => Ok(false),
        }
    }

    /// Import a page from another document.
    ///
    /// The page dictionary is copied and the content streams are copied
    /// into this document's scratch file, so the imported page stays
    /// valid after the source document is closed. The copy is then added
    /// like [`add_page`](PdDocument::add_page).
    ///
    /// # Errors
    ///
    /// [`Error::EncryptionRequired`] when the source document is
    /// encrypted (its payloads are not readable as plain content), and
    /// IO errors from either scratch file.
    pub fn import_page(&mut self, source: &mut PdDocument, page: &PdPage) -> Result<PdPage> {
        if source.is_encrypted() {
            return Err(Error::EncryptionRequired);
        }

        let copied = page.dictionary().deep_copy();
        copied.remove("Parent");
        let imported = PdPage::from_dictionary(copied);

        let mut rehomed = Vec::new();
        for stream in page.contents(&source.document) {
            let span = {
                let mut reader = source.document.stream_reader(stream.span)?;
                self.document.write_stream_payload_from(&mut reader)?
            };
            rehomed.push(Object::Stream(CosStream {
                dict: stream.dict.deep_copy(),
                span,
            }));
        }

        match rehomed.len() {
            0 => {
                imported.dictionary().remove("Contents");
            }
            1 => {
                let key = self
                    .document
                    .add_object(rehomed.pop().expect("one stream present"));
                imported.set_contents(Object::Reference(key));
            }
            _ => {
                let array = Array::new();
                for stream in rehomed {
                    let key = self.document.add_object(stream);
                    array.push(Object::Reference(key));
                }
                imported.set_contents(Object::Array(array));
            }
        }

        self.add_page(&imported)?;
        Ok(imported)
    }

    /// True when the trailer carries an `/Encrypt` entry.
    pub fn is_encrypted(&self) -> bool {
        self.document.is_encrypted()
    }

    /// The encryption parameters, cached so they survive a security
    /// handler removing `/Encrypt` from the trailer after decryption.
    /// `None` for documents that were never encrypted.
    pub fn encryption_dictionary(&mut self) -> Option<PdEncryptionDictionary> {
        if self.encryption.is_none() {
            self.encryption = self
                .document
                .encryption_dictionary()
                .map(PdEncryptionDictionary::from_dictionary);
        }
        self.encryption.clone()
    }

    /// Close the underlying document, releasing the scratch file.
    /// Idempotent.
    pub fn close(&mut self) {
        self.document.close();
    }

    /// True once the document is closed.
    pub fn is_closed(&self) -> bool {
        self.document.is_closed()
    }
}
