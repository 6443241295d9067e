//! Document information dictionary (`/Info`).

use crate::object::{Dictionary, Object};

/// View over the document information dictionary: title, author, and the
/// other standard metadata entries. Dates are kept as the raw PDF date
/// strings (`D:YYYYMMDDHHmmSS...`).
#[derive(Debug, Clone)]
pub struct PdDocumentInformation {
    dict: Dictionary,
}

impl Default for PdDocumentInformation {
    fn default() -> Self {
        Self::new()
    }
}

impl PdDocumentInformation {
    /// Create an empty information dictionary.
    pub fn new() -> Self {
        Self {
            dict: Dictionary::new(),
        }
    }

    /// Wrap an existing dictionary.
    pub fn from_dictionary(dict: Dictionary) -> Self {
        Self { dict }
    }

    /// The backing dictionary.
    pub fn dictionary(&self) -> Dictionary {
        self.dict.clone()
    }

    fn set_text(&self, key: &str, value: Option<&str>) {
        match value {
            Some(text) => self.dict.set(key, Object::string(text.as_bytes())),
            None => {
                self.dict.remove(key);
            }
        }
    }

    /// `/Title`.
    pub fn title(&self) -> Option<String> {
        self.dict.get_string("Title")
    }

    /// Set `/Title`; `None` removes the entry.
    pub fn set_title(&self, title: Option<&str>) {
        self.set_text("Title", title);
    }

    /// `/Author`.
    pub fn author(&self) -> Option<String> {
        self.dict.get_string("Author")
    }

    /// Set `/Author`; `None` removes the entry.
    pub fn set_author(&self, author: Option<&str>) {
        self.set_text("Author", author);
    }

    /// `/Subject`.
    pub fn subject(&self) -> Option<String> {
        self.dict.get_string("Subject")
    }

    /// Set `/Subject`; `None` removes the entry.
    pub fn set_subject(&self, subject: Option<&str>) {
        self.set_text("Subject", subject);
    }

    /// `/Keywords`.
    pub fn keywords(&self) -> Option<String> {
        self.dict.get_string("Keywords")
    }

    /// Set `/Keywords`; `None` removes the entry.
    pub fn set_keywords(&self, keywords: Option<&str>) {
        self.set_text("Keywords", keywords);
    }

    /// `/Creator`, the application that created the original document.
    pub fn creator(&self) -> Option<String> {
        self.dict.get_string("Creator")
    }

    /// Set `/Creator`; `None` removes the entry.
    pub fn set_creator(&self, creator: Option<&str>) {
        self.set_text("Creator", creator);
    }

    /// `/Producer`, the application that produced the PDF.
    pub fn producer(&self) -> Option<String> {
        self.dict.get_string("Producer")
    }

    /// Set `/Producer`; `None` removes the entry.
    pub fn set_producer(&self, producer: Option<&str>) {
        self.set_text("Producer", producer);
    }

    /// `/CreationDate` as a raw PDF date string.
    pub fn creation_date(&self) -> Option<String> {
        self.dict.get_string("CreationDate")
    }

    /// Set `/CreationDate`; `None` removes the entry.
    pub fn set_creation_date(&self, date: Option<&str>) {
        self.set_text("CreationDate", date);
    }

    /// `/ModDate` as a raw PDF date string.
    pub fn modification_date(&self) -> Option<String> {
        self.dict.get_string("ModDate")
    }

    /// Set `/ModDate`; `None` removes the entry.
    pub fn set_modification_date(&self, date: Option<&str>) {
        self.set_text("ModDate", date);
    }
}
