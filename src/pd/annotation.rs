//! Annotation views.
//!
//! An annotation is a dictionary on a page's `/Annots` array, dispatched
//! by `/Subtype`. Unknown subtypes are still valid annotations; they get
//! the [`PdAnnotationKind::Unknown`] kind rather than an error, so a
//! viewer can carry them through untouched.
//!
//! The `/F` entry is a bit field controlling visibility and interaction
//! (PDF Ref 1.7, Table 8.16).

use crate::document::CosDocument;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object};
use crate::pd::rectangle::PdRectangle;

/// Annotation flag: do not display if no handler is available.
pub const FLAG_INVISIBLE: i64 = 1 << 0;
/// Annotation flag: do not display or print.
pub const FLAG_HIDDEN: i64 = 1 << 1;
/// Annotation flag: print when the page is printed.
pub const FLAG_PRINTED: i64 = 1 << 2;
/// Annotation flag: do not scale with the page zoom.
pub const FLAG_NO_ZOOM: i64 = 1 << 3;
/// Annotation flag: do not rotate with the page.
pub const FLAG_NO_ROTATE: i64 = 1 << 4;
/// Annotation flag: do not display on screen.
pub const FLAG_NO_VIEW: i64 = 1 << 5;
/// Annotation flag: do not allow interaction.
pub const FLAG_READ_ONLY: i64 = 1 << 6;
/// Annotation flag: do not allow deletion or property changes.
pub const FLAG_LOCKED: i64 = 1 << 7;
/// Annotation flag: invert the no-view flag on hover.
pub const FLAG_TOGGLE_NO_VIEW: i64 = 1 << 8;

/// Concrete annotation variant, dispatched on `/Subtype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdAnnotationKind {
    /// `/Subtype /Stamp`
    RubberStamp,
    /// Any other (or missing) subtype
    Unknown,
}

/// View over an annotation dictionary.
#[derive(Debug, Clone)]
pub struct PdAnnotation {
    dict: Dictionary,
    kind: PdAnnotationKind,
}

impl PdAnnotation {
    /// Build the correctly typed annotation view for a COS object.
    ///
    /// # Errors
    ///
    /// Returns `Err` when the object is not a dictionary. An unfamiliar
    /// `/Subtype` is not an error.
    pub fn create(base: &Object) -> Result<PdAnnotation> {
        let dict = base.as_dict().ok_or_else(|| {
            Error::InvalidPdf(format!("annotation is a {}, not a dictionary", base.type_name()))
        })?;
        let kind = match dict.get_name("Subtype").as_deref() {
            Some("Stamp") => PdAnnotationKind::RubberStamp,
            _ => PdAnnotationKind::Unknown,
        };
        Ok(PdAnnotation { dict, kind })
    }

    /// Create a fresh rubber stamp annotation.
    pub fn new_rubber_stamp() -> PdAnnotation {
        let dict = Dictionary::new();
        dict.set_name("Type", "Annot");
        dict.set_name("Subtype", "Stamp");
        PdAnnotation {
            dict,
            kind: PdAnnotationKind::RubberStamp,
        }
    }

    /// Which concrete variant this annotation is.
    pub fn kind(&self) -> PdAnnotationKind {
        self.kind
    }

    /// The backing dictionary.
    pub fn dictionary(&self) -> Dictionary {
        self.dict.clone()
    }

    /// `/Subtype` as written in the dictionary.
    pub fn subtype(&self) -> Option<String> {
        self.dict.get_name("Subtype")
    }

    /// `/Rect`, the annotation's location on the page. Usually present,
    /// but parent form fields of radio button groups legitimately lack
    /// it.
    pub fn rectangle(&self, document: &CosDocument) -> Option<PdRectangle> {
        document
            .resolved_entry(&self.dict, "Rect")
            .and_then(|o| o.as_array())
            .map(PdRectangle::from_array)
    }

    /// Set `/Rect`.
    pub fn set_rectangle(&self, rectangle: &PdRectangle) {
        self.dict.set("Rect", Object::Array(rectangle.cos_array()));
    }

    /// The raw `/F` flag word.
    pub fn annotation_flags(&self) -> i64 {
        self.dict.get_int("F", 0)
    }

    /// Replace the whole `/F` flag word.
    pub fn set_annotation_flags(&self, flags: i64) {
        self.dict.set_int("F", flags);
    }

    fn flag(&self, mask: i64) -> bool {
        self.annotation_flags() & mask != 0
    }

    fn set_flag(&self, mask: i64, on: bool) {
        let flags = self.annotation_flags();
        let updated = if on { flags | mask } else { flags & !mask };
        self.set_annotation_flags(updated);
    }

    /// Get the invisible flag.
    pub fn is_invisible(&self) -> bool {
        self.flag(FLAG_INVISIBLE)
    }

    /// Set the invisible flag.
    pub fn set_invisible(&self, invisible: bool) {
        self.set_flag(FLAG_INVISIBLE, invisible);
    }

    /// Get the hidden flag.
    pub fn is_hidden(&self) -> bool {
        self.flag(FLAG_HIDDEN)
    }

    /// Set the hidden flag.
    pub fn set_hidden(&self, hidden: bool) {
        self.set_flag(FLAG_HIDDEN, hidden);
    }

    /// Get the printed flag.
    pub fn is_printed(&self) -> bool {
        self.flag(FLAG_PRINTED)
    }

    /// Set the printed flag.
    pub fn set_printed(&self, printed: bool) {
        self.set_flag(FLAG_PRINTED, printed);
    }

    /// Get the no-zoom flag.
    pub fn is_no_zoom(&self) -> bool {
        self.flag(FLAG_NO_ZOOM)
    }

    /// Set the no-zoom flag.
    pub fn set_no_zoom(&self, no_zoom: bool) {
        self.set_flag(FLAG_NO_ZOOM, no_zoom);
    }

    /// Get the no-rotate flag.
    pub fn is_no_rotate(&self) -> bool {
        self.flag(FLAG_NO_ROTATE)
    }

    /// Set the no-rotate flag.
    pub fn set_no_rotate(&self, no_rotate: bool) {
        self.set_flag(FLAG_NO_ROTATE, no_rotate);
    }

    /// Get the no-view flag.
    pub fn is_no_view(&self) -> bool {
        self.flag(FLAG_NO_VIEW)
    }

    /// Set the no-view flag.
    pub fn set_no_view(&self, no_view: bool) {
        self.set_flag(FLAG_NO_VIEW, no_view);
    }

    /// Get the read-only flag.
    pub fn is_read_only(&self) -> bool {
        self.flag(FLAG_READ_ONLY)
    }

    /// Set the read-only flag.
    pub fn set_read_only(&self, read_only: bool) {
        self.set_flag(FLAG_READ_ONLY, read_only);
    }

    /// Get the locked flag.
    pub fn is_locked(&self) -> bool {
        self.flag(FLAG_LOCKED)
    }

    /// Set the locked flag.
    pub fn set_locked(&self, locked: bool) {
        self.set_flag(FLAG_LOCKED, locked);
    }

    /// Get the toggle-no-view flag.
    pub fn is_toggle_no_view(&self) -> bool {
        self.flag(FLAG_TOGGLE_NO_VIEW)
    }

    /// Set the toggle-no-view flag.
    pub fn set_toggle_no_view(&self, toggle_no_view: bool) {
        self.set_flag(FLAG_TOGGLE_NO_VIEW, toggle_no_view);
    }

    /// `/AS`, the selected appearance state, if any.
    pub fn appearance_state(&self) -> Option<String> {
        self.dict.get_name("AS")
    }

    /// Set `/AS`; `None` removes the entry.
    pub fn set_appearance_state(&self, state: Option<&str>) {
        match state {
            Some(name) => self.dict.set_name("AS", name),
            None => {
                self.dict.remove("AS");
            }
        }
    }

    /// `/AP`, the appearance dictionary.
    pub fn appearance(&self, document: &CosDocument) -> Option<Dictionary> {
        document
            .resolved_entry(&self.dict, "AP")
            .and_then(|o| o.as_dict())
    }

    /// Set `/AP`; `None` removes the entry.
    pub fn set_appearance(&self, appearance: Option<Dictionary>) {
        match appearance {
            Some(dict) => self.dict.set("AP", Object::Dictionary(dict)),
            None => {
                self.dict.remove("AP");
            }
        }
    }

    /// `/AA`, the additional-actions dictionary.
    pub fn additional_actions(&self, document: &CosDocument) -> Option<Dictionary> {
        document
            .resolved_entry(&self.dict, "AA")
            .and_then(|o| o.as_dict())
    }

    /// `/Contents`, the annotation's text content.
    pub fn contents(&self) -> Option<String> {
        self.dict.get_string("Contents")
    }

    /// Set `/Contents`.
    pub fn set_contents(&self, contents: &str) {
        self.dict.set("Contents", Object::string(contents.as_bytes()));
    }
}
