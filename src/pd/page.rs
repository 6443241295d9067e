//! Page tree views.
//!
//! The page tree is a recursive structure of `/Type /Pages` nodes whose
//! `/Kids` hold further nodes or `/Type /Page` leaves. Children point
//! back up through `/Parent`, which is how inheritable attributes
//! (`/MediaBox`, `/CropBox`, `/Rotate`, `/Resources`) are found for
//! leaves that do not define them locally.
//!
//! Tree links are indirect references, so traversal resolves through the
//! document.

use crate::document::CosDocument;
use crate::error::Result;
use crate::object::{Array, CosStream, Dictionary, Object, ObjectKey};
use crate::pd::annotation::PdAnnotation;
use crate::pd::rectangle::PdRectangle;

/// Bound on upward `/Parent` walks, in case a damaged file links the
/// tree into a cycle.
const MAX_TREE_DEPTH: u32 = 64;

/// A `/Type /Pages` intermediate node.
#[derive(Debug, Clone)]
pub struct PdPageNode {
    dict: Dictionary,
}

impl Default for PdPageNode {
    fn default() -> Self {
        Self::new()
    }
}

impl PdPageNode {
    /// Create an empty page tree node with no kids.
    pub fn new() -> Self {
        let dict = Dictionary::new();
        dict.set_name("Type", "Pages");
        dict.set("Kids", Object::Array(Array::new()));
        dict.set_int("Count", 0);
        Self { dict }
    }

    /// Wrap an existing node dictionary.
    pub fn from_dictionary(dict: Dictionary) -> Self {
        Self { dict }
    }

    /// The backing dictionary.
    pub fn dictionary(&self) -> Dictionary {
        self.dict.clone()
    }

    /// The `/Kids` array, resolved. Created empty on demand so callers
    /// can always append.
    pub fn kids(&self, document: &CosDocument) -> Array {
        match document.resolved_entry(&self.dict, "Kids").and_then(|o| o.as_array()) {
            Some(kids) => kids,
            None => {
                let kids = Array::new();
                self.dict.set("Kids", Object::Array(kids.clone()));
                kids
            }
        }
    }

    /// The stored `/Count` of leaf pages under this node.
    pub fn count(&self) -> i64 {
        self.dict.get_int("Count", 0)
    }

    /// Recompute `/Count` over the whole subtree and return it.
    ///
    /// Pages contribute one; nested nodes contribute their own updated
    /// count. Idempotent: a second run sees the same tree and writes the
    /// same numbers.
    pub fn update_count(&self, document: &CosDocument) -> i64 {
        self.update_count_guarded(document, MAX_TREE_DEPTH)
    }

    fn update_count_guarded(&self, document: &CosDocument, depth: u32) -> i64 {
        if depth == 0 {
            log::warn!("page tree deeper than {} levels, stopping count", MAX_TREE_DEPTH);
            return 0;
        }
        let mut total = 0;
        for kid in self.kids(document).items() {
            let Some(dict) = document.resolve(&kid).as_dict() else {
                continue;
            };
            if is_page_node(&dict) {
                total += PdPageNode::from_dictionary(dict).update_count_guarded(document, depth - 1);
            } else {
                total += 1;
            }
        }
        self.dict.set_int("Count", total);
        total
    }

    /// All leaf pages under this node, in tree order.
    pub fn all_pages(&self, document: &CosDocument) -> Vec<PdPage> {
        let mut pages = Vec::new();
        self.collect_pages(document, &mut pages, MAX_TREE_DEPTH);
        pages
    }

    fn collect_pages(&self, document: &CosDocument, pages: &mut Vec<PdPage>, depth: u32) {
        if depth == 0 {
            return;
        }
        for kid in self.kids(document).items() {
            let Some(dict) = document.resolve(&kid).as_dict() else {
                continue;
            };
            if is_page_node(&dict) {
                PdPageNode::from_dictionary(dict).collect_pages(document, pages, depth - 1);
            } else {
                pages.push(PdPage::from_dictionary(dict));
            }
        }
    }
}

/// True for dictionaries that are intermediate page tree nodes.
fn is_page_node(dict: &Dictionary) -> bool {
    dict.get_name("Type").as_deref() == Some("Pages")
}

/// A `/Type /Page` leaf.
#[derive(Debug, Clone)]
pub struct PdPage {
    dict: Dictionary,
}

impl Default for PdPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PdPage {
    /// Create an empty page.
    pub fn new() -> Self {
        let dict = Dictionary::new();
        dict.set_name("Type", "Page");
        Self { dict }
    }

    /// Wrap an existing page dictionary.
    pub fn from_dictionary(dict: Dictionary) -> Self {
        Self { dict }
    }

    /// The backing dictionary.
    pub fn dictionary(&self) -> Dictionary {
        self.dict.clone()
    }

    /// The parent node, following `/Parent`.
    pub fn parent(&self, document: &CosDocument) -> Option<PdPageNode> {
        document
            .resolved_entry(&self.dict, "Parent")
            .and_then(|o| o.as_dict())
            .map(PdPageNode::from_dictionary)
    }

    /// Point `/Parent` at a page tree node in the pool.
    pub fn set_parent(&self, parent: ObjectKey) {
        self.dict.set("Parent", Object::Reference(parent));
    }

    /// `/MediaBox` defined on this page itself.
    pub fn media_box(&self, document: &CosDocument) -> Option<PdRectangle> {
        self.local_rect(document, "MediaBox")
    }

    /// Set `/MediaBox`.
    pub fn set_media_box(&self, rectangle: &PdRectangle) {
        self.dict.set("MediaBox", Object::Array(rectangle.cos_array()));
    }

    /// `/MediaBox` for this page, searching up the parent chain when the
    /// page does not define one (it is inheritable).
    pub fn find_media_box(&self, document: &CosDocument) -> Option<PdRectangle> {
        self.find_inherited_rect(document, "MediaBox")
    }

    /// `/CropBox` defined on this page itself.
    pub fn crop_box(&self, document: &CosDocument) -> Option<PdRectangle> {
        self.local_rect(document, "CropBox")
    }

    /// Set `/CropBox`.
    pub fn set_crop_box(&self, rectangle: &PdRectangle) {
        self.dict.set("CropBox", Object::Array(rectangle.cos_array()));
    }

    /// `/CropBox` with inheritance, falling back to the effective media
    /// box when no crop box is defined anywhere (the default per PDF Ref
    /// 1.7, Table 3.27).
    pub fn find_crop_box(&self, document: &CosDocument) -> Option<PdRectangle> {
        self.find_inherited_rect(document, "CropBox")
            .or_else(|| self.find_media_box(document))
    }

    /// `/Rotate` defined on this page itself.
    pub fn rotation(&self) -> Option<i64> {
        self.dict.get("Rotate").and_then(|o| o.as_integer())
    }

    /// Set `/Rotate`.
    pub fn set_rotation(&self, degrees: i64) {
        self.dict.set_int("Rotate", degrees);
    }

    /// Effective `/Rotate` with inheritance, zero when absent.
    pub fn find_rotation(&self, document: &CosDocument) -> i64 {
        let mut dict = self.dict.clone();
        for _ in 0..MAX_TREE_DEPTH {
            if let Some(rotation) = document
                .resolved_entry(&dict, "Rotate")
                .and_then(|o| o.as_integer())
            {
                return rotation;
            }
            match document.resolved_entry(&dict, "Parent").and_then(|o| o.as_dict()) {
                Some(parent) => dict = parent,
                None => break,
            }
        }
        0
    }

    fn local_rect(&self, document: &CosDocument, key: &str) -> Option<PdRectangle> {
        document
            .resolved_entry(&self.dict, key)
            .and_then(|o| o.as_array())
            .map(PdRectangle::from_array)
    }

    fn find_inherited_rect(&self, document: &CosDocument, key: &str) -> Option<PdRectangle> {
        let mut dict = self.dict.clone();
        for _ in 0..MAX_TREE_DEPTH {
            if let Some(rect) = document.resolved_entry(&dict, key).and_then(|o| o.as_array()) {
                return Some(PdRectangle::from_array(rect));
            }
            match document.resolved_entry(&dict, "Parent").and_then(|o| o.as_dict()) {
                Some(parent) => dict = parent,
                None => return None,
            }
        }
        None
    }

    /// The page's content streams, resolved. `/Contents` may be a single
    /// stream or an array of streams to be concatenated; either way the
    /// result is the ordered list of streams.
    pub fn contents(&self, document: &CosDocument) -> Vec<CosStream> {
        let Some(contents) = document.resolved_entry(&self.dict, "Contents") else {
            return Vec::new();
        };
        match contents {
            Object::Stream(stream) => vec![stream],
            Object::Array(array) => array
                .items()
                .iter()
                .filter_map(|item| match document.resolve(item) {
                    Object::Stream(stream) => Some(stream),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Replace `/Contents`.
    pub fn set_contents(&self, contents: Object) {
        self.dict.set("Contents", contents);
    }

    /// The page's annotations from `/Annots`.
    ///
    /// Entries that are not dictionaries are skipped with a warning;
    /// unknown subtypes are returned as
    /// [`Unknown`](crate::pd::annotation::PdAnnotationKind::Unknown)
    /// annotations.
    pub fn annotations(&self, document: &CosDocument) -> Result<Vec<PdAnnotation>> {
        let Some(annots) = document
            .resolved_entry(&self.dict, "Annots")
            .and_then(|o| o.as_array())
        else {
            return Ok(Vec::new());
        };

        let mut annotations = Vec::new();
        for item in annots.items() {
            match PdAnnotation::create(&document.resolve(&item)) {
                Ok(annotation) => annotations.push(annotation),
                Err(err) => log::warn!("skipping malformed annotation: {}", err),
            }
        }
        Ok(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Install a small two-level tree: root node, inner node, two leaf
    /// pages under the inner node and one directly under the root.
    fn build_tree(document: &mut CosDocument) -> PdPageNode {
        let root = PdPageNode::new();
        let root_key = document.add_object(Object::Dictionary(root.dictionary()));

        let inner = PdPageNode::new();
        let inner_key = document.add_object(Object::Dictionary(inner.dictionary()));
        inner.dictionary().set("Parent", Object::Reference(root_key));

        for _ in 0..2 {
            let page = PdPage::new();
            let page_key = document.add_object(Object::Dictionary(page.dictionary()));
            page.set_parent(inner_key);
            inner.kids(document).push(Object::Reference(page_key));
        }

        let direct = PdPage::new();
        let direct_key = document.add_object(Object::Dictionary(direct.dictionary()));
        direct.set_parent(root_key);

        let root_kids = root.kids(document);
        root_kids.push(Object::Reference(inner_key));
        root_kids.push(Object::Reference(direct_key));
        root
    }

    #[test]
    fn test_update_count_recurses_and_is_idempotent() {
        let mut document = CosDocument::new().unwrap();
        let root = build_tree(&mut document);

        assert_eq!(root.update_count(&document), 3);
        assert_eq!(root.count(), 3);
        // Second run recomputes the same numbers
        assert_eq!(root.update_count(&document), 3);
        assert_eq!(root.count(), 3);
    }

    #[test]
    fn test_all_pages_in_tree_order() {
        let mut document = CosDocument::new().unwrap();
        let root = build_tree(&mut document);
        let pages = root.all_pages(&document);
        assert_eq!(pages.len(), 3);
        // Leaves of the inner node come before the direct child
        assert!(pages[0].parent(&document).is_some());
    }

    #[test]
    fn test_unresolvable_kid_is_skipped() {
        let mut document = CosDocument::new().unwrap();
        let root = PdPageNode::new();
        document.add_object(Object::Dictionary(root.dictionary()));
        root.kids(&document).push(Object::Reference(ObjectKey::new(99, 0)));
        assert_eq!(root.update_count(&document), 0);
    }

    #[test]
    fn test_inherited_media_box() {
        let mut document = CosDocument::new().unwrap();
        let node = PdPageNode::new();
        let node_key = document.add_object(Object::Dictionary(node.dictionary()));
        node.dictionary().set(
            "MediaBox",
            Object::Array(PdRectangle::new(0.0, 0.0, 612.0, 792.0).cos_array()),
        );

        let page = PdPage::new();
        document.add_object(Object::Dictionary(page.dictionary()));
        page.set_parent(node_key);

        assert!(page.media_box(&document).is_none());
        let found = page.find_media_box(&document).unwrap();
        assert_eq!(found.width(), 612.0);

        // A local media box shadows the inherited one
        page.set_media_box(&PdRectangle::new(0.0, 0.0, 300.0, 300.0));
        assert_eq!(page.find_media_box(&document).unwrap().width(), 300.0);
    }

    #[test]
    fn test_find_crop_box_falls_back_to_media_box() {
        let mut document = CosDocument::new().unwrap();
        let page = PdPage::new();
        document.add_object(Object::Dictionary(page.dictionary()));
        page.set_media_box(&PdRectangle::new(0.0, 0.0, 200.0, 100.0));

        let crop = page.find_crop_box(&document).unwrap();
        assert_eq!(crop.width(), 200.0);
    }

    #[test]
    fn test_find_rotation_walks_parents() {
        let mut document = CosDocument::new().unwrap();
        let node = PdPageNode::new();
        let node_key = document.add_object(Object::Dictionary(node.dictionary()));
        node.dictionary().set_int("Rotate", 180);

        let page = PdPage::new();
        document.add_object(Object::Dictionary(page.dictionary()));
        page.set_parent(node_key);

        assert_eq!(page.rotation(), None);
        assert_eq!(page.find_rotation(&document), 180);

        page.set_rotation(90);
        assert_eq!(page.find_rotation(&document), 90);
    }

    #[test]
    fn test_contents_single_and_array() {
        let mut document = CosDocument::new().unwrap();
        let span = document.write_stream_payload(b"BT ET").unwrap();
        let dict = Dictionary::new();
        dict.set_int("Length", 5);
        let stream = CosStream { dict, span };
        let stream_key = document.add_object(Object::Stream(stream));

        let page = PdPage::new();
        page.set_contents(Object::Reference(stream_key));
        assert_eq!(page.contents(&document).len(), 1);

        let list: Array = [Object::Reference(stream_key), Object::Reference(stream_key)]
            .into_iter()
            .collect();
        page.set_contents(Object::Array(list));
        assert_eq!(page.contents(&document).len(), 2);

        let empty = PdPage::new();
        assert!(empty.contents(&document).is_empty());
    }

    #[test]
    fn test_annotations_skip_non_dictionaries() {
        let mut document = CosDocument::new().unwrap();
        let annot = Dictionary::new();
        annot.set_name("Subtype", "Stamp");
        let annots: Array = [Object::Dictionary(annot), Object::Integer(5)]
            .into_iter()
            .collect();

        let page = PdPage::new();
        page.dictionary().set("Annots", Object::Array(annots));
        document.add_object(Object::Dictionary(page.dictionary()));

        let found = page.annotations(&document).unwrap();
        assert_eq!(found.len(), 1);
    }
}
