//! Page tree behavior over parsed documents: counts, traversal,
//! add/remove/import, and inherited attributes.

use pdf_carousel::pd::{PdDocument, PdPage, PdRectangle};
use pdf_carousel::text_order::{TextPosition, compare_positions};
use std::cmp::Ordering;

fn two_page_pdf() -> Vec<u8> {
    b"%PDF-1.4\n\
      1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
      2 0 obj\n<< /Type /Pages /Kids [ 3 0 R 4 0 R ] /Count 2 /MediaBox [ 0 0 612 792 ] >>\nendobj\n\
      3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n\
      4 0 obj\n<< /Type /Page /Parent 2 0 R /Rotate 180 >>\nendobj\n\
      trailer\n<< /Root 1 0 R /Size 5 >>\nstartxref\n0\n%%EOF\n"
        .to_vec()
}

#[test]
fn test_page_count_matches_reachable_leaves() {
    let mut doc = PdDocument::load(two_page_pdf()).unwrap();
    assert_eq!(doc.number_of_pages().unwrap(), 2);

    let catalog = doc.document_catalog();
    let pages = catalog.all_pages(doc.cos_document()).unwrap();
    assert_eq!(pages.len() as i64, doc.number_of_pages().unwrap());
}

#[test]
fn test_update_count_is_idempotent() {
    let mut doc = PdDocument::load(two_page_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let root = catalog.pages(doc.cos_document()).unwrap();

    assert_eq!(root.update_count(doc.cos_document()), 2);
    assert_eq!(root.update_count(doc.cos_document()), 2);
    assert_eq!(root.count(), 2);
}

#[test]
fn test_update_count_repairs_wrong_stored_count() {
    let data = String::from_utf8(two_page_pdf())
        .unwrap()
        .replacen("/Count 2", "/Count 17", 1);
    let mut doc = PdDocument::load(data.into_bytes()).unwrap();

    // The stored count is trusted until recomputed
    assert_eq!(doc.number_of_pages().unwrap(), 17);

    let catalog = doc.document_catalog();
    catalog
        .pages(doc.cos_document())
        .unwrap()
        .update_count(doc.cos_document());
    assert_eq!(doc.number_of_pages().unwrap(), 2);
}

#[test]
fn test_add_then_remove_returns_to_prior_count() {
    let mut doc = PdDocument::load(two_page_pdf()).unwrap();
    let before = doc.number_of_pages().unwrap();

    let page = PdPage::new();
    page.set_media_box(&PdRectangle::new(0.0, 0.0, 612.0, 792.0));
    doc.add_page(&page).unwrap();
    assert_eq!(doc.number_of_pages().unwrap(), before + 1);

    assert!(doc.remove_page(&page).unwrap());
    assert_eq!(doc.number_of_pages().unwrap(), before);
}

#[test]
fn test_remove_parsed_page_by_index() {
    let mut doc = PdDocument::load(two_page_pdf()).unwrap();
    assert!(doc.remove_page_at(0).unwrap());
    assert_eq!(doc.number_of_pages().unwrap(), 1);

    // The remaining page is the rotated one
    let catalog = doc.document_catalog();
    let pages = catalog.all_pages(doc.cos_document()).unwrap();
    assert_eq!(pages[0].find_rotation(doc.cos_document()), 180);
}

#[test]
fn test_media_box_inherited_from_pages_node() {
    let mut doc = PdDocument::load(two_page_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let pages = catalog.all_pages(doc.cos_document()).unwrap();

    let media_box = pages[0].find_media_box(doc.cos_document()).unwrap();
    assert_eq!(media_box.width(), 612.0);
    assert_eq!(media_box.height(), 792.0);
    // Not defined on the page itself
    assert!(pages[0].media_box(doc.cos_document()).is_none());
}

#[test]
fn test_import_page_between_parsed_documents() {
    let data = b"%PDF-1.4\n\
        1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
        2 0 obj\n<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>\nendobj\n\
        3 0 obj\n<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>\nendobj\n\
        4 0 obj\n<< /Length 9 >>\nstream\nq 0 0 0 Q\nendstream\nendobj\n\
        trailer\n<< /Root 1 0 R /Size 5 >>\nstartxref\n0\n%%EOF\n";
    let mut source = PdDocument::load(data.to_vec()).unwrap();
    let source_catalog = source.document_catalog();
    let page = source_catalog.all_pages(source.cos_document()).unwrap()[0].clone();

    let mut dest = PdDocument::new().unwrap();
    let imported = dest.import_page(&mut source, &page).unwrap();
    assert_eq!(dest.number_of_pages().unwrap(), 1);

    // The copy survives closing the source document
    source.close();
    let streams = imported.contents(dest.cos_document());
    assert_eq!(streams.len(), 1);
    let payload = dest
        .cos_document_mut()
        .raw_stream_data(streams[0].span)
        .unwrap();
    assert_eq!(payload, b"q 0 0 0 Q");
}

#[test]
fn test_rotated_page_orders_positions_in_rotated_space() {
    let mut doc = PdDocument::load(two_page_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let pages = catalog.all_pages(doc.cos_document()).unwrap();
    let rotation = pages[1].find_rotation(doc.cos_document());
    assert_eq!(rotation, 180);

    // Same line under 180 degree rotation: the larger original x reads
    // first because the comparison happens on negated coordinates
    let first = TextPosition::new(10.0, 20.0);
    let second = TextPosition::new(5.0, 20.0);
    assert_eq!(compare_positions(rotation, &first, &second), Ordering::Less);
    assert_eq!(compare_positions(rotation, &second, &first), Ordering::Greater);
}
