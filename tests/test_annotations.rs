//! Annotation behavior over parsed documents: subtype dispatch, flag
//! bits, and write-through mutation.

use pdf_carousel::pd::{PdAnnotationKind, PdDocument};

fn annotated_pdf() -> Vec<u8> {
    b"%PDF-1.4\n\
      1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
      2 0 obj\n<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>\nendobj\n\
      3 0 obj\n<< /Type /Page /Parent 2 0 R /Annots [ 4 0 R 5 0 R ] >>\nendobj\n\
      4 0 obj\n<< /Type /Annot /Subtype /Stamp /F 12 /Rect [ 10 10 60 30 ] /Contents (Approved) >>\nendobj\n\
      5 0 obj\n<< /Type /Annot /Subtype /Squiggle3000 /AS /On >>\nendobj\n\
      trailer\n<< /Root 1 0 R /Size 6 >>\nstartxref\n0\n%%EOF\n"
        .to_vec()
}

#[test]
fn test_annotations_found_on_page() {
    let mut doc = PdDocument::load(annotated_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let page = catalog.all_pages(doc.cos_document()).unwrap()[0].clone();

    let annotations = page.annotations(doc.cos_document()).unwrap();
    assert_eq!(annotations.len(), 2);
}

#[test]
fn test_subtype_dispatch_never_fails() {
    let mut doc = PdDocument::load(annotated_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let page = catalog.all_pages(doc.cos_document()).unwrap()[0].clone();
    let annotations = page.annotations(doc.cos_document()).unwrap();

    assert_eq!(annotations[0].kind(), PdAnnotationKind::RubberStamp);
    // An invented subtype still yields a usable annotation
    assert_eq!(annotations[1].kind(), PdAnnotationKind::Unknown);
    assert_eq!(annotations[1].subtype().as_deref(), Some("Squiggle3000"));
    assert_eq!(annotations[1].appearance_state().as_deref(), Some("On"));
}

#[test]
fn test_flag_bits() {
    let mut doc = PdDocument::load(annotated_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let page = catalog.all_pages(doc.cos_document()).unwrap()[0].clone();
    let stamp = page.annotations(doc.cos_document()).unwrap().remove(0);

    // /F 12 sets bits 2 and 3
    assert!(stamp.is_printed());
    assert!(stamp.is_no_zoom());
    assert!(!stamp.is_invisible());
    assert!(!stamp.is_hidden());
    assert!(!stamp.is_no_rotate());
    assert!(!stamp.is_no_view());
    assert!(!stamp.is_read_only());
    assert!(!stamp.is_locked());
    assert!(!stamp.is_toggle_no_view());

    stamp.set_hidden(true);
    assert_eq!(stamp.annotation_flags(), 14);
}

#[test]
fn test_mutation_writes_through_to_the_pool() {
    let mut doc = PdDocument::load(annotated_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let page = catalog.all_pages(doc.cos_document()).unwrap()[0].clone();
    let stamp = page.annotations(doc.cos_document()).unwrap().remove(0);

    stamp.set_contents("Rejected");

    // A second traversal sees the mutation
    let again = page.annotations(doc.cos_document()).unwrap().remove(0);
    assert_eq!(again.contents().as_deref(), Some("Rejected"));
}

#[test]
fn test_rectangle_geometry() {
    let mut doc = PdDocument::load(annotated_pdf()).unwrap();
    let catalog = doc.document_catalog();
    let page = catalog.all_pages(doc.cos_document()).unwrap()[0].clone();
    let stamp = page.annotations(doc.cos_document()).unwrap().remove(0);

    let rect = stamp.rectangle(doc.cos_document()).unwrap();
    assert_eq!(rect.lower_left_x(), 10.0);
    assert_eq!(rect.width(), 50.0);
    assert_eq!(rect.height(), 20.0);
}
