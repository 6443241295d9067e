//! Object stream expansion (PDF 1.5+).
//!
//! An object stream (`/Type /ObjStm`) packs multiple indirect objects into
//! one compressed stream. Its decoded payload starts with `/N` pairs of
//! integers (object number, byte offset), followed at `/First` by the
//! concatenated direct objects:
//!
//! ```text
//! 12 0 obj
//! << /Type /ObjStm /N 3 /First 14 /Filter /FlateDecode >>
//! stream
//! 10 0 11 6 12 12
//! <obj 10> <obj 11> <obj 12>
//! endstream
//! endobj
//! ```
//!
//! Expansion walks every object stream in the pool and installs each
//! contained object at `(number, 0)`. Compressed objects always have
//! generation zero.

use crate::document::CosDocument;
use crate::error::{Error, Result};
use crate::object::{CosStream, Object, ObjectKey};
use crate::parser::parse_direct_object;

/// Sanity bounds on object stream parameters, guarding against corrupt
/// dictionaries driving huge allocations.
const MAX_OBJECT_COUNT: i64 = 1_000_000;
const MAX_FIRST_OFFSET: i64 = 10_000_000;

/// Expand every object stream in the document's pool.
///
/// Stream-level failures abort the expansion; failures on individual
/// contained objects are logged and skipped so one broken entry does not
/// discard its siblings.
pub fn expand_object_streams(document: &mut CosDocument) -> Result<()> {
    for (key, object) in document.objects_by_type("ObjStm") {
        let Object::Stream(stream) = object else {
            log::warn!("object {} has /Type /ObjStm but is not a stream", key);
            continue;
        };
        let installed = expand_one(document, &stream)?;
        log::debug!("expanded {} objects from object stream {}", installed, key);
    }
    Ok(())
}

/// Expand a single object stream, returning how many objects were
/// installed.
fn expand_one(document: &mut CosDocument, stream: &CosStream) -> Result<usize> {
    let count = document
        .resolved_entry(&stream.dict, "N")
        .and_then(|o| o.as_integer())
        .ok_or_else(|| Error::InvalidPdf("object stream missing /N entry".to_string()))?;
    let first = document
        .resolved_entry(&stream.dict, "First")
        .and_then(|o| o.as_integer())
        .ok_or_else(|| Error::InvalidPdf("object stream missing /First entry".to_string()))?;

    if !(0..=MAX_OBJECT_COUNT).contains(&count) {
        return Err(Error::InvalidPdf(format!("invalid object stream /N value: {}", count)));
    }
    if !(0..=MAX_FIRST_OFFSET).contains(&first) {
        return Err(Error::InvalidPdf(format!(
            "invalid object stream /First value: {}",
            first
        )));
    }
    let count = count as usize;
    let first = first as usize;

    let data = document.decoded_stream_data(stream)?;
    if data.len() < first {
        return Err(Error::InvalidPdf(format!(
            "object stream data is {} bytes, /First is {}",
            data.len(),
            first
        )));
    }

    let pairs = parse_offset_pairs(&data[..first], count)?;
    let objects_data = &data[first..];
    let mut installed = 0;

    for (number, offset) in pairs {
        if offset >= objects_data.len() {
            log::warn!(
                "object {} offset {} is beyond stream data length {}",
                number,
                offset,
                objects_data.len()
            );
            continue;
        }
        match parse_direct_object(&objects_data[offset..]) {
            Ok((_, object)) => {
                document.register_references(&object);
                document.set_object(ObjectKey::new(number, 0), object);
                installed += 1;
            }
            Err(err) => {
                log::warn!(
                    "failed to parse object {} at stream offset {}: {:?}",
                    number,
                    offset,
                    err
                );
            }
        }
    }

    Ok(installed)
}

/// Parse the `(object number, offset)` pairs that open an object stream's
/// payload.
fn parse_offset_pairs(data: &[u8], count: usize) -> Result<Vec<(u32, usize)>> {
    let mut pairs = Vec::with_capacity(count);
    let mut cursor = data;

    for index in 0..count {
        let (rest, number) = read_unsigned(cursor).ok_or_else(|| Error::InvalidPdf(format!(
            "object stream index truncated at pair {}",
            index
        )))?;
        let (rest, offset) = read_unsigned(rest).ok_or_else(|| Error::InvalidPdf(format!(
            "object stream index missing offset at pair {}",
            index
        )))?;
        pairs.push((number as u32, offset as usize));
        cursor = rest;
    }

    Ok(pairs)
}

/// Read a whitespace-delimited unsigned decimal from the front of a
/// slice.
fn read_unsigned(data: &[u8]) -> Option<(&[u8], u64)> {
    let mut i = 0;
    while i < data.len() && matches!(data[i], 0 | 9 | 10 | 12 | 13 | 32) {
        i += 1;
    }
    let start = i;
    let mut value: u64 = 0;
    while i < data.len() && data[i].is_ascii_digit() {
        value = value.saturating_mul(10).saturating_add((data[i] - b'0') as u64);
        i += 1;
    }
    if i == start {
        return None;
    }
    Some((&data[i..], value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Dictionary;

    #[test]
    fn test_read_unsigned() {
        assert_eq!(read_unsigned(b"123 rest"), Some((&b" rest"[..], 123)));
        assert_eq!(read_unsigned(b"  42"), Some((&b""[..], 42)));
        assert_eq!(read_unsigned(b"x"), None);
        assert_eq!(read_unsigned(b""), None);
    }

    #[test]
    fn test_parse_offset_pairs() {
        let pairs = parse_offset_pairs(b"10 0 11 15 12 28", 3).unwrap();
        assert_eq!(pairs, vec![(10, 0), (11, 15), (12, 28)]);

        let pairs = parse_offset_pairs(b"  10   0\n11  15 ", 2).unwrap();
        assert_eq!(pairs, vec![(10, 0), (11, 15)]);
    }

    #[test]
    fn test_parse_offset_pairs_truncated() {
        assert!(parse_offset_pairs(b"10 0 11", 2).is_err());
    }

    fn object_stream(document: &mut CosDocument, count: i64, first: i64, payload: &[u8]) -> CosStream {
        let dict = Dictionary::new();
        dict.set_name("Type", "ObjStm");
        dict.set_int("N", count);
        dict.set_int("First", first);
        dict.set_int("Length", payload.len() as i64);
        let span = document.write_stream_payload(payload).unwrap();
        CosStream { dict, span }
    }

    #[test]
    fn test_expand_installs_objects_at_generation_zero() {
        let mut document = CosDocument::new().unwrap();
        // Pairs "10 0 11 3 " end at offset 10; objects are "42 /Test"
        let payload = b"10 0 11 3 42 /Test";
        let stream = object_stream(&mut document, 2, 10, payload);
        document.set_object(ObjectKey::new(5, 0), Object::Stream(stream));

        expand_object_streams(&mut document).unwrap();

        assert_eq!(
            document.object(ObjectKey::new(10, 0)).unwrap().as_integer(),
            Some(42)
        );
        assert_eq!(
            document.object(ObjectKey::new(11, 0)).unwrap().as_name(),
            Some("Test")
        );
    }

    #[test]
    fn test_expand_skips_bad_offsets() {
        let mut document = CosDocument::new().unwrap();
        // Second pair points far beyond the payload
        let payload = b"10 0 11 900 42 7";
        let stream = object_stream(&mut document, 2, 11, payload);
        document.set_object(ObjectKey::new(5, 0), Object::Stream(stream));

        expand_object_streams(&mut document).unwrap();

        assert!(document.object(ObjectKey::new(10, 0)).is_some());
        assert!(document.object(ObjectKey::new(11, 0)).is_none());
    }

    #[test]
    fn test_missing_n_is_an_error() {
        let mut document = CosDocument::new().unwrap();
        let dict = Dictionary::new();
        dict.set_name("Type", "ObjStm");
        dict.set_int("First", 4);
        let span = document.write_stream_payload(b"1 0 5").unwrap();
        document.set_object(
            ObjectKey::new(5, 0),
            Object::Stream(CosStream { dict, span }),
        );

        assert!(expand_object_streams(&mut document).is_err());
    }
}
