//! Linear PDF file parser.
//!
//! [`FileParser`] reconstructs a [`CosDocument`] from raw bytes with a
//! single forward scan: header, then a dispatch loop over indirect
//! objects, `xref` tables, `trailer` dictionaries, and
//! `startxref`/`%%EOF` sections, in whatever order the file presents
//! them. Cross-reference tables are *not* consulted for random access;
//! every object is parsed as it is encountered, which is what lets badly
//! damaged files round-trip (tolerance over efficiency).
//!
//! Real-world files violate the grammar in well-known ways and the parser
//! accepts all of the documented ones: garbage bytes before the header,
//! missing `endobj` keywords, doubled `endobj` keywords, wrong `/Length`
//! entries, multiple trailers, and arbitrary junk after the final
//! `%%EOF`.
//!
//! On any failure the partially built document is closed (releasing its
//! scratch file) before the error is returned; a parse never yields a
//! partial document.

use crate::document::{CosDocument, XrefSection};
use crate::error::{Error, Result};
use crate::object::{CosStream, Dictionary, Object, ObjectKey};
use crate::parser;
use crate::source::{ByteSource, is_pdf_delimiter, is_pdf_whitespace};
use std::path::PathBuf;

const PDF_HEADER: &str = "%PDF-";
const ENDSTREAM: &[u8] = b"endstream";

/// The linear parse driver.
///
/// # Example
///
/// ```
/// use pdf_carousel::file_parser::FileParser;
/// use pdf_carousel::source::ByteSource;
///
/// let data = b"%PDF-1.4\n1 0 obj\n<< /Answer 42 >>\nendobj\n\
///              trailer\n<< /Size 2 >>\nstartxref\n0\n%%EOF\n";
/// let doc = FileParser::new(ByteSource::new(data.to_vec())).parse()?;
/// assert_eq!(doc.version(), 1.4);
/// # Ok::<(), pdf_carousel::Error>(())
/// ```
pub struct FileParser {
    source: ByteSource,
    scratch_directory: Option<PathBuf>,
}

impl FileParser {
    /// Create a parser over a byte source.
    pub fn new(source: ByteSource) -> Self {
        Self {
            source,
            scratch_directory: None,
        }
    }

    /// Put the document's scratch file in a specific directory instead of
    /// the system temp directory.
    pub fn with_scratch_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_directory = Some(dir.into());
        self
    }

    /// Parse the input and return the reconstructed document.
    ///
    /// The byte source is consumed; the document's scratch file is
    /// released before returning on failure.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHeader`] when no usable `%PDF-` header is found,
    /// [`Error::ExpectedKeyword`] and friends for structural damage
    /// beyond the documented tolerances, [`Error::Io`] for trouble with
    /// the scratch file.
    pub fn parse(mut self) -> Result<CosDocument> {
        let mut document = match &self.scratch_directory {
            Some(dir) => CosDocument::with_scratch_directory(dir)?,
            None => CosDocument::new()?,
        };
        match self.parse_into(&mut document) {
            Ok(()) => Ok(document),
            Err(err) => {
                document.close();
                Err(err)
            }
        }
    }

    fn parse_into(&mut self, document: &mut CosDocument) -> Result<()> {
        self.parse_header(document)?;
        self.skip_header_fill_bytes();

        let mut saw_eof_marker = false;
        while !self.source.is_eof() {
            match self.parse_section(document) {
                Ok(marker) => saw_eof_marker = marker,
                Err(err) => {
                    // Files commonly carry junk after the final %%EOF
                    if saw_eof_marker {
                        log::debug!("ignoring data after %%EOF: {}", err);
                        break;
                    }
                    return Err(err);
                }
            }
            self.source.skip_whitespace();
        }

        // No trailer section at all: PDF 1.5+ files carry the trailer
        // entries on their cross-reference stream dictionaries instead.
        if document.trailer().map_or(true, |t| t.is_empty()) {
            let trailer = document.trailer().unwrap_or_default();
            for (key, object) in document.objects_by_type("XRef") {
                log::debug!("merging trailer entries from cross-reference stream {}", key);
                if let Some(dict) = object.as_dict() {
                    trailer.merge_absent(&dict);
                }
            }
            document.set_trailer(trailer);
        }

        if !document.is_encrypted() {
            document.dereference_object_streams()?;
        }
        Ok(())
    }

    /// Parse the `%PDF-d.d` header line.
    ///
    /// Some producers put garbage bytes before the header; everything up
    /// to the first `%PDF-` on the line is trimmed. The unmodified line
    /// is kept on the document.
    fn parse_header(&mut self, document: &mut CosDocument) -> Result<()> {
        let header = self.source.read_line();
        log::debug!("header={:?}", header);
        document.set_header_string(header.clone());

        if header.len() < PDF_HEADER.len() + 1 {
            return Err(Error::InvalidHeader(header));
        }
        let start = match header.find(PDF_HEADER) {
            Some(start) => start,
            None => return Err(Error::InvalidHeader(header)),
        };
        let trimmed = &header[start..];

        // Three bytes of version, "1.4" style
        let version_end = trimmed.len().min(PDF_HEADER.len() + 3);
        let version: f32 = trimmed
            .get(PDF_HEADER.len()..version_end)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::InvalidHeader(header.clone()))?;
        document.set_version(version);
        Ok(())
    }

    /// Skip the binary fill bytes some producers put on the line after
    /// the header (PDF Ref 1.7, 3.4.1).
    fn skip_header_fill_bytes(&mut self) {
        self.source.skip_whitespace();
        match self.source.peek() {
            Some(byte) if byte.is_ascii_digit() => {}
            Some(_) => {
                self.source.read_line();
            }
            None => {}
        }
    }

    /// Parse one file section, dispatched on the first byte. Returns
    /// true when the section ended with a `%%EOF` marker.
    fn parse_section(&mut self, document: &mut CosDocument) -> Result<bool> {
        let peeked = match self.source.peek() {
            Some(byte) => byte,
            None => return Ok(false),
        };

        match peeked {
            b'x' => {
                self.parse_xref_table(document)?;
                Ok(false)
            }
            // startxref may follow a trailer or stand alone
            b't' | b's' => {
                let mut next = peeked;
                if next == b't' {
                    self.parse_trailer(document)?;
                    next = self.source.peek().unwrap_or(0);
                }
                if next == b's' {
                    self.parse_startxref()?;
                    self.expect_eof_marker()?;
                    return Ok(true);
                }
                Ok(false)
            }
            _ => {
                self.parse_indirect_object(document)?;
                Ok(false)
            }
        }
    }

    /// Parse a cross-reference table. Only the `(start, count)` section
    /// headers are recorded; the entries are read and discarded.
    fn parse_xref_table(&mut self, document: &mut CosDocument) -> Result<()> {
        self.require_keyword("xref")?;

        loop {
            let start = self.read_int()?;
            let count = self.read_int()?;
            self.source.skip_whitespace();

            for _ in 0..count.max(0) {
                match self.source.peek() {
                    None | Some(b't') => break,
                    Some(byte) if is_pdf_delimiter(byte) => break,
                    Some(_) => {}
                }
                self.source.read_line();
                self.source.skip_whitespace();
            }

            document.add_xref_section(XrefSection {
                start: clamp_u32(start),
                count: clamp_u32(count),
            });

            self.source.skip_whitespace();
            match self.source.peek() {
                Some(byte) if byte.is_ascii_digit() => continue,
                _ => break,
            }
        }
        Ok(())
    }

    /// Parse a trailer dictionary and merge it into the document.
    ///
    /// A linear scan meets the most recent incremental update first, so
    /// on key conflicts the trailer already held by the document wins.
    fn parse_trailer(&mut self, document: &mut CosDocument) -> Result<()> {
        self.require_keyword("trailer")?;

        let parsed = match self.parse_direct()? {
            Object::Dictionary(dict) => dict,
            other => {
                return Err(Error::InvalidPdf(format!(
                    "trailer is a {}, not a dictionary",
                    other.type_name()
                )));
            }
        };

        document.register_references(&Object::Dictionary(parsed.clone()));
        match document.trailer() {
            None => document.set_trailer(parsed),
            Some(existing) => {
                log::debug!("merging additional trailer section");
                existing.merge_absent(&parsed);
            }
        }
        self.source.skip_whitespace();
        Ok(())
    }

    /// Parse a `startxref` section. The recorded offset points at the
    /// last cross-reference section, which a linear parse has no use
    /// for; it is read and discarded.
    fn parse_startxref(&mut self) -> Result<()> {
        self.require_keyword("startxref")?;
        let _offset = self.read_int()?;
        Ok(())
    }

    /// Require the `%%EOF` marker. Input that simply ends without one is
    /// accepted.
    fn expect_eof_marker(&mut self) -> Result<()> {
        let actual = self.source.read_token();
        if !actual.contains("%%EOF") {
            if !self.source.is_eof() {
                return Err(Error::ExpectedKeyword {
                    expected: "%%EOF",
                    actual,
                });
            }
            log::debug!("input ended without %%EOF marker");
        }
        Ok(())
    }

    /// Parse `num gen obj <value> [stream ... endstream] endobj` and
    /// install the value in the pool.
    fn parse_indirect_object(&mut self, document: &mut CosDocument) -> Result<()> {
        // Some producers emit a second endobj after an object; if the
        // first integer read chokes on one, retry once.
        let number = match self.read_int() {
            Ok(number) => number,
            Err(_) => self.read_int()?,
        };
        self.source.skip_whitespace();
        let generation = self.read_int()?;

        let offset = self.source.position();
        let number = u32::try_from(number).map_err(|_| Error::Parse {
            offset,
            reason: format!("invalid object number {}", number),
        })?;
        let generation = u16::try_from(generation).map_err(|_| Error::Parse {
            offset,
            reason: format!("invalid generation number {}", generation),
        })?;
        log::debug!("parsing object ({}, {})", number, generation);

        self.require_keyword("obj")?;
        self.source.skip_whitespace();

        let mut value = self.parse_direct()?;

        let mut end_keyword = self.source.read_token();
        if end_keyword == "stream" {
            let dict = match value {
                Object::Dictionary(dict) => dict,
                _ => return Err(Error::StreamNotPrecededByDict),
            };
            value = Object::Stream(self.parse_stream_payload(dict, document)?);
            end_keyword = self.source.read_token();
        }

        document.register_references(&value);
        document.set_object(ObjectKey::new(number, generation), value);

        if end_keyword != "endobj" && !self.source.is_eof() {
            if end_keyword.parse::<f32>().is_ok() {
                // endobj is missing and the next object starts here
                log::debug!(
                    "missing 'endobj' after object ({}, {}), found '{}', continuing",
                    number,
                    generation,
                    end_keyword
                );
                self.source.unread_many(end_keyword.len());
            } else {
                // Writer garbage between the object and its endobj
                let second = self.source.read_token();
                if second != "endobj" {
                    return Err(Error::ExpectedKeyword {
                        expected: "endobj",
                        actual: second,
                    });
                }
            }
        }
        self.source.skip_whitespace();
        Ok(())
    }

    /// Capture a stream payload into the document's scratch file.
    ///
    /// `/Length` (resolved through the pool, so indirect lengths work) is
    /// preferred, but only after verifying that `endstream` actually
    /// follows the declared extent; otherwise the payload is delimited by
    /// scanning for the next `endstream` preceded by an end of line.
    fn parse_stream_payload(
        &mut self,
        dict: Dictionary,
        document: &mut CosDocument,
    ) -> Result<CosStream> {
        // One EOL follows the stream keyword. CRLF and LF are legal; a
        // lone CR is accepted anyway.
        match self.source.peek() {
            Some(b'\r') => {
                self.source.read();
                if self.source.peek() == Some(b'\n') {
                    self.source.read();
                }
            }
            Some(b'\n') => {
                self.source.read();
            }
            _ => log::warn!("no end of line after 'stream' keyword"),
        }

        let payload_start = self.source.position();
        let declared = dict
            .get("Length")
            .map(|length| document.resolve(&length))
            .and_then(|length| length.as_integer());

        let payload_end = match declared {
            Some(length)
                if length >= 0 && self.length_is_plausible(payload_start, length as usize) =>
            {
                payload_start + length as usize
            }
            declared => {
                match declared {
                    Some(length) => log::warn!(
                        "stream /Length {} does not line up with 'endstream', scanning",
                        length
                    ),
                    None => log::warn!("stream has no usable /Length, scanning for 'endstream'"),
                }
                self.scan_for_endstream(payload_start)?
            }
        };

        let span = document.write_stream_payload(self.source.slice(payload_start, payload_end))?;
        self.source.set_position(payload_end);
        self.require_keyword("endstream")?;

        Ok(CosStream { dict, span })
    }

    /// Check that a declared `/Length` lands on whitespace followed by
    /// the `endstream` keyword.
    fn length_is_plausible(&self, start: usize, length: usize) -> bool {
        let end = match start.checked_add(length) {
            Some(end) => end,
            None => return false,
        };
        let buf = self.source.as_slice();
        if end > buf.len() {
            return false;
        }
        let mut i = end;
        while i < buf.len() && is_pdf_whitespace(buf[i]) {
            i += 1;
        }
        buf[i..].starts_with(ENDSTREAM)
    }

    /// Find the payload end by scanning for `endstream`, trimming the
    /// end of line that separates payload from keyword.
    fn scan_for_endstream(&self, start: usize) -> Result<usize> {
        let buf = self.source.as_slice();
        let found = buf[start..]
            .windows(ENDSTREAM.len())
            .position(|window| window == ENDSTREAM)
            .ok_or(Error::ExpectedKeyword {
                expected: "endstream",
                actual: "<end of input>".to_string(),
            })?;

        let mut end = start + found;
        if end >= start + 2 && &buf[end - 2..end] == b"\r\n" {
            end -= 2;
        } else if end >= start + 1 && matches!(buf[end - 1], b'\r' | b'\n') {
            end -= 1;
        }
        Ok(end)
    }

    /// Parse one direct object at the cursor through the slice-based
    /// object parser.
    fn parse_direct(&mut self) -> Result<Object> {
        let total = self.source.as_slice().len();
        let (remaining, object) = parser::parse_direct_object_at(total, self.source.rest())?;
        self.source.consume_to(remaining);
        Ok(object)
    }

    /// Read a whitespace-delimited token and require it to be an
    /// integer. The token is consumed either way, which is what makes
    /// retry-after-garbage possible.
    fn read_int(&mut self) -> Result<i64> {
        let offset = self.source.position();
        let token = self.source.read_token();
        token.parse::<i64>().map_err(|_| Error::Parse {
            offset,
            reason: format!("expected integer, found '{}'", token),
        })
    }

    fn require_keyword(&mut self, expected: &'static str) -> Result<()> {
        let actual = self.source.read_token();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::ExpectedKeyword { expected, actual })
        }
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Result<CosDocument> {
        FileParser::new(ByteSource::new(data.to_vec())).parse()
    }

    const MINIMAL: &[u8] = b"%PDF-1.4\n\
        1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
        2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n\
        xref\n0 3\n\
        0000000000 65535 f \n\
        0000000009 00000 n \n\
        0000000060 00000 n \n\
        trailer\n<< /Root 1 0 R /Size 3 >>\nstartxref\n116\n%%EOF\n";

    #[test]
    fn test_minimal_document() {
        let doc = parse(MINIMAL).unwrap();
        assert_eq!(doc.version(), 1.4);
        assert_eq!(doc.header_string(), "%PDF-1.4");

        let trailer = doc.trailer().unwrap();
        assert_eq!(trailer.get_int("Size", 0), 3);
        assert_eq!(
            trailer.get("Root").unwrap().as_reference(),
            Some(ObjectKey::new(1, 0))
        );

        let catalog = doc.object(ObjectKey::new(1, 0)).unwrap();
        assert_eq!(catalog.as_dict().unwrap().get_name("Type").as_deref(), Some("Catalog"));
    }

    #[test]
    fn test_xref_sections_recorded_but_not_consulted() {
        let doc = parse(MINIMAL).unwrap();
        assert_eq!(doc.xref_sections(), &[XrefSection { start: 0, count: 3 }]);
    }

    #[test]
    fn test_garbage_before_header() {
        let mut data = vec![0u8; 17];
        data.extend_from_slice(MINIMAL);
        let doc = parse(&data).unwrap();
        assert_eq!(doc.version(), 1.4);
    }

    #[test]
    fn test_corrupt_header() {
        assert!(matches!(parse(b"not a pdf"), Err(Error::InvalidHeader(_))));
        assert!(matches!(parse(b"%PDF-"), Err(Error::InvalidHeader(_))));
        assert!(matches!(parse(b"%PDF-x.y\n"), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_header_fill_bytes_skipped() {
        let data = b"%PDF-1.3\n\xe2\xe3\xcf\xd3\n\
            1 0 obj\n42\nendobj\n\
            trailer\n<< /Size 2 >>\nstartxref\n0\n%%EOF\n";
        let doc = parse(data).unwrap();
        assert_eq!(doc.object(ObjectKey::new(1, 0)).unwrap().as_integer(), Some(42));
    }

    #[test]
    fn test_missing_endobj_tolerated() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n<< /A 1 >>\n\
            2 0 obj\n<< /B 2 >>\nendobj\n\
            trailer\n<< /Size 3 >>\nstartxref\n0\n%%EOF\n";
        let doc = parse(data).unwrap();
        assert!(doc.object(ObjectKey::new(1, 0)).is_some());
        assert!(doc.object(ObjectKey::new(2, 0)).is_some());
    }

    #[test]
    fn test_double_endobj_tolerated() {
        // "GNU Ghostscript 5.10" wrote two endobj keywords per object
        let data = b"%PDF-1.4\n\
            1 0 obj\n10\nendobj\nendobj\n\
            2 0 obj\n20\nendobj\n\
            trailer\n<< /Size 3 >>\nstartxref\n0\n%%EOF\n";
        let doc = parse(data).unwrap();
        assert_eq!(doc.object(ObjectKey::new(2, 0)).unwrap().as_integer(), Some(20));
    }

    #[test]
    fn test_trailing_junk_after_eof() {
        let mut data = MINIMAL.to_vec();
        data.extend_from_slice(b"\x01\x02 random trailing junk \xff\xfe");
        assert!(parse(&data).is_ok());
    }

    #[test]
    fn test_junk_without_eof_marker_fails() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n42\nendobj\n\
            \x01\x02 junk with no eof marker";
        assert!(parse(data).is_err());
    }

    #[test]
    fn test_multiple_trailers_first_wins() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n42\nendobj\n\
            trailer\n<< /Size 10 /Root 1 0 R >>\n\
            trailer\n<< /Size 99 /Prev 5 >>\n\
            startxref\n0\n%%EOF\n";
        let doc = parse(data).unwrap();
        let trailer = doc.trailer().unwrap();
        assert_eq!(trailer.get_int("Size", 0), 10);
        assert_eq!(trailer.get_int("Prev", 0), 5);
    }

    #[test]
    fn test_stream_with_length() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n<< /Length 11 >>\nstream\nhello world\nendstream\nendobj\n\
            trailer\n<< /Size 2 >>\nstartxref\n0\n%%EOF\n";
        let mut doc = parse(data).unwrap();
        let object = doc.object(ObjectKey::new(1, 0)).unwrap();
        let stream = object.as_stream().unwrap().clone();
        assert_eq!(stream.span.length, 11);
        assert_eq!(doc.raw_stream_data(stream.span).unwrap(), b"hello world");
    }

    #[test]
    fn test_stream_with_indirect_length() {
        let data = b"%PDF-1.4\n\
            2 0 obj\n5\nendobj\n\
            1 0 obj\n<< /Length 2 0 R >>\nstream\nabcde\nendstream\nendobj\n\
            trailer\n<< /Size 3 >>\nstartxref\n0\n%%EOF\n";
        let mut doc = parse(data).unwrap();
        let object = doc.object(ObjectKey::new(1, 0)).unwrap();
        let stream = object.as_stream().unwrap().clone();
        assert_eq!(doc.raw_stream_data(stream.span).unwrap(), b"abcde");
    }

    #[test]
    fn test_stream_with_forward_indirect_length_scans() {
        // The length object comes later in the file, so it is unknown at
        // stream time and the endstream scan takes over.
        let data = b"%PDF-1.4\n\
            1 0 obj\n<< /Length 2 0 R >>\nstream\nabcde\nendstream\nendobj\n\
            2 0 obj\n5\nendobj\n\
            trailer\n<< /Size 3 >>\nstartxref\n0\n%%EOF\n";
        let mut doc = parse(data).unwrap();
        let object = doc.object(ObjectKey::new(1, 0)).unwrap();
        let stream = object.as_stream().unwrap().clone();
        assert_eq!(doc.raw_stream_data(stream.span).unwrap(), b"abcde");
    }

    #[test]
    fn test_stream_with_wrong_length_scans() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n<< /Length 3 >>\nstream\nhello world\nendstream\nendobj\n\
            trailer\n<< /Size 2 >>\nstartxref\n0\n%%EOF\n";
        let mut doc = parse(data).unwrap();
        let object = doc.object(ObjectKey::new(1, 0)).unwrap();
        let stream = object.as_stream().unwrap().clone();
        assert_eq!(doc.raw_stream_data(stream.span).unwrap(), b"hello world");
    }

    #[test]
    fn test_stream_not_preceded_by_dict() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n[ 1 2 ]\nstream\nxx\nendstream\nendobj\n";
        assert!(matches!(parse(data), Err(Error::StreamNotPrecededByDict)));
    }

    #[test]
    fn test_trailer_synthesized_from_xref_stream_dict() {
        let data = b"%PDF-1.5\n\
            1 0 obj\n<< /Type /XRef /Size 4 /Root 2 0 R /Length 1 >>\nstream\nx\nendstream\nendobj\n\
            2 0 obj\n<< /Type /Catalog >>\nendobj\n\
            startxref\n9\n%%EOF\n";
        let doc = parse(data).unwrap();
        let trailer = doc.trailer().unwrap();
        assert_eq!(trailer.get_int("Size", 0), 4);
        assert_eq!(
            trailer.get("Root").unwrap().as_reference(),
            Some(ObjectKey::new(2, 0))
        );
    }

    #[test]
    fn test_forward_references_create_pool_slots() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n<< /Next 7 0 R >>\nendobj\n\
            trailer\n<< /Size 2 >>\nstartxref\n0\n%%EOF\n";
        let doc = parse(data).unwrap();
        assert!(doc.contains_key(ObjectKey::new(7, 0)));
        assert_eq!(doc.resolve(&Object::Reference(ObjectKey::new(7, 0))), Object::Null);
    }

    #[test]
    fn test_garbage_instead_of_endobj_fails() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n<< /A 1 >>\nbroken garbage\n\
            2 0 obj\n42\nendobj\n";
        assert!(matches!(
            parse(data),
            Err(Error::ExpectedKeyword { expected: "endobj", .. })
        ));
    }

    #[test]
    fn test_startxref_without_trailer() {
        let data = b"%PDF-1.4\n\
            1 0 obj\n42\nendobj\n\
            startxref\n0\n%%EOF\n";
        let doc = parse(data).unwrap();
        assert!(doc.object(ObjectKey::new(1, 0)).is_some());
    }
}
