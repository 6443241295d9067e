#![allow(clippy::should_implement_trait)]
#![allow(clippy::match_like_matches_macro)]

//! # pdf_carousel
//!
//! A tolerant PDF document parser and object model.
//!
//! The crate reconstructs the object graph of a PDF file (the COS layer:
//! numbers, strings, names, arrays, dictionaries, streams, indirect
//! references) with a single forward scan that accepts the malformations
//! real-world files actually have, then exposes typed views over the
//! graph (document, catalog, page tree, annotations).
//!
//! ## Layers
//!
//! - [`source`]: a seekable byte source with pushback.
//! - [`lexer`] and [`parser`]: tokenizer and direct-object parser for the
//!   COS syntax.
//! - [`document`]: the [`CosDocument`] store holding the indirect-object
//!   pool, the trailer, and the scratch file that stream payloads are
//!   spilled into.
//! - [`file_parser`]: the linear driver that turns bytes into a
//!   [`CosDocument`], including object-stream expansion for PDF 1.5
//!   files.
//! - [`pd`]: high-level views ([`PdDocument`], pages, annotations).
//!
//! ## Quick start
//!
//! ```no_run
//! use pdf_carousel::pd::PdDocument;
//!
//! let data = std::fs::read("sample.pdf")?;
//! let mut doc = PdDocument::load(data)?;
//! println!("version {}", doc.version());
//! println!("{} pages", doc.number_of_pages()?);
//! doc.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Tolerance
//!
//! Parsing is deliberately permissive: garbage before the header, junk
//! after `%%EOF`, missing and doubled `endobj` keywords, wrong stream
//! `/Length` entries, and multiple trailer sections are all accepted.
//! Unresolvable references read as null rather than failing. Strictness
//! that would reject documents viewers open happily is a bug here, not a
//! feature.

#![warn(missing_docs)]

pub mod error;

// Byte-level input and storage
pub mod scratch;
pub mod source;

// COS syntax
pub mod lexer;
pub mod parser;

// Object model and document store
pub mod document;
pub mod object;

// File structure
pub mod file_parser;
pub mod filters;
pub mod objstm;

// Collaborator contract for text extraction ordering
pub mod text_order;

// High-level typed views
pub mod pd;

pub use document::{CosDocument, XrefSection};
pub use error::{Error, Result};
pub use file_parser::FileParser;
pub use object::{Array, CosStream, Dictionary, Object, ObjectKey, StringKind};
pub use pd::PdDocument;
pub use scratch::{ScratchFile, ScratchReader, StreamSpan};
pub use source::ByteSource;
pub use text_order::{TextPosition, compare_positions};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
