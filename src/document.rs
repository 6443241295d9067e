//! The COS document store.
//!
//! [`CosDocument`] owns everything the file parser reconstructs: the
//! indirect-object pool, the trailer, the recorded cross-reference section
//! headers, and the scratch file holding stream payloads. Reference
//! resolution is explicit and always goes through the document; an
//! unresolved reference resolves to null, never an error, which preserves
//! referential integrity for documents assembled out of order.
//!
//! A document is either open or closed. Closing releases the scratch file
//! (and with it every stream payload); any payload access after that
//! fails with [`Error::DocumentClosed`]. Close is idempotent.

use crate::error::{Error, Result};
use crate::filters;
use crate::object::{Array, CosStream, Dictionary, Object, ObjectKey};
use crate::objstm;
use crate::scratch::{ScratchFile, ScratchReader, StreamSpan};
use std::collections::HashMap;
use std::path::Path;

/// Upper bound on reference chains before resolution gives up.
const MAX_REFERENCE_HOPS: u32 = 32;

/// A cross-reference section header: starting object number and entry
/// count. The entries themselves are discarded; the pool is populated by
/// parsing every object in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefSection {
    /// First object number covered by the section
    pub start: u32,
    /// Number of entries in the section
    pub count: u32,
}

/// The low-level PDF document: object pool, trailer, and stream storage.
pub struct CosDocument {
    trailer: Option<Dictionary>,
    pool: HashMap<ObjectKey, Option<Object>>,
    xrefs: Vec<XrefSection>,
    scratch: Option<ScratchFile>,
    version: f32,
    header_string: String,
}

impl std::fmt::Debug for CosDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosDocument")
            .field("version", &self.version)
            .field("pool_size", &self.pool.len())
            .field("has_trailer", &self.trailer.is_some())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl CosDocument {
    /// Create an empty document with a scratch file in the system temp
    /// directory.
    pub fn new() -> Result<Self> {
        Ok(Self::with_scratch(ScratchFile::new()?))
    }

    /// Create an empty document with its scratch file in a specific
    /// directory.
    pub fn with_scratch_directory(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_scratch(ScratchFile::in_directory(dir)?))
    }

    fn with_scratch(scratch: ScratchFile) -> Self {
        Self {
            trailer: None,
            pool: HashMap::new(),
            xrefs: Vec::new(),
            scratch: Some(scratch),
            version: 0.0,
            header_string: String::new(),
        }
    }

    /// File format version from the header, e.g. `1.4`.
    pub fn version(&self) -> f32 {
        self.version
    }

    /// Set the file format version.
    pub fn set_version(&mut self, version: f32) {
        self.version = version;
    }

    /// The header line exactly as it appeared in the file.
    pub fn header_string(&self) -> &str {
        &self.header_string
    }

    /// Record the header line.
    pub fn set_header_string(&mut self, header: impl Into<String>) {
        self.header_string = header.into();
    }

    /// The trailer dictionary, if one has been assembled.
    pub fn trailer(&self) -> Option<Dictionary> {
        self.trailer.clone()
    }

    /// Install the trailer dictionary.
    pub fn set_trailer(&mut self, trailer: Dictionary) {
        self.trailer = Some(trailer);
    }

    /// True when the trailer carries an `/Encrypt` entry.
    pub fn is_encrypted(&self) -> bool {
        self.trailer
            .as_ref()
            .is_some_and(|t| t.contains_key("Encrypt"))
    }

    /// The `/Encrypt` dictionary from the trailer, resolved.
    pub fn encryption_dictionary(&self) -> Option<Dictionary> {
        let encrypt = self.trailer.as_ref()?.get("Encrypt")?;
        self.resolve(&encrypt).as_dict()
    }

    /// The `/ID` array from the trailer (two byte strings), resolved.
    pub fn document_id(&self) -> Option<Array> {
        let id = self.trailer.as_ref()?.get("ID")?;
        self.resolve(&id).as_array()
    }

    /// Lookup-or-insert a pool slot.
    ///
    /// Parsing `7 0 R` before object `7 0` exists creates an empty slot
    /// here; the later parse of the object fills it in place.
    pub fn object_from_pool(&mut self, key: ObjectKey) -> &mut Option<Object> {
        self.pool.entry(key).or_insert(None)
    }

    /// Install an object at a key, creating the slot if needed.
    pub fn set_object(&mut self, key: ObjectKey, object: Object) {
        *self.object_from_pool(key) = Some(object);
    }

    /// The object stored at a key, if the slot exists and is filled.
    pub fn object(&self, key: ObjectKey) -> Option<Object> {
        self.pool.get(&key).and_then(|slot| slot.clone())
    }

    /// Whether a slot (filled or not) exists for a key.
    pub fn contains_key(&self, key: ObjectKey) -> bool {
        self.pool.contains_key(&key)
    }

    /// Pool keys in ascending order.
    pub fn keys(&self) -> Vec<ObjectKey> {
        let mut keys: Vec<ObjectKey> = self.pool.keys().copied().collect();
        keys.sort();
        keys
    }

    /// The lowest key not yet present in the pool, for appending new
    /// indirect objects.
    pub fn next_object_key(&self) -> ObjectKey {
        let next = self
            .pool
            .keys()
            .map(|key| key.number)
            .max()
            .map_or(1, |n| n + 1);
        ObjectKey::new(next, 0)
    }

    /// Append an object to the pool under a fresh key.
    pub fn add_object(&mut self, object: Object) -> ObjectKey {
        let key = self.next_object_key();
        self.set_object(key, object);
        key
    }

    /// Resolve an object: follow reference chains through the pool until
    /// a direct object is reached.
    ///
    /// An unresolved reference yields [`Object::Null`]. Chains longer
    /// than a fixed bound (a cycle, in practice) also yield null.
    pub fn resolve(&self, object: &Object) -> Object {
        let mut current = object.clone();
        let mut hops = 0;
        while let Object::Reference(key) = current {
            if hops >= MAX_REFERENCE_HOPS {
                log::warn!("reference chain through {} did not terminate", key);
                return Object::Null;
            }
            hops += 1;
            current = match self.pool.get(&key) {
                Some(Some(object)) => object.clone(),
                _ => Object::Null,
            };
        }
        current
    }

    /// Resolve a dictionary entry in one step.
    pub fn resolved_entry(&self, dict: &Dictionary, key: &str) -> Option<Object> {
        let value = dict.get(key)?;
        match self.resolve(&value) {
            Object::Null => None,
            object => Some(object),
        }
    }

    /// All filled pool objects whose dictionary `/Type` matches, in
    /// ascending key order. Stream dictionaries participate.
    pub fn objects_by_type(&self, type_name: &str) -> Vec<(ObjectKey, Object)> {
        let mut found: Vec<(ObjectKey, Object)> = self
            .pool
            .iter()
            .filter_map(|(key, slot)| {
                let object = slot.as_ref()?;
                let dict = object.as_dict()?;
                if dict.get_name("Type").as_deref() == Some(type_name) {
                    Some((*key, object.clone()))
                } else {
                    None
                }
            })
            .collect();
        found.sort_by_key(|(key, _)| *key);
        found
    }

    /// Find the pool key whose stored object is backed by exactly this
    /// dictionary storage.
    pub fn key_of_dictionary(&self, dict: &Dictionary) -> Option<ObjectKey> {
        self.pool.iter().find_map(|(key, slot)| {
            let stored = match slot.as_ref()? {
                Object::Dictionary(d) => d,
                Object::Stream(stream) => &stream.dict,
                _ => return None,
            };
            if stored.ptr_eq(dict) { Some(*key) } else { None }
        })
    }

    /// Ensure a pool slot exists for every reference reachable from an
    /// object.
    ///
    /// Run over each installed object, this keeps the pool closed under
    /// references: anything the graph points at has a slot, filled or
    /// not, and resolution of the unfilled ones yields null.
    pub fn register_references(&mut self, object: &Object) {
        match object {
            Object::Reference(key) => {
                self.object_from_pool(*key);
            }
            Object::Array(array) => {
                for item in array.items() {
                    self.register_references(&item);
                }
            }
            Object::Dictionary(dict) => {
                for (_, value) in dict.entries() {
                    self.register_references(&value);
                }
            }
            Object::Stream(stream) => {
                for (_, value) in stream.dict.entries() {
                    self.register_references(&value);
                }
            }
            _ => {}
        }
    }

    /// Record a cross-reference section header.
    pub fn add_xref_section(&mut self, section: XrefSection) {
        self.xrefs.push(section);
    }

    /// The cross-reference section headers seen during parsing.
    pub fn xref_sections(&self) -> &[XrefSection] {
        &self.xrefs
    }

    fn scratch_mut(&mut self) -> Result<&mut ScratchFile> {
        self.scratch.as_mut().ok_or(Error::DocumentClosed)
    }

    /// Spill a stream payload into the scratch file.
    pub fn write_stream_payload(&mut self, data: &[u8]) -> Result<StreamSpan> {
        self.scratch_mut()?.write(data)
    }

    /// Spill a stream payload read from an arbitrary source, copied
    /// through a 10 KiB buffer.
    pub fn write_stream_payload_from(&mut self, reader: &mut impl std::io::Read) -> Result<StreamSpan> {
        self.scratch_mut()?.write_from(reader)
    }

    /// Raw (still encoded) payload bytes of a span.
    pub fn raw_stream_data(&mut self, span: StreamSpan) -> Result<Vec<u8>> {
        self.scratch_mut()?.read(span)
    }

    /// A bounded reader over a span's raw payload. The reader borrows the
    /// document for the duration of the read.
    pub fn stream_reader(&mut self, span: StreamSpan) -> Result<ScratchReader<'_>> {
        self.scratch_mut()?.reader(span)
    }

    /// Payload of a stream with its `/Filter` pipeline applied.
    ///
    /// The `/Filter` entry is resolved through the pool before the raw
    /// bytes are read back from the scratch file.
    pub fn decoded_stream_data(&mut self, stream: &CosStream) -> Result<Vec<u8>> {
        let names = match stream.dict.get("Filter") {
            Some(filter) => filters::filter_names(&self.resolve(&filter)),
            None => Vec::new(),
        };
        let raw = self.raw_stream_data(stream.span)?;
        filters::decode_stream(&raw, &names)
    }

    /// Expand every object stream in the pool, installing the contained
    /// objects at `(number, 0)`.
    ///
    /// Runs automatically at parse time for unencrypted documents. For
    /// encrypted documents a security handler calls this after decrypting
    /// the payloads.
    pub fn dereference_object_streams(&mut self) -> Result<()> {
        objstm::expand_object_streams(self)
    }

    /// Release the scratch file and mark the document closed. Idempotent.
    pub fn close(&mut self) {
        self.scratch = None;
    }

    /// True once `close` has run.
    pub fn is_closed(&self) -> bool {
        self.scratch.is_none()
    }
}
