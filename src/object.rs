//! The COS object model.
//!
//! COS ("Carousel Object System") is the low-level object model of PDF:
//! numbers, strings, names, arrays, dictionaries, streams, and indirect
//! references. [`Object`] is the tagged variant covering all of them.
//!
//! Dictionaries and arrays are shared handles: cloning an [`Object`] that
//! contains one clones the handle, not the contents, so typed views handed
//! out by the high-level layer write through to the same storage the
//! document pool sees. Cycles in the document graph (page to parent to
//! kids) are always expressed through [`Object::Reference`], never through
//! handles, which keeps the ownership graph acyclic.

use crate::scratch::StreamSpan;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Identity of an indirect object: object number and generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectKey {
    /// Create a new object key.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// How a string was written in the file.
///
/// PDF strings are opaque byte sequences, not text; the origin only
/// matters to a serializer choosing an output form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// Parenthesized literal string, `(...)`
    Literal,
    /// Hexadecimal string, `<...>`
    Hex,
}

/// A COS value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// Name without its leading `/`, with `#xx` escapes decoded
    Name(String),
    /// String bytes and the form they were written in
    String(Vec<u8>, StringKind),
    /// Array of objects
    Array(Array),
    /// Dictionary (name keys, object values)
    Dictionary(Dictionary),
    /// Stream: a dictionary plus a payload spilled to the scratch file
    Stream(CosStream),
    /// Indirect object reference; resolution goes through the document
    Reference(ObjectKey),
}

impl Object {
    /// Build a literal string object from bytes.
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Object::String(bytes.into(), StringKind::Literal)
    }

    /// Build a name object.
    pub fn name(name: impl Into<String>) -> Self {
        Object::Name(name.into())
    }

    /// Human-readable variant name, without the data.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Try to cast to string bytes.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(bytes, _) => Some(bytes),
            _ => None,
        }
    }

    /// Try to cast to an array handle.
    pub fn as_array(&self) -> Option<Array> {
        match self {
            Object::Array(array) => Some(array.clone()),
            _ => None,
        }
    }

    /// Try to cast to a dictionary handle. Streams expose their
    /// dictionaries here as well.
    pub fn as_dict(&self) -> Option<Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict.clone()),
            Object::Stream(stream) => Some(stream.dict.clone()),
            _ => None,
        }
    }

    /// Try to cast to a stream.
    pub fn as_stream(&self) -> Option<&CosStream> {
        match self {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Try to cast to a reference.
    pub fn as_reference(&self) -> Option<ObjectKey> {
        match self {
            Object::Reference(key) => Some(*key),
            _ => None,
        }
    }

    /// Check if the object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Recursively copy this object, giving arrays and dictionaries fresh
    /// storage. References and stream payload spans are copied verbatim;
    /// re-homing a payload into another document's scratch file is the
    /// caller's job.
    pub fn deep_copy(&self) -> Object {
        match self {
            Object::Array(array) => Object::Array(array.deep_copy()),
            Object::Dictionary(dict) => Object::Dictionary(dict.deep_copy()),
            Object::Stream(stream) => Object::Stream(CosStream {
                dict: stream.dict.deep_copy(),
                span: stream.span,
            }),
            other => other.clone(),
        }
    }
}

/// A stream object: dictionary plus the span of its payload in the
/// owning document's scratch file.
#[derive(Debug, Clone, PartialEq)]
pub struct CosStream {
    /// The stream dictionary
    pub dict: Dictionary,
    /// Where the raw (still encoded) payload lives in the scratch file
    pub span: StreamSpan,
}

/// A shared, write-through dictionary handle.
///
/// Keys are names without the leading `/`; keys are unique and insertion
/// order is not semantically significant.
#[derive(Clone, Default)]
pub struct Dictionary(Rc<RefCell<HashMap<String, Object>>>);

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry, cloning the stored object.
    pub fn get(&self, key: &str) -> Option<Object> {
        self.0.borrow().get(key).cloned()
    }

    /// Insert or replace an entry.
    pub fn set(&self, key: impl Into<String>, value: Object) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    /// Insert or replace a name-valued entry.
    pub fn set_name(&self, key: impl Into<String>, name: impl Into<String>) {
        self.set(key, Object::Name(name.into()));
    }

    /// Insert or replace an integer-valued entry.
    pub fn set_int(&self, key: impl Into<String>, value: i64) {
        self.set(key, Object::Integer(value));
    }

    /// Remove an entry, returning the removed object if present.
    pub fn remove(&self, key: &str) -> Option<Object> {
        self.0.borrow_mut().remove(key)
    }

    /// Check for a key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the keys.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries.
    pub fn entries(&self) -> Vec<(String, Object)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Copy entries from `other` for keys this dictionary does not already
    /// have. Existing entries win.
    pub fn merge_absent(&self, other: &Dictionary) {
        for (key, value) in other.entries() {
            if !self.contains_key(&key) {
                self.set(key, value);
            }
        }
    }

    /// Integer entry with a default, ignoring non-integer values.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(|o| o.as_integer()).unwrap_or(default)
    }

    /// Name entry as an owned string.
    pub fn get_name(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|o| o.as_name().map(str::to_string))
    }

    /// String entry decoded lossily as UTF-8.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(|o| o.as_string().map(|b| String::from_utf8_lossy(b).into_owned()))
    }

    /// Whether two handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Dictionary) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Recursively copy the dictionary into fresh storage.
    pub fn deep_copy(&self) -> Dictionary {
        let copy = Dictionary::new();
        for (key, value) in self.entries() {
            copy.set(key, value.deep_copy());
        }
        copy
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.borrow().iter()).finish()
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, Object)>>(iter: I) -> Self {
        let dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

/// A shared, write-through array handle.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Object>>>);

impl Array {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Element at an index, cloned.
    pub fn get(&self, index: usize) -> Option<Object> {
        self.0.borrow().get(index).cloned()
    }

    /// Replace the element at an index. Out-of-range indexes are ignored.
    pub fn set(&self, index: usize, value: Object) {
        let mut items = self.0.borrow_mut();
        if index < items.len() {
            items[index] = value;
        }
    }

    /// Append an element.
    pub fn push(&self, value: Object) {
        self.0.borrow_mut().push(value);
    }

    /// Remove and return the element at an index, if in range.
    pub fn remove(&self, index: usize) -> Option<Object> {
        let mut items = self.0.borrow_mut();
        if index < items.len() {
            Some(items.remove(index))
        } else {
            None
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of the elements.
    pub fn items(&self) -> Vec<Object> {
        self.0.borrow().clone()
    }

    /// Index of the first element equal to `value`.
    pub fn position(&self, value: &Object) -> Option<usize> {
        self.0.borrow().iter().position(|item| item == value)
    }

    /// Whether two handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Recursively copy the array into fresh storage.
    pub fn deep_copy(&self) -> Array {
        let copy = Array::new();
        for item in self.items() {
            copy.push(item.deep_copy());
        }
        copy
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

impl FromIterator<Object> for Array {
    fn from_iter<I: IntoIterator<Item = Object>>(iter: I) -> Self {
        let array = Array::new();
        for item in iter {
            array.push(item);
        }
        array
    }
}
