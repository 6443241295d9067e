//! Encryption dictionary view.
//!
//! The core does not implement any decryption algorithms; it exposes the
//! `/Encrypt` dictionary so a security handler can read the parameters,
//! derive its keys, and call
//! [`CosDocument::dereference_object_streams`](crate::document::CosDocument::dereference_object_streams)
//! once payloads are readable.

use crate::object::Dictionary;

/// Read view over the trailer's `/Encrypt` dictionary.
///
/// The standard security handler (`/Filter /Standard`) is the common
/// case; the accessors mirror its entries. Defaults follow PDF Ref 1.7,
/// Table 3.18/3.19.
#[derive(Debug, Clone)]
pub struct PdEncryptionDictionary {
    dict: Dictionary,
}

impl PdEncryptionDictionary {
    /// Wrap the `/Encrypt` dictionary.
    pub fn from_dictionary(dict: Dictionary) -> Self {
        Self { dict }
    }

    /// The backing dictionary.
    pub fn dictionary(&self) -> Dictionary {
        self.dict.clone()
    }

    /// `/Filter`, the security handler's name.
    pub fn filter(&self) -> Option<String> {
        self.dict.get_name("Filter")
    }

    /// `/V`, the encryption algorithm code (default 0).
    pub fn version(&self) -> i64 {
        self.dict.get_int("V", 0)
    }

    /// `/R`, the standard handler's revision (default 2).
    pub fn revision(&self) -> i64 {
        self.dict.get_int("R", 2)
    }

    /// `/Length`, the key length in bits (default 40).
    pub fn key_length(&self) -> i64 {
        self.dict.get_int("Length", 40)
    }

    /// `/O`, the owner password bytes.
    pub fn owner_key(&self) -> Option<Vec<u8>> {
        self.dict.get("O").and_then(|o| o.as_string().map(<[u8]>::to_vec))
    }

    /// `/U`, the user password bytes.
    pub fn user_key(&self) -> Option<Vec<u8>> {
        self.dict.get("U").and_then(|o| o.as_string().map(<[u8]>::to_vec))
    }

    /// `/P`, the permission bits (default all allowed).
    pub fn permissions(&self) -> i64 {
        self.dict.get_int("P", -1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn test_standard_handler_entries() {
        let dict = Dictionary::new();
        dict.set_name("Filter", "Standard");
        dict.set_int("V", 1);
        dict.set_int("R", 2);
        dict.set_int("P", -44);
        dict.set("O", Object::string(vec![1u8; 32]));
        dict.set("U", Object::string(vec![2u8; 32]));

        let enc = PdEncryptionDictionary::from_dictionary(dict);
        assert_eq!(enc.filter().as_deref(), Some("Standard"));
        assert_eq!(enc.version(), 1);
        assert_eq!(enc.revision(), 2);
        assert_eq!(enc.key_length(), 40);
        assert_eq!(enc.permissions(), -44);
        assert_eq!(enc.owner_key().unwrap().len(), 32);
        assert_eq!(enc.user_key().unwrap().len(), 32);
    }

    #[test]
    fn test_defaults() {
        let enc = PdEncryptionDictionary::from_dictionary(Dictionary::new());
        assert_eq!(enc.version(), 0);
        assert_eq!(enc.revision(), 2);
        assert_eq!(enc.key_length(), 40);
        assert!(enc.owner_key().is_none());
    }
}
