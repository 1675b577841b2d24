//! Standard security handler.
//!
//! Implements password-protected documents per ISO 32000-1, 7.6: the
//! standard security handler with RC4 (40/128-bit) and AES-128 encryption.
//! The handler is a two-state machine: construction leaves it
//! unauthenticated (decryption is a pass-through), and a successful
//! [`EncryptionHandler::authenticate`] call installs the file key and
//! records whether the user or the owner password matched. R >= 5
//! (AES-256) documents are rejected as unsupported.

use crate::error::{Error, Result};
use crate::object::Object;

mod aes;
pub(crate) mod algorithms;
mod handler;
pub(crate) mod rc4;

pub use handler::EncryptionHandler;

/// Encryption algorithm selected by the (V, R) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// RC4 with 40-bit key (V=1, R=2)
    Rc4_40,
    /// RC4 with 128-bit key (V=2, R=3)
    Rc4_128,
    /// AES-128 in CBC mode (V=4, R=4)
    Aes128,
}

impl Algorithm {
    /// Default key length in bytes for this algorithm.
    pub fn key_length(&self) -> usize {
        match self {
            Algorithm::Rc4_40 => 5,
            Algorithm::Rc4_128 => 16,
            Algorithm::Aes128 => 16,
        }
    }

    /// Check if this is the AES algorithm.
    pub fn is_aes(&self) -> bool {
        matches!(self, Algorithm::Aes128)
    }
}

/// Parsed /Encrypt dictionary.
///
/// PDF Spec: ISO 32000-1, Table 20/21 - encryption dictionary entries
#[derive(Debug, Clone)]
pub struct EncryptDict {
    /// Security handler name; only "Standard" is supported
    pub filter: String,
    /// Algorithm version (V)
    pub version: u32,
    /// Revision number (R)
    pub revision: u32,
    /// Key length in bits (Length), default 40
    pub length: Option<u32>,
    /// Owner password hash (O), 32 bytes
    pub owner_key: Vec<u8>,
    /// User password hash (U), 32 bytes
    pub user_key: Vec<u8>,
    /// User access permissions (P)
    pub permissions: i32,
    /// EncryptMetadata flag, true by default
    pub encrypt_metadata: bool,
}

impl EncryptDict {
    /// Parse the /Encrypt dictionary.
    pub fn from_object(obj: &Object) -> Result<Self> {
        let dict = obj
            .as_dict()
            .ok_or_else(|| Error::InvalidPdf("/Encrypt is not a dictionary".to_string()))?;

        let filter = dict
            .get("Filter")
            .and_then(|o| o.as_name())
            .ok_or(Error::MissingEncryptField("Filter"))?
            .to_string();

        if filter != "Standard" {
            return Err(Error::UnsupportedEncryption(format!(
                "security handler /{} (only /Standard is supported)",
                filter
            )));
        }

        let version = dict
            .get("V")
            .and_then(|o| o.as_integer())
            .ok_or(Error::MissingEncryptField("V"))? as u32;

        let revision = dict
            .get("R")
            .and_then(|o| o.as_integer())
            .ok_or(Error::MissingEncryptField("R"))? as u32;

        let owner_key = dict
            .get("O")
            .and_then(|o| o.as_string())
            .ok_or(Error::MissingEncryptField("O"))?
            .to_vec();

        let user_key = dict
            .get("U")
            .and_then(|o| o.as_string())
            .ok_or(Error::MissingEncryptField("U"))?
            .to_vec();

        let permissions = dict
            .get("P")
            .and_then(|o| o.as_integer())
            .ok_or(Error::MissingEncryptField("P"))? as i32;

        let length = dict
            .get("Length")
            .and_then(|o| o.as_integer())
            .map(|n| n as u32);

        let encrypt_metadata = dict
            .get("EncryptMetadata")
            .and_then(|o| o.as_bool())
            .unwrap_or(true);

        Ok(EncryptDict {
            filter,
            version,
            revision,
            length,
            owner_key,
            user_key,
            permissions,
            encrypt_metadata,
        })
    }

    /// Determine the algorithm from the (V, R) pair.
    pub fn algorithm(&self) -> Result<Algorithm> {
        match (self.version, self.revision) {
            (1, 2) => Ok(Algorithm::Rc4_40),
            (2, 3) => Ok(Algorithm::Rc4_128),
            (4, 4) => Ok(Algorithm::Aes128),
            (v, r) => Err(Error::UnsupportedEncryption(format!("V={}, R={}", v, r))),
        }
    }

    /// Effective key length in bytes (/Length is in bits, default 40).
    pub fn key_length_bytes(&self) -> usize {
        match self.length {
            Some(bits) => (bits / 8) as usize,
            None => 5,
        }
    }
}

/// User access permissions decoded from the P bitmask.
///
/// PDF Spec: ISO 32000-1, Table 22
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    bits: i32,
}

impl Permissions {
    /// Wrap the raw P value.
    pub fn from_bits(bits: i32) -> Self {
        Self { bits }
    }

    /// The raw P value.
    pub fn bits(&self) -> i32 {
        self.bits
    }

    /// Printing allowed.
    pub fn can_print(&self) -> bool {
        (self.bits & (1 << 2)) != 0
    }

    /// Document modification allowed.
    pub fn can_modify(&self) -> bool {
        (self.bits & (1 << 3)) != 0
    }

    /// Text/graphics copying allowed.
    pub fn can_copy(&self) -> bool {
        (self.bits & (1 << 4)) != 0
    }

    /// Annotation editing allowed.
    pub fn can_annotate(&self) -> bool {
        (self.bits & (1 << 5)) != 0
    }
}

/// Snapshot of the document's encryption parameters and the handler's
/// authentication state.
#[derive(Debug, Clone)]
pub struct EncryptionInfo {
    /// Security handler name
    pub filter: String,
    /// Algorithm version (V)
    pub version: u32,
    /// Revision number (R)
    pub revision: u32,
    /// User access permissions
    pub permissions: Permissions,
    /// Key length in bits
    pub key_length_bits: u32,
    /// Whether a password has authenticated
    pub authenticated: bool,
    /// Whether authentication went through the owner password
    pub is_owner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn encrypt_dict(v: i64, r: i64) -> Object {
        let mut dict = HashMap::new();
        dict.insert("Filter".to_string(), Object::Name("Standard".to_string()));
        dict.insert("V".to_string(), Object::Integer(v));
        dict.insert("R".to_string(), Object::Integer(r));
        dict.insert("O".to_string(), Object::String(vec![0u8; 32]));
        dict.insert("U".to_string(), Object::String(vec![0u8; 32]));
        dict.insert("P".to_string(), Object::Integer(-4));
        Object::Dictionary(dict)
    }

    #[test]
    fn test_algorithm_from_version_revision() {
        assert_eq!(
            EncryptDict::from_object(&encrypt_dict(1, 2)).unwrap().algorithm().unwrap(),
            Algorithm::Rc4_40
        );
        assert_eq!(
            EncryptDict::from_object(&encrypt_dict(2, 3)).unwrap().algorithm().unwrap(),
            Algorithm::Rc4_128
        );
        assert_eq!(
            EncryptDict::from_object(&encrypt_dict(4, 4)).unwrap().algorithm().unwrap(),
            Algorithm::Aes128
        );
    }

    #[test]
    fn test_aes256_rejected() {
        let dict = EncryptDict::from_object(&encrypt_dict(5, 6)).unwrap();
        assert!(matches!(dict.algorithm(), Err(Error::UnsupportedEncryption(_))));
    }

    #[test]
    fn test_missing_field() {
        let mut dict = HashMap::new();
        dict.insert("Filter".to_string(), Object::Name("Standard".to_string()));
        let obj = Object::Dictionary(dict);
        assert!(matches!(
            EncryptDict::from_object(&obj),
            Err(Error::MissingEncryptField("V"))
        ));
    }

    #[test]
    fn test_non_standard_filter_rejected() {
        let mut dict = HashMap::new();
        dict.insert("Filter".to_string(), Object::Name("Custom".to_string()));
        let obj = Object::Dictionary(dict);
        assert!(matches!(
            EncryptDict::from_object(&obj),
            Err(Error::UnsupportedEncryption(_))
        ));
    }

    #[test]
    fn test_key_length_default() {
        let dict = EncryptDict::from_object(&encrypt_dict(1, 2)).unwrap();
        assert_eq!(dict.key_length_bytes(), 5);
    }

    #[test]
    fn test_permissions_bits() {
        let perms = Permissions::from_bits(-4);
        assert!(perms.can_print());
        assert!(perms.can_copy());

        // Only bit 3 (modify) cleared
        let perms = Permissions::from_bits(!(1 << 3));
        assert!(!perms.can_modify());
        assert!(perms.can_print());
    }
}
