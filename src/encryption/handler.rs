//! Encryption handler: authentication state and object decryption.

use super::algorithms;
use super::{Algorithm, EncryptDict, EncryptionInfo, Permissions};
use crate::error::{Error, Result};
use crate::object::Object;
use md5::{Digest, Md5};

/// Authentication state. Transitions once, from unauthenticated to
/// authenticated; there is no de-authentication.
#[derive(Debug, Clone)]
enum AuthState {
    Unauthenticated,
    Authenticated {
        /// File encryption key from Algorithm 2
        key: Vec<u8>,
        /// Whether the owner password (via Algorithm 7 recovery) matched
        is_owner: bool,
    },
}

/// Security handler for an encrypted document.
///
/// Before authentication, `decrypt_string` and `decrypt_stream` return
/// their input unchanged so callers see raw ciphertext rather than errors.
#[derive(Debug, Clone)]
pub struct EncryptionHandler {
    dict: EncryptDict,
    file_id: Vec<u8>,
    algorithm: Algorithm,
    state: AuthState,
}

impl EncryptionHandler {
    /// Create a handler from the trailer's /Encrypt object and the first
    /// element of the /ID array.
    pub fn new(encrypt_obj: &Object, file_id: Vec<u8>) -> Result<Self> {
        let dict = EncryptDict::from_object(encrypt_obj)?;
        let algorithm = dict.algorithm()?;

        log::info!(
            "document is encrypted with {:?} (V={}, R={})",
            algorithm,
            dict.version,
            dict.revision
        );

        Ok(Self {
            dict,
            file_id,
            algorithm,
            state: AuthState::Unauthenticated,
        })
    }

    /// Authenticate with a password.
    ///
    /// The password is tried as the user password first (Algorithm 4/5).
    /// On failure it is treated as the owner password: Algorithm 7 recovers
    /// a candidate user password from /O and the user check runs again.
    /// Success through that path marks the session as owner-authenticated.
    /// Failure leaves the state untouched; no partial key material is ever
    /// installed.
    pub fn authenticate(&mut self, password: &[u8]) -> Result<()> {
        if let Some(key) = self.try_user_password(password) {
            log::info!("authenticated with user password");
            self.state = AuthState::Authenticated {
                key,
                is_owner: false,
            };
            return Ok(());
        }

        let candidate = algorithms::recover_user_password(
            password,
            &self.dict.owner_key,
            self.dict.revision,
            self.dict.key_length_bytes(),
        );
        if let Some(key) = self.try_user_password(&candidate) {
            log::info!("authenticated with owner password");
            self.state = AuthState::Authenticated {
                key,
                is_owner: true,
            };
            return Ok(());
        }

        log::warn!("password authentication failed");
        Err(Error::AuthenticationFailed)
    }

    fn try_user_password(&self, password: &[u8]) -> Option<Vec<u8>> {
        algorithms::authenticate_user_password(
            password,
            &self.dict.user_key,
            &self.dict.owner_key,
            self.dict.permissions,
            &self.file_id,
            self.dict.revision,
            self.dict.key_length_bytes(),
            self.dict.encrypt_metadata,
        )
    }

    /// Check if a password has authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    /// Whether the owner password authenticated this session.
    pub fn is_owner(&self) -> bool {
        matches!(
            self.state,
            AuthState::Authenticated { is_owner: true, .. }
        )
    }

    /// The document permissions.
    pub fn permissions(&self) -> Permissions {
        Permissions::from_bits(self.dict.permissions)
    }

    /// The encryption algorithm in use.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Snapshot of encryption parameters and authentication state.
    pub fn info(&self) -> EncryptionInfo {
        EncryptionInfo {
            filter: self.dict.filter.clone(),
            version: self.dict.version,
            revision: self.dict.revision,
            permissions: self.permissions(),
            key_length_bits: (self.dict.key_length_bytes() * 8) as u32,
            authenticated: self.is_authenticated(),
            is_owner: self.is_owner(),
        }
    }

    /// Decrypt stream data belonging to object `id`/`gen`.
    ///
    /// Unauthenticated handlers return the input unchanged.
    pub fn decrypt_stream(&self, data: &[u8], id: u32, gen: u16) -> Result<Vec<u8>> {
        let key = match &self.state {
            AuthState::Unauthenticated => return Ok(data.to_vec()),
            AuthState::Authenticated { key, .. } => key,
        };

        let obj_key = self.compute_object_key(key, id, gen);

        match self.algorithm {
            Algorithm::Rc4_40 | Algorithm::Rc4_128 => Ok(super::rc4::rc4_crypt(&obj_key, data)),
            Algorithm::Aes128 => {
                // First 16 bytes are the IV, the rest is ciphertext
                if data.len() < 16 {
                    return Err(Error::Decode("AES data shorter than its IV".to_string()));
                }
                let (iv, ciphertext) = data.split_at(16);
                super::aes::aes128_decrypt(&obj_key, iv, ciphertext)
                    .map_err(|e| Error::Decode(format!("AES decryption failed: {}", e)))
            },
        }
    }

    /// Decrypt a string belonging to object `id`/`gen`. Strings use the
    /// same per-object cipher as streams.
    pub fn decrypt_string(&self, data: &[u8], id: u32, gen: u16) -> Result<Vec<u8>> {
        self.decrypt_stream(data, id, gen)
    }

    /// Recursively decrypt the strings and stream payload of an object.
    ///
    /// Dictionary recursion skips `Length`, `Filter`, and `DecodeParms`
    /// (their values are structural, never encrypted); a decrypted stream's
    /// `Length` is rewritten to the decrypted byte count.
    pub fn decrypt_object(&self, obj: Object, id: u32, gen: u16) -> Result<Object> {
        if !self.is_authenticated() {
            return Ok(obj);
        }

        match obj {
            Object::String(s) => Ok(Object::String(self.decrypt_string(&s, id, gen)?)),
            Object::Array(arr) => {
                let items = arr
                    .into_iter()
                    .map(|item| self.decrypt_object(item, id, gen))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Object::Array(items))
            },
            Object::Dictionary(dict) => {
                let mut out = std::collections::HashMap::with_capacity(dict.len());
                for (key, value) in dict {
                    let value = if is_structural_key(&key) {
                        value
                    } else {
                        self.decrypt_object(value, id, gen)?
                    };
                    out.insert(key, value);
                }
                Ok(Object::Dictionary(out))
            },
            Object::Stream { dict, data } => {
                let decrypted = self.decrypt_stream(&data, id, gen)?;

                let mut out = std::collections::HashMap::with_capacity(dict.len());
                for (key, value) in dict {
                    let value = if is_structural_key(&key) {
                        value
                    } else {
                        self.decrypt_object(value, id, gen)?
                    };
                    out.insert(key, value);
                }
                out.insert("Length".to_string(), Object::Integer(decrypted.len() as i64));

                Ok(Object::Stream {
                    dict: out,
                    data: bytes::Bytes::from(decrypted),
                })
            },
            other => Ok(other),
        }
    }

    /// Compute the per-object key (Algorithm 1).
    ///
    /// MD5 of the file key, the low 3 bytes of the object number, the low
    /// 2 bytes of the generation (both little-endian) and, for AES, the
    /// bytes `sAlT`; truncated to min(n + 5, 16).
    fn compute_object_key(&self, base_key: &[u8], id: u32, gen: u16) -> Vec<u8> {
        let mut hasher = Md5::new();

        hasher.update(base_key);
        hasher.update(&id.to_le_bytes()[..3]);
        hasher.update(gen.to_le_bytes());

        if self.algorithm.is_aes() {
            hasher.update(b"sAlT");
        }

        let hash = hasher.finalize();
        let key_len = (base_key.len() + 5).min(16);
        hash[..key_len].to_vec()
    }
}

/// Keys whose values are structural and never encrypted.
fn is_structural_key(key: &str) -> bool {
    matches!(key, "Length" | "Filter" | "DecodeParms")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::algorithms::{
        compute_encryption_key, compute_owner_password_hash, compute_user_key_r2,
        compute_user_key_r3,
    };
    use std::collections::HashMap;

    const FILE_ID: &[u8] = b"fixture-file-id";
    const PERMISSIONS: i64 = -4;

    fn build_encrypt_object(
        user_pass: &[u8],
        owner_pass: &[u8],
        v: i64,
        r: i64,
        key_len_bits: i64,
    ) -> Object {
        let key_len = (key_len_bits / 8) as usize;
        let owner_hash =
            compute_owner_password_hash(owner_pass, user_pass, r as u32, key_len);
        let key = compute_encryption_key(
            user_pass,
            &owner_hash,
            PERMISSIONS as i32,
            FILE_ID,
            r as u32,
            key_len,
            true,
        );
        let user_hash = if r >= 3 {
            compute_user_key_r3(&key, FILE_ID)
        } else {
            compute_user_key_r2(&key)
        };

        let mut dict = HashMap::new();
        dict.insert("Filter".to_string(), Object::Name("Standard".to_string()));
        dict.insert("V".to_string(), Object::Integer(v));
        dict.insert("R".to_string(), Object::Integer(r));
        dict.insert("Length".to_string(), Object::Integer(key_len_bits));
        dict.insert("O".to_string(), Object::String(owner_hash));
        dict.insert("U".to_string(), Object::String(user_hash));
        dict.insert("P".to_string(), Object::Integer(PERMISSIONS));
        Object::Dictionary(dict)
    }

    fn rc4_128_handler() -> EncryptionHandler {
        let obj = build_encrypt_object(b"user-pw", b"owner-pw", 2, 3, 128);
        EncryptionHandler::new(&obj, FILE_ID.to_vec()).unwrap()
    }

    #[test]
    fn test_user_password_authenticates() {
        let mut handler = rc4_128_handler();
        handler.authenticate(b"user-pw").unwrap();
        assert!(handler.is_authenticated());
        assert!(!handler.is_owner());
    }

    #[test]
    fn test_owner_password_authenticates_as_owner() {
        let mut handler = rc4_128_handler();
        handler.authenticate(b"owner-pw").unwrap();
        assert!(handler.is_authenticated());
        assert!(handler.is_owner());
    }

    #[test]
    fn test_wrong_password_fails_and_state_unchanged() {
        let mut handler = rc4_128_handler();
        assert!(matches!(
            handler.authenticate(b"nope"),
            Err(Error::AuthenticationFailed)
        ));
        assert!(!handler.is_authenticated());
        assert!(!handler.is_owner());
    }

    #[test]
    fn test_unauthenticated_decrypt_is_identity() {
        let handler = rc4_128_handler();
        let data = b"raw ciphertext bytes";
        assert_eq!(handler.decrypt_stream(data, 4, 0).unwrap(), data);
        assert_eq!(handler.decrypt_string(data, 4, 0).unwrap(), data);
    }

    #[test]
    fn test_rc4_stream_round_trip() {
        let mut handler = rc4_128_handler();
        handler.authenticate(b"user-pw").unwrap();

        // RC4 is symmetric, so encrypting with the object key and then
        // calling decrypt_stream must restore the plaintext
        let plaintext = b"BT (hello) Tj ET";
        let ciphertext = handler.decrypt_stream(plaintext, 7, 0).unwrap();
        assert_ne!(&ciphertext[..], plaintext);
        let recovered = handler.decrypt_stream(&ciphertext, 7, 0).unwrap();
        assert_eq!(&recovered[..], plaintext);
    }

    #[test]
    fn test_object_keys_differ_per_object() {
        let mut handler = rc4_128_handler();
        handler.authenticate(b"user-pw").unwrap();

        let plaintext = b"same plaintext";
        let c1 = handler.decrypt_stream(plaintext, 1, 0).unwrap();
        let c2 = handler.decrypt_stream(plaintext, 2, 0).unwrap();
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_decrypt_object_skips_structural_keys() {
        let mut handler = rc4_128_handler();
        handler.authenticate(b"user-pw").unwrap();

        let plaintext = b"stream content".to_vec();
        let ciphertext = handler.decrypt_stream(&plaintext, 9, 0).unwrap();

        let mut dict = HashMap::new();
        dict.insert("Length".to_string(), Object::Integer(ciphertext.len() as i64));
        dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
        let obj = Object::Stream {
            dict,
            data: bytes::Bytes::from(ciphertext),
        };

        let decrypted = handler.decrypt_object(obj, 9, 0).unwrap();
        match decrypted {
            Object::Stream { dict, data } => {
                assert_eq!(&data[..], &plaintext[..]);
                // Length rewritten to the decrypted byte count
                assert_eq!(dict.get("Length").unwrap().as_integer(), Some(plaintext.len() as i64));
                // Filter untouched
                assert_eq!(dict.get("Filter").unwrap().as_name(), Some("FlateDecode"));
            },
            other => panic!("expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_decrypt_object_recurses_into_arrays() {
        let mut handler = rc4_128_handler();
        handler.authenticate(b"user-pw").unwrap();

        let plaintext = b"nested string".to_vec();
        let ciphertext = handler.decrypt_string(&plaintext, 3, 0).unwrap();

        let obj = Object::Array(vec![
            Object::Integer(1),
            Object::String(ciphertext),
            Object::Name("Unchanged".to_string()),
        ]);

        let decrypted = handler.decrypt_object(obj, 3, 0).unwrap();
        let arr = decrypted.as_array().unwrap();
        assert_eq!(arr[1].as_string(), Some(&plaintext[..]));
        assert_eq!(arr[2].as_name(), Some("Unchanged"));
    }

    #[test]
    fn test_aes_object_key_is_16_bytes() {
        let obj = build_encrypt_object(b"u", b"o", 4, 4, 128);
        let handler = EncryptionHandler::new(&obj, FILE_ID.to_vec()).unwrap();
        let key = handler.compute_object_key(&[0x01; 16], 1, 0);
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn test_rc4_40_object_key_is_10_bytes() {
        let obj = build_encrypt_object(b"u", b"o", 1, 2, 40);
        let handler = EncryptionHandler::new(&obj, FILE_ID.to_vec()).unwrap();
        let key = handler.compute_object_key(&[0x01, 0x23, 0x45, 0x67, 0x89], 1, 0);
        assert_eq!(key.len(), 10);
    }

    #[test]
    fn test_info_snapshot() {
        let mut handler = rc4_128_handler();
        let info = handler.info();
        assert_eq!(info.filter, "Standard");
        assert_eq!(info.key_length_bits, 128);
        assert!(!info.authenticated);

        handler.authenticate(b"owner-pw").unwrap();
        let info = handler.info();
        assert!(info.authenticated);
        assert!(info.is_owner);
    }
}
