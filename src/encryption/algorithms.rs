//! Standard security handler key-derivation and password algorithms.
//!
//! Implements the password algorithms of ISO 32000-1, 7.6.3:
//! Algorithm 2 (key derivation), Algorithms 4/5 (user password
//! authentication) and Algorithm 7 run in reverse (recovering the user
//! password from /O given the owner password).

use md5::{Digest, Md5};

/// Padding string used in password handling (32 bytes).
///
/// PDF Spec: Algorithm 2, step a
pub const PADDING: &[u8; 32] = b"\x28\xBF\x4E\x5E\x4E\x75\x8A\x41\
                                 \x64\x00\x4E\x56\xFF\xFA\x01\x08\
                                 \x2E\x2E\x00\xB6\xD0\x68\x3E\x80\
                                 \x2F\x0C\xA9\xFE\x64\x53\x69\x7A";

/// Pad or truncate a password to 32 bytes using the standard padding.
pub fn pad_password(password: &[u8]) -> Vec<u8> {
    let mut padded = Vec::with_capacity(32);
    let pass_len = password.len().min(32);
    padded.extend_from_slice(&password[..pass_len]);
    if pass_len < 32 {
        padded.extend_from_slice(&PADDING[..(32 - pass_len)]);
    }
    padded
}

/// Compute the file encryption key from a password (Algorithm 2).
///
/// # Arguments
///
/// * `password` - candidate user password
/// * `owner_key` - the 32-byte /O value
/// * `permissions` - the /P value
/// * `file_id` - first element of the trailer /ID array
/// * `revision` - the /R value (2, 3, or 4)
/// * `key_length` - key length in bytes
/// * `encrypt_metadata` - the /EncryptMetadata flag
pub fn compute_encryption_key(
    password: &[u8],
    owner_key: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: u32,
    key_length: usize,
    encrypt_metadata: bool,
) -> Vec<u8> {
    let mut hasher = Md5::new();

    // Steps a-b: padded password into MD5
    hasher.update(pad_password(password));

    // Step c: the /O value
    hasher.update(owner_key);

    // Step d: /P as 32-bit little-endian
    hasher.update(permissions.to_le_bytes());

    // Step e: file identifier
    hasher.update(file_id);

    // Step f: for R >= 4 with unencrypted metadata, 0xFFFFFFFF
    if revision >= 4 && !encrypt_metadata {
        hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
    }

    let mut hash = hasher.finalize().to_vec();

    // Step h: for R >= 3, 50 extra MD5 rounds over the first key_length bytes
    if revision >= 3 {
        for _ in 0..50 {
            let mut hasher = Md5::new();
            hasher.update(&hash[..key_length.min(16)]);
            hash = hasher.finalize().to_vec();
        }
    }

    hash[..key_length.min(16)].to_vec()
}

/// Derive the RC4 key used to protect the /O value (Algorithm 3, steps a-d).
///
/// The same derivation serves both directions: computing /O and recovering
/// the user password from it.
pub fn compute_owner_key(owner_password: &[u8], revision: u32, key_length: usize) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(pad_password(owner_password));
    let mut hash = hasher.finalize().to_vec();

    if revision >= 3 {
        for _ in 0..50 {
            let mut hasher = Md5::new();
            hasher.update(&hash[..key_length.min(16)]);
            hash = hasher.finalize().to_vec();
        }
    }

    hash[..key_length.min(16)].to_vec()
}

/// Recover the (padded) user password from /O given the owner password
/// (Algorithm 7, decryption direction).
///
/// For R=2 this is a single RC4 pass; for R >= 3 the 20 encryption rounds
/// are undone in reverse order with the key bytes XORed by the round index.
pub fn recover_user_password(
    owner_password: &[u8],
    owner_key: &[u8],
    revision: u32,
    key_length: usize,
) -> Vec<u8> {
    let rc4_key = compute_owner_key(owner_password, revision, key_length);

    if revision == 2 {
        return super::rc4::rc4_crypt(&rc4_key, owner_key);
    }

    let mut data = owner_key.to_vec();
    for i in (0..20).rev() {
        let mut modified_key = rc4_key.clone();
        for byte in &mut modified_key {
            *byte ^= i as u8;
        }
        data = super::rc4::rc4_crypt(&modified_key, &data);
    }
    data
}

/// Authenticate a user password (Algorithms 4 and 5).
///
/// Returns the file encryption key on success.
#[allow(clippy::too_many_arguments)]
pub fn authenticate_user_password(
    password: &[u8],
    user_key: &[u8],
    owner_key: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: u32,
    key_length: usize,
    encrypt_metadata: bool,
) -> Option<Vec<u8>> {
    let key = compute_encryption_key(
        password,
        owner_key,
        permissions,
        file_id,
        revision,
        key_length,
        encrypt_metadata,
    );

    let expected_user_key = if revision >= 3 {
        compute_user_key_r3(&key, file_id)
    } else {
        compute_user_key_r2(&key)
    };

    // For R >= 3 only the first 16 bytes of /U are significant; R=2
    // compares the whole 32-byte value
    let significant = if revision >= 3 { 16 } else { 32 };
    if user_key.len() < significant || expected_user_key.len() < significant {
        return None;
    }
    let matches =
        constant_time_compare(&user_key[..significant], &expected_user_key[..significant]);

    if matches { Some(key) } else { None }
}

/// Compute the /U value for R=2 (Algorithm 4): RC4 of the padding string.
pub fn compute_user_key_r2(key: &[u8]) -> Vec<u8> {
    super::rc4::rc4_crypt(key, PADDING)
}

/// Compute the /U value for R >= 3 (Algorithm 5).
///
/// MD5 of padding + file ID, then 20 RC4 passes with the key bytes XORed
/// by the round index, then 16 arbitrary bytes (zeros here).
pub fn compute_user_key_r3(key: &[u8], file_id: &[u8]) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(file_id);
    let mut hash = hasher.finalize().to_vec();

    for i in 0..20 {
        let mut modified_key = key.to_vec();
        for byte in &mut modified_key {
            *byte ^= i as u8;
        }
        hash = super::rc4::rc4_crypt(&modified_key, &hash);
    }

    hash.extend_from_slice(&[0u8; 16]);
    hash
}

/// Compute the /O value (Algorithm 3). Used by tests to build encrypted
/// fixtures.
pub fn compute_owner_password_hash(
    owner_password: &[u8],
    user_password: &[u8],
    revision: u32,
    key_length: usize,
) -> Vec<u8> {
    // An empty owner password falls back to the user password
    let password = if owner_password.is_empty() {
        user_password
    } else {
        owner_password
    };

    let rc4_key = compute_owner_key(password, revision, key_length);

    let padded_user = pad_password(user_password);
    let mut result = super::rc4::rc4_crypt(&rc4_key, &padded_user);

    if revision >= 3 {
        for i in 1..=19 {
            let mut modified_key = rc4_key.clone();
            for byte in &mut modified_key {
                *byte ^= i as u8;
            }
            result = super::rc4::rc4_crypt(&modified_key, &result);
        }
    }

    result
}

/// Constant-time slice comparison.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
