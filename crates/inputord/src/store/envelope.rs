//! Sealed on-disk encoding of the configuration map.
//!
//! Layout: `magic (4) | version (1) | nonce (24) | ciphertext + tag`. The
//! header is bound to the ciphertext as associated data, so editing any byte
//! of the file fails authentication or header parsing.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use rand::rngs::OsRng;

use super::errors::DecryptFailure;
use super::key::SecretKey;

const MAGIC: &[u8; 4] = b"INPC";
const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub(super) fn seal(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>, chacha20poly1305::Error> {
    let mut nonce = [0_u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    let header = header();
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher.encrypt(
        XNonce::from_slice(&nonce),
        Payload {
            msg: plaintext,
            aad: &header,
        },
    )?;

    let mut sealed = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&header);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypts an envelope produced by [`seal`].
pub(super) fn open(key: &SecretKey, sealed: &[u8]) -> Result<Vec<u8>, DecryptFailure> {
    if sealed.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
        return Err(DecryptFailure::Malformed {
            reason: "truncated envelope",
        });
    }
    let (header, rest) = sealed.split_at(HEADER_LEN);
    let (magic, version) = header.split_at(MAGIC.len());
    if magic != MAGIC.as_slice() {
        return Err(DecryptFailure::Malformed {
            reason: "unrecognised file signature",
        });
    }
    if version != [VERSION].as_slice() {
        return Err(DecryptFailure::Malformed {
            reason: "unsupported envelope version",
        });
    }
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| DecryptFailure::Authentication)
}

fn header() -> [u8; HEADER_LEN] {
    let mut header = [0_u8; HEADER_LEN];
    let (magic, version) = header.split_at_mut(MAGIC.len());
    magic.copy_from_slice(MAGIC);
    version.copy_from_slice(&[VERSION]);
    header
}
