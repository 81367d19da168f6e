//! GoChat private-message obfuscation.
//!
//! A columnar transposition keyed by the two participants' identifiers.
//! Both sides derive the same key from public information, so this hides
//! text from a casual glance at the wire and nothing more. It is not
//! encryption in any cryptographic sense.

pub mod columnar;
pub mod keys;

pub use columnar::{ColumnarCipher, PADDING, decode, encode};
pub use keys::shared_key;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Cipher key is empty")]
    DegenerateKey,

    #[error("Ciphertext length {len} is not a multiple of the key length {columns}")]
    LengthMismatch { len: usize, columns: usize },
}
