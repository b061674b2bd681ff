//! Encryption managers for prefstore.
//!
//! An [`EncryptionManager`] turns clear text into a persistable cipher-text
//! string and back, binding each payload to an associated tag (the entry key).
//! Stores never see key material; they only ask whether encryption is
//! supported and call `encrypt`/`decrypt`.
//!
//! - [`SealedEncryptionManager`] -- ChaCha20-Poly1305 with a random nonce per
//!   payload; the tag is authenticated as associated data.
//! - [`UnavailableEncryptionManager`] -- reports no support and refuses every
//!   call, for platforms where key material could not be obtained.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod error;
pub mod key;
pub mod manager;
pub mod sealed;

pub use error::{CryptoError, CryptoResult};
pub use key::EncryptionKey;
pub use manager::{EncryptionManager, UnavailableEncryptionManager};
pub use sealed::SealedEncryptionManager;
