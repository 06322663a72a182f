//! Cryptographic primitives for byte-store
//!
//! - **Identity**: Ed25519 signing keys (`SecretKey`/`PublicKey`). The public key
//!   namespaces an owner's records; the private keypair bytes are the entropy
//!   the encryption keypair is derived from.
//! - **Key derivation**: a deterministic RSA-2048 keypair per identity
//!   (`DerivedKeyPair`), recomputed on demand and never stored.
//! - **Content encryption**: AES-256-GCM under a per-write `SessionKey`.
//! - **Envelopes**: the session key is wrapped with RSA-OAEP for the owner and
//!   stored next to the ciphertext, nonce and tag (`Envelope`).
//!
//! # Security Model
//!
//! Only the holder of the signing key can re-derive the RSA private key and
//! therefore unwrap any session key. Binding encryption to the signing key
//! means there is no second secret to manage, and also that losing the signing
//! key exposes every encrypted record.

mod derive;
mod envelope;
mod keys;
mod secret;

pub use derive::{derive_keypair, DerivedKeyPair, KeyDerivationError, RSA_KEY_BITS, WRAPPED_KEY_SIZE};
pub use envelope::{Envelope, EnvelopeError};
pub use keys::{KeyError, PublicKey, SecretKey, KEYPAIR_SIZE, PUBLIC_KEY_SIZE};
pub use secret::{Sealed, SecretError, SessionKey, NONCE_SIZE, SESSION_KEY_SIZE, TAG_SIZE};
