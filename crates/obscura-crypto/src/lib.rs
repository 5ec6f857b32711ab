//! obscura-crypto: ObscuraProto cryptographic primitives
//!
//! # Design principles
//! - No custom crypto; every primitive comes from an audited Rust crate.
//! - Secret material (`PrivateKey`, `SessionKey`, `SessionKeys`) is zeroized
//!   on drop and never printed via `Debug`.
//! - Public APIs return opaque newtypes to prevent accidental misuse.
//!
//! # Module layout
//! - `keys`       fixed-width key/signature newtypes
//! - `primitives` KX/signing/AEAD operations and `init()`
//! - `kdf`        HKDF-based session-key derivation
//! - `error`      unified error type

pub mod error;
pub mod kdf;
pub mod keys;
pub mod primitives;

pub use error::CryptoError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature, SessionKey, SessionKeys};
