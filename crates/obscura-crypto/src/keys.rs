//! Fixed-width byte containers for key and signature material.
//!
//! Widths are chosen to match the KX/signing/AEAD primitive suite in
//! [`crate::primitives`]: a public key is always 32 bytes (KX and signing
//! share the width), a signature is 64 bytes, and a private key is 32 bytes
//! for KX or 64 bytes for signing (the signing secret carries its public
//! half, matching `ed25519-dalek`'s `SigningKey` encoding).

use zeroize::ZeroizeOnDrop;

/// A 32-byte public key; shared width for KX and signing keys.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKey").field(&hex_str(&self.0)).finish()
    }
}

/// A private key, in one of two disjoint flavors depending on its role.
///
/// Never implements `Debug`/`Display` in a way that prints secret bytes.
#[derive(ZeroizeOnDrop)]
pub enum PrivateKey {
    /// X25519-class KX secret.
    Kx([u8; 32]),
    /// Ed25519-class signing secret (32-byte seed + 32-byte public tail,
    /// matching `ed25519_dalek::SigningKey::to_keypair_bytes`).
    Sign([u8; 64]),
}

impl PrivateKey {
    pub fn kx_bytes(&self) -> Option<&[u8; 32]> {
        match self {
            PrivateKey::Kx(b) => Some(b),
            PrivateKey::Sign(_) => None,
        }
    }

    pub fn sign_bytes(&self) -> Option<&[u8; 64]> {
        match self {
            PrivateKey::Sign(b) => Some(b),
            PrivateKey::Kx(_) => None,
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrivateKey::Kx(_) => f.write_str("PrivateKey::Kx(<redacted>)"),
            PrivateKey::Sign(_) => f.write_str("PrivateKey::Sign(<redacted>)"),
        }
    }
}

/// A paired public/private key. The role determines whether this is a KX
/// or a signing pair, see [`PrivateKey`].
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &self.private)
            .finish()
    }
}

/// A 64-byte Ed25519-class signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signature").field(&hex_str(&self.0)).finish()
    }
}

/// A single directional 32-byte session key.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SessionKey(pub [u8; 32]);

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// A direction-split pair of session keys, derived once per handshake.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SessionKeys {
    pub rx: SessionKey,
    pub tx: SessionKey,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKeys(<redacted>)")
    }
}

/// Hex-encode for `Debug` impls without pulling in a hex crate dependency.
fn hex_str(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
