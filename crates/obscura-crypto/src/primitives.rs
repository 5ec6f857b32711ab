//! Stateless cryptographic façade over the vetted primitive suite:
//! X25519 for key exchange, Ed25519 for signing, XChaCha20-Poly1305 for
//! the duplex AEAD record layer, HKDF-SHA256 for session-key derivation.

use std::sync::Once;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

use crate::error::CryptoError;
use crate::kdf::derive_session_keys;
use crate::keys::{KeyPair, PrivateKey, PublicKey, Signature, SessionKeys};

static INIT: Once = Once::new();

/// Idempotent global initialization of the underlying primitive library.
///
/// The Rust crates this module is built on (`x25519-dalek`, `ed25519-dalek`,
/// `chacha20poly1305`) need no process-wide setup, but the contract mirrors
/// libsodium's `sodium_init()`: safe to call repeatedly, safe to race.
pub fn init() {
    INIT.call_once(|| {
        tracing::trace!("obscura-crypto primitive library initialized");
    });
}

/// Generate a fresh X25519-class ephemeral keypair.
pub fn generate_kx_keypair() -> KeyPair {
    let secret = StaticSecret::random_from_rng(rand::rngs::OsRng);
    let public = X25519Public::from(&secret);
    KeyPair {
        public: PublicKey(*public.as_bytes()),
        private: PrivateKey::Kx(secret.to_bytes()),
    }
}

/// Generate a fresh Ed25519-class long-term signing keypair.
pub fn generate_sign_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
    let public = PublicKey(signing_key.verifying_key().to_bytes());
    KeyPair {
        public,
        private: PrivateKey::Sign(signing_key.to_keypair_bytes()),
    }
}

/// Sign `message` with a signing-flavored private key.
pub fn sign(message: &[u8], sk: &PrivateKey) -> Result<Signature, CryptoError> {
    let bytes = sk
        .sign_bytes()
        .ok_or_else(|| CryptoError::InvalidKey("expected signing private key".into()))?;
    let signing_key = SigningKey::from_keypair_bytes(bytes)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let sig = signing_key.sign(message);
    Ok(Signature(sig.to_bytes()))
}

/// Verify a signature over `message` made by `pk`. Constant-time (delegates
/// to `ed25519-dalek`'s constant-time scalar comparison).
pub fn verify(signature: &Signature, message: &[u8], pk: &PublicKey) -> bool {
    let verifying_key = match VerifyingKey::from_bytes(&pk.0) {
        Ok(vk) => vk,
        Err(_) => return false,
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &sig).is_ok()
}

/// Derive the client's directional session keys from its ephemeral KX pair
/// and the server's ephemeral public key.
///
/// `client.tx == server.rx` and `client.rx == server.tx` on matching inputs.
pub fn client_compute_session_keys(
    client_kx: &KeyPair,
    server_ephemeral_pk: &PublicKey,
) -> Result<SessionKeys, CryptoError> {
    let shared = diffie_hellman(client_kx, server_ephemeral_pk)?;
    derive_session_keys(&shared, false)
}

/// Derive the server's directional session keys from its ephemeral KX pair
/// and the client's ephemeral public key.
pub fn server_compute_session_keys(
    server_kx: &KeyPair,
    client_ephemeral_pk: &PublicKey,
) -> Result<SessionKeys, CryptoError> {
    let shared = diffie_hellman(server_kx, client_ephemeral_pk)?;
    derive_session_keys(&shared, true)
}

fn diffie_hellman(my_kx: &KeyPair, peer_pk: &PublicKey) -> Result<[u8; 32], CryptoError> {
    let secret_bytes = my_kx
        .private
        .kx_bytes()
        .ok_or_else(|| CryptoError::InvalidKey("expected KX private key".into()))?;
    let secret = StaticSecret::from(*secret_bytes);
    let peer = X25519Public::from(peer_pk.0);
    Ok(*secret.diffie_hellman(&peer).as_bytes())
}

/// Encrypt `plaintext` with `key`, deriving the 24-byte XChaCha20 nonce
/// deterministically from `counter` (little-endian in the low 8 bytes, the
/// remaining 16 bytes zero). Returns `ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], counter: u64, key: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    let cipher =
        XChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::AeadEncrypt)?;
    let nonce = counter_nonce(counter);
    cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::AeadEncrypt)
}

/// Decrypt `ciphertext` (`ciphertext || tag`) with `key`, reconstructing the
/// nonce from `counter` the same way `encrypt` derived it.
pub fn decrypt(ciphertext: &[u8], counter: u64, key: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    let cipher =
        XChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::AeadDecrypt)?;
    let nonce = counter_nonce(counter);
    cipher
        .decrypt(&nonce, ciphertext)
        .map_err(|_| CryptoError::AeadDecrypt)
}

fn counter_nonce(counter: u64) -> XNonce {
    let mut bytes = [0u8; 24];
    bytes[..8].copy_from_slice(&counter.to_le_bytes());
    XNonce::from(bytes)
}
