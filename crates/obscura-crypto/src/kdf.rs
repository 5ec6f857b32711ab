//! Session-key derivation: HKDF-SHA256 over an X25519 shared secret.
//!
//! Both sides derive the same two labeled outputs from the same DH shared
//! secret; which one becomes `rx` and which becomes `tx` depends only on
//! which side is deriving (see [`derive_session_keys`]'s `is_server` flag).

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CryptoError;
use crate::keys::{SessionKey, SessionKeys};

const CLIENT_TO_SERVER: &[u8] = b"obscura-kx-c2s";
const SERVER_TO_CLIENT: &[u8] = b"obscura-kx-s2c";

/// Expand a DH shared secret into a directional `SessionKeys` pair.
///
/// The server labels the outputs `(rx, tx) = (client→server, server→client)`;
/// the client labels the same two outputs inversely, so the two sides end up
/// with `client.tx == server.rx` and `client.rx == server.tx`.
pub fn derive_session_keys(
    shared_secret: &[u8; 32],
    is_server: bool,
) -> Result<SessionKeys, CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(b"obscura-proto-v1"), shared_secret);

    let mut c2s = [0u8; 32];
    let mut s2c = [0u8; 32];
    hk.expand(CLIENT_TO_SERVER, &mut c2s)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    hk.expand(SERVER_TO_CLIENT, &mut s2c)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(if is_server {
        SessionKeys {
            rx: SessionKey(c2s),
            tx: SessionKey(s2c),
        }
    } else {
        SessionKeys {
            rx: SessionKey(s2c),
            tx: SessionKey(c2s),
        }
    })
}
