//! Handshake wire messages: `ClientHello` and `ServerHello`.
//!
//! Both use a compact big-endian length-prefixed serialization; see the
//! module docs on [`ClientHello::serialize`] / [`ServerHello::serialize`]
//! for the exact byte layout.

use obscura_crypto::keys::{PublicKey, Signature};

use crate::error::ProtoError;
use crate::version::Version;

/// `{ supported_versions, ephemeral_pk }`, sent client → server to open a
/// handshake.
///
/// Wire layout:
/// ```text
/// u16  n = len(supported_versions)
/// u16  versions[n]             // big-endian
/// byte ephemeral_pk[32]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub supported_versions: Vec<Version>,
    pub ephemeral_pk: PublicKey,
}

impl ClientHello {
    pub fn serialize(&self) -> Vec<u8> {
        let n = self.supported_versions.len() as u16;
        let mut out = Vec::with_capacity(2 + self.supported_versions.len() * 2 + 32);
        out.extend_from_slice(&n.to_be_bytes());
        for v in &self.supported_versions {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out.extend_from_slice(self.ephemeral_pk.as_bytes());
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, ProtoError> {
        if bytes.len() < 2 {
            return Err(ProtoError::MalformedMessage("truncated ClientHello header".into()));
        }
        let n = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        if n == 0 {
            return Err(ProtoError::MalformedMessage("empty supported_versions list".into()));
        }
        let expected_len = 2 + n * 2 + 32;
        if bytes.len() != expected_len {
            return Err(ProtoError::MalformedMessage(format!(
                "expected {expected_len} bytes, got {}",
                bytes.len()
            )));
        }

        let mut supported_versions = Vec::with_capacity(n);
        let mut cursor = 2;
        for _ in 0..n {
            supported_versions.push(u16::from_be_bytes([bytes[cursor], bytes[cursor + 1]]));
            cursor += 2;
        }

        let mut pk = [0u8; 32];
        pk.copy_from_slice(&bytes[cursor..cursor + 32]);

        Ok(ClientHello {
            supported_versions,
            ephemeral_pk: PublicKey::from_bytes(pk),
        })
    }
}

/// `{ selected_version, ephemeral_pk, signature }`, sent server → client to
/// complete the handshake.
///
/// Wire layout:
/// ```text
/// u16  selected_version
/// byte ephemeral_pk[32]
/// byte signature[64]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub selected_version: Version,
    pub ephemeral_pk: PublicKey,
    pub signature: Signature,
}

impl ServerHello {
    const WIRE_LEN: usize = 2 + 32 + 64;

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::WIRE_LEN);
        out.extend_from_slice(&self.selected_version.to_be_bytes());
        out.extend_from_slice(self.ephemeral_pk.as_bytes());
        out.extend_from_slice(self.signature.as_bytes());
        out
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, ProtoError> {
        if bytes.len() != Self::WIRE_LEN {
            return Err(ProtoError::MalformedMessage(format!(
                "expected {} bytes, got {}",
                Self::WIRE_LEN,
                bytes.len()
            )));
        }
        let selected_version = u16::from_be_bytes([bytes[0], bytes[1]]);

        let mut pk = [0u8; 32];
        pk.copy_from_slice(&bytes[2..34]);

        let mut sig = [0u8; 64];
        sig.copy_from_slice(&bytes[34..98]);

        Ok(ServerHello {
            selected_version,
            ephemeral_pk: PublicKey::from_bytes(pk),
            signature: Signature::from_bytes(sig),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_hello_roundtrip() {
        let hello = ClientHello {
            supported_versions: vec![1, 2, 5],
            ephemeral_pk: PublicKey::from_bytes([7u8; 32]),
        };
        let bytes = hello.serialize();
        let decoded = ClientHello::deserialize(&bytes).unwrap();
        assert_eq!(hello, decoded);
    }

    #[test]
    fn client_hello_rejects_empty_version_list() {
        let bytes = [0x00, 0x00]; // n = 0, no pk at all
        assert!(ClientHello::deserialize(&bytes).is_err());
    }

    #[test]
    fn client_hello_rejects_truncated() {
        let hello = ClientHello {
            supported_versions: vec![1],
            ephemeral_pk: PublicKey::from_bytes([1u8; 32]),
        };
        let mut bytes = hello.serialize();
        bytes.pop();
        assert!(ClientHello::deserialize(&bytes).is_err());
    }

    #[test]
    fn client_hello_rejects_trailing_tail() {
        let hello = ClientHello {
            supported_versions: vec![1],
            ephemeral_pk: PublicKey::from_bytes([1u8; 32]),
        };
        let mut bytes = hello.serialize();
        bytes.push(0xFF);
        assert!(ClientHello::deserialize(&bytes).is_err());
    }

    #[test]
    fn server_hello_roundtrip() {
        let hello = ServerHello {
            selected_version: 1,
            ephemeral_pk: PublicKey::from_bytes([9u8; 32]),
            signature: Signature::from_bytes([3u8; 64]),
        };
        let bytes = hello.serialize();
        let decoded = ServerHello::deserialize(&bytes).unwrap();
        assert_eq!(hello, decoded);
    }

    #[test]
    fn server_hello_rejects_wrong_length() {
        assert!(ServerHello::deserialize(&[0u8; 50]).is_err());
    }
}
