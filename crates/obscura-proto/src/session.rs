//! The session state machine: a two-message handshake followed by a duplex
//! AEAD record layer with strict nonce discipline.

use obscura_crypto::keys::{KeyPair, PublicKey};
use obscura_crypto::primitives;

use crate::error::ProtoError;
use crate::handshake::{ClientHello, ServerHello};
use crate::payload::Payload;
use crate::version::{self, Version};

/// Which end of the handshake a [`Session`] plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Init,
    AwaitServerHello,
    Established,
    Failed,
}

/// Long-term identity material, role-specific: a client carries only the
/// server's trusted public verifying key, a server carries its own signing
/// pair. Keeping these in disjoint enum variants (rather than one `KeyPair`
/// field with a role tag to check at each call) makes mismatched usage a
/// type error in `Identity` construction instead of a runtime `InvalidState`.
enum Identity {
    Client { trusted_server_pk: PublicKey },
    Server { signing_key_pair: KeyPair },
}

/// Fails the session (transition to `Failed`, terminal) and returns `err`
/// for the caller to propagate. Takes `&mut SessionState` directly, not
/// `&mut Session`, so callers can hold an unrelated borrow of another field
/// (e.g. `self.identity`) across the call.
fn fail(state: &mut SessionState, err: ProtoError) -> ProtoError {
    *state = SessionState::Failed;
    tracing::debug!(error = %err, "session failed");
    err
}

/// One endpoint of an ObscuraProto session: drives exactly one handshake,
/// then processes duplex record traffic until dropped.
pub struct Session {
    role: Role,
    identity: Identity,
    ephemeral_kx_pair: Option<KeyPair>,
    selected_version: Option<Version>,
    session_keys: Option<obscura_crypto::keys::SessionKeys>,
    tx_counter: u64,
    rx_counter: u64,
    state: SessionState,
}

impl Session {
    /// A client session that trusts `trusted_server_pk` as the server's
    /// long-term signing public key (distributed out-of-band).
    pub fn new_client(trusted_server_pk: PublicKey) -> Self {
        Session {
            role: Role::Client,
            identity: Identity::Client { trusted_server_pk },
            ephemeral_kx_pair: None,
            selected_version: None,
            session_keys: None,
            tx_counter: 0,
            rx_counter: 0,
            state: SessionState::Init,
        }
    }

    /// A server session authenticating with `signing_key_pair`.
    pub fn new_server(signing_key_pair: KeyPair) -> Self {
        Session {
            role: Role::Server,
            identity: Identity::Server { signing_key_pair },
            ephemeral_kx_pair: None,
            selected_version: None,
            session_keys: None,
            tx_counter: 0,
            rx_counter: 0,
            state: SessionState::Init,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn get_selected_version(&self) -> Option<Version> {
        self.selected_version
    }

    pub fn is_handshake_complete(&self) -> bool {
        self.state == SessionState::Established
    }

    pub fn rx_counter(&self) -> u64 {
        self.rx_counter
    }

    pub fn tx_counter(&self) -> u64 {
        self.tx_counter
    }

    /// `INIT -> AWAIT_SERVER_HELLO`. Generates the client's ephemeral KX
    /// pair and opens the handshake.
    pub fn client_initiate_handshake(&mut self) -> Result<ClientHello, ProtoError> {
        if self.role != Role::Client || self.state != SessionState::Init {
            return Err(fail(&mut self.state, ProtoError::InvalidState));
        }

        let ephemeral = primitives::generate_kx_keypair();
        let hello = ClientHello {
            supported_versions: version::SUPPORTED_VERSIONS.to_vec(),
            ephemeral_pk: ephemeral.public,
        };
        self.ephemeral_kx_pair = Some(ephemeral);
        self.state = SessionState::AwaitServerHello;
        tracing::debug!("client handshake initiated, awaiting ServerHello");
        Ok(hello)
    }

    /// `INIT -> ESTABLISHED`. Negotiates the version, generates the
    /// server's ephemeral KX pair, derives session keys, and signs the
    /// transcript `client_ephemeral_pk || server_ephemeral_pk`.
    pub fn server_respond_to_handshake(
        &mut self,
        client_hello: &ClientHello,
    ) -> Result<ServerHello, ProtoError> {
        if self.role != Role::Server || self.state != SessionState::Init {
            return Err(fail(&mut self.state, ProtoError::InvalidState));
        }

        let selected_version = match version::negotiate(
            &client_hello.supported_versions,
            version::SUPPORTED_VERSIONS,
        ) {
            Some(v) => v,
            None => return Err(fail(&mut self.state, ProtoError::VersionMismatch)),
        };

        let server_ephemeral = primitives::generate_kx_keypair();
        let session_keys = match primitives::server_compute_session_keys(
            &server_ephemeral,
            &client_hello.ephemeral_pk,
        ) {
            Ok(k) => k,
            Err(e) => return Err(fail(&mut self.state, e.into())),
        };

        let mut transcript = Vec::with_capacity(64);
        transcript.extend_from_slice(client_hello.ephemeral_pk.as_bytes());
        transcript.extend_from_slice(server_ephemeral.public.as_bytes());

        let signature = {
            let signing_key_pair = match &self.identity {
                Identity::Server { signing_key_pair } => signing_key_pair,
                Identity::Client { .. } => {
                    return Err(fail(&mut self.state, ProtoError::InvalidState))
                }
            };
            match primitives::sign(&transcript, &signing_key_pair.private) {
                Ok(s) => s,
                Err(e) => return Err(fail(&mut self.state, e.into())),
            }
        };

        let server_hello = ServerHello {
            selected_version,
            ephemeral_pk: server_ephemeral.public,
            signature,
        };

        self.ephemeral_kx_pair = Some(server_ephemeral);
        self.selected_version = Some(selected_version);
        self.session_keys = Some(session_keys);
        self.tx_counter = 0;
        self.rx_counter = 0;
        self.state = SessionState::Established;
        tracing::debug!(version = selected_version, "server handshake established");

        Ok(server_hello)
    }

    /// `AWAIT_SERVER_HELLO -> ESTABLISHED`. Verifies the server's signature
    /// over the transcript against the trusted server public key, then
    /// derives session keys.
    pub fn client_finalize_handshake(&mut self, server_hello: &ServerHello) -> Result<(), ProtoError> {
        if self.role != Role::Client || self.state != SessionState::AwaitServerHello {
            return Err(fail(&mut self.state, ProtoError::InvalidState));
        }
        if !version::SUPPORTED_VERSIONS.contains(&server_hello.selected_version) {
            return Err(fail(&mut self.state, ProtoError::VersionMismatch));
        }

        let client_ephemeral = self
            .ephemeral_kx_pair
            .as_ref()
            .expect("AWAIT_SERVER_HELLO implies ephemeral_kx_pair is set");

        let mut transcript = Vec::with_capacity(64);
        transcript.extend_from_slice(client_ephemeral.public.as_bytes());
        transcript.extend_from_slice(server_hello.ephemeral_pk.as_bytes());

        let verified = match &self.identity {
            Identity::Client { trusted_server_pk } => {
                primitives::verify(&server_hello.signature, &transcript, trusted_server_pk)
            }
            Identity::Server { .. } => return Err(fail(&mut self.state, ProtoError::InvalidState)),
        };
        if !verified {
            return Err(fail(&mut self.state, ProtoError::AuthFailure));
        }

        let session_keys =
            match primitives::client_compute_session_keys(client_ephemeral, &server_hello.ephemeral_pk) {
                Ok(k) => k,
                Err(e) => return Err(fail(&mut self.state, e.into())),
            };

        self.selected_version = Some(server_hello.selected_version);
        self.session_keys = Some(session_keys);
        self.tx_counter = 0;
        self.rx_counter = 0;
        self.state = SessionState::Established;
        tracing::debug!(
            version = server_hello.selected_version,
            "client handshake established"
        );

        Ok(())
    }

    /// Encrypt `payload` under `(session_keys.tx, tx_counter)`, emitting
    /// `u64_be(counter) || ciphertext || tag`, and increments `tx_counter`.
    pub fn encrypt_payload(&mut self, payload: &Payload) -> Result<Vec<u8>, ProtoError> {
        if !self.is_handshake_complete() {
            return Err(fail(&mut self.state, ProtoError::InvalidState));
        }
        if self.tx_counter == u64::MAX {
            return Err(fail(&mut self.state, ProtoError::CounterExhausted));
        }

        let tx_key = *self
            .session_keys
            .as_ref()
            .expect("ESTABLISHED implies session_keys is set")
            .tx
            .as_bytes();

        let ciphertext = match primitives::encrypt(&payload.serialize(), self.tx_counter, &tx_key) {
            Ok(c) => c,
            Err(e) => return Err(fail(&mut self.state, e.into())),
        };

        let mut frame = Vec::with_capacity(8 + ciphertext.len());
        frame.extend_from_slice(&self.tx_counter.to_be_bytes());
        frame.extend_from_slice(&ciphertext);
        self.tx_counter += 1;

        Ok(frame)
    }

    /// Decrypt a wire frame `u64_be(counter) || ciphertext || tag`. Requires
    /// `counter == rx_counter` (strict, in order, no windowing), then
    /// increments `rx_counter`.
    pub fn decrypt_packet(&mut self, frame: &[u8]) -> Result<Payload, ProtoError> {
        if !self.is_handshake_complete() {
            return Err(fail(&mut self.state, ProtoError::InvalidState));
        }
        if frame.len() < 8 {
            return Err(fail(
                &mut self.state,
                ProtoError::MalformedMessage("truncated record frame".into()),
            ));
        }

        let mut counter_bytes = [0u8; 8];
        counter_bytes.copy_from_slice(&frame[..8]);
        let counter = u64::from_be_bytes(counter_bytes);
        if counter != self.rx_counter {
            // A replayed or reordered frame is a single-frame rejection, not
            // a session fault: the peer may still be sending frames in
            // order and a later, correctly-numbered frame must still decrypt.
            tracing::debug!(got = counter, expected = self.rx_counter, "rejected out-of-order frame");
            return Err(ProtoError::ReplayOrReorder);
        }

        let rx_key = *self
            .session_keys
            .as_ref()
            .expect("ESTABLISHED implies session_keys is set")
            .rx
            .as_bytes();

        let plaintext = match primitives::decrypt(&frame[8..], counter, &rx_key) {
            Ok(p) => p,
            Err(_) => return Err(fail(&mut self.state, ProtoError::AuthFailure)),
        };

        let payload = match Payload::deserialize(&plaintext) {
            Ok(p) => p,
            Err(e) => return Err(fail(&mut self.state, e)),
        };

        self.rx_counter += 1;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadBuilder;

    fn run_handshake() -> (Session, Session) {
        let signing = primitives::generate_sign_keypair();
        let mut server = Session::new_server(signing_key_pair_copy(&signing));
        let mut client = Session::new_client(signing.public);

        let client_hello = client.client_initiate_handshake().unwrap();
        let server_hello = server.server_respond_to_handshake(&client_hello).unwrap();
        client.client_finalize_handshake(&server_hello).unwrap();

        (client, server)
    }

    /// `KeyPair` doesn't implement `Clone` (its private half is zeroize-on-drop
    /// and not meant to be duplicated); tests that need the same signing
    /// secret in two `Session`s rebuild a `KeyPair` from the known-identical
    /// public half plus a second generated pair's structure isn't viable, so
    /// this constructs a second handle onto the same key bytes via the
    /// private key's accessor.
    fn signing_key_pair_copy(kp: &KeyPair) -> KeyPair {
        let bytes = *kp.private.sign_bytes().expect("signing key pair");
        KeyPair {
            public: kp.public,
            private: obscura_crypto::keys::PrivateKey::Sign(bytes),
        }
    }

    #[test]
    fn happy_handshake_then_round_trip() {
        let (mut client, mut server) = run_handshake();

        assert!(client.is_handshake_complete());
        assert!(server.is_handshake_complete());
        assert_eq!(client.get_selected_version(), Some(version::V1_0));
        assert_eq!(server.get_selected_version(), Some(version::V1_0));
        assert_eq!(client.tx_counter(), 0);
        assert_eq!(server.rx_counter(), 0);

        let mut builder = PayloadBuilder::new(7);
        builder.add_param(true);
        let payload = builder.build();

        let frame = client.encrypt_payload(&payload).unwrap();
        let decoded = server.decrypt_packet(&frame).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(client.tx_counter(), 1);
        assert_eq!(server.rx_counter(), 1);
    }

    #[test]
    fn version_mismatch_fails_on_disjoint_support() {
        let signing = primitives::generate_sign_keypair();
        let mut server = Session::new_server(signing_key_pair_copy(&signing));

        let bogus_hello = ClientHello {
            supported_versions: vec![9999],
            ephemeral_pk: primitives::generate_kx_keypair().public,
        };
        let result = server.server_respond_to_handshake(&bogus_hello);
        assert!(matches!(result, Err(ProtoError::VersionMismatch)));
        assert!(!server.is_handshake_complete());
    }

    #[test]
    fn bad_signature_fails_client_finalize() {
        let signing = primitives::generate_sign_keypair();
        let mut server = Session::new_server(signing_key_pair_copy(&signing));
        let mut client = Session::new_client(signing.public);

        let client_hello = client.client_initiate_handshake().unwrap();
        let mut server_hello = server.server_respond_to_handshake(&client_hello).unwrap();
        let mut sig_bytes = *server_hello.signature.as_bytes();
        sig_bytes[0] ^= 0xFF;
        server_hello.signature = obscura_crypto::keys::Signature::from_bytes(sig_bytes);

        let result = client.client_finalize_handshake(&server_hello);
        assert!(matches!(result, Err(ProtoError::AuthFailure)));
    }

    #[test]
    fn replay_is_rejected_then_next_frame_succeeds() {
        let (mut client, mut server) = run_handshake();

        let p1 = PayloadBuilder::new(1).build();
        let p2 = PayloadBuilder::new(2).build();
        let f1 = client.encrypt_payload(&p1).unwrap();
        let f2 = client.encrypt_payload(&p2).unwrap();

        assert!(server.decrypt_packet(&f1).is_ok());
        let replayed = server.decrypt_packet(&f1);
        assert!(matches!(replayed, Err(ProtoError::ReplayOrReorder)));
        assert!(server.is_handshake_complete());
        assert!(server.decrypt_packet(&f2).is_ok());
    }

    #[test]
    fn record_ops_refused_before_handshake() {
        let signing = primitives::generate_sign_keypair();
        let mut server = Session::new_server(signing_key_pair_copy(&signing));
        let payload = PayloadBuilder::new(1).build();
        assert!(matches!(
            server.encrypt_payload(&payload),
            Err(ProtoError::InvalidState)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_and_poisons_session() {
        let (mut client, mut server) = run_handshake();
        let payload = PayloadBuilder::new(1).build();
        let mut frame = client.encrypt_payload(&payload).unwrap();
        *frame.last_mut().unwrap() ^= 0xFF;

        assert!(server.decrypt_packet(&frame).is_err());
        assert!(!server.is_handshake_complete());
        assert!(matches!(
            server.decrypt_packet(&frame),
            Err(ProtoError::InvalidState)
        ));
    }
}
