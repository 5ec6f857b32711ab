//! obscura-proto: the ObscuraProto session protocol core
//!
//! # Design principles
//! - The transport is the caller's problem: this crate contracts only that
//!   whole ciphertext frames arrive in order on a connection.
//! - No session resumption, no rekeying, no multiplexing. A [`session::Session`]
//!   drives exactly one handshake and is discarded on any failure.
//! - Every wire-visible byte layout lives in `handshake` or `payload`; the
//!   `session` module only ever moves already-encoded bytes.
//!
//! # Module layout
//! - `version`   protocol version type and negotiation
//! - `handshake` `ClientHello` / `ServerHello` wire messages
//! - `payload`   the self-describing typed parameter codec
//! - `session`   the handshake + duplex record-layer state machine
//! - `error`     unified error type

pub mod error;
pub mod handshake;
pub mod payload;
pub mod session;
pub mod version;

pub use error::ProtoError;
pub use handshake::{ClientHello, ServerHello};
pub use payload::{Payload, PayloadBuilder, PayloadReader};
pub use session::{Role, Session};
pub use version::{Version, SUPPORTED_VERSIONS, V1_0};
