use thiserror::Error;

use obscura_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("no mutually supported protocol version")]
    VersionMismatch,

    #[error("authentication failed")]
    AuthFailure,

    #[error("frame counter does not match expected sequence")]
    ReplayOrReorder,

    #[error("send counter exhausted")]
    CounterExhausted,

    #[error("truncated payload parameter")]
    Truncated,

    #[error("parameter width does not match requested type")]
    WidthMismatch,

    #[error("bool parameter was not 0x00 or 0x01")]
    InvalidBool,

    #[error("string parameter was not valid UTF-8")]
    InvalidUtf8,

    #[error("operation is invalid in the current session state")]
    InvalidState,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
