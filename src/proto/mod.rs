use thiserror::Error;

pub mod codec;
pub mod notification;

#[cfg(test)]
pub(crate) mod fake;

pub use notification::{DecodeError, Notification};

/// Errors raised while reading from the notification channel.
///
/// A [`ProtoError::Frame`] is recoverable: the offending frame is already
/// consumed and the stream resumes at the next frame start. The other
/// variants mean the channel itself failed.
#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
    #[error("unrecognized frame: {0}")]
    Frame(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
