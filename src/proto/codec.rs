use bytes::BytesMut;
use std::io;
use tokio_util::codec::Decoder;

use super::notification::{DecodeError, Notification};

/// No valid frame comes close to this; longer buffers are junk.
const MAX_FRAME_LEN: usize = 64;

/// Splits a raw byte stream into tape notification frames.
///
/// Frames start at `'*'` and end at the confirm+unit byte pair; neither
/// symbol class occurs anywhere else in a valid frame. Rejected bytes are
/// consumed and yielded as `Err` items so the stream survives them and
/// resumes at the next frame start; an `io::Error` is reserved for the
/// channel itself failing. Whether a dropped frame matters is decided at
/// a higher level, not here.
#[derive(Default)]
pub struct NotificationCodec;

fn ends_frame(window: &[u8]) -> bool {
    matches!(window, [b'S' | b'P', b'I' | b'M'])
}

impl Decoder for NotificationCodec {
    type Item = std::result::Result<Notification, DecodeError>;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        if !Notification::starts_frame(src[0]) {
            let junk = src
                .iter()
                .position(|b| Notification::starts_frame(*b))
                .unwrap_or(src.len());
            let _ = src.split_to(junk);
            return Ok(Some(Err(DecodeError::MissingStart)));
        }

        for i in 1..src.len() {
            if Notification::starts_frame(src[i]) {
                // New frame begins before this one completed.
                let _ = src.split_to(i);
                return Ok(Some(Err(DecodeError::Truncated)));
            }
            if ends_frame(&src[i - 1..=i]) {
                let frame = src.split_to(i + 1);
                return Ok(Some(Notification::try_from(&frame[..])));
            }
        }

        if src.len() > MAX_FRAME_LEN {
            src.clear();
            return Ok(Some(Err(DecodeError::Unterminated)));
        }

        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() => Ok(None),
            None => {
                // Channel closed mid-frame.
                src.clear();
                Ok(Some(Err(DecodeError::Truncated)))
            }
        }
    }
}
