use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio::io::AsyncRead;
use tokio_serial::SerialPortBuilderExt;
use tokio_util::codec::FramedRead;

use super::proto::codec::NotificationCodec;
use super::proto::notification::{DecodeError, Notification};
use super::proto::ProtoError;
use crate::proto::Result;

type FrameResult = std::result::Result<Notification, DecodeError>;
type NotificationStream = Pin<Box<dyn Stream<Item = std::result::Result<FrameResult, std::io::Error>>>>;

/// Read side of the tape's notification channel.
///
/// The tape only pushes; there is no command path. Frames are consumed in
/// delivery order, one at a time.
pub struct Device {
    stream: NotificationStream,
}

impl Device {
    /// Open a serial port carrying the raw notification bytes, e.g. a
    /// BLE-serial bridge.
    pub fn new(com: impl AsRef<str>, baudrate: u32) -> Result<Self> {
        let mut port = tokio_serial::new(com.as_ref(), baudrate).open_native_async()?;

        #[cfg(unix)]
        port.set_exclusive(false)
            .expect("Unable to set serial port exclusive to false");

        Ok(Self::from_reader(port))
    }

    /// Wrap any byte source delivering raw frames.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + 'static,
    {
        let stream = FramedRead::new(reader, NotificationCodec::default());

        Self {
            stream: Box::pin(stream),
        }
    }

    #[cfg(test)]
    pub fn new_faked(script: Vec<u8>) -> Self {
        Self::from_reader(super::proto::fake::FakeBuffer::new(script))
    }

    #[cfg(test)]
    pub fn new_faked_chunked(script: Vec<u8>, chunk: usize) -> Self {
        Self::from_reader(super::proto::fake::FakeBuffer::chunked(script, chunk))
    }

    /// Wait for the next notification.
    ///
    /// Returns `Ok(None)` once the channel is closed; no further frames
    /// will arrive. A [`ProtoError::Frame`] covers a single dropped frame
    /// and the stream stays usable.
    pub async fn next_notification(&mut self) -> Result<Option<Notification>> {
        match self.stream.next().await {
            Some(Ok(Ok(note))) => Ok(Some(note)),
            Some(Ok(Err(reason))) => Err(ProtoError::Frame(reason)),
            Some(Err(ioerr)) => Err(ProtoError::Io(ioerr)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::measurement::{MeasureMode, UnitSystem};

    #[tokio::test]
    async fn test_reads_notifications_until_eof() {
        let mut device = Device::new_faked(b"*15000;0;01PM*15000;0;01SM".to_vec());

        let first = device.next_notification().await.unwrap().unwrap();
        assert_eq!(first.value, 15000);
        assert!(!first.confirmed);
        assert_eq!(first.mode, MeasureMode::Circular);

        let second = device.next_notification().await.unwrap().unwrap();
        assert!(second.confirmed);
        assert_eq!(second.unit, UnitSystem::Metric);

        assert!(device.next_notification().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reassembles_frames_across_reads() {
        let mut device = Device::new_faked_chunked(b"*15000;0;01SM*2362;7;80SI".to_vec(), 3);

        let first = device.next_notification().await.unwrap().unwrap();
        assert_eq!(first.value, 15000);
        let second = device.next_notification().await.unwrap().unwrap();
        assert_eq!(second.value, 2362);
        assert_eq!(second.unit, UnitSystem::Imperial);
    }

    #[tokio::test]
    async fn test_recovers_after_malformed_frame() {
        let mut device = Device::new_faked(b"*15000;0;02SM*15000;0;01SM".to_vec());

        match device.next_notification().await {
            Err(ProtoError::Frame(DecodeError::BadMode)) => {}
            other => panic!("expected dropped frame, got {:?}", other.map(|_| ())),
        }

        let note = device.next_notification().await.unwrap().unwrap();
        assert!(note.confirmed);
    }

    #[tokio::test]
    async fn test_truncated_frame_is_recoverable() {
        let mut device = Device::new_faked(b"*15000;0*15000;0;01SM".to_vec());

        match device.next_notification().await {
            Err(ProtoError::Frame(DecodeError::Truncated)) => {}
            other => panic!("expected truncated frame, got {:?}", other.map(|_| ())),
        }

        let note = device.next_notification().await.unwrap().unwrap();
        assert_eq!(note.value, 15000);
    }

    #[tokio::test]
    async fn test_skips_leading_junk() {
        let mut device = Device::new_faked(b"noise\r\n*100;0;00SM".to_vec());

        match device.next_notification().await {
            Err(ProtoError::Frame(DecodeError::MissingStart)) => {}
            other => panic!("expected skipped junk, got {:?}", other.map(|_| ())),
        }
        let note = device.next_notification().await.unwrap().unwrap();
        assert_eq!(note.value, 100);
    }
}
