use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Scripted byte source standing in for a real notification channel.
///
/// Yields the script in `chunk`-sized reads, then EOF, so tests can
/// exercise frame reassembly across arbitrary read boundaries.
pub(crate) struct FakeBuffer {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl FakeBuffer {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            chunk: usize::MAX,
        }
    }

    pub(crate) fn chunked(data: Vec<u8>, chunk: usize) -> Self {
        assert!(chunk > 0);
        Self {
            data,
            pos: 0,
            chunk,
        }
    }
}

impl AsyncRead for FakeBuffer {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.pos < this.data.len() {
            let n = (this.data.len() - this.pos)
                .min(this.chunk)
                .min(buf.remaining());
            buf.put_slice(&this.data[this.pos..this.pos + n]);
            this.pos += n;
        }
        Poll::Ready(Ok(()))
    }
}
