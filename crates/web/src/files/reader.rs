use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, ReadBuf};

/// A lazily-opened, bounded, seekable reader over a file path.
///
/// The file opens on the first read (or on [`seek_to`](Self::seek_to)) and
/// the descriptor is released eagerly — at end-of-stream, when the byte
/// limit runs out, or on a read error — not just when the stream is dropped.
/// A responder iterating many ranges therefore never piles up descriptors.
pub struct FileStream {
    path: PathBuf,
    file: Option<File>,
    /// Bytes still allowed out; `None` means unbounded.
    remaining: Option<u64>,
}

impl FileStream {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), file: None, remaining: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the file if needed, seeks to `begin` and bounds the stream to
    /// `end - begin` bytes (zero when the span is inverted).
    pub async fn seek_to(&mut self, begin: u64, end: u64) -> io::Result<()> {
        if self.file.is_none() {
            self.file = Some(File::open(&self.path).await?);
        }
        if let Some(file) = self.file.as_mut() {
            file.seek(io::SeekFrom::Start(begin)).await?;
        }
        self.remaining = Some(end.saturating_sub(begin));
        Ok(())
    }

    /// Releases the descriptor. Safe to call any number of times.
    pub fn close(&mut self) {
        self.file = None;
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl AsyncRead for FileStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.remaining == Some(0) {
            this.file = None;
            return Poll::Ready(Ok(()));
        }

        if this.file.is_none() {
            // opening is cheap enough to do inline on the first poll
            match std::fs::File::open(&this.path) {
                Ok(file) => this.file = Some(File::from_std(file)),
                Err(err) => return Poll::Ready(Err(err)),
            }
        }

        let Some(file) = this.file.as_mut() else {
            return Poll::Ready(Ok(()));
        };

        let limit = this.remaining.unwrap_or(u64::MAX).min(buf.remaining() as u64) as usize;
        let mut limited = buf.take(limit);

        match Pin::new(file).poll_read(cx, &mut limited) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(err)) => {
                this.file = None;
                Poll::Ready(Err(err))
            }
            Poll::Ready(Ok(())) => {
                let count = limited.filled().len();
                // the limited buffer borrows our buffer's unfilled section,
                // so mark what it initialized and advance past it
                unsafe {
                    buf.assume_init(count);
                }
                buf.advance(count);

                if let Some(remaining) = this.remaining.as_mut() {
                    *remaining -= count as u64;
                }
                if count == 0 || this.remaining == Some(0) {
                    this.file = None;
                }
                Poll::Ready(Ok(()))
            }
        }
    }
}
