use crate::error::Result;

/// A byte-serial link: a byte source and sink with no message boundaries.
///
/// Reads never block for long. A read may return fewer bytes than requested,
/// including zero, even right after `bytes_available` reported data.
/// Closing the link is dropping it.
pub trait SerialLink: Send {
    /// Human-readable link name (port path or `memory`).
    fn name(&self) -> &str;

    /// Number of bytes buffered and ready to read.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` bytes. Returns `Ok(0)` when nothing arrived.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write every byte of `data` before returning.
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Push buffered output to the wire.
    fn flush(&mut self) -> Result<()>;
}

impl<L: SerialLink + ?Sized> SerialLink for Box<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<L: SerialLink + ?Sized> SerialLink for &mut L {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
