use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::SerialLink;

/// Baud rate both ends of the camera link are configured for.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How to open a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Port path, e.g. `/dev/ttyAMA1` or `COM3`.
    pub port: String,
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Upper bound a single driver read may block for.
    pub read_timeout: Duration,
}

impl LinkConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(10),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

/// A hardware serial port.
///
/// The port is released when the link is dropped.
pub struct SerialPortLink {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SerialPortLink {
    /// Open `config.port` at `config.baud_rate` (8N1, no flow control).
    pub fn open(config: &LinkConfig) -> Result<Self> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        info!(port = %config.port, baud = config.baud_rate, "serial port opened");

        Ok(Self {
            port,
            name: config.port.clone(),
        })
    }

    /// Wrap an already-open port.
    pub fn from_port(port: Box<dyn serialport::SerialPort>) -> Self {
        let name = port.name().unwrap_or_else(|| "serial".to_string());
        Self { port, name }
    }

    /// Current line speed as reported by the driver.
    pub fn baud_rate(&self) -> Result<u32> {
        self.port.baud_rate().map_err(Into::into)
    }
}

impl SerialLink for SerialPortLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let count = self.port.bytes_to_read()?;
        Ok(count as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.port.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // The driver timeout is how "nothing arrived" is reported.
                Err(err)
                    if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock =>
                {
                    return Ok(0)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.port.write(&data[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock =>
                {
                    continue
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        debug!(port = %self.name, bytes = data.len(), "wrote to serial port");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.port.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl Drop for SerialPortLink {
    fn drop(&mut self) {
        debug!(port = %self.name, "closing serial port");
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("port", &self.name)
            .finish()
    }
}
