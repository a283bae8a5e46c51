/// Returned by [`Connection`] operations once the connection has been closed, or when the
/// underlying socket is no longer connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionError {
    /// The connection is closed
    NotConnected,
}

impl embedded_io::Error for ConnectionError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NotConnected => embedded_io::ErrorKind::NotConnected,
        }
    }
}

/// One TCP connection as seen by a listener.
///
/// Every operation polls; none blocks waiting for the peer. After [`Connection::close`] the
/// read and write operations fail with [`ConnectionError::NotConnected`] without touching the
/// hardware.
pub trait Connection {
    /// Bytes ready to be read without waiting.
    fn available(&mut self) -> Result<usize, ConnectionError>;

    /// Next byte, without consuming it. `None` if no byte is ready.
    fn peek(&mut self) -> Result<Option<u8>, ConnectionError>;

    /// Read up to `buf.len()` ready bytes, returning how many were read. Zero when nothing is
    /// ready.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ConnectionError>;

    /// Read one ready byte.
    fn read_byte(&mut self) -> Result<Option<u8>, ConnectionError> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Queue bytes for sending, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, ConnectionError>;

    #[allow(missing_docs)]
    fn write_byte(&mut self, byte: u8) -> Result<usize, ConnectionError> {
        self.write(&[byte])
    }

    /// Push queued output towards the peer.
    fn flush(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }

    /// Start closing the connection. Completion happens later, outside the caller's control.
    fn close(&mut self);

    /// True while the connection can be read from or written to.
    fn connected(&mut self) -> bool;

    /// True once the peer has said it will send nothing more and every byte it sent has been
    /// read.
    fn peer_half_closed(&mut self) -> bool;

    /// Index of the hardware socket behind the connection.
    fn socket_index(&self) -> u8;
}
