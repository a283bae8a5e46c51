use core::future::poll_fn;
use core::task::Poll;

use crate::connection::{Connection, ConnectionError};

/// Adapts a [`Connection`] to the `embedded-io` and `embedded-io-async` traits, so responses
/// can be written with code written against those traits.
///
/// Reads report end of file (`Ok(0)`) once the peer has half-closed and all its input has
/// been read. The blocking read spins until input arrives. The async read yields to the
/// executor instead.
pub struct ConnectionIo<'a, C: ?Sized> {
    connection: &'a mut C,
}

impl<'a, C: Connection + ?Sized> ConnectionIo<'a, C> {
    #[allow(missing_docs)]
    pub fn new(connection: &'a mut C) -> Self {
        Self { connection }
    }

    /// The wrapped connection.
    pub fn connection(&mut self) -> &mut C {
        self.connection
    }

    /// Read what is ready, or `None` if the caller should wait for input.
    fn try_read(&mut self, buf: &mut [u8]) -> Option<Result<usize, ConnectionError>> {
        if buf.is_empty() {
            return Some(Ok(0));
        }
        match self.connection.available() {
            Err(e) => Some(Err(e)),
            Ok(0) if self.connection.peer_half_closed() => Some(Ok(0)),
            Ok(0) if !self.connection.connected() => Some(Err(ConnectionError::NotConnected)),
            Ok(0) => None,
            Ok(_) => Some(self.connection.read(buf)),
        }
    }
}

impl<C: ?Sized> embedded_io::ErrorType for ConnectionIo<'_, C> {
    type Error = ConnectionError;
}

impl<C: Connection + ?Sized> embedded_io::Read for ConnectionIo<'_, C> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        loop {
            if let Some(result) = self.try_read(buf) {
                return result;
            }
            core::hint::spin_loop();
        }
    }
}

impl<C: Connection + ?Sized> embedded_io::ReadReady for ConnectionIo<'_, C> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.connection.available()? > 0 || self.connection.peer_half_closed())
    }
}

impl<C: Connection + ?Sized> embedded_io::Write for ConnectionIo<'_, C> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.connection.write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.connection.flush()
    }
}

impl<C: Connection + ?Sized> embedded_io::WriteReady for ConnectionIo<'_, C> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.connection.connected())
    }
}

impl<C: Connection + ?Sized> embedded_io_async::Read for ConnectionIo<'_, C> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        poll_fn(|cx| match self.try_read(buf) {
            Some(result) => Poll::Ready(result),
            None => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        })
        .await
    }
}

impl<C: Connection + ?Sized> embedded_io_async::Write for ConnectionIo<'_, C> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.connection.write(buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.connection.flush()
    }
}
