use crate::connection::Connection;

/// Receives the events of an established connection from a
/// [`ServerSocket`](crate::server_socket::ServerSocket).
///
/// For one connection the calls are ordered `on_connect`, any number of `on_can_read`, at most
/// one `on_half_closed`, and exactly one `on_disconnect`. At most one call is made per
/// [`perform_io`](crate::server_socket::ServerSocket::perform_io).
pub trait SocketListener {
    /// There may be input to read. Called on every poll while the connection is open, since
    /// the chip's receive buffer may hold more than the listener consumed last time.
    fn on_can_read(&mut self, connection: &mut dyn Connection);

    /// The peer has finished sending and all its input has been read. We may still write.
    fn on_half_closed(&mut self, connection: &mut dyn Connection);

    /// The connection is gone. There is nothing left to read or write.
    fn on_disconnect(&mut self);
}

/// A [`SocketListener`] which is also told about new connections.
pub trait ServerSocketListener: SocketListener {
    /// A client has connected.
    fn on_connect(&mut self, connection: &mut dyn Connection);
}
