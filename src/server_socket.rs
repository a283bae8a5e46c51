use crate::config::ServerSocketConfig;
use crate::connection::{Connection, ConnectionError};
use crate::platform::{Clock, PlatformEthernet, SocketStatus};
use crate::socket_listener::ServerSocketListener;

/// When the server started closing the current connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct DisconnectData {
    disconnected: bool,
    disconnect_time_millis: u32,
}

impl DisconnectData {
    fn record_disconnect<K: Clock + ?Sized>(&mut self, clock: &K) {
        if !self.disconnected {
            self.disconnected = true;
            self.disconnect_time_millis = clock.now_millis();
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The connection handed to a listener. Closing it only sends FIN; the socket itself is
/// closed by [`ServerSocket::perform_io`] once the peer finishes, or the timeout expires.
struct TcpServerConnection<'a, P: ?Sized, K: ?Sized> {
    platform: &'a mut P,
    clock: &'a K,
    socket: u8,
    disconnect: &'a mut DisconnectData,
}

impl<P, K> TcpServerConnection<'_, P, K>
where
    P: PlatformEthernet + ?Sized,
    K: Clock + ?Sized,
{
    fn status(&mut self) -> SocketStatus {
        SocketStatus::from_register(self.platform.socket_status(self.socket))
    }

    fn ensure_not_closed(&self) -> Result<(), ConnectionError> {
        if self.disconnect.disconnected {
            Err(ConnectionError::NotConnected)
        } else {
            Ok(())
        }
    }
}

impl<P, K> Connection for TcpServerConnection<'_, P, K>
where
    P: PlatformEthernet + ?Sized,
    K: Clock + ?Sized,
{
    fn available(&mut self) -> Result<usize, ConnectionError> {
        self.ensure_not_closed()?;
        Ok(self.platform.available(self.socket))
    }

    fn peek(&mut self) -> Result<Option<u8>, ConnectionError> {
        self.ensure_not_closed()?;
        Ok(self.platform.peek(self.socket))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ConnectionError> {
        self.ensure_not_closed()?;
        Ok(self.platform.read(self.socket, buf))
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, ConnectionError> {
        self.ensure_not_closed()?;
        if !self.platform.is_open_for_writing(self.socket) {
            return Err(ConnectionError::NotConnected);
        }
        Ok(self.platform.write(self.socket, buf))
    }

    fn flush(&mut self) -> Result<(), ConnectionError> {
        self.ensure_not_closed()?;
        self.platform.flush(self.socket);
        Ok(())
    }

    fn close(&mut self) {
        if self.disconnect.disconnected {
            return;
        }
        let status = self.status();
        debug!("closing connection on socket {}, status {}", self.socket, status);
        self.disconnect.record_disconnect(self.clock);
        if status.is_open() {
            self.platform.disconnect_socket(self.socket);
        }
    }

    fn connected(&mut self) -> bool {
        !self.disconnect.disconnected && self.status().is_open()
    }

    fn peer_half_closed(&mut self) -> bool {
        !self.disconnect.disconnected
            && self.status() == SocketStatus::CloseWait
            && self.platform.available(self.socket) == 0
    }

    fn socket_index(&self) -> u8 {
        self.socket
    }
}

/// Binds one hardware socket to a TCP port for the life of the program, and turns the
/// socket's status changes into [`ServerSocketListener`] events.
///
/// The socket is never waited on. The owner calls [`ServerSocket::perform_io`] from its main
/// loop, and each call polls the chip once and makes at most one listener call. When a
/// connection ends the socket goes back to listening.
#[derive(Debug)]
pub struct ServerSocket {
    config: ServerSocketConfig,
    socket: Option<u8>,
    last_status: SocketStatus,
    disconnect: DisconnectData,
    connection_announced: bool,
    half_close_announced: bool,
}

impl ServerSocket {
    /// A socket which has not yet claimed any hardware socket.
    pub const fn new(config: ServerSocketConfig) -> Self {
        Self {
            config,
            socket: None,
            last_status: SocketStatus::Closed,
            disconnect: DisconnectData {
                disconnected: false,
                disconnect_time_millis: 0,
            },
            connection_announced: false,
            half_close_announced: false,
        }
    }

    #[allow(missing_docs)]
    pub fn tcp_port(&self) -> u16 {
        self.config.tcp_port
    }

    /// Index of the claimed hardware socket.
    pub fn socket(&self) -> Option<u8> {
        self.socket
    }

    #[allow(missing_docs)]
    pub fn has_socket(&self) -> bool {
        self.socket.is_some()
    }

    /// Status seen by the last poll.
    pub fn last_status(&self) -> SocketStatus {
        self.last_status
    }

    /// Claim an unused hardware socket and start listening on it. Returns false if this
    /// already has a socket, none is free, or listening fails.
    pub fn pick_closed_socket<P: PlatformEthernet + ?Sized>(&mut self, platform: &mut P) -> bool {
        if self.has_socket() {
            return false;
        }
        self.last_status = SocketStatus::Closed;

        let Some(socket) = platform.find_unused_socket() else {
            warn!("no free socket for port {}", self.config.tcp_port);
            return false;
        };
        self.socket = Some(socket);
        if self.begin_listening(platform) {
            return true;
        }
        self.socket = None;
        false
    }

    /// True from the arrival of a connection until its final close.
    pub fn is_connected<P: PlatformEthernet + ?Sized>(&self, platform: &mut P) -> bool {
        match self.socket {
            Some(socket) => {
                SocketStatus::from_register(platform.socket_status(socket)).is_in_tcp_lifecycle()
            }
            None => false,
        }
    }

    fn begin_listening<P: PlatformEthernet + ?Sized>(&mut self, platform: &mut P) -> bool {
        let Some(socket) = self.socket else {
            return false;
        };
        let port = self.config.tcp_port;
        if platform.is_tcp_listener(socket, port) {
            return true;
        } else if self.is_connected(platform) {
            return false;
        }

        debug_assert!(!self.connection_announced);
        platform.close_socket(socket);
        if platform.initialize_tcp_listener_socket(socket, port) {
            self.last_status = SocketStatus::from_register(platform.socket_status(socket));
            info!("listening for {} on socket {}", port, socket);
            debug_assert_eq!(self.last_status, SocketStatus::Listen);
            true
        } else {
            self.last_status = SocketStatus::from_register(platform.socket_status(socket));
            warn!("listen for {} failed with socket {}", port, socket);
            false
        }
    }

    /// Poll the hardware socket and tell `listener` about whatever changed.
    pub fn perform_io<P, K, L>(&mut self, platform: &mut P, clock: &K, listener: &mut L)
    where
        P: PlatformEthernet + ?Sized,
        K: Clock + ?Sized,
        L: ServerSocketListener + ?Sized,
    {
        let Some(socket) = self.socket else {
            return;
        };
        let status = SocketStatus::from_register(platform.socket_status(socket));
        let past_status = self.last_status;
        let is_open = status.is_open();
        let was_open = past_status.is_open();
        self.last_status = status;

        if status != past_status {
            debug!("socket {}: {} -> {}", socket, past_status, status);
        }

        if was_open && !is_open {
            // The connection went away. Handle the new status on the next poll.
            self.announce_disconnect(clock, listener);
            return;
        }

        match status {
            SocketStatus::Closed => {
                self.begin_listening(platform);
            }
            SocketStatus::Listen => {}
            SocketStatus::SynRecv => {
                // The chip completes the handshake by itself.
                self.last_status = SocketStatus::Listen;
            }
            SocketStatus::Established => {
                if !was_open {
                    self.announce_connect(platform, clock, listener, socket);
                } else if self.disconnect.disconnected {
                    self.detect_close_timeout(platform, clock, listener, socket);
                } else {
                    self.announce_can_read(platform, clock, listener, socket);
                }
            }
            SocketStatus::CloseWait => {
                if !was_open {
                    self.announce_connect(platform, clock, listener, socket);
                } else if self.disconnect.disconnected {
                    self.detect_close_timeout(platform, clock, listener, socket);
                } else {
                    self.handle_close_wait(platform, clock, listener, socket);
                }
            }
            SocketStatus::FinWait
            | SocketStatus::Closing
            | SocketStatus::TimeWait
            | SocketStatus::LastAck => {
                self.detect_close_timeout(platform, clock, listener, socket);
            }
            SocketStatus::Init => {
                warn!("socket {} in INIT, listen setup incomplete", socket);
                if past_status == SocketStatus::Init {
                    self.close_hardware_socket(platform, clock, listener, socket);
                }
            }
            SocketStatus::SynSent
            | SocketStatus::Udp
            | SocketStatus::IpRaw
            | SocketStatus::MacRaw
            | SocketStatus::Pppoe
            | SocketStatus::Unknown(_) => {
                warn!("socket {} has unexpected status {}", socket, status);
                self.close_hardware_socket(platform, clock, listener, socket);
            }
        }
    }

    fn announce_connect<P, K, L>(&mut self, platform: &mut P, clock: &K, listener: &mut L, socket: u8)
    where
        P: PlatformEthernet + ?Sized,
        K: Clock + ?Sized,
        L: ServerSocketListener + ?Sized,
    {
        self.disconnect.reset();
        self.connection_announced = true;
        self.half_close_announced = false;
        debug!("connection on socket {}", socket);

        let mut connection = TcpServerConnection {
            platform,
            clock,
            socket,
            disconnect: &mut self.disconnect,
        };
        listener.on_connect(&mut connection);
    }

    fn announce_can_read<P, K, L>(&mut self, platform: &mut P, clock: &K, listener: &mut L, socket: u8)
    where
        P: PlatformEthernet + ?Sized,
        K: Clock + ?Sized,
        L: ServerSocketListener + ?Sized,
    {
        let mut connection = TcpServerConnection {
            platform,
            clock,
            socket,
            disconnect: &mut self.disconnect,
        };
        listener.on_can_read(&mut connection);
    }

    fn handle_close_wait<P, K, L>(&mut self, platform: &mut P, clock: &K, listener: &mut L, socket: u8)
    where
        P: PlatformEthernet + ?Sized,
        K: Clock + ?Sized,
        L: ServerSocketListener + ?Sized,
    {
        if platform.available(socket) > 0 {
            // The peer's last bytes are still buffered in the chip.
            self.announce_can_read(platform, clock, listener, socket);
        } else if !self.half_close_announced {
            self.half_close_announced = true;
            debug!("socket {} half closed", socket);
            let mut connection = TcpServerConnection {
                platform,
                clock,
                socket,
                disconnect: &mut self.disconnect,
            };
            listener.on_half_closed(&mut connection);
        }
    }

    fn announce_disconnect<K, L>(&mut self, clock: &K, listener: &mut L)
    where
        K: Clock + ?Sized,
        L: ServerSocketListener + ?Sized,
    {
        self.disconnect.record_disconnect(clock);
        if self.connection_announced {
            self.connection_announced = false;
            debug!("disconnect on socket {}", self.socket);
            listener.on_disconnect();
        }
    }

    fn detect_close_timeout<P, K, L>(&mut self, platform: &mut P, clock: &K, listener: &mut L, socket: u8)
    where
        P: PlatformEthernet + ?Sized,
        K: Clock + ?Sized,
        L: ServerSocketListener + ?Sized,
    {
        if !self.disconnect.disconnected {
            // Closing without the server having asked for it. Time it all the same.
            self.disconnect.record_disconnect(clock);
            return;
        }
        let elapsed = clock.elapsed_millis(self.disconnect.disconnect_time_millis);
        if elapsed > self.config.disconnect_timeout_millis {
            warn!("socket {} still closing after {} ms, closing it", socket, elapsed);
            self.close_hardware_socket(platform, clock, listener, socket);
        }
    }

    fn close_hardware_socket<P, K, L>(&mut self, platform: &mut P, clock: &K, listener: &mut L, socket: u8)
    where
        P: PlatformEthernet + ?Sized,
        K: Clock + ?Sized,
        L: ServerSocketListener + ?Sized,
    {
        self.announce_disconnect(clock, listener);
        platform.close_socket(socket);
        self.last_status = SocketStatus::from_register(platform.socket_status(socket));
        debug_assert_eq!(self.last_status, SocketStatus::Closed);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::test_support::{FakeEthernet, ManualClock, RecordingListener, SocketEvent};

    const PORT: u16 = 11111;

    fn listening_socket(platform: &mut FakeEthernet) -> ServerSocket {
        let mut server_socket = ServerSocket::new(ServerSocketConfig::new(PORT));
        assert!(server_socket.pick_closed_socket(platform));
        server_socket
    }

    #[test]
    fn test_pick_closed_socket() {
        let mut platform = FakeEthernet::new(2);
        platform.set_status(0, SocketStatus::Established);

        let mut server_socket = listening_socket(&mut platform);
        assert_eq!(server_socket.socket(), Some(1));
        assert_eq!(platform.status(1), SocketStatus::Listen);
        assert_eq!(platform.socket(1).port, Some(PORT));
        assert_eq!(server_socket.last_status(), SocketStatus::Listen);
        assert!(!server_socket.pick_closed_socket(&mut platform));

        let mut other = ServerSocket::new(ServerSocketConfig::new(80));
        assert!(!other.pick_closed_socket(&mut platform));
        assert!(!other.has_socket());
    }

    #[test]
    fn test_listen_refused() {
        let mut platform = FakeEthernet::new(1);
        platform.refuse_listen = true;
        let mut server_socket = ServerSocket::new(ServerSocketConfig::default());
        assert!(!server_socket.pick_closed_socket(&mut platform));
        assert!(!server_socket.has_socket());
    }

    #[test]
    fn test_connect_read_half_close() {
        let mut platform = FakeEthernet::new(1);
        let clock = ManualClock::new(0);
        let mut listener = RecordingListener::default();
        let mut server_socket = listening_socket(&mut platform);

        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert!(listener.events.is_empty());

        platform.set_status(0, SocketStatus::SynRecv);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert!(listener.events.is_empty());
        assert!(server_socket.is_connected(&mut platform));

        platform.set_status(0, SocketStatus::Established);
        platform.receive(0, b"GET /");
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(listener.events, [SocketEvent::Connect(0)]);

        server_socket.perform_io(&mut platform, &clock, &mut listener);
        platform.receive(0, b" HTTP/1.1");
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(listener.count(&SocketEvent::CanRead(0)), 2);
        assert_eq!(listener.received, b"GET / HTTP/1.1");

        platform.set_status(0, SocketStatus::CloseWait);
        for _ in 0..3 {
            server_socket.perform_io(&mut platform, &clock, &mut listener);
        }
        assert_eq!(listener.count(&SocketEvent::HalfClosed(0)), 1);
        assert_eq!(listener.count(&SocketEvent::Connect(0)), 1);

        // The peer resets the connection.
        platform.set_status(0, SocketStatus::Closed);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(listener.events.last(), Some(&SocketEvent::Disconnect));
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Listen);
        assert_eq!(listener.count(&SocketEvent::Disconnect), 1);
    }

    #[test]
    fn test_close_wait_drains_input_first() {
        let mut platform = FakeEthernet::new(1);
        let clock = ManualClock::new(0);
        let mut listener = RecordingListener {
            close_on_half_closed: true,
            ..Default::default()
        };
        let mut server_socket = listening_socket(&mut platform);

        platform.set_status(0, SocketStatus::Established);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        platform.receive(0, b"abc");
        platform.set_status(0, SocketStatus::CloseWait);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(
            listener.events,
            [
                SocketEvent::Connect(0),
                SocketEvent::CanRead(0),
                SocketEvent::HalfClosed(0)
            ]
        );
        assert_eq!(listener.received, b"abc");
        assert_eq!(platform.socket(0).disconnects, 1);
        assert_eq!(platform.status(0), SocketStatus::LastAck);

        // The peer acknowledges our FIN.
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(listener.events.last(), Some(&SocketEvent::Disconnect));
        platform.set_status(0, SocketStatus::Closed);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Listen);
        assert_eq!(listener.count(&SocketEvent::Disconnect), 1);
    }

    #[test]
    fn test_listener_close_times_out() {
        let mut platform = FakeEthernet::new(1);
        let clock = ManualClock::new(1000);
        let mut listener = RecordingListener {
            close_on_can_read: true,
            ..Default::default()
        };
        let mut server_socket = listening_socket(&mut platform);
        let closes = platform.socket(0).closes;

        platform.set_status(0, SocketStatus::Established);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::FinWait);

        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(
            listener.events,
            [
                SocketEvent::Connect(0),
                SocketEvent::CanRead(0),
                SocketEvent::Disconnect
            ]
        );

        clock.advance(4000);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::FinWait);

        clock.advance(1001);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.socket(0).closes, closes + 1);
        assert_eq!(platform.status(0), SocketStatus::Closed);

        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Listen);
        assert_eq!(listener.count(&SocketEvent::Disconnect), 1);
    }

    #[test]
    fn test_ignored_disconnect_is_forced() {
        let mut platform = FakeEthernet::new(1);
        platform.ignore_disconnect = true;
        let clock = ManualClock::new(0);
        let mut listener = RecordingListener {
            close_on_can_read: true,
            ..Default::default()
        };
        let mut server_socket =
            ServerSocket::new(ServerSocketConfig::new(PORT).with_disconnect_timeout(100));
        assert!(server_socket.pick_closed_socket(&mut platform));

        platform.set_status(0, SocketStatus::Established);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        platform.receive(0, b"more");
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(listener.count(&SocketEvent::CanRead(0)), 1);
        assert!(listener.received.is_empty());

        clock.advance(101);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Closed);
        assert_eq!(listener.events.last(), Some(&SocketEvent::Disconnect));
        assert_eq!(listener.count(&SocketEvent::Disconnect), 1);
    }

    #[test]
    fn test_closed_connection_refuses_io() {
        struct ClosingListener {
            results: std::vec::Vec<Result<usize, ConnectionError>>,
        }

        impl crate::socket_listener::SocketListener for ClosingListener {
            fn on_can_read(&mut self, connection: &mut dyn Connection) {
                self.results.push(connection.write(b"bye"));
                connection.close();
                self.results.push(connection.write(b"again"));
                self.results.push(connection.read(&mut [0u8; 4]));
                self.results.push(connection.available());
                assert!(!connection.connected());
            }

            fn on_half_closed(&mut self, _connection: &mut dyn Connection) {}

            fn on_disconnect(&mut self) {}
        }

        impl ServerSocketListener for ClosingListener {
            fn on_connect(&mut self, connection: &mut dyn Connection) {
                assert!(connection.connected());
                assert!(!connection.peer_half_closed());
            }
        }

        let mut platform = FakeEthernet::new(1);
        let clock = ManualClock::new(0);
        let mut listener = ClosingListener {
            results: std::vec::Vec::new(),
        };
        let mut server_socket = listening_socket(&mut platform);
        platform.set_status(0, SocketStatus::Established);
        platform.receive(0, b"x");
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        server_socket.perform_io(&mut platform, &clock, &mut listener);

        assert_eq!(
            listener.results,
            [
                Ok(3),
                Err(ConnectionError::NotConnected),
                Err(ConnectionError::NotConnected),
                Err(ConnectionError::NotConnected)
            ]
        );
        assert_eq!(platform.sent(0), b"bye");
    }

    #[test]
    fn test_unexpected_status_closes_socket() {
        let mut platform = FakeEthernet::new(1);
        let clock = ManualClock::new(0);
        let mut listener = RecordingListener::default();
        let mut server_socket = listening_socket(&mut platform);

        platform.set_status(0, SocketStatus::Udp);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Closed);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Listen);

        platform.set_status(0, SocketStatus::Init);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Init);
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Closed);

        platform.set_status(0, SocketStatus::Unknown(0x01));
        server_socket.perform_io(&mut platform, &clock, &mut listener);
        assert_eq!(platform.status(0), SocketStatus::Closed);
        assert!(listener.events.is_empty());
    }
}
