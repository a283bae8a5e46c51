use crate::config::{DEFAULT_INPUT_BUFFER_SIZE, DecoderConfig, ServerSocketConfig};
use crate::platform::{Clock, PlatformEthernet};
use crate::request_listener::RequestListener;
use crate::server_connection::ServerConnection;
use crate::server_socket::ServerSocket;

/// A [`ServerSocket`] paired with the [`ServerConnection`] which decodes the requests arriving
/// on it.
#[derive(Debug)]
pub struct ServerSocketAndConnection<const BUF: usize = DEFAULT_INPUT_BUFFER_SIZE> {
    socket: ServerSocket,
    connection: ServerConnection<BUF>,
}

impl<const BUF: usize> ServerSocketAndConnection<BUF> {
    #[allow(missing_docs)]
    pub const fn new(socket_config: ServerSocketConfig, decoder_config: DecoderConfig) -> Self {
        Self {
            socket: ServerSocket::new(socket_config),
            connection: ServerConnection::new(decoder_config),
        }
    }

    /// The hardware socket state machine.
    pub fn server_socket(&self) -> &ServerSocket {
        &self.socket
    }

    /// The decoder side.
    pub fn server_connection(&self) -> &ServerConnection<BUF> {
        &self.connection
    }

    #[allow(missing_docs)]
    pub fn has_socket(&self) -> bool {
        self.socket.has_socket()
    }

    /// See [`ServerSocket::pick_closed_socket`].
    pub fn pick_closed_socket<P: PlatformEthernet + ?Sized>(&mut self, platform: &mut P) -> bool {
        self.socket.pick_closed_socket(platform)
    }

    /// Poll the socket once, feeding anything that arrived to the decoder and anything decoded
    /// to `listener`.
    pub fn perform_io<P, K, R>(&mut self, platform: &mut P, clock: &K, listener: &mut R)
    where
        P: PlatformEthernet + ?Sized,
        K: Clock + ?Sized,
        R: RequestListener + ?Sized,
    {
        let mut bound = self.connection.with_listener(listener);
        self.socket.perform_io(platform, clock, &mut bound);
    }
}

/// An Alpaca HTTP server with `N` sockets listening on the same port, so up to `N` clients can
/// be connected at once.
///
/// Nothing blocks: call [`AlpacaServer::perform_io`] from the main loop, as often as possible.
pub struct AlpacaServer<P, K, R, const N: usize, const BUF: usize = DEFAULT_INPUT_BUFFER_SIZE> {
    platform: P,
    clock: K,
    listener: R,
    sockets: [ServerSocketAndConnection<BUF>; N],
}

impl<P, K, R, const N: usize, const BUF: usize> AlpacaServer<P, K, R, N, BUF>
where
    P: PlatformEthernet,
    K: Clock,
    R: RequestListener,
{
    #[allow(missing_docs)]
    pub fn new(
        platform: P,
        clock: K,
        listener: R,
        socket_config: ServerSocketConfig,
        decoder_config: DecoderConfig,
    ) -> Self {
        Self {
            platform,
            clock,
            listener,
            sockets: core::array::from_fn(|_| {
                ServerSocketAndConnection::new(socket_config, decoder_config)
            }),
        }
    }

    /// Start listening on as many sockets as possible, returning how many are listening.
    pub fn initialize(&mut self) -> usize {
        let mut count = 0;
        for socket in self.sockets.iter_mut() {
            if socket.has_socket() || socket.pick_closed_socket(&mut self.platform) {
                count += 1;
            }
        }
        if count < N {
            warn!("only {} of {} server sockets are listening", count, N);
        } else {
            info!("{} server sockets listening", count);
        }
        count
    }

    /// Poll every socket once. Sockets which couldn't be set up earlier try again.
    pub fn perform_io(&mut self) {
        for socket in self.sockets.iter_mut() {
            if socket.has_socket() {
                socket.perform_io(&mut self.platform, &self.clock, &mut self.listener);
            } else {
                socket.pick_closed_socket(&mut self.platform);
            }
        }
    }

    /// One entry per server socket.
    pub fn sockets(&self) -> &[ServerSocketAndConnection<BUF>] {
        &self.sockets
    }

    /// The Ethernet chip.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    #[allow(missing_docs)]
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    #[allow(missing_docs)]
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// The listener receiving decoded requests.
    pub fn listener(&self) -> &R {
        &self.listener
    }

    #[allow(missing_docs)]
    pub fn listener_mut(&mut self) -> &mut R {
        &mut self.listener
    }
}
