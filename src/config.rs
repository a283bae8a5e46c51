//! Compile time limits and the runtime knobs of the decoder and server sockets.

/// TCP port the Alpaca API is served on unless configured otherwise.
pub const ALPACA_HTTP_PORT: u16 = 11111;

/// Number of extra (not built-in) parameters an [`AlpacaRequest`](crate::alpaca_request::AlpacaRequest)
/// can hold.
pub const EXTRA_PARAMETER_SLOTS: usize = 4;

/// Longest parameter name kept in an extra parameter slot.
pub const MAX_EXTRA_PARAMETER_NAME_LENGTH: usize = 20;

/// Longest parameter value kept in an extra parameter slot.
pub const MAX_EXTRA_PARAMETER_VALUE_LENGTH: usize = 32;

/// Largest request body accepted by default.
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 255;

/// Default size of a connection's receive buffer. It is also the largest header line value the
/// decoder can examine.
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 255;

/// How long a socket may linger in the closing states after the server has started a
/// disconnect, before the hardware socket is closed outright.
pub const DISCONNECT_TIMEOUT_MILLIS: u32 = 5000;

/// Runtime options of the request decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderConfig {
    /// Keep parameters without built-in decoding in the request's extra parameter slots. When
    /// false they are ignored.
    pub allow_extra_parameters: bool,
    /// Requests with a larger `Content-Length` are rejected with 413.
    pub max_payload_size: usize,
}

impl DecoderConfig {
    #[allow(missing_docs)]
    pub const fn new() -> Self {
        Self {
            allow_extra_parameters: true,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }

    /// Whether unrecognized parameters are kept in `extra_parameters` rather than ignored.
    pub const fn with_extra_parameters(mut self, allow: bool) -> Self {
        self.allow_extra_parameters = allow;
        self
    }

    /// Largest `Content-Length` accepted. Larger bodies get 413.
    pub const fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime options of a [`ServerSocket`](crate::server_socket::ServerSocket).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServerSocketConfig {
    /// Port to listen on.
    pub tcp_port: u16,
    /// See [`DISCONNECT_TIMEOUT_MILLIS`].
    pub disconnect_timeout_millis: u32,
}

impl ServerSocketConfig {
    #[allow(missing_docs)]
    pub const fn new(tcp_port: u16) -> Self {
        Self {
            tcp_port,
            disconnect_timeout_millis: DISCONNECT_TIMEOUT_MILLIS,
        }
    }

    /// How long to wait for the peer to finish closing before the socket is closed anyway.
    pub const fn with_disconnect_timeout(mut self, millis: u32) -> Self {
        self.disconnect_timeout_millis = millis;
        self
    }
}

impl Default for ServerSocketConfig {
    fn default() -> Self {
        Self::new(ALPACA_HTTP_PORT)
    }
}
