//! The hardware the server runs on: a TCP offload chip with a small number of sockets, and a
//! millisecond clock.
//!
//! Socket status values are those of the WIZnet W5500 `Sn_SR` register. Other chips are
//! supported by translating their socket states into these values.

/// Value of a socket's status register.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SocketStatus {
    Closed,
    Init,
    Listen,
    SynSent,
    SynRecv,
    Established,
    FinWait,
    Closing,
    TimeWait,
    CloseWait,
    LastAck,
    Udp,
    IpRaw,
    MacRaw,
    Pppoe,
    /// A value with no meaning for a TCP socket.
    Unknown(u8),
}

impl SocketStatus {
    /// Decode a status register value.
    pub const fn from_register(value: u8) -> Self {
        match value {
            0x00 => Self::Closed,
            0x13 => Self::Init,
            0x14 => Self::Listen,
            0x15 => Self::SynSent,
            0x16 => Self::SynRecv,
            0x17 => Self::Established,
            0x18 => Self::FinWait,
            0x1A => Self::Closing,
            0x1B => Self::TimeWait,
            0x1C => Self::CloseWait,
            0x1D => Self::LastAck,
            0x22 => Self::Udp,
            0x32 => Self::IpRaw,
            0x42 => Self::MacRaw,
            0x5F => Self::Pppoe,
            other => Self::Unknown(other),
        }
    }

    /// Encode as a status register value.
    pub const fn register(self) -> u8 {
        match self {
            Self::Closed => 0x00,
            Self::Init => 0x13,
            Self::Listen => 0x14,
            Self::SynSent => 0x15,
            Self::SynRecv => 0x16,
            Self::Established => 0x17,
            Self::FinWait => 0x18,
            Self::Closing => 0x1A,
            Self::TimeWait => 0x1B,
            Self::CloseWait => 0x1C,
            Self::LastAck => 0x1D,
            Self::Udp => 0x22,
            Self::IpRaw => 0x32,
            Self::MacRaw => 0x42,
            Self::Pppoe => 0x5F,
            Self::Unknown(value) => value,
        }
    }

    /// A connection exists and we may still write to it.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Established | Self::CloseWait)
    }

    /// The connection is being torn down.
    pub const fn is_closing(self) -> bool {
        matches!(
            self,
            Self::FinWait | Self::Closing | Self::TimeWait | Self::LastAck
        )
    }

    /// Any state between accepting a connection and its final close.
    pub const fn is_in_tcp_lifecycle(self) -> bool {
        matches!(self, Self::SynRecv) || self.is_open() || self.is_closing()
    }
}

/// Driver for the Ethernet chip's sockets.
///
/// Sockets are identified by index. Methods take `&mut self` since talking to the chip is
/// usually a bus transaction.
pub trait PlatformEthernet {
    /// A socket which is closed and not claimed by anyone, if there is one.
    fn find_unused_socket(&mut self) -> Option<u8>;

    /// Current value of the socket's status register. See [`SocketStatus::from_register`].
    fn socket_status(&mut self, socket: u8) -> u8;

    /// Open the socket as a TCP listener on `port`. Returns false if the chip refused.
    fn initialize_tcp_listener_socket(&mut self, socket: u8, port: u16) -> bool;

    /// True if the socket is listening on `port`.
    fn is_tcp_listener(&mut self, socket: u8, port: u16) -> bool;

    /// Start a graceful close by sending FIN to the peer.
    fn disconnect_socket(&mut self, socket: u8);

    /// Close the socket immediately.
    fn close_socket(&mut self, socket: u8);

    #[allow(missing_docs)]
    fn is_open_for_writing(&mut self, socket: u8) -> bool;

    /// Bytes received and not yet read.
    fn available(&mut self, socket: u8) -> usize;

    #[allow(missing_docs)]
    fn peek(&mut self, socket: u8) -> Option<u8>;

    /// Copy received bytes into `buf`, returning the count.
    fn read(&mut self, socket: u8, buf: &mut [u8]) -> usize;

    /// Queue bytes for sending, returning how many the chip accepted.
    fn write(&mut self, socket: u8, buf: &[u8]) -> usize;

    /// Send any queued bytes.
    fn flush(&mut self, _socket: u8) {}
}

/// Source of the current time.
pub trait Clock {
    /// Milliseconds since some fixed point. Expected to wrap around.
    fn now_millis(&self) -> u32;

    /// Milliseconds since `start`, allowing for the clock having wrapped.
    fn elapsed_millis(&self, start: u32) -> u32 {
        self.now_millis().wrapping_sub(start)
    }
}
