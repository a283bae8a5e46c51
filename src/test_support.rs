//! Test doubles shared by the unit tests.

extern crate std;

use core::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::alpaca_request::AlpacaRequest;
use crate::connection::{Connection, ConnectionError};
use crate::platform::{Clock, PlatformEthernet, SocketStatus};
use crate::request_listener::RequestListener;
use crate::response::StatusCode;
use crate::socket_listener::{ServerSocketListener, SocketListener};

/// A connection reading from a byte string and writing into a vector.
pub(crate) struct StringIoConnection {
    socket: u8,
    input: VecDeque<u8>,
    output: Vec<u8>,
    is_open: bool,
    half_closed: bool,
    max_read: usize,
}

impl StringIoConnection {
    pub(crate) fn new(socket: u8, input: &[u8], half_closed: bool) -> Self {
        Self {
            socket,
            input: input.iter().copied().collect(),
            output: Vec::new(),
            is_open: true,
            half_closed,
            max_read: usize::MAX,
        }
    }

    /// Limit the number of bytes returned by each read.
    pub(crate) fn with_max_read(mut self, max_read: usize) -> Self {
        self.max_read = max_read;
        self
    }

    pub(crate) fn push_input(&mut self, input: &[u8]) {
        self.input.extend(input);
    }

    pub(crate) fn set_half_closed(&mut self) {
        self.half_closed = true;
    }

    pub(crate) fn remaining_input(&self) -> Vec<u8> {
        self.input.iter().copied().collect()
    }

    pub(crate) fn output(&self) -> &[u8] {
        &self.output
    }

    pub(crate) fn is_open(&self) -> bool {
        self.is_open
    }
}

impl Connection for StringIoConnection {
    fn available(&mut self) -> Result<usize, ConnectionError> {
        if !self.is_open {
            return Err(ConnectionError::NotConnected);
        }
        Ok(self.input.len())
    }

    fn peek(&mut self) -> Result<Option<u8>, ConnectionError> {
        if !self.is_open {
            return Err(ConnectionError::NotConnected);
        }
        Ok(self.input.front().copied())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ConnectionError> {
        if !self.is_open {
            return Err(ConnectionError::NotConnected);
        }
        let count = buf.len().min(self.input.len()).min(self.max_read);
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..count)) {
            *slot = byte;
        }
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, ConnectionError> {
        if !self.is_open {
            return Err(ConnectionError::NotConnected);
        }
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn close(&mut self) {
        self.is_open = false;
    }

    fn connected(&mut self) -> bool {
        self.is_open
    }

    fn peer_half_closed(&mut self) -> bool {
        self.is_open && self.input.is_empty() && self.half_closed
    }

    fn socket_index(&self) -> u8 {
        self.socket
    }
}

/// State of one socket of [`FakeEthernet`].
#[derive(Debug, Default)]
pub(crate) struct FakeSocket {
    pub(crate) status: u8,
    pub(crate) port: Option<u16>,
    pub(crate) rx: VecDeque<u8>,
    pub(crate) tx: Vec<u8>,
    pub(crate) disconnects: usize,
    pub(crate) closes: usize,
}

/// A scriptable Ethernet chip. Tests move sockets between states with `set_status`, as the
/// peer's actions would.
#[derive(Debug)]
pub(crate) struct FakeEthernet {
    pub(crate) sockets: Vec<FakeSocket>,
    pub(crate) refuse_listen: bool,
    /// Leave the socket open when asked to disconnect, as if the FIN was never sent.
    pub(crate) ignore_disconnect: bool,
}

impl FakeEthernet {
    pub(crate) fn new(socket_count: usize) -> Self {
        Self {
            sockets: (0..socket_count).map(|_| FakeSocket::default()).collect(),
            refuse_listen: false,
            ignore_disconnect: false,
        }
    }

    pub(crate) fn socket(&self, socket: u8) -> &FakeSocket {
        &self.sockets[socket as usize]
    }

    pub(crate) fn status(&self, socket: u8) -> SocketStatus {
        SocketStatus::from_register(self.socket(socket).status)
    }

    pub(crate) fn set_status(&mut self, socket: u8, status: SocketStatus) {
        self.sockets[socket as usize].status = status.register();
    }

    /// Bytes arriving from the peer.
    pub(crate) fn receive(&mut self, socket: u8, input: &[u8]) {
        self.sockets[socket as usize].rx.extend(input);
    }

    pub(crate) fn sent(&self, socket: u8) -> &[u8] {
        &self.socket(socket).tx
    }
}

impl PlatformEthernet for FakeEthernet {
    fn find_unused_socket(&mut self) -> Option<u8> {
        self.sockets
            .iter()
            .position(|s| SocketStatus::from_register(s.status) == SocketStatus::Closed)
            .map(|index| index as u8)
    }

    fn socket_status(&mut self, socket: u8) -> u8 {
        self.socket(socket).status
    }

    fn initialize_tcp_listener_socket(&mut self, socket: u8, port: u16) -> bool {
        if self.refuse_listen {
            return false;
        }
        let s = &mut self.sockets[socket as usize];
        s.status = SocketStatus::Listen.register();
        s.port = Some(port);
        true
    }

    fn is_tcp_listener(&mut self, socket: u8, port: u16) -> bool {
        self.status(socket) == SocketStatus::Listen && self.socket(socket).port == Some(port)
    }

    fn disconnect_socket(&mut self, socket: u8) {
        let ignore = self.ignore_disconnect;
        let s = &mut self.sockets[socket as usize];
        s.disconnects += 1;
        if ignore {
            return;
        }
        s.status = match SocketStatus::from_register(s.status) {
            SocketStatus::Established => SocketStatus::FinWait.register(),
            SocketStatus::CloseWait => SocketStatus::LastAck.register(),
            _ => s.status,
        };
    }

    fn close_socket(&mut self, socket: u8) {
        let s = &mut self.sockets[socket as usize];
        s.closes += 1;
        s.status = SocketStatus::Closed.register();
        s.port = None;
        s.rx.clear();
    }

    fn is_open_for_writing(&mut self, socket: u8) -> bool {
        self.status(socket).is_open()
    }

    fn available(&mut self, socket: u8) -> usize {
        self.socket(socket).rx.len()
    }

    fn peek(&mut self, socket: u8) -> Option<u8> {
        self.socket(socket).rx.front().copied()
    }

    fn read(&mut self, socket: u8, buf: &mut [u8]) -> usize {
        let rx = &mut self.sockets[socket as usize].rx;
        let count = buf.len().min(rx.len());
        for (slot, byte) in buf.iter_mut().zip(rx.drain(..count)) {
            *slot = byte;
        }
        count
    }

    fn write(&mut self, socket: u8, buf: &[u8]) -> usize {
        self.sockets[socket as usize].tx.extend_from_slice(buf);
        buf.len()
    }
}

/// A clock which only moves when told to.
pub(crate) struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub(crate) fn new(now: u32) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub(crate) fn advance(&self, millis: u32) {
        self.now.set(self.now.get().wrapping_add(millis));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u32 {
        self.now.get()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SocketEvent {
    Connect(u8),
    CanRead(u8),
    HalfClosed(u8),
    Disconnect,
}

/// Records the socket events it receives. Reads all available input on each `on_can_read`.
#[derive(Default)]
pub(crate) struct RecordingListener {
    pub(crate) events: Vec<SocketEvent>,
    pub(crate) received: Vec<u8>,
    pub(crate) close_on_can_read: bool,
    pub(crate) close_on_half_closed: bool,
}

impl RecordingListener {
    pub(crate) fn count(&self, event: &SocketEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl SocketListener for RecordingListener {
    fn on_can_read(&mut self, connection: &mut dyn Connection) {
        self.events.push(SocketEvent::CanRead(connection.socket_index()));
        let mut buf = [0u8; 32];
        while let Ok(count @ 1..) = connection.read(&mut buf) {
            self.received.extend_from_slice(&buf[..count]);
        }
        if self.close_on_can_read {
            connection.close();
        }
    }

    fn on_half_closed(&mut self, connection: &mut dyn Connection) {
        self.events
            .push(SocketEvent::HalfClosed(connection.socket_index()));
        if self.close_on_half_closed {
            connection.close();
        }
    }

    fn on_disconnect(&mut self) {
        self.events.push(SocketEvent::Disconnect);
    }
}

impl ServerSocketListener for RecordingListener {
    fn on_connect(&mut self, connection: &mut dyn Connection) {
        self.events.push(SocketEvent::Connect(connection.socket_index()));
    }
}

/// Keeps a copy of each decoded request and answers it with `OK`. Errors get the default
/// response.
pub(crate) struct RecordingRequestListener {
    pub(crate) keep_open: bool,
    pub(crate) started: usize,
    pub(crate) decoded: Vec<AlpacaRequest>,
    pub(crate) errors: Vec<StatusCode>,
}

impl RecordingRequestListener {
    pub(crate) fn new(keep_open: bool) -> Self {
        Self {
            keep_open,
            started: 0,
            decoded: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl RequestListener for RecordingRequestListener {
    fn on_start_decoding(&mut self, _request: &mut AlpacaRequest) {
        self.started += 1;
    }

    fn on_request_decoded(
        &mut self,
        request: &AlpacaRequest,
        connection: &mut dyn Connection,
    ) -> bool {
        self.decoded.push(request.clone());
        let _ = connection.write(b"OK");
        self.keep_open
    }

    fn on_request_decoding_error(
        &mut self,
        status: StatusCode,
        _request: &AlpacaRequest,
        connection: &mut dyn Connection,
    ) {
        self.errors.push(status);
        crate::response::ErrorResponse::new(status)
            .write(&mut crate::io::ConnectionIo::new(connection))
            .ok();
    }
}
