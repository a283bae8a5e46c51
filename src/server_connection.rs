use crate::alpaca_request::AlpacaRequest;
use crate::config::{DEFAULT_INPUT_BUFFER_SIZE, DecoderConfig};
use crate::connection::Connection;
use crate::request_decoder::{DecodeStatus, RequestDecoder};
use crate::request_listener::RequestListener;
use crate::response::StatusCode;
use crate::socket_listener::{ServerSocketListener, SocketListener};
use crate::string_view::StringView;
use crate::tokens::MIN_REQUIRED_BUFFER_SIZE;

/// Reads requests from one connection at a time into a fixed size buffer, decodes them, and
/// hands the results to a [`RequestListener`].
///
/// `BUF` must be at least [`MIN_REQUIRED_BUFFER_SIZE`], so that every request fits, and at most
/// [`StringView::MAX_SIZE`].
#[derive(Debug)]
pub struct ServerConnection<const BUF: usize = DEFAULT_INPUT_BUFFER_SIZE> {
    input_buffer: [u8; BUF],
    input_size: usize,
    decoder: RequestDecoder,
    socket: Option<u8>,
    decoding_started: bool,
    between_requests: bool,
}

impl<const BUF: usize> ServerConnection<BUF> {
    const BUFFER_SIZE_IS_VALID: () = assert!(
        BUF >= MIN_REQUIRED_BUFFER_SIZE && BUF <= StringView::MAX_SIZE,
        "input buffer size out of range"
    );

    #[allow(missing_docs)]
    pub const fn new(config: DecoderConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::BUFFER_SIZE_IS_VALID;
        Self {
            input_buffer: [0; BUF],
            input_size: 0,
            decoder: RequestDecoder::new(config),
            socket: None,
            decoding_started: false,
            between_requests: true,
        }
    }

    /// Socket of the current connection.
    pub fn socket(&self) -> Option<u8> {
        self.socket
    }

    #[allow(missing_docs)]
    pub fn has_socket(&self) -> bool {
        self.socket.is_some()
    }

    /// The request being, or last, decoded.
    pub fn request(&self) -> &AlpacaRequest {
        self.decoder.request()
    }

    /// Pair with the listener which will receive decoded requests, producing the
    /// [`ServerSocketListener`] a [`ServerSocket`](crate::server_socket::ServerSocket) reports
    /// to.
    pub fn with_listener<'a, R: RequestListener + ?Sized>(
        &'a mut self,
        listener: &'a mut R,
    ) -> BoundServerConnection<'a, R, BUF> {
        BoundServerConnection {
            server_connection: self,
            listener,
        }
    }

    /// A client has connected.
    pub fn on_connect(&mut self, connection: &mut dyn Connection) {
        debug!("connect on socket {}", connection.socket_index());
        debug_assert!(!self.has_socket());
        self.socket = Some(connection.socket_index());
        self.input_size = 0;
        self.between_requests = true;
        self.reset_decoder();
    }

    /// Read whatever fits in the buffer, decode as much as possible, and report the outcome
    /// once a request is complete.
    pub fn on_can_read<R: RequestListener + ?Sized>(
        &mut self,
        listener: &mut R,
        connection: &mut dyn Connection,
    ) {
        debug_assert_eq!(self.socket, Some(connection.socket_index()));

        if self.input_size < BUF {
            match connection.read(&mut self.input_buffer[self.input_size..]) {
                Ok(0) => {}
                Ok(count) => {
                    self.input_size += count;
                    self.between_requests = false;
                }
                Err(_) => return,
            }
        }
        if self.input_size == 0 {
            return;
        }

        if !self.decoding_started {
            self.decoding_started = true;
            listener.on_start_decoding(self.decoder.request_mut());
        }

        let buffer_is_full = self.input_size == BUF;
        let mut view = StringView::new(&self.input_buffer[..self.input_size]);
        let status = self.decoder.decode_buffer(&mut view, buffer_is_full);
        let remaining = view.len();

        // Move the undecoded bytes to the front of the buffer.
        if remaining < self.input_size {
            self.input_buffer
                .copy_within(self.input_size - remaining..self.input_size, 0);
            self.input_size = remaining;
        }

        let DecodeStatus::Complete(status) = status else {
            return;
        };

        let close_connection = if status == StatusCode::OK {
            if self.input_size == 0 {
                self.between_requests = true;
            }
            let keep_open = listener.on_request_decoded(self.decoder.request(), connection);
            !keep_open || self.decoder.request().do_close
        } else {
            debug!("decoding error {} on socket {}", status, connection.socket_index());
            listener.on_request_decoding_error(status, self.decoder.request(), connection);
            true
        };

        if close_connection {
            debug!("closing connection on socket {}", connection.socket_index());
            connection.close();
            self.socket = None;
        } else {
            self.reset_decoder();
        }
    }

    /// The client won't send any more. If part of a request has arrived it can never be
    /// completed, which is reported as a bad request. Either way the connection is closed.
    pub fn on_half_closed<R: RequestListener + ?Sized>(
        &mut self,
        listener: &mut R,
        connection: &mut dyn Connection,
    ) {
        debug_assert_eq!(self.socket, Some(connection.socket_index()));
        if !self.between_requests {
            debug!("half closed mid-request on socket {}", connection.socket_index());
            listener.on_request_decoding_error(
                StatusCode::BadRequest,
                self.decoder.request(),
                connection,
            );
        }
        connection.close();
        self.socket = None;
    }

    #[allow(missing_docs)]
    pub fn on_disconnect(&mut self) {
        debug!("disconnect, socket {}", self.socket);
        self.socket = None;
    }

    fn reset_decoder(&mut self) {
        self.decoder.reset();
        self.decoding_started = false;
    }
}

/// A [`ServerConnection`] paired with its [`RequestListener`] for the duration of a poll.
pub struct BoundServerConnection<'a, R: ?Sized, const BUF: usize> {
    server_connection: &'a mut ServerConnection<BUF>,
    listener: &'a mut R,
}

impl<R: RequestListener + ?Sized, const BUF: usize> SocketListener
    for BoundServerConnection<'_, R, BUF>
{
    fn on_can_read(&mut self, connection: &mut dyn Connection) {
        self.server_connection.on_can_read(self.listener, connection);
    }

    fn on_half_closed(&mut self, connection: &mut dyn Connection) {
        self.server_connection.on_half_closed(self.listener, connection);
    }

    fn on_disconnect(&mut self) {
        self.server_connection.on_disconnect();
    }
}

impl<R: RequestListener + ?Sized, const BUF: usize> ServerSocketListener
    for BoundServerConnection<'_, R, BUF>
{
    fn on_connect(&mut self, connection: &mut dyn Connection) {
        self.server_connection.on_connect(connection);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::test_support::{RecordingRequestListener, StringIoConnection};
    use crate::tokens::{DeviceMethod, DeviceType};

    const TEMPERATURE: &[u8] =
        b"GET /api/v1/observingconditions/1/temperature?ClientID=3 HTTP/1.1\r\nHost: x\r\n\r\n";

    fn connected(connection: &mut StringIoConnection) -> ServerConnection {
        let mut server_connection = ServerConnection::new(DecoderConfig::new());
        server_connection.on_connect(connection);
        server_connection
    }

    #[test]
    fn test_decodes_requests_in_turn() {
        let mut connection = StringIoConnection::new(2, TEMPERATURE, false);
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection = connected(&mut connection);
        assert_eq!(server_connection.socket(), Some(2));

        server_connection.on_can_read(&mut listener, &mut connection);
        assert_eq!(listener.decoded.len(), 1);
        assert_eq!(listener.started, 1);
        let request = &listener.decoded[0];
        assert_eq!(request.device_type, DeviceType::ObservingConditions);
        assert_eq!(request.device_number, Some(1));
        assert_eq!(request.device_method, DeviceMethod::Temperature);
        assert_eq!(request.client_id, Some(3));
        assert!(connection.is_open());
        assert_eq!(connection.output(), b"OK");

        let (head, tail) = TEMPERATURE.split_at(30);
        connection.push_input(head);
        server_connection.on_can_read(&mut listener, &mut connection);
        assert_eq!(listener.decoded.len(), 1);
        assert_eq!(listener.started, 2);
        connection.push_input(tail);
        server_connection.on_can_read(&mut listener, &mut connection);
        assert_eq!(listener.decoded.len(), 2);
        assert_eq!(listener.started, 2);
        assert_eq!(listener.decoded[1], listener.decoded[0]);
        assert!(listener.errors.is_empty());
        assert!(connection.is_open());
        assert!(server_connection.has_socket());
    }

    #[test]
    fn test_small_reads() {
        let mut connection = StringIoConnection::new(0, TEMPERATURE, true).with_max_read(5);
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection = connected(&mut connection);

        while listener.decoded.is_empty() {
            server_connection.on_can_read(&mut listener, &mut connection);
        }
        assert_eq!(listener.decoded[0].device_method, DeviceMethod::Temperature);
        assert_eq!(listener.started, 1);
        assert!(connection.remaining_input().is_empty());

        // The whole request was consumed, so the peer's half close is not an error.
        server_connection.on_half_closed(&mut listener, &mut connection);
        assert!(listener.errors.is_empty());
        assert!(!connection.is_open());
    }

    #[test]
    fn test_half_closed_mid_request() {
        let mut connection = StringIoConnection::new(0, b"GET /api/v1/dome/0/na", true);
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection = connected(&mut connection);

        server_connection.on_can_read(&mut listener, &mut connection);
        assert!(listener.decoded.is_empty());
        server_connection.on_half_closed(&mut listener, &mut connection);
        assert_eq!(listener.errors, [StatusCode::BadRequest]);
        assert!(connection.output().starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
        assert!(!connection.is_open());
    }

    #[test]
    fn test_decoding_error_closes() {
        let mut connection = StringIoConnection::new(0, b"FOO /x HTTP/1.1\r\n\r\n", false);
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection = connected(&mut connection);

        server_connection.on_can_read(&mut listener, &mut connection);
        assert_eq!(listener.errors, [StatusCode::NotImplemented]);
        assert!(connection.output().starts_with(b"HTTP/1.1 501 Not Implemented\r\n"));
        assert!(!connection.is_open());
        assert!(!server_connection.has_socket());
    }

    #[test]
    fn test_listener_or_client_ends_connection() {
        let mut connection = StringIoConnection::new(0, TEMPERATURE, false);
        let mut listener = RecordingRequestListener::new(false);
        let mut server_connection = connected(&mut connection);
        server_connection.on_can_read(&mut listener, &mut connection);
        assert_eq!(listener.decoded.len(), 1);
        assert!(!connection.is_open());

        let mut connection = StringIoConnection::new(
            0,
            b"GET /management/apiversions HTTP/1.1\r\nConnection: close\r\n\r\n",
            false,
        );
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection = connected(&mut connection);
        server_connection.on_can_read(&mut listener, &mut connection);
        assert_eq!(listener.decoded.len(), 1);
        assert!(listener.decoded[0].do_close);
        assert!(!connection.is_open());
    }

    #[test]
    fn test_value_too_large_for_buffer() {
        let mut connection = StringIoConnection::new(
            0,
            b"GET /api/v1/camera/0/name HTTP/1.1\r\nAccept: application/json, text/plain, */*;q=0.8\r\n\r\n",
            false,
        );
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection = ServerConnection::<MIN_REQUIRED_BUFFER_SIZE>::new(DecoderConfig::new());
        server_connection.on_connect(&mut connection);

        for _ in 0..10 {
            if !connection.is_open() {
                break;
            }
            server_connection.on_can_read(&mut listener, &mut connection);
        }
        assert_eq!(listener.errors, [StatusCode::RequestHeaderFieldsTooLarge]);
        assert!(listener.decoded.is_empty());
    }

    fn decode_with_smallest_buffer(input: &[u8]) -> RecordingRequestListener {
        let mut connection = StringIoConnection::new(0, input, false);
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection =
            ServerConnection::<MIN_REQUIRED_BUFFER_SIZE>::new(DecoderConfig::new());
        server_connection.on_connect(&mut connection);

        for _ in 0..input.len() {
            if !listener.decoded.is_empty() || !connection.is_open() {
                break;
            }
            server_connection.on_can_read(&mut listener, &mut connection);
        }
        assert!(listener.errors.is_empty());
        assert!(connection.remaining_input().is_empty());
        listener
    }

    #[test]
    fn test_smallest_buffer_fits_every_request() {
        let listener = decode_with_smallest_buffer(
            b"GET /api/v1/switch/0/getswitchdescription?Id=1 HTTP/1.1\r\n\r\n",
        );
        assert_eq!(listener.decoded.len(), 1);
        assert_eq!(listener.decoded[0].device_method, DeviceMethod::GetSwitchDescription);
        assert_eq!(listener.decoded[0].id, Some(1));

        let listener = decode_with_smallest_buffer(
            b"PUT /api/v1/switch/0/setswitch HTTP/1.1\r\n\
              Content-Type: application/x-www-form-urlencoded\r\n\
              Content-Length: 15\r\n\r\nId=1&State=true",
        );
        assert_eq!(listener.decoded.len(), 1);
        let request = &listener.decoded[0];
        assert_eq!(request.device_type, DeviceType::Switch);
        assert_eq!(request.device_method, DeviceMethod::SetSwitch);
        assert_eq!(request.id, Some(1));
        assert_eq!(request.state, Some(true));
    }

    #[test]
    fn test_bound_listener() {
        let mut connection = StringIoConnection::new(4, TEMPERATURE, false);
        let mut listener = RecordingRequestListener::new(true);
        let mut server_connection: ServerConnection = ServerConnection::new(DecoderConfig::new());
        {
            let mut bound = server_connection.with_listener(&mut listener);
            bound.on_connect(&mut connection);
            bound.on_can_read(&mut connection);
            bound.on_disconnect();
        }
        assert_eq!(listener.decoded.len(), 1);
        assert!(!server_connection.has_socket());
    }
}
