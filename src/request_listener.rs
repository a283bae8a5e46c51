use crate::alpaca_request::AlpacaRequest;
use crate::connection::Connection;
use crate::io::ConnectionIo;
use crate::response::{ErrorResponse, StatusCode};

/// Handles the requests decoded from a connection: typically dispatches them to a device and
/// writes the JSON response.
pub trait RequestListener {
    /// Called when the first bytes of a request arrive, before any are decoded. The request
    /// has just been reset.
    fn on_start_decoding(&mut self, _request: &mut AlpacaRequest) {}

    /// A complete, valid request has been decoded. Write the response to `connection` and
    /// return true to keep the connection open for another request, or false to close it.
    fn on_request_decoded(
        &mut self,
        request: &AlpacaRequest,
        connection: &mut dyn Connection,
    ) -> bool;

    /// The request could not be decoded. `request` holds whatever was decoded before the
    /// problem was found. The connection is closed afterwards.
    ///
    /// The default writes a plain text response with the status and its reason phrase.
    fn on_request_decoding_error(
        &mut self,
        status: StatusCode,
        _request: &AlpacaRequest,
        connection: &mut dyn Connection,
    ) {
        let mut io = ConnectionIo::new(connection);
        if ErrorResponse::new(status).write(&mut io).is_err() {
            debug!("unable to send {} response", status);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::test_support::StringIoConnection;

    struct Ignore;

    impl RequestListener for Ignore {
        fn on_request_decoded(&mut self, _: &AlpacaRequest, _: &mut dyn Connection) -> bool {
            true
        }
    }

    #[test]
    fn test_default_error_response() {
        let mut connection = StringIoConnection::new(0, b"", false);
        Ignore.on_request_decoding_error(
            StatusCode::NotAcceptable,
            &AlpacaRequest::new(),
            &mut connection,
        );
        assert_eq!(
            connection.output(),
            b"HTTP/1.1 406 Not Acceptable\r\nContent-Type: text/plain\r\nConnection: close\r\nContent-Length: 14\r\n\r\nNot Acceptable"
        );
    }

    #[test]
    fn test_default_error_response_on_closed_connection() {
        let mut connection = StringIoConnection::new(0, b"", false);
        connection.close();
        Ignore.on_request_decoding_error(
            StatusCode::BadRequest,
            &AlpacaRequest::new(),
            &mut connection,
        );
        assert!(connection.output().is_empty());
    }
}
