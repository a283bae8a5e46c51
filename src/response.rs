use crate::any_string::AnyString;
use crate::ascii::{AsciiInt, CRLF, SP};
use crate::literal::Literal;

const HTTP_PROTO: &[u8] = b"HTTP/1.1";
const CONTENT_TYPE_TEXT: &[u8] = b"Content-Type: text/plain\r\n";
const CONNECTION_CLOSE: &[u8] = b"Connection: close\r\n";
const CONTENT_LENGTH: &[u8] = b"Content-Length: ";

/// Returned when writing a response to the client fails.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseError {
    /// Network error writing data to the client
    NetworkError,
}

/// The HTTP status codes the request decoder can produce. Any other condition is reported as
/// [`StatusCode::InternalServerError`].
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    /// 200 OK, the request was decoded
    OK = 200,
    /// 400 Bad Request
    BadRequest = 400,
    /// 404 Not Found
    NotFound = 404,
    /// 405 Method Not Allowed
    MethodNotAllowed = 405,
    /// 406 Not Acceptable
    NotAcceptable = 406,
    /// 411 Length Required
    LengthRequired = 411,
    /// 413 Payload Too Large
    PayloadTooLarge = 413,
    /// 415 Unsupported Media Type
    UnsupportedMediaType = 415,
    /// 431 Request Header Fields Too Large
    RequestHeaderFieldsTooLarge = 431,
    /// 500 Internal Server Error
    InternalServerError = 500,
    /// 501 Not Implemented
    NotImplemented = 501,
    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported = 505,
}

impl StatusCode {
    /// Numeric value of the code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Map a numeric code onto the supported set; unsupported values become 500.
    pub fn from_u16(code: u16) -> Self {
        match code {
            200 => Self::OK,
            400 => Self::BadRequest,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            406 => Self::NotAcceptable,
            411 => Self::LengthRequired,
            413 => Self::PayloadTooLarge,
            415 => Self::UnsupportedMediaType,
            431 => Self::RequestHeaderFieldsTooLarge,
            501 => Self::NotImplemented,
            505 => Self::HttpVersionNotSupported,
            _ => Self::InternalServerError,
        }
    }

    /// Anything other than 200.
    pub fn is_error(self) -> bool {
        self != Self::OK
    }

    #[rustfmt::skip]
    #[allow(missing_docs)]
    pub fn reason_phrase(self) -> Literal {
        Literal::new(match self {
            Self::OK => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::NotAcceptable => "Not Acceptable",
            Self::LengthRequired => "Length Required",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::UnsupportedMediaType => "Unsupported Media Type",
            Self::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
            Self::HttpVersionNotSupported => "HTTP Version Not Supported",
        })
    }
}

/// A minimal plain text response, used to report a request which could not be decoded. The
/// response always asks the client to close the connection.
///
/// ```
/// use alpacalite::response::{ErrorResponse, StatusCode};
///
/// let mut out = [0u8; 128];
/// let mut writer = &mut out[..];
/// ErrorResponse::new(StatusCode::NotFound).write(&mut writer).unwrap();
/// let remaining = writer.len();
/// let written = &out[..out.len() - remaining];
/// assert!(written.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
/// assert!(written.ends_with(b"\r\n\r\nNot Found"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ErrorResponse<'a> {
    status: StatusCode,
    body: AnyString<'a>,
}

impl<'a> ErrorResponse<'a> {
    /// Response whose body is the reason phrase of `status`.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: status.reason_phrase().into(),
        }
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<AnyString<'a>>) -> Self {
        self.body = body.into();
        self
    }

    #[allow(missing_docs)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn parts<'s>(&'s self, code: &'s AsciiInt, length: &'s AsciiInt) -> [&'s [u8]; 13] {
        [
            HTTP_PROTO,
            &[SP],
            code.as_bytes(),
            &[SP],
            self.status.reason_phrase().as_bytes(),
            CRLF,
            CONTENT_TYPE_TEXT,
            CONNECTION_CLOSE,
            CONTENT_LENGTH,
            length.as_bytes(),
            CRLF,
            CRLF,
            self.body.as_bytes(),
        ]
    }

    /// Write the whole response with a blocking writer.
    pub fn write<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), ResponseError> {
        let code = AsciiInt::from(self.status.as_u16() as u64);
        let length = AsciiInt::from(self.body.len() as u64);

        for part in self.parts(&code, &length) {
            writer
                .write_all(part)
                .or(Err(ResponseError::NetworkError))?;
        }
        writer.flush().or(Err(ResponseError::NetworkError))
    }

    /// Write the whole response with an async writer.
    pub async fn write_async<W: embedded_io_async::Write>(
        &self,
        writer: &mut W,
    ) -> Result<(), ResponseError> {
        let code = AsciiInt::from(self.status.as_u16() as u64);
        let length = AsciiInt::from(self.body.len() as u64);

        for part in self.parts(&code, &length) {
            writer
                .write_all(part)
                .await
                .or(Err(ResponseError::NetworkError))?;
        }
        writer.flush().await.or(Err(ResponseError::NetworkError))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use embedded_io_async::{ErrorKind, ErrorType};

    use super::*;

    struct TestWriter<'a> {
        inner: &'a mut Vec<u8>,
        fail: bool,
    }

    impl<'a> ErrorType for TestWriter<'a> {
        type Error = ErrorKind;
    }

    impl<'a> embedded_io_async::Write for TestWriter<'a> {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.fail {
                return Err(ErrorKind::ConnectionReset);
            }
            self.inner.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::OK.as_u16(), 200);
        assert_eq!(StatusCode::RequestHeaderFieldsTooLarge.as_u16(), 431);
        assert_eq!(StatusCode::from_u16(413), StatusCode::PayloadTooLarge);
        assert_eq!(StatusCode::from_u16(418), StatusCode::InternalServerError);
        assert_eq!(StatusCode::from_u16(0), StatusCode::InternalServerError);
        assert!(!StatusCode::OK.is_error());
        assert!(StatusCode::NotImplemented.is_error());
        assert_eq!(
            StatusCode::HttpVersionNotSupported.reason_phrase().as_bytes(),
            b"HTTP Version Not Supported"
        );
    }

    #[test]
    fn test_blocking_write() {
        let mut out = Vec::<u8>::new();
        ErrorResponse::new(StatusCode::BadRequest)
            .write(&mut out)
            .unwrap();
        assert_eq!(
            out.as_slice(),
            "HTTP/1.1 400 Bad Request\r
Content-Type: text/plain\r
Connection: close\r
Content-Length: 11\r
\r
Bad Request"
                .as_bytes()
        );
    }

    #[tokio::test]
    async fn test_async_write_with_body() {
        let mut out = Vec::<u8>::new();
        let mut writer = TestWriter {
            inner: &mut out,
            fail: false,
        };
        ErrorResponse::new(StatusCode::LengthRequired)
            .with_body(Literal::new("PUT needs Content-Length"))
            .write_async(&mut writer)
            .await
            .unwrap();
        assert!(out.starts_with(b"HTTP/1.1 411 Length Required\r\n"));
        assert!(out.ends_with(b"Content-Length: 24\r\n\r\nPUT needs Content-Length"));
    }

    #[tokio::test]
    async fn test_async_write_network_error() {
        let mut out = Vec::<u8>::new();
        let mut writer = TestWriter {
            inner: &mut out,
            fail: true,
        };
        assert_eq!(
            ErrorResponse::new(StatusCode::NotFound)
                .write_async(&mut writer)
                .await,
            Err(ResponseError::NetworkError)
        );
    }
}
