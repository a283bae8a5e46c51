pub(crate) const HTAB: u8 = 9;
pub(crate) const LF: u8 = 10;
pub(crate) const CR: u8 = 13;
pub(crate) const SP: u8 = 32;
pub(crate) const AMPERSAND: u8 = 38;
pub(crate) const SLASH: u8 = 47;
pub(crate) const ZERO: u8 = 48;
pub(crate) const COLON: u8 = 58;
pub(crate) const EQUALS: u8 = 61;
pub(crate) const QUESTION: u8 = 63;

pub(crate) const CRLF: &[u8] = &[CR, LF];

/// Characters of a header name, parameter name or path segment. Only the subset needed to
/// match the Alpaca keywords; anything else terminates the name.
pub(crate) fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'.')
}

/// Characters allowed in a url encoded parameter value, in the query string or the body.
pub(crate) fn is_param_value_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'+' | b'_' | b'=' | b'%' | b'.')
}

/// RFC 7230 field-content: visible characters, space and tab.
pub(crate) fn is_field_content(c: u8) -> bool {
    (SP..0x7f).contains(&c) || c == HTAB
}

pub(crate) fn is_optional_whitespace(c: u8) -> bool {
    c == SP || c == HTAB
}

pub(crate) fn is_end_of_path(c: u8) -> bool {
    c == SP || c == QUESTION
}

pub(crate) fn is_param_separator(c: u8) -> bool {
    c == AMPERSAND
}

/// Decimal rendering of an unsigned integer without allocating.
pub(crate) struct AsciiInt {
    buf: [u8; 20],
    start: usize,
}

impl AsciiInt {
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

impl From<u64> for AsciiInt {
    fn from(value: u64) -> Self {
        let mut buf = [SP; 20];
        let mut start = buf.len();
        let mut int = value;

        loop {
            start -= 1;
            buf[start] = (int % 10) as u8 + ZERO;
            int /= 10;
            if int == 0 {
                break;
            }
        }

        AsciiInt { buf, start }
    }
}
