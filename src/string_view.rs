use core::fmt;

/// A borrowed, read only view of a run of bytes, typically a region of a connection's receive
/// buffer. Narrowing a view (e.g. `remove_prefix`) only changes the bounds of the view, never the
/// bytes it refers to.
///
/// Positions and lengths passed to the slicing methods must be within the view; violating that
/// is a programming error which is caught by a debug assertion.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct StringView<'a> {
    bytes: &'a [u8],
}

impl<'a> StringView<'a> {
    /// Largest number of bytes a view may cover. Bounds the size of a receive buffer handed to
    /// the request decoder.
    pub const MAX_SIZE: usize = 255;

    /// View all of `bytes`.
    pub const fn new(bytes: &'a [u8]) -> Self {
        debug_assert!(bytes.len() <= Self::MAX_SIZE);
        Self { bytes }
    }

    /// View the bytes of `text`.
    #[allow(clippy::should_implement_trait)]
    pub const fn from_str(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }

    /// An empty view.
    pub const fn empty() -> Self {
        Self { bytes: &[] }
    }

    /// The viewed bytes.
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[allow(missing_docs)]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[allow(missing_docs)]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte at `pos`.
    pub fn at(&self, pos: usize) -> u8 {
        debug_assert!(pos < self.len(), "at({}) beyond size {}", pos, self.len());
        self.bytes[pos]
    }

    /// First byte; the view must not be empty.
    pub fn front(&self) -> u8 {
        self.at(0)
    }

    /// Last byte; the view must not be empty.
    pub fn back(&self) -> u8 {
        self.at(self.len() - 1)
    }

    /// The first `n` bytes.
    pub fn prefix(&self, n: usize) -> StringView<'a> {
        debug_assert!(n <= self.len());
        Self {
            bytes: &self.bytes[..n],
        }
    }

    /// The last `n` bytes.
    pub fn suffix(&self, n: usize) -> StringView<'a> {
        debug_assert!(n <= self.len());
        Self {
            bytes: &self.bytes[self.len() - n..],
        }
    }

    /// Up to `n` bytes starting at `pos`; shorter when the view ends first.
    pub fn substr(&self, pos: usize, n: usize) -> StringView<'a> {
        debug_assert!(pos <= self.len());
        let end = pos + n.min(self.len() - pos);
        Self {
            bytes: &self.bytes[pos..end],
        }
    }

    /// Drop the first `n` bytes from the view.
    pub fn remove_prefix(&mut self, n: usize) {
        debug_assert!(n <= self.len(), "remove_prefix({}) beyond size {}", n, self.len());
        self.bytes = &self.bytes[n..];
    }

    /// Drop the last `n` bytes from the view.
    pub fn remove_suffix(&mut self, n: usize) {
        debug_assert!(n <= self.len(), "remove_suffix({}) beyond size {}", n, self.len());
        self.bytes = &self.bytes[..self.len() - n];
    }

    /// If the view starts with `c`, remove it and return true.
    pub fn match_and_consume(&mut self, c: u8) -> bool {
        if self.bytes.first() == Some(&c) {
            self.bytes = &self.bytes[1..];
            return true;
        }
        false
    }

    /// If the view starts with `prefix`, remove it and return true.
    pub fn skip_prefix(&mut self, prefix: &[u8]) -> bool {
        if self.starts_with(prefix) {
            self.bytes = &self.bytes[prefix.len()..];
            return true;
        }
        false
    }

    #[allow(missing_docs)]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes.starts_with(prefix)
    }

    #[allow(missing_docs)]
    pub fn starts_with_byte(&self, c: u8) -> bool {
        self.bytes.first() == Some(&c)
    }

    #[allow(missing_docs)]
    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.bytes.ends_with(suffix)
    }

    /// True if this view is a prefix of `other`, including when it is empty.
    pub fn is_prefix_of(&self, other: &[u8]) -> bool {
        other.starts_with(self.bytes)
    }

    #[allow(missing_docs)]
    pub fn contains_byte(&self, c: u8) -> bool {
        self.bytes.contains(&c)
    }

    #[allow(missing_docs)]
    pub fn contains(&self, needle: &[u8]) -> bool {
        self.find(needle).is_some()
    }

    /// Position of the first occurrence of `needle`. An empty needle is found at 0.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() {
            return Some(0);
        }
        self.bytes
            .windows(needle.len())
            .position(|window| window == needle)
    }

    /// Position of the first byte for which `test` is false, or `None` if every byte passes.
    pub fn find_first_not_of(&self, test: impl Fn(u8) -> bool) -> Option<usize> {
        self.bytes.iter().position(|c| !test(*c))
    }

    /// ASCII case-insensitive equality.
    pub fn case_eq(&self, other: &StringView<'_>) -> bool {
        self.bytes.eq_ignore_ascii_case(other.bytes)
    }

    /// Parse as an unsigned decimal integer. Only digits are allowed, with no sign or whitespace.
    pub fn to_u32(&self) -> Option<u32> {
        if self.is_empty() {
            return None;
        }

        let mut value: u32 = 0;
        for c in self.bytes {
            let digit = decimal_digit(*c)?;
            if value > u32::MAX / 10 {
                return None;
            }
            value *= 10;
            if value > u32::MAX - digit {
                return None;
            }
            value += digit;
        }

        Some(value)
    }

    /// Parse as a signed decimal integer with an optional leading '-'. A leading '+' is rejected.
    pub fn to_i32(&self) -> Option<i32> {
        let mut digits = *self;
        let negative = digits.match_and_consume(b'-');
        let magnitude = digits.to_u32()?;

        if negative {
            if magnitude <= i32::MAX as u32 {
                Some(-(magnitude as i32))
            } else if magnitude == i32::MAX as u32 + 1 {
                Some(i32::MIN)
            } else {
                None
            }
        } else {
            i32::try_from(magnitude).ok()
        }
    }

    /// Parse as a decimal number: an optional '-', digits and at most one '.', with at least one
    /// digit somewhere. Exponents and a leading '+' are rejected.
    pub fn to_f64(&self) -> Option<f64> {
        let mut rest = *self;
        let negative = rest.match_and_consume(b'-');

        let mut mantissa = 0f64;
        let mut scale = 1f64;
        let mut seen_digit = false;
        let mut seen_point = false;

        for c in rest.bytes {
            if *c == b'.' {
                if seen_point {
                    return None;
                }
                seen_point = true;
                continue;
            }
            let digit = decimal_digit(*c)?;
            seen_digit = true;
            mantissa = mantissa * 10.0 + digit as f64;
            if seen_point {
                scale *= 10.0;
            }
        }

        if !seen_digit {
            return None;
        }

        let value = mantissa / scale;
        Some(if negative { -value } else { value })
    }
}

fn decimal_digit(c: u8) -> Option<u32> {
    if c.is_ascii_digit() {
        Some((c - b'0') as u32)
    } else {
        None
    }
}

impl<'a> From<&'a str> for StringView<'a> {
    fn from(value: &'a str) -> Self {
        StringView::from_str(value)
    }
}

impl<'a> From<&'a [u8]> for StringView<'a> {
    fn from(value: &'a [u8]) -> Self {
        StringView::new(value)
    }
}

impl PartialEq<[u8]> for StringView<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes == other
    }
}

impl PartialEq<str> for StringView<'_> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for StringView<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

/// Printable ASCII is written as is, everything else is hex escaped.
pub(crate) fn write_escaped(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for c in bytes {
        match *c {
            b'"' => f.write_str("\\\"")?,
            b'\\' => f.write_str("\\\\")?,
            b'\r' => f.write_str("\\r")?,
            b'\n' => f.write_str("\\n")?,
            b'\t' => f.write_str("\\t")?,
            0x20..=0x7e => write!(f, "{}", *c as char)?,
            _ => write!(f, "\\x{:02X}", c)?,
        }
    }
    Ok(())
}

impl fmt::Debug for StringView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        write_escaped(f, self.bytes)?;
        f.write_str("\"")
    }
}

impl fmt::Display for StringView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.bytes {
            write!(f, "{}", *c as char)?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StringView<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        match core::str::from_utf8(self.bytes) {
            Ok(s) => defmt::write!(fmt, "{=str}", s),
            Err(_) => defmt::write!(fmt, "{=[u8]:x}", self.bytes),
        }
    }
}
