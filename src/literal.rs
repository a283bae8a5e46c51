use core::fmt;

use crate::string_view::{StringView, write_escaped};

/// A protocol constant compiled into the program, such as a header name or an Alpaca keyword.
///
/// `Literal` has the comparison API of [`StringView`] but is a distinct type so that trusted
/// constants and untrusted request bytes can't be confused. In particular
/// [`Literal::lowered_eq`] relies on the literal already being lower case, which is only sound
/// for text the program itself defines.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    bytes: &'static [u8],
}

impl Literal {
    /// Wrap a string constant.
    pub const fn new(text: &'static str) -> Self {
        Self {
            bytes: text.as_bytes(),
        }
    }

    /// Wrap a byte string constant.
    pub const fn from_bytes(bytes: &'static [u8]) -> Self {
        Self { bytes }
    }

    #[allow(missing_docs)]
    pub const fn as_bytes(&self) -> &'static [u8] {
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

    /// View of the literal, for APIs which take a [`StringView`].
    pub const fn as_view(&self) -> StringView<'static> {
        StringView::new(self.bytes)
    }

    /// Exact, byte-wise equality with `view`.
    pub fn eq_view(&self, view: &StringView<'_>) -> bool {
        self.bytes == view.as_bytes()
    }

    /// Case-insensitive equality, normalizing both sides.
    pub fn case_eq(&self, view: &StringView<'_>) -> bool {
        self.bytes.eq_ignore_ascii_case(view.as_bytes())
    }

    /// Case-insensitive equality where only `view` is normalized. The literal must already be
    /// lower case.
    pub fn lowered_eq(&self, view: &StringView<'_>) -> bool {
        debug_assert!(
            !self.bytes.iter().any(u8::is_ascii_uppercase),
            "literal is not lower case"
        );
        let other = view.as_bytes();
        self.bytes.len() == other.len()
            && self
                .bytes
                .iter()
                .zip(other)
                .all(|(l, v)| *l == v.to_ascii_lowercase())
    }

    /// True if `view` begins with this literal.
    pub fn is_prefix_of(&self, view: &StringView<'_>) -> bool {
        view.starts_with(self.bytes)
    }

    /// True if this literal begins with `view`. Used to decide whether a partial input could still
    /// turn into the literal.
    pub fn starts_with(&self, view: &StringView<'_>) -> bool {
        self.bytes.starts_with(view.as_bytes())
    }

    /// Case-insensitive search for this literal within `view`.
    pub fn is_case_insensitive_substring_of(&self, view: &StringView<'_>) -> bool {
        if self.is_empty() {
            return true;
        }
        view.as_bytes()
            .windows(self.len())
            .any(|window| window.eq_ignore_ascii_case(self.bytes))
    }
}

impl PartialEq<StringView<'_>> for Literal {
    fn eq(&self, other: &StringView<'_>) -> bool {
        self.eq_view(other)
    }
}

impl PartialEq<Literal> for StringView<'_> {
    fn eq(&self, other: &Literal) -> bool {
        other.eq_view(self)
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        write_escaped(f, self.bytes)?;
        f.write_str("\"")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_view(), f)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Literal {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::Format::format(&self.as_view(), fmt)
    }
}
