use core::fmt;

use crate::literal::Literal;
use crate::string_view::StringView;

/// Either a compiled-in [`Literal`] or a [`StringView`] of runtime bytes. Lets a value such as a
/// reason phrase or an error message come from either source.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum AnyString<'a> {
    /// A constant.
    Literal(Literal),
    /// Borrowed from the input.
    View(StringView<'a>),
}

impl<'a> AnyString<'a> {
    #[allow(missing_docs)]
    pub fn as_bytes(&self) -> &'a [u8] {
        match self {
            Self::Literal(literal) => literal.as_bytes(),
            Self::View(view) => view.as_bytes(),
        }
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<Literal> for AnyString<'_> {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl<'a> From<StringView<'a>> for AnyString<'a> {
    fn from(value: StringView<'a>) -> Self {
        Self::View(value)
    }
}

impl fmt::Display for AnyString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => fmt::Display::fmt(literal, f),
            Self::View(view) => fmt::Display::fmt(view, f),
        }
    }
}

impl fmt::Debug for AnyString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "Literal({:?})", literal),
            Self::View(view) => write!(f, "View({:?})", view),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AnyString<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Literal(literal) => defmt::Format::format(literal, fmt),
            Self::View(view) => defmt::Format::format(view, fmt),
        }
    }
}
