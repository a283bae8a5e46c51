use crate::literal::Literal;
use crate::string_view::StringView;

/// A recognized protocol keyword and the identifier it maps to.
#[derive(Clone, Copy, Debug)]
pub struct Token<E> {
    /// Keyword text. Tables matched case-insensitively hold lower case text.
    pub text: Literal,
    /// Value produced when the keyword matches.
    pub id: E,
}

impl<E> Token<E> {
    #[allow(missing_docs)]
    pub const fn new(text: &'static str, id: E) -> Self {
        Self {
            text: Literal::new(text),
            id,
        }
    }
}

/// Id of the first token whose text equals `view` byte for byte.
pub fn match_exactly<E: Copy>(tokens: &[Token<E>], view: &StringView<'_>) -> Option<E> {
    tokens
        .iter()
        .find(|token| token.text.eq_view(view))
        .map(|token| token.id)
}

/// Id of the first token whose text equals `view` ignoring ASCII case.
pub fn match_case_insensitively<E: Copy>(
    tokens: &[Token<E>],
    view: &StringView<'_>,
) -> Option<E> {
    tokens
        .iter()
        .find(|token| token.text.lowered_eq(view))
        .map(|token| token.id)
}

/// Length of the longest token text in `tokens`.
pub const fn max_token_len<E>(tokens: &[Token<E>]) -> usize {
    let mut longest = 0;
    let mut i = 0;
    while i < tokens.len() {
        let len = tokens[i].text.len();
        if len > longest {
            longest = len;
        }
        i += 1;
    }
    longest
}

pub(crate) const fn max(a: usize, b: usize) -> usize {
    if a > b { a } else { b }
}
