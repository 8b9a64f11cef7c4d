//! Search term parser.
//!
//! A row's `ForWhat` text is either one bare term or a sequence of quoted
//! terms, each optionally preceded by the OR separator:
//!
//! ```text
//! 'ax-*' OR "*OLD"  'mp'
//! ```
//!
//! Terms are combined left to right; adjacent terms without an OR are ANDed.

/// One parsed search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedTerm {
    pub text: String,
    /// Quote string the term was enclosed in; empty for a bare term.
    pub quote: String,
    /// The next term is joined to this one by OR.
    pub or_follows: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TermParseError {
    #[error("Next search term missing starting quote.")]
    MissingStartQuote,
    #[error("Search term end quote missing.")]
    MissingEndQuote,
    #[error("Empty string search term is invalid.")]
    EmptyTerm,
    #[error("An 'or' before the first search term is invalid.")]
    OrBeforeFirst,
    #[error("Only one 'or' is permitted between each pair of search terms.")]
    TwoOrs,
    #[error("An 'or' after the last search term is invalid.")]
    OrAfterLast,
}

/// Quote and separator strings in effect for a query.
#[derive(Debug, Clone, Copy)]
pub struct TermSyntax<'a> {
    pub single_quote: &'a str,
    pub double_quote: &'a str,
    pub or_separator: &'a str,
}

impl TermSyntax<'_> {
    fn quote_at(&self, text: &str, cursor: usize) -> Option<&str> {
        let rest = &text[cursor..];
        if rest.starts_with(self.single_quote) {
            Some(self.single_quote)
        } else if rest.starts_with(self.double_quote) {
            Some(self.double_quote)
        } else {
            None
        }
    }
}

/// Splits `text` into its ordered search terms.
pub fn parse_terms(text: &str, syntax: TermSyntax<'_>) -> Result<Vec<QuotedTerm>, TermParseError> {
    if !text.starts_with(syntax.single_quote)
        && !text.starts_with(syntax.double_quote)
        && !text.starts_with(syntax.or_separator)
    {
        if text.is_empty() {
            return Err(TermParseError::EmptyTerm);
        }
        return Ok(vec![QuotedTerm {
            text: text.to_string(),
            quote: String::new(),
            or_follows: false,
        }]);
    }

    let mut terms: Vec<QuotedTerm> = Vec::new();
    let mut cursor = 0;
    loop {
        // separator run: spaces and at most one OR
        let mut saw_or = false;
        while cursor < text.len() {
            if text[cursor..].starts_with(' ') {
                cursor += 1;
                continue;
            }
            if !text[cursor..].starts_with(syntax.or_separator) {
                break;
            }
            if saw_or {
                return Err(TermParseError::TwoOrs);
            }
            saw_or = true;
            cursor += syntax.or_separator.len();
        }

        if cursor >= text.len() {
            if saw_or {
                return Err(if terms.is_empty() {
                    TermParseError::OrBeforeFirst
                } else {
                    TermParseError::OrAfterLast
                });
            }
            return Ok(terms);
        }

        if saw_or {
            match terms.last_mut() {
                Some(previous) => previous.or_follows = true,
                None => return Err(TermParseError::OrBeforeFirst),
            }
        }

        let quote = syntax
            .quote_at(text, cursor)
            .ok_or(TermParseError::MissingStartQuote)?;
        let start = cursor + quote.len();
        let end = text[start..]
            .find(quote)
            .map(|offset| start + offset)
            .ok_or(TermParseError::MissingEndQuote)?;
        if end == start {
            return Err(TermParseError::EmptyTerm);
        }
        terms.push(QuotedTerm {
            text: text[start..end].to_string(),
            quote: quote.to_string(),
            or_follows: false,
        });
        cursor = end + quote.len();
    }
}

/// Renders terms back to `ForWhat` text, quoting every term.
pub fn render_terms(terms: &[QuotedTerm], syntax: TermSyntax<'_>) -> String {
    let mut out = String::new();
    for (index, term) in terms.iter().enumerate() {
        if index > 0 {
            out.push(' ');
            if terms[index - 1].or_follows {
                out.push_str(syntax.or_separator);
                out.push(' ');
            }
        }
        let quote = if term.quote.is_empty() {
            syntax.single_quote
        } else {
            &term.quote
        };
        out.push_str(quote);
        out.push_str(&term.text);
        out.push_str(quote);
    }
    out
}
