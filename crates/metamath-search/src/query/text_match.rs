//! Text term compilation for the CharStr, RegExpr and Metamath formats.

use memchr::memmem::Finder;
use regex::Regex;

use super::fields::{Format, Part};

/// A compiled text search term.
#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Plain substring containment.
    Substring(Finder<'static>),
    /// Whole-string equality, used for plain label terms.
    Exact(String),
    /// Regular expression; `anchored` patterns must match the whole string.
    Regex { regex: Regex, anchored: bool },
}

impl TextPattern {
    /// Compiles `text` for a text format and part.
    ///
    /// Comment terms are lower-cased first since comment data is lower-cased.
    pub fn compile(format: Format, part: Part, text: &str) -> Result<Self, regex::Error> {
        let text = if part == Part::Comments && format != Format::RegExpr {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let label_part = part == Part::Labels;
        match format {
            Format::CharStr if label_part => Ok(Self::Exact(text)),
            Format::CharStr => Ok(Self::Substring(Finder::new(text.as_bytes()).into_owned())),
            Format::Metamath => compile_regex(&metamath_to_regex(&text, part), label_part),
            _ => compile_regex(&text, label_part),
        }
    }

    pub fn is_match(&self, data: &str) -> bool {
        match self {
            Self::Substring(finder) => finder.find(data.as_bytes()).is_some(),
            Self::Exact(expected) => expected == data,
            Self::Regex { regex, .. } => regex.is_match(data),
        }
    }

    /// True when any of the extracted strings matches.
    pub fn matches_any<S: AsRef<str>>(&self, data: &[S]) -> bool {
        data.iter().any(|value| self.is_match(value.as_ref()))
    }
}

fn compile_regex(pattern: &str, anchored: bool) -> Result<TextPattern, regex::Error> {
    let regex = if anchored {
        Regex::new(&format!("^(?:{pattern})$"))?
    } else {
        Regex::new(pattern)?
    };
    Ok(TextPattern::Regex { regex, anchored })
}

/// Translates a Metamath wildcard term into a regular expression.
///
/// `$*` and `$?` always become `.*` and `.?`. Bare `*` and `?` are wildcards
/// only for label parts, where they cannot be formula symbols. Everything
/// else is matched literally.
pub fn metamath_to_regex(text: &str, part: Part) -> String {
    let mut pattern = String::with_capacity(text.len() + 8);
    let mut literal = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let wildcard = match c {
            '$' => match chars.peek() {
                Some(&next @ ('*' | '?')) => {
                    chars.next();
                    Some(next)
                }
                _ => None,
            },
            '*' | '?' if part.is_label() => Some(c),
            _ => None,
        };
        match wildcard {
            Some(w) => {
                if !literal.is_empty() {
                    pattern.push_str(&regex::escape(&literal));
                    literal.clear();
                }
                pattern.push('.');
                pattern.push(w);
            }
            None => literal.push(c),
        }
    }
    if !literal.is_empty() {
        pattern.push_str(&regex::escape(&literal));
    }
    pattern
}
