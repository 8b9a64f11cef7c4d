//! Label exclusion patterns (`ExclLabels`).
//!
//! The field holds a comma and/or whitespace separated list of glob-like
//! label patterns, e.g. `*OLD,EE*,4??5*`. An assertion whose label fully
//! matches any of them is dropped from the search.

use regex::Regex;

const VALID_EXAMPLE: &str = "*OLD,EE*,4??5*";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExclLabelsError {
    #[error(" Is invalid. Must not contain '$$' or invalid regular expression specifiers. Valid example: {VALID_EXAMPLE}")]
    DoubleDollar { fragment: String },
    #[error(" Failed compilation as a 'Regular Expression'. Valid example: {VALID_EXAMPLE} System message = {message}")]
    Compile { fragment: String, message: String },
}

impl ExclLabelsError {
    pub fn fragment(&self) -> &str {
        match self {
            Self::DoubleDollar { fragment } | Self::Compile { fragment, .. } => fragment,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExclLabels {
    patterns: Vec<Regex>,
}

impl ExclLabels {
    pub fn compile(text: &str) -> Result<Self, ExclLabelsError> {
        let mut patterns = Vec::new();
        for fragment in text
            .split(',')
            .flat_map(str::split_whitespace)
            .filter(|fragment| !fragment.is_empty())
        {
            patterns.push(compile_fragment(fragment)?);
        }
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when `label` fully matches one of the patterns.
    pub fn excludes(&self, label: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(label))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}

fn compile_fragment(fragment: &str) -> Result<Regex, ExclLabelsError> {
    if fragment.contains("$$") {
        return Err(ExclLabelsError::DoubleDollar {
            fragment: fragment.to_string(),
        });
    }
    let translated = fragment
        .replace("$*", "*")
        .replace("$?", "?")
        .replace('.', "\\.")
        .replace('*', ".*")
        .replace('?', ".?");
    Regex::new(&format!("^(?:{translated})$")).map_err(|error| ExclLabelsError::Compile {
        fragment: fragment.to_string(),
        message: error.to_string(),
    })
}
