//! Query defaults and field validation rules.
//!
//! `SearchDefaults` seeds new queries and can be loaded from JSON. The
//! `FieldRegistry` is the immutable table of what each field accepts; it holds
//! validation semantics only.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, Result, SearchError};
use crate::query::{BoolOp, Format, InWhat, Part, SearchField, ROW_COUNT};
use crate::search::SortOrder;

/// Largest value accepted by integer fields.
pub const MAX_INT_FIELD: u32 = i32::MAX as u32 - 1;

/// Highest statistics level.
pub const MAX_STATS_LEVEL: u32 = 5;

pub const CHAP_SEC_HIERARCHY_CHOICES: [&str; 5] =
    ["", "Chap/Direct", "Chap/Indir.", "Sec/Direct", "Sec/Indir."];

const OPERATOR_CHOICES: [&str; 9] = ["", "NOT", "<=", "<", "=", "==", ">=", ">", "<>"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SearchDefaults {
    pub or_separator: String,
    pub single_quote: String,
    pub double_quote: String,
    pub in_what: String,
    pub part: String,
    pub formats: [String; ROW_COUNT],
    pub operators: [String; ROW_COUNT],
    pub bool_op: String,
    pub excl_labels: String,
    pub min_proof_refs: u32,
    pub results_checked: u32,
    pub max_time: u32,
    pub min_hyps: u32,
    pub max_ext_results: u32,
    pub substitutions: bool,
    pub max_hyps: u32,
    pub max_incomp_hyps: u32,
    pub comments: bool,
    pub max_results: u32,
    pub prev_steps_checked: u32,
    pub chap_sec_hierarchy: String,
    pub stats: u32,
    pub output_sort: String,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            or_separator: "OR".to_string(),
            single_quote: "'".to_string(),
            double_quote: "\"".to_string(),
            in_what: "$ap".to_string(),
            part: Part::Formulas.as_str().to_string(),
            formats: [
                Format::Metamath.as_str().to_string(),
                Format::RegExpr.as_str().to_string(),
                Format::CharStr.as_str().to_string(),
                Format::ParseStmt.as_str().to_string(),
            ],
            operators: [
                String::new(),
                String::new(),
                String::new(),
                "<=".to_string(),
            ],
            bool_op: BoolOp::And.as_str().to_string(),
            excl_labels: String::new(),
            min_proof_refs: 0,
            results_checked: 0,
            max_time: 1,
            min_hyps: 0,
            max_ext_results: 0,
            substitutions: true,
            max_hyps: 99,
            max_incomp_hyps: 0,
            comments: true,
            max_results: 999_999,
            prev_steps_checked: 0,
            chap_sec_hierarchy: String::new(),
            stats: 0,
            output_sort: SortOrder::Unsorted.label().to_string(),
        }
    }
}

impl SearchDefaults {
    /// Loads defaults from JSON. Missing keys keep their built-in values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let defaults: Self = serde_json::from_str(json)
            .map_err(|error| SearchError::Config(format!("invalid search defaults: {error}")))?;
        defaults.check()?;
        Ok(defaults)
    }

    fn check(&self) -> Result<()> {
        let registry = FieldRegistry::global();
        let query = crate::query::RawQuery::from_defaults(self);
        for field in registry.fields() {
            if let Err(error) = registry.check(field, query.value(field)) {
                return Err(SearchError::Config(format!("default {error}")));
            }
        }
        Ok(())
    }
}

/// What a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Text,
    /// Non-empty text.
    RequiredText,
    Boolean,
    Integer { max: u32 },
    Choice(&'static [&'static str]),
    /// `#n` or one of the full sort labels.
    SortChoice,
}

#[derive(Debug)]
pub struct FieldRegistry {
    rules: HashMap<SearchField, FieldRule>,
    order: Vec<SearchField>,
}

impl FieldRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static FieldRegistry {
        static REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();
        REGISTRY.get_or_init(FieldRegistry::build)
    }

    fn build() -> Self {
        let int = FieldRule::Integer { max: MAX_INT_FIELD };
        let mut entries = vec![
            (SearchField::OrSeparator, FieldRule::RequiredText),
            (SearchField::SingleQuote, FieldRule::RequiredText),
            (SearchField::DoubleQuote, FieldRule::RequiredText),
        ];
        for row in 0..ROW_COUNT {
            entries.extend([
                (SearchField::InWhat(row), FieldRule::Choice(&InWhat::CHOICES)),
                (SearchField::Part(row), FieldRule::Choice(&Part::CHOICES)),
                (SearchField::Format(row), FieldRule::Choice(&Format::CHOICES)),
                (SearchField::Operator(row), FieldRule::Choice(&OPERATOR_CHOICES)),
                (SearchField::ForWhat(row), FieldRule::Text),
                (SearchField::Bool(row), FieldRule::Choice(&BoolOp::CHOICES)),
            ]);
        }
        entries.extend([
            (SearchField::ExclLabels, FieldRule::Text),
            (SearchField::MinProofRefs, int),
            (SearchField::ResultsChecked, int),
            (SearchField::MaxTime, int),
            (SearchField::MinHyps, int),
            (SearchField::MaxExtResults, int),
            (SearchField::Substitutions, FieldRule::Boolean),
            (SearchField::MaxHyps, int),
            (SearchField::MaxIncompHyps, int),
            (SearchField::Comments, FieldRule::Boolean),
            (SearchField::MaxResults, int),
            (SearchField::PrevStepsChecked, int),
            (
                SearchField::ChapSecHierarchy,
                FieldRule::Choice(&CHAP_SEC_HIERARCHY_CHOICES),
            ),
            (SearchField::Stats, FieldRule::Integer { max: MAX_STATS_LEVEL }),
            (SearchField::FromChap, FieldRule::Text),
            (SearchField::FromSec, FieldRule::Text),
            (SearchField::ThruChap, FieldRule::Text),
            (SearchField::ThruSec, FieldRule::Text),
            (SearchField::OutputSort, FieldRule::SortChoice),
            (SearchField::ReferenceLabel, FieldRule::Text),
        ]);

        Self {
            order: entries.iter().map(|(field, _)| *field).collect(),
            rules: entries.into_iter().collect(),
        }
    }

    pub fn rule(&self, field: SearchField) -> FieldRule {
        self.rules.get(&field).copied().unwrap_or(FieldRule::Text)
    }

    /// Every registered field in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = SearchField> + '_ {
        self.order.iter().copied()
    }

    /// Validates `text` against the field's rule without interpreting it.
    pub fn check(&self, field: SearchField, text: &str) -> std::result::Result<(), FieldError> {
        match self.rule(field) {
            FieldRule::Text => Ok(()),
            FieldRule::RequiredText => {
                if text.is_empty() {
                    Err(arg_error(field, text, " Is required. "))
                } else {
                    Ok(())
                }
            }
            FieldRule::Boolean => self.boolean(field, text).map(|_| ()),
            FieldRule::Integer { .. } => self.integer(field, text).map(|_| ()),
            FieldRule::Choice(choices) => {
                if choices.contains(&text) {
                    Ok(())
                } else {
                    Err(arg_error(field, text, " Not a valid choice."))
                }
            }
            FieldRule::SortChoice => SortOrder::parse(text)
                .map(|_| ())
                .ok_or_else(|| arg_error(field, text, " Not a valid choice.")),
        }
    }

    /// Parses an integer field, enforcing non-negativity and the field bound.
    pub fn integer(&self, field: SearchField, text: &str) -> std::result::Result<u32, FieldError> {
        let max = match self.rule(field) {
            FieldRule::Integer { max } => max,
            _ => MAX_INT_FIELD,
        };
        let trimmed = text.trim();
        match trimmed.parse::<i64>() {
            Ok(value) if value < 0 => Err(arg_error(field, trimmed, " Is less than zero.")),
            Ok(value) if value <= i64::from(max) => Ok(value as u32),
            _ => Err(arg_error(
                field,
                trimmed,
                &format!(" Is not an integer or is greater than {max}"),
            )),
        }
    }

    pub fn boolean(&self, field: SearchField, text: &str) -> std::result::Result<bool, FieldError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            _ => Err(arg_error(field, text, " Not a valid choice.")),
        }
    }
}

/// Builds the standard "value = ..." validation error for a field.
pub fn arg_error(field: SearchField, value: &str, message: &str) -> FieldError {
    FieldError::arg(field, format!("value = {value}.{message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults_pass_validation() {
        assert!(SearchDefaults::default().check().is_ok());
    }

    #[test]
    fn json_overrides_only_named_keys() {
        let defaults = SearchDefaults::from_json_str(r#"{"max_results": 25, "or_separator": "|"}"#)
            .expect("valid defaults");
        assert_eq!(defaults.max_results, 25);
        assert_eq!(defaults.or_separator, "|");
        assert_eq!(defaults.max_hyps, 99);
    }

    #[test]
    fn invalid_default_choice_is_config_error() {
        let error = SearchDefaults::from_json_str(r#"{"in_what": "$z"}"#).unwrap_err();
        assert!(matches!(error, SearchError::Config(message) if message.contains("InWhat")));
        assert!(matches!(
            SearchDefaults::from_json_str("{not json"),
            Err(SearchError::Config(_))
        ));
    }

    #[test]
    fn integer_rules() {
        let registry = FieldRegistry::global();
        assert_eq!(registry.integer(SearchField::MaxHyps, " 7 "), Ok(7));
        let negative = registry.integer(SearchField::MaxHyps, "-1").unwrap_err();
        assert!(negative.message.ends_with("Is less than zero."));
        assert!(registry.integer(SearchField::MaxHyps, "abc").is_err());
        assert!(registry.integer(SearchField::Stats, "6").is_err());
        assert_eq!(registry.integer(SearchField::Stats, "5"), Ok(5));
    }

    #[test]
    fn boolean_rules() {
        let registry = FieldRegistry::global();
        assert_eq!(registry.boolean(SearchField::Comments, "Yes"), Ok(true));
        assert_eq!(registry.boolean(SearchField::Comments, "off"), Ok(false));
        assert!(registry.boolean(SearchField::Comments, "maybe").is_err());
    }
}
