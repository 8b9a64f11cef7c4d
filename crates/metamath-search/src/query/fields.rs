//! Raw query fields and the choice values they accept.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::SearchDefaults;
use crate::types::Assertion;
use crate::unify::RelOp;

/// Number of search rows on a query.
pub const ROW_COUNT: usize = 4;

/// Identifies one input field of a [`RawQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    OrSeparator,
    SingleQuote,
    DoubleQuote,
    InWhat(usize),
    Part(usize),
    Format(usize),
    Operator(usize),
    ForWhat(usize),
    Bool(usize),
    ExclLabels,
    MinProofRefs,
    ResultsChecked,
    MaxTime,
    MinHyps,
    MaxExtResults,
    Substitutions,
    MaxHyps,
    MaxIncompHyps,
    Comments,
    MaxResults,
    PrevStepsChecked,
    ChapSecHierarchy,
    Stats,
    FromChap,
    FromSec,
    ThruChap,
    ThruSec,
    OutputSort,
    ReferenceLabel,
}

impl SearchField {
    pub fn name(self) -> &'static str {
        match self {
            Self::OrSeparator => "Or",
            Self::SingleQuote => "SingleQuote",
            Self::DoubleQuote => "DoubleQuote",
            Self::InWhat(_) => "InWhat",
            Self::Part(_) => "Part",
            Self::Format(_) => "Format",
            Self::Operator(_) => "Oper",
            Self::ForWhat(_) => "ForWhat",
            Self::Bool(_) => "Bool",
            Self::ExclLabels => "ExclLabels",
            Self::MinProofRefs => "MinProofRefs",
            Self::ResultsChecked => "ResultsChecked",
            Self::MaxTime => "MaxTime",
            Self::MinHyps => "MinHyps",
            Self::MaxExtResults => "MaxExtResults",
            Self::Substitutions => "Substitutions",
            Self::MaxHyps => "MaxHyps",
            Self::MaxIncompHyps => "MaxIncompHyps",
            Self::Comments => "Comments",
            Self::MaxResults => "MaxResults",
            Self::PrevStepsChecked => "PrevStepsChecked",
            Self::ChapSecHierarchy => "ChapSecHierarchy",
            Self::Stats => "Stats",
            Self::FromChap => "FromChap",
            Self::FromSec => "FromSec",
            Self::ThruChap => "ThruChap",
            Self::ThruSec => "ThruSec",
            Self::OutputSort => "OutputSort",
            Self::ReferenceLabel => "ReferenceLabel",
        }
    }

    pub fn row(self) -> Option<usize> {
        match self {
            Self::InWhat(row)
            | Self::Part(row)
            | Self::Format(row)
            | Self::Operator(row)
            | Self::ForWhat(row)
            | Self::Bool(row) => Some(row),
            _ => None,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row() {
            Some(row) => write!(f, "{}[{}]", self.name(), row),
            None => f.write_str(self.name()),
        }
    }
}

bitflags! {
    /// Statement kinds a row looks at.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InWhat: u8 {
        const AXIOMS   = 0b001;
        const LOG_HYPS = 0b010;
        const THEOREMS = 0b100;
    }
}

impl InWhat {
    pub const CHOICES: [&'static str; 8] = ["$aep", "$ae", "$ap", "$ep", "$a", "$e", "$p", "$="];

    pub fn parse(text: &str) -> Option<Self> {
        let flags = match text {
            "$aep" => Self::AXIOMS | Self::LOG_HYPS | Self::THEOREMS,
            "$ae" => Self::AXIOMS | Self::LOG_HYPS,
            "$ap" => Self::AXIOMS | Self::THEOREMS,
            "$ep" => Self::LOG_HYPS | Self::THEOREMS,
            "$a" => Self::AXIOMS,
            "$e" => Self::LOG_HYPS,
            "$p" | "$=" => Self::THEOREMS,
            _ => return None,
        };
        Some(flags)
    }

    /// Whether a row with this selector has anything to look at in `assertion`.
    pub fn wants(self, assertion: &Assertion) -> bool {
        let kind_wanted = if assertion.is_axiom() {
            self.contains(Self::AXIOMS)
        } else {
            self.contains(Self::THEOREMS)
        };
        kind_wanted || (self.contains(Self::LOG_HYPS) && assertion.hyp_count() > 0)
    }

    pub fn wants_statement(self) -> bool {
        self.intersects(Self::AXIOMS | Self::THEOREMS)
    }

    pub fn wants_hyps(self) -> bool {
        self.contains(Self::LOG_HYPS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Part {
    Formulas,
    Comments,
    Labels,
    #[serde(rename = "LabelsRPN")]
    LabelsRpn,
}

impl Part {
    pub const CHOICES: [&'static str; 4] = ["Formulas", "Comments", "Labels", "LabelsRPN"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formulas => "Formulas",
            Self::Comments => "Comments",
            Self::Labels => "Labels",
            Self::LabelsRpn => "LabelsRPN",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Formulas" => Some(Self::Formulas),
            "Comments" => Some(Self::Comments),
            "Labels" => Some(Self::Labels),
            "LabelsRPN" => Some(Self::LabelsRpn),
            _ => None,
        }
    }

    /// Parts whose text is a label, where bare `*`/`?` act as wildcards.
    pub fn is_label(self) -> bool {
        matches!(self, Self::Labels | Self::LabelsRpn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    Metamath,
    RegExpr,
    CharStr,
    ParseExpr,
    ParseStmt,
}

impl Format {
    pub const CHOICES: [&'static str; 5] =
        ["Metamath", "RegExpr", "CharStr", "ParseExpr", "ParseStmt"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metamath => "Metamath",
            Self::RegExpr => "RegExpr",
            Self::CharStr => "CharStr",
            Self::ParseExpr => "ParseExpr",
            Self::ParseStmt => "ParseStmt",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "Metamath" => Some(Self::Metamath),
            "RegExpr" => Some(Self::RegExpr),
            "CharStr" => Some(Self::CharStr),
            "ParseExpr" => Some(Self::ParseExpr),
            "ParseStmt" => Some(Self::ParseStmt),
            _ => None,
        }
    }

    pub fn is_tree(self) -> bool {
        matches!(self, Self::ParseExpr | Self::ParseStmt)
    }
}

/// Row operator: blank or `NOT` for text formats, relational for tree formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Blank,
    Not,
    Rel(RelOp),
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "",
            Self::Not => "NOT",
            Self::Rel(op) => op.as_str(),
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "" => Some(Self::Blank),
            "NOT" => Some(Self::Not),
            other => RelOp::parse(other).map(Self::Rel),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoolOp {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl BoolOp {
    pub const CHOICES: [&'static str; 2] = ["AND", "OR"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}

/// One search row as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub in_what: String,
    pub part: String,
    pub format: String,
    pub operator: String,
    pub for_what: String,
    pub bool_op: String,
}

/// A complete, unvalidated query. Every value is kept as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawQuery {
    pub or_separator: String,
    pub single_quote: String,
    pub double_quote: String,
    pub rows: [RawRow; ROW_COUNT],
    pub excl_labels: String,
    pub min_proof_refs: String,
    pub results_checked: String,
    pub max_time: String,
    pub min_hyps: String,
    pub max_ext_results: String,
    pub substitutions: String,
    pub max_hyps: String,
    pub max_incomp_hyps: String,
    pub comments: String,
    pub max_results: String,
    pub prev_steps_checked: String,
    pub chap_sec_hierarchy: String,
    pub stats: String,
    pub from_chap: String,
    pub from_sec: String,
    pub thru_chap: String,
    pub thru_sec: String,
    pub output_sort: String,
    pub reference_label: String,
}

impl Default for RawQuery {
    fn default() -> Self {
        Self::from_defaults(&SearchDefaults::default())
    }
}

impl RawQuery {
    pub fn from_defaults(defaults: &SearchDefaults) -> Self {
        let rows = std::array::from_fn(|row| RawRow {
            in_what: defaults.in_what.clone(),
            part: defaults.part.clone(),
            format: defaults.formats[row].clone(),
            operator: defaults.operators[row].clone(),
            for_what: String::new(),
            bool_op: defaults.bool_op.clone(),
        });
        Self {
            or_separator: defaults.or_separator.clone(),
            single_quote: defaults.single_quote.clone(),
            double_quote: defaults.double_quote.clone(),
            rows,
            excl_labels: defaults.excl_labels.clone(),
            min_proof_refs: defaults.min_proof_refs.to_string(),
            results_checked: defaults.results_checked.to_string(),
            max_time: defaults.max_time.to_string(),
            min_hyps: defaults.min_hyps.to_string(),
            max_ext_results: defaults.max_ext_results.to_string(),
            substitutions: defaults.substitutions.to_string(),
            max_hyps: defaults.max_hyps.to_string(),
            max_incomp_hyps: defaults.max_incomp_hyps.to_string(),
            comments: defaults.comments.to_string(),
            max_results: defaults.max_results.to_string(),
            prev_steps_checked: defaults.prev_steps_checked.to_string(),
            chap_sec_hierarchy: defaults.chap_sec_hierarchy.clone(),
            stats: defaults.stats.to_string(),
            from_chap: String::new(),
            from_sec: String::new(),
            thru_chap: String::new(),
            thru_sec: String::new(),
            output_sort: defaults.output_sort.clone(),
            reference_label: String::new(),
        }
    }

    /// Sets the three text fields of a row and leaves the rest as they were.
    pub fn set_row(&mut self, row: usize, format: Format, part: Part, for_what: &str) -> &mut Self {
        let raw = &mut self.rows[row];
        raw.format = format.as_str().to_string();
        raw.part = part.as_str().to_string();
        raw.for_what = for_what.to_string();
        if format.is_tree() && Operator::parse(&raw.operator).is_some_and(|op| !matches!(op, Operator::Rel(_))) {
            raw.operator = RelOp::Le.as_str().to_string();
        } else if !format.is_tree() && matches!(Operator::parse(&raw.operator), Some(Operator::Rel(_))) {
            raw.operator = String::new();
        }
        self
    }

    /// Raw text of a scalar or row field.
    pub fn value(&self, field: SearchField) -> &str {
        match field {
            SearchField::OrSeparator => &self.or_separator,
            SearchField::SingleQuote => &self.single_quote,
            SearchField::DoubleQuote => &self.double_quote,
            SearchField::InWhat(row) => &self.rows[row].in_what,
            SearchField::Part(row) => &self.rows[row].part,
            SearchField::Format(row) => &self.rows[row].format,
            SearchField::Operator(row) => &self.rows[row].operator,
            SearchField::ForWhat(row) => &self.rows[row].for_what,
            SearchField::Bool(row) => &self.rows[row].bool_op,
            SearchField::ExclLabels => &self.excl_labels,
            SearchField::MinProofRefs => &self.min_proof_refs,
            SearchField::ResultsChecked => &self.results_checked,
            SearchField::MaxTime => &self.max_time,
            SearchField::MinHyps => &self.min_hyps,
            SearchField::MaxExtResults => &self.max_ext_results,
            SearchField::Substitutions => &self.substitutions,
            SearchField::MaxHyps => &self.max_hyps,
            SearchField::MaxIncompHyps => &self.max_incomp_hyps,
            SearchField::Comments => &self.comments,
            SearchField::MaxResults => &self.max_results,
            SearchField::PrevStepsChecked => &self.prev_steps_checked,
            SearchField::ChapSecHierarchy => &self.chap_sec_hierarchy,
            SearchField::Stats => &self.stats,
            SearchField::FromChap => &self.from_chap,
            SearchField::FromSec => &self.from_sec,
            SearchField::ThruChap => &self.thru_chap,
            SearchField::ThruSec => &self.thru_sec,
            SearchField::OutputSort => &self.output_sort,
            SearchField::ReferenceLabel => &self.reference_label,
        }
    }
}
