use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A single `{operator, operand, negated}` triple of a narrow
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub operator: String,
    #[serde(deserialize_with = "operand_from_json")]
    pub operand: String,
    #[serde(default)]
    pub negated: bool,
}

impl Term {
    pub fn new(operator: impl Into<String>, operand: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            operand: operand.into(),
            negated: false,
        }
    }

    pub fn negated(operator: impl Into<String>, operand: impl Into<String>) -> Self {
        Self {
            negated: true,
            ..Self::new(operator, operand)
        }
    }

    pub fn kind(&self) -> Operator {
        Operator::from_name(&self.operator)
    }
}

/// Accept strings, numbers and booleans as operands
fn operand_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}

/// Known narrow operators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Stream,
    Topic,
    Search,
    Is,
    In,
    Near,
    Id,
    Sender,
    PmWith,
    GroupPmWith,
    Has,
    Unknown(String),
}

impl Operator {
    /// Resolve an operator name, accepting aliases and any casing
    pub fn from_name(name: &str) -> Self {
        match super::canonical::canonicalize_operator(name).as_str() {
            "stream" => Operator::Stream,
            "topic" => Operator::Topic,
            "search" => Operator::Search,
            "is" => Operator::Is,
            "in" => Operator::In,
            "near" => Operator::Near,
            "id" => Operator::Id,
            "sender" => Operator::Sender,
            "pm-with" => Operator::PmWith,
            "group-pm-with" => Operator::GroupPmWith,
            "has" => Operator::Has,
            other => Operator::Unknown(other.to_string()),
        }
    }

    /// Name used in queries; unknown operators keep the name they were given
    pub fn canonical_name(&self) -> &str {
        match self {
            Operator::Stream => "stream",
            Operator::Topic => "topic",
            Operator::Search => "search",
            Operator::Is => "is",
            Operator::In => "in",
            Operator::Near => "near",
            Operator::Id => "id",
            Operator::Sender => "sender",
            Operator::PmWith => "pm-with",
            Operator::GroupPmWith => "group-pm-with",
            Operator::Has => "has",
            Operator::Unknown(name) => name,
        }
    }

    /// False for `Unknown`; the parser treats such prefixes as search text
    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Classification tag of a term, e.g. `stream`, `not-sender`, `is-private`
pub fn term_type(term: &Term) -> String {
    let mut result = String::new();
    if term.negated {
        result.push_str("not-");
    }
    result.push_str(&term.operator);
    if matches!(term.operator.as_str(), "is" | "has") {
        result.push('-');
        result.push_str(&term.operand);
    }
    result
}

const TERM_TYPE_LEVELS: &[&str] = &[
    "stream",
    "topic",
    "pm-with",
    "group-pm-with",
    "sender",
    "in",
    "near",
    "id",
    "is-private",
    "is-starred",
    "is-mentioned",
    "is-alerted",
    "is-unread",
    "has-link",
    "has-image",
    "has-attachment",
    "search",
];

fn level(term_type: &str) -> usize {
    TERM_TYPE_LEVELS
        .iter()
        .position(|t| *t == term_type)
        .unwrap_or(TERM_TYPE_LEVELS.len())
}

/// Order term types by display priority. Ties keep their input order.
pub fn sorted_term_types<S: AsRef<str>>(term_types: &[S]) -> Vec<String> {
    let mut sorted: Vec<String> = term_types.iter().map(|t| t.as_ref().to_string()).collect();
    sorted.sort_by_key(|t| level(t));
    sorted
}
