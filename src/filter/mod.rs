//! Narrow filters: parsing, canonicalization and message matching
//!
//! A narrow is an ordered list of `operator:operand` terms that restricts
//! which messages are shown. Terms combine with AND logic.
//!
//! # Syntax
//!
//! ```text
//! operator:operand         Include messages matching this term
//! -operator:operand        Exclude messages matching this term
//! operator:"two words"     Quoted operand
//! operator:two+words       `+` stands for a space (except in emails)
//! free text                Collected into a single trailing search term
//! ```
//!
//! # Operators
//!
//! - `stream:` - messages in a stream
//! - `topic:` / `subject:` - messages with a topic
//! - `sender:` / `from:` - messages sent by an email address
//! - `pm-with:` - private conversation with exactly these addresses
//! - `group-pm-with:` - group private messages including an address
//! - `is:` - `private`, `starred`, `mentioned`, `alerted`, `unread`
//! - `in:` - `home` or `all`
//! - `has:` - `link`, `image`, `attachment` (evaluated by the server)
//! - `near:` / `id:` - message ids
//! - `search:` - full text search (evaluated by the server)
//!
//! # Examples
//!
//! ```text
//! stream:Denmark topic:lunch              # One conversation
//! is:private -pm-with:bot@example.com     # Private messages except the bot
//! sender:me has:link                      # My messages with links
//! ```

pub mod canonical;
pub mod describe;
pub mod error;
pub mod parser;
pub mod predicate;
pub mod term;

pub use canonical::{canonicalize_operator, canonicalize_term};
pub use describe::{describe, operator_to_prefix};
pub use error::FilterError;
pub use parser::{parse, unparse};
pub use predicate::{Predicate, compile};
pub use term::{Operator, Term, sorted_term_types, term_type};

use crate::context::NarrowContext;
use crate::message::{Message, MessageId, MessageStore};
use crate::people::{UserId, update_email_in_reply_to};
use std::fmt;
use std::sync::OnceLock;

/// An immutable narrow. Edits produce a new `Filter`.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    terms: Vec<Term>,
    ctx: NarrowContext,
    predicate: OnceLock<Predicate>,
}

impl Filter {
    /// Build a filter from terms, canonicalizing each one
    pub fn new(terms: impl IntoIterator<Item = Term>, ctx: NarrowContext) -> Self {
        let terms = terms
            .into_iter()
            .map(|term| canonicalize_term(&term, &ctx))
            .collect();
        Self {
            terms,
            ctx,
            predicate: OnceLock::new(),
        }
    }

    /// Build a filter from a search box query
    pub fn parse(query: &str, ctx: NarrowContext) -> Self {
        let terms = parser::parse(query, &ctx);
        Self {
            terms,
            ctx,
            predicate: OnceLock::new(),
        }
    }

    /// Build a filter from a JSON array of `{operator, operand, negated}`
    pub fn from_json(json: &str, ctx: NarrowContext) -> Result<Self, FilterError> {
        let terms: Vec<Term> = serde_json::from_str(json)?;
        Ok(Self::new(terms, ctx))
    }

    /// True for the identity filter, which matches every message
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// All terms, in order
    pub fn operators(&self) -> &[Term] {
        &self.terms
    }

    /// Terms without the stream the client is embedded in
    pub fn public_operators(&self) -> Vec<Term> {
        self.terms
            .iter()
            .filter(|term| !(term.operator == "stream" && self.ctx.is_narrow_stream(&term.operand)))
            .cloned()
            .collect()
    }

    /// Operands of the non-negated terms with this operator
    pub fn operands(&self, operator: &str) -> Vec<&str> {
        let operator = canonicalize_operator(operator);
        self.terms
            .iter()
            .filter(|term| !term.negated && term.operator == operator)
            .map(|term| term.operand.as_str())
            .collect()
    }

    /// Negated terms only count for `search` and `has`
    pub fn has_operator(&self, operator: &str) -> bool {
        let operator = canonicalize_operator(operator);
        self.terms.iter().any(|term| {
            if term.negated && !matches!(term.operator.as_str(), "search" | "has") {
                return false;
            }
            term.operator == operator
        })
    }

    /// Whether a non-negated term matches, comparing canonical forms
    pub fn has_operand(&self, operator: &str, operand: &str) -> bool {
        let wanted = canonicalize_term(&Term::new(operator, operand), &self.ctx);
        self.operands(&wanted.operator)
            .into_iter()
            .any(|existing| existing == wanted.operand)
    }

    /// Whether the narrow includes full text search, negated or not
    pub fn is_search(&self) -> bool {
        self.has_operator("search")
    }

    /// False when some term can only be evaluated by the server
    pub fn can_apply_locally(&self) -> bool {
        predicate::can_apply_locally(&self.terms)
    }

    /// First non-negated `stream` operand
    pub fn stream(&self) -> Option<&str> {
        self.operands("stream").first().copied()
    }

    /// First non-negated `topic` operand
    pub fn topic(&self) -> Option<&str> {
        self.operands("topic").first().copied()
    }

    /// Term type tags in term order, e.g. `stream`, `not-topic`, `is-private`
    pub fn term_types(&self) -> Vec<String> {
        self.terms.iter().map(term_type).collect()
    }

    /// Term type tags ordered by display priority
    pub fn sorted_term_types(&self) -> Vec<String> {
        sorted_term_types(&self.term_types())
    }

    /// True when the terms are exactly these term types, in any order
    pub fn is_exactly(&self, term_types: &[&str]) -> bool {
        self.sorted_term_types() == sorted_term_types(term_types)
    }

    /// True when the highest priority term types are exactly `term_types`,
    /// e.g. `can_bucket_by(&["stream", "topic"])`
    pub fn can_bucket_by(&self, term_types: &[&str]) -> bool {
        let all = self.sorted_term_types();
        all.len() >= term_types.len()
            && all.iter().zip(term_types).all(|(have, want)| have == want)
    }

    /// The compiled predicate, built on first use
    pub fn predicate(&self) -> &Predicate {
        self.predicate
            .get_or_init(|| predicate::compile(&self.terms, &self.ctx))
    }

    /// Evaluate the narrow against one message
    pub fn matches(&self, message: &Message) -> bool {
        self.predicate().matches(message)
    }

    /// First id whose cached message satisfies the predicate
    pub fn first_valid_id_from(
        &self,
        msg_ids: &[MessageId],
        store: &dyn MessageStore,
    ) -> Option<MessageId> {
        let predicate = self.predicate();
        msg_ids
            .iter()
            .copied()
            .find(|id| store.get(*id).is_some_and(|message| predicate.matches(message)))
    }

    /// Same narrow with every non-negated topic replaced
    pub fn filter_with_new_topic(&self, new_topic: &str) -> Filter {
        let terms = self.terms.iter().map(|term| {
            let mut term = term.clone();
            if term.operator == "topic" && !term.negated {
                term.operand = new_topic.to_string();
            }
            term
        });
        Filter::new(terms, self.ctx.clone())
    }

    /// Same narrow with a user's old address replaced in person operands
    pub fn update_email(&self, user_id: UserId, new_email: &str) -> Filter {
        let people = self.ctx.people();
        let terms = self.terms.iter().map(|term| {
            let mut term = term.clone();
            if matches!(term.operator.as_str(), "pm-with" | "group-pm-with" | "sender") {
                term.operand = update_email_in_reply_to(people, &term.operand, user_id, new_email);
            }
            term
        });
        Filter::new(terms, self.ctx.clone())
    }

    /// The narrow rendered back into query syntax
    pub fn unparse(&self) -> String {
        parser::unparse(&self.terms)
    }

    /// HTML-escaped human readable description
    pub fn describe(&self) -> String {
        describe::describe(&self.terms)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unparse())
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms
    }
}
