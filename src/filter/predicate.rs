use super::term::{Operator, Term};
use crate::context::NarrowContext;
use crate::message::Message;
use crate::people::{UserId, group_pm_with_user_ids, pm_with_operand_ids, pm_with_user_ids};
use crate::streams::StreamId;
use regex::Regex;

/// Compiled test for a single term
#[derive(Debug, Clone)]
enum Matcher {
    Always,
    Never,
    IsPrivate,
    IsStarred,
    IsMentioned,
    IsAlerted,
    IsUnread,
    InHome,
    Id(String),
    Stream {
        name: String,
        stream_id: Option<StreamId>,
    },
    ZephyrStream(Regex),
    Topic(String),
    ZephyrTopic(Regex),
    Sender(Option<UserId>),
    PmWith(Option<Vec<UserId>>),
    GroupPmWith(Option<Vec<UserId>>),
}

#[derive(Debug, Clone)]
struct CompiledTerm {
    matcher: Matcher,
    negated: bool,
}

/// A pure, total `message -> bool` test compiled from a term list
#[derive(Debug, Clone)]
pub struct Predicate {
    terms: Vec<CompiledTerm>,
    ctx: NarrowContext,
}

impl Predicate {
    /// Predicate that accepts every message
    pub fn always(ctx: NarrowContext) -> Self {
        Self {
            terms: Vec::new(),
            ctx,
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.terms.iter().all(|term| {
            let ok = self.test(&term.matcher, message);
            ok != term.negated
        })
    }

    fn test(&self, matcher: &Matcher, message: &Message) -> bool {
        let people = self.ctx.people();
        match matcher {
            Matcher::Always => true,
            Matcher::Never => false,
            Matcher::IsPrivate => message.is_private(),
            Matcher::IsStarred => message.starred,
            Matcher::IsMentioned => message.mentioned,
            Matcher::IsAlerted => message.alerted,
            Matcher::IsUnread => message.unread,
            Matcher::InHome => self.in_home(message),
            Matcher::Id(operand) => message.id.to_string() == *operand,
            Matcher::Stream { name, stream_id } => {
                if !message.is_stream() {
                    return false;
                }
                match stream_id {
                    Some(id) => message.stream_id == Some(*id),
                    None => message.stream.to_lowercase() == *name,
                }
            }
            Matcher::ZephyrStream(re) => message.is_stream() && re.is_match(&message.stream),
            Matcher::Topic(topic) => {
                message.is_stream() && message.topic.to_lowercase() == *topic
            }
            Matcher::ZephyrTopic(re) => message.is_stream() && re.is_match(&message.topic),
            Matcher::Sender(user_id) => user_id.is_some() && message.sender_id == *user_id,
            Matcher::PmWith(operand_ids) => {
                let Some(operand_ids) = operand_ids else {
                    return false;
                };
                pm_with_user_ids(people, message).is_some_and(|ids| ids == *operand_ids)
            }
            Matcher::GroupPmWith(operand_ids) => {
                let Some(operand_ids) = operand_ids else {
                    return false;
                };
                group_pm_with_user_ids(people, message)
                    .is_some_and(|ids| operand_ids.iter().all(|id| ids.contains(id)))
            }
        }
    }

    fn in_home(&self, message: &Message) -> bool {
        if message.is_private() || message.mentioned {
            return true;
        }
        if message.is_stream() && self.ctx.is_narrow_stream(&message.stream) {
            return true;
        }
        message
            .stream_id
            .is_some_and(|id| self.ctx.streams().in_home_view(id))
    }
}

/// Whether the terms can be evaluated against locally cached messages.
///
/// Full text search and `has:` need the server.
pub(crate) fn can_apply_locally(terms: &[Term]) -> bool {
    !terms
        .iter()
        .any(|t| matches!(t.kind(), Operator::Search | Operator::Has))
}

/// Compile canonical terms into a predicate.
///
/// Terms that can only be evaluated by the server make the whole predicate
/// accept everything; it is a local pre-filter.
pub fn compile(terms: &[Term], ctx: &NarrowContext) -> Predicate {
    if !can_apply_locally(terms) {
        tracing::debug!("narrow needs server-side evaluation; local predicate accepts all");
        return Predicate::always(ctx.clone());
    }

    let terms = terms
        .iter()
        .map(|term| CompiledTerm {
            matcher: compile_term(term, ctx),
            negated: term.negated,
        })
        .collect();

    Predicate {
        terms,
        ctx: ctx.clone(),
    }
}

fn compile_term(term: &Term, ctx: &NarrowContext) -> Matcher {
    let operand = term.operand.as_str();
    let zephyr = ctx.realm().is_zephyr_mirror_realm;

    match term.kind() {
        Operator::Is => match operand {
            "private" => Matcher::IsPrivate,
            "starred" => Matcher::IsStarred,
            "mentioned" => Matcher::IsMentioned,
            "alerted" => Matcher::IsAlerted,
            "unread" => Matcher::IsUnread,
            _ => {
                tracing::debug!(operand, "unrecognized is operand; matching everything");
                Matcher::Always
            }
        },
        Operator::In => match operand {
            "home" => Matcher::InHome,
            "all" => Matcher::Always,
            _ => {
                tracing::debug!(operand, "unrecognized in operand; matching everything");
                Matcher::Always
            }
        },
        Operator::Id => Matcher::Id(operand.to_string()),
        Operator::Stream if zephyr => {
            regex_matcher(zephyr_stream_pattern(operand), Matcher::ZephyrStream)
        }
        Operator::Stream => {
            let name = operand.to_lowercase();
            let stream_id = ctx.streams().get_stream_id(&name);
            Matcher::Stream { name, stream_id }
        }
        Operator::Topic if zephyr => {
            regex_matcher(zephyr_topic_pattern(operand), Matcher::ZephyrTopic)
        }
        Operator::Topic => Matcher::Topic(operand.to_lowercase()),
        Operator::Sender => {
            let user_id = ctx.people().get_by_email(operand).map(|p| p.user_id);
            if user_id.is_none() {
                tracing::debug!(operand, "unknown sender email operand");
            }
            Matcher::Sender(user_id)
        }
        Operator::PmWith => Matcher::PmWith(resolve_pm_operand(operand, ctx)),
        Operator::GroupPmWith => Matcher::GroupPmWith(resolve_pm_operand(operand, ctx)),
        Operator::Near | Operator::Search | Operator::Has => Matcher::Always,
        Operator::Unknown(name) => {
            tracing::debug!(operator = %name, "unknown operator; matching everything");
            Matcher::Always
        }
    }
}

fn resolve_pm_operand(operand: &str, ctx: &NarrowContext) -> Option<Vec<UserId>> {
    let ids = pm_with_operand_ids(ctx.people(), operand);
    if ids.is_none() {
        tracing::debug!(operand, "private message operand has unknown addresses");
    }
    ids
}

fn regex_matcher(pattern: String, wrap: fn(Regex) -> Matcher) -> Matcher {
    match Regex::new(&pattern) {
        Ok(re) => wrap(re),
        Err(err) => {
            tracing::warn!(%pattern, error = %err, "failed to build zephyr matcher");
            Matcher::Never
        }
    }
}

/// Strip trailing `.d`s, keeping at least `min_len` bytes
fn strip_dot_d(mut base: &str, min_len: usize) -> &str {
    while base.len() >= min_len + 2
        && base.as_bytes()[base.len() - 2..].eq_ignore_ascii_case(b".d")
    {
        base = &base[..base.len() - 2];
    }
    base
}

/// Strip leading `un`s, keeping at least one character
fn strip_un(mut base: &str) -> &str {
    while base.len() > 2 && base.as_bytes()[..2].eq_ignore_ascii_case(b"un") {
        base = &base[2..];
    }
    base
}

/// `foo` also matches `unfoo`, `foo.d`, `ununfoo.d.d`, ...
fn zephyr_stream_pattern(operand: &str) -> String {
    let base = strip_dot_d(strip_un(operand), 1);
    format!(r"(?i)^(un)*{}(\.d)*$", regex::escape(base))
}

/// `foo` also matches `foo.d`, `foo.d.d`, ...; the empty topic, `personal`
/// and `(instance "")` are interchangeable.
fn zephyr_topic_pattern(operand: &str) -> String {
    let base = strip_dot_d(operand, 0);
    let lower = base.to_lowercase();
    if lower.is_empty() || lower == "personal" || lower == "(instance \"\")" {
        return r#"(?i)^(|personal|\(instance ""\))(\.d)*$"#.to_string();
    }
    format!(r"(?i)^{}(\.d)*$", regex::escape(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zephyr_base_names() {
        assert_eq!(strip_dot_d("foo.d.d", 0), "foo");
        assert_eq!(strip_dot_d(strip_un("unfoo.D"), 1), "foo");
        assert_eq!(strip_un("ununfoo"), "foo");
        assert_eq!(strip_un("un"), "un");
        assert_eq!(strip_dot_d(".d", 1), ".d");
        assert_eq!(strip_dot_d(".d", 0), "");
        assert_eq!(strip_dot_d("€.d", 0), "€");
    }

    #[test]
    fn test_zephyr_stream_pattern() {
        let re = Regex::new(&zephyr_stream_pattern("foo")).unwrap();
        for name in ["foo", "FOO", "unfoo", "foo.d", "ununfoo.d.d"] {
            assert!(re.is_match(name), "{name} should match");
        }
        for name in ["food", "barfoo", "foo.x"] {
            assert!(!re.is_match(name), "{name} should not match");
        }
    }

    #[test]
    fn test_zephyr_topic_pattern() {
        let re = Regex::new(&zephyr_topic_pattern("personal")).unwrap();
        for topic in ["", "personal", "Personal.d", "(instance \"\")"] {
            assert!(re.is_match(topic), "{topic} should match");
        }
        assert!(!re.is_match("bar"));

        let re = Regex::new(&zephyr_topic_pattern("bar")).unwrap();
        assert!(re.is_match("bar.d"));
        assert!(!re.is_match(""));
    }

    #[test]
    fn test_regex_metacharacters_are_escaped() {
        let re = Regex::new(&zephyr_stream_pattern("a+b")).unwrap();
        assert!(re.is_match("a+b.d"));
        assert!(!re.is_match("aab"));
    }
}
