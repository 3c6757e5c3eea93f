use super::canonical::canonicalize_operator;
use super::term::Term;

/// Phrase that introduces an operand in a description, or `""` when the
/// operator is unknown.
pub fn operator_to_prefix(operator: &str, negated: bool) -> String {
    let operator = canonicalize_operator(operator);
    if operator == "search" {
        return if negated { "exclude" } else { "search for" }.to_string();
    }

    let phrase = match operator.as_str() {
        "stream" => "stream",
        "near" => "messages around",
        "has" => "messages with one or more",
        "id" => "message ID",
        "topic" => "topic",
        "sender" => "sent by",
        "pm-with" => "private messages with",
        "in" => "messages in",
        "is" => "messages that are",
        "group-pm-with" => "group private messages including",
        _ => return String::new(),
    };

    if negated {
        format!("exclude {phrase}")
    } else {
        phrase.to_string()
    }
}

const VALID_HAS_OPERANDS: &[&str] = &[
    "image",
    "images",
    "link",
    "links",
    "attachment",
    "attachments",
];

fn describe_is(operand: &str, negated: bool) -> Option<String> {
    let phrase = match operand {
        "private" => "private messages",
        "starred" => "starred messages",
        "mentioned" => "@-mentions",
        "alerted" => "alerted messages",
        "unread" => "unread messages",
        _ => return None,
    };
    let verb = if negated { "exclude " } else { "" };
    Some(format!("{verb}{phrase}"))
}

fn describe_term(term: &Term) -> String {
    let operator = canonicalize_operator(&term.operator);
    let operand = term.operand.as_str();

    match operator.as_str() {
        "is" => {
            return describe_is(operand, term.negated)
                .unwrap_or_else(|| format!("invalid {operand} operand for is operator"));
        }
        "has" if !VALID_HAS_OPERANDS.contains(&operand) => {
            return format!("invalid {operand} operand for has operator");
        }
        _ => {}
    }

    let prefix = operator_to_prefix(&operator, term.negated);
    if prefix.is_empty() {
        "unknown operator".to_string()
    } else {
        format!("{prefix} {operand}")
    }
}

fn describe_unescaped(terms: &[Term]) -> String {
    if terms.is_empty() {
        return "all messages".to_string();
    }

    let mut parts = Vec::new();
    let mut rest = terms;

    if let [first, second, tail @ ..] = terms
        && !first.negated
        && !second.negated
        && canonicalize_operator(&first.operator) == "stream"
        && canonicalize_operator(&second.operator) == "topic"
    {
        parts.push(format!("stream {} > {}", first.operand, second.operand));
        rest = tail;
    }

    parts.extend(rest.iter().map(describe_term));
    parts.join(", ")
}

/// Human readable, HTML-escaped description of a narrow
pub fn describe(terms: &[Term]) -> String {
    escape_html(&describe_unescaped(terms))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
        .replace('`', "&#x60;")
        .replace('=', "&#x3D;")
}
