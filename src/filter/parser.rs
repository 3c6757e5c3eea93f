use super::canonical::{canonicalize_operator, canonicalize_term};
use super::term::{Operator, Term};
use crate::context::NarrowContext;
use regex::Regex;
use std::sync::LazyLock;

/// An optional `operator:` prefix (one trailing space allowed), followed by
/// either a double-quoted run or a run of non-whitespace. An unterminated
/// quote runs to the end of the input.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s:]+: ?)?("[^"]+"?|\S+)"#).expect("valid token regex"));

/// Operators whose operands are email addresses, where `+` is literal
fn is_email_operator(operator: &str) -> bool {
    matches!(
        canonicalize_operator(operator).as_str(),
        "sender" | "pm-with" | "group-pm-with"
    )
}

/// Parse a search box query into canonical terms.
///
/// Never fails: anything that does not look like a known `operator:operand`
/// pair ends up in a single trailing `search` term.
pub fn parse(query: &str, ctx: &NarrowContext) -> Vec<Term> {
    let mut terms = Vec::new();
    let mut search_words: Vec<&str> = Vec::new();

    for token in TOKEN_RE.find_iter(query).map(|m| m.as_str()) {
        let Some((prefix, encoded)) = token.split_once(':').filter(|_| !token.starts_with('"'))
        else {
            search_words.push(token);
            continue;
        };
        let (negated, operator) = match prefix.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, prefix),
        };

        if !Operator::from_name(operator).is_known() {
            search_words.push(token);
            continue;
        }

        let term = Term {
            operator: operator.to_string(),
            operand: decode_operand(encoded, operator),
            negated,
        };
        terms.push(canonicalize_term(&term, ctx));
    }

    if !search_words.is_empty() {
        let term = Term::new("search", search_words.join(" "));
        terms.push(canonicalize_term(&term, ctx));
    }

    tracing::trace!(query, terms = terms.len(), "parsed narrow query");
    terms
}

/// Render terms back into query syntax
pub fn unparse(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|term| {
            if term.operator == "search" || term.operator.is_empty() {
                return term.operand.clone();
            }
            let sign = if term.negated { "-" } else { "" };
            format!("{sign}{}:{}", term.operator, encode_operand(&term.operand))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn encode_operand(operand: &str) -> String {
    operand
        .replace('%', "%25")
        .replace('+', "%2B")
        .replace(' ', "+")
        .replace('"', "%22")
}

fn decode_operand(encoded: &str, operator: &str) -> String {
    let mut operand = encoded.replace('"', "");
    if !is_email_operator(operator) {
        operand = operand.replace('+', " ");
    }
    percent_decode(&operand).trim().to_string()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decode `%XX` escapes. Malformed escapes stay as typed, and input that
/// would decode to invalid UTF-8 is returned unchanged.
fn percent_decode(input: &str) -> String {
    if !input.contains('%') {
        return input.to_string();
    }

    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            decoded.push(hi * 16 + lo);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).unwrap_or_else(|_| input.to_string())
}
