use super::term::Term;
use crate::context::NarrowContext;

/// Lowercase an operator name and resolve its aliases
pub fn canonicalize_operator(operator: &str) -> String {
    let operator = operator.to_lowercase();
    match operator.as_str() {
        "from" => "sender".to_string(),
        "subject" => "topic".to_string(),
        _ => operator,
    }
}

fn canonical_has_operand(operand: &str) -> &str {
    match operand {
        "attachments" => "attachment",
        "images" => "image",
        "links" => "link",
        other => other,
    }
}

/// Canonical form of a term. Unknown operators and operands pass through.
pub fn canonicalize_term(term: &Term, ctx: &NarrowContext) -> Term {
    let operator = canonicalize_operator(&term.operator);

    let operand = match operator.as_str() {
        "has" => canonical_has_operand(&term.operand).to_string(),
        "stream" => ctx.streams().get_name(&term.operand).to_string(),
        "sender" | "pm-with" => {
            let operand = term.operand.to_lowercase();
            if operand == "me" {
                ctx.people()
                    .my_current_email()
                    .map(str::to_lowercase)
                    .unwrap_or(operand)
            } else {
                operand
            }
        }
        "group-pm-with" => term.operand.to_lowercase(),
        "search" => term.operand.replace(['\u{201c}', '\u{201d}'], "\"").to_lowercase(),
        _ => term.operand.clone(),
    };

    Term {
        operator,
        operand,
        negated: term.negated,
    }
}
