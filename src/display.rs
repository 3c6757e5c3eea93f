use crate::cli::OutputFormat;
use crate::filter::Filter;
use crate::message::{Message, MessageId};
use chrono::SecondsFormat;
use colored::Colorize;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use serde_json::json;
use std::fmt::Write;

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

pub fn format_terms_text(filter: &Filter) -> String {
    let mut out = String::new();

    if filter.is_empty() {
        let _ = writeln!(out, "No terms (matches all messages)");
        return out;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Operator", "Operand", "Negated", "Type"]);

    for (idx, term) in filter.operators().iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&term.operator),
            Cell::new(&term.operand),
            Cell::new(yes_no(term.negated)),
            Cell::new(crate::filter::term_type(term)),
        ]);
    }

    let _ = writeln!(out, "{table}");
    let _ = writeln!(out, "{} {}", "Query:".bold(), filter.unparse().cyan());
    let _ = writeln!(
        out,
        "{} {}",
        "Priority:".bold(),
        filter.sorted_term_types().join(", ")
    );
    let _ = writeln!(
        out,
        "{} {}",
        "Local:".bold(),
        yes_no(filter.can_apply_locally())
    );
    out
}

pub fn format_terms_json(filter: &Filter) -> String {
    serde_json::to_string_pretty(&json!({
        "query": filter.unparse(),
        "terms": filter.operators(),
        "sorted_term_types": filter.sorted_term_types(),
        "is_search": filter.is_search(),
        "can_apply_locally": filter.can_apply_locally(),
        "description": filter.describe(),
    }))
    .unwrap_or_else(|_| "{\"error\":\"failed to serialize terms\"}".into())
}

pub fn format_description_json(filter: &Filter) -> String {
    serde_json::to_string_pretty(&json!({
        "query": filter.unparse(),
        "description": filter.describe(),
    }))
    .unwrap_or_else(|_| "{\"error\":\"failed to serialize description\"}".into())
}

fn message_location(message: &Message) -> String {
    if message.is_private() {
        let recipients: Vec<&str> = message
            .display_recipient
            .users()
            .iter()
            .map(|r| r.email.as_str())
            .filter(|email| !email.is_empty())
            .collect();
        format!("private [{}]", recipients.join(", "))
    } else {
        format!("{} > {}", message.stream, message.topic)
    }
}

pub fn format_matches_text(filter: &Filter, total: usize, matches: &[&Message]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "MATCH {} of {} message{} for {}",
        matches.len(),
        total,
        if total == 1 { "" } else { "s" },
        filter.describe().cyan()
    );

    if !filter.can_apply_locally() {
        let _ = writeln!(
            out,
            "{}",
            "Note: this narrow needs the server; every message passes the local pre-filter"
                .yellow()
        );
    }

    for message in matches {
        let ts = message
            .timestamp
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>8}  {}  {}  {}",
            message.id.to_string().green(),
            ts,
            message_location(message),
            message.content.replace('\n', "\\n")
        );
    }

    out
}

pub fn format_matches_json(filter: &Filter, total: usize, matches: &[&Message]) -> String {
    serde_json::to_string_pretty(&json!({
        "match": {
            "query": filter.unparse(),
            "description": filter.describe(),
            "can_apply_locally": filter.can_apply_locally(),
            "total": total,
            "matches": matches.len(),
            "ids": matches.iter().map(|m| m.id).collect::<Vec<_>>(),
        }
    }))
    .unwrap_or_else(|_| "{\"match\":{\"error\":\"failed to serialize matches\"}}".into())
}

pub fn format_first_match(id: Option<MessageId>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => match id {
            Some(id) => format!("{id}\n"),
            None => "No matching message found.\n".to_string(),
        },
        OutputFormat::Json => serde_json::to_string_pretty(&json!({ "first_id": id }))
            .unwrap_or_else(|_| "{\"error\":\"failed to serialize first id\"}".into()),
    }
}
