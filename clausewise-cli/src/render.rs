//! Terminal and JSON rendering of command results.

use clausewise_core::presets::SUGGESTED_QUERIES;
use clausewise_core::{ComplianceResponse, QaResponse, Rule};
use serde::Serialize;
use std::fmt::Write;

/// Sources listed after a compliance report.
const COMPLIANCE_SOURCES_SHOWN: usize = 5;
/// Sources listed after an answer.
const ANSWER_SOURCES_SHOWN: usize = 3;

/// `{"ok": true, "data": ...}`
pub fn ok_envelope<T: Serialize + ?Sized>(data: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({ "ok": true, "data": data }))
}

/// `{"ok": false, "error": "..."}`
pub fn error_envelope(error: &anyhow::Error) -> String {
    serde_json::json!({ "ok": false, "error": format!("{:#}", error) }).to_string()
}

pub fn compliance_report(response: &ComplianceResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📋 Compliance Analysis");
    let _ = writeln!(out, "Query: {}\n", response.query);
    let _ = writeln!(out, "{}\n", response.response.trim_end());
    let _ = writeln!(out, "📄 Sources");
    let _ = writeln!(out, "Documents analyzed: {}", response.num_sources);
    write_sources(&mut out, &response.sources, COMPLIANCE_SOURCES_SHOWN);
    out
}

pub fn answer_report(response: &QaResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", response.answer.trim_end());
    let _ = writeln!(out, "📚 Sources");
    write_sources(&mut out, &response.sources, ANSWER_SOURCES_SHOWN);
    out
}

fn write_sources(out: &mut String, sources: &[String], limit: usize) {
    if sources.is_empty() {
        let _ = writeln!(out, "  (no matching contract sections)");
        return;
    }
    for (i, source) in sources.iter().take(limit).enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, source);
    }
    if sources.len() > limit {
        let _ = writeln!(out, "  ... and {} more", sources.len() - limit);
    }
}

pub fn rules_report(rules: &[&Rule]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Showing {} rules\n", rules.len());
    for rule in rules {
        let _ = writeln!(out, "{} {}: {}", rule.severity.marker(), rule.id, rule.name);
        let _ = writeln!(out, "   Description: {}", rule.description);
        let _ = writeln!(out, "   Severity:    {}", rule.severity);
        let _ = writeln!(out, "   Check:       {}", rule.check);
        let _ = writeln!(out, "   Remediation: {}", rule.remediation);
        if !rule.related_columns.is_empty() {
            let _ = writeln!(out, "   Related:     {}", rule.related_columns.join(", "));
        }
        out.push('\n');
    }
    out
}

pub fn presets_report() -> String {
    let mut out = String::from("💡 Suggested queries\n\n");
    for preset in SUGGESTED_QUERIES.iter() {
        let _ = writeln!(out, "  {:<16} {}", preset.slug, preset.query);
    }
    let _ = writeln!(out, "\nRun one with: clausewise check --preset <name>");
    out
}

pub fn presets_json() -> String {
    let presets: Vec<_> = SUGGESTED_QUERIES
        .iter()
        .map(|p| serde_json::json!({ "slug": p.slug, "query": p.query }))
        .collect();
    serde_json::json!({ "ok": true, "data": presets }).to_string()
}
