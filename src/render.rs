//! Format an ingestion report for display (plain text, one section per concern).

use crate::audit::CanonicalAudit;
use crate::report::{IngestionIssue, IngestionReport, Severity};
use std::fmt::Write;

/// Format minor units as a major-unit amount ("1.25").
pub fn format_money(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

fn severity_label(s: Severity) -> &'static str {
    match s {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Fatal => "fatal",
    }
}

pub fn format_issue(issue: &IngestionIssue) -> String {
    let location = match issue.record_sequence {
        Some(seq) => format!("record {}", seq),
        None => "file".to_string(),
    };
    format!(
        "{}: {}: {} [{:?}]",
        location,
        severity_label(issue.severity),
        issue.message,
        issue.code
    )
}

fn render_audit(out: &mut String, audit: &CanonicalAudit) {
    let id = &audit.machine_identity;
    let _ = writeln!(out, "machine: serial {} model {}", id.serial, id.model_code);
    match (&audit.period.start, &audit.period.end) {
        (Some(s), Some(e)) => {
            let _ = writeln!(out, "period: {} .. {}", s, e);
        }
        (None, Some(e)) => {
            let _ = writeln!(out, "period: .. {}", e);
        }
        _ => {}
    }
    let cash = &audit.cash_audit;
    let _ = writeln!(
        out,
        "cash: vend total {} ({} vends)",
        format_money(cash.vend_total),
        cash.vend_count
    );
    for (denomination, total) in &cash.currency_totals {
        let _ = writeln!(
            out,
            "  {:>8} x {:<6} = {}",
            format_money(*denomination),
            total.count,
            format_money(total.value)
        );
    }
    let _ = writeln!(out, "slots: {}", audit.product_audit.len());
    for slot in &audit.product_audit {
        let _ = writeln!(
            out,
            "  {:<6} price {:>8}  vends {:<6} cash {}",
            slot.slot_id,
            format_money(slot.price),
            slot.vend_count,
            format_money(slot.cash_total)
        );
    }
    let r = &audit.reconciliation;
    let _ = writeln!(
        out,
        "reconciliation: reported {} slots {} delta {}{}",
        format_money(r.machine_reported_total),
        format_money(r.slot_sum_vend_total),
        format_money(r.delta),
        if r.suspect { " (suspect)" } else { "" }
    );
}

pub fn render_report(report: &IngestionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "status: {:?}  dialect: {}", report.status, report.dialect);
    for b in &report.blocks {
        let _ = writeln!(
            out,
            "block {}: records {}..{} {}{}",
            b.index,
            b.start_sequence,
            b.end_sequence,
            if b.included { "included" } else { "excluded" },
            if b.suspect && b.included { ", suspect" } else { "" }
        );
    }
    if let Some(audit) = &report.canonical {
        render_audit(&mut out, audit);
    }
    if !report.issues.is_empty() {
        let _ = writeln!(out, "issues: {}", report.issues.len());
        for issue in &report.issues {
            let _ = writeln!(out, "  {}", format_issue(issue));
        }
    }
    out
}
