//! Ingestion report: the parser's output contract and its only error channel.
//!
//! Every stage appends [`IngestionIssue`]s to an [`IssueLog`]; nothing is dropped.
//! [`IngestionReport::assemble`] orders the issues, derives the status and
//! collects the provenance trail (raw records referenced by issues).

use crate::audit::CanonicalAudit;
use crate::dialect::ManufacturerProfile;
use crate::record::RawRecord;
use crate::validate::BlockVerdict;
use serde::Serialize;
use std::collections::BTreeMap;

/// Issue severity, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

/// Identifies which check produced the issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Input held no non-empty lines.
    NoRecords,
    /// No identity record in any block.
    NoIdentity,
    /// Identity taken from a block that failed integrity checks.
    IdentityRecovered,
    DuplicateIdentity,
    ConflictingIdentity,
    UnclassifiedRecord,
    /// Fewer fields than the record type's minimum; padded with missing markers.
    FieldsPadded,
    /// More fields than the record type's maximum; overflow joined into the last field.
    FieldsOverflow,
    InvalidNumber,
    SequenceGap,
    MissingTrailer,
    RecordCountMismatch,
    ChecksumMismatch,
    ControlNumberMismatch,
    UnmatchedClose,
    StrayRecord,
    MissingTransmissionTrailer,
    BlockCountMismatch,
    DialectAssumed,
    DuplicateDenomination,
    OrphanProductSales,
    PriceChanged,
    PeriodUnavailable,
    ReconciliationMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionIssue {
    pub severity: Severity,
    pub record_sequence: Option<u32>,
    pub message: String,
    pub code: IssueCode,
    /// Numeric reconciliation delta, for `ReconciliationMismatch`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

impl IngestionIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        record_sequence: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        IngestionIssue {
            severity,
            record_sequence,
            message: message.into(),
            code,
            delta: None,
        }
    }

    pub fn with_delta(mut self, delta: i64) -> Self {
        self.delta = Some(delta);
        self
    }
}

/// Append-only issue sink threaded through the pipeline.
#[derive(Debug, Default, Clone)]
pub struct IssueLog {
    issues: Vec<IngestionIssue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: IngestionIssue) {
        tracing::debug!(
            severity = ?issue.severity,
            code = ?issue.code,
            record = ?issue.record_sequence,
            "{}",
            issue.message
        );
        self.issues.push(issue);
    }

    pub fn info(&mut self, code: IssueCode, record: Option<u32>, message: impl Into<String>) {
        self.push(IngestionIssue::new(Severity::Info, code, record, message));
    }

    pub fn warning(&mut self, code: IssueCode, record: Option<u32>, message: impl Into<String>) {
        self.push(IngestionIssue::new(Severity::Warning, code, record, message));
    }

    pub fn error(&mut self, code: IssueCode, record: Option<u32>, message: impl Into<String>) {
        self.push(IngestionIssue::new(Severity::Error, code, record, message));
    }

    pub fn fatal(&mut self, code: IssueCode, record: Option<u32>, message: impl Into<String>) {
        self.push(IngestionIssue::new(Severity::Fatal, code, record, message));
    }

    pub fn has_fatal(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Fatal)
    }

    pub fn issues(&self) -> &[IngestionIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<IngestionIssue> {
        self.issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IngestionStatus {
    Success,
    PartialSuccess,
    FatalFailure,
}

impl IngestionStatus {
    /// `FatalFailure` on any Fatal, `PartialSuccess` on any Warning or Error.
    pub fn from_issues(issues: &[IngestionIssue]) -> Self {
        match issues.iter().map(|i| i.severity).max() {
            Some(Severity::Fatal) => IngestionStatus::FatalFailure,
            Some(Severity::Error) | Some(Severity::Warning) => IngestionStatus::PartialSuccess,
            Some(Severity::Info) | None => IngestionStatus::Success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub status: IngestionStatus,
    pub dialect: ManufacturerProfile,
    /// Non-null iff `status != FatalFailure`.
    pub canonical: Option<CanonicalAudit>,
    pub blocks: Vec<BlockVerdict>,
    /// Ordered by record sequence (stable); file-level issues last.
    pub issues: Vec<IngestionIssue>,
    /// Raw records referenced by issues, once each, in sequence order.
    pub provenance: Vec<RawRecord>,
}

impl IngestionReport {
    pub fn assemble(
        dialect: ManufacturerProfile,
        canonical: Option<CanonicalAudit>,
        blocks: Vec<BlockVerdict>,
        log: IssueLog,
        records: &[RawRecord],
    ) -> Self {
        let mut issues = log.into_issues();
        issues.sort_by_key(|i| i.record_sequence.unwrap_or(u32::MAX));
        let status = IngestionStatus::from_issues(&issues);
        let canonical = match status {
            IngestionStatus::FatalFailure => None,
            _ => canonical,
        };

        let by_seq: BTreeMap<u32, &RawRecord> =
            records.iter().map(|r| (r.sequence_index, r)).collect();
        let mut provenance: Vec<RawRecord> = Vec::new();
        for seq in issues.iter().filter_map(|i| i.record_sequence) {
            if provenance.last().map(|r| r.sequence_index) == Some(seq) {
                continue;
            }
            if let Some(r) = by_seq.get(&seq) {
                provenance.push((*r).clone());
            }
        }

        IngestionReport {
            status,
            dialect,
            canonical,
            blocks,
            issues,
            provenance,
        }
    }

    pub fn issues_with(&self, severity: Severity) -> impl Iterator<Item = &IngestionIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn issues_coded(&self, code: IssueCode) -> impl Iterator<Item = &IngestionIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
