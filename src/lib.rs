//! # dexaudit: DEX vending audit ingestion
//!
//! Parses DEX (EVA-DTS) transmissions uploaded by vending machines into a single
//! manufacturer-independent [`CanonicalAudit`], with every anomaly reported as an
//! [`IngestionIssue`] in the returned [`IngestionReport`].
//!
//! ## Pipeline
//!
//! ```text
//! bytes ─▶ tokenizer ─▶ classify ─▶ block ─▶ dialect::select_dialect
//!        ─▶ fields (arity) ─▶ validate (per block) ─▶ dialect::adapt ─▶ normalize ─▶ report
//! ```
//!
//! - **Blocks**: `ST`..`SE` runs inside an optional `DXS`/`DXE` envelope. A block
//!   without its trailer is excluded; sibling blocks are still used.
//! - **Dialects**: Vendo, AMS and Crane variants are sniffed once per file; the
//!   Generic base protocol is the fallback.
//! - **Severities**: `Info` / `Warning` / `Error` / `Fatal`. Only `Fatal` (no
//!   records, no identity) suppresses the canonical audit.
//!
//! ## Usage
//!
//! ```no_run
//! use dexaudit::{DexParser, IngestionStatus, ParserConfig};
//!
//! let parser = DexParser::new(ParserConfig::default().with_tolerance(5));
//! let report = parser.parse_bytes(&std::fs::read("machine.dex").unwrap());
//! if report.status != IngestionStatus::FatalFailure {
//!     let audit = report.canonical.as_ref().unwrap();
//!     println!("{} slots, delta {}", audit.product_audit.len(), audit.reconciliation.delta);
//! }
//! ```
//!
//! Parsing holds no shared mutable state: one [`DexParser`] can serve many threads.

pub mod audit;
pub mod block;
pub mod classify;
pub mod config;
pub mod dialect;
pub mod fields;
pub mod normalize;
pub mod record;
pub mod render;
pub mod report;
pub mod tokenizer;
pub mod validate;

pub use audit::{CanonicalAudit, CashAudit, MachineIdentity, Reconciliation, SlotAudit};
pub use config::{ConfigError, ParserConfig, ProtocolProfile, TypeCodeMode};
pub use dialect::{Dialect, ManufacturerProfile};
pub use record::{RawRecord, RecordKind};
pub use report::{IngestionIssue, IngestionReport, IngestionStatus, IssueCode, Severity};

use block::group_blocks;
use classify::classify_all;
use dialect::select_dialect;
use fields::{split_fields, SplitRecord};
use normalize::{normalize, BlockRecords};
use report::IssueLog;
use std::collections::HashMap;
use tokenizer::{decode_latin1, tokenize};
use validate::{validate_block, validate_envelope, BlockVerdict};

/// Parse one transmission with the default configuration.
pub fn parse(source: &str) -> IngestionReport {
    DexParser::default().parse_str(source)
}

#[derive(Debug, Clone, Default)]
pub struct DexParser {
    config: ParserConfig,
}

impl DexParser {
    pub fn new(config: ParserConfig) -> Self {
        DexParser { config }
    }

    /// Parse a raw upload; bytes are read as Latin-1.
    pub fn parse_bytes(&self, bytes: &[u8]) -> IngestionReport {
        self.parse_str(&decode_latin1(bytes))
    }

    #[tracing::instrument(skip_all, fields(chars = source.len()))]
    pub fn parse_str(&self, source: &str) -> IngestionReport {
        let profile = &self.config.profile;
        let mut log = IssueLog::new();

        let lines = tokenize(source, profile);
        let records = classify_all(&lines, profile);
        if records.is_empty() {
            log.fatal(IssueCode::NoRecords, None, "no records found");
            return IngestionReport::assemble(
                ManufacturerProfile::Generic,
                None,
                Vec::new(),
                log,
                &records,
            );
        }

        let layout = group_blocks(&records);
        let last_sequence = records.last().map(|r| r.sequence_index).unwrap_or(0);
        validate_envelope(&layout, last_sequence, &mut log);

        let dialect = select_dialect(&layout.sniff_window(&records), &mut log);

        let split: Vec<SplitRecord<'_>> = records
            .iter()
            .map(|r| {
                let kind = dialect.classify_ambiguous_record(r);
                if kind == RecordKind::Unclassified {
                    log.info(
                        IssueCode::UnclassifiedRecord,
                        Some(r.sequence_index),
                        format!("unknown record code {:?} retained, not normalized", r.type_code),
                    );
                }
                split_fields(r, kind, dialect.arity(r), profile.delimiter, &mut log)
            })
            .collect();
        let by_sequence: HashMap<u32, &SplitRecord<'_>> =
            split.iter().map(|s| (s.sequence(), s)).collect();

        let verdicts: Vec<BlockVerdict> = layout
            .blocks
            .iter()
            .map(|b| validate_block(b, &mut log))
            .collect();
        let blocks: Vec<BlockRecords<'_, '_>> = layout
            .blocks
            .iter()
            .zip(verdicts.iter())
            .map(|(b, verdict)| BlockRecords {
                verdict,
                records: b
                    .records
                    .iter()
                    .filter_map(|r| by_sequence.get(&r.sequence_index).copied())
                    .collect(),
            })
            .collect();

        let canonical = normalize(
            dialect,
            &blocks,
            self.config.reconciliation_tolerance,
            &mut log,
        );

        let report =
            IngestionReport::assemble(dialect.profile(), canonical, verdicts, log, &records);
        tracing::info!(
            status = ?report.status,
            dialect = %report.dialect,
            issues = report.issues.len(),
            "ingestion finished"
        );
        report
    }
}
