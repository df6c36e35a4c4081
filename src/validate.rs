//! Per-block integrity checks: sequence continuity and the trailer (record count,
//! control number, `G85` checksum).
//!
//! A block's verdict decides whether it feeds the canonical aggregate:
//!
//! | Finding | Severity | Block |
//! |---------|----------|-------|
//! | sequence gap | Warning | kept |
//! | control number differs | Warning | kept |
//! | record count / checksum mismatch | Error | kept, marked suspect |
//! | no `SE` trailer | Error | excluded |

use crate::block::{Block, BlockLayout};
use crate::record::{RawRecord, RecordKind};
use crate::report::{IssueCode, IssueLog};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockVerdict {
    pub index: usize,
    pub start_sequence: u32,
    pub end_sequence: u32,
    pub terminated: bool,
    pub declared_count: Option<u32>,
    pub observed_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_checksum: Option<String>,
    /// Trailer mismatch: totals from this block are usable but suspect.
    pub suspect: bool,
    /// Whether the block feeds the canonical aggregate.
    pub included: bool,
}

pub fn validate_block(block: &Block<'_>, log: &mut IssueLog) -> BlockVerdict {
    check_sequence(&block.records, log);

    let mut verdict = BlockVerdict {
        index: block.index,
        start_sequence: block.opener().sequence_index,
        end_sequence: block.last_sequence(),
        terminated: block.is_terminated(),
        declared_count: None,
        observed_count: block.records.len() as u32,
        declared_checksum: None,
        computed_checksum: None,
        suspect: false,
        included: true,
    };

    let closer = match block.closer {
        Some(c) => c,
        None => {
            log.error(
                IssueCode::MissingTrailer,
                Some(verdict.end_sequence),
                format!(
                    "block {} (opened at record {}) has no trailer; its records are excluded",
                    block.index, verdict.start_sequence
                ),
            );
            verdict.included = false;
            verdict.suspect = true;
            return verdict;
        }
    };

    verdict.declared_count = closer.fields.first().and_then(|f| f.parse::<u32>().ok());
    match verdict.declared_count {
        Some(n) if n == verdict.observed_count => {}
        Some(n) => {
            log.error(
                IssueCode::RecordCountMismatch,
                Some(closer.sequence_index),
                format!(
                    "block {} trailer declares {} record(s), observed {}",
                    block.index, n, verdict.observed_count
                ),
            );
            verdict.suspect = true;
        }
        None => {
            log.error(
                IssueCode::RecordCountMismatch,
                Some(closer.sequence_index),
                format!("block {} trailer record count is unreadable", block.index),
            );
            verdict.suspect = true;
        }
    }

    let opened = block.opener().fields.get(1).map(|s| s.as_str());
    let closed = closer.fields.get(1).map(|s| s.as_str());
    if opened != closed {
        log.warning(
            IssueCode::ControlNumberMismatch,
            Some(closer.sequence_index),
            format!(
                "block {} control number {:?} does not match trailer {:?}",
                block.index,
                opened.unwrap_or(""),
                closed.unwrap_or("")
            ),
        );
    }

    if let Some(pos) = block
        .records
        .iter()
        .position(|r| r.kind == RecordKind::Checksum)
    {
        let g85 = block.records[pos];
        let computed = format!("{:04X}", checksum(&block.records[..pos]));
        let declared = g85
            .fields
            .first()
            .map(|s| s.trim().to_ascii_uppercase())
            .unwrap_or_default();
        if declared != computed {
            log.error(
                IssueCode::ChecksumMismatch,
                Some(g85.sequence_index),
                format!(
                    "block {} checksum declared {:?}, computed {}",
                    block.index, declared, computed
                ),
            );
            verdict.suspect = true;
        }
        verdict.declared_checksum = Some(declared);
        verdict.computed_checksum = Some(computed);
    }

    tracing::debug!(
        block = verdict.index,
        suspect = verdict.suspect,
        records = verdict.observed_count,
        "validated block"
    );
    verdict
}

/// Checks outside the blocks: envelope trailer, block count, strays and orphan closers.
pub fn validate_envelope(layout: &BlockLayout<'_>, last_sequence: u32, log: &mut IssueLog) {
    for r in &layout.orphan_closers {
        log.warning(
            IssueCode::UnmatchedClose,
            Some(r.sequence_index),
            "block trailer with no open block; ignored",
        );
    }
    for r in &layout.strays {
        log.warning(
            IssueCode::StrayRecord,
            Some(r.sequence_index),
            format!("{} record outside any block; not normalized", r.type_code),
        );
    }
    match (layout.transmission_start, layout.transmission_end) {
        (Some(_), None) => log.warning(
            IssueCode::MissingTransmissionTrailer,
            Some(last_sequence),
            "transmission header without DXE trailer",
        ),
        (_, Some(end)) => {
            let declared = end.fields.get(1).and_then(|f| f.parse::<usize>().ok());
            if let Some(n) = declared {
                if n != layout.blocks.len() {
                    log.warning(
                        IssueCode::BlockCountMismatch,
                        Some(end.sequence_index),
                        format!(
                            "transmission trailer declares {} block(s), found {}",
                            n,
                            layout.blocks.len()
                        ),
                    );
                }
            }
        }
        (None, None) => {}
    }
}

/// Every record must follow its predecessor by exactly one.
///
/// The tokenizer numbers kept lines densely, so records from one parse never gap;
/// this only fires for record slices assembled elsewhere (filtered or re-sequenced).
pub fn check_sequence(records: &[&RawRecord], log: &mut IssueLog) {
    for pair in records.windows(2) {
        let (prev, cur) = (pair[0].sequence_index, pair[1].sequence_index);
        if cur != prev.wrapping_add(1) {
            log.warning(
                IssueCode::SequenceGap,
                Some(cur),
                format!(
                    "record {} follows record {}: record dropped or reordered",
                    cur, prev
                ),
            );
        }
    }
}

/// CRC-16/ARC over each record's text followed by CRLF, as written by the device.
pub fn checksum(records: &[&RawRecord]) -> u16 {
    records.iter().fold(0, |crc, r| {
        let crc = compute_crc(crc, r.raw_text.as_bytes());
        compute_crc(crc, b"\r\n")
    })
}

/// Accumulate a slice of bytes into a CRC-16/ARC value.
pub fn compute_crc(init: u16, bytes: &[u8]) -> u16 {
    bytes.iter().fold(init, |acc, b| crc_byte(acc, *b))
}

fn crc_byte(mut crc: u16, b: u8) -> u16 {
    const CRC_TABLE: [u16; 16] = [
        0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
        0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
    ];

    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[(b & 0xF) as usize];

    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc ^ tmp ^ CRC_TABLE[((b >> 4) & 0xF) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::group_blocks;
    use crate::classify::classify_all;
    use crate::config::ProtocolProfile;
    use crate::report::Severity;
    use crate::tokenizer::tokenize;

    fn records(src: &str) -> Vec<RawRecord> {
        let p = ProtocolProfile::default();
        classify_all(&tokenize(src, &p), &p)
    }

    #[test]
    fn crc16_arc_check_value() {
        assert_eq!(compute_crc(0, b"123456789"), 0xBB3D);
    }

    #[test]
    fn well_formed_block() {
        let recs = records("ST*001*0001\nID1*1*M\nSE*3*0001\n");
        let layout = group_blocks(&recs);
        let mut log = IssueLog::new();
        let v = validate_block(&layout.blocks[0], &mut log);
        assert!(log.is_empty(), "{:?}", log.issues());
        assert!(v.included && !v.suspect);
        assert_eq!(v.declared_count, Some(3));
    }

    #[test]
    fn count_mismatch_is_error_and_suspect() {
        let recs = records("ST*001*0001\nID1*1*M\nSE*9*0001\n");
        let layout = group_blocks(&recs);
        let mut log = IssueLog::new();
        let v = validate_block(&layout.blocks[0], &mut log);
        assert!(v.included && v.suspect);
        assert_eq!(log.issues()[0].code, IssueCode::RecordCountMismatch);
        assert_eq!(log.issues()[0].severity, Severity::Error);
        assert_eq!(log.issues()[0].record_sequence, Some(3));
    }

    #[test]
    fn missing_trailer_excludes_block() {
        let recs = records("ST*001*0001\nID1*1*M\nPA1*1*5\n");
        let layout = group_blocks(&recs);
        let mut log = IssueLog::new();
        let v = validate_block(&layout.blocks[0], &mut log);
        assert!(!v.included);
        assert_eq!(log.len(), 1);
        assert_eq!(log.issues()[0].code, IssueCode::MissingTrailer);
        assert_eq!(log.issues()[0].severity, Severity::Error);
        assert_eq!(log.issues()[0].record_sequence, Some(3));
    }

    #[test]
    fn control_number_mismatch_warns() {
        let recs = records("ST*001*0001\nSE*2*0002\n");
        let layout = group_blocks(&recs);
        let mut log = IssueLog::new();
        let v = validate_block(&layout.blocks[0], &mut log);
        assert!(!v.suspect);
        assert_eq!(log.issues()[0].code, IssueCode::ControlNumberMismatch);
    }

    #[test]
    fn checksum_verified() {
        let head = records("ST*001*0001\nID1*1*M\n");
        let refs: Vec<&RawRecord> = head.iter().collect();
        let crc = format!("{:04X}", checksum(&refs));
        let good = records(&format!("ST*001*0001\nID1*1*M\nG85*{}\nSE*4*0001\n", crc));
        let layout = group_blocks(&good);
        let mut log = IssueLog::new();
        let v = validate_block(&layout.blocks[0], &mut log);
        assert!(log.is_empty(), "{:?}", log.issues());
        assert_eq!(v.computed_checksum.as_deref(), Some(crc.as_str()));

        let bad = records("ST*001*0001\nID1*1*M\nG85*0000\nSE*4*0001\n");
        let layout = group_blocks(&bad);
        let mut log = IssueLog::new();
        let v = validate_block(&layout.blocks[0], &mut log);
        assert!(v.suspect);
        assert_eq!(log.issues()[0].code, IssueCode::ChecksumMismatch);
    }

    #[test]
    fn envelope_checks() {
        let recs = records("DXS*X\nSE*2*1\nMA5*A\nST*001*1\nSE*2*1\nDXE*1*3\n");
        let layout = group_blocks(&recs);
        let mut log = IssueLog::new();
        validate_envelope(&layout, 6, &mut log);
        let codes: Vec<_> = log.issues().iter().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                IssueCode::UnmatchedClose,
                IssueCode::StrayRecord,
                IssueCode::BlockCountMismatch
            ]
        );

        let recs = records("DXS*X\nST*001*1\nSE*2*1\n");
        let layout = group_blocks(&recs);
        let mut log = IssueLog::new();
        validate_envelope(&layout, 3, &mut log);
        assert_eq!(log.issues()[0].code, IssueCode::MissingTransmissionTrailer);
        assert_eq!(log.issues()[0].record_sequence, Some(3));
    }

    #[test]
    fn sequence_gap_warns_per_gap() {
        let recs = records("ST*001*0001\nID1*1\nPA1*1*5\nPA2*1*5\n");
        let mut refs: Vec<&RawRecord> = recs.iter().collect();
        refs.remove(2);
        let mut log = IssueLog::new();
        check_sequence(&refs, &mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(log.issues()[0].record_sequence, Some(4));
        assert_eq!(log.issues()[0].severity, Severity::Warning);
    }
}
