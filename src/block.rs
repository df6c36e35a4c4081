//! Block grouping: cut the record stream into `ST`..`SE` blocks inside an optional
//! `DXS`/`DXE` envelope.
//!
//! A block that never sees its `SE` is kept as unterminated (`closer == None`) so
//! the validator can report it; records outside any block are kept as strays.

use crate::record::{RawRecord, RecordKind};

#[derive(Debug, Clone)]
pub struct Block<'a> {
    /// 1-based block number within the transmission.
    pub index: usize,
    /// Every record from the opener up to and including the closer.
    pub records: Vec<&'a RawRecord>,
    pub closer: Option<&'a RawRecord>,
}

impl<'a> Block<'a> {
    pub fn opener(&self) -> &'a RawRecord {
        self.records[0]
    }

    pub fn last_sequence(&self) -> u32 {
        self.records
            .last()
            .map(|r| r.sequence_index)
            .unwrap_or_else(|| self.opener().sequence_index)
    }

    pub fn is_terminated(&self) -> bool {
        self.closer.is_some()
    }
}

/// Result of grouping: blocks, envelope records, and records that fit nowhere.
#[derive(Debug, Default)]
pub struct BlockLayout<'a> {
    pub blocks: Vec<Block<'a>>,
    pub transmission_start: Option<&'a RawRecord>,
    pub transmission_end: Option<&'a RawRecord>,
    /// Non-envelope records outside any block.
    pub strays: Vec<&'a RawRecord>,
    /// `SE` records with no open block.
    pub orphan_closers: Vec<&'a RawRecord>,
}

impl<'a> BlockLayout<'a> {
    /// Records of the first block, or every record when there is no block.
    pub fn sniff_window(&self, all: &'a [RawRecord]) -> Vec<&'a RawRecord> {
        match self.blocks.first() {
            Some(b) => b.records.clone(),
            None => all.iter().collect(),
        }
    }
}

pub fn group_blocks(records: &[RawRecord]) -> BlockLayout<'_> {
    let mut layout = BlockLayout::default();
    let mut open: Option<Block<'_>> = None;

    for r in records {
        match r.kind {
            RecordKind::BlockStart => {
                if let Some(b) = open.take() {
                    layout.blocks.push(b);
                }
                open = Some(Block {
                    index: layout.blocks.len() + 1,
                    records: vec![r],
                    closer: None,
                });
            }
            RecordKind::BlockEnd => match open.take() {
                Some(mut b) => {
                    b.records.push(r);
                    b.closer = Some(r);
                    layout.blocks.push(b);
                }
                None => layout.orphan_closers.push(r),
            },
            RecordKind::TransmissionStart => {
                if let Some(b) = open.take() {
                    layout.blocks.push(b);
                }
                if layout.transmission_start.is_none() {
                    layout.transmission_start = Some(r);
                } else {
                    layout.strays.push(r);
                }
            }
            RecordKind::TransmissionEnd => {
                if let Some(b) = open.take() {
                    layout.blocks.push(b);
                }
                if layout.transmission_end.is_none() {
                    layout.transmission_end = Some(r);
                } else {
                    layout.strays.push(r);
                }
            }
            _ => match open.as_mut() {
                Some(b) => b.records.push(r),
                None => layout.strays.push(r),
            },
        }
    }
    if let Some(b) = open.take() {
        layout.blocks.push(b);
    }
    tracing::debug!(
        blocks = layout.blocks.len(),
        strays = layout.strays.len(),
        "grouped blocks"
    );
    layout
}
