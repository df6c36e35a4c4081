//! Field splitter: fit a record's raw fields to its type's arity.
//!
//! Too few fields are padded with [`Field::Missing`] (one `Warning`); too many are
//! folded into the last slot, rejoined with the delimiter (one `Warning`). Arity
//! mismatches never abort a block.

use crate::record::{Arity, RawRecord, RecordKind};
use crate::report::{IssueCode, IssueLog};

/// A single field slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Present(String),
    /// Sentinel for a slot the device did not send.
    Missing,
}

impl Field {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Present(s) => Some(s),
            Field::Missing => None,
        }
    }

    /// Present and non-empty text.
    pub fn text(&self) -> Option<&str> {
        self.as_str().filter(|s| !s.is_empty())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }
}

/// A record with arity-fitted field slots and its effective (dialect-resolved) kind.
#[derive(Debug, Clone)]
pub struct SplitRecord<'a> {
    pub record: &'a RawRecord,
    pub kind: RecordKind,
    pub fields: Vec<Field>,
}

static MISSING: Field = Field::Missing;

impl<'a> SplitRecord<'a> {
    pub fn sequence(&self) -> u32 {
        self.record.sequence_index
    }

    pub fn field(&self, index: usize) -> &Field {
        self.fields.get(index).unwrap_or(&MISSING)
    }
}

/// Fit `record.fields` to `arity`; `None` keeps the fields as sent.
pub fn split_fields<'a>(
    record: &'a RawRecord,
    kind: RecordKind,
    arity: Option<Arity>,
    delimiter: char,
    log: &mut IssueLog,
) -> SplitRecord<'a> {
    let mut fields: Vec<Field> = record
        .fields
        .iter()
        .map(|f| Field::Present(f.clone()))
        .collect();

    if let Some(arity) = arity {
        let n = fields.len();
        if n < arity.min {
            log.warning(
                IssueCode::FieldsPadded,
                Some(record.sequence_index),
                format!(
                    "{} has {} field(s), expected at least {}; missing fields padded",
                    record.type_code, n, arity.min
                ),
            );
            fields.resize(arity.min, Field::Missing);
        } else if n > arity.max && arity.max > 0 {
            log.warning(
                IssueCode::FieldsOverflow,
                Some(record.sequence_index),
                format!(
                    "{} has {} field(s), expected at most {}; overflow joined into last field",
                    record.type_code, n, arity.max
                ),
            );
            let overflow = record.fields[arity.max - 1..].join(&delimiter.to_string());
            fields.truncate(arity.max - 1);
            fields.push(Field::Present(overflow));
        }
    }

    SplitRecord {
        record,
        kind,
        fields,
    }
}
