//! Vendo controllers.
//!
//! Signature: the Vendo-only extended identity record `ID7`.
//! Differences from generic: the vend total comes from `CA2` (Vendo's `VA1` also
//! counts free vends, so it is declined); `PA1` slot ids are zero padded ("010");
//! coin tubes outside the Vendo coin set are reported as zero.

use super::generic::denomination;
use super::{CashEntry, Dialect, FieldReader, Generic, ManufacturerProfile, ProductEntry, Signature};
use crate::fields::SplitRecord;
use crate::record::{RawRecord, RecordKind};

const COIN_SET: &[i64] = &[5, 10, 25, 100, 200];

#[derive(Debug, Clone, Copy, Default)]
pub struct Vendo;

impl Dialect for Vendo {
    fn profile(&self) -> ManufacturerProfile {
        ManufacturerProfile::Vendo
    }

    fn signatures(&self) -> &'static [Signature] {
        &[Signature::RecordCode("ID7")]
    }

    fn classify_ambiguous_record(&self, record: &RawRecord) -> RecordKind {
        match record.type_code.as_str() {
            "ID7" => RecordKind::Informational,
            _ => record.kind,
        }
    }

    fn map_cash_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<CashEntry> {
        match record.kind {
            RecordKind::CashDenomination => {
                let value = fields.amount(1);
                let count = if COIN_SET.contains(&value) { fields.count(2) } else { 0 };
                Some(denomination(fields, 2, value, count))
            }
            RecordKind::CashSales => Some(CashEntry::VendTotal {
                value: fields.amount(0),
                vends: fields.count(1),
            }),
            RecordKind::VendTotals => None,
            _ => Generic.map_cash_fields(record, fields),
        }
    }

    fn map_product_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<ProductEntry> {
        match Generic.map_product_fields(record, fields)? {
            ProductEntry::Slot { slot_id, price } => Some(ProductEntry::Slot {
                slot_id: unpad_slot(&slot_id),
                price,
            }),
            sales => Some(sales),
        }
    }
}

fn unpad_slot(slot: &str) -> String {
    let trimmed = slot.trim_start_matches('0');
    if trimmed.is_empty() && !slot.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::split_fields;
    use crate::record::RecordRegistry;
    use crate::report::IssueLog;

    fn raw(code: &str, fields: &[&str]) -> RawRecord {
        RawRecord {
            sequence_index: 1,
            type_code: code.to_string(),
            kind: RecordRegistry::global().kind_of(code),
            fields: fields.iter().map(|s| s.to_string()).collect(),
            raw_text: String::new(),
        }
    }

    #[test]
    fn slot_ids_unpadded() {
        assert_eq!(unpad_slot("010"), "10");
        assert_eq!(unpad_slot("000"), "0");
        assert_eq!(unpad_slot("A1"), "A1");
    }

    #[test]
    fn unsupported_denomination_is_zero_valued() {
        let r = raw("CA17", &["03", "50", "12"]);
        let mut log = IssueLog::new();
        let s = split_fields(&r, r.kind, Vendo.arity(&r), '*', &mut log);
        let mut reader = FieldReader::new(&s, &mut log);
        assert_eq!(
            Vendo.map_cash_fields(&s, &mut reader),
            Some(CashEntry::Denomination { denomination: 50, count: 0, value: 0 })
        );
        assert!(log.is_empty());
    }

    #[test]
    fn id7_is_recognised() {
        assert_eq!(
            Vendo.classify_ambiguous_record(&raw("ID7", &["x"])),
            RecordKind::Informational
        );
    }
}
