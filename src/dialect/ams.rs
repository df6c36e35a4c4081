//! AMS (Automated Merchandising Systems) controllers.
//!
//! Signature: an `AM1` header record, or a `CA17` carrying exactly two fields
//! whose value is written with a decimal point.
//! AMS writes money with a decimal point in major units ("1.25") and its `CA17`
//! has no tube number: `CA17*value*count`.

use super::generic::denomination;
use super::{CashEntry, Dialect, FieldReader, ManufacturerProfile, ProductEntry, Signature};
use crate::fields::SplitRecord;
use crate::record::{Arity, RawRecord, RecordKind, RecordRegistry};

#[derive(Debug, Clone, Copy, Default)]
pub struct Ams;

impl Dialect for Ams {
    fn profile(&self) -> ManufacturerProfile {
        ManufacturerProfile::Ams
    }

    fn signatures(&self) -> &'static [Signature] {
        &[
            Signature::RecordCode("AM1"),
            Signature::DecimalFieldCount { code: "CA17", fields: 2 },
        ]
    }

    fn classify_ambiguous_record(&self, record: &RawRecord) -> RecordKind {
        match record.type_code.as_str() {
            "AM1" => RecordKind::Informational,
            _ => record.kind,
        }
    }

    fn arity(&self, record: &RawRecord) -> Option<Arity> {
        match record.type_code.as_str() {
            "CA17" => Some(Arity::new(2, 6)),
            code => RecordRegistry::global().arity_of(code),
        }
    }

    fn map_cash_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<CashEntry> {
        match record.kind {
            RecordKind::CashDenomination => {
                let value = fields.decimal_amount(0);
                let count = fields.count(1);
                Some(denomination(fields, 1, value, count))
            }
            RecordKind::VendTotals => Some(CashEntry::VendTotal {
                value: fields.decimal_amount(0),
                vends: fields.count(1),
            }),
            _ => None,
        }
    }

    fn map_product_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<ProductEntry> {
        match record.kind {
            RecordKind::ProductIdentity => Some(ProductEntry::Slot {
                slot_id: fields.text(0),
                price: fields.decimal_amount(1),
            }),
            RecordKind::ProductSales => Some(ProductEntry::Sales {
                vend_count: fields.count(0),
                cash_total: fields.decimal_amount(1),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::split_fields;
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
    fn two_field_ca17_is_not_padded() {
        let r = raw("CA17", &["0.25", "40"]);
        let mut log = IssueLog::new();
        let s = split_fields(&r, r.kind, Ams.arity(&r), '*', &mut log);
        assert!(log.is_empty());
        let mut reader = FieldReader::new(&s, &mut log);
        assert_eq!(
            Ams.map_cash_fields(&s, &mut reader),
            Some(CashEntry::Denomination { denomination: 25, count: 40, value: 1000 })
        );
    }

    #[test]
    fn decimal_prices() {
        let r = raw("PA1", &["12", "1.25"]);
        let mut log = IssueLog::new();
        let s = split_fields(&r, r.kind, Ams.arity(&r), '*', &mut log);
        let mut reader = FieldReader::new(&s, &mut log);
        assert_eq!(
            Ams.map_product_fields(&s, &mut reader),
            Some(ProductEntry::Slot { slot_id: "12".into(), price: 125 })
        );
    }
}
