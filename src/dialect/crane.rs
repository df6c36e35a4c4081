//! Crane (National) control boards.
//!
//! Signature: the control-board record `CB1`, which Crane sends as the machine
//! identity (`CB1*serial*model*firmware`). `PA202` holds cash plus card sales on
//! these boards, so the cash total is read from `PA204`.

use super::{CashEntry, Dialect, FieldReader, Generic, ManufacturerProfile, ProductEntry, Signature};
use crate::fields::SplitRecord;
use crate::record::{Arity, RawRecord, RecordKind, RecordRegistry};

#[derive(Debug, Clone, Copy, Default)]
pub struct Crane;

impl Dialect for Crane {
    fn profile(&self) -> ManufacturerProfile {
        ManufacturerProfile::Crane
    }

    fn signatures(&self) -> &'static [Signature] {
        &[Signature::RecordCode("CB1")]
    }

    fn classify_ambiguous_record(&self, record: &RawRecord) -> RecordKind {
        match record.type_code.as_str() {
            "CB1" => RecordKind::Identity,
            _ => record.kind,
        }
    }

    fn arity(&self, record: &RawRecord) -> Option<Arity> {
        match record.type_code.as_str() {
            "CB1" => Some(Arity::new(1, 4)),
            code => RecordRegistry::global().arity_of(code),
        }
    }

    fn map_cash_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<CashEntry> {
        Generic.map_cash_fields(record, fields)
    }

    fn map_product_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<ProductEntry> {
        match record.kind {
            RecordKind::ProductSales => Some(ProductEntry::Sales {
                vend_count: fields.count(0),
                cash_total: fields.amount(3),
            }),
            _ => Generic.map_product_fields(record, fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::split_fields;
    use crate::report::IssueLog;

    #[test]
    fn cash_total_from_fourth_field() {
        let r = RawRecord {
            sequence_index: 1,
            type_code: "PA2".to_string(),
            kind: RecordKind::ProductSales,
            fields: ["4", "700", "0", "500"].iter().map(|s| s.to_string()).collect(),
            raw_text: String::new(),
        };
        let mut log = IssueLog::new();
        let s = split_fields(&r, r.kind, Crane.arity(&r), '*', &mut log);
        let mut reader = FieldReader::new(&s, &mut log);
        assert_eq!(
            Crane.map_product_fields(&s, &mut reader),
            Some(ProductEntry::Sales { vend_count: 4, cash_total: 500 })
        );
    }

    #[test]
    fn cb1_is_identity() {
        let r = RawRecord {
            sequence_index: 1,
            type_code: "CB1".to_string(),
            kind: RecordKind::Unclassified,
            fields: vec!["SN9".into(), "C-500".into()],
            raw_text: String::new(),
        };
        assert_eq!(Crane.classify_ambiguous_record(&r), RecordKind::Identity);
    }
}
