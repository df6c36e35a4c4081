//! Base EVA-DTS interpretation with no vendor extensions.
//!
//! | Record | Canonical mapping |
//! |--------|-------------------|
//! | `CA17` | tube, denomination, coin count |
//! | `VA1` | vend total value, vend count |
//! | `CA2` | declined (VA1 carries the vend total) |
//! | `PA1` | slot id, price |
//! | `PA2` | vend count, cash total |

use super::{CashEntry, Dialect, FieldReader, ManufacturerProfile, ProductEntry};
use crate::fields::SplitRecord;
use crate::record::RecordKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl Dialect for Generic {
    fn profile(&self) -> ManufacturerProfile {
        ManufacturerProfile::Generic
    }

    fn map_cash_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<CashEntry> {
        match record.kind {
            RecordKind::CashDenomination => {
                let value = fields.amount(1);
                let count = fields.count(2);
                Some(denomination(fields, 2, value, count))
            }
            RecordKind::VendTotals => Some(CashEntry::VendTotal {
                value: fields.amount(0),
                vends: fields.count(1),
            }),
            _ => None,
        }
    }

    fn map_product_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<ProductEntry> {
        match record.kind {
            RecordKind::ProductIdentity => Some(ProductEntry::Slot {
                slot_id: fields.text(0),
                price: fields.amount(1),
            }),
            RecordKind::ProductSales => Some(ProductEntry::Sales {
                vend_count: fields.count(0),
                cash_total: fields.amount(1),
            }),
            _ => None,
        }
    }
}

/// Denomination entry whose coin count is read from field `count_index`.
pub(super) fn denomination(fields: &mut FieldReader<'_>, count_index: usize, denomination: i64, count: u64) -> CashEntry {
    CashEntry::Denomination {
        denomination,
        count,
        value: fields.total(count_index, denomination, count),
    }
}
