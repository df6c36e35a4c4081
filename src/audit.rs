//! Canonical, manufacturer-independent audit produced for each usable file.
//!
//! Money is in minor currency units (cents). Consumers must check
//! [`Reconciliation::delta`] and [`Reconciliation::suspect`] before trusting totals.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MachineIdentity {
    pub serial: String,
    pub model_code: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DenominationTotal {
    pub count: u64,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CashAudit {
    /// Keyed by denomination (coin/bill value in minor units).
    pub currency_totals: BTreeMap<i64, DenominationTotal>,
    pub vend_total: i64,
    pub vend_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAudit {
    pub slot_id: String,
    pub price: i64,
    pub vend_count: u64,
    pub cash_total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditPeriod {
    /// Previous audit read.
    pub start: Option<NaiveDateTime>,
    /// This audit read.
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Σ vend_count × price over `product_audit`.
    pub slot_sum_vend_total: i64,
    /// `cash_audit.vend_total`.
    pub machine_reported_total: i64,
    /// `machine_reported_total - slot_sum_vend_total`.
    pub delta: i64,
    /// Set when a contributing block failed a trailer check.
    pub suspect: bool,
}

impl Reconciliation {
    pub fn compute(product_audit: &[SlotAudit], cash_audit: &CashAudit, suspect: bool) -> Self {
        let slot_sum_vend_total = product_audit.iter().fold(0i64, |sum, s| {
            let sales = i64::try_from(s.vend_count)
                .unwrap_or(i64::MAX)
                .saturating_mul(s.price);
            sum.saturating_add(sales)
        });
        Reconciliation {
            slot_sum_vend_total,
            machine_reported_total: cash_audit.vend_total,
            delta: cash_audit.vend_total.saturating_sub(slot_sum_vend_total),
            suspect,
        }
    }

    pub fn within(&self, tolerance: i64) -> bool {
        self.delta.unsigned_abs() <= tolerance.max(0).unsigned_abs()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalAudit {
    pub machine_identity: MachineIdentity,
    pub cash_audit: CashAudit,
    /// One entry per slot, in first-seen order.
    pub product_audit: Vec<SlotAudit>,
    pub period: AuditPeriod,
    pub reconciliation: Reconciliation,
}

impl CanonicalAudit {
    pub fn slot(&self, slot_id: &str) -> Option<&SlotAudit> {
        self.product_audit.iter().find(|s| s.slot_id == slot_id)
    }
}
