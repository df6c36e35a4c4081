//! Normalizer / reconciler: fold adapted records of the usable blocks into one
//! [`CanonicalAudit`].
//!
//! Blocks whose verdict is not `included` contribute nothing, except that an
//! identity found only there is recovered (with a warning) rather than failing
//! the whole file.

use crate::audit::{
    AuditPeriod, CanonicalAudit, CashAudit, DenominationTotal, MachineIdentity, Reconciliation,
    SlotAudit,
};
use crate::dialect::{adapt, Adapted, CashEntry, Dialect, FieldReader, ProductEntry};
use crate::fields::SplitRecord;
use crate::record::RecordKind;
use crate::report::{IngestionIssue, IssueCode, IssueLog, Severity};
use crate::validate::BlockVerdict;
use std::collections::HashMap;

/// One validated block and its arity-fitted records (opener to closer).
#[derive(Debug)]
pub struct BlockRecords<'r, 'a> {
    pub verdict: &'r BlockVerdict,
    pub records: Vec<&'r SplitRecord<'a>>,
}

#[derive(Default)]
struct Accumulator {
    identity: Option<(MachineIdentity, u32)>,
    cash: CashAudit,
    slots: Vec<SlotAudit>,
    slot_index: HashMap<String, usize>,
    period: Option<AuditPeriod>,
    suspect: bool,
}

/// `None` (with a `Fatal` issue) when no identity can be located in any block.
pub fn normalize(
    dialect: &dyn Dialect,
    blocks: &[BlockRecords<'_, '_>],
    tolerance: i64,
    log: &mut IssueLog,
) -> Option<CanonicalAudit> {
    let mut acc = Accumulator::default();

    for block in blocks.iter().filter(|b| b.verdict.included) {
        acc.suspect |= block.verdict.suspect;
        let mut current_slot: Option<usize> = None;
        for record in &block.records {
            match adapt(dialect, record, log) {
                Adapted::Identity(id) => acc.add_identity(id, record.sequence(), log),
                Adapted::Cash(entry) => acc.add_cash(entry, record.sequence(), log),
                Adapted::Product(ProductEntry::Slot { slot_id, price }) => {
                    current_slot = Some(acc.upsert_slot(slot_id, price, record.sequence(), log));
                }
                Adapted::Product(ProductEntry::Sales { vend_count, cash_total }) => match current_slot {
                    Some(i) => {
                        let slot = &mut acc.slots[i];
                        slot.vend_count = slot.vend_count.saturating_add(vend_count);
                        slot.cash_total = slot.cash_total.saturating_add(cash_total);
                    }
                    None => log.warning(
                        IssueCode::OrphanProductSales,
                        Some(record.sequence()),
                        "product sales record with no preceding product identity in its block; ignored",
                    ),
                },
                Adapted::Period(p) => {
                    if acc.period.is_none() {
                        acc.period = Some(p);
                    }
                }
                Adapted::Skip => {}
            }
        }
    }

    let machine_identity = match acc.identity.take() {
        Some((id, _)) => id,
        None => match recover_identity(dialect, blocks) {
            Some((id, seq)) => {
                log.warning(
                    IssueCode::IdentityRecovered,
                    Some(seq),
                    "identity taken from a block that failed integrity checks",
                );
                id
            }
            None => {
                log.fatal(
                    IssueCode::NoIdentity,
                    None,
                    "no machine identity record found in any block",
                );
                return None;
            }
        },
    };

    let period = match acc.period.take() {
        Some(p) if p.end.is_some() => p,
        other => {
            log.info(
                IssueCode::PeriodUnavailable,
                None,
                "audit read date/time missing or unreadable; period left empty",
            );
            other.unwrap_or_default()
        }
    };

    let reconciliation = Reconciliation::compute(&acc.slots, &acc.cash, acc.suspect);
    if !reconciliation.within(tolerance) {
        log.push(
            IngestionIssue::new(
                Severity::Warning,
                IssueCode::ReconciliationMismatch,
                None,
                format!(
                    "machine reported vend total {} differs from slot sales {} by {}",
                    reconciliation.machine_reported_total,
                    reconciliation.slot_sum_vend_total,
                    reconciliation.delta
                ),
            )
            .with_delta(reconciliation.delta),
        );
    }
    tracing::info!(
        slots = acc.slots.len(),
        denominations = acc.cash.currency_totals.len(),
        delta = reconciliation.delta,
        suspect = reconciliation.suspect,
        "normalized audit"
    );

    Some(CanonicalAudit {
        machine_identity,
        cash_audit: acc.cash,
        product_audit: acc.slots,
        period,
        reconciliation,
    })
}

impl Accumulator {
    fn add_identity(&mut self, id: MachineIdentity, seq: u32, log: &mut IssueLog) {
        if let Some((first, first_seq)) = &self.identity {
            if *first == id {
                log.info(
                    IssueCode::DuplicateIdentity,
                    Some(seq),
                    format!("identity repeated (first at record {})", first_seq),
                );
            } else {
                log.warning(
                    IssueCode::ConflictingIdentity,
                    Some(seq),
                    format!(
                        "identity {}/{} conflicts with {}/{} from record {}; first kept",
                        id.serial, id.model_code, first.serial, first.model_code, first_seq
                    ),
                );
            }
            return;
        }
        self.identity = Some((id, seq));
    }

    fn add_cash(&mut self, entry: CashEntry, seq: u32, log: &mut IssueLog) {
        match entry {
            CashEntry::Denomination { denomination, count, value } => {
                if self.cash.currency_totals.contains_key(&denomination) {
                    log.info(
                        IssueCode::DuplicateDenomination,
                        Some(seq),
                        format!("denomination {} repeated; counters summed", denomination),
                    );
                }
                let total = self
                    .cash
                    .currency_totals
                    .entry(denomination)
                    .or_insert_with(DenominationTotal::default);
                total.count = total.count.saturating_add(count);
                total.value = total.value.saturating_add(value);
            }
            CashEntry::VendTotal { value, vends } => {
                self.cash.vend_total = self.cash.vend_total.saturating_add(value);
                self.cash.vend_count = self.cash.vend_count.saturating_add(vends);
            }
        }
    }

    fn upsert_slot(&mut self, slot_id: String, price: i64, seq: u32, log: &mut IssueLog) -> usize {
        if let Some(&i) = self.slot_index.get(&slot_id) {
            let slot = &mut self.slots[i];
            if slot.price != price {
                log.info(
                    IssueCode::PriceChanged,
                    Some(seq),
                    format!(
                        "slot {} price changed from {} to {}; latest kept",
                        slot_id, slot.price, price
                    ),
                );
                slot.price = price;
            }
            return i;
        }
        self.slots.push(SlotAudit {
            slot_id: slot_id.clone(),
            price,
            vend_count: 0,
            cash_total: 0,
        });
        self.slot_index.insert(slot_id, self.slots.len() - 1);
        self.slots.len() - 1
    }
}

fn recover_identity(dialect: &dyn Dialect, blocks: &[BlockRecords<'_, '_>]) -> Option<(MachineIdentity, u32)> {
    let mut scratch = IssueLog::new();
    blocks
        .iter()
        .filter(|b| !b.verdict.included)
        .flat_map(|b| b.records.iter())
        .find(|r| r.kind == RecordKind::Identity)
        .map(|r| {
            let mut fields = FieldReader::new(r, &mut scratch);
            (dialect.map_identity_fields(r, &mut fields), r.sequence())
        })
}
