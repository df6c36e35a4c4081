//! Manufacturer dialects: interchangeable field mappers selected once per file.
//!
//! Every dialect implements [`Dialect`]. Selection ([`select_dialect`]) sniffs the
//! first block for each dialect's [`Signature`]s in a fixed order (Vendo, AMS,
//! Crane); the first match wins and the file is adapted by that dialect alone.
//! Without a match the [`Generic`] base protocol is assumed and an `Info` issue
//! is recorded.
//!
//! | Dialect | Signature |
//! |---------|-----------|
//! | Vendo | `ID7` record |
//! | AMS | `AM1` record, or `CA17` with exactly two fields and a decimal-point value |
//! | Crane | `CB1` record |
//!
//! A dialect may decline a field (return `None`, or a zero-valued entry); that is
//! never an issue.

mod ams;
mod crane;
mod generic;
mod vendo;

pub use ams::Ams;
pub use crane::Crane;
pub use generic::Generic;
pub use vendo::Vendo;

use crate::audit::{AuditPeriod, MachineIdentity};
use crate::fields::{Field, SplitRecord};
use crate::record::{Arity, RawRecord, RecordKind, RecordRegistry};
use crate::report::{IssueCode, IssueLog};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ManufacturerProfile {
    Generic,
    Vendo,
    Ams,
    Crane,
}

impl fmt::Display for ManufacturerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManufacturerProfile::Generic => "generic",
            ManufacturerProfile::Vendo => "vendo",
            ManufacturerProfile::Ams => "ams",
            ManufacturerProfile::Crane => "crane",
        };
        f.write_str(name)
    }
}

/// A record pattern that only a given dialect emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    RecordCode(&'static str),
    /// `code` with exactly `fields` fields, the first written as a decimal
    /// amount ("0.25"). A base-protocol record truncated to the same count keeps
    /// an integer first field, so it never matches.
    DecimalFieldCount { code: &'static str, fields: usize },
}

impl Signature {
    pub fn matches(&self, record: &RawRecord) -> bool {
        match *self {
            Signature::RecordCode(code) => record.type_code == code,
            Signature::DecimalFieldCount { code, fields } => {
                record.type_code == code
                    && record.fields.len() == fields
                    && record.fields.first().is_some_and(|f| is_decimal_amount(f))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CashEntry {
    Denomination { denomination: i64, count: u64, value: i64 },
    VendTotal { value: i64, vends: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductEntry {
    Slot { slot_id: String, price: i64 },
    Sales { vend_count: u64, cash_total: i64 },
}

pub trait Dialect: fmt::Debug + Send + Sync {
    fn profile(&self) -> ManufacturerProfile;

    fn signatures(&self) -> &'static [Signature] {
        &[]
    }

    /// Effective kind of a record whose meaning depends on the dialect.
    fn classify_ambiguous_record(&self, record: &RawRecord) -> RecordKind {
        record.kind
    }

    fn arity(&self, record: &RawRecord) -> Option<Arity> {
        RecordRegistry::global().arity_of(&record.type_code)
    }

    fn map_identity_fields(&self, record: &SplitRecord<'_>, _fields: &mut FieldReader<'_>) -> MachineIdentity {
        MachineIdentity {
            serial: record.field(0).text().unwrap_or_default().to_string(),
            model_code: record.field(1).text().unwrap_or_default().to_string(),
        }
    }

    fn map_cash_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<CashEntry>;

    fn map_product_fields(&self, record: &SplitRecord<'_>, fields: &mut FieldReader<'_>) -> Option<ProductEntry>;

    fn sniff(&self, window: &[&RawRecord]) -> bool {
        window
            .iter()
            .any(|r| self.signatures().iter().any(|s| s.matches(r)))
    }
}

fn is_decimal_amount(s: &str) -> bool {
    s.contains('.') && parse_decimal_minor(s).is_some()
}

/// Candidate dialects in sniffing order. `Generic` is the fallback, not a candidate.
pub static DIALECTS: [&dyn Dialect; 3] = [&Vendo, &Ams, &Crane];

pub fn select_dialect(window: &[&RawRecord], log: &mut IssueLog) -> &'static dyn Dialect {
    for d in DIALECTS.iter() {
        if d.sniff(window) {
            tracing::info!(dialect = %d.profile(), "dialect selected by signature");
            return *d;
        }
    }
    log.info(
        IssueCode::DialectAssumed,
        None,
        "no manufacturer signature found; generic DEX interpretation assumed",
    );
    tracing::info!(dialect = %ManufacturerProfile::Generic, "dialect assumed");
    &Generic
}

/// Numeric field access for one record; unreadable numbers become 0 with a warning.
pub struct FieldReader<'a> {
    record: &'a SplitRecord<'a>,
    log: &'a mut IssueLog,
}

impl<'a> FieldReader<'a> {
    pub fn new(record: &'a SplitRecord<'a>, log: &'a mut IssueLog) -> Self {
        FieldReader { record, log }
    }

    pub fn text(&self, index: usize) -> String {
        self.record.field(index).text().unwrap_or_default().to_string()
    }

    /// Integer amount in minor units.
    pub fn amount(&mut self, index: usize) -> i64 {
        let record = self.record;
        match record.field(index).text() {
            None => 0,
            Some(s) => s.parse::<i64>().unwrap_or_else(|_| self.invalid(index, s)),
        }
    }

    /// Amount that may carry a decimal point in major units ("1.25" is 125).
    pub fn decimal_amount(&mut self, index: usize) -> i64 {
        let record = self.record;
        match record.field(index).text() {
            None => 0,
            Some(s) => parse_decimal_minor(s).unwrap_or_else(|| self.invalid(index, s)),
        }
    }

    /// Non-negative count; anything that does not fit a money multiplier is invalid.
    pub fn count(&mut self, index: usize) -> u64 {
        let record = self.record;
        match record.field(index).text() {
            None => 0,
            Some(s) => s
                .parse::<u64>()
                .ok()
                .filter(|&n| i64::try_from(n).is_ok())
                .unwrap_or_else(|| {
                    self.invalid(index, s);
                    0
                }),
        }
    }

    /// `unit × count` in minor units; 0 with a warning when it overflows.
    pub fn total(&mut self, index: usize, unit: i64, count: u64) -> i64 {
        match i64::try_from(count).ok().and_then(|c| unit.checked_mul(c)) {
            Some(v) => v,
            None => {
                self.log.warning(
                    IssueCode::InvalidNumber,
                    Some(self.record.sequence()),
                    format!(
                        "{} field {}: {} x {} is out of range; read as 0",
                        self.record.record.type_code,
                        index + 1,
                        unit,
                        count
                    ),
                );
                0
            }
        }
    }

    fn invalid(&mut self, index: usize, raw: &str) -> i64 {
        self.log.warning(
            IssueCode::InvalidNumber,
            Some(self.record.sequence()),
            format!(
                "{} field {} is not a number in range ({:?}); read as 0",
                self.record.record.type_code,
                index + 1,
                raw
            ),
        );
        0
    }
}

fn parse_decimal_minor(s: &str) -> Option<i64> {
    match s.split_once('.') {
        None => s.parse().ok(),
        Some((major, minor)) => {
            if minor.len() > 2 || !minor.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let negative = major.starts_with('-');
            let major: i64 = if major.is_empty() || major == "-" {
                0
            } else {
                major.parse().ok()?
            };
            let mut cents: i64 = if minor.is_empty() { 0 } else { minor.parse().ok()? };
            if minor.len() == 1 {
                cents *= 10;
            }
            let magnitude = major.checked_abs()?.checked_mul(100)?.checked_add(cents)?;
            Some(if negative { -magnitude } else { magnitude })
        }
    }
}

/// Outcome of adapting one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adapted {
    Identity(MachineIdentity),
    Cash(CashEntry),
    Product(ProductEntry),
    Period(AuditPeriod),
    /// Not part of normalization (markers, informational, unclassified, declined).
    Skip,
}

/// Run the dialect's mappers over one arity-fitted record.
pub fn adapt(dialect: &dyn Dialect, record: &SplitRecord<'_>, log: &mut IssueLog) -> Adapted {
    let mut fields = FieldReader::new(record, log);
    match record.kind {
        RecordKind::Identity => Adapted::Identity(dialect.map_identity_fields(record, &mut fields)),
        k if k.is_cash() => dialect
            .map_cash_fields(record, &mut fields)
            .map(Adapted::Cash)
            .unwrap_or(Adapted::Skip),
        k if k.is_product() => dialect
            .map_product_fields(record, &mut fields)
            .map(Adapted::Product)
            .unwrap_or(Adapted::Skip),
        RecordKind::AuditRead => Adapted::Period(audit_period(record)),
        _ => Adapted::Skip,
    }
}

/// `EA3`: fields 2/3 are this read's date/time, 5/6 the previous read's.
fn audit_period(record: &SplitRecord<'_>) -> AuditPeriod {
    AuditPeriod {
        start: read_timestamp(record.field(4), record.field(5)),
        end: read_timestamp(record.field(1), record.field(2)),
    }
}

fn read_timestamp(date: &Field, time: &Field) -> Option<NaiveDateTime> {
    let date = date.text()?;
    let date = NaiveDate::parse_from_str(date, "%y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y%m%d"))
        .ok()?;
    let time = match time.text() {
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
        Some(t) if t.len() == 6 => NaiveTime::parse_from_str(t, "%H%M%S").ok()?,
        Some(t) => NaiveTime::parse_from_str(t, "%H%M").ok()?,
    };
    Some(date.and_time(time))
}
