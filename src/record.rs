//! Records and the record-type registry.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One classified line. Immutable once built by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    /// 1-based logical position among non-empty lines.
    pub sequence_index: u32,
    pub type_code: String,
    pub kind: RecordKind,
    pub fields: Vec<String>,
    pub raw_text: String,
}

/// Semantic tag of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    TransmissionStart,
    TransmissionEnd,
    BlockStart,
    BlockEnd,
    Checksum,
    Identity,
    CashDenomination,
    CashSales,
    VendTotals,
    ProductIdentity,
    ProductSales,
    AuditRead,
    /// Known code with no role in normalization.
    Informational,
    Unclassified,
}

impl RecordKind {
    pub fn is_cash(self) -> bool {
        matches!(
            self,
            RecordKind::CashDenomination | RecordKind::CashSales | RecordKind::VendTotals
        )
    }

    pub fn is_product(self) -> bool {
        matches!(self, RecordKind::ProductIdentity | RecordKind::ProductSales)
    }
}

/// Field count bounds for a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const ANY: Arity = Arity { min: 0, max: usize::MAX };

    pub const fn new(min: usize, max: usize) -> Self {
        Arity { min, max }
    }
}

#[derive(Debug, Clone)]
pub struct RecordSpec {
    pub code: &'static str,
    pub kind: RecordKind,
    pub arity: Arity,
}

const fn spec(code: &'static str, kind: RecordKind, min: usize, max: usize) -> RecordSpec {
    RecordSpec {
        code,
        kind,
        arity: Arity::new(min, max),
    }
}

const BASE_SPECS: &[RecordSpec] = &[
    spec("DXS", RecordKind::TransmissionStart, 1, 6),
    spec("DXE", RecordKind::TransmissionEnd, 1, 2),
    spec("ST", RecordKind::BlockStart, 2, 2),
    spec("SE", RecordKind::BlockEnd, 2, 2),
    spec("G85", RecordKind::Checksum, 1, 1),
    spec("ID1", RecordKind::Identity, 2, 9),
    spec("CA17", RecordKind::CashDenomination, 3, 6),
    spec("CA2", RecordKind::CashSales, 2, 6),
    spec("VA1", RecordKind::VendTotals, 2, 8),
    spec("PA1", RecordKind::ProductIdentity, 2, 8),
    spec("PA2", RecordKind::ProductSales, 2, 8),
    spec("EA3", RecordKind::AuditRead, 2, 10),
];

const INFORMATIONAL_CODES: &[&str] = &[
    "ID4", "ID5", "CA1", "CA3", "CA4", "CA9", "CA10", "CA15", "BA1", "DA1", "DA2", "VA2", "VA3",
    "PA3", "PA4", "PA5", "PA7", "EA1", "EA2", "EA7", "MA5", "TA2", "LS", "LE",
];

/// Static code → spec table shared by every parse.
#[derive(Debug)]
pub struct RecordRegistry {
    specs: Vec<RecordSpec>,
    by_code: HashMap<&'static str, usize>,
}

impl RecordRegistry {
    fn build() -> Self {
        let mut specs: Vec<RecordSpec> = BASE_SPECS.to_vec();
        specs.extend(INFORMATIONAL_CODES.iter().map(|&code| RecordSpec {
            code,
            kind: RecordKind::Informational,
            arity: Arity::ANY,
        }));
        let by_code = specs
            .iter()
            .enumerate()
            .map(|(i, s)| (s.code, i))
            .collect();
        RecordRegistry { specs, by_code }
    }

    /// Process-wide registry, built on first use.
    pub fn global() -> &'static RecordRegistry {
        static REGISTRY: OnceLock<RecordRegistry> = OnceLock::new();
        REGISTRY.get_or_init(RecordRegistry::build)
    }

    pub fn get(&self, code: &str) -> Option<&RecordSpec> {
        self.by_code.get(code).map(|&i| &self.specs[i])
    }

    pub fn kind_of(&self, code: &str) -> RecordKind {
        self.get(code)
            .map(|s| s.kind)
            .unwrap_or(RecordKind::Unclassified)
    }

    /// `None` for unclassified codes: their fields are kept as sent.
    pub fn arity_of(&self, code: &str) -> Option<Arity> {
        self.get(code).map(|s| s.arity)
    }
}
