//! Pipeline invariants over generated inputs: record numbering, arity tolerance,
//! duplicate aggregation and issue/status consistency.

use dexaudit::classify::classify_all;
use dexaudit::tokenizer::tokenize;
use dexaudit::{parse, IngestionStatus, IssueCode, ProtocolProfile, Severity};

fn record_count(src: &str) -> usize {
    let profile = ProtocolProfile::default();
    classify_all(&tokenize(src, &profile), &profile).len()
}

#[test]
fn test_one_record_per_non_empty_line() {
    let samples = [
        "ST*001*1\nID1*S*M\nSE*3*1\n",
        "ST*001*1\r\n\r\nID1*S*M\r\n   \r\nSE*3*1",
        "\n\n\nPA1*1*100\rPA2*1*100\r\n",
        "ZZ*1\nQQ\n***\n",
        "",
    ];
    for src in samples {
        let non_empty = src
            .split(|c: char| c == '\n' || c == '\r')
            .filter(|l| !l.trim().trim_end_matches('*').trim().is_empty())
            .count();
        assert_eq!(record_count(src), non_empty, "input {:?}", src);
    }
}

#[test]
fn test_sequence_numbers_are_dense() {
    let profile = ProtocolProfile::default();
    let records = classify_all(&tokenize("A*1\n\nB*2\r\n\r\nC*3\n", &profile), &profile);
    let seqs: Vec<u32> = records.iter().map(|r| r.sequence_index).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[test]
fn test_short_record_yields_exactly_one_warning() {
    // PA1 needs at least slot id and price; each short record is padded once.
    for n in 1..=4usize {
        let mut src = String::from("ST*001*1\nID1*S*M\n");
        for i in 0..n {
            src.push_str(&format!("PA1*{}\n", i + 1));
        }
        src.push_str(&format!("SE*{}*1\n", n + 3));
        let report = parse(&src);
        let padded: Vec<_> = report.issues_coded(IssueCode::FieldsPadded).collect();
        assert_eq!(padded.len(), n);
        assert!(padded.iter().all(|i| i.severity == Severity::Warning));
        let audit = report.canonical.as_ref().expect("canonical audit");
        assert_eq!(audit.product_audit.len(), n);
        assert!(audit.product_audit.iter().all(|s| s.price == 0));
    }
}

#[test]
fn test_overflowing_record_yields_one_warning() {
    let report = parse("ST*001*1\nID1*S*M\nG85*ABCD*EXTRA\nSE*4*1\n");
    let overflow: Vec<_> = report.issues_coded(IssueCode::FieldsOverflow).collect();
    assert_eq!(overflow.len(), 1);
    assert_eq!(overflow[0].record_sequence, Some(3));
}

#[test]
fn test_duplicate_slots_across_blocks_aggregate() {
    for blocks in 1..=5u64 {
        let mut src = format!(
            "ST*001*0\nID1*S*M\nVA1*{}*{}\nSE*4*0\n",
            200 * blocks,
            2 * blocks
        );
        for b in 0..blocks {
            src.push_str(&format!("ST*001*{b}\nPA1*7*100\nPA2*2*200\nSE*4*{b}\n"));
        }
        let report = parse(&src);
        assert_eq!(report.status, IngestionStatus::Success);
        let audit = report.canonical.expect("canonical audit");
        assert_eq!(audit.product_audit.len(), 1);
        let slot = audit.slot("7").expect("slot 7");
        assert_eq!(slot.vend_count, 2 * blocks);
        assert_eq!(slot.cash_total, 200 * blocks as i64);
    }
}

#[test]
fn test_status_matches_worst_severity() {
    let inputs = [
        "",
        "ST*001*1\nID1*S*M\nSE*3*1\n",
        "ST*001*1\nID1*S*M\nSE*9*1\n",
        "ST*001*1\nID1*S*M\nPA1*1\nSE*4*1\n",
        "ST*001*1\nPA1*1*100\n",
        "SE*1*1\nST*001*1\nID1*S*M\n",
    ];
    for src in inputs {
        let report = parse(src);
        let worst = report.issues.iter().map(|i| i.severity).max();
        let expected = match worst {
            Some(Severity::Fatal) => IngestionStatus::FatalFailure,
            Some(Severity::Error) | Some(Severity::Warning) => IngestionStatus::PartialSuccess,
            _ => IngestionStatus::Success,
        };
        assert_eq!(report.status, expected, "input {:?}", src);
        assert_eq!(
            report.canonical.is_none(),
            report.status == IngestionStatus::FatalFailure,
            "input {:?}",
            src
        );
    }
}

#[test]
fn test_unterminated_block_excluded_with_sibling_kept() {
    let report = parse("ST*001*1\nID1*S*M\nPA1*1*100\nPA2*1*100\nSE*5*1\nST*001*2\nPA1*2*50\nPA2*9*450\n");
    let audit = report.canonical.expect("canonical audit");
    assert!(audit.slot("1").is_some());
    assert!(audit.slot("2").is_none());
    let errors: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].record_sequence, Some(8));
}
