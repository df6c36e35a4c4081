//! Benchmark: whole-file ingestion of synthetic transmissions (one block with many
//! slots, many small blocks, and a Vendo file), plus the tokenize+classify front end alone.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dexaudit::classify::classify_all;
use dexaudit::tokenizer::tokenize;
use dexaudit::{DexParser, ParserConfig, ProtocolProfile};

fn one_block(slots: usize) -> String {
    let mut s = String::from("DXS*VND0001*VA*V1/1*1\r\nST*001*0001\r\nID1*SN0042*M-310\r\n");
    s.push_str("EA3*15*240315*1430**240301*0900\r\nCA17*00*5*20\r\nCA17*01*25*40\r\n");
    let mut total = 0;
    for i in 0..slots {
        let price = 50 + (i % 10) as i64 * 25;
        s.push_str(&format!("PA1*{}*{}\r\nPA2*3*{}\r\n", i + 1, price, price * 3));
        total += price * 3;
    }
    s.push_str(&format!("VA1*{}*{}\r\n", total, slots * 3));
    s.push_str(&format!("SE*{}*0001\r\nDXE*1*1\r\n", 7 + 2 * slots));
    s
}

fn many_blocks(blocks: usize) -> String {
    let mut s = String::from("ST*001*0\nID1*SN1*M1\nSE*3*0\n");
    for b in 1..=blocks {
        s.push_str(&format!("ST*001*{b}\nPA1*{b}*100\nPA2*1*100\nSE*4*{b}\n"));
    }
    s
}

fn vendo(slots: usize) -> String {
    let mut s = String::from("ST*001*0001\nID1*VN100*V-21\nID7*VENDO*3.1\nCA17*00*25*40\n");
    for i in 0..slots {
        s.push_str(&format!("PA1*{:03}*125\nPA2*2*250\n", i + 1));
    }
    s.push_str(&format!("CA2*{}*{}\nSE*{}*0001\n", 250 * slots, 2 * slots, 6 + 2 * slots));
    s
}

fn bench_parse(c: &mut Criterion) {
    let parser = DexParser::new(ParserConfig::default());
    let large = one_block(500);
    let blocks = many_blocks(200);
    let vendo_file = vendo(200);
    let profile = ProtocolProfile::default();

    let mut group = c.benchmark_group("dex_parse");
    group.bench_function("one_block_500_slots", |b| {
        b.iter(|| parser.parse_str(black_box(&large)))
    });
    group.bench_function("200_blocks", |b| {
        b.iter(|| parser.parse_str(black_box(&blocks)))
    });
    group.bench_function("vendo_200_slots", |b| {
        b.iter(|| parser.parse_str(black_box(&vendo_file)))
    });
    group.bench_function("tokenize_classify_only", |b| {
        b.iter(|| classify_all(&tokenize(black_box(&large), &profile), &profile))
    });
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
