//! Record classifier: cut the type code, split raw fields and tag the record kind.
//!
//! Classification is total: one line in, exactly one [`RawRecord`] out.

use crate::config::{ProtocolProfile, TypeCodeMode};
use crate::record::{RawRecord, RecordRegistry};
use crate::tokenizer::Line;

pub fn classify(line: &Line, profile: &ProtocolProfile, registry: &RecordRegistry) -> RawRecord {
    let (code, payload) = split_code(&line.text, profile);
    let fields = if payload.is_empty() {
        Vec::new()
    } else {
        payload
            .split(profile.delimiter)
            .map(|f| f.trim().to_string())
            .collect()
    };
    let type_code = code.trim().to_ascii_uppercase();
    RawRecord {
        sequence_index: line.sequence_index,
        kind: registry.kind_of(&type_code),
        type_code,
        fields,
        raw_text: line.text.clone(),
    }
}

pub fn classify_all(lines: &[Line], profile: &ProtocolProfile) -> Vec<RawRecord> {
    let registry = RecordRegistry::global();
    lines
        .iter()
        .map(|l| classify(l, profile, registry))
        .collect()
}

fn split_code<'a>(text: &'a str, profile: &ProtocolProfile) -> (&'a str, &'a str) {
    match profile.type_code {
        TypeCodeMode::Delimited => match text.find(profile.delimiter) {
            Some(i) => (&text[..i], &text[i + profile.delimiter.len_utf8()..]),
            None => (text, ""),
        },
        TypeCodeMode::FixedWidth(width) => {
            let cut = text
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            let (code, rest) = text.split_at(cut);
            (code, rest.strip_prefix(profile.delimiter).unwrap_or(rest))
        }
    }
}
