//! Line tokenizer: split a transmission blob into numbered logical lines using PEST.

use crate::config::ProtocolProfile;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "dex.pest"]
struct DexLineParser;

/// One non-empty line with its 1-based logical sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub sequence_index: u32,
    pub text: String,
}

/// Decode a Latin-1 byte blob (each byte is one code point).
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Split on CR, LF or CRLF, trim stray whitespace and trailing delimiter padding,
/// and drop blank lines. Numbering counts only the lines kept. Never fails.
pub fn tokenize(source: &str, profile: &ProtocolProfile) -> Vec<Line> {
    let pairs = match DexLineParser::parse(Rule::transmission, source) {
        Ok(p) => p,
        Err(e) => {
            // The grammar accepts every string.
            tracing::error!(error = %e, "line grammar rejected input");
            return Vec::new();
        }
    };
    let mut out = Vec::new();
    for pair in pairs.flatten().filter(|p| p.as_rule() == Rule::line) {
        let text = clean_line(pair.as_str(), profile.delimiter);
        if text.is_empty() {
            continue;
        }
        out.push(Line {
            sequence_index: out.len() as u32 + 1,
            text: text.to_string(),
        });
    }
    tracing::trace!(lines = out.len(), "tokenized");
    out
}

fn clean_line(raw: &str, delimiter: char) -> &str {
    raw.trim()
        .trim_end_matches(|c: char| c == delimiter || c.is_whitespace())
}
