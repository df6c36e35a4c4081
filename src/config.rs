//! Parser configuration: protocol profile (delimiter, type-code layout) and
//! reconciliation tolerance.
//!
//! Configuration is plain data. It can be built in code (`ParserConfig::default()`)
//! or loaded from JSON:
//!
//! ```text
//! {
//!   "profile": { "delimiter": "*", "type_code": { "fixed_width": 3 } },
//!   "reconciliation_tolerance": 5
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the leading type code is cut from a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCodeMode {
    /// Code runs up to the first field delimiter (standard DEX).
    Delimited,
    /// Code is the first `n` characters; an immediately following delimiter is skipped.
    FixedWidth(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolProfile {
    pub delimiter: char,
    pub type_code: TypeCodeMode,
}

impl Default for ProtocolProfile {
    fn default() -> Self {
        ProtocolProfile {
            delimiter: '*',
            type_code: TypeCodeMode::Delimited,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    pub profile: ProtocolProfile,
    /// Largest absolute reconciliation delta (minor currency units) accepted without a warning.
    pub reconciliation_tolerance: i64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            profile: ProtocolProfile::default(),
            reconciliation_tolerance: 0,
        }
    }
}

impl ParserConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn with_tolerance(mut self, tolerance: i64) -> Self {
        self.reconciliation_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = self.profile.delimiter;
        if d == '\r' || d == '\n' || d.is_whitespace() {
            return Err(ConfigError::Invalid(format!(
                "delimiter {:?} cannot be a line break or whitespace",
                d
            )));
        }
        if let TypeCodeMode::FixedWidth(0) = self.profile.type_code {
            return Err(ConfigError::Invalid(
                "fixed-width type code needs a width > 0".to_string(),
            ));
        }
        if self.reconciliation_tolerance < 0 {
            return Err(ConfigError::Invalid(format!(
                "reconciliation_tolerance must be >= 0 (got {})",
                self.reconciliation_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_standard_dex() {
        let c = ParserConfig::default();
        assert_eq!(c.profile.delimiter, '*');
        assert_eq!(c.profile.type_code, TypeCodeMode::Delimited);
        assert_eq!(c.reconciliation_tolerance, 0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn json_partial_uses_defaults() {
        let c = ParserConfig::from_json(r#"{ "reconciliation_tolerance": 25 }"#).expect("config");
        assert_eq!(c.reconciliation_tolerance, 25);
        assert_eq!(c.profile.delimiter, '*');
    }

    #[test]
    fn json_fixed_width() {
        let c = ParserConfig::from_json(r#"{ "profile": { "type_code": { "fixed_width": 3 } } }"#)
            .expect("config");
        assert_eq!(c.profile.type_code, TypeCodeMode::FixedWidth(3));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ParserConfig::from_json(r#"{ "profile": { "delimiter": "\n" } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ParserConfig::from_json(r#"{ "reconciliation_tolerance": -1 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ParserConfig::from_json(r#"{ "unknown": 1 }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        write!(f, r#"{{ "profile": {{ "delimiter": "|" }} }}"#).expect("write");
        let c = ParserConfig::from_path(f.path()).expect("config");
        assert_eq!(c.profile.delimiter, '|');
    }
}
