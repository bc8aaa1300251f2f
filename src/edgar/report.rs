use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum::{EnumIter, IntoEnumIterator};

/// SEC form type of a filing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(try_from = "String", into = "String")]
pub enum FilingType {
    Form10K,
    Form10Q,
    Form8K,
    Form6K,
    Form20F,
    Form4,
    FormS1,
    FormS3,
    FormS4,
    FormDEF14A,
    Form13F,
    Form13G,
    Form13D,
    FormSD,
    Form144,
    Other(String),
}

impl FilingType {
    pub fn list_types() -> &'static str {
        &FILING_TYPES
    }

    /// Periodic reports carry audited or reviewed financial statements.
    pub fn is_periodic(&self) -> bool {
        matches!(
            self,
            FilingType::Form10K | FilingType::Form10Q | FilingType::Form20F
        )
    }
}

pub static FILING_TYPES: Lazy<String> = Lazy::new(|| {
    FilingType::iter()
        .filter(|t| !matches!(t, FilingType::Other(_)))
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
});

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilingType::Form10K => write!(f, "10-K"),
            FilingType::Form10Q => write!(f, "10-Q"),
            FilingType::Form8K => write!(f, "8-K"),
            FilingType::Form6K => write!(f, "6-K"),
            FilingType::Form20F => write!(f, "20-F"),
            FilingType::Form4 => write!(f, "4"),
            FilingType::FormS1 => write!(f, "S-1"),
            FilingType::FormS3 => write!(f, "S-3"),
            FilingType::FormS4 => write!(f, "S-4"),
            FilingType::FormDEF14A => write!(f, "DEF 14A"),
            FilingType::Form13F => write!(f, "13F"),
            FilingType::Form13G => write!(f, "13G"),
            FilingType::Form13D => write!(f, "13D"),
            FilingType::FormSD => write!(f, "SD"),
            FilingType::Form144 => write!(f, "144"),
            FilingType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for FilingType {
    type Err = String;

    fn from_str(s: &str) -> Result<FilingType, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("filing type cannot be empty".to_string());
        }
        match trimmed.to_uppercase().as_str() {
            "10-K" => Ok(FilingType::Form10K),
            "10-Q" => Ok(FilingType::Form10Q),
            "8-K" => Ok(FilingType::Form8K),
            "6-K" => Ok(FilingType::Form6K),
            "20-F" => Ok(FilingType::Form20F),
            "4" => Ok(FilingType::Form4),
            "S-1" => Ok(FilingType::FormS1),
            "S-3" => Ok(FilingType::FormS3),
            "S-4" => Ok(FilingType::FormS4),
            "DEF 14A" => Ok(FilingType::FormDEF14A),
            "13F" | "13F-HR" => Ok(FilingType::Form13F),
            "13G" | "SC 13G" => Ok(FilingType::Form13G),
            "13D" | "SC 13D" => Ok(FilingType::Form13D),
            "SD" => Ok(FilingType::FormSD),
            "144" => Ok(FilingType::Form144),
            _ => Ok(FilingType::Other(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for FilingType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        FilingType::from_str(&s)
    }
}

impl From<FilingType> for String {
    fn from(filing_type: FilingType) -> Self {
        filing_type.to_string()
    }
}
