use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::DomainError;

// ASCII digits only; the accessors slice by byte offset.
static ACCESSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{10}-[0-9]{2}-[0-9]{6}$").expect("valid accession pattern")
});

/// SEC accession number, `NNNNNNNNNN-NN-NNNNNN`.
///
/// The first ten digits are the filer's CIK, followed by a two digit year
/// and a six digit sequence assigned by EDGAR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessionNumber(String);

impl AccessionNumber {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation(
                raw.as_ref(),
                "accession number cannot be empty",
            ));
        }
        if !ACCESSION_PATTERN.is_match(trimmed) {
            return Err(DomainError::validation(
                raw.as_ref(),
                "accession number must match NNNNNNNNNN-NN-NNNNNN",
            ));
        }
        Ok(AccessionNumber(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn filer_id(&self) -> &str {
        &self.0[..10]
    }

    pub fn year(&self) -> i32 {
        // Pattern guarantees two ASCII digits here.
        let suffix: i32 = self.0[11..13].parse().unwrap_or_default();
        if suffix <= 30 {
            2000 + suffix
        } else {
            1900 + suffix
        }
    }

    pub fn sequence(&self) -> u32 {
        self.0[14..].parse().unwrap_or_default()
    }

    /// Form used in EDGAR archive paths, without dashes.
    pub fn compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl FromStr for AccessionNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessionNumber::new(s)
    }
}

impl TryFrom<String> for AccessionNumber {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        AccessionNumber::new(s)
    }
}

impl From<AccessionNumber> for String {
    fn from(accession: AccessionNumber) -> Self {
        accession.0
    }
}

impl AsRef<str> for AccessionNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
