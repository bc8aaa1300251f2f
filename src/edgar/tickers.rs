use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn new(ticker: impl AsRef<str>) -> Result<Self, DomainError> {
        let uppercase_ticker = ticker.as_ref().trim().to_uppercase();
        if uppercase_ticker.is_empty() {
            return Err(DomainError::validation(ticker.as_ref(), "ticker cannot be empty"));
        }
        if !uppercase_ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(DomainError::validation(
                ticker.as_ref(),
                "ticker must contain only alphanumeric characters, hyphens or dots",
            ));
        }
        Ok(Ticker(uppercase_ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ticker::new(s)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Left-pads a CIK to the 10 digits EDGAR uses everywhere.
pub fn normalize_cik(cik: &str) -> Result<String, DomainError> {
    let trimmed = cik.trim().trim_start_matches("CIK");
    if trimmed.is_empty() || trimmed.len() > 10 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation(cik, "CIK must be 1 to 10 digits"));
    }
    Ok(format!("{:0>10}", trimmed))
}
