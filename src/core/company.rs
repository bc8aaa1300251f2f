use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::edgar::{normalize_cik, Ticker};
use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    /// Zero-padded 10 digit CIK.
    pub cik: String,
    pub name: String,
    pub ticker: Option<Ticker>,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(cik: &str, name: &str, ticker: Option<Ticker>) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidArgument(
                "company name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            cik: normalize_cik(cik)?,
            name: name.to_string(),
            ticker,
            created_at: Utc::now(),
        })
    }
}
