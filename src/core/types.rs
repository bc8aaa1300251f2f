use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::edgar::{AccessionNumber, FilingType, Ticker};
use crate::error::DocumentSourceError;

/// Section label -> section text.
pub type Sections = HashMap<String, String>;

/// What a document source knows about a filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingData {
    pub company_name: Option<String>,
    pub filing_type: Option<FilingType>,
    pub ticker: Option<Ticker>,
    pub filing_date: Option<NaiveDate>,
    pub raw_text: Option<String>,
    pub sections: Option<Sections>,
}

/// Input handed to the LLM collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub sections: Sections,
    pub filing_type: FilingType,
    pub company_name: String,
    pub schemas: Vec<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub payload: Value,
    pub confidence_score: f64,
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl LlmResponse {
    pub fn new(payload: Value, confidence_score: f64) -> Self {
        Self {
            payload,
            confidence_score,
            provider: None,
            model: None,
        }
    }
}

#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn get_by_accession(
        &self,
        accession: &AccessionNumber,
    ) -> Result<FilingData, DocumentSourceError>;

    async fn extract_sections(
        &self,
        ticker: &Ticker,
        filing_type: &FilingType,
    ) -> Result<Sections, DocumentSourceError>;
}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<LlmResponse>;
}
