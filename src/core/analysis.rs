use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::error::DomainError;

// Metadata keys
pub const TEMPLATE_USED: &str = "template_used";
pub const SCHEMAS_USED: &str = "schemas_used";
pub const ACCESSION_NUMBER: &str = "accession_number";
pub const FORCE_REPROCESS: &str = "force_reprocess";
pub const CUSTOM_INSTRUCTIONS: &str = "custom_instructions";
pub const PROGRESS: &str = "progress";
pub const PROGRESS_MESSAGE: &str = "progress_message";
pub const FAILURE_REASON: &str = "failure_reason";
pub const FAILURE_CATEGORY: &str = "failure_category";
pub const FAILED_AT: &str = "failed_at";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    FilingAnalysis,
    CustomQuery,
    Comparison,
    Historical,
}

/// How an analysis was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingInfo {
    pub template: String,
    pub schemas: Vec<String>,
    pub accession_number: String,
    pub force_reprocess: bool,
    pub custom_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    id: Uuid,
    filing_id: Uuid,
    analysis_type: AnalysisType,
    created_by: String,
    results: Option<Value>,
    confidence_score: Option<f64>,
    llm_provider: Option<String>,
    llm_model: Option<String>,
    metadata: HashMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Analysis {
    pub fn new(filing_id: Uuid, analysis_type: AnalysisType, created_by: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filing_id,
            analysis_type,
            created_by: created_by.to_string(),
            results: None,
            confidence_score: None,
            llm_provider: None,
            llm_model: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filing_id(&self) -> Uuid {
        self.filing_id
    }

    pub fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn results(&self) -> Option<&Value> {
        self.results.as_ref()
    }

    pub fn confidence_score(&self) -> Option<f64> {
        self.confidence_score
    }

    pub fn llm_provider(&self) -> Option<&str> {
        self.llm_provider.as_deref()
    }

    pub fn llm_model(&self) -> Option<&str> {
        self.llm_model.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Copy of the metadata. Use the `record_*` methods to change it.
    pub fn metadata(&self) -> HashMap<String, Value> {
        self.metadata.clone()
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn template_used(&self) -> Option<&str> {
        self.metadata.get(TEMPLATE_USED).and_then(Value::as_str)
    }

    pub fn is_completed(&self) -> bool {
        self.results.is_some() && !self.is_failed()
    }

    pub fn is_failed(&self) -> bool {
        self.metadata.contains_key(FAILURE_CATEGORY)
    }

    pub fn set_results(
        &mut self,
        results: Value,
        confidence_score: f64,
    ) -> Result<(), DomainError> {
        if !confidence_score.is_finite() || !(0.0..=1.0).contains(&confidence_score) {
            return Err(DomainError::InvalidArgument(format!(
                "confidence score must be within [0, 1], got {}",
                confidence_score
            )));
        }
        self.results = Some(results);
        self.confidence_score = Some(confidence_score);
        self.touch();
        Ok(())
    }

    pub fn set_llm_provenance(&mut self, provider: Option<String>, model: Option<String>) {
        self.llm_provider = provider;
        self.llm_model = model;
        self.touch();
    }

    pub fn record_progress(&mut self, progress: f64, message: &str) {
        self.metadata.insert(PROGRESS.to_string(), json!(progress));
        self.metadata
            .insert(PROGRESS_MESSAGE.to_string(), json!(message));
        self.touch();
    }

    pub fn record_failure(&mut self, reason: &str, category: &str) {
        self.metadata.insert(FAILURE_REASON.to_string(), json!(reason));
        self.metadata
            .insert(FAILURE_CATEGORY.to_string(), json!(category));
        self.metadata
            .insert(FAILED_AT.to_string(), json!(Utc::now().to_rfc3339()));
        self.touch();
    }

    pub fn record_processing(&mut self, info: &ProcessingInfo) {
        self.metadata
            .insert(TEMPLATE_USED.to_string(), json!(info.template));
        self.metadata
            .insert(SCHEMAS_USED.to_string(), json!(info.schemas));
        self.metadata
            .insert(ACCESSION_NUMBER.to_string(), json!(info.accession_number));
        self.metadata
            .insert(FORCE_REPROCESS.to_string(), json!(info.force_reprocess));
        match &info.custom_instructions {
            Some(instructions) => {
                self.metadata
                    .insert(CUSTOM_INSTRUCTIONS.to_string(), json!(instructions));
            }
            None => {
                self.metadata.remove(CUSTOM_INSTRUCTIONS);
            }
        }
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ProcessingInfo {
        ProcessingInfo {
            template: "comprehensive".to_string(),
            schemas: vec!["business".to_string(), "risk_factors".to_string()],
            accession_number: "0000320193-23-000106".to_string(),
            force_reprocess: false,
            custom_instructions: Some("focus on China".to_string()),
        }
    }

    #[test]
    fn test_set_results_validates_confidence() {
        let mut analysis = Analysis::new(Uuid::new_v4(), AnalysisType::FilingAnalysis, "analyst");
        assert!(analysis.set_results(json!({}), 1.5).is_err());
        assert!(analysis.set_results(json!({}), f64::NAN).is_err());
        assert!(analysis.results().is_none());

        analysis.set_results(json!({"summary": "ok"}), 0.87).unwrap();
        assert_eq!(analysis.confidence_score(), Some(0.87));
        assert!(analysis.is_completed());
    }

    #[test]
    fn test_record_processing() {
        let mut analysis = Analysis::new(Uuid::new_v4(), AnalysisType::FilingAnalysis, "analyst");
        analysis.record_processing(&info());
        assert_eq!(analysis.template_used(), Some("comprehensive"));
        assert_eq!(
            analysis.metadata_value(SCHEMAS_USED),
            Some(&json!(["business", "risk_factors"]))
        );
        assert_eq!(analysis.metadata_value(FORCE_REPROCESS), Some(&json!(false)));
        assert_eq!(
            analysis.metadata_value(CUSTOM_INSTRUCTIONS),
            Some(&json!("focus on China"))
        );
    }

    #[test]
    fn test_record_failure() {
        let mut analysis = Analysis::new(Uuid::new_v4(), AnalysisType::FilingAnalysis, "analyst");
        analysis.set_results(json!({}), 0.5).unwrap();
        analysis.record_failure("LLM unavailable", "analysis_processing");
        assert!(analysis.is_failed());
        assert!(!analysis.is_completed());
        assert_eq!(
            analysis.metadata_value(FAILURE_CATEGORY),
            Some(&json!("analysis_processing"))
        );
        assert!(analysis.metadata_value(FAILED_AT).is_some());
    }

    #[test]
    fn test_metadata_accessor_is_a_copy() {
        let mut analysis = Analysis::new(Uuid::new_v4(), AnalysisType::FilingAnalysis, "analyst");
        analysis.record_progress(0.4, "Filing sections extracted");
        let mut copy = analysis.metadata();
        copy.clear();
        assert_eq!(analysis.metadata_value(PROGRESS), Some(&json!(0.4)));
    }

    #[test]
    fn test_analysis_type_strings() {
        assert_eq!(AnalysisType::FilingAnalysis.to_string(), "filing_analysis");
        assert_eq!(
            "custom_query".parse::<AnalysisType>().unwrap(),
            AnalysisType::CustomQuery
        );
    }
}
