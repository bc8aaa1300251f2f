use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use super::status::ProcessingStatus;
use crate::edgar::{AccessionNumber, FilingType};
use crate::error::DomainError;

/// Every field of a filing, as loaded from storage.
#[derive(Debug, Clone)]
pub struct FilingParts {
    pub id: Uuid,
    pub company_id: Uuid,
    pub accession_number: AccessionNumber,
    pub filing_type: FilingType,
    pub filing_date: NaiveDate,
    pub processing_status: ProcessingStatus,
    pub processing_error: Option<String>,
    pub metadata: HashMap<String, Value>,
}

/// A filing tracked by the pipeline.
///
/// Two filings are equal when their accession numbers are, whatever their
/// internal ids. `processing_error` is set exactly when the status is
/// `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FilingRecord", into = "FilingRecord")]
pub struct Filing {
    id: Uuid,
    company_id: Uuid,
    accession_number: AccessionNumber,
    filing_type: FilingType,
    filing_date: NaiveDate,
    processing_status: ProcessingStatus,
    processing_error: Option<String>,
    metadata: HashMap<String, Value>,
}

impl Filing {
    pub fn new(
        company_id: Uuid,
        accession_number: AccessionNumber,
        filing_type: FilingType,
        filing_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id,
            accession_number,
            filing_type,
            filing_date,
            processing_status: ProcessingStatus::Pending,
            processing_error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn from_parts(parts: FilingParts) -> Result<Self, DomainError> {
        let failed = parts.processing_status == ProcessingStatus::Failed;
        match (&parts.processing_error, failed) {
            (Some(_), false) => {
                return Err(DomainError::InvalidArgument(format!(
                    "processing error is only allowed on failed filings, status is {}",
                    parts.processing_status
                )))
            }
            (None, true) => {
                return Err(DomainError::InvalidArgument(
                    "failed filings must carry a processing error".to_string(),
                ))
            }
            (Some(error), true) if error.trim().is_empty() => {
                return Err(DomainError::InvalidArgument(
                    "processing error cannot be blank".to_string(),
                ))
            }
            _ => {}
        }

        Ok(Self {
            id: parts.id,
            company_id: parts.company_id,
            accession_number: parts.accession_number,
            filing_type: parts.filing_type,
            filing_date: parts.filing_date,
            processing_status: parts.processing_status,
            processing_error: parts.processing_error.map(|e| e.trim().to_string()),
            metadata: parts.metadata,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn company_id(&self) -> Uuid {
        self.company_id
    }

    pub fn accession_number(&self) -> &AccessionNumber {
        &self.accession_number
    }

    pub fn filing_type(&self) -> &FilingType {
        &self.filing_type
    }

    pub fn filing_date(&self) -> NaiveDate {
        self.filing_date
    }

    pub fn processing_status(&self) -> ProcessingStatus {
        self.processing_status
    }

    pub fn processing_error(&self) -> Option<&str> {
        self.processing_error.as_deref()
    }

    /// Copy of the metadata; mutate through [`Filing::add_metadata`].
    pub fn metadata(&self) -> HashMap<String, Value> {
        self.metadata.clone()
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn can_be_processed(&self) -> bool {
        matches!(
            self.processing_status,
            ProcessingStatus::Pending | ProcessingStatus::Failed
        )
    }

    pub fn mark_as_processing(&mut self) -> Result<(), DomainError> {
        self.transition(ProcessingStatus::Processing)?;
        self.processing_error = None;
        Ok(())
    }

    pub fn mark_as_completed(&mut self) -> Result<(), DomainError> {
        self.transition(ProcessingStatus::Completed)?;
        self.processing_error = None;
        Ok(())
    }

    pub fn mark_as_failed(&mut self, error: &str) -> Result<(), DomainError> {
        let error = error.trim();
        if error.is_empty() {
            return Err(DomainError::InvalidArgument(
                "error message cannot be empty".to_string(),
            ));
        }
        self.transition(ProcessingStatus::Failed)?;
        self.processing_error = Some(error.to_string());
        Ok(())
    }

    pub fn mark_as_cancelled(&mut self) -> Result<(), DomainError> {
        self.transition(ProcessingStatus::Cancelled)?;
        self.processing_error = None;
        Ok(())
    }

    /// Cancelled -> Pending, through the transition table.
    pub fn restart(&mut self) -> Result<(), DomainError> {
        self.transition(ProcessingStatus::Pending)?;
        self.processing_error = None;
        Ok(())
    }

    /// Forces the filing back to `Pending` from any state. Skips the
    /// transition table on purpose.
    pub fn reset_for_retry(&mut self) {
        debug!(
            "Resetting filing {} from {} to pending",
            self.accession_number, self.processing_status
        );
        self.processing_status = ProcessingStatus::Pending;
        self.processing_error = None;
    }

    fn transition(&mut self, target: ProcessingStatus) -> Result<(), DomainError> {
        if !self.processing_status.can_transition_to(target) {
            return Err(DomainError::InvalidTransition {
                from: self.processing_status,
                to: target,
            });
        }
        debug!(
            "Filing {}: {} -> {}",
            self.accession_number, self.processing_status, target
        );
        self.processing_status = target;
        Ok(())
    }
}

impl PartialEq for Filing {
    fn eq(&self, other: &Self) -> bool {
        self.accession_number == other.accession_number
    }
}

impl Eq for Filing {}

impl Hash for Filing {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.accession_number.hash(state);
    }
}

/// Serialized shape of a filing; deserializing re-checks the error/status invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FilingRecord {
    id: Uuid,
    company_id: Uuid,
    accession_number: AccessionNumber,
    filing_type: FilingType,
    filing_date: NaiveDate,
    processing_status: ProcessingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    processing_error: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

impl TryFrom<FilingRecord> for Filing {
    type Error = DomainError;

    fn try_from(record: FilingRecord) -> Result<Self, Self::Error> {
        Filing::from_parts(FilingParts {
            id: record.id,
            company_id: record.company_id,
            accession_number: record.accession_number,
            filing_type: record.filing_type,
            filing_date: record.filing_date,
            processing_status: record.processing_status,
            processing_error: record.processing_error,
            metadata: record.metadata,
        })
    }
}

impl From<Filing> for FilingRecord {
    fn from(filing: Filing) -> Self {
        FilingRecord {
            id: filing.id,
            company_id: filing.company_id,
            accession_number: filing.accession_number,
            filing_type: filing.filing_type,
            filing_date: filing.filing_date,
            processing_status: filing.processing_status,
            processing_error: filing.processing_error,
            metadata: filing.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    fn filing() -> Filing {
        Filing::new(
            Uuid::new_v4(),
            AccessionNumber::new("0000320193-23-000106").unwrap(),
            FilingType::Form10K,
            NaiveDate::from_ymd_opt(2023, 11, 3).unwrap(),
        )
    }

    fn assert_invariant(filing: &Filing) {
        assert_eq!(
            filing.processing_error().is_some(),
            filing.processing_status() == ProcessingStatus::Failed
        );
    }

    fn parts(status: ProcessingStatus, error: Option<&str>) -> FilingParts {
        FilingParts {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            accession_number: AccessionNumber::new("0000320193-23-000106").unwrap(),
            filing_type: FilingType::Form10K,
            filing_date: NaiveDate::from_ymd_opt(2023, 11, 3).unwrap(),
            processing_status: status,
            processing_error: error.map(str::to_string),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_new_filing_is_pending() {
        let filing = filing();
        assert_eq!(filing.processing_status(), ProcessingStatus::Pending);
        assert!(filing.can_be_processed());
        assert_invariant(&filing);
    }

    #[test]
    fn test_happy_path() {
        let mut filing = filing();
        filing.mark_as_processing().unwrap();
        assert_invariant(&filing);
        assert!(!filing.can_be_processed());
        filing.mark_as_completed().unwrap();
        assert_eq!(filing.processing_status(), ProcessingStatus::Completed);
        assert_invariant(&filing);
    }

    #[test]
    fn test_failure_and_retry() {
        let mut filing = filing();
        filing.mark_as_processing().unwrap();
        filing.mark_as_failed("  LLM timed out \n").unwrap();
        assert_eq!(filing.processing_error(), Some("LLM timed out"));
        assert!(filing.can_be_processed());
        assert_invariant(&filing);

        filing.mark_as_processing().unwrap();
        assert_eq!(filing.processing_error(), None);
        assert_invariant(&filing);
    }

    #[test]
    fn test_mark_as_failed_rejects_blank_message() {
        let mut filing = filing();
        filing.mark_as_processing().unwrap();
        for blank in ["", "   ", "\t\n"] {
            assert!(matches!(
                filing.mark_as_failed(blank),
                Err(DomainError::InvalidArgument(_))
            ));
        }
        assert_eq!(filing.processing_status(), ProcessingStatus::Processing);
        assert_invariant(&filing);
    }

    #[test]
    fn test_illegal_transitions_leave_state_untouched() {
        let mut filing = filing();
        assert_eq!(
            filing.mark_as_completed(),
            Err(DomainError::InvalidTransition {
                from: ProcessingStatus::Pending,
                to: ProcessingStatus::Completed,
            })
        );
        assert!(matches!(
            filing.mark_as_failed("boom"),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(filing.processing_status(), ProcessingStatus::Pending);
        assert_invariant(&filing);
    }

    #[test]
    fn test_cancel_and_restart() {
        let mut filing = filing();
        filing.mark_as_cancelled().unwrap();
        assert!(filing.mark_as_processing().is_err());
        filing.restart().unwrap();
        assert_eq!(filing.processing_status(), ProcessingStatus::Pending);
        assert!(filing.restart().is_err());
    }

    #[test]
    fn test_reset_for_retry_from_any_state() {
        for status in ProcessingStatus::iter() {
            let error = (status == ProcessingStatus::Failed).then_some("boom");
            let mut filing = Filing::from_parts(parts(status, error)).unwrap();
            filing.reset_for_retry();
            assert_eq!(filing.processing_status(), ProcessingStatus::Pending);
            assert_invariant(&filing);
        }
    }

    #[test]
    fn test_from_parts_enforces_error_invariant() {
        assert!(Filing::from_parts(parts(ProcessingStatus::Failed, None)).is_err());
        assert!(Filing::from_parts(parts(ProcessingStatus::Failed, Some("  "))).is_err());
        assert!(Filing::from_parts(parts(ProcessingStatus::Completed, Some("boom"))).is_err());
        assert!(Filing::from_parts(parts(ProcessingStatus::Failed, Some("boom"))).is_ok());
        assert!(Filing::from_parts(parts(ProcessingStatus::Processing, None)).is_ok());
    }

    #[test]
    fn test_equality_by_accession() {
        let a = filing();
        let mut b = Filing::new(
            Uuid::new_v4(),
            AccessionNumber::new("0000320193-23-000106").unwrap(),
            FilingType::Form8K,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        );
        b.mark_as_processing().unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_metadata_accessor_is_a_copy() {
        let mut filing = filing();
        filing.add_metadata("source", json!("edgar"));
        let mut copy = filing.metadata();
        copy.insert("source".to_string(), json!("tampered"));
        copy.insert("extra".to_string(), json!(1));
        assert_eq!(filing.metadata_value("source"), Some(&json!("edgar")));
        assert!(filing.metadata_value("extra").is_none());

        filing.add_metadata("source", json!("cache"));
        assert_eq!(filing.metadata_value("source"), Some(&json!("cache")));
    }

    #[test]
    fn test_serde_rejects_inconsistent_records() {
        let mut filing = filing();
        filing.mark_as_processing().unwrap();
        filing.mark_as_failed("boom").unwrap();
        let json = serde_json::to_value(&filing).unwrap();
        let back: Filing = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back.processing_error(), Some("boom"));

        let mut broken = json;
        broken["processing_status"] = json!("completed");
        assert!(serde_json::from_value::<Filing>(broken).is_err());
    }
}
