use thiserror::Error;

use crate::core::status::ProcessingStatus;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by value objects and entities when their invariants are violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid value '{value}': {reason}")]
    Validation { value: String, reason: String },

    #[error("cannot transition filing from {from} to {to}")]
    InvalidTransition {
        from: ProcessingStatus,
        to: ProcessingStatus,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DomainError {
    pub fn validation(value: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::Validation {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a document source.
#[derive(Debug, Error)]
pub enum DocumentSourceError {
    #[error("filing not found: {0}")]
    NotFound(String),

    #[error("malformed filing data: {0}")]
    Format(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The only failure kinds callers of the orchestrator ever see.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("invalid analysis command: {0}")]
    CommandValidation(String),

    #[error("filing {accession} is not accessible: {reason}")]
    FilingAccess {
        accession: String,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("analysis of filing {accession} failed: {source}")]
    AnalysisProcessing {
        accession: String,
        #[source]
        source: BoxError,
    },

    #[error("orchestration of filing {accession} failed: {source}")]
    Orchestration {
        accession: String,
        #[source]
        source: BoxError,
    },
}

impl OrchestrationError {
    pub fn filing_access(accession: impl Into<String>, reason: impl Into<String>) -> Self {
        OrchestrationError::FilingAccess {
            accession: accession.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn filing_access_caused_by(
        accession: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        let source = source.into();
        OrchestrationError::FilingAccess {
            accession: accession.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub fn analysis_processing(accession: impl Into<String>, source: impl Into<BoxError>) -> Self {
        OrchestrationError::AnalysisProcessing {
            accession: accession.into(),
            source: source.into(),
        }
    }

    pub fn orchestration(accession: impl Into<String>, source: impl Into<BoxError>) -> Self {
        OrchestrationError::Orchestration {
            accession: accession.into(),
            source: source.into(),
        }
    }

    /// Stable category label, recorded in analysis metadata on failure.
    pub fn category(&self) -> &'static str {
        match self {
            OrchestrationError::CommandValidation(_) => "command_validation",
            OrchestrationError::FilingAccess { .. } => "filing_access",
            OrchestrationError::AnalysisProcessing { .. } => "analysis_processing",
            OrchestrationError::Orchestration { .. } => "orchestration",
        }
    }
}
