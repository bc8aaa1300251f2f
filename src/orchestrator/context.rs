use std::time::Duration;

use crate::core::{Analysis, Filing, FilingData, Sections};
use crate::edgar::{AccessionNumber, FilingType};
use crate::error::{BoxError, OrchestrationError};

use super::command::AnalyzeFilingCommand;
use super::progress::ProgressReporter;
use super::templates::{AnalysisSchema, AnalysisTemplate};

/// State threaded through the stages of one orchestration run.
pub struct OrchestrationContext {
    pub accession: AccessionNumber,
    pub template: AnalysisTemplate,
    pub custom_schemas: Option<Vec<String>>,
    pub force_reprocess: bool,
    pub user_id: String,
    pub custom_instructions: Option<String>,
    pub progress: ProgressReporter,

    pub filing_data: Option<FilingData>,
    pub filing: Option<Filing>,
    pub analysis: Option<Analysis>,
    pub schemas: Vec<AnalysisSchema>,
    pub sections: Sections,
}

impl OrchestrationContext {
    pub fn new(
        command: AnalyzeFilingCommand,
        accession: AccessionNumber,
        progress_timeout: Duration,
    ) -> Self {
        Self {
            accession,
            template: command.template,
            custom_schemas: command.schemas,
            force_reprocess: command.force_reprocess,
            user_id: command.user_id.trim().to_string(),
            custom_instructions: command.custom_instructions.map(|i| i.trim().to_string()),
            progress: ProgressReporter::new(command.progress, progress_timeout),
            filing_data: None,
            filing: None,
            analysis: None,
            schemas: Vec::new(),
            sections: Sections::new(),
        }
    }

    /// Records progress on the analysis (once it exists) and notifies the caller.
    pub async fn report(&mut self, progress: f64, message: &str) {
        self.record_progress(progress, message);
        self.progress.report(progress, message).await;
    }

    pub fn record_progress(&mut self, progress: f64, message: &str) {
        if let Some(analysis) = self.analysis.as_mut() {
            analysis.record_progress(progress, message);
        }
    }

    pub fn unexpected(&self, source: impl Into<BoxError>) -> OrchestrationError {
        unexpected(&self.accession, source)
    }

    pub fn filing_data(&self) -> Result<&FilingData, OrchestrationError> {
        self.filing_data
            .as_ref()
            .ok_or_else(|| missing(&self.accession, "filing data"))
    }

    pub fn filing(&self) -> Result<&Filing, OrchestrationError> {
        self.filing
            .as_ref()
            .ok_or_else(|| missing(&self.accession, "filing record"))
    }

    /// Both are checked when the filing data is loaded.
    pub fn company_name(&self) -> Result<String, OrchestrationError> {
        self.filing_data()?
            .company_name
            .as_deref()
            .map(|name| name.trim().to_string())
            .ok_or_else(|| missing(&self.accession, "company name"))
    }

    pub fn filing_type(&self) -> Result<FilingType, OrchestrationError> {
        self.filing_data()?
            .filing_type
            .clone()
            .ok_or_else(|| missing(&self.accession, "filing type"))
    }

    pub fn schema_names(&self) -> Vec<String> {
        self.schemas.iter().map(ToString::to_string).collect()
    }
}

pub(crate) fn unexpected(
    accession: &AccessionNumber,
    source: impl Into<BoxError>,
) -> OrchestrationError {
    OrchestrationError::orchestration(accession.as_str(), source)
}

pub(crate) fn missing(accession: &AccessionNumber, what: &str) -> OrchestrationError {
    unexpected(accession, format!("{} not available at this stage", what))
}
