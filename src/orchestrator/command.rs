use crate::edgar::AccessionNumber;
use crate::error::OrchestrationError;

use super::progress::ProgressCallback;
use super::templates::{resolve_schemas, AnalysisTemplate};

/// Request to analyze one filing.
#[derive(Debug, Clone)]
pub struct AnalyzeFilingCommand {
    pub accession_number: String,
    pub template: AnalysisTemplate,
    /// Explicit schema names; overrides the template when set.
    pub schemas: Option<Vec<String>>,
    pub force_reprocess: bool,
    pub user_id: String,
    pub custom_instructions: Option<String>,
    pub progress: Option<ProgressCallback>,
}

impl AnalyzeFilingCommand {
    pub fn new(accession_number: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            accession_number: accession_number.into(),
            template: AnalysisTemplate::default(),
            schemas: None,
            force_reprocess: false,
            user_id: user_id.into(),
            custom_instructions: None,
            progress: None,
        }
    }

    pub fn with_template(mut self, template: AnalysisTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_schemas(mut self, schemas: Vec<String>) -> Self {
        self.schemas = Some(schemas);
        self
    }

    pub fn with_force_reprocess(mut self, force: bool) -> Self {
        self.force_reprocess = force;
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Structural checks only; nothing here touches a collaborator.
    pub fn validate(&self) -> Result<AccessionNumber, OrchestrationError> {
        if self.accession_number.trim().is_empty() {
            return Err(OrchestrationError::CommandValidation(
                "accession number is required".to_string(),
            ));
        }
        let accession = AccessionNumber::new(&self.accession_number)
            .map_err(|e| OrchestrationError::CommandValidation(e.to_string()))?;

        if self.user_id.trim().is_empty() {
            return Err(OrchestrationError::CommandValidation(
                "user id is required".to_string(),
            ));
        }

        if let Some(schemas) = &self.schemas {
            if schemas.is_empty() {
                return Err(OrchestrationError::CommandValidation(
                    "schema selection cannot be empty".to_string(),
                ));
            }
            resolve_schemas(self.template, Some(schemas))
                .map_err(OrchestrationError::CommandValidation)?;
        }

        if let Some(instructions) = &self.custom_instructions {
            if instructions.trim().is_empty() {
                return Err(OrchestrationError::CommandValidation(
                    "custom instructions cannot be blank".to_string(),
                ));
            }
        }

        Ok(accession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> AnalyzeFilingCommand {
        AnalyzeFilingCommand::new("0000320193-23-000106", "analyst-1")
    }

    #[test]
    fn test_valid_command() {
        let accession = command()
            .with_template(AnalysisTemplate::RiskFocused)
            .with_schemas(vec!["risk_factors".to_string()])
            .with_instructions("compare with last year")
            .validate()
            .unwrap();
        assert_eq!(accession.as_str(), "0000320193-23-000106");
    }

    #[test]
    fn test_rejects_missing_fields() {
        let cases = vec![
            AnalyzeFilingCommand::new("", "analyst-1"),
            AnalyzeFilingCommand::new("not-an-accession", "analyst-1"),
            AnalyzeFilingCommand::new("0000320193-2\u{0663}-000106", "analyst-1"),
            AnalyzeFilingCommand::new("0000320193-23-000106", "  "),
            command().with_schemas(vec![]),
            command().with_schemas(vec!["horoscope".to_string()]),
            command().with_instructions(" "),
        ];
        for case in cases {
            assert!(
                matches!(case.validate(), Err(OrchestrationError::CommandValidation(_))),
                "accepted {:?}",
                case
            );
        }
    }
}
