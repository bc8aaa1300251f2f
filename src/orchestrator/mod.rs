//! Runs one filing through the analysis pipeline.
//!
//! Stages, in order: load the filing's document data, register the filing
//! and its company, reuse a finished analysis when one matches, then
//! resolve schemas, extract sections, call the LLM and persist the result.
//! Every failure is reported as one of the [`OrchestrationError`] kinds.

mod context;
mod stages;

pub mod command;
pub mod progress;
pub mod templates;

use futures::FutureExt;
use log::{error, info, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::core::{Analysis, DocumentSource, LlmProvider, OrchestratorConfig};
use crate::error::OrchestrationError;
use crate::storage::{AnalysisRepository, CompanyRepository, FilingRepository};
use context::OrchestrationContext;

pub use command::AnalyzeFilingCommand;
pub use progress::{ProgressCallback, ProgressReporter};
pub use templates::{AnalysisSchema, AnalysisTemplate};

pub struct AnalysisOrchestrator {
    documents: Arc<dyn DocumentSource>,
    llm: Arc<dyn LlmProvider>,
    filings: Arc<dyn FilingRepository>,
    analyses: Arc<dyn AnalysisRepository>,
    companies: Arc<dyn CompanyRepository>,
    config: OrchestratorConfig,
}

impl AnalysisOrchestrator {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        llm: Arc<dyn LlmProvider>,
        filings: Arc<dyn FilingRepository>,
        analyses: Arc<dyn AnalysisRepository>,
        companies: Arc<dyn CompanyRepository>,
    ) -> Self {
        Self {
            documents,
            llm,
            filings,
            analyses,
            companies,
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Analyzes the filing named by `command`, or returns an earlier
    /// analysis of it when one matches and reprocessing was not forced.
    pub async fn orchestrate(
        &self,
        command: AnalyzeFilingCommand,
    ) -> Result<Analysis, OrchestrationError> {
        let accession = command.validate().map_err(|e| {
            warn!("Rejected analysis command: {}", e);
            e
        })?;

        let mut ctx = OrchestrationContext::new(command, accession, self.config.progress_timeout);
        info!(
            "Starting analysis of filing {} (template: {}, force: {}, user: {})",
            ctx.accession, ctx.template, ctx.force_reprocess, ctx.user_id
        );

        let outcome = match AssertUnwindSafe(self.run(&mut ctx)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(OrchestrationError::orchestration(
                ctx.accession.as_str(),
                format!("analysis pipeline panicked: {}", panic_message(&*panic)),
            )),
        };

        match outcome {
            Ok(analysis) => {
                info!(
                    "Analysis {} of filing {} finished (confidence {:?})",
                    analysis.id(),
                    ctx.accession,
                    analysis.confidence_score()
                );
                Ok(analysis)
            }
            Err(err) => {
                error!("{}", err);
                self.record_failure(&mut ctx, &err).await;
                Err(err)
            }
        }
    }

    async fn run(&self, ctx: &mut OrchestrationContext) -> Result<Analysis, OrchestrationError> {
        self.load_filing_data(ctx).await?;
        self.resolve_filing(ctx).await?;

        if let Some(existing) = self.find_reusable_analysis(ctx).await {
            info!(
                "Reusing analysis {} of filing {}",
                existing.id(),
                ctx.accession
            );
            ctx.progress
                .report(progress::COMPLETED, "Existing analysis reused")
                .await;
            return Ok(existing);
        }

        self.start_analysis(ctx).await?;
        self.resolve_analysis_schemas(ctx).await?;
        self.extract_sections(ctx).await?;
        let response = self.run_llm(ctx).await?;
        self.merge_results(ctx, response)?;
        self.persist_completion(ctx).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
