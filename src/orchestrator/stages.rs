use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::json;

use crate::core::analysis::SCHEMAS_USED;
use crate::core::{
    Analysis, AnalysisRequest, Company, Filing, FilingData, LlmResponse, ProcessingInfo,
    ProcessingStatus, Sections,
};
use crate::error::{DocumentSourceError, OrchestrationError};

use super::context::{missing, unexpected, OrchestrationContext};
use super::progress;
use super::templates::{self, required_sections, section_matches};
use super::AnalysisOrchestrator;

impl AnalysisOrchestrator {
    pub(super) async fn load_filing_data(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<(), OrchestrationError> {
        ctx.report(progress::STARTED, "Validating filing access").await;

        let data = self
            .documents
            .get_by_accession(&ctx.accession)
            .await
            .map_err(|e| {
                match &e {
                    DocumentSourceError::NotFound(_) | DocumentSourceError::Format(_) => {
                        warn!("Filing {} cannot be loaded: {}", ctx.accession, e)
                    }
                    DocumentSourceError::Other(cause) => {
                        error!("Document source failed for {}: {:#}", ctx.accession, cause)
                    }
                }
                OrchestrationError::filing_access_caused_by(ctx.accession.as_str(), e)
            })?;

        if data
            .company_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
        {
            return Err(OrchestrationError::filing_access(
                ctx.accession.as_str(),
                "document data has no company name",
            ));
        }
        if data.filing_type.is_none() {
            return Err(OrchestrationError::filing_access(
                ctx.accession.as_str(),
                "document data has no filing type",
            ));
        }

        ctx.filing_data = Some(data);
        Ok(())
    }

    pub(super) async fn resolve_filing(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<(), OrchestrationError> {
        let existing = self
            .filings
            .get_by_accession(&ctx.accession)
            .await
            .map_err(|e| ctx.unexpected(e))?;

        let filing = match existing {
            Some(filing) => {
                debug!(
                    "Filing {} already registered ({})",
                    ctx.accession,
                    filing.processing_status()
                );
                filing
            }
            None => self.register_filing(ctx).await?,
        };
        ctx.filing = Some(filing);
        Ok(())
    }

    async fn register_filing(
        &self,
        ctx: &OrchestrationContext,
    ) -> Result<Filing, OrchestrationError> {
        let data = ctx.filing_data()?;
        let company = self.resolve_company(ctx).await?;

        let mut filing = Filing::new(
            company.id,
            ctx.accession.clone(),
            ctx.filing_type()?,
            data.filing_date.unwrap_or_else(|| Utc::now().date_naive()),
        );
        filing.add_metadata("company_name", json!(company.name));
        if let Some(ticker) = &data.ticker {
            filing.add_metadata("ticker", json!(ticker));
        }

        match self.filings.create(filing).await {
            Ok(filing) => {
                info!("Registered filing {} for {}", ctx.accession, company.name);
                Ok(filing)
            }
            // Lost a race with a concurrent run registering the same filing.
            Err(e) => match self.filings.get_by_accession(&ctx.accession).await {
                Ok(Some(filing)) => Ok(filing),
                _ => Err(ctx.unexpected(e)),
            },
        }
    }

    async fn resolve_company(
        &self,
        ctx: &OrchestrationContext,
    ) -> Result<Company, OrchestrationError> {
        let cik = ctx.accession.filer_id();
        if let Some(company) = self
            .companies
            .get_by_cik(cik)
            .await
            .map_err(|e| ctx.unexpected(e))?
        {
            return Ok(company);
        }

        let ticker = ctx.filing_data()?.ticker.clone();
        let company =
            Company::new(cik, &ctx.company_name()?, ticker).map_err(|e| ctx.unexpected(e))?;
        match self.companies.create(company).await {
            Ok(company) => {
                info!("Registered company {} (CIK {})", company.name, company.cik);
                Ok(company)
            }
            Err(e) => match self.companies.get_by_cik(cik).await {
                Ok(Some(company)) => Ok(company),
                _ => Err(ctx.unexpected(e)),
            },
        }
    }

    /// Never fails: a lookup error only means a fresh analysis is run.
    pub(super) async fn find_reusable_analysis(
        &self,
        ctx: &OrchestrationContext,
    ) -> Option<Analysis> {
        if ctx.force_reprocess {
            info!("Reprocessing {} on request, skipping reuse check", ctx.accession);
            return None;
        }
        let filing = ctx.filing.as_ref()?;
        let template = ctx.template.to_string();
        let schemas: Vec<String> =
            match templates::resolve_schemas(ctx.template, ctx.custom_schemas.as_deref()) {
                Ok(schemas) => schemas.iter().map(ToString::to_string).collect(),
                Err(_) => return None,
            };

        match self
            .analyses
            .get_by_filing_id(&filing.id(), self.config.analysis_type)
            .await
        {
            Ok(analyses) => analyses.into_iter().find(|a| {
                !a.is_failed()
                    && a.template_used() == Some(template.as_str())
                    && a.metadata_value(SCHEMAS_USED) == Some(&json!(schemas))
            }),
            Err(e) => {
                warn!(
                    "Looking up earlier analyses of {} failed, running a fresh one: {:#}",
                    ctx.accession, e
                );
                None
            }
        }
    }

    pub(super) async fn start_analysis(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<(), OrchestrationError> {
        let analysis = Analysis::new(ctx.filing()?.id(), self.config.analysis_type, &ctx.user_id);
        let analysis = self
            .analyses
            .create(analysis)
            .await
            .map_err(|e| ctx.unexpected(e))?;
        info!("Created analysis {} for filing {}", analysis.id(), ctx.accession);
        ctx.analysis = Some(analysis);

        self.begin_processing(ctx).await?;
        ctx.report(progress::ANALYSIS_STARTED, "Analysis started").await;
        Ok(())
    }

    async fn begin_processing(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<(), OrchestrationError> {
        let accession = &ctx.accession;
        let filing = ctx
            .filing
            .as_mut()
            .ok_or_else(|| missing(accession, "filing record"))?;

        match filing.processing_status() {
            ProcessingStatus::Processing => {
                warn!("Filing {} is already marked as processing", accession);
                return Ok(());
            }
            ProcessingStatus::Cancelled => {
                filing.restart().map_err(|e| unexpected(accession, e))?;
            }
            _ => {}
        }
        filing
            .mark_as_processing()
            .map_err(|e| unexpected(accession, e))?;
        self.filings
            .update(filing)
            .await
            .map_err(|e| unexpected(accession, e))
    }

    pub(super) async fn resolve_analysis_schemas(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<(), OrchestrationError> {
        let schemas = templates::resolve_schemas(ctx.template, ctx.custom_schemas.as_deref())
            .map_err(|e| ctx.unexpected(e))?;
        ctx.schemas = schemas;
        info!(
            "Analyzing {} with template {} ({})",
            ctx.accession,
            ctx.template,
            ctx.schema_names().join(", ")
        );
        ctx.report(progress::TEMPLATE_RESOLVED, "Template resolved").await;
        Ok(())
    }

    pub(super) async fn extract_sections(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<(), OrchestrationError> {
        let required = required_sections(&ctx.schemas);
        let filing_type = ctx.filing_type()?;
        let data = ctx.filing_data()?;

        let extracted = match &data.ticker {
            Some(ticker) => match self.documents.extract_sections(ticker, &filing_type).await {
                Ok(all) => {
                    let found = all.len();
                    let kept = keep_required(all, &required);
                    if kept.is_empty() {
                        warn!(
                            "{} extracted sections of {} lack {}, using raw content",
                            found,
                            ctx.accession,
                            required.join(", ")
                        );
                        None
                    } else {
                        Some(kept)
                    }
                }
                Err(e) => {
                    warn!(
                        "Section extraction for {} failed, using raw content: {}",
                        ctx.accession, e
                    );
                    None
                }
            },
            None => {
                warn!("No ticker known for {}, using raw content", ctx.accession);
                None
            }
        };

        let sections = match extracted {
            Some(sections) => sections,
            None => self.fallback_sections(data, &required),
        };
        if sections.is_empty() {
            return Err(OrchestrationError::filing_access(
                ctx.accession.as_str(),
                "filing has no extractable content",
            ));
        }

        let sections = match self.config.max_section_chars {
            Some(limit) => truncate_sections(sections, limit),
            None => sections,
        };
        debug!(
            "Extracted sections for {}: {:?}",
            ctx.accession,
            sections.keys().collect::<Vec<_>>()
        );
        ctx.sections = sections;
        ctx.report(progress::SECTIONS_EXTRACTED, "Filing sections extracted")
            .await;
        Ok(())
    }

    fn fallback_sections(&self, data: &FilingData, required: &[&str]) -> Sections {
        if let Some(pre) = data.sections.as_ref().filter(|s| !s.is_empty()) {
            let kept = keep_required(pre.clone(), required);
            return if kept.is_empty() { pre.clone() } else { kept };
        }
        match data
            .raw_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
        {
            Some(text) => Sections::from([(
                self.config.fallback_section_label.clone(),
                text.to_string(),
            )]),
            None => Sections::new(),
        }
    }

    pub(super) async fn run_llm(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<LlmResponse, OrchestrationError> {
        let request = AnalysisRequest {
            sections: std::mem::take(&mut ctx.sections),
            filing_type: ctx.filing_type()?,
            company_name: ctx.company_name()?,
            schemas: ctx.schema_names(),
            instructions: ctx.custom_instructions.clone(),
        };
        info!(
            "Requesting LLM analysis of {} ({} sections)",
            ctx.accession,
            request.sections.len()
        );

        let response = self.llm.analyze(&request).await.map_err(|e| {
            error!("LLM analysis of {} failed: {:#}", ctx.accession, e);
            OrchestrationError::analysis_processing(ctx.accession.as_str(), e)
        })?;

        ctx.report(progress::LLM_COMPLETED, "LLM analysis completed").await;
        Ok(response)
    }

    pub(super) fn merge_results(
        &self,
        ctx: &mut OrchestrationContext,
        response: LlmResponse,
    ) -> Result<(), OrchestrationError> {
        let info = ProcessingInfo {
            template: ctx.template.to_string(),
            schemas: ctx.schema_names(),
            accession_number: ctx.accession.to_string(),
            force_reprocess: ctx.force_reprocess,
            custom_instructions: ctx.custom_instructions.clone(),
        };
        let accession = &ctx.accession;
        let analysis = ctx
            .analysis
            .as_mut()
            .ok_or_else(|| missing(accession, "analysis"))?;

        analysis
            .set_results(response.payload, response.confidence_score)
            .map_err(|e| unexpected(accession, e))?;
        analysis.set_llm_provenance(response.provider, response.model);
        analysis.record_processing(&info);
        Ok(())
    }

    pub(super) async fn persist_completion(
        &self,
        ctx: &mut OrchestrationContext,
    ) -> Result<Analysis, OrchestrationError> {
        ctx.record_progress(progress::COMPLETED, "Analysis completed");

        let accession = &ctx.accession;
        let analysis = ctx
            .analysis
            .as_ref()
            .ok_or_else(|| missing(accession, "analysis"))?;
        self.analyses
            .update(analysis)
            .await
            .map_err(|e| unexpected(accession, e))?;

        let filing = ctx
            .filing
            .as_mut()
            .ok_or_else(|| missing(accession, "filing record"))?;
        if filing.processing_status() != ProcessingStatus::Completed {
            filing
                .mark_as_completed()
                .map_err(|e| unexpected(accession, e))?;
            self.filings
                .update(filing)
                .await
                .map_err(|e| unexpected(accession, e))?;
        }

        ctx.progress
            .report(progress::COMPLETED, "Analysis completed")
            .await;
        ctx.analysis
            .take()
            .ok_or_else(|| missing(&ctx.accession, "analysis"))
    }

    /// Annotates the analysis and filing with the failure. Errors here are
    /// only logged; the caller always sees the error that stopped the run.
    pub(super) async fn record_failure(
        &self,
        ctx: &mut OrchestrationContext,
        failure: &OrchestrationError,
    ) {
        let reason = failure.to_string();

        if let Some(analysis) = ctx.analysis.as_mut() {
            analysis.record_failure(&reason, failure.category());
            if let Err(e) = self.analyses.update(analysis).await {
                error!(
                    "Could not record failure on analysis {}: {:#}",
                    analysis.id(),
                    e
                );
            }
        }

        let Some(filing) = ctx.filing.as_mut() else {
            return;
        };
        if !filing.processing_status().is_active() {
            return;
        }
        match filing.mark_as_failed(&reason) {
            Ok(()) => {
                if let Err(e) = self.filings.update(filing).await {
                    error!("Could not mark filing {} as failed: {:#}", ctx.accession, e);
                }
            }
            Err(e) => error!("Could not mark filing {} as failed: {}", ctx.accession, e),
        }
    }
}

/// Keeps the sections some schema needs.
fn keep_required(sections: Sections, required: &[&str]) -> Sections {
    sections
        .into_iter()
        .filter(|(label, _)| required.iter().any(|r| section_matches(label, r)))
        .collect()
}

fn truncate_sections(sections: Sections, limit: usize) -> Sections {
    sections
        .into_iter()
        .map(|(label, mut text)| {
            if let Some((cut, _)) = text.char_indices().nth(limit) {
                debug!("Truncating section {} to {} chars", label, limit);
                text.truncate(cut);
            }
            (label, text)
        })
        .collect()
}
