use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::query::{AnalysisFilter, FilingFilter, Page, PageRequest};
use super::{AnalysisRepository, CompanyRepository, FilingRepository};
use crate::core::{Analysis, AnalysisType, Company, Filing};
use crate::edgar::AccessionNumber;

#[derive(Default)]
pub struct InMemoryFilingRepository {
    filings: RwLock<HashMap<Uuid, Filing>>,
}

impl InMemoryFilingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.filings.read().await.len()
    }
}

#[async_trait]
impl FilingRepository for InMemoryFilingRepository {
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Filing>> {
        Ok(self.filings.read().await.get(id).cloned())
    }

    async fn get_by_accession(&self, accession: &AccessionNumber) -> Result<Option<Filing>> {
        let filings = self.filings.read().await;
        Ok(filings
            .values()
            .find(|f| f.accession_number() == accession)
            .cloned())
    }

    async fn create(&self, filing: Filing) -> Result<Filing> {
        let mut filings = self.filings.write().await;
        if filings.values().any(|f| f == &filing) {
            return Err(anyhow!(
                "Filing {} already exists",
                filing.accession_number()
            ));
        }
        log::debug!("Storing filing {} as {}", filing.accession_number(), filing.id());
        filings.insert(filing.id(), filing.clone());
        Ok(filing)
    }

    async fn update(&self, filing: &Filing) -> Result<()> {
        let mut filings = self.filings.write().await;
        match filings.get_mut(&filing.id()) {
            Some(existing) => {
                *existing = filing.clone();
                Ok(())
            }
            None => Err(anyhow!("Filing not found: {}", filing.id())),
        }
    }

    async fn find(&self, filter: &FilingFilter, page: PageRequest) -> Result<Page<Filing>> {
        filter.validate()?;
        let mut matching: Vec<Filing> = self
            .filings
            .read()
            .await
            .values()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.filing_date()
                .cmp(&a.filing_date())
                .then_with(|| a.accession_number().cmp(b.accession_number()))
        });
        Ok(Page::from_sorted(matching, page))
    }
}

#[derive(Default)]
pub struct InMemoryAnalysisRepository {
    analyses: RwLock<HashMap<Uuid, Analysis>>,
}

impl InMemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.analyses.read().await.len()
    }

    pub async fn all(&self) -> Vec<Analysis> {
        self.analyses.read().await.values().cloned().collect()
    }
}

fn newest_first(analyses: &mut [Analysis]) {
    analyses.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Analysis>> {
        Ok(self.analyses.read().await.get(id).cloned())
    }

    async fn get_by_filing_id(
        &self,
        filing_id: &Uuid,
        analysis_type: AnalysisType,
    ) -> Result<Vec<Analysis>> {
        let mut matching: Vec<Analysis> = self
            .analyses
            .read()
            .await
            .values()
            .filter(|a| a.filing_id() == *filing_id && a.analysis_type() == analysis_type)
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(matching)
    }

    async fn create(&self, analysis: Analysis) -> Result<Analysis> {
        let mut analyses = self.analyses.write().await;
        if analyses.contains_key(&analysis.id()) {
            return Err(anyhow!("Analysis {} already exists", analysis.id()));
        }
        analyses.insert(analysis.id(), analysis.clone());
        Ok(analysis)
    }

    async fn update(&self, analysis: &Analysis) -> Result<()> {
        let mut analyses = self.analyses.write().await;
        match analyses.get_mut(&analysis.id()) {
            Some(existing) => {
                *existing = analysis.clone();
                Ok(())
            }
            None => Err(anyhow!("Analysis not found: {}", analysis.id())),
        }
    }

    async fn find(&self, filter: &AnalysisFilter, page: PageRequest) -> Result<Page<Analysis>> {
        filter.validate()?;
        let mut matching: Vec<Analysis> = self
            .analyses
            .read()
            .await
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(Page::from_sorted(matching, page))
    }
}

#[derive(Default)]
pub struct InMemoryCompanyRepository {
    companies: RwLock<HashMap<Uuid, Company>>,
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.companies.read().await.len()
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Company>> {
        Ok(self.companies.read().await.get(id).cloned())
    }

    async fn get_by_cik(&self, cik: &str) -> Result<Option<Company>> {
        let companies = self.companies.read().await;
        Ok(companies.values().find(|c| c.cik == cik).cloned())
    }

    async fn create(&self, company: Company) -> Result<Company> {
        let mut companies = self.companies.write().await;
        if companies.values().any(|c| c.cik == company.cik) {
            return Err(anyhow!("Company with CIK {} already exists", company.cik));
        }
        companies.insert(company.id, company.clone());
        Ok(company)
    }
}
