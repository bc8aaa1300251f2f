use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::core::{Analysis, AnalysisType, Company, Filing};
use crate::edgar::AccessionNumber;

pub mod memory;
pub mod query;

pub use self::memory::{
    InMemoryAnalysisRepository, InMemoryCompanyRepository, InMemoryFilingRepository,
};
pub use self::query::{AnalysisFilter, FilingFilter, Page, PageRequest};

#[async_trait]
pub trait FilingRepository: Send + Sync {
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Filing>>;

    async fn get_by_accession(&self, accession: &AccessionNumber) -> Result<Option<Filing>>;

    /// Fails if a filing with the same accession number already exists.
    async fn create(&self, filing: Filing) -> Result<Filing>;

    async fn update(&self, filing: &Filing) -> Result<()>;

    /// Newest filing date first.
    async fn find(&self, filter: &FilingFilter, page: PageRequest) -> Result<Page<Filing>>;
}

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Analysis>>;

    async fn get_by_filing_id(
        &self,
        filing_id: &Uuid,
        analysis_type: AnalysisType,
    ) -> Result<Vec<Analysis>>;

    async fn create(&self, analysis: Analysis) -> Result<Analysis>;

    async fn update(&self, analysis: &Analysis) -> Result<()>;

    /// Newest analysis first.
    async fn find(&self, filter: &AnalysisFilter, page: PageRequest) -> Result<Page<Analysis>>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Company>>;

    async fn get_by_cik(&self, cik: &str) -> Result<Option<Company>>;

    async fn create(&self, company: Company) -> Result<Company>;
}
