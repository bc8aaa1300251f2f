use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Analysis, AnalysisType, Filing, ProcessingStatus};
use crate::edgar::FilingType;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Filter for listing filings. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilingFilter {
    pub company_id: Option<Uuid>,
    pub filing_type: Option<FilingType>,
    pub status: Option<ProcessingStatus>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl FilingFilter {
    pub fn with_company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn with_filing_type(mut self, filing_type: FilingType) -> Self {
        self.filing_type = Some(filing_type);
        self
    }

    pub fn with_status(mut self, status: ProcessingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((start, end)) = self.date_range {
            if start > end {
                return Err(anyhow!("Start date must be before or equal to end date"));
            }
        }
        Ok(())
    }

    pub fn matches(&self, filing: &Filing) -> bool {
        self.company_id.map_or(true, |id| filing.company_id() == id)
            && self
                .filing_type
                .as_ref()
                .map_or(true, |t| filing.filing_type() == t)
            && self
                .status
                .map_or(true, |s| filing.processing_status() == s)
            && self.date_range.map_or(true, |(start, end)| {
                filing.filing_date() >= start && filing.filing_date() <= end
            })
    }
}

/// Filter for listing analyses. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisFilter {
    pub filing_id: Option<Uuid>,
    pub analysis_type: Option<AnalysisType>,
    pub created_by: Option<String>,
    pub min_confidence: Option<f64>,
}

impl AnalysisFilter {
    pub fn with_filing(mut self, filing_id: Uuid) -> Self {
        self.filing_id = Some(filing_id);
        self
    }

    pub fn with_analysis_type(mut self, analysis_type: AnalysisType) -> Self {
        self.analysis_type = Some(analysis_type);
        self
    }

    pub fn with_creator(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(min) = self.min_confidence {
            if !(0.0..=1.0).contains(&min) {
                return Err(anyhow!("Minimum confidence must be within [0, 1], got {}", min));
            }
        }
        Ok(())
    }

    pub fn matches(&self, analysis: &Analysis) -> bool {
        self.filing_id.map_or(true, |id| analysis.filing_id() == id)
            && self
                .analysis_type
                .map_or(true, |t| analysis.analysis_type() == t)
            && self
                .created_by
                .as_deref()
                .map_or(true, |user| analysis.created_by() == user)
            && self.min_confidence.map_or(true, |min| {
                analysis.confidence_score().map_or(false, |score| score >= min)
            })
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Result<Self> {
        if page == 0 {
            return Err(anyhow!("Page numbers start at 1"));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(anyhow!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE,
                page_size
            ));
        }
        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1)) * self.page_size
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Cuts one page out of an already filtered and sorted result set.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.page_size)
            .collect();
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_validation() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_SIZE + 1).is_err());
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn test_page_slicing() {
        let page = Page::from_sorted(
            (1..=25).collect::<Vec<_>>(),
            PageRequest::new(3, 10).unwrap(),
        );
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_next());
        assert!(page.has_previous());

        let first = Page::from_sorted((1..=25).collect::<Vec<_>>(), PageRequest::default());
        assert_eq!(first.items.len(), DEFAULT_PAGE_SIZE);
        assert!(first.has_next());
        assert!(!first.has_previous());
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = Page::from_sorted(vec![1, 2, 3], PageRequest::new(5, 10).unwrap());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_filter_validation() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert!(FilingFilter::default().with_date_range(start, end).validate().is_err());
        assert!(AnalysisFilter::default().with_min_confidence(1.2).validate().is_err());
    }
}
