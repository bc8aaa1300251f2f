//! Analysis templates and the filing sections each schema needs.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// Canonical section labels
pub const BUSINESS: &str = "business";
pub const RISK_FACTORS: &str = "risk_factors";
pub const MDA: &str = "mda";
pub const MARKET_RISK: &str = "market_risk";
pub const FINANCIAL_STATEMENTS: &str = "financial_statements";

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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AnalysisTemplate {
    #[default]
    Comprehensive,
    FinancialFocused,
    RiskFocused,
    BusinessFocused,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AnalysisSchema {
    Business,
    RiskFactors,
    Mda,
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl AnalysisTemplate {
    pub fn schemas(self) -> &'static [AnalysisSchema] {
        use AnalysisSchema::*;
        match self {
            AnalysisTemplate::Comprehensive => &[
                Business,
                RiskFactors,
                Mda,
                BalanceSheet,
                IncomeStatement,
                CashFlow,
            ],
            AnalysisTemplate::FinancialFocused => &[Mda, BalanceSheet, IncomeStatement, CashFlow],
            AnalysisTemplate::RiskFocused => &[RiskFactors, Mda],
            AnalysisTemplate::BusinessFocused => &[Business, Mda],
        }
    }
}

impl AnalysisSchema {
    pub fn required_sections(self) -> &'static [&'static str] {
        match self {
            AnalysisSchema::Business => &[BUSINESS],
            AnalysisSchema::RiskFactors => &[RISK_FACTORS],
            AnalysisSchema::Mda => &[MDA, MARKET_RISK],
            AnalysisSchema::BalanceSheet
            | AnalysisSchema::IncomeStatement
            | AnalysisSchema::CashFlow => &[FINANCIAL_STATEMENTS],
        }
    }
}

/// Schemas to analyze: an explicit selection wins over the template.
pub fn resolve_schemas(
    template: AnalysisTemplate,
    custom: Option<&[String]>,
) -> Result<Vec<AnalysisSchema>, String> {
    match custom {
        Some(names) => names
            .iter()
            .map(|name| {
                name.trim()
                    .parse::<AnalysisSchema>()
                    .map_err(|_| format!("unknown analysis schema '{}'", name))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|schemas| schemas.into_iter().unique().collect()),
        None => Ok(template.schemas().to_vec()),
    }
}

pub fn required_sections(schemas: &[AnalysisSchema]) -> Vec<&'static str> {
    schemas
        .iter()
        .flat_map(|s| s.required_sections().iter().copied())
        .unique()
        .collect()
}

/// Heading phrases, normalized, that identify a canonical section.
fn section_aliases(section: &str) -> &'static [&'static str] {
    match section {
        BUSINESS => &["business"],
        RISK_FACTORS => &["risk_factors"],
        MDA => &["mda", "managements_discussion", "management_discussion"],
        MARKET_RISK => &["market_risk"],
        FINANCIAL_STATEMENTS => &["financial_statements"],
        _ => &[],
    }
}

// Form 10-K item numbers for headings that carry no title.
const TEN_K_ITEMS: [(&str, &str); 5] = [
    ("item_1", BUSINESS),
    ("item_1a", RISK_FACTORS),
    ("item_7", MDA),
    ("item_7a", MARKET_RISK),
    ("item_8", FINANCIAL_STATEMENTS),
];

/// Folds labels like "Item 7. MD&A" to `item_7_mda`.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['&', '\'', '\u{2019}', '.'], "")
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .join("_")
}

/// True when a document section label names the required section.
///
/// Bare item headings ("Item 7") resolve through the 10-K item numbers.
/// Titled headings match when one of the section's phrases appears in them
/// as whole words, so "Item 8. Financial Statements and Supplementary Data"
/// is a financial statements section.
pub fn section_matches(label: &str, required: &str) -> bool {
    let label = normalize_label(label);
    if let Some((_, section)) = TEN_K_ITEMS.iter().find(|(item, _)| *item == label) {
        return *section == required;
    }
    let words = format!("_{}_", label);
    std::iter::once(required)
        .chain(section_aliases(required).iter().copied())
        .any(|alias| words.contains(&format!("_{}_", alias)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_resolution() {
        let schemas = resolve_schemas(AnalysisTemplate::RiskFocused, None).unwrap();
        assert_eq!(schemas, vec![AnalysisSchema::RiskFactors, AnalysisSchema::Mda]);
        assert_eq!(required_sections(&schemas), vec![RISK_FACTORS, MDA, MARKET_RISK]);
    }

    #[test]
    fn test_custom_selection_overrides_template() {
        let custom = vec![
            "cash_flow".to_string(),
            "Balance_Sheet".to_string(),
            "cash_flow".to_string(),
        ];
        let schemas = resolve_schemas(AnalysisTemplate::Comprehensive, Some(&custom)).unwrap();
        assert_eq!(schemas, vec![AnalysisSchema::CashFlow, AnalysisSchema::BalanceSheet]);
        assert_eq!(required_sections(&schemas), vec![FINANCIAL_STATEMENTS]);
    }

    #[test]
    fn test_unknown_schema() {
        let custom = vec!["weather".to_string()];
        let err = resolve_schemas(AnalysisTemplate::Comprehensive, Some(&custom)).unwrap_err();
        assert!(err.contains("weather"));
    }

    #[test]
    fn test_comprehensive_covers_every_section() {
        let sections = required_sections(AnalysisTemplate::Comprehensive.schemas());
        assert_eq!(sections.len(), 5);
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Risk Factors"), "risk_factors");
        assert_eq!(normalize_label("  MD&A "), "mda");
        assert_eq!(normalize_label("financial-statements"), "financial_statements");
        assert_eq!(normalize_label("Management\u{2019}s Discussion"), "managements_discussion");
    }

    #[test]
    fn test_section_matches() {
        assert!(section_matches("Item 1A. Risk Factors", RISK_FACTORS));
        assert!(section_matches("Item 7. MD&A", MDA));
        assert!(section_matches("business", BUSINESS));
        assert!(!section_matches("Item 1B. Unresolved Staff Comments", RISK_FACTORS));
    }

    #[test]
    fn test_section_matches_full_edgar_headings() {
        let mda = "Item 7. Management\u{2019}s Discussion and Analysis of Financial Condition \
                   and Results of Operations";
        let market = "Item 7A. Quantitative and Qualitative Disclosures About Market Risk";
        let statements = "Item 8. Financial Statements and Supplementary Data";

        assert!(section_matches(mda, MDA));
        assert!(section_matches("ITEM 7. MANAGEMENT'S DISCUSSION AND ANALYSIS", MDA));
        assert!(!section_matches(mda, FINANCIAL_STATEMENTS));
        assert!(section_matches(market, MARKET_RISK));
        assert!(!section_matches(market, MDA));
        assert!(section_matches(statements, FINANCIAL_STATEMENTS));
        assert!(!section_matches(
            "Item 9. Changes in and Disagreements With Accountants on Accounting and \
             Financial Disclosure",
            FINANCIAL_STATEMENTS
        ));
    }

    #[test]
    fn test_financial_template_keeps_every_needed_heading() {
        let required = required_sections(AnalysisTemplate::FinancialFocused.schemas());
        let headings = [
            "Item 7. Management's Discussion and Analysis of Financial Condition and Results \
             of Operations",
            "Item 7A. Quantitative and Qualitative Disclosures About Market Risk",
            "Item 8. Financial Statements and Supplementary Data",
        ];
        for heading in headings {
            assert!(
                required.iter().any(|r| section_matches(heading, r)),
                "dropped {:?}",
                heading
            );
        }
        assert!(!required.iter().any(|r| section_matches("Item 1. Business", r)));
    }

    #[test]
    fn test_bare_item_headings() {
        assert!(section_matches("Item 7.", MDA));
        assert!(section_matches("ITEM 7A", MARKET_RISK));
        assert!(section_matches("Item 8", FINANCIAL_STATEMENTS));
        assert!(!section_matches("Item 7", MARKET_RISK));
    }

    #[test]
    fn test_template_strings() {
        assert_eq!(AnalysisTemplate::FinancialFocused.to_string(), "financial_focused");
        assert_eq!(
            "RISK_FOCUSED".parse::<AnalysisTemplate>().unwrap(),
            AnalysisTemplate::RiskFocused
        );
    }
}
