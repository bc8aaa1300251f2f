use anyhow::{anyhow, Result};
use std::time::Duration;

use super::analysis::AnalysisType;

pub const DEFAULT_FALLBACK_SECTION: &str = "full_text";

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Upper bound on a single progress callback invocation.
    pub progress_timeout: Duration,
    /// Sections longer than this are truncated before reaching the LLM.
    pub max_section_chars: Option<usize>,
    /// Label used when only the raw filing text is available.
    pub fallback_section_label: String,
    pub analysis_type: AnalysisType,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            progress_timeout: Duration::from_secs(5),
            max_section_chars: None,
            fallback_section_label: DEFAULT_FALLBACK_SECTION.to_string(),
            analysis_type: AnalysisType::FilingAnalysis,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default = Self::default();

        let progress_timeout = match lookup("FILING_ANALYST_PROGRESS_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(v.trim().parse().map_err(|_| {
                anyhow!("FILING_ANALYST_PROGRESS_TIMEOUT_MS must be milliseconds, got '{}'", v)
            })?),
            None => default.progress_timeout,
        };

        let max_section_chars = match lookup("FILING_ANALYST_MAX_SECTION_CHARS") {
            Some(v) => Some(v.trim().parse().map_err(|_| {
                anyhow!("FILING_ANALYST_MAX_SECTION_CHARS must be a positive integer, got '{}'", v)
            })?),
            None => default.max_section_chars,
        };

        let fallback_section_label = lookup("FILING_ANALYST_FALLBACK_SECTION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default.fallback_section_label);

        let analysis_type = match lookup("FILING_ANALYST_ANALYSIS_TYPE") {
            Some(v) => v.trim().parse().map_err(|_| {
                anyhow!("FILING_ANALYST_ANALYSIS_TYPE is not a known analysis type: '{}'", v)
            })?,
            None => default.analysis_type,
        };

        Ok(Self {
            progress_timeout,
            max_section_chars,
            fallback_section_label,
            analysis_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = OrchestratorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.progress_timeout, Duration::from_secs(5));
        assert_eq!(config.max_section_chars, None);
        assert_eq!(config.fallback_section_label, DEFAULT_FALLBACK_SECTION);
        assert_eq!(config.analysis_type, AnalysisType::FilingAnalysis);
    }

    #[test]
    fn test_overrides() {
        let config = OrchestratorConfig::from_lookup(lookup(&[
            ("FILING_ANALYST_PROGRESS_TIMEOUT_MS", "250"),
            ("FILING_ANALYST_MAX_SECTION_CHARS", "20000"),
            ("FILING_ANALYST_FALLBACK_SECTION", "document"),
            ("FILING_ANALYST_ANALYSIS_TYPE", "historical"),
        ]))
        .unwrap();
        assert_eq!(config.progress_timeout, Duration::from_millis(250));
        assert_eq!(config.max_section_chars, Some(20000));
        assert_eq!(config.fallback_section_label, "document");
        assert_eq!(config.analysis_type, AnalysisType::Historical);
    }

    #[test]
    fn test_malformed_values_name_the_variable() {
        let err = OrchestratorConfig::from_lookup(lookup(&[(
            "FILING_ANALYST_PROGRESS_TIMEOUT_MS",
            "soon",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("FILING_ANALYST_PROGRESS_TIMEOUT_MS"));
    }
}
