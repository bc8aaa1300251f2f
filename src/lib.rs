pub mod core;
pub mod edgar;
pub mod error;
pub mod orchestrator;
pub mod storage;
pub mod utils;

// Re-exports
pub use crate::core::{Analysis, Company, Filing, OrchestratorConfig, ProcessingStatus};
pub use edgar::{AccessionNumber, FilingType, Ticker};
pub use error::{DocumentSourceError, DomainError, OrchestrationError};
pub use orchestrator::{AnalysisOrchestrator, AnalyzeFilingCommand, ProgressCallback};
pub use utils::progress::ProgressTracker;
