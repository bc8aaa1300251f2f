pub mod analysis;
pub mod company;
pub mod config;
pub mod filing;
pub mod status;
pub mod types;

pub use analysis::{Analysis, AnalysisType, ProcessingInfo};
pub use company::Company;
pub use config::OrchestratorConfig;
pub use filing::{Filing, FilingParts};
pub use status::ProcessingStatus;
pub use types::{AnalysisRequest, DocumentSource, FilingData, LlmProvider, LlmResponse, Sections};
