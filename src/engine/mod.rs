pub mod coverity;
pub mod types;

use anyhow::Result;

pub use types::{AnalysisRequest, AnalysisResult, ToolDiag};

/// Runs a project build under static-analysis instrumentation and packs the
/// result for submission.
pub trait BuildAnalyzer {
    fn doctor(&self) -> Result<ToolDiag>;
    fn run(&self, req: &AnalysisRequest) -> Result<AnalysisResult>;
}
