use crate::build_plan::BuildPlan;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDiag {
    pub cov_build_version: Option<String>,
    pub tar_version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Changed file that triggered the scan; the build still covers the whole tree.
    pub trigger_file: String,
    pub project_dir: PathBuf,
    pub work_dir: PathBuf,
    pub plan: BuildPlan,
    /// Name of the intermediate directory, relative to `work_dir`.
    pub intermediate_dir: String,
    pub archive_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ok: bool,
    pub archive: Option<PathBuf>,
    /// Tail of the analyzer's own summary output.
    pub summary: Vec<String>,
    pub warnings: Vec<String>,
}
