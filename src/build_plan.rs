use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildSystem {
    Meson,
    CMake,
    Make,
    Custom,
}

/// Commands for one instrumented build. Only `build` runs under the analyzer;
/// `configure` prepares the tree beforehand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub system: BuildSystem,
    pub configure: Option<Vec<String>>,
    pub build: Vec<String>,
}

impl BuildPlan {
    /// `None` means the project's build configuration is not supported.
    /// Meson and CMake configure out of tree into `build_dir`.
    pub fn detect(cfg: &Config, project_dir: &Path, build_dir: &Path) -> Option<BuildPlan> {
        if !cfg.scan.build_command.is_empty() {
            return Some(BuildPlan {
                system: BuildSystem::Custom,
                configure: None,
                build: cfg.scan.build_command.clone(),
            });
        }

        let out = build_dir.display().to_string();
        if project_dir.join("meson.build").is_file() {
            let mut setup = args(&["meson", "setup"]);
            // A second `meson setup` on a configured dir fails without this.
            if build_dir.join("meson-private").is_dir() {
                setup.push("--reconfigure".into());
            }
            setup.push(out.clone());
            Some(BuildPlan {
                system: BuildSystem::Meson,
                configure: Some(setup),
                build: args(&["ninja", "-C", &out]),
            })
        } else if project_dir.join("CMakeLists.txt").is_file() {
            Some(BuildPlan {
                system: BuildSystem::CMake,
                configure: Some(args(&["cmake", "-S", ".", "-B", &out])),
                build: args(&["cmake", "--build", &out]),
            })
        } else if project_dir.join("Makefile").is_file() {
            Some(BuildPlan {
                system: BuildSystem::Make,
                configure: None,
                build: args(&["make"]),
            })
        } else {
            None
        }
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}
