use std::path::Path;

use eyre::{Result, eyre};

use super::{Project, foundry, hardhat};

/// Detect the project type based on configuration files present in the directory
pub fn detect(path: &Path) -> Result<Project> {
    let foundry_config = path.join("foundry.toml");
    let hardhat_config_js = path.join("hardhat.config.js");
    let hardhat_config_ts = path.join("hardhat.config.ts");

    if foundry_config.exists() {
        tracing::info!("Detected Foundry project at {:?}", path);
        return foundry::load_project(path);
    }

    if hardhat_config_js.exists() || hardhat_config_ts.exists() {
        tracing::info!("Detected Hardhat project at {:?}", path);
        return hardhat::load_project(path);
    }

    Err(eyre!(
        "No Foundry or Hardhat project detected at {:?}\n\
         Expected: foundry.toml, hardhat.config.js, or hardhat.config.ts",
        path
    ))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::project::ProjectType;

    #[test]
    fn test_detects_hardhat() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hardhat.config.ts"), "export default {};").unwrap();

        let project = detect(dir.path()).unwrap();
        assert_eq!(project.project_type, ProjectType::Hardhat);
        assert_eq!(project.out_dir, dir.path().join("artifacts"));
    }

    #[test]
    fn test_prefers_foundry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hardhat.config.js"), "module.exports = {};").unwrap();
        fs::write(dir.path().join("foundry.toml"), "[profile.default]\n").unwrap();

        let project = detect(dir.path()).unwrap();
        assert_eq!(project.project_type, ProjectType::Foundry);
    }

    #[test]
    fn test_no_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(detect(dir.path()).is_err());
    }
}
