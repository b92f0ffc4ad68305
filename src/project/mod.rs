mod artifact;
mod compiler;
mod detector;
mod foundry;
mod hardhat;

pub use artifact::Artifact;
pub use compiler::compile;
pub use detector::detect;

use std::path::{Path, PathBuf};

use eyre::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    Foundry,
    Hardhat,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Foundry => write!(f, "Foundry"),
            ProjectType::Hardhat => write!(f, "Hardhat"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    pub project_type: ProjectType,
    pub root: PathBuf,
    pub name: String,
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
}

impl Project {
    pub fn new_foundry(path: &Path) -> Result<Self> {
        foundry::load_project(path)
    }

    pub fn new_hardhat(path: &Path) -> Result<Self> {
        hardhat::load_project(path)
    }

    /// Source path as the toolchain names it, relative to the project root
    pub fn relative_source(&self, source: &Path) -> PathBuf {
        source
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source.strip_prefix("./").unwrap_or(source).to_path_buf())
    }

    /// `<source>:<Contract>` identifier used in compiler output
    pub fn fully_qualified_name(&self, source: &Path, contract: &str) -> String {
        format!("{}:{}", self.relative_source(source).display(), contract)
    }

    /// Where the compiled artifact of `contract` from `source` is written
    pub fn artifact_path(&self, source: &Path, contract: &str) -> PathBuf {
        let file_name = format!("{}.json", contract);
        match self.project_type {
            // out/<File>.sol/<Contract>.json
            ProjectType::Foundry => {
                let source_file = source
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| self.relative_source(source));
                self.out_dir.join(source_file).join(file_name)
            }
            // artifacts/<relative source path>/<Contract>.json
            ProjectType::Hardhat => self
                .out_dir
                .join(self.relative_source(source))
                .join(file_name),
        }
    }

    /// Resolve a user supplied source path against the project root, then the
    /// sources directory, so `Counter.sol` finds `src/Counter.sol`
    pub fn resolve_source(&self, source: &Path) -> PathBuf {
        if source.is_absolute() {
            return source.to_path_buf();
        }

        let in_root = self.root.join(source);
        if in_root.exists() {
            return in_root;
        }

        let in_src = self.src_dir.join(source);
        if in_src.exists() {
            return in_src;
        }

        // Relative to the working directory as a last resort
        source.canonicalize().unwrap_or(in_root)
    }
}
