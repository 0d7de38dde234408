//! Backend resolution: which executable answers a family.
//!
//! Candidates are probed in preference order (native first). The first existing one wins.
//! In memoized mode the winner is stored in a compute-once cell per family; failures are
//! not stored, so a backend installed after a failed call is picked up on the next one.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;

use super::error::{DispatchError, DispatchResult};
use super::registry::Family;
use crate::config::{DispatchConfig, ResolutionMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Preferred compiled executable.
    Native,
    /// Script standing in for a missing native executable.
    Fallback,
    /// Sole backend of a single-implementation family.
    Script,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Native => "native",
            BackendKind::Fallback => "fallback",
            BackendKind::Script => "script",
        };
        f.write_str(s)
    }
}

/// Resolved executable location plus the implementation family that answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendChoice {
    pub path: PathBuf,
    pub kind: BackendKind,
    /// Launcher for script backends (`python3`); the script path stays the first token.
    pub interpreter: Option<String>,
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.interpreter {
            Some(i) => write!(f, "{} ({} via {})", self.path.display(), self.kind, i),
            None => write!(f, "{} ({})", self.path.display(), self.kind),
        }
    }
}

#[derive(Debug)]
pub struct BackendResolver {
    support: Vec<BackendChoice>,
    clarify: Vec<BackendChoice>,
    mode: ResolutionMode,
    support_cell: OnceCell<BackendChoice>,
    clarify_cell: OnceCell<BackendChoice>,
}

impl BackendResolver {
    pub fn new(config: &DispatchConfig) -> Self {
        let script = |path: &Path, kind| BackendChoice {
            path: path.to_path_buf(),
            kind,
            interpreter: config.interpreter.clone(),
        };
        BackendResolver {
            support: vec![
                BackendChoice {
                    path: config.support_native.clone(),
                    kind: BackendKind::Native,
                    interpreter: None,
                },
                script(&config.support_script, BackendKind::Fallback),
            ],
            clarify: vec![script(&config.clarify_script, BackendKind::Script)],
            mode: config.resolution,
            support_cell: OnceCell::new(),
            clarify_cell: OnceCell::new(),
        }
    }

    fn candidates(&self, family: Family) -> &[BackendChoice] {
        match family {
            Family::Support => &self.support,
            Family::Clarify => &self.clarify,
        }
    }

    pub async fn resolve(&self, family: Family) -> DispatchResult<BackendChoice> {
        if self.mode == ResolutionMode::PerCall {
            return self.probe(family);
        }
        let cell = match family {
            Family::Support => &self.support_cell,
            Family::Clarify => &self.clarify_cell,
        };
        let choice = cell
            .get_or_try_init(|| async {
                let choice = self.probe(family)?;
                log::info!("{family} backend resolved: {choice}");
                Ok::<_, DispatchError>(choice)
            })
            .await?;
        Ok(choice.clone())
    }

    /// Filesystem probe without touching the memo.
    pub fn probe(&self, family: Family) -> DispatchResult<BackendChoice> {
        let candidates = self.candidates(family);
        if let Some(found) = candidates.iter().find(|c| c.path.exists()) {
            return Ok(found.clone());
        }
        match candidates {
            [only] => Err(DispatchError::BackendMissing {
                family,
                path: only.path.display().to_string(),
            }),
            _ => Err(DispatchError::NoBackendAvailable {
                family,
                native: candidates[0].path.display().to_string(),
                fallback: candidates[1..]
                    .iter()
                    .map(|c| c.path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Next existing candidate after `failed`, used when launching `failed` reported
    /// "not found" (the file vanished between probe and spawn).
    pub fn fallback_after(&self, family: Family, failed: &BackendChoice) -> Option<BackendChoice> {
        self.candidates(family)
            .iter()
            .skip_while(|c| *c != failed)
            .skip(1)
            .find(|c| c.path.exists())
            .cloned()
    }
}
