//! Dispatcher configuration.
//!
//! Layering, lowest precedence first: built-in defaults, config file (JSON or YAML),
//! environment variables, CLI flags (applied by `main`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::dispatch::registry::Family;

/// Fixed install location of the native project-analysis binary.
pub const DEFAULT_SUPPORT_NATIVE: &str = "/usr/local/bin/llm-support";
pub const SUPPORT_SCRIPT_NAME: &str = "llm-support.py";
pub const CLARIFY_SCRIPT_NAME: &str = "llm-clarification.py";
pub const DEFAULT_INTERPRETER: &str = "python3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Resolve once per family and reuse for the process lifetime.
    Memoized,
    /// Probe the filesystem on every call.
    PerCall,
}

impl ResolutionMode {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "memoized" | "once" => Ok(ResolutionMode::Memoized),
            "per_call" | "always" => Ok(ResolutionMode::PerCall),
            other => bail!("invalid resolution mode '{other}' (expected memoized|per_call)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub support_native: PathBuf,
    pub support_script: PathBuf,
    pub clarify_script: PathBuf,
    /// Launcher for script backends; `None` runs the script directly (shebang).
    pub interpreter: Option<String>,
    pub support_timeout: Duration,
    pub clarify_timeout: Duration,
    pub resolution: ResolutionMode,
    /// Upper bound on concurrently running backend processes; `None` is unbounded.
    pub max_concurrent_calls: Option<usize>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let dir = exe_dir();
        DispatchConfig {
            support_native: PathBuf::from(DEFAULT_SUPPORT_NATIVE),
            support_script: dir.join(SUPPORT_SCRIPT_NAME),
            clarify_script: dir.join(CLARIFY_SCRIPT_NAME),
            interpreter: Some(DEFAULT_INTERPRETER.to_string()),
            support_timeout: Family::Support.default_timeout(),
            clarify_timeout: Family::Clarify.default_timeout(),
            resolution: ResolutionMode::Memoized,
            max_concurrent_calls: None,
        }
    }
}

/// Scripts ship next to the dispatcher executable.
fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// On-disk shape. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub support_native: Option<PathBuf>,
    pub support_script: Option<PathBuf>,
    pub clarify_script: Option<PathBuf>,
    pub interpreter: Option<String>,
    pub support_timeout_secs: Option<u64>,
    pub clarify_timeout_secs: Option<u64>,
    pub resolution: Option<ResolutionMode>,
    pub max_concurrent_calls: Option<usize>,
}

impl DispatchConfig {
    pub fn timeout_for(&self, family: Family) -> Duration {
        match family {
            Family::Support => self.support_timeout,
            Family::Clarify => self.clarify_timeout,
        }
    }

    /// Defaults, then `path` (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = DispatchConfig::default();
        if let Some(p) = path {
            cfg.apply_file(ConfigFile::read(p)?);
        }
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.support_native {
            self.support_native = v;
        }
        if let Some(v) = file.support_script {
            self.support_script = v;
        }
        if let Some(v) = file.clarify_script {
            self.clarify_script = v;
        }
        if let Some(v) = file.interpreter {
            self.set_interpreter(&v);
        }
        if let Some(v) = file.support_timeout_secs {
            self.support_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.clarify_timeout_secs {
            self.clarify_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.resolution {
            self.resolution = v;
        }
        if file.max_concurrent_calls.is_some() {
            self.max_concurrent_calls = file.max_concurrent_calls.filter(|n| *n > 0);
        }
    }

    /// `get` abstracts the environment so tests never mutate process state.
    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("LLM_SUPPORT_BIN") {
            self.support_native = PathBuf::from(v);
        }
        if let Some(v) = var("LLM_SUPPORT_SCRIPT") {
            self.support_script = PathBuf::from(v);
        }
        if let Some(v) = var("LLM_CLARIFICATION_SCRIPT") {
            self.clarify_script = PathBuf::from(v);
        }
        if let Some(v) = get("LLM_TOOLS_PYTHON") {
            self.set_interpreter(&v);
        }
        if let Some(v) = var("LLM_SUPPORT_TIMEOUT") {
            self.support_timeout = parse_secs("LLM_SUPPORT_TIMEOUT", &v)?;
        }
        if let Some(v) = var("LLM_CLARIFY_TIMEOUT") {
            self.clarify_timeout = parse_secs("LLM_CLARIFY_TIMEOUT", &v)?;
        }
        if let Some(v) = var("LLM_TOOLS_RESOLUTION") {
            self.resolution = ResolutionMode::parse(&v)?;
        }
        if let Some(v) = var("LLM_TOOLS_MAX_CONCURRENT") {
            let n: usize = v
                .trim()
                .parse()
                .with_context(|| format!("LLM_TOOLS_MAX_CONCURRENT: not a number: '{v}'"))?;
            self.max_concurrent_calls = (n > 0).then_some(n);
        }
        Ok(())
    }

    /// Empty string disables the interpreter (scripts executed directly).
    pub fn set_interpreter(&mut self, raw: &str) {
        let trimmed = raw.trim();
        self.interpreter = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key}: expected whole seconds, got '{raw}'"))?;
    if secs == 0 {
        bail!("{key}: timeout must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

impl ConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let lower = path.to_string_lossy().to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw).context("failed to parse YAML config file")
        } else {
            serde_json::from_str(&raw).context("failed to parse JSON config file")
        }
    }
}
