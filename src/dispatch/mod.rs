//! Dispatch core: registry lookup, argument compilation, backend resolution,
//! process execution and result normalization.
//!
//! Flow for one call:
//!   lookup -> compile_args -> resolve -> execute (-> fallback on "not found") -> normalize
//!
//! `Dispatcher::dispatch` never fails; every error becomes an `ERROR: [Kind] ...` payload.

pub mod catalog;
pub mod compiler;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod registry;
pub mod resolver;

use tokio::sync::Semaphore;

use crate::config::DispatchConfig;
use compiler::{ArgumentMap, CompiledCommand, compile_args};
use error::{DispatchError, DispatchResult};
use executor::{ExecutionResult, Launch, execute};
use normalize::Normalized;
use registry::{OperationSpec, Registry};
use resolver::{BackendChoice, BackendKind, BackendResolver};

pub struct Dispatcher {
    registry: Registry,
    resolver: BackendResolver,
    config: DispatchConfig,
    permits: Option<Semaphore>,
}

impl Dispatcher {
    /// Dispatcher over the built-in catalog.
    pub fn new(config: DispatchConfig) -> DispatchResult<Self> {
        Ok(Self::with_registry(config, catalog::builtin_registry()?))
    }

    pub fn with_registry(config: DispatchConfig, registry: Registry) -> Self {
        Dispatcher {
            resolver: BackendResolver::new(&config),
            permits: config.max_concurrent_calls.map(Semaphore::new),
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn resolver(&self) -> &BackendResolver {
        &self.resolver
    }

    /// Run one call end to end and normalize the outcome.
    pub async fn dispatch(&self, name: &str, args: &ArgumentMap) -> Normalized {
        match self.try_dispatch(name, args).await {
            Ok(result) => normalize::success(&result),
            Err(err) => {
                match err {
                    DispatchError::LaunchFailure { .. } => log::warn!("{name}: {err}"),
                    _ => log::debug!("{name}: {err}"),
                }
                normalize::failure(&err)
            }
        }
    }

    /// Resolve and compile without executing.
    pub async fn compile(&self, name: &str, args: &ArgumentMap) -> DispatchResult<CompiledCommand> {
        let spec = self.registry.lookup(name)?;
        let tokens = compile_args(spec, args)?;
        let choice = self.resolver.resolve(spec.family).await?;
        Ok(CompiledCommand::new(&choice.path, tokens))
    }

    async fn try_dispatch(
        &self,
        name: &str,
        args: &ArgumentMap,
    ) -> DispatchResult<ExecutionResult> {
        let spec = self.registry.lookup(name)?;
        // Compile before resolving: bad arguments never reach the filesystem or a process.
        let tokens = compile_args(spec, args)?;
        let choice = self.resolver.resolve(spec.family).await?;

        let _permit = match &self.permits {
            Some(sem) => sem.acquire().await.ok(),
            None => None,
        };

        match self.run(spec, &choice, tokens.clone()).await {
            Err(err) if err.is_not_found() && choice.kind == BackendKind::Native => {
                let Some(next) = self.resolver.fallback_after(spec.family, &choice) else {
                    return Err(err);
                };
                log::warn!(
                    "{} backend vanished ({}), retrying with {next}",
                    spec.family,
                    choice.path.display()
                );
                self.run(spec, &next, tokens).await
            }
            other => other,
        }
    }

    async fn run(
        &self,
        spec: &OperationSpec,
        choice: &BackendChoice,
        tokens: Vec<String>,
    ) -> DispatchResult<ExecutionResult> {
        let command = CompiledCommand::new(&choice.path, tokens);
        let timeout = self.config.timeout_for(spec.family);
        log::debug!("{} -> {}", spec.tool_name(), command.display());

        let launch = Launch {
            interpreter: choice.interpreter.as_deref(),
        };
        let result = execute(&command, launch, timeout).await?;
        log::debug!(
            "{} exited with {:?} in {} ms",
            spec.name,
            result.exit_code,
            result.elapsed.as_millis()
        );
        Ok(result)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use serde_json::{Value, json};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn args(v: Value) -> ArgumentMap {
        v.as_object().cloned().unwrap()
    }

    fn write_script(path: &Path, body: &str) {
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Backends live in a temp dir; scripts run through `sh` instead of python.
    fn config_in(dir: &TempDir) -> DispatchConfig {
        DispatchConfig {
            support_native: dir.path().join("llm-support"),
            support_script: dir.path().join("llm-support.py"),
            clarify_script: dir.path().join("llm-clarification.py"),
            interpreter: Some("sh".into()),
            ..DispatchConfig::default()
        }
    }

    const ECHO_ARGS: &str = "for a in \"$@\"; do printf '[%s]' \"$a\"; done; echo";

    #[tokio::test]
    async fn grep_reaches_native_backend_with_compiled_tokens() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        write_script(&cfg.support_native, ECHO_ARGS);
        let d = Dispatcher::new(cfg).unwrap();

        let out = d
            .dispatch(
                "llm_support_grep",
                &args(json!({"pattern": "TODO", "paths": ["src"], "ignore_case": true})),
            )
            .await;
        assert!(!out.is_error);
        assert_eq!(out.text, "[grep][TODO][src][-i]\n");
    }

    #[tokio::test]
    async fn fallback_script_used_when_native_absent() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        std::fs::write(&cfg.support_script, format!("{ECHO_ARGS}\n")).unwrap();
        let d = Dispatcher::new(cfg).unwrap();

        let out = d
            .dispatch("repo_root", &args(json!({"validate": true})))
            .await;
        assert_eq!(out.text, "[repo-root][--validate]\n");
    }

    #[tokio::test]
    async fn no_backend_available_never_spawns() {
        let dir = TempDir::new().unwrap();
        let d = Dispatcher::new(config_in(&dir)).unwrap();
        let out = d.dispatch("tree", &ArgumentMap::new()).await;
        assert!(out.is_error);
        assert!(out.text.starts_with("ERROR: [NoBackendAvailable]"));

        let out = d
            .dispatch("llm_clarify_init", &args(json!({"output": "t.yaml"})))
            .await;
        assert!(out.text.starts_with("ERROR: [BackendMissing]"));
    }

    #[tokio::test]
    async fn invalid_arguments_stop_before_execution() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        let marker = dir.path().join("ran");
        write_script(&cfg.support_native, &format!("touch {}", marker.display()));
        let d = Dispatcher::new(cfg).unwrap();

        let out = d.dispatch("grep", &args(json!({"paths": ["."]}))).await;
        assert!(out.text.starts_with("ERROR: [InvalidArgument]"));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn unknown_operation_payload() {
        let dir = TempDir::new().unwrap();
        let d = Dispatcher::new(config_in(&dir)).unwrap();
        let out = d.dispatch("llm_support_teleport", &ArgumentMap::new()).await;
        assert_eq!(
            out.text,
            "ERROR: [UnknownOperation] unknown operation 'llm_support_teleport'"
        );
    }

    #[tokio::test]
    async fn hanging_backend_hits_family_budget() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config_in(&dir);
        cfg.support_timeout = Duration::from_secs(1);
        cfg.clarify_timeout = Duration::from_secs(2);
        write_script(&cfg.support_native, "sleep 30");
        std::fs::write(&cfg.clarify_script, "sleep 30\n").unwrap();
        let d = Dispatcher::new(cfg).unwrap();

        let started = Instant::now();
        let out = d.dispatch("detect", &ArgumentMap::new()).await;
        assert_eq!(
            out.text,
            "ERROR: [ExecutionTimeout] command timed out after 1 seconds"
        );
        let out = d
            .dispatch("list", &args(json!({"tracking_file": "t.yaml"})))
            .await;
        assert_eq!(
            out.text,
            "ERROR: [ExecutionTimeout] command timed out after 2 seconds"
        );
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn nonzero_exit_forwarded_as_output() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        write_script(&cfg.support_native, "echo 'EXISTS: false'\nexit 1");
        let d = Dispatcher::new(cfg).unwrap();
        let out = d
            .dispatch("multiexists", &args(json!({"paths": ["nope"]})))
            .await;
        assert!(!out.is_error);
        assert_eq!(out.text, "EXISTS: false\n\n\nEXIT_CODE: 1");
    }

    #[tokio::test]
    async fn vanished_native_retries_fallback() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        write_script(&cfg.support_native, "echo native");
        std::fs::write(&cfg.support_script, "echo fallback\n").unwrap();
        let native = cfg.support_native.clone();
        let d = Dispatcher::new(cfg).unwrap();

        assert_eq!(d.dispatch("detect", &ArgumentMap::new()).await.text, "native\n");
        std::fs::remove_file(&native).unwrap();
        assert_eq!(d.dispatch("detect", &ArgumentMap::new()).await.text, "fallback\n");
    }

    #[tokio::test]
    async fn compile_resolves_program_path() {
        let dir = TempDir::new().unwrap();
        let cfg = config_in(&dir);
        write_script(&cfg.support_native, "true");
        let native = cfg.support_native.clone();
        let d = Dispatcher::new(cfg).unwrap();
        let cmd = d
            .compile("repo_root", &args(json!({"validate": true})))
            .await
            .unwrap();
        assert_eq!(cmd.program(), native.to_string_lossy());
        assert_eq!(cmd.args(), &["repo-root".to_string(), "--validate".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_calls_complete_independently() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config_in(&dir);
        cfg.max_concurrent_calls = Some(2);
        write_script(&cfg.support_native, "sleep 0.2; echo \"$1\"");
        let d = Dispatcher::new(cfg).unwrap();
        let none = ArgumentMap::new();
        let (a, b, c, e) = tokio::join!(
            d.dispatch("tree", &none),
            d.dispatch("detect", &none),
            d.dispatch("discover_tests", &none),
            d.dispatch("partition_work", &none),
        );
        assert_eq!(a.text, "tree\n");
        assert_eq!(b.text, "detect\n");
        assert_eq!(c.text, "discover-tests\n");
        assert_eq!(e.text, "partition-work\n");
    }
}
