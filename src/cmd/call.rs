/*!
`call.rs`

`llm-tools-mcp call <NAME> [--param KEY=VALUE ...] [--param-file F] [--dry-run] [--json]`

Runs one operation through the same dispatcher the MCP server uses, so the output is
exactly the text an MCP client would receive.

Parameters:
  --param KEY=VALUE              repeatable; coerced by the declared parameter kind
                                 (integer, boolean yes/no/true/false/1/0, comma list,
                                 `k=v;k2=v2` map)
  --param-file params.(json|yaml) typed values kept as-is; --param overrides entries

--dry-run resolves the backend and prints the compiled command without running it.

JSON Success Output:
{
  "status": "ok",
  "tool": "llm_support_grep",
  "elapsed_ms": 42,
  "arguments": { ... },
  "text": "<normalized output>"
}

JSON Error Output:
{ "status": "error", "error": "ERROR: [Kind] cause" }
*/

use std::time::Instant;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, emoji, table};
use crate::cmd::shared::{
    build_arguments, load_param_file, output_error, parse_param_pairs, print_json, value_preview,
};
use crate::dispatch::Dispatcher;
use crate::dispatch::compiler::ArgumentMap;
use crate::dispatch::normalize;
use crate::utils;

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool name or bare operation name
    #[arg(value_name = "NAME")]
    pub operation: String,

    /// Provide parameter (KEY=VALUE), repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from file (JSON or YAML). CLI --param overrides file entries
    #[arg(long = "param-file", value_name = "PATH")]
    pub param_file: Option<String>,

    /// Print the compiled backend command instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_call(args: CallArgs, dispatcher: &Dispatcher) -> Result<()> {
    let name = args.operation.trim();
    if name.is_empty() {
        return output_error(args.json, "Call Error", "operation name cannot be empty");
    }
    let spec = match dispatcher.registry().lookup(name) {
        Ok(spec) => spec,
        Err(e) => return output_error(args.json, "Call Error", &normalize::failure(&e).text),
    };

    let pairs = match parse_param_pairs(&args.params) {
        Ok(p) => p,
        Err(e) => return output_error(args.json, "Call Error", &e.to_string()),
    };
    let file = match &args.param_file {
        Some(path) => match load_param_file(path) {
            Ok(map) => map,
            Err(e) => return output_error(args.json, "Call Error", &format!("{e:#}")),
        },
        None => ArgumentMap::new(),
    };
    let arguments = build_arguments(spec, file, &pairs);

    let rt = utils::runtime()?;

    if args.dry_run {
        let command = match rt.block_on(dispatcher.compile(name, &arguments)) {
            Ok(c) => c,
            Err(e) => {
                return output_error(args.json, "Compile Error", &normalize::failure(&e).text);
            }
        };
        if args.json {
            print_json(&json!({
                "status": "ok",
                "tool": spec.tool_name(),
                "dry_run": true,
                "program": command.program(),
                "args": command.args(),
                "command": command.display(),
            }));
        } else {
            println!("{}", command.display());
        }
        return Ok(());
    }

    let started = Instant::now();
    let out = rt.block_on(dispatcher.dispatch(name, &arguments));
    let elapsed_ms = started.elapsed().as_millis();

    if out.is_error {
        return output_error(args.json, "Call Error", &out.text);
    }

    if args.json {
        print_json(&json!({
            "status": "ok",
            "tool": spec.tool_name(),
            "elapsed_ms": elapsed_ms,
            "arguments": arguments,
            "text": out.text,
        }));
        return Ok(());
    }

    let style = StyleOptions::detect();
    println!(
        "{}",
        box_header(
            format!("{} {}", emoji("success", &style), spec.tool_name()),
            Some(format!("family={} • {elapsed_ms}ms", spec.family)),
            &style,
        )
    );
    if !arguments.is_empty() {
        let rows: Vec<Vec<String>> = arguments
            .iter()
            .map(|(k, v)| vec![k.clone(), value_preview(v)])
            .collect();
        println!("{}", color(Role::Accent, "Arguments:", &style));
        println!(
            "{}\n",
            table(&["NAME", "VALUE"], &rows, TableOpts::default(), &style)
        );
    }
    print!("{}", out.text);
    if !out.text.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        cmd: TestSub,
    }

    #[derive(clap::Subcommand, Debug)]
    enum TestSub {
        Call(CallArgs),
    }

    #[test]
    fn clap_parses_repeated_params() {
        let cli = TestCli::try_parse_from([
            "t",
            "call",
            "llm_support_grep",
            "--param",
            "pattern=TODO",
            "--param",
            "paths=src,lib",
            "--dry-run",
        ])
        .unwrap();
        let TestSub::Call(a) = cli.cmd;
        assert_eq!(a.operation, "llm_support_grep");
        assert_eq!(a.params, vec!["pattern=TODO", "paths=src,lib"]);
        assert!(a.dry_run);
        assert!(!a.json);
    }

    #[cfg(unix)]
    #[test]
    fn dry_run_never_executes_backend() {
        use crate::config::DispatchConfig;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let native = dir.path().join("llm-support");
        let marker = dir.path().join("ran");
        std::fs::write(&native, format!("#!/bin/sh\ntouch {}\n", marker.display())).unwrap();
        std::fs::set_permissions(&native, std::fs::Permissions::from_mode(0o755)).unwrap();
        let cfg = DispatchConfig {
            support_native: native,
            ..DispatchConfig::default()
        };
        let d = Dispatcher::new(cfg).unwrap();

        let args = CallArgs {
            operation: "repo_root".into(),
            params: vec!["validate=yes".into()],
            param_file: None,
            dry_run: true,
            json: true,
        };
        execute_call(args, &d).unwrap();
        assert!(!marker.exists());
    }

    #[test]
    fn unknown_operation_fails() {
        let d = Dispatcher::new(crate::config::DispatchConfig::default()).unwrap();
        let args = CallArgs {
            operation: "llm_support_nope".into(),
            params: vec![],
            param_file: None,
            dry_run: false,
            json: true,
        };
        let err = execute_call(args, &d).unwrap_err();
        assert!(err.to_string().contains("[UnknownOperation]"));
    }
}
