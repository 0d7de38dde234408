/*!
`list.rs`

`llm-tools-mcp list [--family support|clarify] [--json]`

Enumerates the registered operations without starting the server. The header shows
which backend each family currently resolves to (filesystem probe, nothing spawned).

JSON Output Shape:
{
  "status": "ok",
  "count": 25,
  "backends": { "support": "/usr/local/bin/llm-support (native)", "clarify": null },
  "operations": [
    { "name": "llm_support_tree", "operation": "tree", "family": "support",
      "params": ["path", "depth", "sizes", "no_gitignore"], "description": "..." }
  ]
}
*/

use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, emoji, table};
use crate::cmd::shared::print_json;
use crate::dispatch::Dispatcher;
use crate::dispatch::registry::{Family, OperationSpec, Registry};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list operations of this family
    #[arg(long, value_enum)]
    pub family: Option<Family>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_list(args: ListArgs, dispatcher: &Dispatcher) -> Result<()> {
    let ops = selected(dispatcher.registry(), args.family);
    let backends = backend_summary(dispatcher);

    if args.json {
        print_json(&list_json(&ops, &backends));
        return Ok(());
    }

    let style = StyleOptions::detect();
    let subtitle = backends
        .iter()
        .map(|(f, b)| format!("{f}: {}", b.as_deref().unwrap_or("unavailable")))
        .collect::<Vec<_>>()
        .join(" • ");
    println!(
        "{}",
        box_header(
            format!("{} Operations ({})", emoji("list", &style), ops.len()),
            Some(subtitle),
            &style,
        )
    );

    if ops.is_empty() {
        println!("{}", color(Role::Dim, "(none)", &style));
        return Ok(());
    }
    println!("{}", table(&["#", "TOOL", "PARAMS", "DESCRIPTION"], &rows(&ops), TableOpts::default(), &style));
    println!(
        "\n{} {}",
        emoji("info", &style),
        color(
            Role::Dim,
            "Use `llm-tools-mcp get <name>` for parameters and the backend command shape",
            &style
        )
    );
    Ok(())
}

fn selected(registry: &Registry, family: Option<Family>) -> Vec<&OperationSpec> {
    registry
        .iter()
        .filter(|op| family.is_none_or(|f| op.family == f))
        .collect()
}

/// Probe result per family, `None` when nothing is installed.
fn backend_summary(dispatcher: &Dispatcher) -> Vec<(Family, Option<String>)> {
    Family::all()
        .iter()
        .map(|f| (*f, dispatcher.resolver().probe(*f).ok().map(|c| c.to_string())))
        .collect()
}

fn list_json(ops: &[&OperationSpec], backends: &[(Family, Option<String>)]) -> Value {
    let backends: serde_json::Map<String, Value> = backends
        .iter()
        .map(|(f, b)| (f.to_string(), json!(b)))
        .collect();
    let items: Vec<Value> = ops
        .iter()
        .map(|op| {
            json!({
                "name": op.tool_name(),
                "operation": op.name,
                "family": op.family.to_string(),
                "params": op.params.iter().map(|p| p.name).collect::<Vec<_>>(),
                "description": op.description,
            })
        })
        .collect();
    json!({
        "status": "ok",
        "count": items.len(),
        "backends": backends,
        "operations": items,
    })
}

fn rows(ops: &[&OperationSpec]) -> Vec<Vec<String>> {
    ops.iter()
        .enumerate()
        .map(|(idx, op)| {
            let params = if op.params.is_empty() {
                "-".to_string()
            } else {
                op.params
                    .iter()
                    .map(|p| {
                        let mark = if p.required { "*" } else { "" };
                        format!("{}{mark}:{}", p.name, p.kind.as_str())
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            vec![
                (idx + 1).to_string(),
                op.tool_name(),
                params,
                op.description.to_string(),
            ]
        })
        .collect()
}
