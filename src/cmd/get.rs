/*!
`get.rs`

`llm-tools-mcp get <NAME> [--json]`

Detailed view of one operation: parameters (kind, required, aliases, allowed values,
where each lands on the backend command line), the exposed input schema and the
backend the family currently resolves to. NAME may be the tool name
(`llm_support_grep`) or the bare operation name (`grep`).

JSON Output Shape:
{
  "status": "ok",
  "name": "llm_support_grep",
  "operation": "grep",
  "family": "support",
  "description": "...",
  "command": "<backend> grep <pattern> <paths...> [-i] [-n] [-l]",
  "backend": "/usr/local/bin/llm-support (native)" | null,
  "parameters": [
    {"name":"pattern","type":"string","required":true,"slot":"<pattern>","aliases":["regex","search"],"choices":[],"description":"..."}
  ],
  "input_schema": { ... }
}
*/

use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, emoji, table};
use crate::cmd::shared::{output_error, print_json};
use crate::dispatch::Dispatcher;
use crate::dispatch::normalize;
use crate::dispatch::registry::{OperationSpec, ParamKind, ParamSpec, Slot};

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Tool name or bare operation name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_get(args: GetArgs, dispatcher: &Dispatcher) -> Result<()> {
    let spec = match dispatcher.registry().lookup(args.name.trim()) {
        Ok(spec) => spec,
        Err(e) => {
            return output_error(args.json, "Unknown operation", &normalize::failure(&e).text);
        }
    };
    let backend = dispatcher
        .resolver()
        .probe(spec.family)
        .map(|c| c.to_string())
        .ok();

    if args.json {
        print_json(&detail_json(spec, backend.as_deref()));
        return Ok(());
    }

    let style = StyleOptions::detect();
    println!(
        "{}",
        box_header(
            format!("{} {}", emoji("tool", &style), spec.tool_name()),
            Some(format!("family={}", spec.family)),
            &style,
        )
    );
    println!("{}\n", spec.description);
    println!(
        "{} {}",
        color(Role::Accent, "Command:", &style),
        command_shape(spec)
    );
    match &backend {
        Some(b) => println!("{} {b}", color(Role::Accent, "Backend:", &style)),
        None => println!(
            "{} {}",
            color(Role::Accent, "Backend:", &style),
            color(Role::Warning, "unavailable", &style)
        ),
    }
    println!();

    if spec.params.is_empty() {
        println!(
            "{}",
            color(
                Role::Dim,
                format!("{} No parameters", emoji("info", &style)),
                &style
            )
        );
        return Ok(());
    }
    let rows: Vec<Vec<String>> = spec
        .params
        .iter()
        .map(|p| {
            let mut desc = p.description.to_string();
            if !p.choices.is_empty() {
                desc.push_str(&format!(" [{}]", p.choices.join("|")));
            }
            if !p.aliases.is_empty() {
                desc.push_str(&format!(" (alias: {})", p.aliases.join(", ")));
            }
            vec![
                p.name.to_string(),
                p.kind.as_str().to_string(),
                if p.required { "yes" } else { "" }.to_string(),
                slot_label(p),
                desc,
            ]
        })
        .collect();
    println!(
        "{}",
        table(
            &["NAME", "TYPE", "REQ", "SLOT", "DESCRIPTION"],
            &rows,
            TableOpts::default(),
            &style
        )
    );
    Ok(())
}

fn detail_json(spec: &OperationSpec, backend: Option<&str>) -> Value {
    let params: Vec<Value> = spec
        .params
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "type": p.kind.as_str(),
                "required": p.required,
                "slot": slot_label(p),
                "aliases": p.aliases,
                "choices": p.choices,
                "description": p.description,
            })
        })
        .collect();
    json!({
        "status": "ok",
        "name": spec.tool_name(),
        "operation": spec.name,
        "family": spec.family.to_string(),
        "description": spec.description,
        "command": command_shape(spec),
        "backend": backend,
        "parameters": params,
        "input_schema": Value::Object(spec.input_schema()),
    })
}

/// How one parameter appears on the backend command line.
fn slot_label(p: &ParamSpec) -> String {
    let value = match p.kind {
        ParamKind::StringList => format!("<{}...>", p.name),
        _ => format!("<{}>", p.name),
    };
    match p.slot {
        Slot::Positional => value,
        Slot::Flag(flag) => format!("{flag} {value}"),
        Slot::Switch(flag) => flag.to_string(),
        Slot::Pairs(flag) => format!("{flag} key=value..."),
    }
}

/// Usage-style rendering of the compiled command, optional slots bracketed.
fn command_shape(spec: &OperationSpec) -> String {
    let mut parts = vec!["<backend>".to_string()];
    parts.extend(spec.subcommand.iter().map(|s| s.to_string()));
    for p in &spec.params {
        let label = slot_label(p);
        parts.push(if p.required { label } else { format!("[{label}]") });
    }
    parts.extend(spec.trailing.iter().map(|s| s.to_string()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::catalog::builtin_registry;

    #[test]
    fn grep_command_shape() {
        let reg = builtin_registry().unwrap();
        let grep = reg.lookup("llm_support_grep").unwrap();
        assert_eq!(
            command_shape(grep),
            "<backend> grep <pattern> <paths...> [-i] [-n] [-l]"
        );
    }

    #[test]
    fn detail_json_carries_schema_and_aliases() {
        let reg = builtin_registry().unwrap();
        let grep = reg.lookup("grep").unwrap();
        let v = detail_json(grep, None);
        assert_eq!(v["name"], "llm_support_grep");
        assert_eq!(v["backend"], Value::Null);
        assert_eq!(v["parameters"][0]["aliases"], json!(["regex", "search"]));
        assert_eq!(v["parameters"][0]["slot"], "<pattern>");
        assert_eq!(v["input_schema"]["required"], json!(["pattern", "paths"]));
    }

    #[test]
    fn flag_slots_show_flag_and_value() {
        let reg = builtin_registry().unwrap();
        let tree = reg.lookup("tree").unwrap();
        let labels: Vec<String> = tree.params.iter().map(slot_label).collect();
        assert_eq!(labels[0], "--path <path>");
        assert_eq!(labels[2], "--sizes");
    }

    #[test]
    fn unknown_name_reports_error_kind() {
        let d = Dispatcher::new(crate::config::DispatchConfig::default()).unwrap();
        let args = GetArgs {
            name: "llm_clarify_nope".into(),
            json: true,
        };
        let err = execute_get(args, &d).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("ERROR: [UnknownOperation] unknown operation 'llm_clarify_nope'")
        );
    }
}
