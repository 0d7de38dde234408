/*!
shared.rs - helpers used by more than one subcommand.

  - parse_param_pairs: `--param KEY=VALUE` list -> ordered pairs
  - load_param_file: JSON / YAML object -> ArgumentMap (typed values kept)
  - build_arguments: file map + CLI pairs -> ArgumentMap, CLI wins
  - coerce_value: raw CLI string -> JSON value by declared ParamKind
  - print_json / value_preview
  - output_error: JSON or boxed human error, then bail
*/

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use crate::dispatch::compiler::ArgumentMap;
use crate::dispatch::registry::{OperationSpec, ParamKind};

/// Split repeated `KEY=VALUE` arguments. Only the first `=` separates.
pub fn parse_param_pairs(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|kv| {
            let Some((k, v)) = kv.split_once('=') else {
                bail!("invalid --param (expected KEY=VALUE): {kv}");
            };
            let key = k.trim();
            if key.is_empty() {
                bail!("invalid --param (empty key): {kv}");
            }
            Ok((key.to_string(), v.trim().to_string()))
        })
        .collect()
}

/// Read a parameter file. `.yaml`/`.yml` parse as YAML, anything else as JSON.
/// The root must be an object.
pub fn load_param_file(path: &str) -> Result<ArgumentMap> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read param file: {path}"))?;
    let lower = path.to_ascii_lowercase();
    let value: Value = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML param file")?;
        serde_json::to_value(yaml).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON param file")?
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("param file root must be an object"),
    }
}

/// Merge the file map with CLI pairs. CLI values are coerced by the declared kind of
/// the parameter they name (canonical name or alias) and stored under the canonical
/// name, replacing any file entry for that parameter under any of its names.
/// Undeclared keys stay strings under the key given.
pub fn build_arguments(
    spec: &OperationSpec,
    file: ArgumentMap,
    cli: &[(String, String)],
) -> ArgumentMap {
    let mut args = file;
    for (key, raw) in cli {
        let declared = spec
            .params
            .iter()
            .find(|p| p.name == key.as_str() || p.aliases.contains(&key.as_str()));
        match declared {
            Some(p) => {
                for alias in p.aliases {
                    args.remove(*alias);
                }
                args.insert(p.name.to_string(), coerce_value(raw, p.kind));
            }
            None => {
                args.insert(key.clone(), coerce_value(raw, ParamKind::String));
            }
        }
    }
    args
}

/// Best-effort coercion. A value that does not fit its kind is kept as a string so
/// the dispatcher reports the mismatch with the operation and parameter named.
pub fn coerce_value(raw: &str, kind: ParamKind) -> Value {
    match kind {
        ParamKind::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        ParamKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Value::Bool(true),
            "false" | "0" | "no" | "n" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        ParamKind::StringList => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        // `k=v;k2=v2`
        ParamKind::KeyValue => {
            let mut map = Map::new();
            for pair in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                let Some((k, v)) = pair.split_once('=') else {
                    return Value::String(raw.to_string());
                };
                map.insert(k.trim().to_string(), Value::String(v.trim().to_string()));
            }
            Value::Object(map)
        }
        ParamKind::String => Value::String(raw.to_string()),
    }
}

/// Compact single-line rendering of an argument value for tables.
pub fn value_preview(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_preview)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

pub fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

/// Report a command failure on stdout (JSON or boxed) and return it as an error so the
/// process exits non-zero.
pub fn output_error(json: bool, title: &str, msg: &str) -> Result<()> {
    if json {
        print_json(&serde_json::json!({"status": "error", "error": msg}));
    } else {
        let style = StyleOptions::detect();
        println!(
            "{}",
            box_header(
                format!("{} {title}", emoji("error", &style)),
                Some(color(Role::Error, msg, &style)),
                &style,
            )
        );
    }
    bail!(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::catalog::builtin_registry;
    use serde_json::json;

    #[test]
    fn coerce_integer_and_boolean() {
        assert_eq!(coerce_value("42", ParamKind::Integer), json!(42));
        assert_eq!(coerce_value("x42", ParamKind::Integer), json!("x42"));
        assert_eq!(coerce_value("Yes", ParamKind::Boolean), json!(true));
        assert_eq!(coerce_value("0", ParamKind::Boolean), json!(false));
        assert_eq!(coerce_value("maybe", ParamKind::Boolean), json!("maybe"));
    }

    #[test]
    fn coerce_list_trims_and_skips_empty() {
        assert_eq!(
            coerce_value("src, lib,,tests", ParamKind::StringList),
            json!(["src", "lib", "tests"])
        );
    }

    #[test]
    fn coerce_key_value_map() {
        assert_eq!(
            coerce_value("name=demo; lang=rust", ParamKind::KeyValue),
            json!({"name": "demo", "lang": "rust"})
        );
        assert_eq!(coerce_value("oops", ParamKind::KeyValue), json!("oops"));
    }

    #[test]
    fn param_pairs_split_on_first_equals() {
        let pairs = parse_param_pairs(&["query=.a=b".into(), " file = x.json".into()]).unwrap();
        assert_eq!(pairs[0], ("query".into(), ".a=b".into()));
        assert_eq!(pairs[1], ("file".into(), "x.json".into()));
        assert!(parse_param_pairs(&["novalue".into()]).is_err());
        assert!(parse_param_pairs(&["=v".into()]).is_err());
    }

    #[test]
    fn cli_overrides_file_and_follows_aliases() {
        let reg = builtin_registry().unwrap();
        let grep = reg.lookup("grep").unwrap();
        let file = json!({"pattern": "old", "paths": ["a"]})
            .as_object()
            .cloned()
            .unwrap();
        let cli = vec![
            ("pattern".to_string(), "TODO".to_string()),
            ("ignore_case".to_string(), "yes".to_string()),
        ];
        let args = build_arguments(grep, file, &cli);
        assert_eq!(args["pattern"], json!("TODO"));
        assert_eq!(args["paths"], json!(["a"]));
        assert_eq!(args["ignore_case"], json!(true));
    }

    #[test]
    fn cli_alias_replaces_file_canonical_key() {
        let reg = builtin_registry().unwrap();
        let grep = reg.lookup("grep").unwrap();
        let file = json!({"pattern": "old", "regex": "older", "paths": ["a"]})
            .as_object()
            .cloned()
            .unwrap();
        let cli = vec![("search".to_string(), "x".to_string())];
        let args = build_arguments(grep, file, &cli);
        assert_eq!(args["pattern"], json!("x"));
        assert!(!args.contains_key("search"));
        assert!(!args.contains_key("regex"));
        assert_eq!(args["paths"], json!(["a"]));
    }

    #[test]
    fn yaml_param_file_keeps_types() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, "paths:\n  - src\ndepth: 2\njson: true\n").unwrap();
        let map = load_param_file(path.to_str().unwrap()).unwrap();
        assert_eq!(map["paths"], json!(["src"]));
        assert_eq!(map["depth"], json!(2));
        assert_eq!(map["json"], json!(true));
    }

    #[test]
    fn param_file_root_must_be_object() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(load_param_file(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn preview_joins_lists() {
        assert_eq!(value_preview(&json!(["a", "b"])), "a, b");
        assert_eq!(value_preview(&json!(3)), "3");
    }
}
