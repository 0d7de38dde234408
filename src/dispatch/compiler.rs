//! Argument compiler: `(OperationSpec, ArgumentMap)` -> backend argument tokens.
//!
//! Pure and deterministic. Never touches the filesystem or the environment.

use std::path::Path;

use serde_json::{Number, Value};

use super::error::{DispatchError, DispatchResult};
use super::registry::{OperationSpec, ParamKind, ParamSpec, Slot};

/// Per-call arguments. `serde_json` is built with `preserve_order`, so map iteration
/// follows insertion order and `Pairs` expansion is deterministic.
pub type ArgumentMap = serde_json::Map<String, Value>;

/// Executable path followed by its argument tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCommand {
    tokens: Vec<String>,
}

impl CompiledCommand {
    pub fn new(program: &Path, args: Vec<String>) -> Self {
        let mut tokens = Vec::with_capacity(args.len() + 1);
        tokens.push(program.to_string_lossy().into_owned());
        tokens.extend(args);
        CompiledCommand { tokens }
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Shell-quoted rendering for logs and `--dry-run`.
    pub fn display(&self) -> String {
        shell_words::join(&self.tokens)
    }
}

/// Compile the backend arguments (subcommand first, program path excluded).
pub fn compile_args(spec: &OperationSpec, args: &ArgumentMap) -> DispatchResult<Vec<String>> {
    let mut tokens: Vec<String> = spec.subcommand.iter().map(|s| s.to_string()).collect();

    for param in &spec.params {
        let Some(value) = lookup_value(param, args) else {
            if param.required {
                return Err(DispatchError::invalid(
                    spec.name,
                    param.name,
                    "missing required parameter",
                ));
            }
            continue;
        };

        match param.slot {
            Slot::Switch(flag) => {
                if expect_bool(spec, param, value)? {
                    tokens.push(flag.to_string());
                }
            }
            Slot::Positional => {
                tokens.extend(render(spec, param, value)?);
            }
            Slot::Flag(flag) | Slot::Pairs(flag) => {
                for v in render(spec, param, value)? {
                    tokens.push(flag.to_string());
                    tokens.push(v);
                }
            }
        }
    }

    tokens.extend(spec.trailing.iter().map(|s| s.to_string()));

    if log::log_enabled!(log::Level::Debug) {
        for key in args.keys() {
            let known = spec
                .params
                .iter()
                .any(|p| p.name == key.as_str() || p.aliases.contains(&key.as_str()));
            if !known {
                log::debug!("{}: ignoring undeclared argument '{key}'", spec.name);
            }
        }
    }

    Ok(tokens)
}

/// Canonical name first, then aliases. An explicit `null` counts as absent.
fn lookup_value<'a>(param: &ParamSpec, args: &'a ArgumentMap) -> Option<&'a Value> {
    std::iter::once(param.name)
        .chain(param.aliases.iter().copied())
        .filter_map(|k| args.get(k))
        .find(|v| !v.is_null())
}

fn mismatch(spec: &OperationSpec, param: &ParamSpec, value: &Value) -> DispatchError {
    DispatchError::invalid(
        spec.name,
        param.name,
        format!("expected {}, got {}", param.kind.as_str(), json_kind(value)),
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if integral(n).is_some() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_bool(spec: &OperationSpec, param: &ParamSpec, value: &Value) -> DispatchResult<bool> {
    value.as_bool().ok_or_else(|| mismatch(spec, param, value))
}

/// Decimal form of a whole number. `3.0` counts as `3`; `1.5` does not.
fn integral(n: &Number) -> Option<String> {
    if n.is_i64() || n.is_u64() {
        return Some(n.to_string());
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
        .then(|| (f as i64).to_string())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => integral(n),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Value tokens for one parameter, validated against its declared kind.
fn render(spec: &OperationSpec, param: &ParamSpec, value: &Value) -> DispatchResult<Vec<String>> {
    match param.kind {
        ParamKind::String => {
            let s = value.as_str().ok_or_else(|| mismatch(spec, param, value))?;
            if !param.choices.is_empty() && !param.choices.contains(&s) {
                return Err(DispatchError::invalid(
                    spec.name,
                    param.name,
                    format!("'{s}' is not one of: {}", param.choices.join(", ")),
                ));
            }
            Ok(vec![s.to_string()])
        }
        ParamKind::Integer => match value {
            Value::Number(n) => integral(n)
                .map(|i| vec![i])
                .ok_or_else(|| mismatch(spec, param, value)),
            _ => Err(mismatch(spec, param, value)),
        },
        ParamKind::Boolean => Ok(vec![expect_bool(spec, param, value)?.to_string()]),
        ParamKind::StringList => {
            let items = value.as_array().ok_or_else(|| mismatch(spec, param, value))?;
            items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        DispatchError::invalid(
                            spec.name,
                            param.name,
                            format!("list elements must be strings, got {}", json_kind(item)),
                        )
                    })
                })
                .collect()
        }
        ParamKind::KeyValue => {
            let map = value.as_object().ok_or_else(|| mismatch(spec, param, value))?;
            map.iter()
                .map(|(k, v)| {
                    scalar(v).map(|v| format!("{k}={v}")).ok_or_else(|| {
                        DispatchError::invalid(
                            spec.name,
                            param.name,
                            format!("value for key '{k}' must be a scalar, got {}", json_kind(v)),
                        )
                    })
                })
                .collect()
        }
    }
}
