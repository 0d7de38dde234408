//! Operation registry: the static catalog of named, schema-typed operations.
//!
//! Each `OperationSpec` carries its own compile rule as data (subcommand tokens, ordered
//! parameter slots, fixed trailing tokens), so adding an operation never touches the
//! compiler or the dispatcher.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value, json};

use super::error::{DispatchError, DispatchResult};

/// A group of operations answered by the same set of interchangeable backends.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Family {
    /// Project analysis (llm-support): native binary with script fallback
    Support,
    /// Clarification tracking/learning (llm-clarification): single script backend
    Clarify,
}

impl Family {
    pub const fn all() -> &'static [Family] {
        &[Family::Support, Family::Clarify]
    }

    /// Prefix of the tool names exposed over MCP.
    pub fn tool_prefix(&self) -> &'static str {
        match self {
            Family::Support => "llm_support_",
            Family::Clarify => "llm_clarify_",
        }
    }

    /// Built-in wall-clock budget. Clarify operations may call a remote model.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Family::Support => Duration::from_secs(60),
            Family::Clarify => Duration::from_secs(120),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Family::Support => "support",
            Family::Clarify => "clarify",
        };
        f.write_str(s)
    }
}

/// Declared dynamic kind of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    StringList,
    KeyValue,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::StringList => "array",
            ParamKind::KeyValue => "object",
        }
    }
}

/// Where a parameter lands on the backend command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Bare value token(s).
    Positional,
    /// `--flag value` (repeated per element for lists).
    Flag(&'static str),
    /// Bare `--flag` when the boolean is true.
    Switch(&'static str),
    /// `--flag key=value` per map entry, in insertion order.
    Pairs(&'static str),
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub slot: Slot,
    pub required: bool,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
    pub choices: &'static [&'static str],
}

impl ParamSpec {
    fn new(name: &'static str, kind: ParamKind, slot: Slot) -> Self {
        ParamSpec {
            name,
            kind,
            slot,
            required: false,
            description: "",
            aliases: &[],
            choices: &[],
        }
    }

    pub fn positional(name: &'static str, kind: ParamKind) -> Self {
        Self::new(name, kind, Slot::Positional)
    }

    pub fn flag(name: &'static str, kind: ParamKind, flag: &'static str) -> Self {
        Self::new(name, kind, Slot::Flag(flag))
    }

    pub fn switch(name: &'static str, flag: &'static str) -> Self {
        Self::new(name, ParamKind::Boolean, Slot::Switch(flag))
    }

    pub fn pairs(name: &'static str, flag: &'static str) -> Self {
        Self::new(name, ParamKind::KeyValue, Slot::Pairs(flag))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn about(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn one_of(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    fn schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(self.kind.as_str()));
        if self.kind == ParamKind::StringList {
            prop.insert("items".into(), json!({ "type": "string" }));
        }
        if !self.choices.is_empty() {
            prop.insert("enum".into(), json!(self.choices));
        }
        if !self.description.is_empty() {
            prop.insert("description".into(), json!(self.description));
        }
        Value::Object(prop)
    }
}

/// One exposed operation. Immutable once registered.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub name: &'static str,
    pub family: Family,
    pub description: &'static str,
    /// Leading backend tokens, e.g. `["json", "query"]`.
    pub subcommand: &'static [&'static str],
    /// Compile order is declaration order.
    pub params: Vec<ParamSpec>,
    /// Fixed tokens appended after every parameter.
    pub trailing: &'static [&'static str],
}

impl OperationSpec {
    pub fn new(
        family: Family,
        name: &'static str,
        subcommand: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        OperationSpec {
            name,
            family,
            description,
            subcommand,
            params: Vec::new(),
            trailing: &[],
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn trailing(mut self, tokens: &'static [&'static str]) -> Self {
        self.trailing = tokens;
        self
    }

    /// Name exposed to MCP callers (`llm_support_grep`).
    pub fn tool_name(&self) -> String {
        format!("{}{}", self.family.tool_prefix(), self.name)
    }

    /// JSON Schema object describing the parameters.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut props = Map::new();
        for p in &self.params {
            props.insert(p.name.to_string(), p.schema());
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(props));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema
    }
}

/// Authoritative set of operations. There is no dynamic discovery.
#[derive(Debug, Default)]
pub struct Registry {
    specs: Vec<OperationSpec>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: OperationSpec) -> DispatchResult<()> {
        if self.index.contains_key(spec.name) {
            return Err(DispatchError::DuplicateOperation(spec.name.to_string()));
        }
        self.index.insert(spec.name, self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Accepts the bare name (`grep`) or the exposed tool name (`llm_support_grep`).
    pub fn lookup(&self, name: &str) -> DispatchResult<&OperationSpec> {
        let trimmed = name.trim();
        if let Some(&i) = self.index.get(trimmed) {
            return Ok(&self.specs[i]);
        }
        for family in Family::all() {
            if let Some(bare) = trimmed.strip_prefix(family.tool_prefix())
                && let Some(&i) = self.index.get(bare)
                && self.specs[i].family == *family
            {
                return Ok(&self.specs[i]);
            }
        }
        Err(DispatchError::UnknownOperation(name.to_string()))
    }

    /// Operations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OperationSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
