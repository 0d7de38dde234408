use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod dispatch;
mod mcp;
mod utils;

use cmd::{CallArgs, GetArgs, ListArgs};
use config::DispatchConfig;
use dispatch::Dispatcher;

/// llm-tools-mcp - MCP server for the llm-support / llm-clarification command-line tools
///
/// Every operation is exposed as an MCP tool (`llm_support_*`, `llm_clarify_*`). A call
/// is compiled into one backend command line, run under a per-family timeout, and its
/// output returned as a single text payload.
///
/// Command layout:
///   llm-tools-mcp [serve]
///   llm-tools-mcp list [--family support|clarify] [--json]
///   llm-tools-mcp get  <NAME> [--json]
///   llm-tools-mcp call <NAME> [--param k=v ...] [--param-file F] [--dry-run] [--json]
///
/// Global flags / env:
///   -v / -vv          Increase verbosity (logs go to stderr; stdout is the protocol)
///   -q / --quiet      Errors only
///   --config PATH     JSON or YAML config file (or LLM_TOOLS_CONFIG)
///   --support-bin     Native llm-support binary (or LLM_SUPPORT_BIN)
///   --support-script  llm-support fallback script (or LLM_SUPPORT_SCRIPT)
///   --clarify-script  llm-clarification script (or LLM_CLARIFICATION_SCRIPT)
///   --python          Script interpreter, empty to run scripts directly (or LLM_TOOLS_PYTHON)
#[derive(Parser, Debug)]
#[command(
    name = "llm-tools-mcp",
    version,
    about = "MCP server exposing llm-support and llm-clarification commands as tools",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (JSON or YAML). Falls back to LLM_TOOLS_CONFIG
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Native llm-support binary
    #[arg(long, global = true, value_name = "PATH")]
    support_bin: Option<PathBuf>,

    /// llm-support fallback script
    #[arg(long, global = true, value_name = "PATH")]
    support_script: Option<PathBuf>,

    /// llm-clarification script
    #[arg(long, global = true, value_name = "PATH")]
    clarify_script: Option<PathBuf>,

    /// Interpreter for script backends ("" runs scripts directly)
    #[arg(long, global = true, value_name = "PROGRAM")]
    python: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,

    /// List registered operations
    List(ListArgs),

    /// Show one operation's parameters and command shape
    Get(GetArgs),

    /// Dispatch one operation and print the result
    Call(CallArgs),
}

impl Cli {
    /// Defaults < config file < environment < command-line flags.
    fn dispatch_config(&self) -> Result<DispatchConfig> {
        let file = self.config.clone().or_else(|| {
            std::env::var("LLM_TOOLS_CONFIG")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        });
        let mut cfg = DispatchConfig::load(file.as_deref()).context("invalid configuration")?;
        if let Some(p) = &self.support_bin {
            cfg.support_native = p.clone();
        }
        if let Some(p) = &self.support_script {
            cfg.support_script = p.clone();
        }
        if let Some(p) = &self.clarify_script {
            cfg.clarify_script = p.clone();
        }
        if let Some(i) = &self.python {
            cfg.set_interpreter(i);
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let config = cli.dispatch_config()?;
    log::debug!("{config:?}");
    let dispatcher = Dispatcher::new(config).context("failed to build operation registry")?;

    match cli.command {
        None | Some(Commands::Serve) => cmd::execute_serve(dispatcher),
        Some(Commands::List(args)) => cmd::execute_list(args, &dispatcher),
        Some(Commands::Get(args)) => cmd::execute_get(args, &dispatcher),
        Some(Commands::Call(args)) => cmd::execute_call(args, &dispatcher),
    }
}
