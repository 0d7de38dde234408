//! `llm-tools-mcp serve` (also the default with no subcommand): run the MCP server on stdio.

use std::sync::Arc;

use anyhow::Result;

use crate::dispatch::Dispatcher;
use crate::{mcp, utils};

pub fn execute_serve(dispatcher: Dispatcher) -> Result<()> {
    let rt = utils::runtime()?;
    rt.block_on(mcp::serve(Arc::new(dispatcher)))
}
