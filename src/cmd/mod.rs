/*!
Subcommands. Each module exposes one `execute_*` entry point returning
`anyhow::Result<()>`; argument structs derive `clap::Args`.

  serve.rs   run the MCP server on stdio (default)
  list.rs    enumerate operations (optionally one family)
  get.rs     one operation in detail
  call.rs    run one operation from the command line
  shared.rs  parameter parsing / coercion / error output
  format.rs  human-readable rendering
*/

pub mod call;
pub mod format;
pub mod get;
pub mod list;
pub mod serve;
pub mod shared;

pub use call::{CallArgs, execute_call};
pub use get::{GetArgs, execute_get};
pub use list::{ListArgs, execute_list};
pub use serve::execute_serve;
