//! Utilities: logging setup (stderr only; stdout carries the MCP protocol) and
//! small runtime helpers shared by the subcommands.
//!
//! Key items:
//!   init_logging / derive_level
//!   runtime

use anyhow::{Context, Result};

/// Logging helpers.
pub mod logging {
    use log::LevelFilter;

    /// Map `-v` count and `-q` to a level filter.
    pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::Error;
        }
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Install `env_logger` writing to stderr. `RUST_LOG`, when set, refines the level.
    pub fn init_logging(level: LevelFilter) {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(level)
            .target(env_logger::Target::Stderr)
            .format_timestamp_millis();
        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }
        // A second init (tests) is harmless.
        let _ = builder.try_init();
    }
}

pub use logging::{derive_level, init_logging};

/// Single-threaded cooperative runtime: calls interleave only while awaiting a backend.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(derive_level(2, true), LevelFilter::Error);
        assert_eq!(derive_level(0, false), LevelFilter::Info);
        assert_eq!(derive_level(1, false), LevelFilter::Debug);
        assert_eq!(derive_level(5, false), LevelFilter::Trace);
    }

    #[test]
    fn runtime_runs_futures() {
        let rt = runtime().unwrap();
        assert_eq!(rt.block_on(async { 2 + 2 }), 4);
    }
}
